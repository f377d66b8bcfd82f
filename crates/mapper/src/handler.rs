//! Fallback producers for type pairs with no explicit map.
//!
//! When a [`TypeKey`] has no explicit registration, the registry asks each
//! [`MissingHandler`] in priority order (lowest value first, ties in registration
//! order) and uses the first option produced. [`DefaultMemberHandler`] runs last and
//! maps members by name.

use std::fmt;
use std::sync::Arc;

use crate::config::MapperSettings;
use crate::converter::ConverterResolver;
use crate::error::Result;
use crate::key::{MapRequest, TypeKey};
use crate::option::{MappingOption, OptionOrigin};
use crate::rules::MapRules;
use crate::shape::Shape;

/// Everything a handler may consult to describe one type pair.
#[derive(Clone, Copy)]
pub struct MappingRequest<'a> {
	request: &'a MapRequest,
	converters: &'a ConverterResolver,
	settings: &'a MapperSettings,
}

impl<'a> MappingRequest<'a> {
	pub(crate) fn new(request: &'a MapRequest, converters: &'a ConverterResolver, settings: &'a MapperSettings) -> Self {
		Self {
			request,
			converters,
			settings,
		}
	}

	pub fn key(&self) -> &'a TypeKey {
		self.request.key()
	}

	pub fn source(&self) -> &'static Shape {
		self.request.source()
	}

	pub fn destination(&self) -> &'static Shape {
		self.request.destination()
	}

	pub fn map_request(&self) -> &'a MapRequest {
		self.request
	}

	/// Converter table of the built configuration.
	pub fn converters(&self) -> &'a ConverterResolver {
		self.converters
	}

	pub fn settings(&self) -> &'a MapperSettings {
		self.settings
	}

	/// Returns an empty rule draft for this type pair.
	pub fn rules(&self) -> MapRules {
		MapRules::new(self.request)
	}

	/// Assembles `rules` merged with by-name convention into an option.
	pub fn assemble(&self, rules: &MapRules, origin: OptionOrigin) -> Result<MappingOption> {
		MappingOption::assemble(self, rules, origin)
	}

	/// Assembles a purely by-name option attributed to handler `name`.
	pub fn by_convention(&self, name: &'static str) -> Result<MappingOption> {
		self.assemble(&self.rules(), OptionOrigin::Handler(name))
	}
}

impl fmt::Debug for MappingRequest<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MappingRequest").field("key", self.key()).finish()
	}
}

/// Produces a [`MappingOption`] for a type pair that has no explicit map.
pub trait MissingHandler: Send + Sync + 'static {
	/// Name used in logs and as the option origin.
	fn name(&self) -> &'static str;

	/// Lower values run first.
	fn priority(&self) -> i32 {
		0
	}

	/// Returns `Ok(None)` to defer to the next handler.
	fn handle(&self, request: &MappingRequest<'_>) -> Result<Option<MappingOption>>;
}

/// Maps readable source members onto writable destination members of the same name.
///
/// Member names are compared per [`MapperSettings::name_matching`]. Object-typed
/// members are sub-mapped and sequences are mapped element-wise. Members that cannot
/// be mapped are skipped, or fail resolution in strict mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMemberHandler;

impl MissingHandler for DefaultMemberHandler {
	fn name(&self) -> &'static str {
		"default-member"
	}

	fn priority(&self) -> i32 {
		i32::MAX
	}

	fn handle(&self, request: &MappingRequest<'_>) -> Result<Option<MappingOption>> {
		request.by_convention(self.name()).map(Some)
	}
}

/// Ordered list of [`MissingHandler`]s.
#[derive(Clone, Default)]
pub struct MissingHandlerChain {
	handlers: Vec<Arc<dyn MissingHandler>>,
}

impl MissingHandlerChain {
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts a handler after every handler with priority less than or equal to its own.
	pub fn add(&mut self, handler: Arc<dyn MissingHandler>) {
		let priority = handler.priority();
		let at = self.handlers.partition_point(|h| h.priority() <= priority);
		self.handlers.insert(at, handler);
	}

	pub fn len(&self) -> usize {
		self.handlers.len()
	}

	pub fn is_empty(&self) -> bool {
		self.handlers.is_empty()
	}

	/// Handler names in the order they run.
	pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
		self.handlers.iter().map(|h| h.name())
	}

	/// Returns the first option any handler produces.
	///
	/// A handler error stops the chain and is returned as is.
	pub fn handle(&self, request: &MappingRequest<'_>) -> Result<Option<MappingOption>> {
		for handler in &self.handlers {
			if let Some(option) = handler.handle(request)? {
				tracing::debug!(domain = "mapper", key = %request.key(), handler = handler.name(), "missing map handled");
				return Ok(Some(option));
			}
		}
		Ok(None)
	}
}

impl fmt::Debug for MissingHandlerChain {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_list().entries(self.names()).finish()
	}
}
