//! Frozen view of a built configuration.
//!
//! Everything a running [`Mapper`](crate::Mapper) consults lives here and never
//! changes after `build()`: explicit rule drafts, the handler chain, the converter
//! table, the settings, and the compilation backend. Options are assembled on
//! demand from this data, so resolution needs no locking.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::backend::{CompilationBackend, CompiledMapperEntry};
use crate::config::MapperSettings;
use crate::converter::ConverterResolver;
use crate::error::{MapError, Result};
use crate::handler::{MappingRequest, MissingHandlerChain};
use crate::key::{MapRequest, TypeKey};
use crate::option::{MappingOption, OptionOrigin};
use crate::rules::MapRules;

/// Immutable registry shared by every mapper built from one configuration.
pub struct Registry {
	maps: FxHashMap<TypeKey, MapRules>,
	handlers: MissingHandlerChain,
	converters: ConverterResolver,
	settings: MapperSettings,
	backend: Arc<dyn CompilationBackend>,
}

impl Registry {
	pub(crate) fn new(
		maps: FxHashMap<TypeKey, MapRules>,
		handlers: MissingHandlerChain,
		converters: ConverterResolver,
		settings: MapperSettings,
		backend: Arc<dyn CompilationBackend>,
	) -> Self {
		Self {
			maps,
			handlers,
			converters,
			settings,
			backend,
		}
	}

	pub fn converters(&self) -> &ConverterResolver {
		&self.converters
	}

	pub fn handlers(&self) -> &MissingHandlerChain {
		&self.handlers
	}

	pub fn settings(&self) -> &MapperSettings {
		&self.settings
	}

	pub fn backend(&self) -> &Arc<dyn CompilationBackend> {
		&self.backend
	}

	/// Returns true if `key` was registered explicitly (profile included).
	pub fn has_explicit(&self, key: &TypeKey) -> bool {
		self.maps.contains_key(key)
	}

	/// Explicitly registered keys.
	pub fn explicit_keys(&self) -> impl Iterator<Item = &TypeKey> {
		self.maps.keys()
	}

	/// Resolves the mapping option for a type pair.
	///
	/// Looks for an explicit map under the request's profile, then an explicit map
	/// in the default profile, then asks the handler chain. The option is keyed by
	/// the request's key either way, so nested maps stay in the same profile.
	///
	/// # Errors
	///
	/// [`MapError::MappingNotConfigured`] if nothing produces an option, or any
	/// assembly error of the option itself.
	pub fn resolve_option(&self, request: &MapRequest) -> Result<MappingOption> {
		let key = request.key();
		let context = MappingRequest::new(request, &self.converters, &self.settings);

		let explicit = self.maps.get(key).or_else(|| {
			key.profile()
				.and_then(|_| self.maps.get(&key.without_profile()))
		});
		if let Some(rules) = explicit {
			return MappingOption::assemble(&context, rules, OptionOrigin::Explicit);
		}

		self.handlers
			.handle(&context)?
			.ok_or_else(|| MapError::MappingNotConfigured { key: key.clone() })
	}

	/// Resolves, validates, and compiles the mapping for a type pair.
	pub fn compile(&self, request: &MapRequest) -> Result<CompiledMapperEntry> {
		let key = request.key();
		tracing::debug!(domain = "mapper", %key, backend = self.backend.name(), "compiling mapper");
		let mut option = self.resolve_option(request)?;
		if self.check_acyclic(&option)? {
			option.mark_nested_parameter();
		}
		let entry = self.backend.compile(&Arc::new(option))?;
		tracing::debug!(
			domain = "mapper",
			%key,
			bindings = entry.option().bindings().len(),
			accepts_parameter = entry.accepts_parameter(),
			"mapper compiled"
		);
		Ok(entry)
	}

	/// Fails if following sub-map bindings from `option` ever returns to a key
	/// already on the current path.
	///
	/// Nested options are resolved but not compiled. Returns true if any option
	/// reachable through sub-maps reads the caller-supplied parameter.
	pub fn check_acyclic(&self, option: &MappingOption) -> Result<bool> {
		let mut path = vec![option.key().clone()];
		let mut done = FxHashMap::default();
		self.walk(option, &mut path, &mut done)
	}

	fn walk(&self, option: &MappingOption, path: &mut Vec<TypeKey>, done: &mut FxHashMap<TypeKey, bool>) -> Result<bool> {
		let mut uses_parameter = false;
		for nested in option.nested() {
			let key = nested.key();
			if path.contains(key) {
				path.push(key.clone());
				return Err(MapError::CyclicMapping { path: std::mem::take(path) });
			}
			if let Some(&seen) = done.get(key) {
				uses_parameter |= seen;
				continue;
			}
			let child = self.resolve_option(nested)?;
			path.push(key.clone());
			let below = self.walk(&child, path, done)?;
			path.pop();
			let child_uses = child.accepts_parameter() || below;
			done.insert(key.clone(), child_uses);
			uses_parameter |= child_uses;
		}
		Ok(uses_parameter)
	}
}

impl fmt::Debug for Registry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Registry")
			.field("maps", &self.maps.keys().collect::<Vec<_>>())
			.field("handlers", &self.handlers)
			.field("converters", &self.converters.len())
			.field("settings", &self.settings)
			.field("backend", &self.backend.name())
			.finish()
	}
}
