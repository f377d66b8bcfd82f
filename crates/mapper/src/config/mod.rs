//! Startup-time mapper configuration.
//!
//! [`MapperConfig`] is populated through `&mut self` calls and frozen by
//! [`MapperConfig::build`]. Once frozen, every mutation fails with
//! [`MapError::ConfigurationFrozen`] and later `build()` calls return new mappers
//! over the same frozen registry.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::backend::{CompilationBackend, InterpretedBackend};
use crate::capability::ValueConverter;
use crate::converter::ConverterResolver;
use crate::error::{BoxError, MapError, Result};
use crate::handler::{DefaultMemberHandler, MissingHandler, MissingHandlerChain};
use crate::key::{MapRequest, Profile, TypeKey};
use crate::mapper::Mapper;
use crate::registry::Registry;
use crate::rules::MapRules;
use crate::shape::Mappable;
use crate::value::ValueKind;

mod builder;
mod settings;

#[cfg(test)]
mod tests;

pub use builder::TypeMapBuilder;
pub use settings::{MapperSettings, NameMatching};

/// Mutable configuration, consumed into a [`Registry`] on build.
struct OpenConfig {
	maps: FxHashMap<TypeKey, MapRules>,
	handlers: MissingHandlerChain,
	converters: ConverterResolver,
	settings: MapperSettings,
	backend: Arc<dyn CompilationBackend>,
}

impl Default for OpenConfig {
	fn default() -> Self {
		Self {
			maps: FxHashMap::default(),
			handlers: MissingHandlerChain::new(),
			converters: ConverterResolver::new(),
			settings: MapperSettings::default(),
			backend: Arc::new(InterpretedBackend),
		}
	}
}

impl OpenConfig {
	fn freeze(self) -> Registry {
		tracing::debug!(
			domain = "mapper",
			maps = self.maps.len(),
			handlers = self.handlers.len(),
			converters = self.converters.len(),
			backend = self.backend.name(),
			"mapper configuration frozen"
		);
		Registry::new(self.maps, self.handlers, self.converters, self.settings, self.backend)
	}
}

enum ConfigState {
	Open(Box<OpenConfig>),
	Frozen(Arc<Registry>),
}

/// Registry of type-pair maps, converters, and missing-map handlers.
pub struct MapperConfig {
	state: ConfigState,
}

impl Default for MapperConfig {
	fn default() -> Self {
		Self::new()
	}
}

impl MapperConfig {
	/// Creates an empty configuration with default settings and the interpreted backend.
	pub fn new() -> Self {
		Self {
			state: ConfigState::Open(Box::default()),
		}
	}

	/// Creates an empty configuration with the given settings.
	pub fn with_settings(settings: MapperSettings) -> Self {
		Self {
			state: ConfigState::Open(Box::new(OpenConfig {
				settings,
				..OpenConfig::default()
			})),
		}
	}

	/// Replaces the compilation backend.
	pub fn with_backend(mut self, backend: Arc<dyn CompilationBackend>) -> Result<Self> {
		self.open()?.backend = backend;
		Ok(self)
	}

	pub fn is_frozen(&self) -> bool {
		matches!(self.state, ConfigState::Frozen(_))
	}

	/// Returns the settings in effect.
	pub fn settings(&self) -> &MapperSettings {
		match &self.state {
			ConfigState::Open(open) => &open.settings,
			ConfigState::Frozen(registry) => registry.settings(),
		}
	}

	/// Replaces the settings.
	pub fn set_settings(&mut self, settings: MapperSettings) -> Result<&mut Self> {
		self.open()?.settings = settings;
		Ok(self)
	}

	/// Adds a missing-map handler to the chain.
	pub fn add_handler<H: MissingHandler>(&mut self, handler: H) -> Result<&mut Self> {
		self.open()?.handlers.add(Arc::new(handler));
		Ok(self)
	}

	/// Adds [`DefaultMemberHandler`], which maps any pair of mappable types by member name.
	pub fn add_default_mapper(&mut self) -> Result<&mut Self> {
		self.add_handler(DefaultMemberHandler)
	}

	/// Registers a member value conversion closure for `S -> D`.
	pub fn converter<S, D, F>(&mut self, convert: F) -> Result<&mut Self>
	where
		S: ValueKind,
		D: ValueKind,
		F: Fn(S) -> std::result::Result<D, BoxError> + Send + Sync + 'static,
	{
		self.open()?.converters.register(convert);
		Ok(self)
	}

	/// Registers `S -> D` through `D: From<S>`.
	pub fn converter_from<S, D>(&mut self) -> Result<&mut Self>
	where
		S: ValueKind,
		D: ValueKind + From<S>,
	{
		self.open()?.converters.register_from::<S, D>();
		Ok(self)
	}

	/// Registers a [`ValueConverter`] implementation for `S -> D`.
	pub fn value_converter<S, D, C>(&mut self, converter: C) -> Result<&mut Self>
	where
		S: ValueKind,
		D: ValueKind,
		C: ValueConverter<S, D>,
	{
		self.open()?.converters.register_converter(converter);
		Ok(self)
	}

	/// Opens the default-profile map for `S -> D`.
	///
	/// Opening a pair that already has rules extends them.
	pub fn create_map<S: Mappable, D: Mappable>(&mut self) -> Result<TypeMapBuilder<'_, S, D>> {
		self.map_rules(MapRequest::of::<S, D>(None))
	}

	/// Opens the map for `S -> D` in `profile`.
	pub fn create_map_in<S: Mappable, D: Mappable>(
		&mut self,
		profile: impl Into<Profile>,
	) -> Result<TypeMapBuilder<'_, S, D>> {
		self.map_rules(MapRequest::of::<S, D>(Some(profile.into())))
	}

	/// Freezes the configuration and returns a mapper over it.
	///
	/// Every call returns a new [`Mapper`] with its own compiled cache, sharing the
	/// same frozen registry.
	pub fn build(&mut self) -> Result<Mapper> {
		let registry = match &mut self.state {
			ConfigState::Frozen(registry) => registry.clone(),
			ConfigState::Open(open) => {
				let registry = Arc::new(std::mem::take(open.as_mut()).freeze());
				self.state = ConfigState::Frozen(registry.clone());
				registry
			}
		};
		Ok(Mapper::new(registry))
	}

	fn map_rules<S: Mappable, D: Mappable>(&mut self, request: MapRequest) -> Result<TypeMapBuilder<'_, S, D>> {
		let rules = self
			.open()?
			.maps
			.entry(request.key().clone())
			.or_insert_with(|| MapRules::new(&request));
		Ok(TypeMapBuilder::new(rules))
	}

	fn open(&mut self) -> Result<&mut OpenConfig> {
		match &mut self.state {
			ConfigState::Open(open) => Ok(open.as_mut()),
			ConfigState::Frozen(_) => Err(MapError::ConfigurationFrozen),
		}
	}
}

impl fmt::Debug for MapperConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.state {
			ConfigState::Open(open) => f
				.debug_struct("MapperConfig")
				.field("frozen", &false)
				.field("maps", &open.maps.len())
				.field("handlers", &open.handlers)
				.field("settings", &open.settings)
				.finish(),
			ConfigState::Frozen(registry) => f
				.debug_struct("MapperConfig")
				.field("frozen", &true)
				.field("registry", registry)
				.finish(),
		}
	}
}
