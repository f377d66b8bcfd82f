//! Turning a [`MappingOption`] into callable mapping functions.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::{MapError, Result};
use crate::key::{MapRequest, TypeKey};
use crate::option::MappingOption;
use crate::value::DynValue;

mod interpreted;

pub use interpreted::InterpretedBackend;

/// Maps a nested object while a compiled entry runs.
///
/// Sub-map bindings go through this instead of holding compiled entries of their
/// own, so nested type pairs are compiled lazily on first use.
pub trait NestedMapper: Send + Sync {
	/// Maps `source` into a new instance of the request's destination type.
	///
	/// The parameter is forwarded to the nested mapping if it accepts one.
	fn map_nested(&self, request: &MapRequest, source: &dyn Any, parameter: Option<&dyn Any>) -> Result<DynValue>;
}

/// Maps onto an existing destination.
pub type MapIntoFn = Arc<dyn Fn(&dyn Any, &mut dyn Any, &dyn NestedMapper) -> Result<()> + Send + Sync>;
/// Maps into a freshly created destination.
pub type MapNewFn = Arc<dyn Fn(&dyn Any, &dyn NestedMapper) -> Result<DynValue> + Send + Sync>;
/// [`MapIntoFn`] with a caller parameter.
pub type MapIntoWithFn = Arc<dyn Fn(&dyn Any, &mut dyn Any, &dyn Any, &dyn NestedMapper) -> Result<()> + Send + Sync>;
/// [`MapNewFn`] with a caller parameter.
pub type MapNewWithFn = Arc<dyn Fn(&dyn Any, &dyn Any, &dyn NestedMapper) -> Result<DynValue> + Send + Sync>;

/// Compiles mapping options into callable entries.
pub trait CompilationBackend: Send + Sync + 'static {
	/// Backend name used in logs.
	fn name(&self) -> &'static str;

	/// Builds the callable forms for `option`.
	///
	/// The parameterized forms must be present exactly when
	/// [`MappingOption::accepts_parameter`] is true.
	fn compile(&self, option: &Arc<MappingOption>) -> Result<CompiledMapperEntry>;
}

/// The compiled mapping for one type pair.
#[derive(Clone)]
pub struct CompiledMapperEntry {
	key: TypeKey,
	option: Arc<MappingOption>,
	map_into: MapIntoFn,
	map_new: MapNewFn,
	map_into_with: Option<MapIntoWithFn>,
	map_new_with: Option<MapNewWithFn>,
}

impl CompiledMapperEntry {
	/// Creates an entry with only the parameterless forms.
	pub fn new(option: Arc<MappingOption>, map_into: MapIntoFn, map_new: MapNewFn) -> Self {
		Self {
			key: option.key().clone(),
			option,
			map_into,
			map_new,
			map_into_with: None,
			map_new_with: None,
		}
	}

	/// Adds the parameterized forms.
	pub fn with_parameterized(mut self, map_into_with: MapIntoWithFn, map_new_with: MapNewWithFn) -> Self {
		self.map_into_with = Some(map_into_with);
		self.map_new_with = Some(map_new_with);
		self
	}

	pub fn key(&self) -> &TypeKey {
		&self.key
	}

	pub fn option(&self) -> &Arc<MappingOption> {
		&self.option
	}

	/// Returns true if the parameterized forms exist.
	pub fn accepts_parameter(&self) -> bool {
		self.map_into_with.is_some()
	}

	pub fn map_into(&self, source: &dyn Any, destination: &mut dyn Any, nested: &dyn NestedMapper) -> Result<()> {
		(self.map_into)(source, destination, nested)
	}

	pub fn map_new(&self, source: &dyn Any, nested: &dyn NestedMapper) -> Result<DynValue> {
		(self.map_new)(source, nested)
	}

	/// # Errors
	///
	/// [`MapError::InvalidMapArguments`] if the mapping takes no parameter.
	pub fn map_into_with(
		&self,
		source: &dyn Any,
		destination: &mut dyn Any,
		parameter: &dyn Any,
		nested: &dyn NestedMapper,
	) -> Result<()> {
		let map = self.map_into_with.as_ref().ok_or_else(|| self.no_parameter())?;
		map(source, destination, parameter, nested)
	}

	/// # Errors
	///
	/// [`MapError::InvalidMapArguments`] if the mapping takes no parameter.
	pub fn map_new_with(&self, source: &dyn Any, parameter: &dyn Any, nested: &dyn NestedMapper) -> Result<DynValue> {
		let map = self.map_new_with.as_ref().ok_or_else(|| self.no_parameter())?;
		map(source, parameter, nested)
	}

	fn no_parameter(&self) -> MapError {
		MapError::InvalidMapArguments {
			key: self.key.clone(),
			reason: "mapping has no parameter-aware bindings",
		}
	}
}

impl fmt::Debug for CompiledMapperEntry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CompiledMapperEntry")
			.field("key", &self.key)
			.field("accepts_parameter", &self.accepts_parameter())
			.finish()
	}
}
