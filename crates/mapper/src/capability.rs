//! Single-method capability traits consumers implement to customize a mapping.
//!
//! Each trait has a blanket implementation for matching closures, so both plain
//! closures and named types with their own state can be registered.

use std::any::Any;

use crate::error::BoxError;
use crate::key::TypeKey;

/// Per-invocation context handed to resolvers and actions.
#[derive(Clone, Copy)]
pub struct MapContext<'a> {
	key: &'a TypeKey,
	parameter: Option<&'a dyn Any>,
}

impl<'a> MapContext<'a> {
	pub(crate) fn new(key: &'a TypeKey, parameter: Option<&'a dyn Any>) -> Self {
		Self { key, parameter }
	}

	/// The type pair being mapped.
	pub fn key(&self) -> &'a TypeKey {
		self.key
	}

	/// Returns the caller-supplied parameter if one was passed and has type `P`.
	pub fn parameter<P: Any>(&self) -> Option<&'a P> {
		self.parameter.and_then(|p| p.downcast_ref::<P>())
	}

	pub fn has_parameter(&self) -> bool {
		self.parameter.is_some()
	}

	pub(crate) fn raw_parameter(&self) -> Option<&'a dyn Any> {
		self.parameter
	}
}

impl std::fmt::Debug for MapContext<'_> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MapContext")
			.field("key", self.key)
			.field("has_parameter", &self.parameter.is_some())
			.finish()
	}
}

/// Converts one member value into another type.
pub trait ValueConverter<S, D>: Send + Sync + 'static {
	fn convert(&self, source: S) -> Result<D, BoxError>;
}

impl<S, D, F> ValueConverter<S, D> for F
where
	F: Fn(S) -> Result<D, BoxError> + Send + Sync + 'static,
{
	fn convert(&self, source: S) -> Result<D, BoxError> {
		self(source)
	}
}

/// Computes a destination member value from the whole source and destination.
pub trait ValueResolver<S, D, V>: Send + Sync + 'static {
	fn resolve(&self, source: &S, destination: &D, context: &MapContext<'_>) -> Result<V, BoxError>;

	/// Whether this resolver reads the caller-supplied parameter.
	///
	/// Options containing a parameter-aware resolver expose the parameterized
	/// callable forms; calling a parameterized form on any other option fails.
	fn uses_parameter(&self) -> bool {
		false
	}
}

impl<S, D, V, F> ValueResolver<S, D, V> for F
where
	F: Fn(&S, &D, &MapContext<'_>) -> Result<V, BoxError> + Send + Sync + 'static,
{
	fn resolve(&self, source: &S, destination: &D, context: &MapContext<'_>) -> Result<V, BoxError> {
		self(source, destination, context)
	}
}

/// Side effect run before or after the member bindings of a mapping.
pub trait MappingAction<S, D>: Send + Sync + 'static {
	fn apply(&self, source: &S, destination: &mut D, context: &MapContext<'_>) -> Result<(), BoxError>;

	/// Whether this action reads the caller-supplied parameter.
	fn uses_parameter(&self) -> bool {
		false
	}
}

impl<S, D, F> MappingAction<S, D> for F
where
	F: Fn(&S, &mut D, &MapContext<'_>) -> Result<(), BoxError> + Send + Sync + 'static,
{
	fn apply(&self, source: &S, destination: &mut D, context: &MapContext<'_>) -> Result<(), BoxError> {
		self(source, destination, context)
	}
}

/// Constructs the destination instance for the function form of a mapping.
pub trait ObjectFactory<S, D>: Send + Sync + 'static {
	fn create(&self, source: &S) -> Result<D, BoxError>;
}

impl<S, D, F> ObjectFactory<S, D> for F
where
	F: Fn(&S) -> Result<D, BoxError> + Send + Sync + 'static,
{
	fn create(&self, source: &S) -> Result<D, BoxError> {
		self(source)
	}
}
