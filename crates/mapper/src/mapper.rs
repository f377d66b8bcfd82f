//! Runtime mapping façade.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::backend::{CompiledMapperEntry, NestedMapper};
use crate::cache::{CacheStats, CompiledMapperCache};
use crate::config::MapperSettings;
use crate::error::{MapError, Result};
use crate::key::{MapRequest, Profile};
use crate::registry::Registry;
use crate::shape::Mappable;
use crate::value::DynValue;

struct MapperInner {
	registry: Arc<Registry>,
	cache: CompiledMapperCache,
}

/// Maps values between configured type pairs.
///
/// Cheap to clone; clones share the compiled cache. Each type pair is compiled on
/// first use and reused afterwards, from any number of threads.
#[derive(Clone)]
pub struct Mapper {
	inner: Arc<MapperInner>,
}

impl Mapper {
	pub(crate) fn new(registry: Arc<Registry>) -> Self {
		Self {
			inner: Arc::new(MapperInner {
				registry,
				cache: CompiledMapperCache::new(),
			}),
		}
	}

	/// Maps `source` into a new `D`.
	pub fn map<S: Mappable, D: Mappable>(&self, source: &S) -> Result<D> {
		map_new(self, None, source, None)
	}

	/// Maps `source` onto an existing `destination`.
	pub fn map_into<S: Mappable, D: Mappable>(&self, source: &S, destination: &mut D) -> Result<()> {
		map_into(self, None, source, destination, None)
	}

	/// Maps `source` into a new `D`, passing `parameter` to parameter-aware bindings.
	pub fn map_with<S: Mappable, D: Mappable, P: Any>(&self, source: &S, parameter: &P) -> Result<D> {
		map_new(self, None, source, Some(parameter as &dyn Any))
	}

	/// Maps `source` onto `destination`, passing `parameter` to parameter-aware bindings.
	pub fn map_into_with<S: Mappable, D: Mappable, P: Any>(
		&self,
		source: &S,
		destination: &mut D,
		parameter: &P,
	) -> Result<()> {
		map_into(self, None, source, destination, Some(parameter as &dyn Any))
	}

	/// Returns a view of this mapper that resolves type pairs in `profile`.
	pub fn profile(&self, profile: impl Into<Profile>) -> ProfiledMapper {
		ProfiledMapper {
			mapper: self.clone(),
			profile: profile.into(),
		}
	}

	/// Type-erased entry point.
	///
	/// With a destination the mapping writes into it and returns `None`; without
	/// one it returns the newly created destination.
	///
	/// # Errors
	///
	/// [`MapError::InvalidMapArguments`] if `source` or `destination` does not have
	/// the request's types, or a parameter is passed to a mapping without
	/// parameter-aware bindings. Otherwise any resolution or member error.
	pub fn map_erased(
		&self,
		request: &MapRequest,
		source: &dyn Any,
		destination: Option<&mut dyn Any>,
		parameter: Option<&dyn Any>,
	) -> Result<Option<DynValue>> {
		let entry = self.entry(request)?;
		match (destination, parameter) {
			(Some(destination), None) => entry.map_into(source, destination, self).map(|()| None),
			(Some(destination), Some(parameter)) => entry
				.map_into_with(source, destination, parameter, self)
				.map(|()| None),
			(None, None) => entry.map_new(source, self).map(Some),
			(None, Some(parameter)) => entry.map_new_with(source, parameter, self).map(Some),
		}
	}

	/// Returns the compiled entry for a type pair, compiling it on first use.
	pub fn entry(&self, request: &MapRequest) -> Result<Arc<CompiledMapperEntry>> {
		let registry = &self.inner.registry;
		self.inner
			.cache
			.get_or_compile(request.key(), || registry.compile(request))
	}

	pub fn stats(&self) -> CacheStats {
		self.inner.cache.stats()
	}

	pub fn settings(&self) -> &MapperSettings {
		self.inner.registry.settings()
	}

	pub fn registry(&self) -> &Arc<Registry> {
		&self.inner.registry
	}
}

impl NestedMapper for Mapper {
	fn map_nested(&self, request: &MapRequest, source: &dyn Any, parameter: Option<&dyn Any>) -> Result<DynValue> {
		let entry = self.entry(request)?;
		match parameter {
			Some(parameter) if entry.accepts_parameter() => entry.map_new_with(source, parameter, self),
			_ => entry.map_new(source, self),
		}
	}
}

impl fmt::Debug for Mapper {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Mapper")
			.field("registry", &self.inner.registry)
			.field("cache", &self.inner.cache)
			.finish()
	}
}

/// A [`Mapper`] scoped to one profile.
///
/// Type pairs without an explicit map in the profile fall back to the default
/// profile's explicit map, then to the missing-map handlers.
#[derive(Clone)]
pub struct ProfiledMapper {
	mapper: Mapper,
	profile: Profile,
}

impl ProfiledMapper {
	pub fn profile(&self) -> &Profile {
		&self.profile
	}

	pub fn map<S: Mappable, D: Mappable>(&self, source: &S) -> Result<D> {
		map_new(&self.mapper, Some(&self.profile), source, None)
	}

	pub fn map_into<S: Mappable, D: Mappable>(&self, source: &S, destination: &mut D) -> Result<()> {
		map_into(&self.mapper, Some(&self.profile), source, destination, None)
	}

	pub fn map_with<S: Mappable, D: Mappable, P: Any>(&self, source: &S, parameter: &P) -> Result<D> {
		map_new(&self.mapper, Some(&self.profile), source, Some(parameter as &dyn Any))
	}

	pub fn map_into_with<S: Mappable, D: Mappable, P: Any>(
		&self,
		source: &S,
		destination: &mut D,
		parameter: &P,
	) -> Result<()> {
		map_into(&self.mapper, Some(&self.profile), source, destination, Some(parameter as &dyn Any))
	}
}

impl fmt::Debug for ProfiledMapper {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("ProfiledMapper").field(&self.profile).finish()
	}
}

fn map_new<S: Mappable, D: Mappable>(
	mapper: &Mapper,
	profile: Option<&Profile>,
	source: &S,
	parameter: Option<&dyn Any>,
) -> Result<D> {
	let request = MapRequest::of::<S, D>(profile.cloned());
	let created = mapper
		.map_erased(&request, source, None, parameter)?
		.ok_or_else(MapError::mismatch::<D>)?;
	created.downcast::<D>().map(|d| *d).map_err(|_| MapError::mismatch::<D>())
}

fn map_into<S: Mappable, D: Mappable>(
	mapper: &Mapper,
	profile: Option<&Profile>,
	source: &S,
	destination: &mut D,
	parameter: Option<&dyn Any>,
) -> Result<()> {
	let request = MapRequest::of::<S, D>(profile.cloned());
	mapper
		.map_erased(&request, source, Some(destination as &mut dyn Any), parameter)
		.map(drop)
}
