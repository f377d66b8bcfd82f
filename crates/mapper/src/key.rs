//! Type identities and the type-pair lookup key.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::shape::{Mappable, Shape};

/// Runtime identity of a Rust type.
///
/// Equality and hashing use the [`TypeId`] only; the name is carried for diagnostics.
#[derive(Clone, Copy)]
pub struct TypeHandle {
	id: TypeId,
	name: &'static str,
}

impl TypeHandle {
	/// Returns the handle for `T`.
	pub fn of<T: ?Sized + 'static>() -> Self {
		Self {
			id: TypeId::of::<T>(),
			name: std::any::type_name::<T>(),
		}
	}

	/// Returns the underlying [`TypeId`].
	pub fn id(&self) -> TypeId {
		self.id
	}

	/// Returns the fully qualified type name.
	pub fn name(&self) -> &'static str {
		self.name
	}

	/// Returns the type name with module paths stripped from each segment.
	pub fn short_name(&self) -> String {
		let mut out = String::with_capacity(self.name.len());
		let mut segment = String::new();
		for ch in self.name.chars() {
			if ch.is_alphanumeric() || ch == '_' || ch == ':' {
				segment.push(ch);
			} else {
				out.push_str(segment.rsplit("::").next().unwrap_or(&segment));
				segment.clear();
				out.push(ch);
			}
		}
		out.push_str(segment.rsplit("::").next().unwrap_or(&segment));
		out
	}
}

impl PartialEq for TypeHandle {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
	}
}

impl Eq for TypeHandle {}

impl Hash for TypeHandle {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.id.hash(state);
	}
}

impl fmt::Debug for TypeHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "TypeHandle({})", self.name)
	}
}

impl fmt::Display for TypeHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.short_name())
	}
}

/// Named grouping of type-pair registrations.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Profile(Arc<str>);

impl Profile {
	/// Creates a profile with the given name.
	pub fn new(name: impl Into<Arc<str>>) -> Self {
		Self(name.into())
	}

	/// Returns the profile name.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Debug for Profile {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Profile({:?})", &*self.0)
	}
}

impl fmt::Display for Profile {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for Profile {
	fn from(name: &str) -> Self {
		Self(Arc::from(name))
	}
}

impl From<String> for Profile {
	fn from(name: String) -> Self {
		Self(Arc::from(name))
	}
}

impl From<&Profile> for Profile {
	fn from(profile: &Profile) -> Self {
		profile.clone()
	}
}

/// Lookup key for a mapping: source type, destination type, and optional profile.
///
/// A key without a profile and a key with a profile are distinct entries everywhere,
/// including the compiled mapper cache.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TypeKey {
	source: TypeHandle,
	destination: TypeHandle,
	profile: Option<Profile>,
}

impl TypeKey {
	/// Creates a key from its parts.
	pub fn new(source: TypeHandle, destination: TypeHandle, profile: Option<Profile>) -> Self {
		Self {
			source,
			destination,
			profile,
		}
	}

	/// Creates the default-profile key for `S -> D`.
	pub fn of<S: 'static, D: 'static>() -> Self {
		Self::new(TypeHandle::of::<S>(), TypeHandle::of::<D>(), None)
	}

	/// Returns this key scoped to `profile`.
	pub fn with_profile(mut self, profile: Option<Profile>) -> Self {
		self.profile = profile;
		self
	}

	/// Returns the default-profile form of this key.
	pub fn without_profile(&self) -> Self {
		Self {
			source: self.source,
			destination: self.destination,
			profile: None,
		}
	}

	pub fn source(&self) -> TypeHandle {
		self.source
	}

	pub fn destination(&self) -> TypeHandle {
		self.destination
	}

	pub fn profile(&self) -> Option<&Profile> {
		self.profile.as_ref()
	}
}

impl fmt::Debug for TypeKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "TypeKey({self})")
	}
}

impl fmt::Display for TypeKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} -> {}", self.source, self.destination)?;
		if let Some(profile) = &self.profile {
			write!(f, " [{profile}]")?;
		}
		Ok(())
	}
}

/// A type pair together with the member tables of both sides.
///
/// Everything needed to resolve a [`MappingOption`](crate::MappingOption) for a key
/// that was never registered explicitly.
#[derive(Clone)]
pub struct MapRequest {
	key: TypeKey,
	source: &'static Shape,
	destination: &'static Shape,
}

impl MapRequest {
	/// Creates a request for `S -> D` under `profile`.
	pub fn of<S: Mappable, D: Mappable>(profile: Option<Profile>) -> Self {
		Self::from_shapes(S::shape(), D::shape(), profile)
	}

	/// Creates a request from two shapes.
	pub fn from_shapes(source: &'static Shape, destination: &'static Shape, profile: Option<Profile>) -> Self {
		Self {
			key: TypeKey::new(source.handle(), destination.handle(), profile),
			source,
			destination,
		}
	}

	pub fn key(&self) -> &TypeKey {
		&self.key
	}

	pub fn source(&self) -> &'static Shape {
		self.source
	}

	pub fn destination(&self) -> &'static Shape {
		self.destination
	}
}

impl fmt::Debug for MapRequest {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("MapRequest").field(&self.key).finish()
	}
}
