//! Static member tables describing mappable structs.
//!
//! A [`Shape`] is what the engine sees of a struct: its identity, its members
//! (name, value type, erased getter and setter), and how to construct a fresh
//! instance. Shapes are normally generated by `#[derive(Mappable)]` and live in
//! statics, so a `&'static Shape` is cheap to pass around.

use std::any::Any;
use std::fmt;

use crate::key::TypeHandle;
use crate::value::{DynValue, ValueType};

/// Reads a member from an erased object; `None` means the object had the wrong type.
pub type MemberGetter = fn(&dyn Any) -> Option<DynValue>;

/// Writes a member on an erased object; the value is handed back on type mismatch.
pub type MemberSetter = fn(&mut dyn Any, DynValue) -> Result<(), DynValue>;

/// Structs whose members can be read and written by name.
pub trait Mappable: Any + Send {
	/// Returns the static member table for this type.
	fn shape() -> &'static Shape;
}

/// Member table of a mappable struct.
pub struct Shape {
	name: &'static str,
	handle: fn() -> TypeHandle,
	members: &'static [Member],
	construct: Option<fn() -> DynValue>,
}

impl Shape {
	/// Creates a shape. Intended for generated code.
	pub const fn new(
		name: &'static str,
		handle: fn() -> TypeHandle,
		members: &'static [Member],
		construct: Option<fn() -> DynValue>,
	) -> Self {
		Self {
			name,
			handle,
			members,
			construct,
		}
	}

	/// Returns the declared type name.
	pub fn name(&self) -> &'static str {
		self.name
	}

	pub fn handle(&self) -> TypeHandle {
		(self.handle)()
	}

	/// Returns all members in declaration order.
	pub fn members(&self) -> &'static [Member] {
		self.members
	}

	/// Finds a member by exact name.
	pub fn member(&self, name: &str) -> Option<&'static Member> {
		self.members.iter().find(|m| m.name == name)
	}

	/// Creates a default instance, if the type supports it.
	pub fn construct(&self) -> Option<DynValue> {
		self.construct.map(|construct| construct())
	}

	pub fn can_construct(&self) -> bool {
		self.construct.is_some()
	}

	/// Returns the known member name most similar to `name`, if any is close.
	pub fn suggest(&self, name: &str) -> Option<&'static str> {
		self.members
			.iter()
			.map(|m| (m.name, strsim::jaro_winkler(name, m.name)))
			.filter(|(_, score)| *score > 0.8)
			.max_by(|a, b| a.1.total_cmp(&b.1))
			.map(|(name, _)| name)
	}
}

impl fmt::Debug for Shape {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Shape")
			.field("name", &self.name)
			.field("members", &self.members)
			.field("constructible", &self.construct.is_some())
			.finish()
	}
}

/// A single named member of a [`Shape`].
pub struct Member {
	name: &'static str,
	value_type: fn() -> ValueType,
	get: Option<MemberGetter>,
	set: Option<MemberSetter>,
}

impl Member {
	/// Creates a member descriptor. Intended for generated code.
	pub const fn new(
		name: &'static str,
		value_type: fn() -> ValueType,
		get: Option<MemberGetter>,
		set: Option<MemberSetter>,
	) -> Self {
		Self {
			name,
			value_type,
			get,
			set,
		}
	}

	pub fn name(&self) -> &'static str {
		self.name
	}

	pub fn value_type(&self) -> ValueType {
		(self.value_type)()
	}

	pub fn is_readable(&self) -> bool {
		self.get.is_some()
	}

	pub fn is_writable(&self) -> bool {
		self.set.is_some()
	}

	/// Reads a clone of this member from `object`.
	///
	/// Returns `None` if the member is write-only or `object` has the wrong type.
	pub fn get(&self, object: &dyn Any) -> Option<DynValue> {
		self.get.and_then(|get| get(object))
	}

	/// Writes `value` into this member of `object`.
	///
	/// Hands the value back if the member is read-only or a type does not match.
	pub fn set(&self, object: &mut dyn Any, value: DynValue) -> Result<(), DynValue> {
		match self.set {
			Some(set) => set(object, value),
			None => Err(value),
		}
	}
}

impl fmt::Debug for Member {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Member")
			.field("name", &self.name)
			.field("type", &self.value_type().handle().name())
			.field("readable", &self.get.is_some())
			.field("writable", &self.set.is_some())
			.finish()
	}
}
