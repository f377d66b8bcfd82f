//! Type-erased member values and their runtime type descriptors.
//!
//! Every member type that can take part in a mapping implements [`ValueKind`], which
//! describes the type at runtime: its identity plus whether it is a plain value, an
//! `Option<_>` wrapper, a `Vec<_>` sequence, or a [`Mappable`] object. The descriptor
//! carries monomorphized function pointers for the few operations the engine needs
//! on erased values (wrapping, unwrapping, splitting and collecting sequences).

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::key::TypeHandle;
use crate::shape::{Mappable, Shape};

/// Owned, type-erased value.
pub type DynValue = Box<dyn Any + Send>;

/// Types that can appear as mapped member values.
pub trait ValueKind: Any + Send {
	/// Returns the runtime descriptor for this type.
	fn value_type() -> ValueType;
}

/// Runtime descriptor of a member value type.
#[derive(Clone, Copy)]
pub struct ValueType {
	handle: TypeHandle,
	shape: ValueShape,
	wrapper: Option<fn() -> ValueType>,
}

/// Structural category of a [`ValueType`].
#[derive(Clone, Copy)]
pub enum ValueShape {
	/// Leaf value with no structure the engine looks into.
	Plain,
	/// `Option<T>`.
	Optional(OptionalOps),
	/// `Vec<T>`.
	Sequence(SequenceOps),
	/// A [`Mappable`] struct.
	Object(fn() -> &'static Shape),
}

/// Erased operations on an `Option<T>` value.
#[derive(Clone, Copy)]
pub struct OptionalOps {
	inner: fn() -> ValueType,
	some: fn(DynValue) -> Result<DynValue, DynValue>,
	take: fn(DynValue) -> Result<Option<DynValue>, DynValue>,
	none: fn() -> DynValue,
	is_none: fn(&dyn Any) -> bool,
}

impl OptionalOps {
	/// Returns the type wrapped by the option.
	pub fn inner(&self) -> ValueType {
		(self.inner)()
	}

	/// Wraps an inner value in `Some`.
	pub fn some(&self, value: DynValue) -> Option<DynValue> {
		(self.some)(value).ok()
	}

	/// Unwraps an option value; the outer `None` signals a type mismatch.
	pub fn take(&self, value: DynValue) -> Option<Option<DynValue>> {
		(self.take)(value).ok()
	}

	/// Returns an erased `None`.
	pub fn none(&self) -> DynValue {
		(self.none)()
	}

	/// Returns true if the value is this option type and is `None`.
	pub fn is_none(&self, value: &dyn Any) -> bool {
		(self.is_none)(value)
	}
}

/// Erased operations on a `Vec<T>` value.
#[derive(Clone, Copy)]
pub struct SequenceOps {
	element: fn() -> ValueType,
	split: fn(DynValue) -> Result<Vec<DynValue>, DynValue>,
	collect: fn(Vec<DynValue>) -> Option<DynValue>,
}

impl SequenceOps {
	/// Returns the element type.
	pub fn element(&self) -> ValueType {
		(self.element)()
	}

	/// Splits a sequence into erased elements; `None` signals a type mismatch.
	pub fn split(&self, value: DynValue) -> Option<Vec<DynValue>> {
		(self.split)(value).ok()
	}

	/// Collects erased elements into a sequence; `None` signals a type mismatch.
	pub fn collect(&self, items: Vec<DynValue>) -> Option<DynValue> {
		(self.collect)(items)
	}
}

impl ValueType {
	/// Descriptor for a leaf type.
	pub fn plain<T: ValueKind>() -> Self {
		Self {
			handle: TypeHandle::of::<T>(),
			shape: ValueShape::Plain,
			wrapper: Some(<Option<T> as ValueKind>::value_type),
		}
	}

	/// Descriptor for a [`Mappable`] struct.
	pub fn object<T: Mappable + ValueKind>() -> Self {
		Self {
			handle: TypeHandle::of::<T>(),
			shape: ValueShape::Object(T::shape),
			wrapper: Some(<Option<T> as ValueKind>::value_type),
		}
	}

	fn optional<T: ValueKind>() -> Self {
		Self {
			handle: TypeHandle::of::<Option<T>>(),
			shape: ValueShape::Optional(OptionalOps {
				inner: T::value_type,
				some: wrap_some::<T>,
				take: take_option::<T>,
				none: none_of::<T>,
				is_none: is_none_of::<T>,
			}),
			wrapper: None,
		}
	}

	fn sequence<T: ValueKind>() -> Self {
		Self {
			handle: TypeHandle::of::<Vec<T>>(),
			shape: ValueShape::Sequence(SequenceOps {
				element: T::value_type,
				split: split_vec::<T>,
				collect: collect_vec::<T>,
			}),
			wrapper: Some(<Option<Vec<T>> as ValueKind>::value_type),
		}
	}

	/// Returns the type identity.
	pub fn handle(&self) -> TypeHandle {
		self.handle
	}

	/// Returns the structural category.
	pub fn shape(&self) -> &ValueShape {
		&self.shape
	}

	pub fn is_optional(&self) -> bool {
		matches!(self.shape, ValueShape::Optional(_))
	}

	/// Returns the option operations if this is an `Option<_>` type.
	pub fn optional_ops(&self) -> Option<&OptionalOps> {
		match &self.shape {
			ValueShape::Optional(ops) => Some(ops),
			_ => None,
		}
	}

	/// Returns the wrapped type if this is an `Option<_>` type.
	pub fn optional_inner(&self) -> Option<ValueType> {
		self.optional_ops().map(OptionalOps::inner)
	}

	/// Returns the descriptor of `Option<Self>` for non-optional types.
	pub fn optional_wrapper(&self) -> Option<ValueType> {
		self.wrapper.map(|wrapper| wrapper())
	}

	pub fn sequence_ops(&self) -> Option<&SequenceOps> {
		match &self.shape {
			ValueShape::Sequence(ops) => Some(ops),
			_ => None,
		}
	}

	/// Returns the member table if this is a [`Mappable`] struct.
	pub fn object_shape(&self) -> Option<&'static Shape> {
		match self.shape {
			ValueShape::Object(shape) => Some(shape()),
			_ => None,
		}
	}
}

impl PartialEq for ValueType {
	fn eq(&self, other: &Self) -> bool {
		self.handle == other.handle
	}
}

impl Eq for ValueType {}

impl fmt::Debug for ValueType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let kind = match self.shape {
			ValueShape::Plain => "plain",
			ValueShape::Optional(_) => "optional",
			ValueShape::Sequence(_) => "sequence",
			ValueShape::Object(_) => "object",
		};
		write!(f, "ValueType({}, {kind})", self.handle.name())
	}
}

fn wrap_some<T: ValueKind>(value: DynValue) -> Result<DynValue, DynValue> {
	value.downcast::<T>().map(|inner| Box::new(Some(*inner)) as DynValue)
}

fn take_option<T: ValueKind>(value: DynValue) -> Result<Option<DynValue>, DynValue> {
	value
		.downcast::<Option<T>>()
		.map(|option| option.map(|inner| Box::new(inner) as DynValue))
}

fn none_of<T: ValueKind>() -> DynValue {
	Box::new(None::<T>)
}

fn is_none_of<T: ValueKind>(value: &dyn Any) -> bool {
	value.downcast_ref::<Option<T>>().is_some_and(Option::is_none)
}

fn split_vec<T: ValueKind>(value: DynValue) -> Result<Vec<DynValue>, DynValue> {
	value
		.downcast::<Vec<T>>()
		.map(|items| items.into_iter().map(|item| Box::new(item) as DynValue).collect())
}

fn collect_vec<T: ValueKind>(items: Vec<DynValue>) -> Option<DynValue> {
	let mut out = Vec::with_capacity(items.len());
	for item in items {
		out.push(*item.downcast::<T>().ok()?);
	}
	Some(Box::new(out))
}

impl<T: ValueKind> ValueKind for Option<T> {
	fn value_type() -> ValueType {
		ValueType::optional::<T>()
	}
}

impl<T: ValueKind> ValueKind for Vec<T> {
	fn value_type() -> ValueType {
		ValueType::sequence::<T>()
	}
}

impl<T: ?Sized + Send + Sync + 'static> ValueKind for Arc<T> {
	fn value_type() -> ValueType {
		ValueType::plain::<Self>()
	}
}

/// Implements [`ValueKind`] for leaf types (enums, newtypes, foreign types).
///
/// ```ignore
/// #[derive(Clone)]
/// enum Status { Active, Disabled }
/// graft_mapper::plain_value_kind!(Status);
/// ```
#[macro_export]
macro_rules! plain_value_kind {
	($($ty:ty),* $(,)?) => {
		$(
			impl $crate::ValueKind for $ty {
				fn value_type() -> $crate::ValueType {
					$crate::ValueType::plain::<Self>()
				}
			}
		)*
	};
}

plain_value_kind!(
	bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, String, (),
);
