//! Member-level value conversion and optional-wrapper fallback resolution.
//!
//! # Resolution order
//!
//! "Look up `(X, Y)`" means a registered converter for exactly `(X, Y)`, or the
//! implicit identity conversion when `X == Y`. The first matching rule wins:
//!
//! 1. Exact: `(S, D)`.
//! 2. Destination unwrap: `D = Option<D'>`, look up `(S, D')` and wrap the result.
//! 3. Source wrap: `S` is not optional, look up `(Option<S>, D)`, then
//!    `(Option<S>, D')`, feeding the source in as `Some`.
//! 4. Source unwrap: `S = Option<S'>`, look up `(S', D)`, then `(S', D')`.
//!
//! For distinct types the rules are tried with registered converters first and with
//! identity second, so an exact registered match always outranks every wrapper path.
//!
//! When `S == D` the exact step is final: a registered `(S, S)`, then a registered
//! `(S', S')` applied inside the option when `S = Option<S'>`, then identity. A
//! same-type mapping therefore never leaves the destination untouched.

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::capability::ValueConverter;
use crate::error::{BoxError, MapError, Result};
use crate::value::{DynValue, ValueKind, ValueType};

#[cfg(test)]
mod tests;

/// Erased conversion between two value types.
pub type ConverterFn = Arc<dyn Fn(DynValue) -> std::result::Result<DynValue, BoxError> + Send + Sync>;

/// A registered conversion between two value types.
#[derive(Clone)]
pub struct ConverterEntry {
	from: ValueType,
	to: ValueType,
	convert: ConverterFn,
}

impl ConverterEntry {
	/// Erases a typed converter.
	pub fn new<S, D, C>(converter: C) -> Self
	where
		S: ValueKind,
		D: ValueKind,
		C: ValueConverter<S, D>,
	{
		let convert: ConverterFn = Arc::new(move |value: DynValue| {
			let source = value
				.downcast::<S>()
				.map_err(|_| Box::new(MapError::mismatch::<S>()) as BoxError)?;
			converter.convert(*source).map(|out| Box::new(out) as DynValue)
		});
		Self {
			from: S::value_type(),
			to: D::value_type(),
			convert,
		}
	}

	pub fn from(&self) -> ValueType {
		self.from
	}

	pub fn to(&self) -> ValueType {
		self.to
	}
}

impl fmt::Debug for ConverterEntry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "ConverterEntry({} -> {})", self.from.handle(), self.to.handle())
	}
}

/// Which resolution rule produced a [`ResolvedConverter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionPath {
	/// Registered converter for exactly `(S, D)`.
	Exact,
	/// `S == D`, value passed through.
	Identity,
	/// Converted with `(S, D')` and wrapped in `Some`.
	WrapDestination,
	/// Source fed as `Some(s)` into `(Option<S>, D)`.
	WrapSource,
	/// Source fed as `Some(s)` into `(Option<S>, D')`, result wrapped in `Some`.
	WrapSourceAndDestination,
	/// `Some` source unwrapped into `(S', D)`; `None` leaves the destination untouched.
	UnwrapSource,
	/// `Some` source unwrapped into `(S', D')` and rewrapped; `None` maps to `None`.
	UnwrapSourceWrapDestination,
}

/// Outcome of applying a resolved conversion.
pub enum Converted {
	/// A value of the destination type.
	Value(DynValue),
	/// No value can be produced (a `None` source for a non-optional destination);
	/// the destination member is left as it is.
	Absent,
}

impl fmt::Debug for Converted {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Converted::Value(_) => f.write_str("Converted::Value(..)"),
			Converted::Absent => f.write_str("Converted::Absent"),
		}
	}
}

/// A conversion from one value type to another, with its wrapper adaptation baked in.
#[derive(Clone)]
pub struct ResolvedConverter {
	from: ValueType,
	to: ValueType,
	path: ConversionPath,
	base: Option<ConverterFn>,
}

impl ResolvedConverter {
	pub fn from(&self) -> ValueType {
		self.from
	}

	pub fn to(&self) -> ValueType {
		self.to
	}

	pub fn path(&self) -> ConversionPath {
		self.path
	}

	/// Returns true if the underlying step is a registered converter rather than identity.
	pub fn is_registered(&self) -> bool {
		self.base.is_some()
	}

	/// Converts a value of the source type.
	pub fn convert(&self, value: DynValue) -> std::result::Result<Converted, BoxError> {
		match self.path {
			ConversionPath::Exact | ConversionPath::Identity => self.apply_base(value).map(Converted::Value),
			ConversionPath::WrapDestination => {
				let inner = self.apply_base(value)?;
				self.wrap_destination(inner).map(Converted::Value)
			}
			ConversionPath::WrapSource => {
				let wrapped = self.wrap_source(value)?;
				self.apply_base(wrapped).map(Converted::Value)
			}
			ConversionPath::WrapSourceAndDestination => {
				let wrapped = self.wrap_source(value)?;
				let inner = self.apply_base(wrapped)?;
				self.wrap_destination(inner).map(Converted::Value)
			}
			ConversionPath::UnwrapSource => match self.unwrap_source(value)? {
				Some(inner) => self.apply_base(inner).map(Converted::Value),
				None => Ok(Converted::Absent),
			},
			ConversionPath::UnwrapSourceWrapDestination => match self.unwrap_source(value)? {
				Some(inner) => {
					let converted = self.apply_base(inner)?;
					self.wrap_destination(converted).map(Converted::Value)
				}
				None => {
					let ops = self.to.optional_ops().ok_or_else(|| mismatch(self.to))?;
					Ok(Converted::Value(ops.none()))
				}
			},
		}
	}

	fn apply_base(&self, value: DynValue) -> std::result::Result<DynValue, BoxError> {
		match &self.base {
			Some(convert) => convert(value),
			None => Ok(value),
		}
	}

	fn wrap_destination(&self, value: DynValue) -> std::result::Result<DynValue, BoxError> {
		self.to
			.optional_ops()
			.and_then(|ops| ops.some(value))
			.ok_or_else(|| mismatch(self.to))
	}

	fn wrap_source(&self, value: DynValue) -> std::result::Result<DynValue, BoxError> {
		let wrapper = self.from.optional_wrapper().ok_or_else(|| mismatch(self.from))?;
		wrapper
			.optional_ops()
			.and_then(|ops| ops.some(value))
			.ok_or_else(|| mismatch(wrapper))
	}

	fn unwrap_source(&self, value: DynValue) -> std::result::Result<Option<DynValue>, BoxError> {
		self.from
			.optional_ops()
			.and_then(|ops| ops.take(value))
			.ok_or_else(|| mismatch(self.from))
	}
}

impl fmt::Debug for ResolvedConverter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ResolvedConverter")
			.field("from", &self.from.handle().name())
			.field("to", &self.to.handle().name())
			.field("path", &self.path)
			.finish()
	}
}

fn mismatch(expected: ValueType) -> BoxError {
	Box::new(MapError::ValueTypeMismatch {
		expected: expected.handle(),
	})
}

/// Table of registered converters plus the fallback resolution rules.
///
/// Entries are added during configuration only; resolution is read-only.
#[derive(Clone, Default)]
pub struct ConverterResolver {
	table: FxHashMap<(TypeId, TypeId), ConverterEntry>,
}

impl ConverterResolver {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a conversion closure for `S -> D`, replacing any previous one.
	pub fn register<S, D, F>(&mut self, convert: F)
	where
		S: ValueKind,
		D: ValueKind,
		F: Fn(S) -> std::result::Result<D, BoxError> + Send + Sync + 'static,
	{
		self.insert(ConverterEntry::new::<S, D, _>(convert));
	}

	/// Registers a [`ValueConverter`] implementation for `S -> D`.
	pub fn register_converter<S, D, C>(&mut self, converter: C)
	where
		S: ValueKind,
		D: ValueKind,
		C: ValueConverter<S, D>,
	{
		self.insert(ConverterEntry::new::<S, D, C>(converter));
	}

	/// Registers `S -> D` through `D: From<S>`.
	pub fn register_from<S, D>(&mut self)
	where
		S: ValueKind,
		D: ValueKind + From<S>,
	{
		self.register::<S, D, _>(|source: S| Ok(D::from(source)));
	}

	/// Registers `S -> D` through `D: TryFrom<S>`, surfacing the conversion error.
	pub fn register_try_from<S, D>(&mut self)
	where
		S: ValueKind,
		D: ValueKind + TryFrom<S>,
		<D as TryFrom<S>>::Error: std::error::Error + Send + Sync + 'static,
	{
		self.register::<S, D, _>(|source: S| D::try_from(source).map_err(|e| Box::new(e) as BoxError));
	}

	/// Inserts a pre-built entry, replacing any converter for the same pair.
	pub fn insert(&mut self, entry: ConverterEntry) {
		let (from, to) = (entry.from.handle().name(), entry.to.handle().name());
		let key = (entry.from.handle().id(), entry.to.handle().id());
		if self.table.insert(key, entry).is_some() {
			tracing::debug!(domain = "mapper", from, to, "converter replaced");
		}
	}

	pub fn len(&self) -> usize {
		self.table.len()
	}

	pub fn is_empty(&self) -> bool {
		self.table.is_empty()
	}

	/// Returns true if a converter is registered for exactly `S -> D`.
	pub fn contains<S: 'static, D: 'static>(&self) -> bool {
		self.table.contains_key(&(TypeId::of::<S>(), TypeId::of::<D>()))
	}

	/// Returns the registered entries.
	pub fn entries(&self) -> impl Iterator<Item = &ConverterEntry> {
		self.table.values()
	}

	/// Resolves a conversion from `from` to `to`.
	///
	/// For two distinct types the rules run twice: first considering registered
	/// converters only, then admitting identity. A registered converter reachable
	/// through a wrapper path therefore outranks passing an inner value through
	/// unchanged.
	///
	/// Identical types resolve through [`Self::resolve_same`] and never take a path
	/// that can leave the destination untouched.
	///
	/// # Errors
	///
	/// Returns [`MapError::ConversionNotSupported`] if no rule applies.
	pub fn resolve(&self, from: &ValueType, to: &ValueType) -> Result<ResolvedConverter> {
		let found = if from == to {
			Some(self.resolve_same(from))
		} else {
			self.resolve_pass(from, to, false)
				.or_else(|| self.resolve_pass(from, to, true))
		};
		let Some((path, base)) = found else {
			return Err(MapError::ConversionNotSupported {
				from: from.handle(),
				to: to.handle(),
			});
		};
		Ok(ResolvedConverter {
			from: *from,
			to: *to,
			path,
			base,
		})
	}

	/// `T -> T`: a registered `(T, T)` converter, else a registered `(T′, T′)` applied
	/// inside `Option<T′>` (`None` stays `None`), else identity.
	fn resolve_same(&self, ty: &ValueType) -> (ConversionPath, Option<ConverterFn>) {
		if let Some(base) = self.lookup(ty, ty, false) {
			return (ConversionPath::Exact, base);
		}
		if let Some(inner) = ty.optional_inner()
			&& let Some(base) = self.lookup(&inner, &inner, false)
		{
			return (ConversionPath::UnwrapSourceWrapDestination, base);
		}
		(ConversionPath::Identity, None)
	}

	fn resolve_pass(&self, from: &ValueType, to: &ValueType, identity: bool) -> Option<(ConversionPath, Option<ConverterFn>)> {
		let lookup = |from: &ValueType, to: &ValueType| self.lookup(from, to, identity);
		let to_inner = to.optional_inner();

		// 1. Exact.
		if let Some(base) = lookup(from, to) {
			let path = if base.is_some() { ConversionPath::Exact } else { ConversionPath::Identity };
			return Some((path, base));
		}

		// 2. Destination unwrap.
		if let Some(to_inner) = &to_inner
			&& let Some(base) = lookup(from, to_inner)
		{
			return Some((ConversionPath::WrapDestination, base));
		}

		// 3. Source wrap.
		if let Some(from_wrapper) = from.optional_wrapper() {
			if let Some(base) = lookup(&from_wrapper, to) {
				return Some((ConversionPath::WrapSource, base));
			}
			if let Some(to_inner) = &to_inner
				&& let Some(base) = lookup(&from_wrapper, to_inner)
			{
				return Some((ConversionPath::WrapSourceAndDestination, base));
			}
		}

		// 4. Source unwrap.
		if let Some(from_inner) = from.optional_inner() {
			if let Some(base) = lookup(&from_inner, to) {
				return Some((ConversionPath::UnwrapSource, base));
			}
			if let Some(to_inner) = &to_inner
				&& let Some(base) = lookup(&from_inner, to_inner)
			{
				return Some((ConversionPath::UnwrapSourceWrapDestination, base));
			}
		}

		None
	}

	/// Registered converter (`Some(Some(f))`), identity (`Some(None)`), or nothing.
	fn lookup(&self, from: &ValueType, to: &ValueType, identity: bool) -> Option<Option<ConverterFn>> {
		if let Some(entry) = self.table.get(&(from.handle().id(), to.handle().id())) {
			return Some(Some(entry.convert.clone()));
		}
		(identity && from == to).then_some(None)
	}
}

impl fmt::Debug for ConverterResolver {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_list().entries(self.table.values()).finish()
	}
}
