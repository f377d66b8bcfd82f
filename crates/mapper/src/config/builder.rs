//! Typed front end over a [`MapRules`] draft.

use std::any::Any;
use std::marker::PhantomData;

use crate::capability::{MapContext, MappingAction, ObjectFactory, ValueResolver};
use crate::error::{BoxError, MapError, Result};
use crate::option::{Action, Factory, Producer};
use crate::rules::{MapRules, MemberRule, NullRule};
use crate::shape::Mappable;
use crate::value::ValueKind;

/// Builder returned by [`MapperConfig::create_map`](crate::MapperConfig::create_map).
///
/// Every method validates its member names immediately and returns the builder
/// for chaining:
///
/// ```ignore
/// config
///     .create_map::<User, UserDto>()?
///     .map_from("display_name", "name")?
///     .constant("version", 2u32)?
///     .ignore("password_hash")?;
/// ```
pub struct TypeMapBuilder<'a, S, D> {
	rules: &'a mut MapRules,
	_marker: PhantomData<fn(&S) -> D>,
}

impl<'a, S: Mappable, D: Mappable> TypeMapBuilder<'a, S, D> {
	pub(crate) fn new(rules: &'a mut MapRules) -> Self {
		Self {
			rules,
			_marker: PhantomData,
		}
	}

	/// Returns the draft built so far.
	pub fn rules(&self) -> &MapRules {
		self.rules
	}

	/// Fills `destination` from the source member named `source`.
	pub fn map_from(self, destination: &str, source: &str) -> Result<Self> {
		self.rules.map_from(destination, source)?;
		Ok(self)
	}

	/// Fills `destination` with a value computed from the whole source.
	pub fn convert_using<V, F>(self, destination: &str, convert: F) -> Result<Self>
	where
		V: ValueKind,
		F: Fn(&S) -> std::result::Result<V, BoxError> + Send + Sync + 'static,
	{
		self.bind(destination, Producer::convert::<S, V, F>(convert))
	}

	/// Fills `destination` through a [`ValueResolver`].
	pub fn resolve_using<V, R>(self, destination: &str, resolver: R) -> Result<Self>
	where
		V: ValueKind,
		R: ValueResolver<S, D, V>,
	{
		self.bind(destination, Producer::resolve::<S, D, V, R>(resolver))
	}

	/// Fills `destination` from the source, the destination, and the caller parameter.
	///
	/// Maps containing such a binding must be invoked through the `_with` forms.
	pub fn resolve_with_parameter<P, V, F>(self, destination: &str, resolve: F) -> Result<Self>
	where
		P: Any,
		V: ValueKind,
		F: Fn(&S, &D, &P) -> std::result::Result<V, BoxError> + Send + Sync + 'static,
	{
		let resolver = WithParameter::<P, F> {
			resolve,
			_marker: PhantomData,
		};
		self.bind(destination, Producer::resolve::<S, D, V, _>(resolver))
	}

	/// Fills `destination` with a clone of `value`.
	pub fn constant<V>(self, destination: &str, value: V) -> Result<Self>
	where
		V: ValueKind + Clone + Sync,
	{
		self.bind(destination, Producer::constant(value))
	}

	/// Uses `value` for `destination` when its source value is `None`.
	///
	/// Fails with [`MapError::ConflictingBinding`] on a member bound by `constant`,
	/// `convert_using` or `resolve_using`, which read no source value.
	pub fn null_if<V>(self, destination: &str, value: V) -> Result<Self>
	where
		V: ValueKind + Clone + Sync,
	{
		self.rules.null(destination, NullRule::Substitute(Producer::constant(value)))?;
		Ok(self)
	}

	/// Leaves `destination` untouched when its source value is `None`.
	pub fn null_ignore(self, destination: &str) -> Result<Self> {
		self.rules.null_ignore(destination)?;
		Ok(self)
	}

	/// Leaves every member untouched when its source value is `None`.
	pub fn null_ignore_all(self) -> Self {
		self.rules.null_ignore_all();
		self
	}

	/// Never writes `destination`.
	pub fn ignore(self, destination: &str) -> Result<Self> {
		self.rules.ignore(destination)?;
		Ok(self)
	}

	/// Runs `action` before any member is written.
	pub fn before_map<A: MappingAction<S, D>>(self, action: A) -> Self {
		self.rules.push_before(Action::new::<S, D, A>(action));
		self
	}

	/// Runs `action` after every member is written.
	pub fn after_map<A: MappingAction<S, D>>(self, action: A) -> Self {
		self.rules.push_after(Action::new::<S, D, A>(action));
		self
	}

	/// Creates the destination with `factory` instead of its default constructor.
	pub fn construct_using<F: ObjectFactory<S, D>>(self, factory: F) -> Result<Self> {
		self.rules.set_factory(Factory::new::<S, D, F>(factory))?;
		Ok(self)
	}

	/// Overrides the global strict setting for this pair.
	pub fn strict(self, strict: bool) -> Self {
		self.rules.strict(strict);
		self
	}

	fn bind(self, destination: &str, producer: Producer) -> Result<Self> {
		self.rules.bind(destination, MemberRule::Computed(producer))?;
		Ok(self)
	}
}

struct WithParameter<P, F> {
	resolve: F,
	_marker: PhantomData<fn(&P)>,
}

impl<S, D, V, P, F> ValueResolver<S, D, V> for WithParameter<P, F>
where
	P: Any,
	F: Fn(&S, &D, &P) -> std::result::Result<V, BoxError> + Send + Sync + 'static,
{
	fn resolve(&self, source: &S, destination: &D, context: &MapContext<'_>) -> std::result::Result<V, BoxError> {
		let parameter = context.parameter::<P>().ok_or_else(|| {
			Box::new(MapError::InvalidMapArguments {
				key: context.key().clone(),
				reason: "parameter has the wrong type",
			}) as BoxError
		})?;
		(self.resolve)(source, destination, parameter)
	}

	fn uses_parameter(&self) -> bool {
		true
	}
}
