//! Immutable per-type-pair mapping descriptions.
//!
//! # Role
//!
//! A [`MappingOption`] is the closed, fully resolved description of how one
//! [`TypeKey`] maps: one [`MemberBinding`] per destination member that will be
//! written, plus hooks and an optional factory. Compilation backends interpret it;
//! nothing mutates it after assembly.
//!
//! # Invariants
//!
//! - Every binding targets a writable destination member, at most once.
//! - Every converter referenced by a binding was resolved during assembly, so an
//!   unresolvable conversion fails assembly instead of a later invocation.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::capability::{MapContext, MappingAction, ObjectFactory, ValueResolver};
use crate::converter::ResolvedConverter;
use crate::error::{BoxError, MapError, Result};
use crate::handler::MappingRequest;
use crate::key::{MapRequest, TypeKey};
use crate::rules::{MapRules, MemberRule, NullRule};
use crate::shape::{Member, Shape};
use crate::value::{DynValue, OptionalOps, SequenceOps, ValueKind, ValueType};

type ConstantFn = Arc<dyn Fn() -> DynValue + Send + Sync>;
type ConvertFn = Arc<dyn Fn(&dyn Any) -> std::result::Result<DynValue, BoxError> + Send + Sync>;
type ResolveFn = Arc<dyn Fn(&dyn Any, &dyn Any, &MapContext<'_>) -> std::result::Result<DynValue, BoxError> + Send + Sync>;
type ActionFn = Arc<dyn Fn(&dyn Any, &mut dyn Any, &MapContext<'_>) -> std::result::Result<(), BoxError> + Send + Sync>;
type FactoryFn = Arc<dyn Fn(&dyn Any) -> std::result::Result<DynValue, BoxError> + Send + Sync>;

fn mismatch<T: 'static>() -> BoxError {
	Box::new(MapError::mismatch::<T>())
}

#[derive(Clone)]
enum ProducerKind {
	Constant(ConstantFn),
	Convert(ConvertFn),
	Resolve { resolve: ResolveFn, uses_parameter: bool },
}

/// Computes a destination member value without reading a matching source member.
#[derive(Clone)]
pub struct Producer {
	kind: ProducerKind,
	value_type: ValueType,
}

impl Producer {
	/// A fixed value, cloned on every invocation.
	pub(crate) fn constant<V>(value: V) -> Self
	where
		V: ValueKind + Clone + Sync,
	{
		Self {
			kind: ProducerKind::Constant(Arc::new(move || Box::new(value.clone()) as DynValue)),
			value_type: V::value_type(),
		}
	}

	/// A value computed from the whole source object.
	pub(crate) fn convert<S, V, F>(convert: F) -> Self
	where
		S: 'static,
		V: ValueKind,
		F: Fn(&S) -> std::result::Result<V, BoxError> + Send + Sync + 'static,
	{
		Self {
			kind: ProducerKind::Convert(Arc::new(move |source: &dyn Any| {
				let source = source.downcast_ref::<S>().ok_or_else(mismatch::<S>)?;
				convert(source).map(|value| Box::new(value) as DynValue)
			})),
			value_type: V::value_type(),
		}
	}

	/// A value computed by a [`ValueResolver`].
	pub(crate) fn resolve<S, D, V, R>(resolver: R) -> Self
	where
		S: 'static,
		D: 'static,
		V: ValueKind,
		R: ValueResolver<S, D, V>,
	{
		let uses_parameter = resolver.uses_parameter();
		Self {
			kind: ProducerKind::Resolve {
				resolve: Arc::new(move |source: &dyn Any, destination: &dyn Any, context: &MapContext<'_>| {
					let source = source.downcast_ref::<S>().ok_or_else(mismatch::<S>)?;
					let destination = destination.downcast_ref::<D>().ok_or_else(mismatch::<D>)?;
					resolver.resolve(source, destination, context).map(|value| Box::new(value) as DynValue)
				}),
				uses_parameter,
			},
			value_type: V::value_type(),
		}
	}

	/// Type of the produced value, before conversion to the member type.
	pub fn value_type(&self) -> ValueType {
		self.value_type
	}

	pub fn uses_parameter(&self) -> bool {
		matches!(self.kind, ProducerKind::Resolve { uses_parameter: true, .. })
	}

	/// Binding kind name used in diagnostics.
	pub fn kind(&self) -> &'static str {
		match self.kind {
			ProducerKind::Constant(_) => "constant",
			ProducerKind::Convert(_) => "convert_using",
			ProducerKind::Resolve { .. } => "resolve_using",
		}
	}

	/// Produces the value for one invocation.
	pub fn produce(
		&self,
		source: &dyn Any,
		destination: &dyn Any,
		context: &MapContext<'_>,
	) -> std::result::Result<DynValue, BoxError> {
		match &self.kind {
			ProducerKind::Constant(constant) => Ok(constant()),
			ProducerKind::Convert(convert) => convert(source),
			ProducerKind::Resolve { resolve, .. } => resolve(source, destination, context),
		}
	}
}

impl fmt::Debug for Producer {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Producer({}, {})", self.kind(), self.value_type.handle().name())
	}
}

/// Erased before/after hook.
#[derive(Clone)]
pub struct Action {
	run: ActionFn,
	uses_parameter: bool,
}

impl Action {
	pub(crate) fn new<S, D, A>(action: A) -> Self
	where
		S: 'static,
		D: 'static,
		A: MappingAction<S, D>,
	{
		let uses_parameter = action.uses_parameter();
		Self {
			run: Arc::new(move |source: &dyn Any, destination: &mut dyn Any, context: &MapContext<'_>| {
				let source = source.downcast_ref::<S>().ok_or_else(mismatch::<S>)?;
				let destination = destination.downcast_mut::<D>().ok_or_else(mismatch::<D>)?;
				action.apply(source, destination, context)
			}),
			uses_parameter,
		}
	}

	pub fn uses_parameter(&self) -> bool {
		self.uses_parameter
	}

	pub fn run(
		&self,
		source: &dyn Any,
		destination: &mut dyn Any,
		context: &MapContext<'_>,
	) -> std::result::Result<(), BoxError> {
		(self.run)(source, destination, context)
	}
}

/// Erased destination factory.
#[derive(Clone)]
pub struct Factory(FactoryFn);

impl Factory {
	pub(crate) fn new<S, D, F>(factory: F) -> Self
	where
		S: 'static,
		D: Send + 'static,
		F: ObjectFactory<S, D>,
	{
		Self(Arc::new(move |source: &dyn Any| {
			let source = source.downcast_ref::<S>().ok_or_else(mismatch::<S>)?;
			factory.create(source).map(|object| Box::new(object) as DynValue)
		}))
	}

	pub fn create(&self, source: &dyn Any) -> std::result::Result<DynValue, BoxError> {
		(self.0)(source)
	}
}

/// Mapping of one object-typed member through another type pair.
#[derive(Clone)]
pub struct ObjectPlan {
	request: MapRequest,
	source_optional: Option<OptionalOps>,
	destination_optional: Option<OptionalOps>,
}

impl ObjectPlan {
	/// The nested type pair.
	pub fn request(&self) -> &MapRequest {
		&self.request
	}

	/// Present when the source member is `Option<_>` of the nested source type.
	pub fn source_optional(&self) -> Option<&OptionalOps> {
		self.source_optional.as_ref()
	}

	/// Present when the destination member is `Option<_>` of the nested destination type.
	pub fn destination_optional(&self) -> Option<&OptionalOps> {
		self.destination_optional.as_ref()
	}
}

/// How each element of a sequence member maps.
#[derive(Clone)]
pub enum ElementPlan {
	/// Element values convert directly.
	Convert(ResolvedConverter),
	/// Elements are objects mapped through another type pair.
	Object(ObjectPlan),
}

/// Element-wise mapping of a sequence member, either end optionally `Option<Vec<_>>`.
#[derive(Clone)]
pub struct SequencePlan {
	element: ElementPlan,
	source: SequenceOps,
	destination: SequenceOps,
	source_optional: Option<OptionalOps>,
	destination_optional: Option<OptionalOps>,
}

impl SequencePlan {
	pub fn element(&self) -> &ElementPlan {
		&self.element
	}

	/// Operations on the source sequence (inside the option, if any).
	pub fn source(&self) -> &SequenceOps {
		&self.source
	}

	/// Operations on the destination sequence (inside the option, if any).
	pub fn destination(&self) -> &SequenceOps {
		&self.destination
	}

	pub fn source_optional(&self) -> Option<&OptionalOps> {
		self.source_optional.as_ref()
	}

	pub fn destination_optional(&self) -> Option<&OptionalOps> {
		self.destination_optional.as_ref()
	}
}

/// Resolution strategy for one destination member.
#[derive(Clone)]
pub enum BindingStrategy {
	/// Read a source member and convert it.
	Copy {
		source: &'static Member,
		converter: ResolvedConverter,
	},
	/// Produce a value (constant, converter over the source, or resolver) and convert it.
	Computed {
		producer: Producer,
		converter: ResolvedConverter,
	},
	/// Read an object-typed source member and map it through another type pair.
	SubMap { source: &'static Member, plan: ObjectPlan },
	/// Read a sequence member and map it element-wise.
	Sequence { source: &'static Member, plan: SequencePlan },
}

impl BindingStrategy {
	/// The source member read by this strategy, if any.
	pub fn source_member(&self) -> Option<&'static Member> {
		match self {
			BindingStrategy::Copy { source, .. }
			| BindingStrategy::SubMap { source, .. }
			| BindingStrategy::Sequence { source, .. } => Some(*source),
			BindingStrategy::Computed { .. } => None,
		}
	}

	/// Strategy name used in diagnostics.
	pub fn kind(&self) -> &'static str {
		match self {
			BindingStrategy::Copy { .. } => "copy",
			BindingStrategy::Computed { producer, .. } => producer.kind(),
			BindingStrategy::SubMap { .. } => "sub_map",
			BindingStrategy::Sequence { .. } => "sequence",
		}
	}

	/// Nested type pairs this strategy maps through.
	pub fn nested(&self) -> Option<&MapRequest> {
		match self {
			BindingStrategy::SubMap { plan, .. } => Some(plan.request()),
			BindingStrategy::Sequence { plan, .. } => match plan.element() {
				ElementPlan::Object(object) => Some(object.request()),
				ElementPlan::Convert(_) => None,
			},
			BindingStrategy::Copy { .. } | BindingStrategy::Computed { .. } => None,
		}
	}
}

/// Replacement value used when a source member is `None`.
#[derive(Clone)]
pub struct NullSubstitute {
	producer: Producer,
	converter: ResolvedConverter,
}

impl NullSubstitute {
	pub fn produce(&self, context: &MapContext<'_>) -> std::result::Result<DynValue, BoxError> {
		self.producer.produce(&(), &(), context)
	}

	pub fn converter(&self) -> &ResolvedConverter {
		&self.converter
	}
}

/// What to do when the source member value is `None`.
#[derive(Clone, Default)]
pub struct NullPolicy {
	substitute: Option<NullSubstitute>,
	ignore: bool,
}

impl NullPolicy {
	/// Substitute value (`null_if`).
	pub fn substitute(&self) -> Option<&NullSubstitute> {
		self.substitute.as_ref()
	}

	/// Leave the destination untouched (`null_ignore`).
	pub fn ignore(&self) -> bool {
		self.ignore
	}
}

/// Binding of one destination member.
#[derive(Clone)]
pub struct MemberBinding {
	destination: &'static Member,
	strategy: BindingStrategy,
	null_policy: NullPolicy,
}

impl MemberBinding {
	pub fn destination(&self) -> &'static Member {
		self.destination
	}

	pub fn strategy(&self) -> &BindingStrategy {
		&self.strategy
	}

	pub fn null_policy(&self) -> &NullPolicy {
		&self.null_policy
	}
}

impl fmt::Debug for MemberBinding {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut s = f.debug_struct("MemberBinding");
		s.field("destination", &self.destination.name());
		s.field("strategy", &self.strategy.kind());
		if let Some(source) = self.strategy.source_member() {
			s.field("source", &source.name());
		}
		s.field("null_ignore", &self.null_policy.ignore);
		s.field("null_if", &self.null_policy.substitute.is_some());
		s.finish()
	}
}

/// Where a [`MappingOption`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionOrigin {
	/// An explicit `create_map` registration.
	Explicit,
	/// A missing-map handler, by name.
	Handler(&'static str),
}

/// Immutable description of how one type pair maps.
#[derive(Clone)]
pub struct MappingOption {
	key: TypeKey,
	source: &'static Shape,
	destination: &'static Shape,
	bindings: Vec<MemberBinding>,
	before: Vec<Action>,
	after: Vec<Action>,
	factory: Option<Factory>,
	origin: OptionOrigin,
	nested_parameter: bool,
}

impl MappingOption {
	pub fn key(&self) -> &TypeKey {
		&self.key
	}

	pub fn source(&self) -> &'static Shape {
		self.source
	}

	pub fn destination(&self) -> &'static Shape {
		self.destination
	}

	/// Member bindings in destination declaration order.
	pub fn bindings(&self) -> &[MemberBinding] {
		&self.bindings
	}

	/// Looks up the binding for a destination member.
	pub fn binding(&self, destination: &str) -> Option<&MemberBinding> {
		self.bindings.iter().find(|b| b.destination.name() == destination)
	}

	pub fn before(&self) -> &[Action] {
		&self.before
	}

	pub fn after(&self) -> &[Action] {
		&self.after
	}

	pub fn factory(&self) -> Option<&Factory> {
		self.factory.as_ref()
	}

	pub fn origin(&self) -> OptionOrigin {
		self.origin
	}

	/// Nested type pairs reached through sub-map and sequence bindings.
	pub fn nested(&self) -> impl Iterator<Item = &MapRequest> {
		self.bindings.iter().filter_map(|b| b.strategy.nested())
	}

	/// Returns true if any binding or hook reads the caller-supplied parameter,
	/// here or in a nested mapping reached through sub-maps.
	pub fn accepts_parameter(&self) -> bool {
		self.nested_parameter
			|| self.bindings.iter().any(|b| match &b.strategy {
				BindingStrategy::Computed { producer, .. } => producer.uses_parameter(),
				_ => false,
			}) || self.before.iter().chain(&self.after).any(Action::uses_parameter)
	}

	/// Records that a nested mapping reads the parameter.
	pub(crate) fn mark_nested_parameter(&mut self) {
		self.nested_parameter = true;
	}

	/// Builds an option from explicit rules merged with by-name convention.
	///
	/// Destination members without a rule are paired with a readable source member
	/// of the same name. Members that cannot be paired or converted are skipped,
	/// unless strict mode applies, in which case assembly fails.
	pub(crate) fn assemble(request: &MappingRequest<'_>, rules: &MapRules, origin: OptionOrigin) -> Result<Self> {
		let key = request.key();
		let settings = request.settings();
		let strict = rules.strict_override().unwrap_or(settings.strict);
		let ignore_all_nulls = rules.ignores_all_nulls() || settings.null_ignore;

		let mut bindings = Vec::new();
		for destination in request.destination().members().iter().filter(|m| m.is_writable()) {
			let strategy = match rules.rule(destination.name()) {
				Some(MemberRule::Ignore) => continue,
				Some(MemberRule::MapFrom(source)) => {
					let source = *source;
					plan_member(request, source, destination).ok_or_else(|| MapError::ConversionNotSupported {
						from: source.value_type().handle(),
						to: destination.value_type().handle(),
					})?
				}
				Some(MemberRule::Computed(producer)) => BindingStrategy::Computed {
					converter: request
						.converters()
						.resolve(&producer.value_type(), &destination.value_type())?,
					producer: producer.clone(),
				},
				None => {
					let Some(source) = find_source(request, destination) else {
						if strict {
							return Err(MapError::UnmappableMember {
								key: key.clone(),
								member: destination.name().to_string(),
								reason: "no readable source member with a matching name".to_string(),
							});
						}
						tracing::trace!(domain = "mapper", %key, member = destination.name(), "no source member");
						continue;
					};
					match plan_member(request, source, destination) {
						Some(strategy) => strategy,
						None if strict => {
							return Err(MapError::UnmappableMember {
								key: key.clone(),
								member: destination.name().to_string(),
								reason: format!(
									"no conversion from `{}` to `{}`",
									source.value_type().handle(),
									destination.value_type().handle()
								),
							});
						}
						None => {
							tracing::debug!(
								domain = "mapper",
								%key,
								member = destination.name(),
								from = source.value_type().handle().name(),
								to = destination.value_type().handle().name(),
								"member skipped: no conversion"
							);
							continue;
						}
					}
				}
			};

			let substitute = match rules.null_rule(destination.name()) {
				Some(NullRule::Substitute(producer)) => Some(NullSubstitute {
					converter: request
						.converters()
						.resolve(&producer.value_type(), &destination.value_type())?,
					producer: producer.clone(),
				}),
				_ => None,
			};
			let ignore = ignore_all_nulls || matches!(rules.null_rule(destination.name()), Some(NullRule::Ignore));

			bindings.push(MemberBinding {
				destination,
				strategy,
				null_policy: NullPolicy { substitute, ignore },
			});
		}

		Ok(Self {
			key: key.clone(),
			source: request.source(),
			destination: request.destination(),
			bindings,
			before: rules.before().to_vec(),
			after: rules.after().to_vec(),
			factory: rules.factory().cloned(),
			origin,
			nested_parameter: false,
		})
	}
}

impl fmt::Debug for MappingOption {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MappingOption")
			.field("key", &self.key)
			.field("origin", &self.origin)
			.field("bindings", &self.bindings)
			.field("before", &self.before.len())
			.field("after", &self.after.len())
			.field("factory", &self.factory.is_some())
			.finish()
	}
}

/// Finds the readable source member paired with `destination` by name.
///
/// An exact name match wins over a case-insensitive one.
fn find_source(request: &MappingRequest<'_>, destination: &Member) -> Option<&'static Member> {
	let members = request.source().members();
	let readable = || members.iter().filter(|m| m.is_readable());
	readable().find(|m| m.name() == destination.name()).or_else(|| {
		readable().find(|m| request.settings().name_matching.matches(m.name(), destination.name()))
	})
}

/// Plans how a source member feeds a destination member.
///
/// Tries a direct conversion first, then sub-mapping between object types, then
/// element-wise mapping between sequences (optional on either end).
fn plan_member(request: &MappingRequest<'_>, source: &'static Member, destination: &'static Member) -> Option<BindingStrategy> {
	let (from, to) = (source.value_type(), destination.value_type());
	if let Ok(converter) = request.converters().resolve(&from, &to) {
		return Some(BindingStrategy::Copy { source, converter });
	}
	if let Some(plan) = object_plan(request, &from, &to) {
		return Some(BindingStrategy::SubMap { source, plan });
	}
	if let (Some((from_seq, source_optional)), Some((to_seq, destination_optional))) =
		(sequence_end(&from), sequence_end(&to))
	{
		let element = element_plan(request, &from_seq.element(), &to_seq.element())?;
		return Some(BindingStrategy::Sequence {
			source,
			plan: SequencePlan {
				element,
				source: from_seq,
				destination: to_seq,
				source_optional,
				destination_optional,
			},
		});
	}
	None
}

fn element_plan(request: &MappingRequest<'_>, from: &ValueType, to: &ValueType) -> Option<ElementPlan> {
	if let Ok(converter) = request.converters().resolve(from, to) {
		return Some(ElementPlan::Convert(converter));
	}
	object_plan(request, from, to).map(ElementPlan::Object)
}

fn object_plan(request: &MappingRequest<'_>, from: &ValueType, to: &ValueType) -> Option<ObjectPlan> {
	let (source, source_optional) = object_end(from)?;
	let (destination, destination_optional) = object_end(to)?;
	Some(ObjectPlan {
		request: MapRequest::from_shapes(source, destination, request.key().profile().cloned()),
		source_optional,
		destination_optional,
	})
}

/// Object shape of `T` or `Option<T>`.
fn object_end(value_type: &ValueType) -> Option<(&'static Shape, Option<OptionalOps>)> {
	if let Some(shape) = value_type.object_shape() {
		return Some((shape, None));
	}
	let ops = value_type.optional_ops()?;
	let shape = ops.inner().object_shape()?;
	Some((shape, Some(*ops)))
}

/// Sequence operations of `Vec<T>` or `Option<Vec<T>>`.
fn sequence_end(value_type: &ValueType) -> Option<(SequenceOps, Option<OptionalOps>)> {
	if let Some(ops) = value_type.sequence_ops() {
		return Some((*ops, None));
	}
	let optional = value_type.optional_ops()?;
	let ops = *optional.inner().sequence_ops()?;
	Some((ops, Some(*optional)))
}
