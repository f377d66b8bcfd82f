use std::any::Any;
use std::sync::Arc;

use super::{CompilationBackend, CompiledMapperEntry, MapIntoFn, MapIntoWithFn, MapNewFn, MapNewWithFn, NestedMapper};
use crate::capability::MapContext;
use crate::converter::{Converted, ResolvedConverter};
use crate::error::{BoxError, MapError, Result};
use crate::key::{TypeHandle, TypeKey};
use crate::option::{BindingStrategy, ElementPlan, MappingOption, MemberBinding, ObjectPlan, SequencePlan};
use crate::shape::Member;
use crate::value::{DynValue, ValueType};

const BEFORE_MAP: &str = "<before_map>";
const AFTER_MAP: &str = "<after_map>";
const CONSTRUCT: &str = "<construct>";

/// Backend that walks the bindings of a [`MappingOption`] on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct InterpretedBackend;

impl CompilationBackend for InterpretedBackend {
	fn name(&self) -> &'static str {
		"interpreted"
	}

	fn compile(&self, option: &Arc<MappingOption>) -> Result<CompiledMapperEntry> {
		let into = option.clone();
		let map_into: MapIntoFn = Arc::new(move |source: &dyn Any, destination: &mut dyn Any, nested: &dyn NestedMapper| {
			run(&into, source, destination, None, nested)
		});
		let new = option.clone();
		let map_new: MapNewFn =
			Arc::new(move |source: &dyn Any, nested: &dyn NestedMapper| create(&new, source, None, nested));
		let entry = CompiledMapperEntry::new(option.clone(), map_into, map_new);
		if !option.accepts_parameter() {
			return Ok(entry);
		}

		let into = option.clone();
		let map_into_with: MapIntoWithFn = Arc::new(
			move |source: &dyn Any, destination: &mut dyn Any, parameter: &dyn Any, nested: &dyn NestedMapper| {
				run(&into, source, destination, Some(parameter), nested)
			},
		);
		let new = option.clone();
		let map_new_with: MapNewWithFn = Arc::new(move |source: &dyn Any, parameter: &dyn Any, nested: &dyn NestedMapper| {
			create(&new, source, Some(parameter), nested)
		});
		Ok(entry.with_parameterized(map_into_with, map_new_with))
	}
}

fn create(option: &MappingOption, source: &dyn Any, parameter: Option<&dyn Any>, nested: &dyn NestedMapper) -> Result<DynValue> {
	let key = option.key();
	check_type(key, source, key.source(), "source has the wrong type")?;
	let mut destination = match option.factory() {
		Some(factory) => factory.create(source).map_err(|e| MapError::member(key, CONSTRUCT, e))?,
		None => option.destination().construct().ok_or_else(|| MapError::InvalidMapArguments {
			key: key.clone(),
			reason: "destination type has no default constructor and no factory",
		})?,
	};
	run(option, source, &mut *destination, parameter, nested)?;
	Ok(destination)
}

fn run(
	option: &MappingOption,
	source: &dyn Any,
	destination: &mut dyn Any,
	parameter: Option<&dyn Any>,
	nested: &dyn NestedMapper,
) -> Result<()> {
	let key = option.key();
	check_type(key, source, key.source(), "source has the wrong type")?;
	check_type(key, &*destination, key.destination(), "destination has the wrong type")?;
	let context = MapContext::new(key, parameter);

	for action in option.before() {
		require_parameter(&context, action.uses_parameter())?;
		action
			.run(source, destination, &context)
			.map_err(|e| MapError::member(key, BEFORE_MAP, e))?;
	}
	for binding in option.bindings() {
		apply(binding, source, destination, &context, nested)?;
	}
	for action in option.after() {
		require_parameter(&context, action.uses_parameter())?;
		action
			.run(source, destination, &context)
			.map_err(|e| MapError::member(key, AFTER_MAP, e))?;
	}
	Ok(())
}

fn check_type(key: &TypeKey, value: &dyn Any, expected: TypeHandle, reason: &'static str) -> Result<()> {
	if value.type_id() == expected.id() {
		Ok(())
	} else {
		Err(MapError::InvalidMapArguments { key: key.clone(), reason })
	}
}

fn require_parameter(context: &MapContext<'_>, uses_parameter: bool) -> Result<()> {
	if uses_parameter && !context.has_parameter() {
		return Err(MapError::InvalidMapArguments {
			key: context.key().clone(),
			reason: "mapping requires a parameter",
		});
	}
	Ok(())
}

/// Null-policy verdict for a source value.
enum Gate {
	Pass(DynValue),
	Replace(DynValue),
	Skip,
}

/// Applies the binding's null policy when the source value is `None`.
fn gate(binding: &MemberBinding, from: &ValueType, value: DynValue, context: &MapContext<'_>) -> Result<Gate> {
	let is_none = from.optional_ops().is_some_and(|ops| ops.is_none(&*value));
	if !is_none {
		return Ok(Gate::Pass(value));
	}
	let policy = binding.null_policy();
	if let Some(substitute) = policy.substitute() {
		let name = binding.destination().name();
		let fail = |e: BoxError| MapError::member(context.key(), name, e);
		let raw = substitute.produce(context).map_err(fail)?;
		return Ok(match substitute.converter().convert(raw).map_err(fail)? {
			Converted::Value(replacement) => Gate::Replace(replacement),
			Converted::Absent => Gate::Skip,
		});
	}
	if policy.ignore() {
		return Ok(Gate::Skip);
	}
	Ok(Gate::Pass(value))
}

fn apply(
	binding: &MemberBinding,
	source: &dyn Any,
	destination: &mut dyn Any,
	context: &MapContext<'_>,
	nested: &dyn NestedMapper,
) -> Result<()> {
	let key = context.key();
	let member = binding.destination();
	let fail = |e: BoxError| MapError::member(key, member.name(), e);

	let value = match binding.strategy() {
		BindingStrategy::Copy { source: from, converter } => {
			match gate(binding, &from.value_type(), read(key, from, source)?, context)? {
				Gate::Pass(value) => convert(converter, value).map_err(fail)?,
				Gate::Replace(value) => Some(value),
				Gate::Skip => None,
			}
		}
		BindingStrategy::Computed { producer, converter } => {
			require_parameter(context, producer.uses_parameter())?;
			let raw = producer.produce(source, &*destination, context).map_err(fail)?;
			convert(converter, raw).map_err(fail)?
		}
		BindingStrategy::SubMap { source: from, plan } => {
			match gate(binding, &from.value_type(), read(key, from, source)?, context)? {
				Gate::Pass(value) => map_object(plan, value, context, nested)?,
				Gate::Replace(value) => Some(value),
				Gate::Skip => None,
			}
		}
		BindingStrategy::Sequence { source: from, plan } => {
			match gate(binding, &from.value_type(), read(key, from, source)?, context)? {
				Gate::Pass(value) => map_sequence(plan, from, member, value, context, nested)?,
				Gate::Replace(value) => Some(value),
				Gate::Skip => None,
			}
		}
	};

	if let Some(value) = value {
		write(member, destination, value)?;
	}
	Ok(())
}

fn read(key: &TypeKey, member: &Member, source: &dyn Any) -> Result<DynValue> {
	member.get(source).ok_or_else(|| MapError::ValueTypeMismatch {
		expected: key.source(),
	})
}

fn write(member: &Member, destination: &mut dyn Any, value: DynValue) -> Result<()> {
	member.set(destination, value).map_err(|_| MapError::ValueTypeMismatch {
		expected: member.value_type().handle(),
	})
}

fn convert(converter: &ResolvedConverter, value: DynValue) -> std::result::Result<Option<DynValue>, BoxError> {
	Ok(match converter.convert(value)? {
		Converted::Value(value) => Some(value),
		Converted::Absent => None,
	})
}

/// Maps one object value (or optional object value) through a nested type pair.
///
/// A `None` source becomes `None` for an optional destination and leaves a required
/// destination untouched.
fn map_object(plan: &ObjectPlan, value: DynValue, context: &MapContext<'_>, nested: &dyn NestedMapper) -> Result<Option<DynValue>> {
	let mismatch = || MapError::ValueTypeMismatch {
		expected: plan.request().key().source(),
	};
	let inner = match plan.source_optional() {
		Some(ops) => match ops.take(value).ok_or_else(mismatch)? {
			Some(inner) => inner,
			None => return Ok(plan.destination_optional().map(|ops| ops.none())),
		},
		None => value,
	};

	let mapped = nested.map_nested(plan.request(), &*inner, context.raw_parameter())?;
	match plan.destination_optional() {
		Some(ops) => ops.some(mapped).map(Some).ok_or_else(|| MapError::ValueTypeMismatch {
			expected: plan.request().key().destination(),
		}),
		None => Ok(Some(mapped)),
	}
}

/// Maps a sequence (or optional sequence) value element-wise.
///
/// Elements that convert to nothing are dropped. A `None` source follows the same
/// rule as [`map_object`].
fn map_sequence(
	plan: &SequencePlan,
	from: &Member,
	to: &Member,
	value: DynValue,
	context: &MapContext<'_>,
	nested: &dyn NestedMapper,
) -> Result<Option<DynValue>> {
	let fail = |e: BoxError| MapError::member(context.key(), to.name(), e);
	let mismatch = || MapError::ValueTypeMismatch {
		expected: from.value_type().handle(),
	};
	let value = match plan.source_optional() {
		Some(ops) => match ops.take(value).ok_or_else(mismatch)? {
			Some(inner) => inner,
			None => return Ok(plan.destination_optional().map(|ops| ops.none())),
		},
		None => value,
	};

	let items = plan.source().split(value).ok_or_else(mismatch)?;
	let mut out = Vec::with_capacity(items.len());
	for item in items {
		let mapped = match plan.element() {
			ElementPlan::Convert(converter) => convert(converter, item).map_err(fail)?,
			ElementPlan::Object(object) => map_object(object, item, context, nested)?,
		};
		out.extend(mapped);
	}

	let to_mismatch = || MapError::ValueTypeMismatch {
		expected: to.value_type().handle(),
	};
	let collected = plan.destination().collect(out).ok_or_else(to_mismatch)?;
	match plan.destination_optional() {
		Some(ops) => ops.some(collected).map(Some).ok_or_else(to_mismatch),
		None => Ok(Some(collected)),
	}
}
