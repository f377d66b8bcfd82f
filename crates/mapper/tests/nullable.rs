use graft_mapper::{ConversionPath, Mappable, Mapper, MapperConfig, ValueKind};
use pretty_assertions::assert_eq;

#[derive(Clone, Debug, Default, PartialEq, Mappable)]
struct Plain {
	value: i32,
}

#[derive(Clone, Debug, Default, PartialEq, Mappable)]
struct Nullable {
	value: Option<i32>,
}

/// Default mapper plus a single `i32 -> i32` converter that doubles.
fn doubling() -> Mapper {
	let mut config = MapperConfig::new();
	config
		.add_default_mapper()
		.unwrap()
		.converter::<i32, i32, _>(|v: i32| Ok(v * 2))
		.unwrap();
	config.build().unwrap()
}

#[test]
fn exact_nullable_converter_wins() {
	let mut config = MapperConfig::new();
	config
		.add_default_mapper()
		.unwrap()
		.converter::<i32, i32, _>(|v: i32| Ok(v * 2))
		.unwrap()
		.converter::<i32, Option<i32>, _>(|v: i32| Ok((v != 0).then_some(v)))
		.unwrap();
	let mapper = config.build().unwrap();

	let out: Nullable = mapper.map(&Plain { value: 5 }).unwrap();
	assert_eq!(out.value, Some(5));
	let out: Nullable = mapper.map(&Plain { value: 0 }).unwrap();
	assert_eq!(out.value, None);
}

#[test]
fn plain_to_nullable_wraps() {
	let out: Nullable = doubling().map(&Plain { value: 5 }).unwrap();
	assert_eq!(out.value, Some(10));
}

#[test]
fn nullable_to_plain_unwraps() {
	let mapper = doubling();
	let out: Plain = mapper.map(&Nullable { value: Some(4) }).unwrap();
	assert_eq!(out.value, 8);

	let mut existing = Plain { value: 42 };
	mapper.map_into(&Nullable { value: None }, &mut existing).unwrap();
	assert_eq!(existing.value, 42);
}

#[test]
fn nullable_to_nullable_uses_base_converter() {
	let mapper = doubling();
	let out: Nullable = mapper.map(&Nullable { value: Some(3) }).unwrap();
	assert_eq!(out.value, Some(6));

	let mut existing = Nullable { value: Some(1) };
	mapper.map_into(&Nullable { value: None }, &mut existing).unwrap();
	assert_eq!(existing.value, None);
}

#[test]
fn resolution_paths() {
	let mapper = doubling();
	let converters = mapper.registry().converters();
	let path = |from, to| converters.resolve(&from, &to).unwrap().path();

	assert_eq!(path(i32::value_type(), i32::value_type()), ConversionPath::Exact);
	assert_eq!(
		path(i32::value_type(), Option::<i32>::value_type()),
		ConversionPath::WrapDestination
	);
	assert_eq!(
		path(Option::<i32>::value_type(), i32::value_type()),
		ConversionPath::UnwrapSource
	);
	assert_eq!(
		path(Option::<i32>::value_type(), Option::<i32>::value_type()),
		ConversionPath::UnwrapSourceWrapDestination
	);
}

#[derive(Clone, Debug, Default, PartialEq, Mappable)]
struct Note {
	text: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Mappable)]
struct NoteDto {
	text: Option<String>,
}

#[test]
fn same_optional_type_overwrites_with_none() {
	let mut config = MapperConfig::new();
	config
		.add_default_mapper()
		.unwrap()
		.converter::<String, Option<String>, _>(|s: String| Ok((!s.is_empty()).then_some(s)))
		.unwrap();
	let mapper = config.build().unwrap();

	let mut existing = NoteDto {
		text: Some("stale".into()),
	};
	mapper.map_into(&Note { text: None }, &mut existing).unwrap();
	assert_eq!(existing.text, None);
}
