use super::*;

fn vt<T: ValueKind>() -> ValueType {
	T::value_type()
}

fn convert<T: ValueKind, U: ValueKind>(resolved: &ResolvedConverter, value: T) -> Option<U> {
	match resolved.convert(Box::new(value)).expect("conversion failed") {
		Converted::Value(out) => Some(*out.downcast::<U>().expect("wrong output type")),
		Converted::Absent => None,
	}
}

fn int_to_string() -> ConverterResolver {
	let mut resolver = ConverterResolver::new();
	resolver.register::<i32, String, _>(|v: i32| Ok(v.to_string()));
	resolver
}

#[test]
fn test_identity_for_same_type() {
	let resolver = ConverterResolver::new();
	let resolved = resolver.resolve(&vt::<u64>(), &vt::<u64>()).unwrap();
	assert_eq!(resolved.path(), ConversionPath::Identity);
	assert!(!resolved.is_registered());
	assert_eq!(convert::<u64, u64>(&resolved, 7), Some(7));
}

#[test]
fn test_exact_registered() {
	let resolver = int_to_string();
	let resolved = resolver.resolve(&vt::<i32>(), &vt::<String>()).unwrap();
	assert_eq!(resolved.path(), ConversionPath::Exact);
	assert_eq!(convert::<i32, String>(&resolved, 42), Some("42".to_string()));
}

#[test]
fn test_exact_outranks_identity() {
	let mut resolver = ConverterResolver::new();
	resolver.register::<String, String, _>(|s: String| Ok(s.to_uppercase()));
	let resolved = resolver.resolve(&vt::<String>(), &vt::<String>()).unwrap();
	assert_eq!(resolved.path(), ConversionPath::Exact);
	assert_eq!(convert::<String, String>(&resolved, "ab".into()), Some("AB".to_string()));
}

#[test]
fn test_destination_unwrap() {
	let resolver = ConverterResolver::new();
	let resolved = resolver.resolve(&vt::<i32>(), &vt::<Option<i32>>()).unwrap();
	assert_eq!(resolved.path(), ConversionPath::WrapDestination);
	assert_eq!(convert::<i32, Option<i32>>(&resolved, 5), Some(Some(5)));
}

#[test]
fn test_destination_unwrap_with_registered_converter() {
	let resolver = int_to_string();
	let resolved = resolver.resolve(&vt::<i32>(), &vt::<Option<String>>()).unwrap();
	assert_eq!(resolved.path(), ConversionPath::WrapDestination);
	assert_eq!(
		convert::<i32, Option<String>>(&resolved, 9),
		Some(Some("9".to_string()))
	);
}

#[test]
fn test_source_wrap() {
	let mut resolver = ConverterResolver::new();
	resolver.register::<Option<i32>, String, _>(|v: Option<i32>| Ok(v.map_or("none".into(), |v| v.to_string())));
	let resolved = resolver.resolve(&vt::<i32>(), &vt::<String>()).unwrap();
	assert_eq!(resolved.path(), ConversionPath::WrapSource);
	assert_eq!(convert::<i32, String>(&resolved, 3), Some("3".to_string()));
}

#[test]
fn test_source_wrap_and_destination_unwrap() {
	let mut resolver = ConverterResolver::new();
	resolver.register::<Option<i32>, String, _>(|v: Option<i32>| Ok(format!("{v:?}")));
	let resolved = resolver.resolve(&vt::<i32>(), &vt::<Option<String>>()).unwrap();
	assert_eq!(resolved.path(), ConversionPath::WrapSourceAndDestination);
	assert_eq!(
		convert::<i32, Option<String>>(&resolved, 1),
		Some(Some("Some(1)".to_string()))
	);
}

#[test]
fn test_source_unwrap_leaves_none_absent() {
	let resolver = ConverterResolver::new();
	let resolved = resolver.resolve(&vt::<Option<i32>>(), &vt::<i32>()).unwrap();
	assert_eq!(resolved.path(), ConversionPath::UnwrapSource);
	assert_eq!(convert::<Option<i32>, i32>(&resolved, Some(4)), Some(4));
	assert_eq!(convert::<Option<i32>, i32>(&resolved, None), None);
}

#[test]
fn test_registered_inner_outranks_optional_identity() {
	let mut resolver = ConverterResolver::new();
	resolver.register::<i32, i32, _>(|v: i32| Ok(v * 10));
	let resolved = resolver
		.resolve(&vt::<Option<i32>>(), &vt::<Option<i32>>())
		.unwrap();
	assert_eq!(resolved.path(), ConversionPath::UnwrapSourceWrapDestination);
	assert_eq!(
		convert::<Option<i32>, Option<i32>>(&resolved, Some(2)),
		Some(Some(20))
	);
	assert_eq!(
		convert::<Option<i32>, Option<i32>>(&resolved, None),
		Some(None)
	);
}

#[test]
fn test_optional_identity_without_converters() {
	let resolver = ConverterResolver::new();
	let resolved = resolver
		.resolve(&vt::<Option<i32>>(), &vt::<Option<i32>>())
		.unwrap();
	assert_eq!(resolved.path(), ConversionPath::Identity);
}

#[test]
fn test_unsupported() {
	let resolver = ConverterResolver::new();
	let err = resolver.resolve(&vt::<String>(), &vt::<i32>()).unwrap_err();
	assert!(matches!(err, MapError::ConversionNotSupported { .. }));
	assert_eq!(err.to_string(), "no conversion from `String` to `i32`");
}

#[test]
fn test_register_replaces() {
	let mut resolver = int_to_string();
	resolver.register::<i32, String, _>(|v: i32| Ok(format!("#{v}")));
	assert_eq!(resolver.len(), 1);
	let resolved = resolver.resolve(&vt::<i32>(), &vt::<String>()).unwrap();
	assert_eq!(convert::<i32, String>(&resolved, 1), Some("#1".to_string()));
}

#[test]
fn test_register_from_and_try_from() {
	let mut resolver = ConverterResolver::new();
	resolver.register_from::<u8, u32>();
	resolver.register_try_from::<i64, u8>();
	assert!(resolver.contains::<u8, u32>());

	let widen = resolver.resolve(&vt::<u8>(), &vt::<u32>()).unwrap();
	assert_eq!(convert::<u8, u32>(&widen, 200), Some(200));

	let narrow = resolver.resolve(&vt::<i64>(), &vt::<u8>()).unwrap();
	assert_eq!(convert::<i64, u8>(&narrow, 12), Some(12));
	assert!(narrow.convert(Box::new(300i64)).is_err());
}

#[test]
fn test_converter_error_surfaces() {
	let mut resolver = ConverterResolver::new();
	resolver.register::<String, i32, _>(|s: String| s.parse::<i32>().map_err(Into::into));
	let resolved = resolver.resolve(&vt::<String>(), &vt::<i32>()).unwrap();
	assert!(resolved.convert(Box::new("x".to_string())).is_err());
}

#[test]
fn test_wrong_input_type_is_mismatch() {
	let resolver = int_to_string();
	let resolved = resolver.resolve(&vt::<i32>(), &vt::<String>()).unwrap();
	let err = resolved.convert(Box::new(1u8)).unwrap_err();
	assert!(matches!(
		err.downcast_ref::<MapError>(),
		Some(MapError::ValueTypeMismatch { .. })
	));
}

#[test]
fn test_same_optional_type_never_leaves_destination_untouched() {
	let mut resolver = ConverterResolver::new();
	resolver.register::<String, Option<String>, _>(|s: String| Ok((!s.is_empty()).then_some(s)));
	let resolved = resolver
		.resolve(&vt::<Option<String>>(), &vt::<Option<String>>())
		.unwrap();
	assert_eq!(resolved.path(), ConversionPath::Identity);
	assert_eq!(
		convert::<Option<String>, Option<String>>(&resolved, None),
		Some(None)
	);
	assert_eq!(
		convert::<Option<String>, Option<String>>(&resolved, Some(String::new())),
		Some(Some(String::new()))
	);
}
