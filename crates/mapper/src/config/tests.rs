use pretty_assertions::assert_eq;

use super::*;
use crate::Mappable;
use crate::handler::MappingRequest;
use crate::option::MappingOption;

#[derive(Clone, Default, Mappable)]
struct Account {
	id: u64,
	name: String,
}

#[derive(Clone, Default, Mappable)]
struct AccountView {
	id: u64,
	name: String,
	#[mappable(read_only)]
	created: u64,
}

struct Named(&'static str, i32);

impl MissingHandler for Named {
	fn name(&self) -> &'static str {
		self.0
	}

	fn priority(&self) -> i32 {
		self.1
	}

	fn handle(&self, _request: &MappingRequest<'_>) -> Result<Option<MappingOption>> {
		Ok(None)
	}
}

#[test]
fn test_unknown_member_suggests_closest() {
	let mut config = MapperConfig::new();
	let err = config
		.create_map::<Account, AccountView>()
		.unwrap()
		.map_from("nmae", "name")
		.err()
		.unwrap();
	match err {
		MapError::InvalidMemberBinding { member, suggestion, .. } => {
			assert_eq!(member, "nmae");
			assert_eq!(suggestion.as_deref(), Some("name"));
		}
		other => panic!("unexpected error: {other}"),
	}
}

#[test]
fn test_unknown_source_member() {
	let mut config = MapperConfig::new();
	let err = config
		.create_map::<Account, AccountView>()
		.unwrap()
		.map_from("name", "title")
		.err()
		.unwrap();
	assert!(matches!(err, MapError::InvalidMemberBinding { ref member, .. } if member == "title"));
}

#[test]
fn test_read_only_destination_rejected() {
	let mut config = MapperConfig::new();
	let err = config
		.create_map::<Account, AccountView>()
		.unwrap()
		.constant("created", 1u64)
		.err()
		.unwrap();
	assert!(matches!(err, MapError::InvalidMemberBinding { suggestion: None, .. }));
}

#[test]
fn test_conflicting_strategies() {
	let mut config = MapperConfig::new();
	let err = config
		.create_map::<Account, AccountView>()
		.unwrap()
		.constant("name", "fixed".to_string())
		.unwrap()
		.convert_using("name", |a: &Account| Ok(a.name.to_uppercase()))
		.err()
		.unwrap();
	match err {
		MapError::ConflictingBinding {
			member,
			existing,
			incoming,
			..
		} => {
			assert_eq!(member, "name");
			assert_eq!(existing, "constant");
			assert_eq!(incoming, "convert_using");
		}
		other => panic!("unexpected error: {other}"),
	}
}

#[test]
fn test_conflicting_null_policies() {
	let mut config = MapperConfig::new();
	let err = config
		.create_map::<Account, AccountView>()
		.unwrap()
		.null_if("name", String::new())
		.unwrap()
		.null_ignore("name")
		.err()
		.unwrap();
	assert!(matches!(
		err,
		MapError::ConflictingBinding {
			existing: "null_if",
			incoming: "null_ignore",
			..
		}
	));
}

#[test]
fn test_null_rules_rejected_on_computed_members() {
	let mut config = MapperConfig::new();
	let err = config
		.create_map::<Account, AccountView>()
		.unwrap()
		.convert_using("name", |a: &Account| Ok(a.name.clone()))
		.unwrap()
		.null_ignore("name")
		.err()
		.unwrap();
	assert!(matches!(
		err,
		MapError::ConflictingBinding {
			existing: "convert_using",
			incoming: "null_ignore",
			..
		}
	));

	let err = config
		.create_map::<Account, AccountView>()
		.unwrap()
		.null_if("id", 0u64)
		.unwrap()
		.constant("id", 9u64)
		.err()
		.unwrap();
	assert!(matches!(
		err,
		MapError::ConflictingBinding {
			existing: "null_if",
			incoming: "constant",
			..
		}
	));
}

#[test]
fn test_reopening_extends_draft() {
	let mut config = MapperConfig::new();
	config.create_map::<Account, AccountView>().unwrap().ignore("id").unwrap();
	let builder = config.create_map::<Account, AccountView>().unwrap();
	assert!(!builder.rules().is_empty());
	let err = builder.map_from("id", "id").err().unwrap();
	assert!(matches!(
		err,
		MapError::ConflictingBinding {
			existing: "ignore",
			incoming: "map_from",
			..
		}
	));
}

#[test]
fn test_frozen_after_build() {
	let mut config = MapperConfig::new();
	config.add_default_mapper().unwrap();
	let mapper = config.build().unwrap();
	assert!(config.is_frozen());

	assert!(matches!(
		config.create_map::<Account, AccountView>().err(),
		Some(MapError::ConfigurationFrozen)
	));
	assert!(matches!(config.add_default_mapper(), Err(MapError::ConfigurationFrozen)));
	assert!(matches!(
		config.converter::<u64, String, _>(|v: u64| Ok(v.to_string())),
		Err(MapError::ConfigurationFrozen)
	));

	let view: AccountView = mapper
		.map(&Account {
			id: 3,
			name: "ada".into(),
		})
		.unwrap();
	assert_eq!((view.id, view.name.as_str()), (3, "ada"));
}

#[test]
fn test_build_again_shares_registry() {
	let mut config = MapperConfig::new();
	config.add_default_mapper().unwrap();
	let first = config.build().unwrap();
	let second = config.build().unwrap();

	assert!(Arc::ptr_eq(first.registry(), second.registry()));
	let _: AccountView = first.map(&Account::default()).unwrap();
	assert_eq!(first.stats().compilations, 1);
	assert_eq!(second.stats().compilations, 0);
}

#[test]
fn test_handler_priority_order() {
	let mut config = MapperConfig::new();
	config
		.add_default_mapper()
		.unwrap()
		.add_handler(Named("late", 10))
		.unwrap()
		.add_handler(Named("first", -1))
		.unwrap()
		.add_handler(Named("tie-a", 0))
		.unwrap()
		.add_handler(Named("tie-b", 0))
		.unwrap();
	let mapper = config.build().unwrap();
	let names: Vec<_> = mapper.registry().handlers().names().collect();
	assert_eq!(names, vec!["first", "tie-a", "tie-b", "late", "default-member"]);
}

#[test]
fn test_settings_from_toml() {
	let settings: MapperSettings = toml::from_str(
		r#"
		strict = true
		name-matching = "exact"
		"#,
	)
	.unwrap();
	assert_eq!(
		settings,
		MapperSettings {
			strict: true,
			name_matching: NameMatching::Exact,
			null_ignore: false,
		}
	);

	let config = MapperConfig::with_settings(settings.clone());
	assert_eq!(config.settings(), &settings);
}

#[test]
fn test_settings_reject_unknown_keys() {
	assert!(toml::from_str::<MapperSettings>("stricct = true").is_err());
}

#[test]
fn test_name_matching() {
	assert!(NameMatching::CaseInsensitive.matches("UserId", "userid"));
	assert!(!NameMatching::Exact.matches("UserId", "userid"));
	assert!(NameMatching::Exact.matches("id", "id"));
}
