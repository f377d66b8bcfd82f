use graft_mapper::{Mappable, Mapper, MapperConfig};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

#[derive(Clone, Debug, Default, PartialEq, Mappable)]
struct Entity {
	id: u32,
	name: String,
	email: Option<String>,
	balance: i64,
	flags: Vec<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Mappable)]
struct Record {
	id: u32,
	name: String,
	email: Option<String>,
	balance: i64,
	flags: Vec<bool>,
}

fn mapper() -> Mapper {
	let mut config = MapperConfig::new();
	config.create_map::<Entity, Record>().unwrap();
	config.create_map::<Record, Entity>().unwrap();
	config.build().unwrap()
}

fn entity() -> impl Strategy<Value = Entity> {
	(
		any::<u32>(),
		"[a-zA-Z ]{0,24}",
		proptest::option::of("[a-z]{1,8}@[a-z]{1,8}\\.com"),
		any::<i64>(),
		proptest::collection::vec(any::<bool>(), 0..8),
	)
		.prop_map(|(id, name, email, balance, flags)| Entity {
			id,
			name,
			email,
			balance,
			flags,
		})
}

proptest! {
	#[test]
	fn round_trip_is_stable(source in entity()) {
		let mapper = mapper();
		let once: Record = mapper.map(&source).unwrap();
		let back: Entity = mapper.map(&once).unwrap();
		let again: Record = mapper.map(&back).unwrap();
		prop_assert_eq!(&again, &once);
		prop_assert_eq!(&back, &source);
	}
}

#[test]
fn round_trip_explicit_example() {
	let mapper = mapper();
	let source = Entity {
		id: 9,
		name: "Grace".into(),
		email: None,
		balance: -12,
		flags: vec![true, false],
	};
	let record: Record = mapper.map(&source).unwrap();
	assert_eq!(
		record,
		Record {
			id: 9,
			name: "Grace".into(),
			email: None,
			balance: -12,
			flags: vec![true, false],
		}
	);
	let back: Entity = mapper.map(&record).unwrap();
	assert_eq!(back, source);
}
