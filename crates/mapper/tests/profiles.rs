use std::sync::Arc;

use graft_mapper::{MapRequest, Mappable, MapperConfig, Profile};
use pretty_assertions::assert_eq;

#[derive(Clone, Debug, Default, PartialEq, Mappable)]
struct Product {
	sku: String,
	title: String,
	vendor: Vendor,
}

#[derive(Clone, Debug, Default, PartialEq, Mappable)]
struct Vendor {
	name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Mappable)]
struct Listing {
	sku: String,
	title: String,
	vendor: VendorView,
}

#[derive(Clone, Debug, Default, PartialEq, Mappable)]
struct VendorView {
	name: String,
}

fn product() -> Product {
	Product {
		sku: "A-1".into(),
		title: "Lamp".into(),
		vendor: Vendor { name: "Acme".into() },
	}
}

fn config() -> MapperConfig {
	let mut config = MapperConfig::new();
	config.add_default_mapper().unwrap();
	config.create_map::<Product, Listing>().unwrap();
	config
		.create_map_in::<Product, Listing>("shouting")
		.unwrap()
		.convert_using("title", |p: &Product| Ok(p.title.to_uppercase()))
		.unwrap();
	config
		.create_map_in::<Vendor, VendorView>("shouting")
		.unwrap()
		.convert_using("name", |v: &Vendor| Ok(v.name.to_uppercase()))
		.unwrap();
	config
}

#[test]
fn profiles_are_isolated() {
	let mapper = config().build().unwrap();

	let plain: Listing = mapper.map(&product()).unwrap();
	let loud: Listing = mapper.profile("shouting").map(&product()).unwrap();

	assert_eq!(plain.title, "Lamp");
	assert_eq!(loud.title, "LAMP");
	assert_eq!(plain.sku, loud.sku);

	let default_entry = mapper.entry(&MapRequest::of::<Product, Listing>(None)).unwrap();
	let profiled_entry = mapper
		.entry(&MapRequest::of::<Product, Listing>(Some(Profile::from("shouting"))))
		.unwrap();
	assert!(!Arc::ptr_eq(&default_entry, &profiled_entry));
	assert_eq!(profiled_entry.key().profile().map(Profile::as_str), Some("shouting"));
}

#[test]
fn nested_maps_stay_in_profile() {
	let mapper = config().build().unwrap();

	let plain: Listing = mapper.map(&product()).unwrap();
	let loud: Listing = mapper.profile("shouting").map(&product()).unwrap();

	assert_eq!(plain.vendor.name, "Acme");
	assert_eq!(loud.vendor.name, "ACME");
}

#[test]
fn unknown_profile_falls_back_to_default_map() {
	let mapper = config().build().unwrap();
	let listing: Listing = mapper.profile("quiet").map(&product()).unwrap();
	assert_eq!(listing.title, "Lamp");

	let stats = mapper.stats();
	assert_eq!(stats.entries, 2);
}
