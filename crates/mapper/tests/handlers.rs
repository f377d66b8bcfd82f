use graft_mapper::{
	MapError, MapRequest, Mappable, MapperConfig, MappingOption, MappingRequest, MissingHandler, OptionOrigin, Result,
	TypeHandle,
};
use pretty_assertions::assert_eq;

fn init_tracing() {
	let _ = tracing_subscriber::fmt()
		.with_test_writer()
		.with_max_level(tracing::Level::DEBUG)
		.try_init();
}

#[derive(Clone, Debug, Default, PartialEq, Mappable)]
struct Invoice {
	number: String,
	customer_name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Mappable)]
struct InvoiceRow {
	number: String,
	customer: String,
}

/// Maps `customer` from `customer_name` for any pair whose destination has a
/// `customer` member and whose source has a `customer_name` member.
struct CustomerAlias;

impl MissingHandler for CustomerAlias {
	fn name(&self) -> &'static str {
		"customer-alias"
	}

	fn priority(&self) -> i32 {
		10
	}

	fn handle(&self, request: &MappingRequest<'_>) -> Result<Option<MappingOption>> {
		if request.destination().member("customer").is_none() || request.source().member("customer_name").is_none() {
			return Ok(None);
		}
		let mut rules = request.rules();
		rules.map_from("customer", "customer_name")?;
		request.assemble(&rules, OptionOrigin::Handler(self.name())).map(Some)
	}
}

/// Declines everything.
struct Never;

impl MissingHandler for Never {
	fn name(&self) -> &'static str {
		"never"
	}

	fn handle(&self, _: &MappingRequest<'_>) -> Result<Option<MappingOption>> {
		Ok(None)
	}
}

/// Refuses to map into `InvoiceRow`.
struct Refuse;

impl MissingHandler for Refuse {
	fn name(&self) -> &'static str {
		"refuse"
	}

	fn priority(&self) -> i32 {
		-1
	}

	fn handle(&self, request: &MappingRequest<'_>) -> Result<Option<MappingOption>> {
		if request.destination().handle() == TypeHandle::of::<InvoiceRow>() {
			return Err(MapError::MappingNotConfigured {
				key: request.key().clone(),
			});
		}
		Ok(None)
	}
}

fn invoice() -> Invoice {
	Invoice {
		number: "INV-3".into(),
		customer_name: "Lin".into(),
	}
}

#[test]
fn custom_handler_runs_before_default() {
	init_tracing();
	let mut config = MapperConfig::new();
	config
		.add_default_mapper()
		.unwrap()
		.add_handler(Never)
		.unwrap()
		.add_handler(CustomerAlias)
		.unwrap();
	let mapper = config.build().unwrap();

	let row: InvoiceRow = mapper.map(&invoice()).unwrap();
	assert_eq!(
		row,
		InvoiceRow {
			number: "INV-3".into(),
			customer: "Lin".into(),
		}
	);

	let entry = mapper.entry(&MapRequest::of::<Invoice, InvoiceRow>(None)).unwrap();
	assert_eq!(entry.option().origin(), OptionOrigin::Handler("customer-alias"));
}

#[test]
fn declining_handlers_fall_through_to_default() {
	init_tracing();
	let mut config = MapperConfig::new();
	config.add_handler(Never).unwrap().add_default_mapper().unwrap();
	let mapper = config.build().unwrap();

	let row: InvoiceRow = mapper.map(&invoice()).unwrap();
	assert_eq!(row.number, "INV-3");
	assert_eq!(row.customer, "");

	let entry = mapper.entry(&MapRequest::of::<Invoice, InvoiceRow>(None)).unwrap();
	assert_eq!(entry.option().origin(), OptionOrigin::Handler("default-member"));
}

#[test]
fn handler_error_stops_the_chain() {
	init_tracing();
	let mut config = MapperConfig::new();
	config.add_default_mapper().unwrap().add_handler(Refuse).unwrap();
	let mapper = config.build().unwrap();

	let err = mapper.map::<Invoice, InvoiceRow>(&invoice()).unwrap_err();
	assert!(matches!(err, MapError::MappingNotConfigured { .. }), "{err}");
}

#[test]
fn explicit_map_bypasses_handlers() {
	init_tracing();
	let mut config = MapperConfig::new();
	config.add_handler(Refuse).unwrap();
	config.create_map::<Invoice, InvoiceRow>().unwrap();
	let mapper = config.build().unwrap();

	let row: InvoiceRow = mapper.map(&invoice()).unwrap();
	assert_eq!(row.number, "INV-3");
	let entry = mapper.entry(&MapRequest::of::<Invoice, InvoiceRow>(None)).unwrap();
	assert_eq!(entry.option().origin(), OptionOrigin::Explicit);
}
