//! Procedural macros for the graft object mapper.
//!
//! * `#[derive(Mappable)]` - static member table for a plain struct

use proc_macro::TokenStream;

/// Mappable derive macro implementation.
mod mappable;

/// Derives `graft_mapper::Mappable` and `graft_mapper::ValueKind` for a struct
/// with named fields.
///
/// Every field becomes a readable and writable member. Field types must implement
/// `Clone` and `ValueKind`. Unless `no_default` is given, the struct must implement
/// `Default` so the mapper can create fresh destinations.
///
/// Attributes:
/// * `#[mappable(no_default)]` on the struct - no default constructor; mapping into a
///   new instance then requires `construct_using`
/// * `#[mappable(skip)]` - field is not a member
/// * `#[mappable(rename = "name")]` - member name differs from the field name
/// * `#[mappable(read_only)]` - member can be read but never written
///
/// ```ignore
/// #[derive(Clone, Default, Mappable)]
/// pub struct UserDto {
///     pub id: u64,
///     #[mappable(rename = "displayName")]
///     pub display_name: String,
///     #[mappable(skip)]
///     pub cache_token: Option<u64>,
/// }
/// ```
#[proc_macro_derive(Mappable, attributes(mappable))]
pub fn derive_mappable(input: TokenStream) -> TokenStream {
	mappable::derive_mappable(input)
}
