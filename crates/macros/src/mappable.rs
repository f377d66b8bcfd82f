//! `#[derive(Mappable)]` implementation.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::{Data, DeriveInput, Fields, parse_macro_input};

/// Parsed `#[mappable(...)]` options of one field.
#[derive(Default)]
struct FieldOptions {
	skip: bool,
	rename: Option<String>,
	read_only: bool,
}

pub fn derive_mappable(input: TokenStream) -> TokenStream {
	let input = parse_macro_input!(input as DeriveInput);
	expand(&input).unwrap_or_else(|e| e.to_compile_error()).into()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
	if !input.generics.params.is_empty() {
		return Err(syn::Error::new_spanned(
			&input.generics,
			"Mappable cannot be derived for generic types",
		));
	}
	let Data::Struct(data) = &input.data else {
		return Err(syn::Error::new_spanned(input, "Mappable can only be derived for structs"));
	};
	let Fields::Named(fields) = &data.fields else {
		return Err(syn::Error::new_spanned(
			&data.fields,
			"Mappable requires a struct with named fields",
		));
	};

	let mut constructible = true;
	for attr in input.attrs.iter().filter(|a| a.path().is_ident("mappable")) {
		attr.parse_nested_meta(|meta| {
			if meta.path.is_ident("no_default") {
				constructible = false;
				Ok(())
			} else {
				Err(meta.error("unknown mappable attribute; expected `no_default`"))
			}
		})?;
	}

	let name = &input.ident;
	let mut accessors = Vec::new();
	let mut members = Vec::new();

	for field in &fields.named {
		let options = field_options(field)?;
		if options.skip {
			continue;
		}
		let Some(ident) = &field.ident else { continue };
		let ty = &field.ty;
		let unraw = ident.unraw().to_string();
		let member_name = options.rename.unwrap_or_else(|| unraw.clone());
		let getter = format_ident!("__get_{}", unraw);
		let setter = format_ident!("__set_{}", unraw);

		accessors.push(quote! {
			fn #getter(object: &dyn ::core::any::Any) -> ::core::option::Option<::graft_mapper::DynValue> {
				object
					.downcast_ref::<#name>()
					.map(|object| ::std::boxed::Box::new(::core::clone::Clone::clone(&object.#ident)) as ::graft_mapper::DynValue)
			}
		});

		let set = if options.read_only {
			quote! { ::core::option::Option::None }
		} else {
			accessors.push(quote! {
				fn #setter(
					object: &mut dyn ::core::any::Any,
					value: ::graft_mapper::DynValue,
				) -> ::core::result::Result<(), ::graft_mapper::DynValue> {
					let ::core::option::Option::Some(object) = object.downcast_mut::<#name>() else {
						return ::core::result::Result::Err(value);
					};
					object.#ident = *value.downcast::<#ty>()?;
					::core::result::Result::Ok(())
				}
			});
			quote! { ::core::option::Option::Some(#setter) }
		};

		members.push(quote! {
			::graft_mapper::Member::new(
				#member_name,
				<#ty as ::graft_mapper::ValueKind>::value_type,
				::core::option::Option::Some(#getter),
				#set,
			)
		});
	}

	let construct = if constructible {
		accessors.push(quote! {
			fn __construct() -> ::graft_mapper::DynValue {
				::std::boxed::Box::new(<#name as ::core::default::Default>::default())
			}
		});
		quote! { ::core::option::Option::Some(__construct) }
	} else {
		quote! { ::core::option::Option::None }
	};

	let count = members.len();
	Ok(quote! {
		impl ::graft_mapper::Mappable for #name {
			fn shape() -> &'static ::graft_mapper::Shape {
				#(#accessors)*

				static MEMBERS: [::graft_mapper::Member; #count] = [#(#members),*];
				static SHAPE: ::graft_mapper::Shape = ::graft_mapper::Shape::new(
					::core::stringify!(#name),
					::graft_mapper::TypeHandle::of::<#name>,
					&MEMBERS,
					#construct,
				);
				&SHAPE
			}
		}

		impl ::graft_mapper::ValueKind for #name {
			fn value_type() -> ::graft_mapper::ValueType {
				::graft_mapper::ValueType::object::<Self>()
			}
		}
	})
}

fn field_options(field: &syn::Field) -> syn::Result<FieldOptions> {
	let mut options = FieldOptions::default();
	for attr in field.attrs.iter().filter(|a| a.path().is_ident("mappable")) {
		attr.parse_nested_meta(|meta| {
			if meta.path.is_ident("skip") {
				options.skip = true;
				Ok(())
			} else if meta.path.is_ident("rename") {
				let value: syn::LitStr = meta.value()?.parse()?;
				options.rename = Some(value.value());
				Ok(())
			} else if meta.path.is_ident("read_only") {
				options.read_only = true;
				Ok(())
			} else {
				Err(meta.error("unknown mappable attribute; expected `skip`, `rename`, or `read_only`"))
			}
		})?;
	}
	Ok(options)
}
