//! Derive macros for `waypoint`.
//!
//! This crate only ever generates `Route` impls; it has no runtime
//! behavior of its own.

use heck::ToSnakeCase;
use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, LitStr};

/// Derives `waypoint::Route` for an enum or struct.
///
/// For an enum, each variant contributes its snake_case name as the
/// identifier of that variant's value; an explicit identifier can be set
/// with `#[route(id = "...")]` on the variant. For a struct, the type's own
/// snake_case name is used unless overridden the same way on the struct
/// itself.
#[proc_macro_derive(Route, attributes(route))]
pub fn derive_route(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let body = match &input.data {
        Data::Enum(data) => {
            let arms = data.variants.iter().map(|variant| {
                let variant_ident = &variant.ident;
                let id = route_id_override(&variant.attrs)
                    .unwrap_or_else(|| variant_ident.to_string().to_snake_case());
                let pattern = match &variant.fields {
                    Fields::Unit => quote! { #name::#variant_ident },
                    Fields::Unnamed(_) => quote! { #name::#variant_ident(..) },
                    Fields::Named(_) => quote! { #name::#variant_ident { .. } },
                };
                quote! { #pattern => #id }
            });
            quote! {
                match self {
                    #(#arms,)*
                }
            }
        }
        Data::Struct(_) => {
            let id = route_id_override(&input.attrs)
                .unwrap_or_else(|| name.to_string().to_snake_case());
            quote! { #id }
        }
        Data::Union(_) => {
            return syn::Error::new_spanned(&input.ident, "Route cannot be derived for unions")
                .to_compile_error()
                .into();
        }
    };

    let expanded = quote! {
        impl #impl_generics ::waypoint::Route for #name #ty_generics #where_clause {
            fn identifier(&self) -> &str {
                #body
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
        }
    };

    TokenStream::from(expanded)
}

fn route_id_override(attrs: &[syn::Attribute]) -> Option<String> {
    for attr in attrs {
        if !attr.path().is_ident("route") {
            continue;
        }
        let mut found = None;
        let _ = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("id") {
                let value: LitStr = meta.value()?.parse()?;
                found = Some(value.value());
            }
            Ok(())
        });
        if found.is_some() {
            return found;
        }
    }
    None
}
