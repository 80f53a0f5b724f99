//! Code generation for the Attributes derive macro.

mod object;

use crate::parse::ObjectInput;
use darling::FromDeriveInput;
use proc_macro2::TokenStream;
use std::collections::HashSet;
use syn::DeriveInput;

/// Main entry point for code generation.
pub fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let parsed = ObjectInput::from_derive_input(input)
        .map_err(|e| syn::Error::new_spanned(input, e.to_string()))?;

    let mut seen = HashSet::new();
    for field in parsed.bound_fields() {
        let name = field.attr_name();
        if name.is_empty() {
            return Err(syn::Error::new_spanned(
                &field.ty,
                "#[attr(name = \"...\")] must not be empty",
            ));
        }
        if !seen.insert(name.clone()) {
            return Err(syn::Error::new_spanned(
                &field.ty,
                format!("attribute `{}` is bound to more than one field", name),
            ));
        }
    }

    let from_attr = object::generate_from_attr(&parsed);
    let to_attr = object::generate_to_attr(&parsed);
    Ok(quote::quote! {
        #from_attr
        #to_attr
    })
}
