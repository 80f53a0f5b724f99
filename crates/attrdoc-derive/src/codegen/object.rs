//! `FromAttr` / `ToAttr` impl generation.
//!
//! Both impls go through the object reader and writer on
//! `::attrdoc::Marshaler`, which check the field set and collect per-field
//! diagnostics.

use crate::parse::ObjectInput;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};

/// Generate `impl FromAttr`.
///
/// All bound fields are decoded before any result is unwrapped so that every
/// failing field is reported.
pub fn generate_from_attr(input: &ObjectInput) -> TokenStream {
    let struct_name = &input.ident;
    let target = struct_name.to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let bound = input.bound_fields();
    let keys: Vec<String> = bound.iter().map(|f| f.attr_name()).collect();
    let idents: Vec<_> = bound.iter().map(|f| &f.ident).collect();
    let locals: Vec<_> = bound
        .iter()
        .enumerate()
        .map(|(i, _)| format_ident!("__field{}", i))
        .collect();
    let tys: Vec<_> = bound.iter().map(|f| &f.ty).collect();
    let skipped: Vec<_> = input
        .fields()
        .into_iter()
        .filter(|f| f.skip)
        .map(|f| &f.ident)
        .collect();

    quote! {
        impl #impl_generics ::attrdoc::FromAttr for #struct_name #ty_generics #where_clause {
            #[allow(unused_variables)]
            fn from_attr(
                __m: &mut ::attrdoc::Marshaler<'_>,
                __ty: &dyn ::attrdoc::AttrType,
                __value: &::attrdoc::Value,
                __path: &::attrdoc::Path,
            ) -> ::core::option::Option<Self> {
                let __obj = __m.read_object(__ty, __value, __path, #target, &[#(#keys),*])?;
                #(
                    let #locals = __obj.field::<#tys>(__m, #keys);
                )*
                ::core::option::Option::Some(Self {
                    #( #idents: #locals?, )*
                    #( #skipped: ::core::default::Default::default(), )*
                })
            }
        }
    }
}

/// Generate `impl ToAttr`.
pub fn generate_to_attr(input: &ObjectInput) -> TokenStream {
    let struct_name = &input.ident;
    let target = struct_name.to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let bound = input.bound_fields();
    let keys: Vec<String> = bound.iter().map(|f| f.attr_name()).collect();
    let idents: Vec<_> = bound.iter().map(|f| &f.ident).collect();

    quote! {
        impl #impl_generics ::attrdoc::ToAttr for #struct_name #ty_generics #where_clause {
            fn to_attr(
                &self,
                __m: &mut ::attrdoc::Marshaler<'_>,
                __ty: &dyn ::attrdoc::AttrType,
                __path: &::attrdoc::Path,
            ) -> ::core::option::Option<::attrdoc::Value> {
                #[allow(unused_mut)]
                let mut __obj = __m.write_object(__ty, __path, #target, &[#(#keys),*])?;
                #(
                    __obj.field(__m, #keys, &self.#idents);
                )*
                __obj.finish(__m)
            }
        }
    }
}
