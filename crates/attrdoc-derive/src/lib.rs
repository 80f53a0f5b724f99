//! Derive macro for attrdoc's `FromAttr` / `ToAttr` traits.
//!
//! `#[derive(Attributes)]` binds the named fields of a struct to the
//! attributes of an object value. The generated impls decode every field,
//! report every failing field, and require the struct's field set to equal
//! the object's attribute set exactly.
//!
//! # Usage
//!
//! ```ignore
//! use attrdoc::Attributes;
//!
//! #[derive(Attributes)]
//! struct Disk {
//!     name: String,
//!     #[attr(name = "size_gb")]
//!     size: Option<u32>,
//!     #[attr(skip)]
//!     cached: bool,
//! }
//! ```

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod codegen;
mod parse;

/// Derive `FromAttr` and `ToAttr` for a struct with named fields.
///
/// # Field Attributes
///
/// - `#[attr(name = "attr_name")]`: Bind the field to a differently named attribute
/// - `#[attr(skip)]`: Leave the field out; it must implement `Default`
///
/// Every other field is bound to the attribute with the field's own name.
/// Field types must implement `FromAttr` and `ToAttr` themselves.
#[proc_macro_derive(Attributes, attributes(attr))]
pub fn derive_attributes(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match codegen::expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
