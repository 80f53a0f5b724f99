//! Parsing logic for the Attributes derive macro.

use darling::{ast, FromDeriveInput, FromField};
use syn::{Generics, Ident, Type};

/// Parsed struct-level input.
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(attr), supports(struct_named))]
pub struct ObjectInput {
    /// The struct identifier.
    pub ident: Ident,

    /// Generic parameters.
    pub generics: Generics,

    /// Struct data (fields).
    pub data: ast::Data<(), FieldInput>,
}

impl ObjectInput {
    /// Get the fields as a vector.
    pub fn fields(&self) -> Vec<&FieldInput> {
        self.data
            .as_ref()
            .take_struct()
            .map(|s| s.fields)
            .unwrap_or_default()
    }

    /// Fields bound to an attribute, in declaration order.
    pub fn bound_fields(&self) -> Vec<&FieldInput> {
        self.fields().into_iter().filter(|f| !f.skip).collect()
    }
}

/// Parsed field-level options.
#[derive(Debug, FromField)]
#[darling(attributes(attr))]
pub struct FieldInput {
    /// Field identifier; always present for named structs.
    pub ident: Option<Ident>,

    /// Field type.
    pub ty: Type,

    /// Attribute name, if different from the field name.
    #[darling(default)]
    pub name: Option<String>,

    /// Leave the field out of conversion.
    #[darling(default)]
    pub skip: bool,
}

impl FieldInput {
    /// The attribute this field is bound to.
    pub fn attr_name(&self) -> String {
        match (&self.name, &self.ident) {
            (Some(name), _) => name.clone(),
            (None, Some(ident)) => ident.to_string(),
            (None, None) => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use darling::FromDeriveInput;
    use syn::parse_quote;

    #[test]
    fn test_parse_basic_struct() {
        let input: syn::DeriveInput = parse_quote! {
            struct Disk {
                name: String,
                size: u32,
            }
        };

        let parsed = ObjectInput::from_derive_input(&input).unwrap();
        assert_eq!(parsed.ident.to_string(), "Disk");

        let fields = parsed.fields();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].attr_name(), "name");
        assert_eq!(fields[1].attr_name(), "size");
    }

    #[test]
    fn test_parse_with_attributes() {
        let input: syn::DeriveInput = parse_quote! {
            struct Disk {
                #[attr(name = "size_gb")]
                size: u32,
                #[attr(skip)]
                cached: bool,
            }
        };

        let parsed = ObjectInput::from_derive_input(&input).unwrap();
        let fields = parsed.fields();
        assert_eq!(fields[0].attr_name(), "size_gb");
        assert!(fields[1].skip);
        assert_eq!(parsed.bound_fields().len(), 1);
    }

    #[test]
    fn test_rejects_non_named_structs() {
        let tuple: syn::DeriveInput = parse_quote! { struct Pair(u32, u32); };
        assert!(ObjectInput::from_derive_input(&tuple).is_err());

        let unit: syn::DeriveInput = parse_quote! { struct Empty; };
        assert!(ObjectInput::from_derive_input(&unit).is_err());

        let enumeration: syn::DeriveInput = parse_quote! { enum Mode { A, B } };
        assert!(ObjectInput::from_derive_input(&enumeration).is_err());
    }
}
