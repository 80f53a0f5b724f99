//! Declarative document schemas.
//!
//! A [`Schema`] maps attribute names to [`Attribute`]s. An attribute either
//! has an [`AttrType`] or nests further attributes; nested attributes can be
//! a single object or a list, set or map of objects.

use crate::attr::type_at_path;
use crate::types::{ListType, MapType, ObjectType, SetType};
use crate::{AttrError, AttrResult, AttrType, Diagnostics, Path, Step, Value, WireType};
use std::collections::BTreeMap;
use std::sync::Arc;

/// How nested attributes are grouped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NestingMode {
    /// One object.
    Single,
    /// A list of objects.
    List,
    /// A set of objects.
    Set,
    /// A string-keyed map of objects.
    Map,
}

/// Attributes nested under another attribute.
#[derive(Clone, Debug)]
pub struct NestedAttributes {
    /// How the nested objects are grouped.
    pub mode: NestingMode,
    /// Attributes of each nested object.
    pub attributes: BTreeMap<String, Attribute>,
}

impl NestedAttributes {
    /// The type of the nested value.
    pub fn attr_type(&self) -> Arc<dyn AttrType> {
        let object: Arc<dyn AttrType> = Arc::new(object_type(&self.attributes));
        match self.mode {
            NestingMode::Single => object,
            NestingMode::List => Arc::new(ListType::new(object)),
            NestingMode::Set => Arc::new(SetType::new(object)),
            NestingMode::Map => Arc::new(MapType::new(object)),
        }
    }
}

/// What an attribute holds.
#[derive(Clone, Debug)]
pub enum AttributeKind {
    /// A value of the given type.
    Type(Arc<dyn AttrType>),
    /// Further attributes.
    Nested(NestedAttributes),
}

/// One declared attribute.
#[derive(Clone, Debug)]
pub struct Attribute {
    pub kind: AttributeKind,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    pub description: String,
    pub deprecation_message: String,
}

impl Attribute {
    /// An attribute of type `ty` with no flags set.
    pub fn new(ty: impl AttrType + 'static) -> Self {
        Self::from_arc(Arc::new(ty))
    }

    /// An attribute of an already shared type.
    pub fn from_arc(ty: Arc<dyn AttrType>) -> Self {
        Self::with_kind(AttributeKind::Type(ty))
    }

    /// An attribute nesting `attributes` in the given mode.
    pub fn nested<K: Into<String>>(
        mode: NestingMode,
        attributes: impl IntoIterator<Item = (K, Attribute)>,
    ) -> Self {
        Self::with_kind(AttributeKind::Nested(NestedAttributes {
            mode,
            attributes: attributes.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }))
    }

    fn with_kind(kind: AttributeKind) -> Self {
        Self {
            kind,
            required: false,
            optional: false,
            computed: false,
            sensitive: false,
            description: String::new(),
            deprecation_message: String::new(),
        }
    }

    /// The practitioner must set this attribute.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// The practitioner may set this attribute.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// The provider may fill in this attribute.
    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    /// Mask the value in output.
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// Human-readable description.
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = text.into();
        self
    }

    /// Mark as deprecated with a message for practitioners.
    pub fn deprecated(mut self, message: impl Into<String>) -> Self {
        self.deprecation_message = message.into();
        self
    }

    /// The type of this attribute's value.
    pub fn attr_type(&self) -> Arc<dyn AttrType> {
        match &self.kind {
            AttributeKind::Type(ty) => ty.clone(),
            AttributeKind::Nested(nested) => nested.attr_type(),
        }
    }
}

/// A document schema.
#[derive(Clone, Debug, Default)]
pub struct Schema {
    pub attributes: BTreeMap<String, Attribute>,
    pub version: i64,
    pub description: String,
    pub deprecation_message: String,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the attribute `name`.
    pub fn attribute(mut self, name: impl Into<String>, attr: Attribute) -> Self {
        self.attributes.insert(name.into(), attr);
        self
    }

    /// The object type of a whole document.
    pub fn attribute_type(&self) -> ObjectType {
        object_type(&self.attributes)
    }

    /// The wire type of a whole document.
    pub fn wire_type(&self) -> WireType {
        self.attribute_type().wire_type()
    }

    /// The declared type at `path`.
    ///
    /// Paths may point inside attribute values, e.g. at a list element.
    pub fn attribute_type_at_path(&self, path: &Path) -> AttrResult<Arc<dyn AttrType>> {
        type_at_path(Arc::new(self.attribute_type()), path)
    }

    /// The declared attribute at `path`.
    ///
    /// Unlike [`attribute_type_at_path`](Self::attribute_type_at_path) the
    /// path must end exactly at an attribute, possibly one nested inside a
    /// list, set or map element.
    pub fn attribute_at_path(&self, path: &Path) -> AttrResult<&Attribute> {
        enum At<'s> {
            Attrs(&'s BTreeMap<String, Attribute>),
            Element(&'s NestedAttributes),
            Leaf,
        }

        let mut at = At::Attrs(&self.attributes);
        let mut current: Option<&Attribute> = None;
        for (i, step) in path.steps().iter().enumerate() {
            let fail = |reason: &str| {
                AttrError::step_failed(path.slice(0, i), step.clone(), path.len() - i, reason)
            };
            at = match at {
                At::Attrs(attrs) => {
                    let Step::AttributeName(name) = step else {
                        return Err(fail("expected an attribute name"));
                    };
                    let attr = attrs
                        .get(name)
                        .ok_or_else(|| fail("no such attribute in schema"))?;
                    current = Some(attr);
                    match &attr.kind {
                        AttributeKind::Type(_) => At::Leaf,
                        AttributeKind::Nested(n) if n.mode == NestingMode::Single => {
                            At::Attrs(&n.attributes)
                        }
                        AttributeKind::Nested(n) => At::Element(n),
                    }
                }
                At::Element(nested) => {
                    let matches_mode = matches!(
                        (nested.mode, step),
                        (NestingMode::List, Step::ElementKeyInt(_))
                            | (NestingMode::Set, Step::ElementKeyValue(_))
                            | (NestingMode::Map, Step::ElementKeyString(_))
                    );
                    if !matches_mode {
                        return Err(fail("step does not select an element of the nested attribute"));
                    }
                    current = None;
                    At::Attrs(&nested.attributes)
                }
                At::Leaf => return Err(fail("path continues into the value of a non-nested attribute")),
            };
        }
        current.ok_or_else(|| {
            AttrError::invalid_value(path.clone(), "path does not point at an attribute")
        })
    }

    /// Check the declaration itself.
    pub fn validate(&self) -> Diagnostics {
        let mut diags = Diagnostics::new();
        validate_attributes(&self.attributes, &Path::root(), &mut diags);
        diags
    }

    /// A null document of this schema's type.
    pub fn null_value(&self) -> Value {
        Value::null(self.wire_type())
    }
}

fn object_type(attributes: &BTreeMap<String, Attribute>) -> ObjectType {
    ObjectType::new(attributes.iter().map(|(k, a)| (k.clone(), a.attr_type())))
}

const INVALID_DEFINITION: &str = "Invalid Attribute Definition";

fn validate_attributes(attrs: &BTreeMap<String, Attribute>, parent: &Path, diags: &mut Diagnostics) {
    for (name, attr) in attrs {
        let path = parent.attr(name.as_str());
        if !(attr.required || attr.optional || attr.computed) {
            diags.add_attribute_error(
                &path,
                INVALID_DEFINITION,
                "Attribute must set at least one of required, optional or computed.",
            );
        }
        if attr.required && (attr.optional || attr.computed) {
            diags.add_attribute_error(
                &path,
                INVALID_DEFINITION,
                "A required attribute cannot also be optional or computed.",
            );
        }
        if let AttributeKind::Nested(nested) = &attr.kind {
            if nested.attributes.is_empty() {
                diags.add_attribute_error(
                    &path,
                    INVALID_DEFINITION,
                    "Nested attributes must declare at least one attribute.",
                );
            }
            validate_attributes(&nested.attributes, &path, diags);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;
    use crate::types::{BoolType, NumberType, StringType};

    fn schema() -> Schema {
        Schema::new()
            .attribute("name", Attribute::new(StringType).required())
            .attribute(
                "disks",
                Attribute::nested(
                    NestingMode::List,
                    [
                        ("size", Attribute::new(NumberType).required()),
                        ("boot", Attribute::new(BoolType).optional().computed()),
                    ],
                )
                .optional(),
            )
            .attribute(
                "network",
                Attribute::nested(
                    NestingMode::Single,
                    [("cidr", Attribute::new(StringType).optional())],
                )
                .optional(),
            )
    }

    #[test]
    fn test_wire_type() {
        let disk = WireType::object([("boot", WireType::Bool), ("size", WireType::Number)]);
        assert_eq!(
            schema().wire_type(),
            WireType::object([
                ("disks", WireType::list(disk)),
                ("name", WireType::String),
                ("network", WireType::object([("cidr", WireType::String)])),
            ])
        );
    }

    #[test]
    fn test_attribute_type_at_path() {
        let s = schema();
        assert!(s
            .attribute_type_at_path(&path!("disks", 0, "size"))
            .unwrap()
            .equal(&NumberType));
        assert!(s.attribute_type_at_path(&path!("missing")).is_err());
    }

    #[test]
    fn test_attribute_at_path() {
        let s = schema();
        assert!(s.attribute_at_path(&path!("name")).unwrap().required);
        assert!(s.attribute_at_path(&path!("disks", 2, "boot")).unwrap().computed);
        assert!(s.attribute_at_path(&path!("network", "cidr")).unwrap().optional);

        // element of a nested list, not an attribute
        assert!(s.attribute_at_path(&path!("disks", 2)).is_err());
        assert!(s.attribute_at_path(&path!("disks", "size")).is_err());
        assert!(s.attribute_at_path(&path!("name", "x")).is_err());
        assert!(s.attribute_at_path(&Path::root()).is_err());
    }

    #[test]
    fn test_validate() {
        assert!(schema().validate().is_empty());

        let bad = Schema::new()
            .attribute("a", Attribute::new(StringType))
            .attribute("b", Attribute::new(StringType).required().computed())
            .attribute(
                "c",
                Attribute::nested(NestingMode::Map, Vec::<(String, Attribute)>::new()).optional(),
            );
        let diags = bad.validate();
        assert_eq!(diags.error_count(), 3);
        assert_eq!(diags[0].path, Some(path!("a")));
        assert_eq!(diags[1].path, Some(path!("b")));
        assert_eq!(diags[2].path, Some(path!("c")));
    }

    #[test]
    fn test_null_value() {
        let v = schema().null_value();
        assert!(v.is_null());
        assert_eq!(v.ty(), &schema().wire_type());
    }
}
