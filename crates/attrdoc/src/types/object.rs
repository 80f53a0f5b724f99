use super::unsupported_step;
use crate::attr::same_type;
use crate::{AttrError, AttrResult, AttrType, AttrValue, Context, Path, Step, Value, WireType};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Object attributes: a fixed set of named attributes, each with its own type.
#[derive(Clone, Debug, Default)]
pub struct ObjectType {
    attr_types: BTreeMap<String, Arc<dyn AttrType>>,
}

impl ObjectType {
    /// An object type with the given attribute types.
    pub fn new<K: Into<String>>(attrs: impl IntoIterator<Item = (K, Arc<dyn AttrType>)>) -> Self {
        Self {
            attr_types: attrs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// The attribute types by name.
    pub fn attribute_types(&self) -> &BTreeMap<String, Arc<dyn AttrType>> {
        &self.attr_types
    }
}

impl PartialEq for ObjectType {
    fn eq(&self, other: &Self) -> bool {
        self.attr_types.len() == other.attr_types.len()
            && self.attr_types.iter().all(|(k, t)| {
                other
                    .attr_types
                    .get(k)
                    .is_some_and(|o| t.equal(o.as_ref()))
            })
    }
}

impl AttrType for ObjectType {
    fn wire_type(&self) -> WireType {
        WireType::Object(
            self.attr_types
                .iter()
                .map(|(k, t)| (k.clone(), t.wire_type()))
                .collect(),
        )
    }

    fn value_from_wire(&self, ctx: &Context, value: &Value) -> AttrResult<Box<dyn AttrValue>> {
        value.expect_type(&self.wire_type(), &Path::root())?;
        let Some(attrs) = value.as_object() else {
            return Ok(Box::new(if value.is_null() {
                ObjectValue::null(self.attr_types.clone())
            } else {
                ObjectValue::unknown(self.attr_types.clone())
            }));
        };
        let mut out = BTreeMap::new();
        for (name, ty) in &self.attr_types {
            let child = attrs.get(name).ok_or_else(|| {
                AttrError::invalid_value(Path::root().attr(name.as_str()), "attribute missing")
            })?;
            let converted = ty
                .value_from_wire(ctx, child)
                .map_err(|err| err.with_prefix(&Path::root().attr(name.as_str())))?;
            out.insert(name.clone(), Arc::<dyn AttrValue>::from(converted));
        }
        Ok(Box::new(ObjectValue::new(self.attr_types.clone(), out)))
    }

    fn step_type(&self, step: &Step) -> AttrResult<Arc<dyn AttrType>> {
        let Step::AttributeName(name) = step else {
            return Err(unsupported_step(step, "ObjectType", "attribute name"));
        };
        self.attr_types.get(name).cloned().ok_or_else(|| {
            AttrError::step_failed(
                Path::root(),
                step.clone(),
                1,
                format!("object has no attribute {:?}", name),
            )
        })
    }

    fn equal(&self, other: &dyn AttrType) -> bool {
        same_type(self, other)
    }
}

/// Host value of an [`ObjectType`] attribute.
#[derive(Clone, Debug)]
pub struct ObjectValue {
    /// Attribute types by name.
    pub attr_types: BTreeMap<String, Arc<dyn AttrType>>,
    /// Attribute values by name; empty when `null` or `unknown` is set.
    pub attrs: BTreeMap<String, Arc<dyn AttrValue>>,
    /// Explicitly absent.
    pub null: bool,
    /// Not yet known.
    pub unknown: bool,
}

impl ObjectValue {
    /// A known object.
    pub fn new(
        attr_types: BTreeMap<String, Arc<dyn AttrType>>,
        attrs: BTreeMap<String, Arc<dyn AttrValue>>,
    ) -> Self {
        Self {
            attr_types,
            attrs,
            null: false,
            unknown: false,
        }
    }

    /// A null object.
    pub fn null(attr_types: BTreeMap<String, Arc<dyn AttrType>>) -> Self {
        Self {
            null: true,
            ..Self::new(attr_types, BTreeMap::new())
        }
    }

    /// An unknown object.
    pub fn unknown(attr_types: BTreeMap<String, Arc<dyn AttrType>>) -> Self {
        Self {
            unknown: true,
            ..Self::new(attr_types, BTreeMap::new())
        }
    }

    /// Look up one attribute value.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn AttrValue>> {
        self.attrs.get(name)
    }
}

impl PartialEq for ObjectValue {
    fn eq(&self, other: &Self) -> bool {
        self.null == other.null
            && self.unknown == other.unknown
            && ObjectType::new(self.attr_types.clone()) == ObjectType::new(other.attr_types.clone())
            && self.attrs.len() == other.attrs.len()
            && self
                .attrs
                .iter()
                .all(|(k, v)| other.attrs.get(k).is_some_and(|o| v.equal(o.as_ref())))
    }
}

impl AttrValue for ObjectValue {
    fn attr_type(&self) -> Arc<dyn AttrType> {
        Arc::new(ObjectType::new(self.attr_types.clone()))
    }

    fn to_wire(&self, ctx: &Context) -> AttrResult<Value> {
        let ty = ObjectType::new(self.attr_types.clone()).wire_type();
        if self.null {
            return Ok(Value::null(ty));
        }
        if self.unknown {
            return Ok(Value::unknown(ty));
        }
        let mut attrs = BTreeMap::new();
        for (k, v) in &self.attrs {
            let wire = v
                .to_wire(ctx)
                .map_err(|err| err.with_prefix(&Path::root().attr(k.as_str())))?;
            attrs.insert(k.clone(), wire);
        }
        Value::new(ty, crate::value::Payload::Object(attrs))
    }

    fn equal(&self, other: &dyn AttrValue) -> bool {
        other.as_any().downcast_ref::<Self>() == Some(self)
    }
}
