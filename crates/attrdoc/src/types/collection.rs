use super::unsupported_step;
use crate::attr::same_type;
use crate::value::ValueState;
use crate::{AttrResult, AttrType, AttrValue, Context, Path, Step, Value, WireType};
use std::collections::BTreeMap;
use std::sync::Arc;

macro_rules! sequence {
    (
        $(#[$tmeta:meta])*
        type $ty:ident;
        $(#[$vmeta:meta])*
        value $val:ident;
        wire $wire:ident, get $get:ident, make $make:ident;
        step_of $step_of:expr;
        accepts $pat:pat => $expected:literal;
        ordered $ordered:literal;
    ) => {
        $(#[$tmeta])*
        #[derive(Clone, Debug)]
        pub struct $ty {
            elem: Arc<dyn AttrType>,
        }

        impl $ty {
            /// A collection whose elements have type `elem`.
            pub fn new(elem: Arc<dyn AttrType>) -> Self {
                Self { elem }
            }

            /// The element type.
            pub fn element_type(&self) -> &Arc<dyn AttrType> {
                &self.elem
            }
        }

        impl PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                self.elem.equal(other.elem.as_ref())
            }
        }

        impl AttrType for $ty {
            fn wire_type(&self) -> WireType {
                WireType::$wire(Box::new(self.elem.wire_type()))
            }

            fn value_from_wire(&self, ctx: &Context, value: &Value) -> AttrResult<Box<dyn AttrValue>> {
                value.expect_type(&self.wire_type(), &Path::root())?;
                let out = match value.state() {
                    ValueState::Null => $val::null(self.elem.clone()),
                    ValueState::Unknown => $val::unknown(self.elem.clone()),
                    ValueState::Known(_) => {
                        let step_of: fn(usize, &Value) -> Step = $step_of;
                        let mut elems = Vec::new();
                        for (i, e) in value.$get().unwrap_or_default().iter().enumerate() {
                            let converted = self
                                .elem
                                .value_from_wire(ctx, e)
                                .map_err(|err| err.with_prefix(&Path::root().with_step(step_of(i, e))))?;
                            elems.push(Arc::<dyn AttrValue>::from(converted));
                        }
                        $val::new(self.elem.clone(), elems)
                    }
                };
                Ok(Box::new(out))
            }

            fn step_type(&self, step: &Step) -> AttrResult<Arc<dyn AttrType>> {
                match step {
                    $pat => Ok(self.elem.clone()),
                    other => Err(unsupported_step(other, stringify!($ty), $expected)),
                }
            }

            fn equal(&self, other: &dyn AttrType) -> bool {
                same_type(self, other)
            }
        }

        $(#[$vmeta])*
        #[derive(Clone, Debug)]
        pub struct $val {
            /// Type of every element.
            pub elem_type: Arc<dyn AttrType>,
            /// Elements; empty when `null` or `unknown` is set.
            pub elems: Vec<Arc<dyn AttrValue>>,
            /// Explicitly absent.
            pub null: bool,
            /// Not yet known.
            pub unknown: bool,
        }

        impl $val {
            /// A known collection.
            pub fn new(elem_type: Arc<dyn AttrType>, elems: Vec<Arc<dyn AttrValue>>) -> Self {
                Self {
                    elem_type,
                    elems,
                    null: false,
                    unknown: false,
                }
            }

            /// A null collection.
            pub fn null(elem_type: Arc<dyn AttrType>) -> Self {
                Self {
                    null: true,
                    ..Self::new(elem_type, Vec::new())
                }
            }

            /// An unknown collection.
            pub fn unknown(elem_type: Arc<dyn AttrType>) -> Self {
                Self {
                    unknown: true,
                    ..Self::new(elem_type, Vec::new())
                }
            }
        }

        impl PartialEq for $val {
            fn eq(&self, other: &Self) -> bool {
                self.null == other.null
                    && self.unknown == other.unknown
                    && self.elem_type.equal(other.elem_type.as_ref())
                    && same_elements(&self.elems, &other.elems, $ordered)
            }
        }

        impl AttrValue for $val {
            fn attr_type(&self) -> Arc<dyn AttrType> {
                Arc::new($ty::new(self.elem_type.clone()))
            }

            fn to_wire(&self, ctx: &Context) -> AttrResult<Value> {
                let ty = WireType::$wire(Box::new(self.elem_type.wire_type()));
                if self.null {
                    return Ok(Value::null(ty));
                }
                if self.unknown {
                    return Ok(Value::unknown(ty));
                }
                let elems = self
                    .elems
                    .iter()
                    .map(|e| e.to_wire(ctx))
                    .collect::<AttrResult<Vec<_>>>()?;
                Value::$make(self.elem_type.wire_type(), elems)
            }

            fn equal(&self, other: &dyn AttrValue) -> bool {
                other.as_any().downcast_ref::<Self>() == Some(self)
            }
        }
    };
}

sequence! {
    /// Ordered list attributes.
    type ListType;
    /// Host value of a [`ListType`] attribute.
    value ListValue;
    wire List, get as_list, make list;
    step_of |i, _| Step::index(i);
    accepts Step::ElementKeyInt(_) => "list index";
    ordered true;
}

sequence! {
    /// Set attributes; element order carries no meaning.
    type SetType;
    /// Host value of a [`SetType`] attribute.
    value SetValue;
    wire Set, get as_set, make set;
    step_of |_, e| Step::element(e.clone());
    accepts Step::ElementKeyValue(_) => "element value";
    ordered false;
}

/// Element-wise equality; unordered comparison matches each element once.
fn same_elements(a: &[Arc<dyn AttrValue>], b: &[Arc<dyn AttrValue>], ordered: bool) -> bool {
    if a.len() != b.len() {
        return false;
    }
    if ordered {
        return a.iter().zip(b).all(|(x, y)| x.equal(y.as_ref()));
    }
    let mut used = vec![false; b.len()];
    a.iter().all(|x| {
        let hit = b
            .iter()
            .enumerate()
            .find(|(i, y)| !used[*i] && x.equal(y.as_ref()))
            .map(|(i, _)| i);
        match hit {
            Some(i) => {
                used[i] = true;
                true
            }
            None => false,
        }
    })
}

/// String-keyed map attributes.
#[derive(Clone, Debug)]
pub struct MapType {
    elem: Arc<dyn AttrType>,
}

impl MapType {
    /// A map whose values have type `elem`.
    pub fn new(elem: Arc<dyn AttrType>) -> Self {
        Self { elem }
    }

    /// The element type.
    pub fn element_type(&self) -> &Arc<dyn AttrType> {
        &self.elem
    }
}

impl PartialEq for MapType {
    fn eq(&self, other: &Self) -> bool {
        self.elem.equal(other.elem.as_ref())
    }
}

impl AttrType for MapType {
    fn wire_type(&self) -> WireType {
        WireType::map(self.elem.wire_type())
    }

    fn value_from_wire(&self, ctx: &Context, value: &Value) -> AttrResult<Box<dyn AttrValue>> {
        value.expect_type(&self.wire_type(), &Path::root())?;
        let Some(entries) = value.as_map() else {
            return Ok(Box::new(if value.is_null() {
                MapValue::null(self.elem.clone())
            } else {
                MapValue::unknown(self.elem.clone())
            }));
        };
        let mut out = BTreeMap::new();
        for (k, v) in entries {
            let converted = self
                .elem
                .value_from_wire(ctx, v)
                .map_err(|err| err.with_prefix(&Path::root().key(k.as_str())))?;
            out.insert(k.clone(), Arc::<dyn AttrValue>::from(converted));
        }
        Ok(Box::new(MapValue::new(self.elem.clone(), out)))
    }

    fn step_type(&self, step: &Step) -> AttrResult<Arc<dyn AttrType>> {
        match step {
            Step::ElementKeyString(_) => Ok(self.elem.clone()),
            other => Err(unsupported_step(other, "MapType", "map key")),
        }
    }

    fn equal(&self, other: &dyn AttrType) -> bool {
        same_type(self, other)
    }
}

/// Host value of a [`MapType`] attribute.
#[derive(Clone, Debug)]
pub struct MapValue {
    /// Type of every entry.
    pub elem_type: Arc<dyn AttrType>,
    /// Entries; empty when `null` or `unknown` is set.
    pub elems: BTreeMap<String, Arc<dyn AttrValue>>,
    /// Explicitly absent.
    pub null: bool,
    /// Not yet known.
    pub unknown: bool,
}

impl MapValue {
    /// A known map.
    pub fn new(elem_type: Arc<dyn AttrType>, elems: BTreeMap<String, Arc<dyn AttrValue>>) -> Self {
        Self {
            elem_type,
            elems,
            null: false,
            unknown: false,
        }
    }

    /// A null map.
    pub fn null(elem_type: Arc<dyn AttrType>) -> Self {
        Self {
            null: true,
            ..Self::new(elem_type, BTreeMap::new())
        }
    }

    /// An unknown map.
    pub fn unknown(elem_type: Arc<dyn AttrType>) -> Self {
        Self {
            unknown: true,
            ..Self::new(elem_type, BTreeMap::new())
        }
    }
}

impl PartialEq for MapValue {
    fn eq(&self, other: &Self) -> bool {
        self.null == other.null
            && self.unknown == other.unknown
            && self.elem_type.equal(other.elem_type.as_ref())
            && self.elems.len() == other.elems.len()
            && self
                .elems
                .iter()
                .all(|(k, v)| other.elems.get(k).is_some_and(|o| v.equal(o.as_ref())))
    }
}

impl AttrValue for MapValue {
    fn attr_type(&self) -> Arc<dyn AttrType> {
        Arc::new(MapType::new(self.elem_type.clone()))
    }

    fn to_wire(&self, ctx: &Context) -> AttrResult<Value> {
        let ty = WireType::map(self.elem_type.wire_type());
        if self.null {
            return Ok(Value::null(ty));
        }
        if self.unknown {
            return Ok(Value::unknown(ty));
        }
        let mut entries = BTreeMap::new();
        for (k, v) in &self.elems {
            entries.insert(k.clone(), v.to_wire(ctx)?);
        }
        Value::map(self.elem_type.wire_type(), entries)
    }

    fn equal(&self, other: &dyn AttrValue) -> bool {
        other.as_any().downcast_ref::<Self>() == Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NumberType, StringType, StringValue};
    use crate::AttrError;

    fn strings() -> Arc<dyn AttrType> {
        Arc::new(StringType)
    }

    #[test]
    fn test_list_round_trip() {
        let ctx = Context::background();
        let wire = Value::list(
            WireType::String,
            vec![Value::string("a"), Value::string("b")],
        )
        .unwrap();
        let ty = ListType::new(strings());
        let v = ty.value_from_wire(&ctx, &wire).unwrap();
        let list = v.as_ref().as_any().downcast_ref::<ListValue>().unwrap();
        assert_eq!(list.elems.len(), 2);
        assert!(list.elems[1].equal(&StringValue::new("b")));
        assert_eq!(v.to_wire(&ctx).unwrap(), wire);
    }

    #[test]
    fn test_element_error_is_prefixed() {
        #[derive(Debug, PartialEq)]
        struct Picky;

        impl AttrType for Picky {
            fn wire_type(&self) -> WireType {
                WireType::String
            }

            fn value_from_wire(&self, _ctx: &Context, value: &Value) -> AttrResult<Box<dyn AttrValue>> {
                match value.as_str() {
                    Some("ok") => Ok(Box::new(StringValue::new("ok"))),
                    _ => Err(AttrError::invalid_value(Path::root(), "not ok")),
                }
            }

            fn equal(&self, other: &dyn AttrType) -> bool {
                same_type(self, other)
            }
        }

        let ctx = Context::background();
        let wire = Value::list(
            WireType::String,
            vec![Value::string("ok"), Value::string("bad")],
        )
        .unwrap();
        let err = ListType::new(Arc::new(Picky))
            .value_from_wire(&ctx, &wire)
            .unwrap_err();
        match err {
            AttrError::InvalidValue { path, .. } => assert_eq!(path, Path::root().index(1)),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_step_types() {
        let list = ListType::new(strings());
        assert!(list.step_type(&Step::index(0)).is_ok());
        assert!(list.step_type(&Step::key("a")).is_err());

        let set = SetType::new(strings());
        assert!(set.step_type(&Step::element(Value::string("x"))).is_ok());
        assert!(set.step_type(&Step::index(0)).is_err());

        let map = MapType::new(strings());
        assert!(map.step_type(&Step::key("a")).is_ok());
        assert!(map.step_type(&Step::attr("a")).is_err());
    }

    #[test]
    fn test_type_equality_is_structural() {
        assert!(ListType::new(strings()).equal(&ListType::new(strings())));
        assert!(!ListType::new(strings()).equal(&ListType::new(Arc::new(NumberType))));
        assert!(!ListType::new(strings()).equal(&SetType::new(strings())));
    }

    #[test]
    fn test_null_map() {
        let ctx = Context::background();
        let ty = MapType::new(strings());
        let v = ty
            .value_from_wire(&ctx, &Value::null(WireType::map(WireType::String)))
            .unwrap();
        assert!(v.equal(&MapValue::null(strings())));
        assert!(v.to_wire(&ctx).unwrap().is_null());
    }

    #[test]
    fn test_set_equality_ignores_order() {
        let ab = SetValue::new(
            strings(),
            vec![
                Arc::new(StringValue::new("a")) as Arc<dyn AttrValue>,
                Arc::new(StringValue::new("b")),
            ],
        );
        let ba = SetValue::new(
            strings(),
            vec![
                Arc::new(StringValue::new("b")) as Arc<dyn AttrValue>,
                Arc::new(StringValue::new("a")),
            ],
        );
        assert_eq!(ab, ba);

        let list_ab = ListValue::new(strings(), ab.elems.clone());
        let list_ba = ListValue::new(strings(), ba.elems.clone());
        assert_ne!(list_ab, list_ba);
    }

    #[test]
    fn test_set_to_wire_rejects_duplicates() {
        let ctx = Context::background();
        let v = SetValue::new(
            strings(),
            vec![
                Arc::new(StringValue::new("a")) as Arc<dyn AttrValue>,
                Arc::new(StringValue::new("a")),
            ],
        );
        assert!(v.to_wire(&ctx).is_err());
    }
}
