use super::{FromAttr, Marshaler, Slot, ToAttr};
use crate::types::{
    BoolValue, ListValue, MapValue, NumberValue, ObjectValue, SetValue, StringValue,
};
use crate::value::I64_BOUND;
use crate::{AttrType, Number, Path, Value, WireType};

impl FromAttr for String {
    fn from_attr(m: &mut Marshaler<'_>, _ty: &dyn AttrType, value: &Value, path: &Path) -> Option<Self> {
        match m.known(value, path, "String", |t| *t == WireType::String)? {
            Slot::Known(v) => Some(v.as_str().unwrap_or_default().to_owned()),
            Slot::Empty => Some(String::new()),
        }
    }
}

impl ToAttr for String {
    fn to_attr(&self, m: &mut Marshaler<'_>, ty: &dyn AttrType, path: &Path) -> Option<Value> {
        self.as_str().to_attr(m, ty, path)
    }
}

impl ToAttr for str {
    fn to_attr(&self, _m: &mut Marshaler<'_>, _ty: &dyn AttrType, _path: &Path) -> Option<Value> {
        Some(Value::string(self))
    }
}

impl FromAttr for bool {
    fn from_attr(m: &mut Marshaler<'_>, _ty: &dyn AttrType, value: &Value, path: &Path) -> Option<Self> {
        match m.known(value, path, "bool", |t| *t == WireType::Bool)? {
            Slot::Known(v) => Some(v.as_bool().unwrap_or_default()),
            Slot::Empty => Some(false),
        }
    }
}

impl ToAttr for bool {
    fn to_attr(&self, _m: &mut Marshaler<'_>, _ty: &dyn AttrType, _path: &Path) -> Option<Value> {
        Some(Value::bool(*self))
    }
}

impl FromAttr for Number {
    fn from_attr(m: &mut Marshaler<'_>, _ty: &dyn AttrType, value: &Value, path: &Path) -> Option<Self> {
        match m.known(value, path, "Number", |t| *t == WireType::Number)? {
            Slot::Known(v) => Some(v.as_number().unwrap_or_default()),
            Slot::Empty => Some(Number::default()),
        }
    }
}

impl ToAttr for Number {
    fn to_attr(&self, _m: &mut Marshaler<'_>, _ty: &dyn AttrType, _path: &Path) -> Option<Value> {
        Some(Value::number(*self))
    }
}

fn known_number(m: &mut Marshaler<'_>, value: &Value, path: &Path, target: &str) -> Option<Option<Number>> {
    match m.known(value, path, target, |t| *t == WireType::Number)? {
        Slot::Known(v) => Some(Some(v.as_number().unwrap_or_default())),
        Slot::Empty => Some(None),
    }
}

macro_rules! integer {
    ($($t:ty),* $(,)?) => {$(
        impl FromAttr for $t {
            fn from_attr(m: &mut Marshaler<'_>, _ty: &dyn AttrType, value: &Value, path: &Path) -> Option<Self> {
                let Some(n) = known_number(m, value, path, stringify!($t))? else {
                    return Some(0);
                };
                match n.as_i64().and_then(|i| <$t>::try_from(i).ok()) {
                    Some(v) => Some(v),
                    None => {
                        m.error(path, format!("{} cannot be represented as {} without loss", n, stringify!($t)));
                        None
                    }
                }
            }
        }

        impl ToAttr for $t {
            fn to_attr(&self, m: &mut Marshaler<'_>, _ty: &dyn AttrType, path: &Path) -> Option<Value> {
                match i64::try_from(*self) {
                    Ok(i) => Some(Value::number(i)),
                    Err(_) => {
                        m.error(path, format!("{} cannot be represented as a number without loss", self));
                        None
                    }
                }
            }
        }
    )*};
}

integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl FromAttr for f64 {
    fn from_attr(m: &mut Marshaler<'_>, _ty: &dyn AttrType, value: &Value, path: &Path) -> Option<Self> {
        let Some(n) = known_number(m, value, path, "f64")? else {
            return Some(0.0);
        };
        let wide = n.as_f64();
        if let Some(i) = n.as_i64() {
            if wide >= I64_BOUND || wide as i64 != i {
                m.error(path, format!("{} cannot be represented as f64 without loss", n));
                return None;
            }
        }
        Some(wide)
    }
}

impl ToAttr for f64 {
    fn to_attr(&self, m: &mut Marshaler<'_>, _ty: &dyn AttrType, path: &Path) -> Option<Value> {
        match Number::from_f64(*self) {
            Some(n) => Some(Value::number(n)),
            None => {
                m.error(path, format!("{} is not a finite number", self));
                None
            }
        }
    }
}

impl FromAttr for f32 {
    fn from_attr(m: &mut Marshaler<'_>, _ty: &dyn AttrType, value: &Value, path: &Path) -> Option<Self> {
        let Some(n) = known_number(m, value, path, "f32")? else {
            return Some(0.0);
        };
        let wide = n.as_f64();
        let narrow = wide as f32;
        if f64::from(narrow) != wide {
            m.error(path, format!("{} cannot be represented as f32 without loss", n));
            return None;
        }
        Some(narrow)
    }
}

impl ToAttr for f32 {
    fn to_attr(&self, m: &mut Marshaler<'_>, ty: &dyn AttrType, path: &Path) -> Option<Value> {
        f64::from(*self).to_attr(m, ty, path)
    }
}

/// The raw wire value, whatever its shape or state.
impl FromAttr for Value {
    fn from_attr(_m: &mut Marshaler<'_>, _ty: &dyn AttrType, value: &Value, _path: &Path) -> Option<Self> {
        Some(value.clone())
    }

    fn accepts_unknown() -> bool {
        true
    }
}

impl ToAttr for Value {
    fn to_attr(&self, _m: &mut Marshaler<'_>, _ty: &dyn AttrType, _path: &Path) -> Option<Value> {
        Some(self.clone())
    }
}

/// Implement [`FromAttr`] and [`ToAttr`] for [`AttrValue`](crate::AttrValue)
/// types.
///
/// Decoding asks the declared attribute type for its value and downcasts it;
/// encoding calls `to_wire`.
///
/// ```ignore
/// attrdoc::attr_value_conversions!(MyStringValue);
/// ```
#[macro_export]
macro_rules! attr_value_conversions {
    ($($t:ty),* $(,)?) => {$(
        impl $crate::FromAttr for $t {
            fn from_attr(
                m: &mut $crate::Marshaler<'_>,
                ty: &dyn $crate::AttrType,
                value: &$crate::Value,
                path: &$crate::Path,
            ) -> ::core::option::Option<Self> {
                $crate::reflect::attr_value_from(m, ty, value, path)
            }

            fn accepts_unknown() -> bool {
                true
            }
        }

        impl $crate::ToAttr for $t {
            fn to_attr(
                &self,
                m: &mut $crate::Marshaler<'_>,
                _ty: &dyn $crate::AttrType,
                path: &$crate::Path,
            ) -> ::core::option::Option<$crate::Value> {
                $crate::reflect::attr_value_to(self, m, path)
            }
        }
    )*};
}

attr_value_conversions!(
    StringValue,
    NumberValue,
    BoolValue,
    ListValue,
    SetValue,
    MapValue,
    ObjectValue,
);
