use crate::attr::{same_type, same_value};
use crate::value::ValueState;
use crate::{AttrError, AttrResult, AttrType, AttrValue, Context, Number, Path, Value, WireType};
use std::sync::Arc;

macro_rules! primitive {
    (
        $(#[$tmeta:meta])*
        type $ty:ident;
        $(#[$vmeta:meta])*
        value $val:ident($inner:ty);
        wire $wire:ident;
        from_wire |$fv:ident| $from:expr;
        to_wire |$tv:ident| $to:expr;
    ) => {
        $(#[$tmeta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
        pub struct $ty;

        impl AttrType for $ty {
            fn wire_type(&self) -> WireType {
                WireType::$wire
            }

            fn value_from_wire(&self, _ctx: &Context, value: &Value) -> AttrResult<Box<dyn AttrValue>> {
                value.expect_type(&WireType::$wire, &Path::root())?;
                let out = match value.state() {
                    ValueState::Null => $val::null(),
                    ValueState::Unknown => $val::unknown(),
                    ValueState::Known(_) => {
                        let $fv = value;
                        let inner: Option<$inner> = $from;
                        let inner = inner.ok_or_else(|| {
                            AttrError::conversion(format!(
                                "{} payload missing from known value",
                                stringify!($wire)
                            ))
                        })?;
                        $val::new(inner)
                    }
                };
                Ok(Box::new(out))
            }

            fn equal(&self, other: &dyn AttrType) -> bool {
                same_type(self, other)
            }
        }

        $(#[$vmeta])*
        #[derive(Clone, Debug, Default, PartialEq)]
        pub struct $val {
            /// The known value; meaningless when `null` or `unknown` is set.
            pub value: $inner,
            /// Explicitly absent.
            pub null: bool,
            /// Not yet known.
            pub unknown: bool,
        }

        impl $val {
            /// A known value.
            pub fn new(value: impl Into<$inner>) -> Self {
                Self {
                    value: value.into(),
                    null: false,
                    unknown: false,
                }
            }

            /// A null value.
            pub fn null() -> Self {
                Self {
                    null: true,
                    ..Self::default()
                }
            }

            /// An unknown value.
            pub fn unknown() -> Self {
                Self {
                    unknown: true,
                    ..Self::default()
                }
            }

            /// Whether the value is null.
            pub fn is_null(&self) -> bool {
                self.null
            }

            /// Whether the value is unknown.
            pub fn is_unknown(&self) -> bool {
                self.unknown
            }
        }

        impl AttrValue for $val {
            fn attr_type(&self) -> Arc<dyn AttrType> {
                Arc::new($ty)
            }

            fn to_wire(&self, _ctx: &Context) -> AttrResult<Value> {
                if self.null {
                    return Ok(Value::null(WireType::$wire));
                }
                if self.unknown {
                    return Ok(Value::unknown(WireType::$wire));
                }
                let $tv = &self.value;
                Ok($to)
            }

            fn equal(&self, other: &dyn AttrValue) -> bool {
                same_value(self, other)
            }
        }
    };
}

primitive! {
    /// UTF-8 string attributes.
    type StringType;
    /// Host value of a [`StringType`] attribute.
    value StringValue(String);
    wire String;
    from_wire |v| v.as_str().map(str::to_owned);
    to_wire |s| Value::string(s.clone());
}

primitive! {
    /// Numeric attributes.
    type NumberType;
    /// Host value of a [`NumberType`] attribute.
    value NumberValue(Number);
    wire Number;
    from_wire |v| v.as_number();
    to_wire |n| Value::number(*n);
}

primitive! {
    /// Boolean attributes.
    type BoolType;
    /// Host value of a [`BoolType`] attribute.
    value BoolValue(bool);
    wire Bool;
    from_wire |v| v.as_bool();
    to_wire |b| Value::bool(*b);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Step;

    #[test]
    fn test_string_from_wire() {
        let ctx = Context::background();
        let v = StringType.value_from_wire(&ctx, &Value::string("foo")).unwrap();
        let v = v.as_ref().as_any().downcast_ref::<StringValue>().unwrap();
        assert_eq!(v, &StringValue::new("foo"));

        let null = StringType
            .value_from_wire(&ctx, &Value::null(WireType::String))
            .unwrap();
        assert!(null.equal(&StringValue::null()));
    }

    #[test]
    fn test_from_wire_rejects_other_shapes() {
        let ctx = Context::background();
        let err = BoolType
            .value_from_wire(&ctx, &Value::string("true"))
            .unwrap_err();
        assert!(matches!(err, AttrError::TypeMismatch { .. }));
    }

    #[test]
    fn test_to_wire_states() {
        let ctx = Context::background();
        assert_eq!(
            NumberValue::new(3).to_wire(&ctx).unwrap(),
            Value::number(3)
        );
        assert!(NumberValue::unknown().to_wire(&ctx).unwrap().is_unknown());
        assert!(BoolValue::null().to_wire(&ctx).unwrap().is_null());
    }

    #[test]
    fn test_type_equality() {
        assert!(StringType.equal(&StringType));
        assert!(!StringType.equal(&BoolType));
        assert!(StringType.step_type(&Step::attr("x")).is_err());
    }

    #[test]
    fn test_default_is_known_zero() {
        let v = StringValue::default();
        assert!(!v.is_null() && !v.is_unknown());
        assert_eq!(v.value, "");
    }
}
