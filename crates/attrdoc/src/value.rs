//! Wire-level value tree.
//!
//! A [`Value`] is an immutable node tagged with its [`WireType`]. A node is
//! null, unknown, or known; known composite nodes own their children. Nodes
//! can only be built through checked constructors, so a value's payload
//! always agrees with its declared type.

use crate::{AttrError, AttrResult, Path};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// The wire-level shape of a value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum WireType {
    /// UTF-8 string.
    String,
    /// Integer or floating point number.
    Number,
    /// Boolean.
    Bool,
    /// Ordered list of elements of one type.
    List(Box<WireType>),
    /// Unordered collection of unique elements of one type.
    Set(Box<WireType>),
    /// String-keyed map of elements of one type.
    Map(Box<WireType>),
    /// Fixed set of named attributes, each with its own type.
    Object(BTreeMap<String, WireType>),
}

impl WireType {
    /// List of `elem`.
    pub fn list(elem: WireType) -> Self {
        WireType::List(Box::new(elem))
    }

    /// Set of `elem`.
    pub fn set(elem: WireType) -> Self {
        WireType::Set(Box::new(elem))
    }

    /// Map of `elem`.
    pub fn map(elem: WireType) -> Self {
        WireType::Map(Box::new(elem))
    }

    /// Object with the given attribute types.
    pub fn object<K: Into<String>>(attrs: impl IntoIterator<Item = (K, WireType)>) -> Self {
        WireType::Object(attrs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Element type of a list, set or map.
    pub fn element_type(&self) -> Option<&WireType> {
        match self {
            WireType::List(e) | WireType::Set(e) | WireType::Map(e) => Some(e),
            _ => None,
        }
    }

    /// Attribute types of an object.
    pub fn attribute_types(&self) -> Option<&BTreeMap<String, WireType>> {
        match self {
            WireType::Object(attrs) => Some(attrs),
            _ => None,
        }
    }

    /// Whether this is a string, number or bool.
    pub fn is_primitive(&self) -> bool {
        matches!(self, WireType::String | WireType::Number | WireType::Bool)
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireType::String => write!(f, "String"),
            WireType::Number => write!(f, "Number"),
            WireType::Bool => write!(f, "Bool"),
            WireType::List(e) => write!(f, "List[{}]", e),
            WireType::Set(e) => write!(f, "Set[{}]", e),
            WireType::Map(e) => write!(f, "Map[{}]", e),
            WireType::Object(attrs) => {
                write!(f, "Object[")?;
                for (i, (k, v)) in attrs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}:{}", k, v)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// A finite number.
///
/// Integral values that fit in `i64` are always stored exactly; everything
/// else is an `f64`. Non-finite floats are not representable.
#[derive(Clone, Copy, Debug)]
pub struct Number(Repr);

#[derive(Clone, Copy, Debug)]
enum Repr {
    Int(i64),
    Float(f64),
}

// 2^63 as f64; the largest float strictly below it converts to i64 exactly.
pub(crate) const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

impl Number {
    /// Create a number from a float, returning `None` for NaN or infinities.
    pub fn from_f64(f: f64) -> Option<Number> {
        if !f.is_finite() {
            return None;
        }
        if f.fract() == 0.0 && (-I64_BOUND..I64_BOUND).contains(&f) {
            return Some(Number(Repr::Int(f as i64)));
        }
        Some(Number(Repr::Float(f)))
    }

    /// The value as `i64`, if it is an integer in range.
    #[inline]
    pub fn as_i64(&self) -> Option<i64> {
        match self.0 {
            Repr::Int(i) => Some(i),
            Repr::Float(_) => None,
        }
    }

    /// The value as `f64` (may round large integers).
    #[inline]
    pub fn as_f64(&self) -> f64 {
        match self.0 {
            Repr::Int(i) => i as f64,
            Repr::Float(f) => f,
        }
    }

    /// Whether the value is an integer.
    #[inline]
    pub fn is_integer(&self) -> bool {
        matches!(self.0, Repr::Int(_))
    }

    /// Convert to `serde_json::Number`.
    pub fn to_json(&self) -> serde_json::Number {
        match self.0 {
            Repr::Int(i) => i.into(),
            Repr::Float(f) => serde_json::Number::from_f64(f).unwrap_or_else(|| 0.into()),
        }
    }

    /// Convert from `serde_json::Number`.
    ///
    /// Returns `None` for integers above `i64::MAX`, which `f64` would round.
    pub fn from_json(n: &serde_json::Number) -> Option<Number> {
        if let Some(i) = n.as_i64() {
            return Some(Number(Repr::Int(i)));
        }
        if n.is_u64() {
            return None;
        }
        n.as_f64().and_then(Number::from_f64)
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self.0, other.0) {
            (Repr::Int(a), Repr::Int(b)) => a == b,
            (Repr::Float(a), Repr::Float(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }
}

impl Eq for Number {}

impl Hash for Number {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self.0 {
            Repr::Int(i) => {
                0u8.hash(state);
                i.hash(state);
            }
            Repr::Float(f) => {
                1u8.hash(state);
                f.to_bits().hash(state);
            }
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Repr::Int(i) => write!(f, "{}", i),
            Repr::Float(v) => write!(f, "{}", v),
        }
    }
}

impl Default for Number {
    fn default() -> Self {
        Number(Repr::Int(0))
    }
}

impl From<i64> for Number {
    fn from(v: i64) -> Self {
        Number(Repr::Int(v))
    }
}

impl From<i32> for Number {
    fn from(v: i32) -> Self {
        Number(Repr::Int(v as i64))
    }
}

impl From<u32> for Number {
    fn from(v: u32) -> Self {
        Number(Repr::Int(v as i64))
    }
}

impl TryFrom<f64> for Number {
    type Error = AttrError;

    fn try_from(v: f64) -> AttrResult<Self> {
        Number::from_f64(v)
            .ok_or_else(|| AttrError::conversion(format!("{} is not a finite number", v)))
    }
}

/// Known payload of a value.
///
/// Set payloads compare and hash without regard to element order.
#[derive(Clone, Debug)]
pub enum Payload {
    /// String payload.
    String(String),
    /// Number payload.
    Number(Number),
    /// Bool payload.
    Bool(bool),
    /// List elements in order.
    List(Vec<Value>),
    /// Set elements; order is insertion order and carries no meaning.
    Set(Vec<Value>),
    /// Map entries.
    Map(BTreeMap<String, Value>),
    /// Object attributes.
    Object(BTreeMap<String, Value>),
}

impl PartialEq for Payload {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Payload::String(a), Payload::String(b)) => a == b,
            (Payload::Number(a), Payload::Number(b)) => a == b,
            (Payload::Bool(a), Payload::Bool(b)) => a == b,
            (Payload::List(a), Payload::List(b)) => a == b,
            // Set elements are unique, so containment both ways is equality.
            (Payload::Set(a), Payload::Set(b)) => a.len() == b.len() && a.iter().all(|e| b.contains(e)),
            (Payload::Map(a), Payload::Map(b)) => a == b,
            (Payload::Object(a), Payload::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Payload {}

impl Hash for Payload {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Payload::String(s) => s.hash(state),
            Payload::Number(n) => n.hash(state),
            Payload::Bool(b) => b.hash(state),
            Payload::List(v) => v.hash(state),
            Payload::Set(v) => {
                let combined = v.iter().fold(0u64, |acc, e| {
                    let mut h = std::collections::hash_map::DefaultHasher::new();
                    e.hash(&mut h);
                    acc.wrapping_add(h.finish())
                });
                v.len().hash(state);
                combined.hash(state);
            }
            Payload::Map(m) | Payload::Object(m) => m.hash(state),
        }
    }
}

/// Whether a value is null, unknown, or known.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueState {
    /// Explicitly absent.
    Null,
    /// Not yet known (will be known later).
    Unknown,
    /// Known, with a payload.
    Known(Payload),
}

/// An immutable wire-level value.
///
/// # Examples
///
/// ```
/// use attrdoc::{Value, WireType};
///
/// let v = Value::object([("name", Value::string("foo"))]);
/// assert_eq!(v.ty(), &WireType::object([("name", WireType::String)]));
/// assert_eq!(v.as_object().unwrap()["name"].as_str(), Some("foo"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Value {
    ty: WireType,
    state: ValueState,
}

impl Value {
    /// Create a known value, checking that the payload matches `ty`.
    pub fn new(ty: WireType, payload: Payload) -> AttrResult<Value> {
        check_payload(&ty, &payload)?;
        Ok(Value {
            ty,
            state: ValueState::Known(payload),
        })
    }

    /// Create a null value of type `ty`.
    pub fn null(ty: WireType) -> Value {
        Value {
            ty,
            state: ValueState::Null,
        }
    }

    /// Create an unknown value of type `ty`.
    pub fn unknown(ty: WireType) -> Value {
        Value {
            ty,
            state: ValueState::Unknown,
        }
    }

    /// Known string.
    pub fn string(s: impl Into<String>) -> Value {
        Value {
            ty: WireType::String,
            state: ValueState::Known(Payload::String(s.into())),
        }
    }

    /// Known number.
    pub fn number(n: impl Into<Number>) -> Value {
        Value {
            ty: WireType::Number,
            state: ValueState::Known(Payload::Number(n.into())),
        }
    }

    /// Known bool.
    pub fn bool(b: bool) -> Value {
        Value {
            ty: WireType::Bool,
            state: ValueState::Known(Payload::Bool(b)),
        }
    }

    /// Known list with element type `elem`.
    pub fn list(elem: WireType, elems: Vec<Value>) -> AttrResult<Value> {
        Value::new(WireType::list(elem), Payload::List(elems))
    }

    /// Known set with element type `elem`.
    pub fn set(elem: WireType, elems: Vec<Value>) -> AttrResult<Value> {
        Value::new(WireType::set(elem), Payload::Set(elems))
    }

    /// Known map with element type `elem`.
    pub fn map(elem: WireType, entries: BTreeMap<String, Value>) -> AttrResult<Value> {
        Value::new(WireType::map(elem), Payload::Map(entries))
    }

    /// Known object whose type is inferred from its attributes.
    pub fn object<K: Into<String>>(attrs: impl IntoIterator<Item = (K, Value)>) -> Value {
        let attrs: BTreeMap<String, Value> =
            attrs.into_iter().map(|(k, v)| (k.into(), v)).collect();
        let ty = WireType::Object(attrs.iter().map(|(k, v)| (k.clone(), v.ty.clone())).collect());
        Value {
            ty,
            state: ValueState::Known(Payload::Object(attrs)),
        }
    }

    /// Known object with every attribute of `ty` set to null.
    ///
    /// Returns `None` when `ty` is not an object type.
    pub fn object_of_nulls(ty: &WireType) -> Option<Value> {
        let attrs = ty.attribute_types()?;
        let children = attrs
            .iter()
            .map(|(k, t)| (k.clone(), Value::null(t.clone())))
            .collect();
        Some(Value {
            ty: ty.clone(),
            state: ValueState::Known(Payload::Object(children)),
        })
    }

    /// The declared wire type.
    #[inline]
    pub fn ty(&self) -> &WireType {
        &self.ty
    }

    /// The null/unknown/known state.
    #[inline]
    pub fn state(&self) -> &ValueState {
        &self.state
    }

    /// Whether the value is null.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self.state, ValueState::Null)
    }

    /// Whether the value is unknown.
    #[inline]
    pub fn is_unknown(&self) -> bool {
        matches!(self.state, ValueState::Unknown)
    }

    /// Whether the value is known (not null, not unknown).
    #[inline]
    pub fn is_known(&self) -> bool {
        matches!(self.state, ValueState::Known(_))
    }

    /// Whether neither this value nor any descendant is unknown.
    pub fn is_fully_known(&self) -> bool {
        match &self.state {
            ValueState::Null => true,
            ValueState::Unknown => false,
            ValueState::Known(p) => match p {
                Payload::List(v) | Payload::Set(v) => v.iter().all(Value::is_fully_known),
                Payload::Map(m) | Payload::Object(m) => m.values().all(Value::is_fully_known),
                _ => true,
            },
        }
    }

    /// The payload if the value is known.
    #[inline]
    pub fn payload(&self) -> Option<&Payload> {
        match &self.state {
            ValueState::Known(p) => Some(p),
            _ => None,
        }
    }

    /// Consume the value, returning its type and payload if known.
    pub fn into_parts(self) -> (WireType, ValueState) {
        (self.ty, self.state)
    }

    /// Known string contents.
    pub fn as_str(&self) -> Option<&str> {
        match self.payload()? {
            Payload::String(s) => Some(s),
            _ => None,
        }
    }

    /// Known number.
    pub fn as_number(&self) -> Option<Number> {
        match self.payload()? {
            Payload::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Known bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self.payload()? {
            Payload::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Known list elements.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self.payload()? {
            Payload::List(v) => Some(v),
            _ => None,
        }
    }

    /// Known set elements.
    pub fn as_set(&self) -> Option<&[Value]> {
        match self.payload()? {
            Payload::Set(v) => Some(v),
            _ => None,
        }
    }

    /// Known map entries.
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self.payload()? {
            Payload::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Known object attributes.
    pub fn as_object(&self) -> Option<&BTreeMap<String, Value>> {
        match self.payload()? {
            Payload::Object(m) => Some(m),
            _ => None,
        }
    }

    /// Check that this value has the expected type.
    pub fn expect_type(&self, expected: &WireType, path: &Path) -> AttrResult<()> {
        if &self.ty == expected {
            Ok(())
        } else {
            Err(AttrError::type_mismatch(path.clone(), expected, &self.ty))
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let payload = match &self.state {
            ValueState::Null => return write!(f, "null"),
            ValueState::Unknown => return write!(f, "<unknown>"),
            ValueState::Known(p) => p,
        };
        match payload {
            Payload::String(s) => write!(f, "{:?}", s),
            Payload::Number(n) => write!(f, "{}", n),
            Payload::Bool(b) => write!(f, "{}", b),
            Payload::List(v) | Payload::Set(v) => {
                write!(f, "[")?;
                for (i, e) in v.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", e)?;
                }
                write!(f, "]")
            }
            Payload::Map(m) | Payload::Object(m) => {
                write!(f, "{{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

fn check_payload(ty: &WireType, payload: &Payload) -> AttrResult<()> {
    match (ty, payload) {
        (WireType::String, Payload::String(_))
        | (WireType::Number, Payload::Number(_))
        | (WireType::Bool, Payload::Bool(_)) => Ok(()),
        (WireType::List(elem), Payload::List(elems)) => check_elements(elem, elems),
        (WireType::Set(elem), Payload::Set(elems)) => {
            check_elements(elem, elems)?;
            for (i, e) in elems.iter().enumerate() {
                if elems[..i].contains(e) {
                    return Err(AttrError::invalid_value(
                        Path::root().element(e.clone()),
                        "duplicate set element",
                    ));
                }
            }
            Ok(())
        }
        (WireType::Map(elem), Payload::Map(entries)) => {
            for (k, v) in entries {
                v.expect_type(elem, &Path::root().key(k.as_str()))?;
            }
            Ok(())
        }
        (WireType::Object(attrs), Payload::Object(values)) => {
            for (k, t) in attrs {
                match values.get(k) {
                    Some(v) => v.expect_type(t, &Path::root().attr(k.as_str()))?,
                    None => {
                        return Err(AttrError::invalid_value(
                            Path::root().attr(k.as_str()),
                            "attribute declared by the object type is missing",
                        ))
                    }
                }
            }
            if let Some(extra) = values.keys().find(|k| !attrs.contains_key(*k)) {
                return Err(AttrError::invalid_value(
                    Path::root().attr(extra.as_str()),
                    "attribute is not declared by the object type",
                ));
            }
            Ok(())
        }
        _ => Err(AttrError::invalid_value(
            Path::root(),
            format!("payload does not match declared type {}", ty),
        )),
    }
}

fn check_elements(elem: &WireType, elems: &[Value]) -> AttrResult<()> {
    for (i, e) in elems.iter().enumerate() {
        e.expect_type(elem, &Path::root().index(i))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_normalizes_integral_floats() {
        let n = Number::from_f64(3.0).unwrap();
        assert!(n.is_integer());
        assert_eq!(n, Number::from(3i64));
        assert_eq!(Number::from_f64(-0.0).unwrap(), Number::from(0i64));
        assert!(!Number::from_f64(1.5).unwrap().is_integer());
    }

    #[test]
    fn test_number_rejects_non_finite() {
        assert!(Number::from_f64(f64::NAN).is_none());
        assert!(Number::try_from(f64::INFINITY).is_err());
    }

    #[test]
    fn test_list_rejects_mismatched_elements() {
        let err = Value::list(WireType::String, vec![Value::string("a"), Value::bool(true)])
            .unwrap_err();
        match err {
            AttrError::TypeMismatch { path, .. } => assert_eq!(path, Path::root().index(1)),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_set_rejects_duplicates() {
        let err = Value::set(WireType::String, vec![Value::string("a"), Value::string("a")])
            .unwrap_err();
        assert!(matches!(err, AttrError::InvalidValue { .. }));
    }

    #[test]
    fn test_object_payload_must_match_attribute_set() {
        let ty = WireType::object([("a", WireType::String), ("b", WireType::Bool)]);
        let mut attrs = BTreeMap::new();
        attrs.insert("a".to_string(), Value::string("x"));
        let err = Value::new(ty.clone(), Payload::Object(attrs.clone())).unwrap_err();
        assert!(matches!(err, AttrError::InvalidValue { .. }));

        attrs.insert("b".to_string(), Value::null(WireType::Bool));
        assert!(Value::new(ty, Payload::Object(attrs)).is_ok());
    }

    #[test]
    fn test_payload_kind_mismatch() {
        let err = Value::new(WireType::Bool, Payload::String("x".into())).unwrap_err();
        assert!(matches!(err, AttrError::InvalidValue { .. }));
    }

    #[test]
    fn test_object_of_nulls() {
        let ty = WireType::object([("a", WireType::String)]);
        let v = Value::object_of_nulls(&ty).unwrap();
        assert!(v.is_known());
        assert!(v.as_object().unwrap()["a"].is_null());
        assert!(Value::object_of_nulls(&WireType::String).is_none());
    }

    #[test]
    fn test_is_fully_known() {
        let v = Value::object([("a", Value::unknown(WireType::String))]);
        assert!(!v.is_fully_known());
        assert!(Value::null(WireType::String).is_fully_known());
    }

    #[test]
    fn test_display() {
        let v = Value::object([("n", Value::number(1)), ("s", Value::string("x"))]);
        assert_eq!(v.to_string(), "{\"n\": 1, \"s\": \"x\"}");
        assert_eq!(WireType::list(WireType::String).to_string(), "List[String]");
    }
}
