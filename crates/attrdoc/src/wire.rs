//! JSON encoding of wire values.
//!
//! Values are encoded as plain JSON according to their type. Null is JSON
//! `null`; unknown values of any type are encoded as [`UNKNOWN_SENTINEL`].
//! Sets are encoded as arrays. Decoding needs the expected [`WireType`],
//! since JSON alone cannot distinguish a list from a set or a map from an
//! object.

use crate::value::Payload;
use crate::{AttrError, AttrResult, Number, Path, Value, WireType};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// String standing in for an unknown value.
pub const UNKNOWN_SENTINEL: &str = "74D93920-ED26-11E3-AC10-0800200C9A66";

/// Get the JSON type name of a value.
pub(crate) fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

impl Value {
    /// Encode as JSON.
    pub fn to_json(&self) -> JsonValue {
        if self.is_unknown() {
            return JsonValue::String(UNKNOWN_SENTINEL.to_string());
        }
        let Some(payload) = self.payload() else {
            return JsonValue::Null;
        };
        match payload {
            Payload::String(s) => JsonValue::String(s.clone()),
            Payload::Number(n) => JsonValue::Number(n.to_json()),
            Payload::Bool(b) => JsonValue::Bool(*b),
            Payload::List(elems) | Payload::Set(elems) => {
                JsonValue::Array(elems.iter().map(Value::to_json).collect())
            }
            Payload::Map(entries) | Payload::Object(entries) => JsonValue::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// Decode JSON as a value of type `ty`.
    ///
    /// Object attributes missing from the JSON decode as null; attributes
    /// the type does not declare are rejected.
    ///
    /// # Examples
    ///
    /// ```
    /// use attrdoc::{Value, WireType};
    /// use serde_json::json;
    ///
    /// let ty = WireType::object([("name", WireType::String), ("size", WireType::Number)]);
    /// let v = Value::from_json(&ty, &json!({"name": "foo"})).unwrap();
    /// assert_eq!(v.as_object().unwrap()["name"].as_str(), Some("foo"));
    /// assert!(v.as_object().unwrap()["size"].is_null());
    /// ```
    pub fn from_json(ty: &WireType, json: &JsonValue) -> AttrResult<Value> {
        decode(ty, json, &Path::root())
    }

    /// Decode a JSON string as a value of type `ty`.
    pub fn from_json_str(ty: &WireType, text: &str) -> AttrResult<Value> {
        let json: JsonValue = serde_json::from_str(text)?;
        Value::from_json(ty, &json)
    }
}

fn mismatch(path: &Path, ty: &WireType, json: &JsonValue) -> AttrError {
    AttrError::type_mismatch(path.clone(), ty, json_type_name(json))
}

fn decode(ty: &WireType, json: &JsonValue, path: &Path) -> AttrResult<Value> {
    match json {
        JsonValue::Null => return Ok(Value::null(ty.clone())),
        JsonValue::String(s) if s == UNKNOWN_SENTINEL => return Ok(Value::unknown(ty.clone())),
        _ => {}
    }

    match (ty, json) {
        (WireType::String, JsonValue::String(s)) => Ok(Value::string(s.as_str())),
        (WireType::Number, JsonValue::Number(n)) => Number::from_json(n)
            .map(Value::number)
            .ok_or_else(|| AttrError::invalid_value(path.clone(), format!("{} cannot be represented as a number without loss", n))),
        (WireType::Bool, JsonValue::Bool(b)) => Ok(Value::bool(*b)),
        (WireType::List(elem) | WireType::Set(elem), JsonValue::Array(items)) => {
            let is_set = matches!(ty, WireType::Set(_));
            let mut elems = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                elems.push(decode(elem, item, &path.index(i))?);
            }
            let payload = if is_set {
                Payload::Set(elems)
            } else {
                Payload::List(elems)
            };
            Value::new(ty.clone(), payload).map_err(|e| e.with_prefix(path))
        }
        (WireType::Map(elem), JsonValue::Object(entries)) => {
            let mut out = BTreeMap::new();
            for (k, v) in entries {
                out.insert(k.clone(), decode(elem, v, &path.key(k.as_str()))?);
            }
            Value::map((**elem).clone(), out).map_err(|e| e.with_prefix(path))
        }
        (WireType::Object(attr_types), JsonValue::Object(entries)) => {
            if let Some(extra) = entries.keys().find(|k| !attr_types.contains_key(*k)) {
                return Err(AttrError::invalid_value(
                    path.attr(extra.as_str()),
                    "attribute is not declared by the object type",
                ));
            }
            let mut out = BTreeMap::new();
            for (k, t) in attr_types {
                let child = match entries.get(k) {
                    Some(v) => decode(t, v, &path.attr(k.as_str()))?,
                    None => Value::null(t.clone()),
                };
                out.insert(k.clone(), child);
            }
            Value::new(ty.clone(), Payload::Object(out)).map_err(|e| e.with_prefix(path))
        }
        _ => Err(mismatch(path, ty, json)),
    }
}
