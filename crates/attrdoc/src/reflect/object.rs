//! Field-by-field object conversion used by `#[derive(Attributes)]`.

use super::{FromAttr, Marshaler, Slot, ToAttr};
use crate::value::Payload;
use crate::{AttrType, Path, Step, Value, WireType};
use std::collections::{BTreeMap, BTreeSet};

/// Reads struct fields out of an object value.
pub struct ObjectReader<'v> {
    ty: &'v dyn AttrType,
    attrs: Option<&'v BTreeMap<String, Value>>,
    fill_unknown: bool,
    path: Path,
}

/// Collects encoded struct fields into an object value.
pub struct ObjectWriter<'t> {
    ty: &'t dyn AttrType,
    wire: WireType,
    attrs: BTreeMap<String, Value>,
    failed: bool,
    path: Path,
}

impl<'a> Marshaler<'a> {
    /// Start decoding `value` into a struct named `target` whose tagged
    /// fields are `fields`.
    ///
    /// The object's attribute names must equal `fields` exactly. When the
    /// options turn a null or unknown object into an empty one, every field
    /// is decoded from a null or unknown value of its own type.
    pub fn read_object<'v>(
        &mut self,
        ty: &'v dyn AttrType,
        value: &'v Value,
        path: &Path,
        target: &str,
        fields: &[&str],
    ) -> Option<ObjectReader<'v>> {
        let slot = self.known(value, path, target, |t| matches!(t, WireType::Object(_)))?;
        let declared = value.ty().attribute_types()?;
        self.check_fields(declared.keys(), fields, path, target)?;
        Some(ObjectReader {
            ty,
            attrs: match slot {
                Slot::Known(v) => v.as_object(),
                Slot::Empty => None,
            },
            fill_unknown: value.is_unknown(),
            path: path.clone(),
        })
    }

    /// Start encoding a struct named `target` as type `ty`.
    pub fn write_object<'t>(
        &mut self,
        ty: &'t dyn AttrType,
        path: &Path,
        target: &str,
        fields: &[&str],
    ) -> Option<ObjectWriter<'t>> {
        let wire = ty.wire_type();
        let Some(declared) = wire.attribute_types() else {
            self.error(path, format!("cannot encode {} as {}", target, wire));
            return None;
        };
        self.check_fields(declared.keys(), fields, path, target)?;
        Some(ObjectWriter {
            ty,
            wire,
            attrs: BTreeMap::new(),
            failed: false,
            path: path.clone(),
        })
    }

    fn check_fields<'k>(
        &mut self,
        declared: impl Iterator<Item = &'k String>,
        fields: &[&str],
        path: &Path,
        target: &str,
    ) -> Option<()> {
        let declared: BTreeSet<&str> = declared.map(String::as_str).collect();
        let fields: BTreeSet<&str> = fields.iter().copied().collect();
        let not_in_object: Vec<&str> = fields.difference(&declared).copied().collect();
        let not_in_struct: Vec<&str> = declared.difference(&fields).copied().collect();
        if not_in_object.is_empty() && not_in_struct.is_empty() {
            return Some(());
        }

        let mut parts = Vec::new();
        if !not_in_object.is_empty() {
            parts.push(format!(
                "{} defines fields not found in object: {}.",
                target,
                not_in_object.join(", ")
            ));
        }
        if !not_in_struct.is_empty() {
            parts.push(format!(
                "Object defines fields not found in {}: {}.",
                target,
                not_in_struct.join(", ")
            ));
        }
        self.error(
            path,
            format!("mismatch between struct and object: {}", parts.join(" ")),
        );
        None
    }
}

impl<'v> ObjectReader<'v> {
    /// Decode the attribute `name`.
    ///
    /// Every field should be read before any result is inspected so that
    /// all failing fields get reported.
    pub fn field<T: FromAttr>(&self, m: &mut Marshaler<'_>, name: &str) -> Option<T> {
        let step = Step::attr(name);
        let child_ty = m.child_type(self.ty, &step, &self.path)?;
        let child_path = self.path.with_step(step);
        match self.attrs.and_then(|a| a.get(name)) {
            Some(child) => m.decode::<T>(child_ty.as_ref(), child, &child_path),
            None => {
                let fill = if self.fill_unknown {
                    Value::unknown(child_ty.wire_type())
                } else {
                    Value::null(child_ty.wire_type())
                };
                m.decode::<T>(child_ty.as_ref(), &fill, &child_path)
            }
        }
    }
}

impl<'t> ObjectWriter<'t> {
    /// Encode `val` as the attribute `name`.
    pub fn field<T: ToAttr + ?Sized>(&mut self, m: &mut Marshaler<'_>, name: &str, val: &T) {
        let step = Step::attr(name);
        let Some(child_ty) = m.child_type(self.ty, &step, &self.path) else {
            self.failed = true;
            return;
        };
        match m.encode(val, child_ty.as_ref(), &self.path.with_step(step)) {
            Some(encoded) => {
                self.attrs.insert(name.to_owned(), encoded);
            }
            None => self.failed = true,
        }
    }

    /// Build the object, or `None` if any field failed.
    pub fn finish(self, m: &mut Marshaler<'_>) -> Option<Value> {
        if self.failed {
            return None;
        }
        match Value::new(self.wire, Payload::Object(self.attrs)) {
            Ok(v) => Some(v),
            Err(err) => {
                m.error(&self.path, err.with_prefix(&self.path));
                None
            }
        }
    }
}
