//! Conversion between wire values and host data structures.
//!
//! [`FromAttr`] decodes a wire value into a host value, [`ToAttr`] encodes a
//! host value into a wire value. Both are implemented for common std types,
//! for the built-in attribute values, and, through
//! [`derive(Attributes)`](crate::Attributes), for structs whose fields map
//! one to one onto object attributes.
//!
//! Every conversion runs through a [`Marshaler`], which collects diagnostics
//! instead of stopping at the first problem, so sibling fields and elements
//! still get reported.

mod collection;
mod object;
mod primitive;

pub use object::{ObjectReader, ObjectWriter};

use crate::attr::validate_value;
use crate::diag::provider_bug_detail;
use crate::{AttrError, AttrType, AttrValue, Context, Diagnostic, Diagnostics, Path, Step, Value};
use std::sync::Arc;

/// Summary of every diagnostic produced by a failed conversion.
pub const CONVERSION_ERROR: &str = "Value Conversion Error";

/// Conversion knobs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Options {
    /// Decode null into the target's zero value when the target has no way
    /// to represent null.
    pub unhandled_null_as_empty: bool,
    /// Decode unknown into the target's zero value when the target has no
    /// way to represent unknown.
    pub unhandled_unknown_as_empty: bool,
}

/// Decode a host value from a wire value.
///
/// `None` means the conversion failed and at least one error diagnostic was
/// recorded on the marshaler.
pub trait FromAttr: Sized {
    /// Decode `value`, which has type `ty` and sits at `path`.
    fn from_attr(m: &mut Marshaler<'_>, ty: &dyn AttrType, value: &Value, path: &Path) -> Option<Self>;

    /// Whether [`from_attr`](Self::from_attr) can carry an unknown value
    /// through, rather than rejecting it.
    fn accepts_unknown() -> bool {
        false
    }
}

/// Encode a host value into a wire value of type `ty`.
pub trait ToAttr {
    /// Encode `self`. `None` means an error was recorded on `m`.
    fn to_attr(&self, m: &mut Marshaler<'_>, ty: &dyn AttrType, path: &Path) -> Option<Value>;

    /// Whether this value stands for "nothing at all" (e.g. `None`).
    fn is_absent(&self) -> bool {
        false
    }
}

/// Shared state of one conversion.
pub struct Marshaler<'a> {
    ctx: &'a Context,
    options: Options,
    diags: Diagnostics,
}

/// A known payload, or the decision to use the target's zero value.
pub enum Slot<'v> {
    /// The value is known.
    Known(&'v Value),
    /// The value is null or unknown and the options allow a zero value.
    Empty,
}

impl<'a> Marshaler<'a> {
    /// Start a conversion with empty diagnostics.
    pub fn new(ctx: &'a Context, options: Options) -> Self {
        Self {
            ctx,
            options,
            diags: Diagnostics::new(),
        }
    }

    /// Context passed to validation hooks and attribute types.
    pub fn ctx(&self) -> &'a Context {
        self.ctx
    }

    /// Options this conversion runs with.
    pub fn options(&self) -> Options {
        self.options
    }

    /// Diagnostics recorded so far.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diags
    }

    /// Finish the conversion and hand back everything recorded.
    pub fn into_diagnostics(self) -> Diagnostics {
        self.diags
    }

    /// Record a diagnostic.
    pub fn push(&mut self, diag: Diagnostic) {
        self.diags.push(diag);
    }

    /// Record a conversion error at `path`.
    pub fn error(&mut self, path: &Path, err: impl std::fmt::Display) {
        tracing::debug!(path = %path, error = %err, "value conversion failed");
        self.diags.push(Diagnostic::attribute_error(
            path,
            CONVERSION_ERROR,
            provider_bug_detail("convert the value", err),
        ));
    }

    /// Validate `value` against `ty` and then decode it.
    ///
    /// This is what container impls call for their children.
    pub fn decode<T: FromAttr>(&mut self, ty: &dyn AttrType, value: &Value, path: &Path) -> Option<T> {
        if !self.validate(ty, value, path) {
            return None;
        }
        T::from_attr(self, ty, value, path)
    }

    /// Decode `value` without running `ty`'s validation hook first.
    pub fn convert<T: FromAttr>(&mut self, ty: &dyn AttrType, value: &Value, path: &Path) -> Option<T> {
        T::from_attr(self, ty, value, path)
    }

    /// Encode `val` as type `ty`, then validate the result.
    pub fn encode<T: ToAttr + ?Sized>(&mut self, val: &T, ty: &dyn AttrType, path: &Path) -> Option<Value> {
        let wire = self.encode_unvalidated(val, ty, path)?;
        if !self.validate(ty, &wire, path) {
            return None;
        }
        Some(wire)
    }

    /// Encode `val` as type `ty`, checking only the resulting wire shape.
    pub fn encode_unvalidated<T: ToAttr + ?Sized>(
        &mut self,
        val: &T,
        ty: &dyn AttrType,
        path: &Path,
    ) -> Option<Value> {
        let wire = val.to_attr(self, ty, path)?;
        let expected = ty.wire_type();
        if wire.ty() != &expected {
            self.error(path, AttrError::type_mismatch(path.clone(), &expected, wire.ty()));
            return None;
        }
        Some(wire)
    }

    /// The type one `step` below `ty`, recording an error if there is none.
    pub fn child_type(&mut self, ty: &dyn AttrType, step: &Step, parent: &Path) -> Option<Arc<dyn AttrType>> {
        match ty.step_type(step) {
            Ok(child) => Some(child),
            Err(err) => {
                self.error(&parent.with_step(step.clone()), err.with_prefix(parent));
                None
            }
        }
    }

    /// Run `ty`'s validation hook, recording its diagnostics.
    ///
    /// Returns `false` when an error was reported.
    pub fn validate(&mut self, ty: &dyn AttrType, value: &Value, path: &Path) -> bool {
        let diags = validate_value(self.ctx, ty, value, path);
        let ok = !diags.has_error();
        self.diags.append(diags);
        ok
    }

    /// Check the wire shape of `value` and resolve null/unknown handling for
    /// a target that can represent neither.
    pub fn known<'v>(
        &mut self,
        value: &'v Value,
        path: &Path,
        target: &str,
        accepts: impl FnOnce(&crate::WireType) -> bool,
    ) -> Option<Slot<'v>> {
        if !accepts(value.ty()) {
            self.error(
                path,
                format!("cannot decode {} value into {}", value.ty(), target),
            );
            return None;
        }
        if value.is_null() {
            if self.options.unhandled_null_as_empty {
                return Some(Slot::Empty);
            }
            self.error(
                path,
                format!("unhandled null value: {} cannot represent null", target),
            );
            return None;
        }
        if value.is_unknown() {
            if self.options.unhandled_unknown_as_empty {
                return Some(Slot::Empty);
            }
            self.error(
                path,
                format!("unhandled unknown value: {} cannot represent unknown", target),
            );
            return None;
        }
        Some(Slot::Known(value))
    }
}

/// Decode `value` of type `ty` into a host value.
///
/// On success the decoded value is returned together with any warnings. On
/// failure the value is `None` and the diagnostics contain at least one
/// error.
pub fn into<T: FromAttr>(
    ctx: &Context,
    ty: &dyn AttrType,
    value: &Value,
    options: Options,
) -> (Option<T>, Diagnostics) {
    let mut m = Marshaler::new(ctx, options);
    let out = m.decode::<T>(ty, value, &Path::root());
    (out, m.into_diagnostics())
}

/// Decode `value` of type `ty` into `target`.
///
/// `target` is left untouched when an error is reported.
pub fn into_target<T: FromAttr>(
    ctx: &Context,
    ty: &dyn AttrType,
    value: &Value,
    target: &mut T,
    options: Options,
) -> Diagnostics {
    let (out, diags) = into::<T>(ctx, ty, value, options);
    if let Some(v) = out {
        *target = v;
    }
    diags
}

/// Encode a host value as type `ty` and convert it into the type's value.
pub fn from_value<T: ToAttr + ?Sized>(
    ctx: &Context,
    ty: &dyn AttrType,
    val: &T,
    path: &Path,
) -> (Option<Box<dyn AttrValue>>, Diagnostics) {
    let mut m = Marshaler::new(ctx, Options::default());
    let Some(wire) = m.encode(val, ty, path) else {
        return (None, m.into_diagnostics());
    };
    let out = match ty.value_from_wire(ctx, &wire) {
        Ok(v) => Some(v),
        Err(err) => {
            m.error(path, err.with_prefix(path));
            None
        }
    };
    (out, m.into_diagnostics())
}

/// Copy a typed attribute value into a host target.
///
/// The value is not validated again.
pub fn value_as<T: FromAttr>(
    ctx: &Context,
    val: &dyn AttrValue,
    target: &mut T,
    path: &Path,
    options: Options,
) -> Diagnostics {
    let mut m = Marshaler::new(ctx, options);
    let wire = match val.to_wire(ctx) {
        Ok(w) => w,
        Err(err) => {
            m.error(path, err.with_prefix(path));
            return m.into_diagnostics();
        }
    };
    let ty = val.attr_type();
    if let Some(v) = m.convert::<T>(ty.as_ref(), &wire, path) {
        *target = v;
    }
    m.into_diagnostics()
}

/// Decode into a concrete [`AttrValue`] implementation.
///
/// Used by `FromAttr` impls of attribute value types: the declared type
/// produces the value, which is then downcast to `T`.
pub fn attr_value_from<T: AttrValue>(
    m: &mut Marshaler<'_>,
    ty: &dyn AttrType,
    value: &Value,
    path: &Path,
) -> Option<T> {
    let produced = match ty.value_from_wire(m.ctx(), value) {
        Ok(v) => v,
        Err(err) => {
            m.error(path, err.with_prefix(path));
            return None;
        }
    };
    let produced_name = produced.as_ref().type_name();
    match produced.into_any().downcast::<T>() {
        Ok(v) => Some(*v),
        Err(_) => {
            m.error(
                path,
                format!(
                    "cannot use attribute value {} as {}",
                    produced_name,
                    std::any::type_name::<T>()
                ),
            );
            None
        }
    }
}

/// Encode a concrete [`AttrValue`] implementation.
pub fn attr_value_to<T: AttrValue>(val: &T, m: &mut Marshaler<'_>, path: &Path) -> Option<Value> {
    match val.to_wire(m.ctx()) {
        Ok(v) => Some(v),
        Err(err) => {
            m.error(path, err.with_prefix(path));
            None
        }
    }
}
