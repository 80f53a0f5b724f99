//! The attribute type system contract.
//!
//! An [`AttrType`] converts wire values into typed host values
//! ([`AttrValue`]), optionally validates wire values, reports its wire shape,
//! and resolves the type one path step deeper. Built-in types live in
//! [`crate::types`]; custom types implement the same traits and are never
//! treated differently by the core.

use crate::diag::provider_bug_detail;
use crate::{AttrError, AttrResult, Context, Diagnostic, Diagnostics, Path, Step, Value, WireType};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Object-safe access to `Any` for attribute types and values.
///
/// Implemented for every `'static` type; never implement it by hand.
pub trait AsAny: Any {
    /// Borrow as `&dyn Any`.
    fn as_any(&self) -> &dyn Any;
    /// Convert a box into `Box<dyn Any>` for downcasting by value.
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
    /// Name of the concrete type.
    fn type_name(&self) -> &'static str;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// A declared attribute type.
pub trait AttrType: AsAny + fmt::Debug + Send + Sync {
    /// The wire-level shape values of this type must have.
    fn wire_type(&self) -> WireType;

    /// Convert a wire value into this type's host value.
    fn value_from_wire(&self, ctx: &Context, value: &Value) -> AttrResult<Box<dyn AttrValue>>;

    /// Check a wire value against domain rules before conversion.
    ///
    /// Any error-severity entry stops the conversion of `value`; warnings are
    /// passed through to the caller.
    fn validate(&self, _ctx: &Context, _value: &Value, _path: &Path) -> Diagnostics {
        Diagnostics::new()
    }

    /// The type found one step below this type.
    fn step_type(&self, step: &Step) -> AttrResult<Arc<dyn AttrType>> {
        Err(AttrError::step_failed(
            Path::root(),
            step.clone(),
            1,
            format!("{:?} has no children", self),
        ))
    }

    /// Structural type equality.
    fn equal(&self, other: &dyn AttrType) -> bool;
}

/// A typed host-side value produced by an [`AttrType`].
pub trait AttrValue: AsAny + fmt::Debug + Send + Sync {
    /// The type that produces values like this one.
    fn attr_type(&self) -> Arc<dyn AttrType>;

    /// Convert back into a wire value.
    fn to_wire(&self, ctx: &Context) -> AttrResult<Value>;

    /// Value equality across the trait object boundary.
    fn equal(&self, other: &dyn AttrValue) -> bool;
}

/// Downcast helper for [`AttrType::equal`] implementations.
pub fn same_type<T: PartialEq + 'static>(this: &T, other: &dyn AttrType) -> bool {
    other.as_any().downcast_ref::<T>() == Some(this)
}

/// Downcast helper for [`AttrValue::equal`] implementations.
pub fn same_value<T: PartialEq + 'static>(this: &T, other: &dyn AttrValue) -> bool {
    other.as_any().downcast_ref::<T>() == Some(this)
}

/// Run `ty`'s validation hook for `value` at `path`.
///
/// Reports an "Operation Cancelled" error instead of calling the hook when
/// `ctx` has been cancelled. Entries the hook returns without a path are
/// attributed to `path`.
pub fn validate_value(ctx: &Context, ty: &dyn AttrType, value: &Value, path: &Path) -> Diagnostics {
    if ctx.is_cancelled() {
        tracing::debug!(path = %path, "validation skipped: context cancelled");
        return Diagnostic::attribute_error(
            path,
            "Operation Cancelled",
            provider_bug_detail("validate an attribute value", AttrError::Cancelled),
        )
        .into();
    }
    let diags = ty.validate(ctx, value, path).attribute_unpathed(path);
    if diags.has_error() {
        tracing::debug!(path = %path, errors = diags.error_count(), "attribute validation failed");
    }
    diags
}

/// Resolve the type at `path` below `root`, one step at a time.
pub fn type_at_path(root: Arc<dyn AttrType>, path: &Path) -> AttrResult<Arc<dyn AttrType>> {
    let mut current = root;
    for (i, step) in path.steps().iter().enumerate() {
        current = current.step_type(step).map_err(|e| match e {
            AttrError::StepFailed { step, reason, .. } => {
                AttrError::step_failed(path.slice(0, i), step, path.len() - i, reason)
            }
            other => other.with_prefix(&path.slice(0, i)),
        })?;
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;
    use crate::types::{ListType, ObjectType, StringType, StringValue};
    use tokio_util::sync::CancellationToken;

    #[derive(Debug, PartialEq)]
    struct WarnType;

    impl AttrType for WarnType {
        fn wire_type(&self) -> WireType {
            WireType::String
        }

        fn value_from_wire(&self, ctx: &Context, value: &Value) -> AttrResult<Box<dyn AttrValue>> {
            StringType.value_from_wire(ctx, value)
        }

        fn validate(&self, _ctx: &Context, _value: &Value, _path: &Path) -> Diagnostics {
            Diagnostic::warning("Heads up", "").into()
        }

        fn equal(&self, other: &dyn AttrType) -> bool {
            same_type(self, other)
        }
    }

    #[test]
    fn test_validate_value_attributes_unpathed_entries() {
        let diags = validate_value(
            &Context::background(),
            &WarnType,
            &Value::string("x"),
            &path!("name"),
        );
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].path, Some(path!("name")));
        assert!(!diags.has_error());
    }

    #[test]
    fn test_validate_value_reports_cancellation() {
        let token = CancellationToken::new();
        token.cancel();
        let ctx = Context::with_cancellation(token);
        let diags = validate_value(&ctx, &WarnType, &Value::string("x"), &path!("name"));
        assert_eq!(diags.len(), 1);
        assert!(diags.has_error());
        assert_eq!(diags[0].summary, "Operation Cancelled");
    }

    #[test]
    fn test_type_at_path() {
        let root: Arc<dyn AttrType> = Arc::new(ObjectType::new([(
            "names",
            Arc::new(ListType::new(Arc::new(StringType))) as Arc<dyn AttrType>,
        )]));
        let ty = type_at_path(root.clone(), &path!("names", 3)).unwrap();
        assert!(ty.equal(&StringType));

        let err = type_at_path(root, &path!("names", "oops")).unwrap_err();
        match err {
            AttrError::StepFailed {
                path, remaining, ..
            } => {
                assert_eq!(path, path!("names"));
                assert_eq!(remaining, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_as_any_reports_concrete_name() {
        let v: Box<dyn AttrValue> = Box::new(StringValue::new("x"));
        assert!(v.as_ref().type_name().ends_with("StringValue"));
        assert!(v.into_any().downcast::<StringValue>().is_ok());
    }
}
