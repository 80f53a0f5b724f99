//! Document facades: a value tree paired with its schema.
//!
//! [`State`] and [`Plan`] can be read and written, [`Config`] can only be
//! read. Every operation reports problems as [`Diagnostics`]; none of them
//! fails or panics.
//!
//! # Examples
//!
//! ```
//! use attrdoc::types::StringType;
//! use attrdoc::{path, Attribute, Context, ReadDocument, Schema, State, WriteDocument};
//! use std::sync::Arc;
//!
//! let schema = Arc::new(Schema::new().attribute("name", Attribute::new(StringType).required()));
//! let mut state = State::null(schema);
//! let ctx = Context::background();
//!
//! let diags = state.set_attribute(&ctx, &path!("name"), "foo");
//! assert!(diags.is_empty());
//!
//! let mut name = String::new();
//! let diags = state.get_attribute(&ctx, &path!("name"), &mut name);
//! assert!(diags.is_empty());
//! assert_eq!(name, "foo");
//! ```

use crate::attr::validate_value;
use crate::diag::{error_diagnostic, provider_bug_detail};
use crate::reflect::{self, FromAttr, Marshaler, Options, ToAttr};
use crate::{
    transform, walk, AttrError, AttrResult, AttrType, AttrValue, Context, Diagnostic, Diagnostics,
    Path, Schema, Value,
};
use std::sync::Arc;

/// Read operations shared by every document facade.
pub trait ReadDocument {
    /// Name used in diagnostic summaries ("State", "Plan", "Config").
    const KIND: &'static str;

    /// The current value tree.
    fn raw(&self) -> &Value;

    /// The schema the tree conforms to.
    fn schema(&self) -> &Schema;

    /// Conversion options used by reads.
    fn options(&self) -> Options;

    /// Decode the whole document into `target`.
    fn get<T: FromAttr>(&self, ctx: &Context, target: &mut T) -> Diagnostics {
        tracing::debug!(document = Self::KIND, "reading document");
        let ty = self.schema().attribute_type();
        reflect::into_target(ctx, &ty, self.raw(), target, self.options())
    }

    /// Decode the attribute at `path` into `target`.
    ///
    /// When the document, or any ancestor of `path`, is null there is no
    /// value and no error: `target` takes the null representation of its
    /// type if it has one (`None`, a null `StringValue`, ...), and is left
    /// untouched otherwise.
    fn get_attribute<T: FromAttr>(&self, ctx: &Context, path: &Path, target: &mut T) -> Diagnostics {
        tracing::debug!(document = Self::KIND, path = %path, "reading attribute");
        let (found, mut diags) = lookup(self, ctx, path);
        match found {
            Lookup::Failed => {}
            Lookup::Absent(ty) => {
                let null = Value::null(ty.wire_type());
                let mut m = Marshaler::new(ctx, self.options());
                if let Some(v) = m.convert::<T>(ty.as_ref(), &null, path) {
                    *target = v;
                }
            }
            Lookup::Found(value) => {
                let converted = reflect::value_as(ctx, value.as_ref(), target, path, self.options());
                diags.append(converted.attribute_unpathed(path));
            }
        }
        diags
    }

    /// The typed value of the attribute at `path`.
    ///
    /// `None` without errors means the attribute has no value because the
    /// document or one of its ancestors is null.
    fn get_attribute_value(&self, ctx: &Context, path: &Path) -> (Option<Box<dyn AttrValue>>, Diagnostics) {
        let (found, diags) = lookup(self, ctx, path);
        match found {
            Lookup::Found(value) => (Some(value), diags),
            Lookup::Absent(_) | Lookup::Failed => (None, diags),
        }
    }

    /// Encode the current tree as JSON.
    fn to_json(&self) -> serde_json::Value {
        self.raw().to_json()
    }
}

/// Write operations of mutable document facades.
pub trait WriteDocument: ReadDocument {
    /// Mutable access to the current value tree.
    fn raw_mut(&mut self) -> &mut Value;

    /// Replace the whole document with `val`.
    ///
    /// An absent value (e.g. `None`) is rejected; use
    /// [`remove_resource`](Self::remove_resource) instead. On any error the
    /// current tree is left untouched.
    fn set<T: ToAttr + ?Sized>(&mut self, ctx: &Context, val: &T) -> Diagnostics {
        let summary = write_summary::<Self>();
        let kind = Self::KIND.to_lowercase();
        if val.is_absent() {
            tracing::warn!(document = Self::KIND, "refusing to set an absent value as the whole document");
            return Diagnostic::error(
                summary,
                provider_bug_detail(
                    &format!("write the {}", kind),
                    format!(
                        "cannot set an absent value as the entire {kind}; to remove a resource from {kind}, call remove_resource instead"
                    ),
                ),
            )
            .into();
        }

        let ty = self.schema().attribute_type();
        let (value, mut diags) = reflect::from_value(ctx, &ty, val, &Path::root());
        if diags.has_error() {
            return diags;
        }
        let Some(value) = value else {
            return diags;
        };
        match value.to_wire(ctx) {
            Ok(wire) => {
                tracing::debug!(document = Self::KIND, "replaced document");
                *self.raw_mut() = wire;
            }
            Err(err) => diags.push(error_diagnostic(
                None,
                &summary,
                &format!("write the {}", kind),
                &err,
            )),
        }
        diags
    }

    /// Replace the attribute at `path` with `val`.
    ///
    /// Missing parents are created on the way down: null objects become
    /// objects of null attributes and absent map keys become entries. The
    /// new value is validated once more in place; if that or anything else
    /// reports an error the current tree is left untouched.
    fn set_attribute<T: ToAttr + ?Sized>(&mut self, ctx: &Context, path: &Path, val: &T) -> Diagnostics {
        tracing::debug!(document = Self::KIND, path = %path, "writing attribute");
        let summary = write_summary::<Self>();
        let action = format!("write an attribute to the {}", Self::KIND.to_lowercase());

        let ty = match self.schema().attribute_type_at_path(path) {
            Ok(ty) => ty,
            Err(err) => {
                return schema_lookup_error(path, &summary, &action, err).into();
            }
        };

        let (value, mut diags) = reflect::from_value(ctx, ty.as_ref(), val, path);
        if diags.has_error() {
            return diags;
        }
        let Some(value) = value else {
            return diags;
        };
        let wire = match value.to_wire(ctx) {
            Ok(wire) => wire,
            Err(err) => {
                diags.push(error_diagnostic(Some(path), &summary, &action, &err));
                return diags;
            }
        };

        let mut rejected = Diagnostics::new();
        let result = transform(self.raw(), path, |p, node| {
            if p != path {
                return Ok(node);
            }
            let checked = validate_value(ctx, ty.as_ref(), &wire, path);
            if checked.has_error() {
                rejected = checked.into_iter().filter(Diagnostic::is_error).collect();
                return Ok(node);
            }
            Ok(wire.clone())
        });
        diags.append(rejected);

        match result {
            Ok(updated) if !diags.has_error() => {
                tracing::debug!(document = Self::KIND, path = %path, "attribute committed");
                *self.raw_mut() = updated;
            }
            Ok(_) => {
                tracing::debug!(document = Self::KIND, path = %path, "attribute rejected by validation");
            }
            Err(err) => {
                tracing::debug!(document = Self::KIND, path = %path, error = %err, "transform failed");
                diags.push(error_diagnostic(Some(path), &summary, &action, &err));
            }
        }
        diags
    }

    /// Replace the whole tree with a null document.
    fn remove_resource(&mut self, _ctx: &Context) {
        tracing::debug!(document = Self::KIND, "removing resource");
        let null = self.schema().null_value();
        *self.raw_mut() = null;
    }
}

fn read_summary<D: ReadDocument + ?Sized>() -> String {
    format!("{} Read Error", D::KIND)
}

fn write_summary<D: ReadDocument + ?Sized>() -> String {
    format!("{} Write Error", D::KIND)
}

fn schema_lookup_error(path: &Path, summary: &str, action: &str, err: AttrError) -> Diagnostic {
    Diagnostic::attribute_error(
        path,
        summary,
        provider_bug_detail(action, format!("error getting attribute type in schema: {}", err)),
    )
}

enum Lookup {
    Failed,
    Absent(Arc<dyn AttrType>),
    Found(Box<dyn AttrValue>),
}

fn lookup<D: ReadDocument + ?Sized>(doc: &D, ctx: &Context, path: &Path) -> (Lookup, Diagnostics) {
    let summary = read_summary::<D>();
    let action = format!("read an attribute from the {}", D::KIND.to_lowercase());
    let mut diags = Diagnostics::new();

    let ty = match doc.schema().attribute_type_at_path(path) {
        Ok(ty) => ty,
        Err(err) => {
            diags.push(schema_lookup_error(path, &summary, &action, err));
            return (Lookup::Failed, diags);
        }
    };

    let raw = doc.raw();
    if raw.is_null() {
        return (Lookup::Absent(ty), diags);
    }

    let unknown;
    let node = match walk(raw, path) {
        Ok(node) => node,
        Err(err) => match blocked_by(raw, &err) {
            Some(ancestor) if ancestor.is_null() => return (Lookup::Absent(ty), diags),
            Some(ancestor) if ancestor.is_unknown() => {
                unknown = Value::unknown(ty.wire_type());
                &unknown
            }
            _ => {
                diags.push(error_diagnostic(Some(path), &summary, &action, &err));
                return (Lookup::Failed, diags);
            }
        },
    };

    diags.append(validate_value(ctx, ty.as_ref(), node, path));
    if diags.has_error() {
        return (Lookup::Failed, diags);
    }

    match ty.value_from_wire(ctx, node) {
        Ok(value) => (Lookup::Found(value), diags),
        Err(err) => {
            diags.push(error_diagnostic(Some(path), &summary, &action, &err.with_prefix(path)));
            (Lookup::Failed, diags)
        }
    }
}

/// The node a failed walk stopped at.
fn blocked_by<'a>(raw: &'a Value, err: &AttrError) -> Option<&'a Value> {
    match err {
        AttrError::StepFailed { path, .. } => walk(raw, path).ok(),
        _ => None,
    }
}

macro_rules! document {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug)]
        pub struct $name {
            /// The current value tree.
            pub raw: Value,
            /// The schema `raw` conforms to.
            pub schema: Arc<Schema>,
            options: Options,
        }

        impl $name {
            /// Wrap an existing tree.
            pub fn new(schema: Arc<Schema>, raw: Value) -> Self {
                Self {
                    raw,
                    schema,
                    options: Options::default(),
                }
            }

            /// A document whose tree is null.
            pub fn null(schema: Arc<Schema>) -> Self {
                let raw = schema.null_value();
                Self::new(schema, raw)
            }

            /// Decode a tree from JSON.
            pub fn from_json(schema: Arc<Schema>, json: &serde_json::Value) -> AttrResult<Self> {
                let raw = Value::from_json(&schema.wire_type(), json)?;
                Ok(Self::new(schema, raw))
            }

            /// Use `options` for reads.
            pub fn with_options(mut self, options: Options) -> Self {
                self.options = options;
                self
            }
        }

        impl ReadDocument for $name {
            const KIND: &'static str = stringify!($name);

            fn raw(&self) -> &Value {
                &self.raw
            }

            fn schema(&self) -> &Schema {
                &self.schema
            }

            fn options(&self) -> Options {
                self.options
            }
        }
    };
}

document! {
    /// The recorded state of a resource.
    State
}

document! {
    /// The planned state of a resource.
    Plan
}

document! {
    /// The user-supplied configuration of a resource. Read-only.
    Config
}

impl WriteDocument for State {
    fn raw_mut(&mut self) -> &mut Value {
        &mut self.raw
    }
}

impl WriteDocument for Plan {
    fn raw_mut(&mut self) -> &mut Value {
        &mut self.raw
    }
}
