//! Schema-bound, path-addressable documents of typed values.
//!
//! `attrdoc` holds a document as an immutable tree of wire-level values,
//! paired with a declarative [`Schema`] that gives every attribute a type.
//! Callers read and write the document through typed facades instead of
//! handling the raw tree.
//!
//! # Core Concepts
//!
//! - **Value**: Immutable wire-level node (null, unknown or known) tagged with its [`WireType`]
//! - **Path**: Sequence of [`Step`]s addressing a node inside a tree
//! - **AttrType / AttrValue**: Extension point converting wire values into typed host values
//! - **Schema**: Attribute names mapped to types and behavioural flags
//! - **Diagnostics**: Severity-tagged, path-attributed problems; nothing here panics or throws
//! - **State / Plan / Config**: Document facades exposing `get`, `get_attribute`, `set`, ...
//!
//! # Pure Transformation
//!
//! ```text
//! Tree' = transform(Tree, Path, f)
//! ```
//!
//! - The input tree is never modified
//! - `f` sees the target node first, then every ancestor
//! - If `f` fails anywhere, no tree is produced at all
//!
//! # Quick Start
//!
//! ```
//! use attrdoc::types::{NumberType, StringType};
//! use attrdoc::{path, Attribute, Context, ReadDocument, Schema, State};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let schema = Arc::new(
//!     Schema::new()
//!         .attribute("name", Attribute::new(StringType).required())
//!         .attribute("size", Attribute::new(NumberType).optional()),
//! );
//! let state = State::from_json(schema, &json!({"name": "disk-1", "size": 20})).unwrap();
//!
//! let ctx = Context::background();
//! let mut size = 0u32;
//! let diags = state.get_attribute(&ctx, &path!("size"), &mut size);
//! assert!(diags.is_empty());
//! assert_eq!(size, 20);
//! ```
//!
//! # Using Structs (with derive macro)
//!
//! ```ignore
//! use attrdoc::{Attributes, Context, ReadDocument, WriteDocument};
//!
//! #[derive(Debug, Default, Attributes)]
//! struct Disk {
//!     name: String,
//!     #[attr(name = "size")]
//!     size_gb: Option<u32>,
//! }
//!
//! let mut disk = Disk::default();
//! let diags = state.get(&ctx, &mut disk);
//! disk.size_gb = Some(40);
//! let diags = state.set(&ctx, &disk);
//! ```

// Generated code names `::attrdoc`, including in this crate's own tests.
extern crate self as attrdoc;

mod attr;
mod context;
mod diag;
mod document;
mod error;
mod path;
pub mod reflect;
mod schema;
pub mod types;
mod value;
mod walk;
mod wire;

// Core types
pub use error::{AttrError, AttrResult};
pub use path::{Path, Step};
pub use value::{Number, Payload, Value, ValueState, WireType};
pub use walk::{transform, walk};
pub use wire::UNKNOWN_SENTINEL;

// Type system
pub use attr::{same_type, same_value, type_at_path, validate_value, AsAny, AttrType, AttrValue};
pub use schema::{Attribute, AttributeKind, NestedAttributes, NestingMode, Schema};

// Conversion and facades
pub use context::Context;
pub use diag::{Diagnostic, Diagnostics, Severity};
pub use document::{Config, Plan, ReadDocument, State, WriteDocument};
pub use reflect::{FromAttr, Marshaler, Options, ToAttr};

// Re-export derive macro when feature is enabled
#[cfg(feature = "derive")]
pub use attrdoc_derive::Attributes;
