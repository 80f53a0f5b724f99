//! Built-in attribute types and their host values.
//!
//! | Type           | Wire shape    | Value          | Child step          |
//! |----------------|---------------|----------------|---------------------|
//! | [`StringType`] | `String`      | [`StringValue`]| none                |
//! | [`NumberType`] | `Number`      | [`NumberValue`]| none                |
//! | [`BoolType`]   | `Bool`        | [`BoolValue`]  | none                |
//! | [`ListType`]   | `List[elem]`  | [`ListValue`]  | list index          |
//! | [`SetType`]    | `Set[elem]`   | [`SetValue`]   | element value       |
//! | [`MapType`]    | `Map[elem]`   | [`MapValue`]   | map key             |
//! | [`ObjectType`] | `Object[..]`  | [`ObjectValue`]| attribute name      |

mod collection;
mod object;
mod primitive;

pub use collection::{ListType, ListValue, MapType, MapValue, SetType, SetValue};
pub use object::{ObjectType, ObjectValue};
pub use primitive::{BoolType, BoolValue, NumberType, NumberValue, StringType, StringValue};

use crate::{AttrError, Path, Step};

fn unsupported_step(step: &Step, owner: &str, expected: &str) -> AttrError {
    AttrError::step_failed(
        Path::root(),
        step.clone(),
        1,
        format!("{} only accepts {} steps", owner, expected),
    )
}
