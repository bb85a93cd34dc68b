//! Update operator documents.
//!
//! Each builder returns a single-field [`ValueMap`]; [`Update::merge`] combines
//! several into one update document.
//!
//! ```ignore
//! use baasday_core::update::Update;
//!
//! let update = Update::merge([
//!     Update::set("title", "renamed"),
//!     Update::increment("views", 1),
//!     Update::push_unique("tags", "rust"),
//!     Update::unset("draft"),
//! ]);
//! ```

use crate::value::{Number, Value, ValueMap};

pub const INCREMENT: &str = "$inc";
pub const PUSH: &str = "$push";
pub const PUSH_UNIQUE: &str = "$pushUnique";
pub const PULL: &str = "$pull";
pub const UNSET: &str = "$unset";

/// Helper struct for constructing update documents.
pub struct Update;

impl Update {
    fn single(field: impl Into<String>, value: Value) -> ValueMap {
        let mut map = ValueMap::new();
        map.insert(field.into(), value);
        map
    }

    fn operator(field: impl Into<String>, operator: &str, value: Value) -> ValueMap {
        Self::single(field, Value::Map(Self::single(operator, value)))
    }

    /// Replaces the field with `value`.
    pub fn set(field: impl Into<String>, value: impl Into<Value>) -> ValueMap {
        Self::single(field, value.into())
    }

    /// Adds `amount` to a numeric field.
    pub fn increment(field: impl Into<String>, amount: impl Into<Number>) -> ValueMap {
        Self::operator(field, INCREMENT, Value::Number(amount.into()))
    }

    /// Subtracts `amount` from a numeric field.
    ///
    /// Sent as an increment by `-amount`; the service only knows `$inc`.
    pub fn decrement(field: impl Into<String>, amount: impl Into<Number>) -> ValueMap {
        let amount: Number = amount.into();
        Self::increment(field, -amount)
    }

    /// Appends `value` to a list field.
    pub fn push(field: impl Into<String>, value: impl Into<Value>) -> ValueMap {
        Self::operator(field, PUSH, value.into())
    }

    /// Appends `value` to a list field unless it is already present.
    pub fn push_unique(field: impl Into<String>, value: impl Into<Value>) -> ValueMap {
        Self::operator(field, PUSH_UNIQUE, value.into())
    }

    /// Removes every occurrence of `value` from a list field.
    pub fn pull(field: impl Into<String>, value: impl Into<Value>) -> ValueMap {
        Self::operator(field, PULL, value.into())
    }

    /// Removes the field from the document.
    pub fn unset(field: impl Into<String>) -> ValueMap {
        Self::operator(field, UNSET, Value::Bool(true))
    }

    /// Merges update documents left to right with a shallow union.
    ///
    /// When two documents name the same field the later one replaces the
    /// earlier one entirely; operators on one field are never combined. Callers
    /// must not put conflicting intents for one field in a single merge.
    pub fn merge(operations: impl IntoIterator<Item = ValueMap>) -> ValueMap {
        operations
            .into_iter()
            .fold(ValueMap::new(), |mut merged, operation| {
                merged.extend(operation);
                merged
            })
    }
}
