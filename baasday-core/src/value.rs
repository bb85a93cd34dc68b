//! The dynamic value model shared by documents, filters and update operators.
//!
//! A [`Value`] is a closed union of the runtime types a document field may hold.
//! Field maps are plain [`ValueMap`]s; the [`FieldAccess`] trait layers safe,
//! type-checked accessors on top of anything that exposes one.
//!
//! # Accessor contract
//!
//! Object accessors (`get_string`, `get_number`, `get_bool`, `get_list`,
//! `get_map`, `get_date`) return `Ok(None)` when the field is absent or
//! explicitly null. Numeric primitive accessors (`get_int`, `get_long`,
//! `get_double`) return zero in the same situation. Both families fail with
//! [`BaasdayError::TypeMismatch`] when the stored value has another type.
//!
//! ```ignore
//! use baasday_core::{value_map, value::FieldAccess};
//!
//! let values = value_map! { "name" => "alice", "score" => 12 };
//! assert_eq!(values.get_string("name")?, Some("alice"));
//! assert_eq!(values.get_int("score")?, 12);
//! assert_eq!(values.get_int("missing")?, 0);
//! assert_eq!(values.get_string("missing")?, None);
//! ```

use chrono::{DateTime, Utc};
use std::{collections::BTreeMap, ops::Neg};

use crate::error::{BaasdayError, BaasdayResult};

/// A mapping from field name to [`Value`].
///
/// Key order carries no meaning; a `BTreeMap` keeps the wire text deterministic.
pub type ValueMap = BTreeMap<String, Value>;

/// A numeric value, either integral or floating point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    /// Returns the number as an `i64`, truncating floats toward zero (saturating).
    pub fn as_i64(&self) -> i64 {
        match *self {
            Number::Int(value) => value,
            Number::Float(value) => value as i64,
        }
    }

    /// Returns the number as an `i32`, keeping the low 32 bits of integers and
    /// truncating floats toward zero (saturating).
    pub fn as_i32(&self) -> i32 {
        match *self {
            Number::Int(value) => value as i32,
            Number::Float(value) => value as i32,
        }
    }

    /// Returns the number widened to an `f64`.
    pub fn as_f64(&self) -> f64 {
        match *self {
            Number::Int(value) => value as f64,
            Number::Float(value) => value,
        }
    }

    /// Returns `true` if the number is stored as an integer.
    pub fn is_integer(&self) -> bool {
        matches!(self, Number::Int(_))
    }
}

impl Neg for Number {
    type Output = Number;

    fn neg(self) -> Self::Output {
        match self {
            Number::Int(value) => value
                .checked_neg()
                .map(Number::Int)
                .unwrap_or(Number::Float(-(value as f64))),
            Number::Float(value) => Number::Float(-value),
        }
    }
}

impl From<i32> for Number {
    fn from(value: i32) -> Self {
        Number::Int(value.into())
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::Int(value)
    }
}

impl From<u32> for Number {
    fn from(value: u32) -> Self {
        Number::Int(value.into())
    }
}

impl From<u64> for Number {
    fn from(value: u64) -> Self {
        i64::try_from(value)
            .map(Number::Int)
            .unwrap_or(Number::Float(value as f64))
    }
}

impl From<f32> for Number {
    fn from(value: f32) -> Self {
        Number::Float(value.into())
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::Float(value)
    }
}

/// A dynamically typed document value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    /// A point in time. Travels on the wire as `{"$type": "datetime", "$value": ...}`.
    Timestamp(DateTime<Utc>),
    List(Vec<Value>),
    Map(ValueMap),
}

impl Value {
    /// Returns the name of this value's runtime type, as used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Timestamp(_) => "timestamp",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Timestamp(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<Number> for Value {
    fn from(value: Number) -> Self {
        Value::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value.into())
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Number(value.into())
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Number(value.into())
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Number(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value.into())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::String(value.clone())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Timestamp(value)
    }
}

impl From<ValueMap> for Value {
    fn from(value: ValueMap) -> Self {
        Value::Map(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

impl<T: Into<Value>> FromIterator<T> for Value {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Value::List(iter.into_iter().map(Into::into).collect())
    }
}

/// Builds a [`ValueMap`] from `key => value` pairs.
///
/// Keys may be anything convertible into a `String`, values anything
/// convertible into a [`Value`].
///
/// ```ignore
/// let values = value_map! {
///     "title" => "hello",
///     "tags" => vec!["a", "b"],
/// };
/// ```
#[macro_export]
macro_rules! value_map {
    () => {
        $crate::value::ValueMap::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::value::ValueMap::new();
        $(
            map.insert(
                ::std::string::String::from($key),
                $crate::value::Value::from($value),
            );
        )+
        map
    }};
}

/// Looks up `field` and extracts a typed view of it.
///
/// Absent and null fields yield `Ok(None)`; any other value that `extract`
/// rejects is a type mismatch.
fn coerce<'a, T>(
    values: &'a ValueMap,
    field: &str,
    expected: &'static str,
    extract: impl FnOnce(&'a Value) -> Option<T>,
) -> BaasdayResult<Option<T>> {
    match values.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => extract(value)
            .map(Some)
            .ok_or_else(|| BaasdayError::TypeMismatch {
                field: field.to_string(),
                expected,
                found: value.type_name(),
            }),
    }
}

/// Type-checked read access to a field map.
///
/// Implementors only provide [`FieldAccess::values`]; every accessor is derived from it.
pub trait FieldAccess {
    /// Returns the underlying field map.
    fn values(&self) -> &ValueMap;

    /// Returns the raw value stored under `field`, without coercion.
    fn get(&self, field: &str) -> Option<&Value> {
        self.values().get(field)
    }

    /// Returns `true` if `field` is present, whatever its value.
    fn has(&self, field: &str) -> bool {
        self.values().contains_key(field)
    }

    /// Returns `true` only if `field` is present and explicitly null.
    fn is_null(&self, field: &str) -> bool {
        matches!(self.get(field), Some(Value::Null))
    }

    fn get_string(&self, field: &str) -> BaasdayResult<Option<&str>> {
        coerce(self.values(), field, "string", Value::as_str)
    }

    fn get_number(&self, field: &str) -> BaasdayResult<Option<Number>> {
        coerce(self.values(), field, "number", Value::as_number)
    }

    fn get_bool(&self, field: &str) -> BaasdayResult<Option<bool>> {
        coerce(self.values(), field, "boolean", Value::as_bool)
    }

    fn get_list(&self, field: &str) -> BaasdayResult<Option<&[Value]>> {
        coerce(self.values(), field, "list", Value::as_list)
    }

    fn get_map(&self, field: &str) -> BaasdayResult<Option<&ValueMap>> {
        coerce(self.values(), field, "map", Value::as_map)
    }

    fn get_date(&self, field: &str) -> BaasdayResult<Option<DateTime<Utc>>> {
        coerce(self.values(), field, "timestamp", Value::as_timestamp)
    }

    /// Returns the number under `field` truncated to an `i32`, or `0` when absent or null.
    fn get_int(&self, field: &str) -> BaasdayResult<i32> {
        Ok(self
            .get_number(field)?
            .map(|number| number.as_i32())
            .unwrap_or(0))
    }

    /// Returns the number under `field` truncated to an `i64`, or `0` when absent or null.
    fn get_long(&self, field: &str) -> BaasdayResult<i64> {
        Ok(self
            .get_number(field)?
            .map(|number| number.as_i64())
            .unwrap_or(0))
    }

    /// Returns the number under `field` as an `f64`, or `0.0` when absent or null.
    fn get_double(&self, field: &str) -> BaasdayResult<f64> {
        Ok(self
            .get_number(field)?
            .map(|number| number.as_f64())
            .unwrap_or(0.0))
    }
}

impl FieldAccess for ValueMap {
    fn values(&self) -> &ValueMap {
        self
    }
}
