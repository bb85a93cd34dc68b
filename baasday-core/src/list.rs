//! The page-plus-total envelope returned by list fetches.
//!
//! A [`ListResult`] pairs the number of documents matching a query on the
//! server with the page actually returned. The two are independent: a query
//! matching 37 documents with `limit(2)` yields `count == 37` and two contents.

use crate::{
    error::{BaasdayError, BaasdayResult},
    value::{Number, Value, ValueMap},
};

/// Wire field holding the server-side total.
pub const COUNT_FIELD: &str = "_count";
/// Wire field holding the page of documents.
pub const CONTENTS_FIELD: &str = "_contents";

/// A single page of list results plus the server-reported total.
///
/// # Type Parameters
///
/// * `T` - The type of items contained in this page
///
/// # Example
///
/// ```ignore
/// use baasday_core::list::ListResult;
///
/// let page = ListResult::new(100, vec!["a", "b"]);
///
/// assert_eq!(page.count(), 100);
/// assert_eq!(page.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ListResult<T> {
    count: u64,
    contents: Vec<T>,
}

impl<T> ListResult<T> {
    /// Creates a list result. `count` is taken as given, never derived from `contents`.
    pub fn new(count: u64, contents: Vec<T>) -> Self {
        Self { count, contents }
    }

    /// Total number of documents matching the query server side.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// The documents of this page, in server order.
    pub fn contents(&self) -> &[T] {
        &self.contents
    }

    /// Consumes the result, returning the page contents.
    pub fn into_contents(self) -> Vec<T> {
        self.contents
    }

    /// Number of documents in this page.
    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.contents.iter()
    }

    /// Converts every element with `factory`, keeping `count`.
    ///
    /// Conversion is all or nothing: the first factory error is returned and no
    /// partially converted result is produced.
    pub fn convert_contents<U, F>(self, factory: F) -> BaasdayResult<ListResult<U>>
    where
        F: FnMut(T) -> BaasdayResult<U>,
    {
        Ok(ListResult {
            count: self.count,
            contents: self
                .contents
                .into_iter()
                .map(factory)
                .collect::<BaasdayResult<Vec<U>>>()?,
        })
    }
}

impl ListResult<ValueMap> {
    /// Reads a decoded list response of the form `{"_count": n, "_contents": [...]}`.
    ///
    /// # Errors
    ///
    /// Returns [`BaasdayError::MalformedResponse`] if `_count` is missing or not a
    /// non-negative integer, or if `_contents` is missing, not a list, or holds
    /// anything other than objects.
    pub fn from_values(mut values: ValueMap) -> BaasdayResult<Self> {
        let count = match values.get(COUNT_FIELD) {
            Some(Value::Number(Number::Int(count))) if *count >= 0 => *count as u64,
            Some(other) => {
                return Err(BaasdayError::MalformedResponse(format!(
                    "{COUNT_FIELD} must be a non-negative integer, found {}",
                    other.type_name()
                )));
            }
            None => {
                return Err(BaasdayError::MalformedResponse(format!(
                    "list response has no {COUNT_FIELD}"
                )));
            }
        };

        let contents = match values.remove(CONTENTS_FIELD) {
            Some(Value::List(items)) => items
                .into_iter()
                .map(|item| match item {
                    Value::Map(map) => Ok(map),
                    other => Err(BaasdayError::MalformedResponse(format!(
                        "{CONTENTS_FIELD} entries must be objects, found {}",
                        other.type_name()
                    ))),
                })
                .collect::<BaasdayResult<Vec<_>>>()?,
            Some(other) => {
                return Err(BaasdayError::MalformedResponse(format!(
                    "{CONTENTS_FIELD} must be a list, found {}",
                    other.type_name()
                )));
            }
            None => {
                return Err(BaasdayError::MalformedResponse(format!(
                    "list response has no {CONTENTS_FIELD}"
                )));
            }
        };

        Ok(Self { count, contents })
    }

    /// Builds the wire form of this list response.
    pub fn into_values(self) -> ValueMap {
        let mut values = ValueMap::new();
        values.insert(COUNT_FIELD.to_string(), Value::from(self.count));
        values.insert(
            CONTENTS_FIELD.to_string(),
            Value::List(self.contents.into_iter().map(Value::Map).collect()),
        );
        values
    }
}

impl<T> Default for ListResult<T> {
    fn default() -> Self {
        Self { count: 0, contents: Vec::new() }
    }
}

impl<T> IntoIterator for ListResult<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.contents.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a ListResult<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.contents.iter()
    }
}
