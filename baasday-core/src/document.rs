//! Documents and the capabilities shared by every document kind.
//!
//! A [`Document`] is a field map plus the reserved identity fields the service
//! maintains (`_id`, `_createdAt`, `_updatedAt`). A document without `_id` is
//! local: it has not been created on the service yet, and updating or deleting
//! it fails with [`BaasdayError::NotPersisted`].
//!
//! Concrete document kinds wrap a [`Document`] and opt into capabilities:
//!
//! - [`Identifiable`]: access to the document, id and timestamps
//! - [`Resource`]: a service path addressing the document
//! - [`Updatable`]: PUT an update and adopt the server's representation
//! - [`Deletable`]: DELETE the document
//!
//! # Example
//!
//! ```ignore
//! use baasday_core::document::{Document, Identifiable, Resource, Updatable};
//!
//! #[derive(Debug)]
//! struct Note(Document);
//!
//! impl Identifiable for Note {
//!     fn document(&self) -> &Document {
//!         &self.0
//!     }
//! }
//!
//! impl Resource for Note {
//!     fn document_mut(&mut self) -> &mut Document {
//!         &mut self.0
//!     }
//!
//!     fn resource_path(&self) -> BaasdayResult<String> {
//!         self.0.path_under("items/notes")
//!     }
//! }
//!
//! impl Updatable for Note {}
//! ```

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::{
    client::ApiClient,
    error::{BaasdayError, BaasdayResult},
    transport::Transport,
    value::{FieldAccess, Value, ValueMap},
};

pub const ID_FIELD: &str = "_id";
pub const CREATED_AT_FIELD: &str = "_createdAt";
pub const UPDATED_AT_FIELD: &str = "_updatedAt";

/// A schemaless record with service-maintained identity fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    values: ValueMap,
}

impl Document {
    pub fn new(values: ValueMap) -> Self {
        Self { values }
    }

    /// Creates a local document with no fields.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the `_id` assigned by the service, if any.
    pub fn id(&self) -> BaasdayResult<Option<&str>> {
        self.get_string(ID_FIELD)
    }

    pub fn created_at(&self) -> BaasdayResult<Option<DateTime<Utc>>> {
        self.get_date(CREATED_AT_FIELD)
    }

    pub fn updated_at(&self) -> BaasdayResult<Option<DateTime<Utc>>> {
        self.get_date(UPDATED_AT_FIELD)
    }

    /// Returns `true` once the document carries a textual `_id`.
    pub fn is_persisted(&self) -> bool {
        matches!(self.values.get(ID_FIELD), Some(Value::String(_)))
    }

    /// Returns the `_id`, failing if the document was never created.
    ///
    /// # Errors
    ///
    /// Returns [`BaasdayError::NotPersisted`] when `_id` is absent or null, and
    /// [`BaasdayError::TypeMismatch`] when it is not text.
    pub fn persisted_id(&self) -> BaasdayResult<&str> {
        self.id()?.ok_or(BaasdayError::NotPersisted)
    }

    /// Returns `<prefix>/<_id>`, the path of this document below `prefix`.
    pub fn path_under(&self, prefix: &str) -> BaasdayResult<String> {
        Ok(format!("{}/{}", prefix.trim_end_matches('/'), self.persisted_id()?))
    }

    /// Sets a field locally. Nothing is sent to the service.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.values.insert(field.into(), value.into());
        self
    }

    /// Removes a field locally, returning its previous value.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.values.remove(field)
    }

    /// Replaces the whole field map, as after an update round trip.
    pub fn replace_values(&mut self, values: ValueMap) {
        self.values = values;
    }

    pub fn into_values(self) -> ValueMap {
        self.values
    }
}

impl FieldAccess for Document {
    fn values(&self) -> &ValueMap {
        &self.values
    }
}

impl From<ValueMap> for Document {
    fn from(values: ValueMap) -> Self {
        Self::new(values)
    }
}

impl From<Document> for Value {
    fn from(document: Document) -> Self {
        Value::Map(document.values)
    }
}

impl From<Document> for ValueMap {
    fn from(document: Document) -> Self {
        document.values
    }
}

/// Access to a document's identity fields.
pub trait Identifiable {
    fn document(&self) -> &Document;

    fn id(&self) -> BaasdayResult<Option<&str>> {
        self.document().id()
    }

    fn created_at(&self) -> BaasdayResult<Option<DateTime<Utc>>> {
        self.document().created_at()
    }

    fn updated_at(&self) -> BaasdayResult<Option<DateTime<Utc>>> {
        self.document().updated_at()
    }

    fn is_persisted(&self) -> bool {
        self.document().is_persisted()
    }
}

impl Identifiable for Document {
    fn document(&self) -> &Document {
        self
    }
}

/// A document addressable by a service path.
pub trait Resource: Identifiable {
    fn document_mut(&mut self) -> &mut Document;

    /// Returns the path of this document relative to the API root.
    ///
    /// # Errors
    ///
    /// Returns [`BaasdayError::NotPersisted`] if the path needs an `_id` the
    /// document does not have yet.
    fn resource_path(&self) -> BaasdayResult<String>;
}

/// A resource that can be updated in place.
pub trait Updatable: Resource {
    /// Sends `values` as an update document and replaces this document's fields
    /// with the representation the service returns.
    ///
    /// On failure the local fields are left untouched.
    fn update<T: Transport>(&mut self, client: &ApiClient<T>, values: &ValueMap) -> BaasdayResult<()> {
        let path = self.resource_path()?;
        let updated = client.update(&path, values)?;
        debug!(path = %path, "adopting updated representation");
        self.document_mut().replace_values(updated);
        Ok(())
    }
}

/// A resource that can be deleted.
pub trait Deletable: Resource {
    fn delete<T: Transport>(&self, client: &ApiClient<T>) -> BaasdayResult<()> {
        client.delete(&self.resource_path()?)
    }
}

/// Converts a decoded service result into a document kind.
///
/// Implemented for every `Fn(ValueMap) -> BaasdayResult<D>`, so constructors
/// and closures can be passed wherever a factory is expected.
pub trait DocumentFactory<D> {
    fn from_api_result(&self, values: ValueMap) -> BaasdayResult<D>;
}

impl<D, F> DocumentFactory<D> for F
where
    F: Fn(ValueMap) -> BaasdayResult<D>,
{
    fn from_api_result(&self, values: ValueMap) -> BaasdayResult<D> {
        self(values)
    }
}
