//! General purpose documents stored in named collections.
//!
//! Collections are created by the service on first use, so any name can be
//! passed to [`Item::create`]. Listing a collection that does not exist yet
//! yields an empty result rather than an error.
//!
//! # Example
//!
//! ```ignore
//! use baasday::prelude::*;
//!
//! let client = baasday::client_from_env()?;
//!
//! let mut note = Item::create(&client, "notes", &value_map! { "title" => "draft" })?;
//! note.update(&client, &Update::set("title", "final"))?;
//!
//! let page = Item::fetch_all(&client, "notes", &Query::builder().limit(10).build())?;
//! for note in &page {
//!     println!("{:?}", note.get_string("title")?);
//! }
//! ```

use baasday_core::{
    client::ApiClient,
    document::{Deletable, Document, Identifiable, Resource, Updatable},
    error::BaasdayResult,
    list::ListResult,
    query::Query,
    transport::Transport,
    value::{FieldAccess, ValueMap},
};

/// Path prefix of every collection.
pub const ITEMS_PATH: &str = "items";

/// A document in a named collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    collection_name: String,
    document: Document,
}

impl Item {
    /// Wraps `values` as an item of `collection_name` without contacting the service.
    pub fn new(collection_name: impl Into<String>, values: ValueMap) -> Self {
        Self {
            collection_name: collection_name.into(),
            document: Document::new(values),
        }
    }

    /// Adds a new item to `collection_name` and returns it as stored.
    pub fn create<T: Transport>(
        client: &ApiClient<T>,
        collection_name: &str,
        values: &ValueMap,
    ) -> BaasdayResult<Self> {
        client.create(&collection_path(collection_name), values, factory(collection_name))
    }

    /// Fetches the item with `id` from `collection_name`.
    ///
    /// # Errors
    ///
    /// Returns [`BaasdayError::Api`](baasday_core::error::BaasdayError::Api)
    /// with status `404` when no such item exists.
    pub fn fetch<T: Transport>(client: &ApiClient<T>, collection_name: &str, id: &str) -> BaasdayResult<Self> {
        let path = format!("{}/{id}", collection_path(collection_name));
        client.fetch(&path, factory(collection_name))
    }

    /// Fetches one page of `collection_name` matching `query`.
    ///
    /// At most 100 items are returned per page whatever limit is requested.
    pub fn fetch_all<T: Transport>(
        client: &ApiClient<T>,
        collection_name: &str,
        query: &Query,
    ) -> BaasdayResult<ListResult<Self>> {
        client.fetch_all(&collection_path(collection_name), query, factory(collection_name))
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    pub fn into_document(self) -> Document {
        self.document
    }
}

fn collection_path(collection_name: &str) -> String {
    format!("{ITEMS_PATH}/{collection_name}")
}

fn factory(collection_name: &str) -> impl Fn(ValueMap) -> BaasdayResult<Item> + '_ {
    move |values| Ok(Item::new(collection_name, values))
}

impl FieldAccess for Item {
    fn values(&self) -> &ValueMap {
        self.document.values()
    }
}

impl Identifiable for Item {
    fn document(&self) -> &Document {
        &self.document
    }
}

impl Resource for Item {
    fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    fn resource_path(&self) -> BaasdayResult<String> {
        self.document.path_under(&collection_path(&self.collection_name))
    }
}

impl Updatable for Item {}

impl Deletable for Item {}
