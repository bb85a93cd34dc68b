//! Core building blocks of the baasday client.
//!
//! This crate holds everything shared by the document kinds and transports:
//!
//! - **Value model** ([`value`]) - Dynamic field values and type-checked accessors
//! - **Wire codec** ([`codec`]) - JSON encoding with tagged timestamps
//! - **Query DSL** ([`query`]) - Filter expressions, sort order, pagination and long-poll wait
//! - **Update DSL** ([`update`]) - Update operator documents and merging
//! - **List results** ([`list`]) - The page-plus-total envelope of list fetches
//! - **Documents** ([`document`]) - Identity fields and update/delete capabilities
//! - **Transport seam** ([`transport`]) - The trait carrying requests to the service
//! - **Orchestrator** ([`client`]) - Authenticated request building and response decoding
//! - **Configuration** ([`config`]) - Credentials, API root and per-user settings
//! - **Error handling** ([`error`]) - The error and result types
//!
//! # Example
//!
//! ```ignore
//! use baasday_core::{
//!     client::ApiClient,
//!     config::ClientConfig,
//!     query::{Filter, Query, SortDirection},
//!     update::Update,
//!     value_map,
//! };
//!
//! let client = ApiClient::new(ClientConfig::from_env()?, transport);
//!
//! let note = client.create_values("items/notes", &value_map! { "title" => "hello", "views" => 0 })?;
//! let top = client.fetch_all_values(
//!     "items/notes",
//!     &Query::builder()
//!         .filter(Filter::gte("views", 10))
//!         .sort("views", SortDirection::Desc)
//!         .limit(5)
//!         .build(),
//! )?;
//! client.update("items/notes/abc", &Update::increment("views", 1))?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as baasday_core;

pub mod client;
pub mod codec;
pub mod config;
pub mod document;
pub mod error;
pub mod list;
pub mod query;
pub mod transport;
pub mod update;
pub mod value;
