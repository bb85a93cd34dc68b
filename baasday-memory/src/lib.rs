//! In-memory stand-in for the baasday service.
//!
//! This crate provides a thread-safe [`Transport`](baasday_core::transport::Transport)
//! that answers requests from process memory instead of the network. It is
//! meant for tests and local development, never for use alongside the real
//! service.
//!
//! # Features
//!
//! - **Route emulation** - Items, leaderboards, users and the `me` resource
//! - **Credential checks** - Requests with the wrong application id or API key get `401`
//! - **Full query support** - Filters, multi-key order, skip and limit (capped at 100)
//! - **Leaderboards** - Entries ranked by `_score` with shared ranks for ties
//! - **Update operators** - `$inc`, `$push`, `$pushUnique`, `$pull` and `$unset`
//!
//! # Quick Start
//!
//! ```ignore
//! use baasday_core::{client::ApiClient, value_map};
//! use baasday_memory::MemoryTransport;
//!
//! let transport = MemoryTransport::new("app", "key");
//! let client = ApiClient::new(transport.client_config(), transport.clone());
//!
//! client.create_values("items/notes", &value_map! { "title" => "hello" })?;
//! assert_eq!(transport.documents("items/notes").len(), 1);
//! ```

#[allow(unused_extern_crates)]
extern crate self as baasday_memory;

pub mod evaluator;
pub mod operators;
pub mod transport;

pub use transport::{MemoryTransport, MemoryTransportBuilder};
