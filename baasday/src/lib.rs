//! Client library for the baasday document backend.
//!
//! This crate is the primary entry point. It re-exports the core types from
//! `baasday-core`, the HTTP transport from `baasday-http`, and provides the
//! document kinds the service knows about.
//!
//! # Features
//!
//! - **Schemaless documents** - Dynamic values with type-checked accessors
//! - **Server-side queries** - Composable filters, multi-key order and pagination
//! - **Atomic updates** - Increment, push, pull and unset operators
//! - **Pluggable transports** - Blocking HTTP over `ureq`, or in memory for tests (`memory` feature)
//!
//! # Quick Start
//!
//! ```ignore
//! use baasday::prelude::*;
//!
//! fn main() -> BaasdayResult<()> {
//!     // Reads BAASDAY_APPLICATION_ID, BAASDAY_API_KEY and friends
//!     let client = baasday::client_from_env()?;
//!
//!     let mut task = Item::create(&client, "tasks", &value_map! { "title" => "write docs", "done" => false })?;
//!     task.update(&client, &Update::set("done", true))?;
//!
//!     let open = Item::fetch_all(
//!         &client,
//!         "tasks",
//!         &Query::builder()
//!             .filter(Filter::eq("done", false))
//!             .sort("title", SortDirection::Asc)
//!             .limit(20)
//!             .build(),
//!     )?;
//!     println!("{} of {} open tasks", open.len(), open.count());
//!
//!     task.delete(&client)?;
//!     Ok(())
//! }
//! ```
//!
//! # Users and devices
//!
//! ```ignore
//! use baasday::prelude::*;
//!
//! let mut client = baasday::client_from_env()?;
//! let mut me = AuthenticatedUser::create(&client, &value_map! { "name" => "alice" })?;
//! client.set_user_authentication_key(me.authentication_key()?.map(str::to_string));
//! client.set_device_id(Some(generate_device_id()));
//!
//! let mut device = me.current_device(client.config())?;
//! device.set_registration_id("push-token");
//! me.update_device(&client, &device)?;
//! ```
//!
//! # Leaderboards
//!
//! ```ignore
//! use baasday::prelude::*;
//!
//! let client = baasday::client_from_env()?;
//! LeaderboardEntry::create_with_score(&client, "weekly", 1200, &value_map! { "player" => "alice" })?;
//!
//! for entry in &LeaderboardEntry::fetch_all(&client, "weekly", &Query::builder().limit(10).build())? {
//!     println!("#{} {:?} {}", entry.rank()?, entry.get_string("player")?, entry.score()?);
//! }
//! ```
//!
//! # Transports
//!
//! - [`http`] - Blocking HTTP over `ureq`, used by [`client()`] and [`client_from_env`]
//! - [`memory`] - In-process emulation of the service (requires `memory` feature)

#[allow(unused_extern_crates)]
extern crate self as baasday;

pub mod device;
pub mod item;
pub mod leaderboard;
pub mod prelude;
pub mod user;

pub use baasday_core::{client, codec, config, document, error, list, query, transport, update, value, value_map};

/// The blocking HTTP transport.
pub mod http {
    pub use baasday_http::*;
}

/// The in-memory service emulation.
#[cfg(feature = "memory")]
pub mod memory {
    pub use baasday_memory::*;
}

use baasday_core::{client::ApiClient, config::ClientConfig, error::BaasdayResult};
use baasday_http::UreqTransport;

/// Creates a client talking HTTP to the service described by `config`.
pub fn client(config: ClientConfig) -> ApiClient<UreqTransport> {
    ApiClient::new(config, UreqTransport::new())
}

/// Creates an HTTP client configured from the `BAASDAY_*` environment variables.
///
/// # Errors
///
/// Returns [`BaasdayError::Configuration`](error::BaasdayError::Configuration)
/// if the application id or API key is not set.
pub fn client_from_env() -> BaasdayResult<ApiClient<UreqTransport>> {
    Ok(client(ClientConfig::from_env()?))
}
