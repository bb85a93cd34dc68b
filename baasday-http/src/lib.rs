//! Blocking HTTP transport for the baasday client, built on `ureq`.
//!
//! ```ignore
//! use baasday_core::{client::ApiClient, config::ClientConfig};
//! use baasday_http::UreqTransport;
//!
//! let client = ApiClient::new(ClientConfig::from_env()?, UreqTransport::new());
//! ```

pub mod transport;

pub use transport::{UreqTransport, UreqTransportBuilder};
