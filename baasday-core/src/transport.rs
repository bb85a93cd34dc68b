//! Transport abstraction for carrying requests to the service.
//!
//! The orchestrator in [`crate::client`] builds a complete [`ApiRequest`]
//! (method, absolute URL, query pairs, headers, JSON body) and hands it to a
//! [`Transport`], which returns the raw status and body. Transports know
//! nothing about documents, authentication or the wire codec.
//!
//! # Traits
//!
//! - [`Transport`]: performs one blocking round trip
//! - [`TransportBuilder`]: factory trait for creating transport instances
//!
//! # Examples
//!
//! ```ignore
//! use baasday_core::transport::{ApiRequest, Method, Transport};
//!
//! let request = ApiRequest::new(Method::Get, "https://baasday.com/api/items/notes")
//!     .with_query("limit", "10");
//! let response = transport.send(request)?;
//! assert!(response.is_success());
//! ```

use std::{fmt::Debug, sync::Arc};

use crate::error::BaasdayResult;

/// HTTP method of a service request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully built request, ready to be transmitted.
///
/// Query pairs are kept unencoded; escaping them is the transport's job.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Returns the first header named `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns the first query parameter named `name`.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Raw status and body returned by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Carries one request to the service and returns its response.
///
/// # Contract
///
/// Implementations must return non-2xx statuses as an [`ApiResponse`], not an
/// error; the orchestrator turns them into
/// [`BaasdayError::Api`](crate::error::BaasdayError::Api) with the request path.
/// Errors are reserved for failures where no response was received
/// (connection refused, timeout, unusable URL) and should be
/// [`BaasdayError::Transport`](crate::error::BaasdayError::Transport).
///
/// # Thread Safety
///
/// Transports must be `Send + Sync` so an [`ApiClient`](crate::client::ApiClient)
/// can be shared across threads. A send blocks the calling thread until the
/// response arrives or the transport gives up; there is no retry.
pub trait Transport: Send + Sync + Debug {
    /// Performs one round trip.
    fn send(&self, request: ApiRequest) -> BaasdayResult<ApiResponse>;
}

impl<T> Transport for &T
where
    T: Transport + ?Sized,
{
    fn send(&self, request: ApiRequest) -> BaasdayResult<ApiResponse> {
        (**self).send(request)
    }
}

impl<T> Transport for &mut T
where
    T: Transport + ?Sized,
{
    fn send(&self, request: ApiRequest) -> BaasdayResult<ApiResponse> {
        (**self).send(request)
    }
}

impl<T> Transport for Box<T>
where
    T: Transport + ?Sized,
{
    fn send(&self, request: ApiRequest) -> BaasdayResult<ApiResponse> {
        (**self).send(request)
    }
}

impl<T> Transport for Arc<T>
where
    T: Transport + ?Sized,
{
    fn send(&self, request: ApiRequest) -> BaasdayResult<ApiResponse> {
        (**self).send(request)
    }
}

/// Factory trait for transports that need setup before first use.
pub trait TransportBuilder {
    type Transport: Transport;

    fn build(self) -> BaasdayResult<Self::Transport>;
}
