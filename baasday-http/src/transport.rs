use std::{fmt, time::Duration};

use baasday_core::{
    error::{BaasdayError, BaasdayResult},
    transport::{ApiRequest, ApiResponse, Method, Transport, TransportBuilder},
};
use tracing::{debug, warn};
use ureq::{Agent, RequestBuilder};

/// A blocking HTTP transport backed by a `ureq` agent.
///
/// The agent keeps no idle connections: every request opens its own
/// connection and releases it once the response body is read. Non-2xx
/// statuses are returned as responses so the client can report them with the
/// request path; only failures without a response become errors.
///
/// # Example
///
/// ```ignore
/// use std::time::Duration;
/// use baasday_core::transport::TransportBuilder;
/// use baasday_http::UreqTransportBuilder;
///
/// let transport = UreqTransportBuilder::new()
///     .timeout(Duration::from_secs(40))
///     .build()?;
/// ```
#[derive(Clone)]
pub struct UreqTransport {
    agent: Agent,
    timeout: Option<Duration>,
}

impl UreqTransport {
    /// Creates a transport with no global timeout.
    pub fn new() -> Self {
        Self::with_timeout(None)
    }

    /// Creates a transport whose requests give up after `timeout`.
    ///
    /// Long-poll list fetches hold the response for up to the requested wait,
    /// so the timeout should exceed the longest wait a caller uses.
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        let config = Agent::config_builder()
            .timeout_global(timeout)
            .http_status_as_error(false)
            .max_idle_connections(0)
            .max_idle_connections_per_host(0)
            .build();

        Self {
            agent: Agent::new_with_config(config),
            timeout,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

fn with_parts<B>(
    mut builder: RequestBuilder<B>,
    query: &[(String, String)],
    headers: &[(String, String)],
) -> RequestBuilder<B> {
    for (name, value) in query {
        builder = builder.query(name, value);
    }
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

impl Transport for UreqTransport {
    fn send(&self, request: ApiRequest) -> BaasdayResult<ApiResponse> {
        let ApiRequest {
            method,
            url,
            query,
            headers,
            body,
        } = request;

        debug!(%method, url = %url, "transmitting request");

        let result = match method {
            Method::Get => with_parts(self.agent.get(&url), &query, &headers).call(),
            Method::Delete => with_parts(self.agent.delete(&url), &query, &headers).call(),
            Method::Post => {
                let builder = with_parts(self.agent.post(&url), &query, &headers);
                match &body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
            Method::Put => {
                let builder = with_parts(self.agent.put(&url), &query, &headers);
                match &body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
        };

        let mut response = result.map_err(|err| {
            warn!(%method, url = %url, error = %err, "request failed without a response");
            BaasdayError::transport(format!("{method} {url} failed"), err)
        })?;

        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|err| BaasdayError::transport(format!("reading response to {method} {url} failed"), err))?;

        debug!(%method, url = %url, status, bytes = body.len(), "response received");
        Ok(ApiResponse::new(status, body))
    }
}

/// Builder for [`UreqTransport`].
#[derive(Debug, Clone, Default)]
pub struct UreqTransportBuilder {
    timeout: Option<Duration>,
}

impl UreqTransportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a global per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl TransportBuilder for UreqTransportBuilder {
    type Transport = UreqTransport;

    fn build(self) -> BaasdayResult<UreqTransport> {
        Ok(UreqTransport::with_timeout(self.timeout))
    }
}
