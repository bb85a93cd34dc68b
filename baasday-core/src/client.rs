//! The request orchestrator shared by every document kind.
//!
//! [`ApiClient`] turns a relative path, optional query and optional body into
//! an authenticated [`ApiRequest`], hands it to its [`Transport`], and decodes
//! the answer. Every operation is one blocking round trip; nothing is retried
//! or cached.
//!
//! # Example
//!
//! ```ignore
//! use baasday_core::{client::ApiClient, config::ClientConfig, query::Query, value_map};
//!
//! let client = ApiClient::new(ClientConfig::new("app-id", "api-key"), transport);
//!
//! let created = client.create_values("items/notes", &value_map! { "title" => "hi" })?;
//! let page = client.fetch_all_values("items/notes", &Query::builder().limit(10).build())?;
//! println!("{} notes in total", page.count());
//! ```

use tracing::{debug, warn};

use crate::{
    codec,
    config::ClientConfig,
    document::DocumentFactory,
    error::{BaasdayError, BaasdayResult},
    list::ListResult,
    query::{Query, QueryParameters},
    transport::{ApiRequest, ApiResponse, Method, Transport},
    value::ValueMap,
};

pub const APPLICATION_ID_HEADER: &str = "X-Baasday-Application-Id";
pub const API_KEY_HEADER: &str = "X-Baasday-Application-Api-Key";
pub const USER_AUTHENTICATION_KEY_HEADER: &str = "X-Baasday-Application-User-Authentication-Key";
pub const CONTENT_TYPE_HEADER: &str = "Content-Type";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// A client bound to one configuration and one transport.
///
/// # Type Parameters
///
/// * `T` - The transport carrying requests to the service
///
/// `ApiClient<T>` is `Send + Sync` whenever `T` is, so one client can serve
/// many threads. Changing the configuration requires `&mut self` and therefore
/// cannot race with requests in flight.
#[derive(Debug, Clone)]
pub struct ApiClient<T: Transport> {
    config: ClientConfig,
    transport: T,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(config: ClientConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sets or clears the key sent in the user authentication header.
    pub fn set_user_authentication_key(&mut self, key: Option<String>) {
        self.config.user_authentication_key = key;
    }

    pub fn set_device_id(&mut self, device_id: Option<String>) {
        self.config.device_id = device_id;
    }

    /// Joins `path` to the configured API root with exactly one separating slash.
    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.api_root.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn build_request(
        &self,
        method: Method,
        path: &str,
        params: Option<&QueryParameters>,
        body: Option<&ValueMap>,
    ) -> ApiRequest {
        let mut request = ApiRequest::new(method, self.url_for(path))
            .with_header(APPLICATION_ID_HEADER, &self.config.application_id)
            .with_header(API_KEY_HEADER, &self.config.api_key);

        if let Some(key) = &self.config.user_authentication_key {
            request = request.with_header(USER_AUTHENTICATION_KEY_HEADER, key);
        }

        if let Some(params) = params {
            request.query.extend(
                params
                    .iter()
                    .map(|(name, value)| (name.clone(), value.clone())),
            );
        }

        if let Some(body) = body {
            request = request
                .with_header(CONTENT_TYPE_HEADER, JSON_CONTENT_TYPE)
                .with_body(codec::encode(body));
        }

        request
    }

    /// Sends a request and checks its status, without decoding the body.
    fn exchange(
        &self,
        method: Method,
        path: &str,
        params: Option<&QueryParameters>,
        body: Option<&ValueMap>,
    ) -> BaasdayResult<ApiResponse> {
        let request = self.build_request(method, path, params, body);
        debug!(%method, path, "sending request");

        let response = self.transport.send(request)?;
        debug!(%method, path, status = response.status, "received response");

        if !response.is_success() {
            warn!(%method, path, status = response.status, "request rejected by service");
            return Err(BaasdayError::Api {
                path: path.to_string(),
                status: response.status,
                body: response.body,
            });
        }

        Ok(response)
    }

    /// Performs one request and decodes the response body as a field map.
    ///
    /// This is the primitive every other operation is built on.
    ///
    /// # Errors
    ///
    /// - [`BaasdayError::Transport`] if no response was received
    /// - [`BaasdayError::Api`] for a non-2xx status
    /// - [`BaasdayError::MalformedResponse`] if the body is not a JSON object
    pub fn request(
        &self,
        method: Method,
        path: &str,
        params: Option<&QueryParameters>,
        body: Option<&ValueMap>,
    ) -> BaasdayResult<ValueMap> {
        let response = self.exchange(method, path, params, body)?;
        codec::decode(&response.body)
    }

    /// POSTs `values` to `path` and returns the created representation.
    pub fn create_values(&self, path: &str, values: &ValueMap) -> BaasdayResult<ValueMap> {
        self.request(Method::Post, path, None, Some(values))
    }

    /// POSTs `values` to `path` and builds a document from the result.
    pub fn create<D>(
        &self,
        path: &str,
        values: &ValueMap,
        factory: impl DocumentFactory<D>,
    ) -> BaasdayResult<D> {
        factory.from_api_result(self.create_values(path, values)?)
    }

    pub fn fetch_values(&self, path: &str) -> BaasdayResult<ValueMap> {
        self.request(Method::Get, path, None, None)
    }

    pub fn fetch<D>(&self, path: &str, factory: impl DocumentFactory<D>) -> BaasdayResult<D> {
        factory.from_api_result(self.fetch_values(path)?)
    }

    /// Fetches one page of the documents under `path` matching `query`.
    ///
    /// # Errors
    ///
    /// Besides the errors of [`ApiClient::request`], returns
    /// [`BaasdayError::MalformedResponse`] if the response lacks a valid
    /// `_count` or `_contents`.
    pub fn fetch_all_values(&self, path: &str, query: &Query) -> BaasdayResult<ListResult<ValueMap>> {
        let params = query.to_request_parameters();
        let values = self.request(Method::Get, path, Some(&params), None)?;
        ListResult::from_values(values)
    }

    /// Fetches a page and converts every entry with `factory`.
    ///
    /// Fails as a whole if any entry fails to convert.
    pub fn fetch_all<D>(
        &self,
        path: &str,
        query: &Query,
        factory: impl DocumentFactory<D>,
    ) -> BaasdayResult<ListResult<D>> {
        self.fetch_all_values(path, query)?
            .convert_contents(|values| factory.from_api_result(values))
    }

    /// PUTs an update document to `path`, returning the post-update representation.
    pub fn update(&self, path: &str, values: &ValueMap) -> BaasdayResult<ValueMap> {
        self.request(Method::Put, path, None, Some(values))
    }

    /// DELETEs `path`. The response body is ignored.
    pub fn delete(&self, path: &str) -> BaasdayResult<()> {
        self.exchange(Method::Delete, path, None, None)
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        document::Document,
        error::ErrorKind,
        query::{Filter, SortDirection},
        value::FieldAccess,
        value_map,
    };
    use std::{collections::VecDeque, sync::Mutex};

    #[derive(Debug, Default)]
    struct MockTransport {
        requests: Mutex<Vec<ApiRequest>>,
        responses: Mutex<VecDeque<BaasdayResult<ApiResponse>>>,
    }

    impl MockTransport {
        fn respond(self, status: u16, body: &str) -> Self {
            self.responses
                .lock()
                .unwrap()
                .push_back(Ok(ApiResponse::new(status, body)));
            self
        }

        fn fail(self) -> Self {
            let cause = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
            self.responses
                .lock()
                .unwrap()
                .push_back(Err(BaasdayError::transport("timed out", cause)));
            self
        }

        fn last_request(&self) -> ApiRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    impl Transport for MockTransport {
        fn send(&self, request: ApiRequest) -> BaasdayResult<ApiResponse> {
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(ApiResponse::new(200, "{}")))
        }
    }

    fn document(values: ValueMap) -> BaasdayResult<Document> {
        Ok(Document::new(values))
    }

    fn client(transport: MockTransport) -> ApiClient<MockTransport> {
        let config = ClientConfig::builder()
            .application_id("app")
            .api_key("key")
            .api_root("http://localhost/api/")
            .build()
            .unwrap();
        ApiClient::new(config, transport)
    }

    #[test]
    fn requests_carry_application_credentials() {
        let client = client(MockTransport::default());
        client.fetch_values("items/notes/1").unwrap();

        let request = client.transport().last_request();
        assert_eq!(request.method, Method::Get);
        assert_eq!(request.url, "http://localhost/api/items/notes/1");
        assert_eq!(request.header(APPLICATION_ID_HEADER), Some("app"));
        assert_eq!(request.header(API_KEY_HEADER), Some("key"));
        assert_eq!(request.header(USER_AUTHENTICATION_KEY_HEADER), None);
        assert_eq!(request.header(CONTENT_TYPE_HEADER), None);
        assert_eq!(request.body, None);
    }

    #[test]
    fn user_key_header_follows_configuration() {
        let mut client = client(MockTransport::default());

        client.set_user_authentication_key(Some("user-key".to_string()));
        client.fetch_values("me").unwrap();
        assert_eq!(
            client.transport().last_request().header(USER_AUTHENTICATION_KEY_HEADER),
            Some("user-key")
        );

        client.set_user_authentication_key(None);
        client.fetch_values("me").unwrap();
        assert_eq!(
            client.transport().last_request().header(USER_AUTHENTICATION_KEY_HEADER),
            None
        );
    }

    #[test]
    fn create_posts_json_body() {
        let client = client(MockTransport::default().respond(201, r#"{"_id":"n1","title":"hi"}"#));

        let document = client
            .create("items/notes", &value_map! { "title" => "hi" }, document)
            .unwrap();

        let request = client.transport().last_request();
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.header(CONTENT_TYPE_HEADER), Some(JSON_CONTENT_TYPE));
        assert_eq!(request.body.as_deref(), Some(r#"{"title":"hi"}"#));
        assert_eq!(document.persisted_id().unwrap(), "n1");
    }

    #[test]
    fn fetch_all_sends_query_parameters_and_keeps_count() {
        let client = client(MockTransport::default().respond(
            200,
            r#"{"_count": 37, "_contents": [{"_id": "a"}, {"_id": "b"}]}"#,
        ));
        let query = Query::builder()
            .filter(Filter::gt("score", 10))
            .sort("name", SortDirection::Asc)
            .sort("score", SortDirection::Desc)
            .limit(2)
            .build();

        let page = client
            .fetch_all("items/scores", &query, document)
            .unwrap();

        assert_eq!(page.count(), 37);
        assert_eq!(page.len(), 2);

        let request = client.transport().last_request();
        assert_eq!(request.query_param("filter"), Some(r#"{"score":{"$gt":10}}"#));
        assert_eq!(request.query_param("order"), Some("name,-score"));
        assert_eq!(request.query_param("limit"), Some("2"));
        assert_eq!(request.query_param("skip"), None);
        assert_eq!(request.query_param("wait"), None);
    }

    #[test]
    fn fetch_all_rejects_malformed_envelopes() {
        let client = client(MockTransport::default().respond(200, r#"{"_contents": []}"#));

        let err = client
            .fetch_all_values("items/scores", &Query::new())
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::MalformedResponse);
    }

    #[test]
    fn fetch_all_fails_when_any_entry_fails_to_convert() {
        let client = client(MockTransport::default().respond(
            200,
            r#"{"_count": 2, "_contents": [{"n": 1}, {"n": "two"}]}"#,
        ));

        let err = client
            .fetch_all("items/numbers", &Query::new(), |values: ValueMap| {
                values.get_int("n")
            })
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn non_success_status_is_an_api_error() {
        let client = client(MockTransport::default().respond(404, "not found"));

        match client.fetch_values("items/notes/missing").unwrap_err() {
            BaasdayError::Api { path, status, body } => {
                assert_eq!(path, "items/notes/missing");
                assert_eq!(status, 404);
                assert_eq!(body, "not found");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn transport_failures_pass_through() {
        let client = client(MockTransport::default().fail());

        let err = client.fetch_values("items/notes/1").unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[test]
    fn update_puts_and_returns_new_representation() {
        let client = client(MockTransport::default().respond(200, r#"{"_id":"n1","views":2}"#));

        let updated = client
            .update("items/notes/n1", &value_map! { "views" => value_map! { "$inc" => 1 } })
            .unwrap();

        assert_eq!(client.transport().last_request().method, Method::Put);
        assert_eq!(updated.get_int("views").unwrap(), 2);
    }

    #[test]
    fn delete_ignores_response_body() {
        let client = client(MockTransport::default().respond(200, "not json at all"));

        client.delete("items/notes/n1").unwrap();

        assert_eq!(client.transport().last_request().method, Method::Delete);
    }

    #[test]
    fn url_join_uses_exactly_one_slash() {
        let with_slash = client(MockTransport::default());
        let mut config = with_slash.config().clone();
        config.api_root = "http://localhost/api".to_string();
        let without_slash = ApiClient::new(config, MockTransport::default());

        assert_eq!(with_slash.url_for("/me"), "http://localhost/api/me");
        assert_eq!(without_slash.url_for("me"), "http://localhost/api/me");
    }

    #[test]
    fn client_is_send_and_sync() {
        fn assert_send_sync<S: Send + Sync>() {}
        assert_send_sync::<ApiClient<MockTransport>>();
    }
}
