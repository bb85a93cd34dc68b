//! An in-process stand-in for the baasday service.
//!
//! [`MemoryTransport`] answers the same routes the service does, so an
//! [`ApiClient`](baasday_core::client::ApiClient) can run unchanged against it
//! in tests and local development:
//!
//! | route                            | methods            |
//! |----------------------------------|--------------------|
//! | `items/<collection>`             | `GET` list, `POST` |
//! | `items/<collection>/<id>`        | `GET`, `PUT`, `DELETE` |
//! | `leaderboards/<name>`            | `GET` list, `POST` |
//! | `leaderboards/<name>/<id>`       | `GET`, `PUT`, `DELETE` |
//! | `users`                          | `GET` list, `POST` |
//! | `users/<id>`                     | `GET`              |
//! | `me`                             | `GET`, `PUT`       |
//!
//! Long-poll `wait` parameters are accepted and ignored: list fetches always
//! answer immediately.
//!
//! Leaderboard lists ignore `filter` and `order`. Entries come back sorted by
//! `_score` (highest first, earlier entries first on ties) with the computed
//! `_rank` and `_order` fields attached.

use std::{cmp::Ordering, collections::HashMap, sync::Arc};

use baasday_core::{
    client::{API_KEY_HEADER, APPLICATION_ID_HEADER, USER_AUTHENTICATION_KEY_HEADER},
    codec,
    config::{ClientConfig, DEFAULT_API_ROOT},
    document::{CREATED_AT_FIELD, ID_FIELD, UPDATED_AT_FIELD},
    error::BaasdayResult,
    list::ListResult,
    query::{MAX_LIMIT, SortDirection},
    transport::{ApiRequest, ApiResponse, Method, Transport, TransportBuilder},
    value::{Value, ValueMap},
};
use chrono::{SubsecRound, Utc};
use parking_lot::RwLock;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::{
    evaluator::{Comparable, DocumentEvaluator, lookup, parse_filter},
    operators::apply_update,
};

/// Field holding a user's authentication key.
pub const AUTHENTICATION_KEY_FIELD: &str = "_authenticationKey";
/// Field holding a user's registered devices.
pub const DEVICES_FIELD: &str = "_devices";

/// Leaderboard score; entries are ranked by it, highest first.
pub const SCORE_FIELD: &str = "_score";
/// Competition rank of a leaderboard entry; tied scores share a rank.
pub const RANK_FIELD: &str = "_rank";
/// One-based position of a leaderboard entry; ties go to the earlier entry.
pub const ORDER_FIELD: &str = "_order";

const USERS: &str = "users";
const LEADERBOARDS_PREFIX: &str = "leaderboards/";
const PROTECTED_FIELDS: [&str; 6] = [
    ID_FIELD,
    CREATED_AT_FIELD,
    UPDATED_AT_FIELD,
    AUTHENTICATION_KEY_FIELD,
    RANK_FIELD,
    ORDER_FIELD,
];

/// Documents of one collection, in insertion order.
type CollectionMap = Vec<ValueMap>;
/// Collections keyed by their route prefix (`items/notes`, `leaderboards/high`, `users`).
type StoreMap = HashMap<String, CollectionMap>;

/// A route-level failure, answered as `{"error": message}`.
struct Rejection {
    status: u16,
    message: String,
}

impl Rejection {
    fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn not_found(path: &str) -> Self {
        Self::new(404, format!("{path} not found"))
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(400, message)
    }

    fn into_response(self) -> ApiResponse {
        let mut body = ValueMap::new();
        body.insert("error".to_string(), Value::String(self.message));
        ApiResponse::new(self.status, codec::encode(&body))
    }
}

type RouteResult = Result<(u16, ValueMap), Rejection>;

/// Thread-safe in-memory emulation of the service.
///
/// Clones share the same state, so a test can keep a handle for inspection
/// while a client owns another.
///
/// # Example
///
/// ```ignore
/// use baasday_core::client::ApiClient;
/// use baasday_memory::MemoryTransport;
///
/// let transport = MemoryTransport::new("app", "key");
/// let client = ApiClient::new(transport.client_config(), transport.clone());
/// ```
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    application_id: String,
    api_key: String,
    api_root: String,
    store: Arc<RwLock<StoreMap>>,
}

impl MemoryTransport {
    /// Creates an empty service accepting the given credentials at the default API root.
    pub fn new(application_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            application_id: application_id.into(),
            api_key: api_key.into(),
            api_root: DEFAULT_API_ROOT.to_string(),
            store: Arc::new(RwLock::new(StoreMap::new())),
        }
    }

    pub fn builder() -> MemoryTransportBuilder {
        MemoryTransportBuilder::default()
    }

    /// Returns a client configuration this transport accepts.
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new(&self.application_id, &self.api_key);
        config.api_root = self.api_root.clone();
        config
    }

    /// Returns a snapshot of the documents stored under `collection`
    /// (for example `items/notes` or `users`), in insertion order.
    pub fn documents(&self, collection: &str) -> Vec<ValueMap> {
        self.store
            .read()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Removes every stored document.
    pub fn clear(&self) {
        self.store.write().clear();
    }

    fn path_of(url: &str) -> &str {
        let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
        without_scheme
            .find('/')
            .map_or("/", |index| &without_scheme[index..])
    }

    /// Strips the API root's path from the request URL's path.
    fn relative_path<'u>(&self, url: &'u str) -> Option<&'u str> {
        let root = Self::path_of(&self.api_root).trim_end_matches('/');
        let path = Self::path_of(url).split('?').next().unwrap_or_default();
        path.strip_prefix(root)
            .filter(|rest| rest.is_empty() || rest.starts_with('/'))
            .map(|rest| rest.trim_matches('/'))
    }

    fn authorized(&self, request: &ApiRequest) -> bool {
        request.header(APPLICATION_ID_HEADER) == Some(self.application_id.as_str())
            && request.header(API_KEY_HEADER) == Some(self.api_key.as_str())
    }

    fn route(&self, request: &ApiRequest) -> RouteResult {
        if !self.authorized(request) {
            return Err(Rejection::new(401, "invalid application credentials"));
        }

        let path = self
            .relative_path(&request.url)
            .ok_or_else(|| Rejection::not_found(&request.url))?;
        let segments: Vec<&str> = path.split('/').filter(|segment| !segment.is_empty()).collect();

        match (request.method, segments.as_slice()) {
            (Method::Get, ["items", name]) => self.list(&format!("items/{name}"), request, false),
            (Method::Post, ["items", name]) => self.create(&format!("items/{name}"), request, ValueMap::new()),
            (method, ["items", name, id]) => {
                let collection = format!("items/{name}");
                match method {
                    Method::Get => self.get(&collection, id, false),
                    Method::Put => self.update(&collection, id, request),
                    Method::Delete => self.delete(&collection, id),
                    Method::Post => Err(Rejection::new(405, format!("POST is not allowed on {path}"))),
                }
            }
            (Method::Get, ["leaderboards", name]) => self.leaderboard(&format!("leaderboards/{name}"), request),
            (Method::Post, ["leaderboards", name]) => {
                let collection = format!("leaderboards/{name}");
                require_score(&Self::body(request)?)?;
                let created = self.create(&collection, request, ValueMap::new())?;
                Ok(self.with_rank(&collection, created))
            }
            (method, ["leaderboards", name, id]) => {
                let collection = format!("leaderboards/{name}");
                match method {
                    Method::Get => self.get(&collection, id, false),
                    Method::Put => self.update(&collection, id, request),
                    Method::Delete => self.delete(&collection, id),
                    Method::Post => Err(Rejection::new(405, format!("POST is not allowed on {path}"))),
                }
                .map(|answer| self.with_rank(&collection, answer))
            }
            (Method::Get, [USERS]) => self.list(USERS, request, true),
            (Method::Post, [USERS]) => {
                let mut generated = ValueMap::new();
                generated.insert(
                    AUTHENTICATION_KEY_FIELD.to_string(),
                    Value::String(Uuid::new_v4().simple().to_string()),
                );
                self.create(USERS, request, generated)
            }
            (Method::Get, [USERS, id]) => self.get(USERS, id, true),
            (Method::Get, ["me"]) => {
                let id = self.authenticated_user(request)?;
                self.get(USERS, &id, false)
            }
            (Method::Put, ["me"]) => {
                let id = self.authenticated_user(request)?;
                self.update(USERS, &id, request)
            }
            (_, [USERS] | [USERS, _] | ["me"]) => Err(Rejection::new(
                405,
                format!("{} is not allowed on {path}", request.method),
            )),
            _ => Err(Rejection::not_found(path)),
        }
    }

    fn body(request: &ApiRequest) -> Result<ValueMap, Rejection> {
        match request.body.as_deref() {
            Some(body) => codec::decode(body).map_err(|err| Rejection::bad_request(err.to_string())),
            None => Ok(ValueMap::new()),
        }
    }

    fn authenticated_user(&self, request: &ApiRequest) -> Result<String, Rejection> {
        let key = request
            .header(USER_AUTHENTICATION_KEY_HEADER)
            .ok_or_else(|| Rejection::new(401, "user authentication key is required"))?;

        self.store
            .read()
            .get(USERS)
            .and_then(|users| {
                users.iter().find(|user| {
                    user.get(AUTHENTICATION_KEY_FIELD).and_then(Value::as_str) == Some(key)
                })
            })
            .and_then(|user| user.get(ID_FIELD).and_then(Value::as_str).map(str::to_string))
            .ok_or_else(|| Rejection::new(401, "unknown user authentication key"))
    }

    fn create(&self, collection: &str, request: &ApiRequest, generated: ValueMap) -> RouteResult {
        let mut document = Self::body(request)?;
        for field in PROTECTED_FIELDS {
            document.remove(field);
        }

        let now = Value::Timestamp(Utc::now().trunc_subsecs(3));
        document.insert(ID_FIELD.to_string(), Value::String(Uuid::new_v4().simple().to_string()));
        document.insert(CREATED_AT_FIELD.to_string(), now.clone());
        document.insert(UPDATED_AT_FIELD.to_string(), now);
        document.extend(generated);

        trace!(collection, "creating document");
        self.store
            .write()
            .entry(collection.to_string())
            .or_default()
            .push(document.clone());

        Ok((201, document))
    }

    fn get(&self, collection: &str, id: &str, hide_keys: bool) -> RouteResult {
        let store = self.store.read();
        store
            .get(collection)
            .and_then(|documents| documents.iter().find(|document| has_id(document, id)))
            .map(|document| (200, visible(document, hide_keys)))
            .ok_or_else(|| Rejection::not_found(&format!("{collection}/{id}")))
    }

    fn update(&self, collection: &str, id: &str, request: &ApiRequest) -> RouteResult {
        let mut update = Self::body(request)?;
        let mut store = self.store.write();
        let document = store
            .get_mut(collection)
            .and_then(|documents| documents.iter_mut().find(|document| has_id(document, id)))
            .ok_or_else(|| Rejection::not_found(&format!("{collection}/{id}")))?;

        let mut updated = document.clone();
        if collection == USERS {
            if let Some(Value::List(devices)) = update.remove(DEVICES_FIELD) {
                merge_devices(&mut updated, devices);
            }
        }
        apply_update(&mut updated, &update, &PROTECTED_FIELDS).map_err(Rejection::bad_request)?;
        if collection.starts_with(LEADERBOARDS_PREFIX) {
            require_score(&updated)?;
        }
        updated.insert(
            UPDATED_AT_FIELD.to_string(),
            Value::Timestamp(Utc::now().trunc_subsecs(3)),
        );

        trace!(collection, id, "updated document");
        *document = updated.clone();
        Ok((200, updated))
    }

    fn delete(&self, collection: &str, id: &str) -> RouteResult {
        let mut store = self.store.write();
        let documents = store
            .get_mut(collection)
            .ok_or_else(|| Rejection::not_found(&format!("{collection}/{id}")))?;
        let position = documents
            .iter()
            .position(|document| has_id(document, id))
            .ok_or_else(|| Rejection::not_found(&format!("{collection}/{id}")))?;

        documents.remove(position);
        trace!(collection, id, "deleted document");
        Ok((200, ValueMap::new()))
    }

    /// Lists a leaderboard by score. Filter and order parameters are ignored.
    fn leaderboard(&self, collection: &str, request: &ApiRequest) -> RouteResult {
        let skip = parse_count(request, "skip")?.unwrap_or(0);
        let limit = parse_count(request, "limit")?
            .unwrap_or(MAX_LIMIT as usize)
            .min(MAX_LIMIT as usize);

        let store = self.store.read();
        let entries = ranked(store.get(collection).map(Vec::as_slice).unwrap_or_default());
        let count = entries.len() as u64;
        let contents = entries.into_iter().skip(skip).take(limit).collect();

        Ok((200, ListResult::new(count, contents).into_values()))
    }

    /// Replaces a leaderboard entry in an answer with its ranked form.
    fn with_rank(&self, collection: &str, (status, entry): (u16, ValueMap)) -> (u16, ValueMap) {
        let Some(id) = entry.get(ID_FIELD).and_then(Value::as_str) else {
            return (status, entry);
        };

        let store = self.store.read();
        let ranked_entry = ranked(store.get(collection).map(Vec::as_slice).unwrap_or_default())
            .into_iter()
            .find(|ranked_entry| has_id(ranked_entry, id));
        drop(store);

        match ranked_entry {
            Some(ranked_entry) => (status, ranked_entry),
            None => (status, entry),
        }
    }

    fn list(&self, collection: &str, request: &ApiRequest, hide_keys: bool) -> RouteResult {
        let filter = match request.query_param("filter") {
            Some(text) => {
                let wire = codec::decode(text).map_err(|err| Rejection::bad_request(err.to_string()))?;
                Some(parse_filter(&wire).map_err(Rejection::bad_request)?)
            }
            None => None,
        };
        let order = request.query_param("order").map(parse_order).unwrap_or_default();
        let skip = parse_count(request, "skip")?.unwrap_or(0);
        let limit = parse_count(request, "limit")?
            .unwrap_or(MAX_LIMIT as usize)
            .min(MAX_LIMIT as usize);
        if let Some(wait) = request.query_param("wait") {
            trace!(wait, "ignoring long-poll wait");
        }

        let store = self.store.read();
        let documents = store.get(collection).map(Vec::as_slice).unwrap_or_default();

        let mut matching = match &filter {
            Some(filter) => DocumentEvaluator::filter_documents(documents, filter),
            None => documents.iter().collect(),
        };

        if !order.is_empty() {
            matching.sort_by(|a, b| compare_by(&order, a, b));
        }

        let count = matching.len() as u64;
        let contents = matching
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|document| visible(document, hide_keys))
            .collect();

        Ok((200, ListResult::new(count, contents).into_values()))
    }
}

/// Rejects leaderboard entries whose `_score` is missing or not an integer.
fn require_score(entry: &ValueMap) -> Result<(), Rejection> {
    let integral = entry
        .get(SCORE_FIELD)
        .and_then(Value::as_number)
        .is_some_and(|score| score.is_integer());
    if integral {
        Ok(())
    } else {
        Err(Rejection::bad_request(format!("{SCORE_FIELD} must be an integer")))
    }
}

fn score(entry: &ValueMap) -> i64 {
    entry
        .get(SCORE_FIELD)
        .and_then(Value::as_number)
        .map_or(0, |score| score.as_i64())
}

/// Copies leaderboard entries in ranking order with `_rank` and `_order` filled in.
fn ranked(entries: &[ValueMap]) -> Vec<ValueMap> {
    let mut sorted: Vec<&ValueMap> = entries.iter().collect();
    sorted.sort_by_key(|entry| std::cmp::Reverse(score(entry)));

    let mut rank = 0;
    let mut previous = None;
    sorted
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let current = score(entry);
            if previous != Some(current) {
                rank = index + 1;
                previous = Some(current);
            }

            let mut copy = entry.clone();
            copy.insert(RANK_FIELD.to_string(), Value::from(rank as u64));
            copy.insert(ORDER_FIELD.to_string(), Value::from(index as u64 + 1));
            copy
        })
        .collect()
}

fn has_id(document: &ValueMap, id: &str) -> bool {
    document.get(ID_FIELD).and_then(Value::as_str) == Some(id)
}

/// Copies a document for a response, hiding authentication keys from other users.
fn visible(document: &ValueMap, hide_keys: bool) -> ValueMap {
    let mut copy = document.clone();
    if hide_keys {
        copy.remove(AUTHENTICATION_KEY_FIELD);
    }
    copy
}

/// Replaces devices with a matching `_id` and appends the rest.
fn merge_devices(user: &mut ValueMap, devices: Vec<Value>) {
    let slot = user
        .entry(DEVICES_FIELD.to_string())
        .or_insert_with(|| Value::List(Vec::new()));
    if !matches!(slot, Value::List(_)) {
        *slot = Value::List(Vec::new());
    }
    let Value::List(existing) = slot else {
        return;
    };

    for device in devices {
        let id = device.as_map().and_then(|map| map.get(ID_FIELD)).cloned();
        let position = id.as_ref().and_then(|id| {
            existing
                .iter()
                .position(|current| current.as_map().and_then(|map| map.get(ID_FIELD)) == Some(id))
        });
        match position {
            Some(index) => existing[index] = device,
            None => existing.push(device),
        }
    }
}

fn parse_order(text: &str) -> Vec<(String, SortDirection)> {
    text.split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(|key| match key.strip_prefix('-') {
            Some(field) => (field.to_string(), SortDirection::Desc),
            None => (key.to_string(), SortDirection::Asc),
        })
        .collect()
}

fn parse_count(request: &ApiRequest, name: &str) -> Result<Option<usize>, Rejection> {
    request
        .query_param(name)
        .map(|text| {
            text.parse::<usize>()
                .map_err(|_| Rejection::bad_request(format!("{name} must be a non-negative integer")))
        })
        .transpose()
}

fn compare_by(order: &[(String, SortDirection)], a: &ValueMap, b: &ValueMap) -> Ordering {
    order
        .iter()
        .map(|(field, direction)| {
            let left = Comparable::from(lookup(a, field));
            let right = Comparable::from(lookup(b, field));
            match direction {
                SortDirection::Asc => left.sort_cmp(&right),
                SortDirection::Desc => right.sort_cmp(&left),
            }
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

impl Transport for MemoryTransport {
    fn send(&self, request: ApiRequest) -> BaasdayResult<ApiResponse> {
        debug!(method = %request.method, url = %request.url, "handling request in memory");

        let response = match self.route(&request) {
            Ok((status, body)) => ApiResponse::new(status, codec::encode(&body)),
            Err(rejection) => rejection.into_response(),
        };

        trace!(status = response.status, "answered request");
        Ok(response)
    }
}

/// Builder for [`MemoryTransport`].
#[derive(Debug, Clone, Default)]
pub struct MemoryTransportBuilder {
    application_id: Option<String>,
    api_key: Option<String>,
    api_root: Option<String>,
}

impl MemoryTransportBuilder {
    pub fn application_id(mut self, application_id: impl Into<String>) -> Self {
        self.application_id = Some(application_id.into());
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the API root whose path prefix requests are routed under.
    pub fn api_root(mut self, api_root: impl Into<String>) -> Self {
        self.api_root = Some(api_root.into());
        self
    }

    /// Builds a transport matching the credentials of `config`.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::default()
            .application_id(&config.application_id)
            .api_key(&config.api_key)
            .api_root(&config.api_root)
    }
}

impl TransportBuilder for MemoryTransportBuilder {
    type Transport = MemoryTransport;

    fn build(self) -> BaasdayResult<MemoryTransport> {
        let mut transport = MemoryTransport::new(
            self.application_id.unwrap_or_default(),
            self.api_key.unwrap_or_default(),
        );
        if let Some(api_root) = self.api_root {
            transport.api_root = api_root;
        }
        Ok(transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use baasday_core::value::FieldAccess;

    fn request(transport: &MemoryTransport, method: Method, path: &str) -> ApiRequest {
        ApiRequest::new(method, format!("https://baasday.com/api/{path}"))
            .with_header(APPLICATION_ID_HEADER, &transport.application_id)
            .with_header(API_KEY_HEADER, &transport.api_key)
    }

    fn send(transport: &MemoryTransport, request: ApiRequest) -> (u16, ValueMap) {
        let response = transport.send(request).unwrap();
        (response.status, codec::decode(&response.body).unwrap())
    }

    #[test]
    fn wrong_credentials_are_unauthorized() {
        let transport = MemoryTransport::new("app", "key");
        let request = ApiRequest::new(Method::Get, "https://baasday.com/api/items/notes")
            .with_header(APPLICATION_ID_HEADER, "app")
            .with_header(API_KEY_HEADER, "wrong");

        let (status, body) = send(&transport, request);

        assert_eq!(status, 401);
        assert!(body.has("error"));
    }

    #[test]
    fn relative_paths_follow_the_api_root() {
        let transport = MemoryTransport::builder()
            .api_root("http://localhost:9000/v1")
            .build()
            .unwrap();

        assert_eq!(transport.relative_path("http://localhost:9000/v1/items/a?x=1"), Some("items/a"));
        assert_eq!(transport.relative_path("http://localhost:9000/other/items/a"), None);
        assert_eq!(transport.relative_path("http://localhost:9000/v1x/items/a"), None);
        assert_eq!(transport.relative_path("http://localhost:9000/v1"), Some(""));
    }

    #[test]
    fn create_assigns_identity_and_strips_reserved_fields() {
        let transport = MemoryTransport::new("app", "key");
        let body = r#"{"_id":"forged","title":"hi"}"#;

        let (status, created) = send(
            &transport,
            request(&transport, Method::Post, "items/notes").with_body(body),
        );

        assert_eq!(status, 201);
        assert_ne!(created.get_string("_id").unwrap(), Some("forged"));
        assert!(created.get_date("_createdAt").unwrap().is_some());
        assert_eq!(created.get_date("_createdAt").unwrap(), created.get_date("_updatedAt").unwrap());
        assert_eq!(transport.documents("items/notes").len(), 1);
    }

    #[test]
    fn unknown_documents_and_routes_are_not_found() {
        let transport = MemoryTransport::new("app", "key");

        assert_eq!(send(&transport, request(&transport, Method::Get, "items/notes/nope")).0, 404);
        assert_eq!(send(&transport, request(&transport, Method::Delete, "items/notes/nope")).0, 404);
        assert_eq!(send(&transport, request(&transport, Method::Get, "unknown")).0, 404);
        assert_eq!(send(&transport, request(&transport, Method::Put, "users/x")).0, 405);
    }

    #[test]
    fn list_applies_order_skip_and_limit_but_counts_all_matches() {
        let transport = MemoryTransport::new("app", "key");
        for (name, score) in [("a", 3), ("b", 1), ("c", 2), ("d", 2)] {
            let body = format!(r#"{{"name":"{name}","score":{score}}}"#);
            send(&transport, request(&transport, Method::Post, "items/scores").with_body(body));
        }

        let (status, page) = send(
            &transport,
            request(&transport, Method::Get, "items/scores")
                .with_query("order", "-score,name")
                .with_query("skip", "1")
                .with_query("limit", "2")
                .with_query("wait", "30"),
        );
        let page = ListResult::from_values(page).unwrap();
        let names: Vec<&str> = page
            .iter()
            .map(|document| document.get_string("name").unwrap().unwrap())
            .collect();

        assert_eq!(status, 200);
        assert_eq!(page.count(), 4);
        assert_eq!(names, vec!["c", "d"]);
    }

    #[test]
    fn bad_list_parameters_are_rejected() {
        let transport = MemoryTransport::new("app", "key");

        let bad_limit = request(&transport, Method::Get, "items/x").with_query("limit", "-1");
        let bad_filter =
            request(&transport, Method::Get, "items/x").with_query("filter", r#"{"$where":"1"}"#);

        assert_eq!(send(&transport, bad_limit).0, 400);
        assert_eq!(send(&transport, bad_filter).0, 400);
    }

    #[test]
    fn user_keys_are_hidden_from_other_users() {
        let transport = MemoryTransport::new("app", "key");
        let (_, user) = send(
            &transport,
            request(&transport, Method::Post, "users").with_body(r#"{"name":"alice"}"#),
        );
        let id = user.get_string("_id").unwrap().unwrap().to_string();
        let key = user.get_string("_authenticationKey").unwrap().unwrap().to_string();

        let (_, public) = send(&transport, request(&transport, Method::Get, &format!("users/{id}")));
        assert!(!public.has("_authenticationKey"));

        let (status, me) = send(
            &transport,
            request(&transport, Method::Get, "me").with_header(USER_AUTHENTICATION_KEY_HEADER, &key),
        );
        assert_eq!(status, 200);
        assert_eq!(me.get_string("_authenticationKey").unwrap(), Some(key.as_str()));

        assert_eq!(send(&transport, request(&transport, Method::Get, "me")).0, 401);
    }

    #[test]
    fn leaderboards_rank_by_score() {
        let transport = MemoryTransport::new("app", "key");
        for (name, score) in [("a", 10), ("b", 30), ("c", 10), ("d", 20)] {
            let body = format!(r#"{{"name":"{name}","_score":{score}}}"#);
            let (status, _) = send(&transport, request(&transport, Method::Post, "leaderboards/weekly").with_body(body));
            assert_eq!(status, 201);
        }

        let (_, page) = send(
            &transport,
            request(&transport, Method::Get, "leaderboards/weekly").with_query("order", "name"),
        );
        let page = ListResult::from_values(page).unwrap();
        let table: Vec<(String, i32, i32)> = page
            .iter()
            .map(|entry| {
                (
                    entry.get_string("name").unwrap().unwrap().to_string(),
                    entry.get_int("_rank").unwrap(),
                    entry.get_int("_order").unwrap(),
                )
            })
            .collect();

        assert_eq!(
            table,
            vec![
                ("b".to_string(), 1, 1),
                ("d".to_string(), 2, 2),
                ("a".to_string(), 3, 3),
                ("c".to_string(), 3, 4),
            ]
        );
        assert!(transport.documents("leaderboards/weekly").iter().all(|entry| !entry.has("_rank")));
    }

    #[test]
    fn leaderboard_entries_need_an_integer_score() {
        let transport = MemoryTransport::new("app", "key");

        let (status, _) = send(
            &transport,
            request(&transport, Method::Post, "leaderboards/weekly").with_body(r#"{"_score":1.5}"#),
        );

        assert_eq!(status, 400);
    }

    #[test]
    fn leaderboard_updates_keep_an_integer_score() {
        let transport = MemoryTransport::new("app", "key");
        let (_, entry) = send(
            &transport,
            request(&transport, Method::Post, "leaderboards/weekly").with_body(r#"{"_score":7}"#),
        );
        let path = format!("leaderboards/weekly/{}", entry.get_string("_id").unwrap().unwrap());

        for update in [r#"{"_score":"high"}"#, r#"{"_score":{"$unset":true}}"#, r#"{"_score":{"$inc":0.5}}"#] {
            let (status, _) = send(&transport, request(&transport, Method::Put, &path).with_body(update));
            assert_eq!(status, 400, "{update}");
        }
        assert_eq!(transport.documents("leaderboards/weekly")[0].get_long("_score").unwrap(), 7);

        let (status, updated) = send(
            &transport,
            request(&transport, Method::Put, &path).with_body(r#"{"_score":{"$inc":3}}"#),
        );
        assert_eq!(status, 200);
        assert_eq!(updated.get_long("_score").unwrap(), 10);
    }

    #[test]
    fn builder_follows_client_config() {
        let config = ClientConfig::builder()
            .application_id("app")
            .api_key("key")
            .api_root("http://localhost:9000/v1/")
            .build()
            .unwrap();

        let transport = MemoryTransportBuilder::from_config(&config).build().unwrap();

        assert_eq!(transport.client_config(), config);
        assert_eq!(transport.relative_path("http://localhost:9000/v1/items/a"), Some("items/a"));
    }

    #[test]
    fn devices_merge_by_id() {
        let mut user = ValueMap::new();
        let device = |id: &str, token: &str| {
            let mut map = ValueMap::new();
            map.insert("_id".to_string(), Value::from(id));
            map.insert("token".to_string(), Value::from(token));
            Value::Map(map)
        };

        merge_devices(&mut user, vec![device("a", "1"), device("b", "1")]);
        merge_devices(&mut user, vec![device("a", "2")]);

        let devices = user.get_list("_devices").unwrap().unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0], device("a", "2"));
    }
}
