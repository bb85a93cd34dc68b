//! Application users.
//!
//! There are two views of a user. [`User`] is the public, read-only view any
//! client can fetch by id. [`AuthenticatedUser`] is the signed-in user behind
//! the `me` resource: it carries the authentication key, its devices, and can
//! be updated.
//!
//! A user is created once with [`AuthenticatedUser::create`]. The application
//! stores the returned authentication key and configures it on later runs,
//! after which [`AuthenticatedUser::fetch`] returns the same user.
//!
//! # Example
//!
//! ```ignore
//! use baasday::prelude::*;
//!
//! let mut client = baasday::client_from_env()?;
//!
//! let user = AuthenticatedUser::create(&client, &value_map! { "name" => "alice" })?;
//! client.set_user_authentication_key(user.authentication_key()?.map(str::to_string));
//!
//! let mut me = AuthenticatedUser::fetch(&client)?;
//! me.update(&client, &Update::increment("logins", 1))?;
//! ```

use baasday_core::{
    client::ApiClient,
    config::ClientConfig,
    document::{Document, ID_FIELD, Identifiable, Resource, Updatable},
    error::BaasdayResult,
    list::ListResult,
    query::Query,
    transport::Transport,
    value::{FieldAccess, Value, ValueMap},
    value_map,
};
use tracing::debug;

use crate::device::Device;

pub const USERS_PATH: &str = "users";
pub const ME_PATH: &str = "me";

pub const AUTHENTICATION_KEY_FIELD: &str = "_authenticationKey";
pub const DEVICES_FIELD: &str = "_devices";

/// The public view of a user.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    document: Document,
}

impl User {
    pub fn new(values: ValueMap) -> Self {
        Self {
            document: Document::new(values),
        }
    }

    /// Fetches the user with `id`.
    pub fn fetch<T: Transport>(client: &ApiClient<T>, id: &str) -> BaasdayResult<Self> {
        client.fetch(&format!("{USERS_PATH}/{id}"), user)
    }

    /// Fetches one page of users matching `query`. Any wait is ignored by the service.
    pub fn fetch_all<T: Transport>(client: &ApiClient<T>, query: &Query) -> BaasdayResult<ListResult<Self>> {
        client.fetch_all(USERS_PATH, query, user)
    }

    pub fn into_document(self) -> Document {
        self.document
    }
}

fn user(values: ValueMap) -> BaasdayResult<User> {
    Ok(User::new(values))
}

impl FieldAccess for User {
    fn values(&self) -> &ValueMap {
        self.document.values()
    }
}

impl Identifiable for User {
    fn document(&self) -> &Document {
        &self.document
    }
}

/// The signed-in user, addressed through the `me` resource.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedUser {
    document: Document,
}

impl AuthenticatedUser {
    pub fn new(values: ValueMap) -> Self {
        Self {
            document: Document::new(values),
        }
    }

    /// Creates a new user. The result carries the user's authentication key.
    pub fn create<T: Transport>(client: &ApiClient<T>, values: &ValueMap) -> BaasdayResult<Self> {
        client.create(USERS_PATH, values, authenticated_user)
    }

    /// Fetches the user whose authentication key the client is configured with.
    pub fn fetch<T: Transport>(client: &ApiClient<T>) -> BaasdayResult<Self> {
        client.fetch(ME_PATH, authenticated_user)
    }

    /// Returns the key that authenticates this user on later runs.
    pub fn authentication_key(&self) -> BaasdayResult<Option<&str>> {
        self.get_string(AUTHENTICATION_KEY_FIELD)
    }

    /// Returns the record of the device configured in `config`.
    ///
    /// When the user has no record for that device yet, a fresh record
    /// carrying only the id is returned.
    ///
    /// # Errors
    ///
    /// Returns [`BaasdayError::Configuration`](baasday_core::error::BaasdayError::Configuration)
    /// if `config` has no device id, and a type mismatch if `_devices` is not a list.
    pub fn current_device(&self, config: &ClientConfig) -> BaasdayResult<Device> {
        let device_id = config.require_device_id()?;
        let devices = self.get_list(DEVICES_FIELD)?.unwrap_or_default();

        let existing = devices
            .iter()
            .filter_map(Value::as_map)
            .find(|device| device.get(ID_FIELD).and_then(Value::as_str) == Some(device_id));

        Ok(match existing {
            Some(values) => Device::from_values(values.clone()),
            None => Device::new(device_id),
        })
    }

    /// Stores `device` in the user's `_devices`, replacing any record with the same id.
    pub fn update_device<T: Transport>(&mut self, client: &ApiClient<T>, device: &Device) -> BaasdayResult<()> {
        debug!(device = ?device.id(), "updating device");
        self.update(client, &value_map! { DEVICES_FIELD => vec![device.clone()] })
    }

    pub fn into_document(self) -> Document {
        self.document
    }
}

fn authenticated_user(values: ValueMap) -> BaasdayResult<AuthenticatedUser> {
    Ok(AuthenticatedUser::new(values))
}

impl From<AuthenticatedUser> for User {
    fn from(user: AuthenticatedUser) -> Self {
        User { document: user.document }
    }
}

impl FieldAccess for AuthenticatedUser {
    fn values(&self) -> &ValueMap {
        self.document.values()
    }
}

impl Identifiable for AuthenticatedUser {
    fn document(&self) -> &Document {
        &self.document
    }
}

impl Resource for AuthenticatedUser {
    fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    fn resource_path(&self) -> BaasdayResult<String> {
        Ok(ME_PATH.to_string())
    }
}

impl Updatable for AuthenticatedUser {}
