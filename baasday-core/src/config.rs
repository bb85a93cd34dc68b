//! Client configuration.
//!
//! A [`ClientConfig`] carries the application credentials every request is
//! authenticated with, the API root the request paths are joined to, and the
//! optional per-user settings (user authentication key, device id).
//!
//! Configurations can be built in code, deserialized with serde, or read from
//! the environment:
//!
//! | variable                          | field                     |
//! |-----------------------------------|---------------------------|
//! | `BAASDAY_APPLICATION_ID`          | `application_id` (required) |
//! | `BAASDAY_API_KEY`                 | `api_key` (required)      |
//! | `BAASDAY_API_ROOT`                | `api_root`                |
//! | `BAASDAY_USER_AUTHENTICATION_KEY` | `user_authentication_key` |
//! | `BAASDAY_DEVICE_ID`               | `device_id`               |

use serde::{Deserialize, Serialize};

use crate::error::{BaasdayError, BaasdayResult};

/// API root used when none is configured.
pub const DEFAULT_API_ROOT: &str = "https://baasday.com/api/";

pub const APPLICATION_ID_VAR: &str = "BAASDAY_APPLICATION_ID";
pub const API_KEY_VAR: &str = "BAASDAY_API_KEY";
pub const API_ROOT_VAR: &str = "BAASDAY_API_ROOT";
pub const USER_AUTHENTICATION_KEY_VAR: &str = "BAASDAY_USER_AUTHENTICATION_KEY";
pub const DEVICE_ID_VAR: &str = "BAASDAY_DEVICE_ID";

fn default_api_root() -> String {
    DEFAULT_API_ROOT.to_string()
}

/// Settings shared by every request a client makes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    pub application_id: String,
    pub api_key: String,
    #[serde(default = "default_api_root")]
    pub api_root: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_authentication_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
}

impl ClientConfig {
    /// Creates a configuration for the default API root with no user settings.
    pub fn new(application_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            application_id: application_id.into(),
            api_key: api_key.into(),
            api_root: default_api_root(),
            user_authentication_key: None,
            device_id: None,
        }
    }

    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`BaasdayError::Configuration`] if `BAASDAY_APPLICATION_ID` or
    /// `BAASDAY_API_KEY` is unset or empty.
    pub fn from_env() -> BaasdayResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> BaasdayResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|value| !value.is_empty());
        let require = |name: &str| {
            read(name).ok_or_else(|| {
                BaasdayError::Configuration(format!("environment variable {name} is not set"))
            })
        };

        Ok(Self {
            application_id: require(APPLICATION_ID_VAR)?,
            api_key: require(API_KEY_VAR)?,
            api_root: read(API_ROOT_VAR).unwrap_or_else(default_api_root),
            user_authentication_key: read(USER_AUTHENTICATION_KEY_VAR),
            device_id: read(DEVICE_ID_VAR),
        })
    }

    /// Returns the configured device id.
    ///
    /// # Errors
    ///
    /// Returns [`BaasdayError::Configuration`] when no device id is set.
    pub fn require_device_id(&self) -> BaasdayResult<&str> {
        self.device_id
            .as_deref()
            .ok_or_else(|| BaasdayError::Configuration("no device ID is set".to_string()))
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    application_id: Option<String>,
    api_key: Option<String>,
    api_root: Option<String>,
    user_authentication_key: Option<String>,
    device_id: Option<String>,
}

impl ClientConfigBuilder {
    pub fn application_id(mut self, application_id: impl Into<String>) -> Self {
        self.application_id = Some(application_id.into());
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn api_root(mut self, api_root: impl Into<String>) -> Self {
        self.api_root = Some(api_root.into());
        self
    }

    pub fn user_authentication_key(mut self, key: impl Into<String>) -> Self {
        self.user_authentication_key = Some(key.into());
        self
    }

    pub fn device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`BaasdayError::Configuration`] if the application id or API key is missing.
    pub fn build(self) -> BaasdayResult<ClientConfig> {
        let application_id = self
            .application_id
            .ok_or_else(|| BaasdayError::Configuration("application id is required".to_string()))?;
        let api_key = self
            .api_key
            .ok_or_else(|| BaasdayError::Configuration("API key is required".to_string()))?;

        Ok(ClientConfig {
            application_id,
            api_key,
            api_root: self.api_root.unwrap_or_else(default_api_root),
            user_authentication_key: self.user_authentication_key,
            device_id: self.device_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn from_lookup_reads_every_variable() {
        let config = ClientConfig::from_lookup(lookup(&[
            (APPLICATION_ID_VAR, "app"),
            (API_KEY_VAR, "key"),
            (API_ROOT_VAR, "http://localhost:8080/api"),
            (USER_AUTHENTICATION_KEY_VAR, "user-key"),
            (DEVICE_ID_VAR, "rust:device"),
        ]))
        .unwrap();

        assert_eq!(config.application_id, "app");
        assert_eq!(config.api_key, "key");
        assert_eq!(config.api_root, "http://localhost:8080/api");
        assert_eq!(config.user_authentication_key.as_deref(), Some("user-key"));
        assert_eq!(config.require_device_id().unwrap(), "rust:device");
    }

    #[test]
    fn from_lookup_defaults_optional_values() {
        let config = ClientConfig::from_lookup(lookup(&[
            (APPLICATION_ID_VAR, "app"),
            (API_KEY_VAR, "key"),
            (API_ROOT_VAR, ""),
        ]))
        .unwrap();

        assert_eq!(config, ClientConfig::new("app", "key"));
        assert_eq!(config.api_root, DEFAULT_API_ROOT);
    }

    #[test]
    fn from_lookup_requires_credentials() {
        let err = ClientConfig::from_lookup(lookup(&[(APPLICATION_ID_VAR, "app")])).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains(API_KEY_VAR));
    }

    #[test]
    fn builder_requires_credentials() {
        let err = ClientConfig::builder().api_key("key").build().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let config = ClientConfig::builder()
            .application_id("app")
            .api_key("key")
            .device_id("d")
            .build()
            .unwrap();
        assert_eq!(config.device_id.as_deref(), Some("d"));
    }

    #[test]
    fn missing_device_id_is_a_configuration_error() {
        let err = ClientConfig::new("app", "key").require_device_id().unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(err.to_string(), "Configuration error: no device ID is set");
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"applicationId": "app", "apiKey": "key"}"#).unwrap();

        assert_eq!(config, ClientConfig::new("app", "key"));
    }
}
