//! Device records kept in an authenticated user's `_devices` list.
//!
//! A device id is generated once with [`generate_device_id`], stored by the
//! application, and configured on every later run through
//! [`ClientConfig::device_id`](baasday_core::config::ClientConfig). The record
//! itself is read with
//! [`AuthenticatedUser::current_device`](crate::user::AuthenticatedUser::current_device)
//! and written back with
//! [`AuthenticatedUser::update_device`](crate::user::AuthenticatedUser::update_device).

use baasday_core::{
    document::ID_FIELD,
    error::BaasdayResult,
    value::{FieldAccess, Value, ValueMap},
    value_map,
};
use uuid::Uuid;

/// Prefix of generated device ids, naming the client platform.
pub const DEVICE_ID_PREFIX: &str = "rust:";

pub const PUSH_NOTIFICATION_FIELD: &str = "pushNotification";
const GCM_FIELD: &str = "gcm";
const REGISTRATION_ID_FIELD: &str = "registrationId";

/// Generates a fresh device id of the form `rust:<uuid>`.
pub fn generate_device_id() -> String {
    format!("{DEVICE_ID_PREFIX}{}", Uuid::new_v4())
}

/// A device registered to a user.
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    values: ValueMap,
}

impl Device {
    /// Creates a device record carrying only its id.
    pub fn new(id: impl Into<String>) -> Self {
        let id: String = id.into();
        Self {
            values: value_map! { ID_FIELD => id },
        }
    }

    pub(crate) fn from_values(values: ValueMap) -> Self {
        Self { values }
    }

    pub fn id(&self) -> BaasdayResult<Option<&str>> {
        self.get_string(ID_FIELD)
    }

    /// Sets a field locally. Nothing is sent until the device is passed to
    /// `update_device`.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.values.insert(field.into(), value.into());
        self
    }

    /// Stores the push registration id under `pushNotification.gcm.registrationId`.
    pub fn set_registration_id(&mut self, registration_id: impl Into<String>) -> &mut Self {
        let registration_id: String = registration_id.into();
        let gcm = value_map! { REGISTRATION_ID_FIELD => registration_id };
        self.set(PUSH_NOTIFICATION_FIELD, value_map! { GCM_FIELD => gcm })
    }

    /// Returns the push registration id, if one was set.
    pub fn registration_id(&self) -> BaasdayResult<Option<&str>> {
        let Some(push) = self.get_map(PUSH_NOTIFICATION_FIELD)? else {
            return Ok(None);
        };
        let Some(gcm) = push.get_map(GCM_FIELD)? else {
            return Ok(None);
        };
        gcm.get_string(REGISTRATION_ID_FIELD)
    }
}

impl FieldAccess for Device {
    fn values(&self) -> &ValueMap {
        &self.values
    }
}

impl From<Device> for Value {
    fn from(device: Device) -> Self {
        Value::Map(device.values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_prefixed_and_unique() {
        let first = generate_device_id();
        let second = generate_device_id();

        assert!(first.starts_with(DEVICE_ID_PREFIX));
        assert!(Uuid::parse_str(&first[DEVICE_ID_PREFIX.len()..]).is_ok());
        assert_ne!(first, second);
    }

    #[test]
    fn registration_id_is_nested() {
        let mut device = Device::new("rust:1");
        assert_eq!(device.registration_id().unwrap(), None);

        device.set_registration_id("token");

        assert_eq!(device.registration_id().unwrap(), Some("token"));
        assert_eq!(
            Value::from(device),
            Value::Map(value_map! {
                "_id" => "rust:1",
                "pushNotification" => value_map! { "gcm" => value_map! { "registrationId" => "token" } },
            })
        );
    }
}
