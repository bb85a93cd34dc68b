//! Error types and result types for baasday client operations.
//!
//! Every fallible operation in the workspace returns [`BaasdayResult<T>`]. The
//! single [`BaasdayError`] enum distinguishes accessor, decoding, transport and
//! server-side failures so callers can branch on the variant (or on
//! [`BaasdayError::kind`]) without downcasting.

use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when talking to the baasday service.
#[derive(Error, Debug)]
pub enum BaasdayError {
    /// A typed accessor was invoked against a value of a different runtime type.
    #[error("Type mismatch for field {field}: expected {expected}, found {found}")]
    TypeMismatch {
        /// The field that was read.
        field: String,
        /// The type the caller asked for.
        expected: &'static str,
        /// The type actually stored in the field.
        found: &'static str,
    },
    /// The server's response could not be parsed, was not an object where one
    /// was required, or a list response lacked `_count`/`_contents`.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    /// The network exchange itself failed (connection, timeout, malformed URL).
    #[error("Transport failure: {message}")]
    Transport {
        /// Human readable description of the failure.
        message: String,
        /// The lower-level cause, when one is available.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
    /// The service answered with a non-success status.
    #[error("Request to {path} failed with status {status}: {body}")]
    Api {
        /// The relative API path of the request.
        path: String,
        /// The HTTP status code.
        status: u16,
        /// The raw response body.
        body: String,
    },
    /// Update or delete was invoked on a document that was never created.
    #[error("Document has no _id; it must be created before it can be updated or deleted")]
    NotPersisted,
    /// The client configuration is missing a required value.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Discriminant of a [`BaasdayError`], for callers that only need to branch on the category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    TypeMismatch,
    MalformedResponse,
    Transport,
    Api,
    NotPersisted,
    Configuration,
}

impl BaasdayError {
    /// Creates a [`BaasdayError::Transport`] wrapping a lower-level cause.
    pub fn transport<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        BaasdayError::Transport {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BaasdayError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            BaasdayError::MalformedResponse(_) => ErrorKind::MalformedResponse,
            BaasdayError::Transport { .. } => ErrorKind::Transport,
            BaasdayError::Api { .. } => ErrorKind::Api,
            BaasdayError::NotPersisted => ErrorKind::NotPersisted,
            BaasdayError::Configuration(_) => ErrorKind::Configuration,
        }
    }
}

/// A specialized `Result` type for baasday operations.
pub type BaasdayResult<T> = Result<T, BaasdayError>;

impl From<SerdeJsonError> for BaasdayError {
    fn from(err: SerdeJsonError) -> Self {
        BaasdayError::MalformedResponse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_errors_surface_as_malformed_response() {
        let err: BaasdayError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();

        assert_eq!(err.kind(), ErrorKind::MalformedResponse);
    }

    #[test]
    fn transport_keeps_its_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = BaasdayError::transport("could not connect", io);

        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.to_string(), "Transport failure: could not connect");
    }
}
