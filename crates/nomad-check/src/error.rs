//! Error types for the Nomad API client.

use thiserror::Error;

/// Errors that can occur while reading state from the Nomad HTTP API.
///
/// Every variant except [`NomadError::Client`] carries the endpoint that
/// failed so the report can name it.
#[derive(Debug, Error)]
pub enum NomadError {
    /// The request never produced a response (refused, DNS, timeout).
    #[error("{endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// Nomad answered with a non-success status.
    #[error("{endpoint} returned {status}: {body}")]
    Api {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// The response body did not match the expected shape.
    #[error("{endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl NomadError {
    /// Endpoint that produced the error, if any.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::Connect { endpoint, .. }
            | Self::Api { endpoint, .. }
            | Self::Decode { endpoint, .. } => Some(endpoint),
            Self::Client(_) => None,
        }
    }

    /// One-line description used as the check output when a pass aborts.
    pub fn check_message(&self) -> String {
        match self {
            Self::Connect { source, .. } => format!("Unable to connect to Nomad: {source}"),
            Self::Api { status, body, .. } => format!("Error {status}: {body}"),
            Self::Decode { source, .. } => format!("Unable to parse json in response: {source}"),
            Self::Client(e) => format!("Unable to connect to Nomad: {e}"),
        }
    }
}
