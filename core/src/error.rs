//! Error types for the IGDB client.
//!
//! # Design
//! Transport failures and unusable responses both describe a failed request,
//! but only the latter carries an `HttpResponse`. It is kept on the error so
//! callers can inspect status, headers and body instead of losing them.
//! A missing scroll header is an ordinary end-of-pagination signal and gets
//! its own variant so callers can match on it.

use std::num::ParseIntError;

use thiserror::Error;

use crate::http::{HttpResponse, TransportError};

/// Convenient result alias returning [`IgdbError`] failures.
pub type IgdbResult<T> = Result<T, IgdbError>;

/// Failures surfaced by `IgdbClient` and its configuration.
#[derive(Debug, Error)]
pub enum IgdbError {
    /// Required client configuration is empty.
    #[error("invalid IGDB configuration: {reason}")]
    Configuration { reason: &'static str },

    /// Required environment variable is missing.
    #[error("missing IGDB environment variable `{var}`")]
    MissingEnvVar { var: &'static str },

    /// The resource name is not one of the known IGDB endpoints.
    #[error("unknown IGDB endpoint `{name}`")]
    UnknownEndpoint { name: String },

    /// No response was obtained (connection refused, timeout, TLS).
    #[error("failed to send IGDB request to `{url}`")]
    Transport {
        url: String,
        #[source]
        source: TransportError,
    },

    /// The server answered with a non-2xx status and no JSON body.
    #[error("IGDB request to `{url}` failed with status {status}")]
    ApiRequest {
        url: String,
        status: u16,
        response: Box<HttpResponse>,
    },

    /// The response lacks the requested pagination header.
    #[error("{header} header doesn't exist")]
    ScrollHeaderNotFound { header: String },

    /// The result-count header is not an integer.
    #[error("invalid scroll count `{value}`")]
    InvalidScrollCount {
        value: String,
        #[source]
        source: ParseIntError,
    },

    /// A decoded element does not match the requested model.
    #[error("failed to deserialize IGDB payload")]
    Deserialize {
        #[source]
        source: serde_json::Error,
    },
}

impl IgdbError {
    /// The response preserved by a failed request, if the server sent one.
    pub fn response(&self) -> Option<&HttpResponse> {
        match self {
            IgdbError::ApiRequest { response, .. } => Some(response.as_ref()),
            _ => None,
        }
    }

    /// Whether this error only means "there is no further page".
    pub fn is_end_of_scroll(&self) -> bool {
        matches!(self, IgdbError::ScrollHeaderNotFound { .. })
    }
}
