//! # Error Module
//!
//! Error values shared by the service, the endpoints and the HTTP transport, plus
//! the classifier that turns any of them into an HTTP status code.
//!
//! ## Taxonomy
//!
//! - [`ServiceError`] - the closed set of business-rule violations raised by the
//!   service. These are always the caller's fault (400).
//! - [`Error::Transport`] - a wrapper tagged with the transport phase ([`Domain`])
//!   in which the inner error surfaced. Decode failures are the caller's fault;
//!   failures during the endpoint call are reclassified by their inner error.
//! - Everything else (`Json`, `Io`, `Http`, `Url`, `Remote`, `Internal`) is an opaque
//!   fault and maps to 500.
//!
//! ```rust
//! use addsvc::error::{status_code, Domain, Error, ServiceError};
//! use http::StatusCode;
//!
//! let err = Error::transport(Domain::Do, ServiceError::IntOverflow.into());
//! assert_eq!(status_code(&err), StatusCode::BAD_REQUEST);
//! ```

use http::StatusCode;
use std::fmt;
use thiserror::Error;

/// Business-rule violations raised by [`crate::service::Service`] implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// Both operands of a sum were zero.
    #[error("both arguments cannot be zero")]
    TwoZeroes,
    /// The concatenated string would be longer than the configured maximum.
    #[error("result exceeds maximum size")]
    MaxSizeExceeded,
    /// The sum does not fit in a signed 64-bit integer.
    #[error("integer overflow")]
    IntOverflow,
}

/// Transport phase in which a wrapped error originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    /// Building an outgoing request (client side).
    NewRequest,
    /// Decoding a request body (server) or a response body (client).
    Decode,
    /// Invoking the endpoint.
    Do,
    /// Encoding a response body (server) or a request body (client).
    Encode,
}

impl Domain {
    /// Stable lowercase name, used in log fields.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Domain::NewRequest => "new_request",
            Domain::Decode => "decode",
            Domain::Do => "do",
            Domain::Encode => "encode",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    /// A business-rule violation.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// An error raised in a specific transport phase. The message is the inner
    /// error's message; the domain only drives classification and logging.
    #[error("{source}")]
    Transport {
        domain: Domain,
        #[source]
        source: Box<Error>,
    },

    /// JSON serialization or deserialization failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Socket or body I/O failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The HTTP client failed before a response was received.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// A client target or endpoint URL could not be parsed.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// An error reported by a remote instance. Only the message survives the wire.
    #[error("{0}")]
    Remote(String),

    /// Any other fault.
    #[error("{0}")]
    Internal(String),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wrap `err` as having happened during `domain`.
    ///
    /// An error that is already a transport wrapper is returned unchanged, so the
    /// classifier never has more than one layer to peel.
    #[must_use]
    pub fn transport(domain: Domain, err: Error) -> Self {
        match err {
            already @ Error::Transport { .. } => already,
            other => Error::Transport {
                domain,
                source: Box::new(other),
            },
        }
    }

    /// Split a transport wrapper into its domain and inner error.
    #[must_use]
    pub fn unwrap_transport(&self) -> Option<(Domain, &Error)> {
        match self {
            Error::Transport { domain, source } => Some((*domain, source.as_ref())),
            _ => None,
        }
    }

    /// Transport domain of this error, if it is a wrapper.
    #[must_use]
    pub fn domain(&self) -> Option<Domain> {
        self.unwrap_transport().map(|(domain, _)| domain)
    }

    /// Shorthand for [`Error::Internal`].
    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }
}

/// Map an error to the HTTP status code the server should answer with.
///
/// Known business errors and decode failures are client errors. A failure during
/// the endpoint call is classified by what it wraps. Anything else is a server
/// error.
#[must_use]
pub fn status_code(err: &Error) -> StatusCode {
    match err {
        Error::Service(
            ServiceError::TwoZeroes | ServiceError::MaxSizeExceeded | ServiceError::IntOverflow,
        ) => StatusCode::BAD_REQUEST,
        Error::Transport { domain, source } => match domain {
            Domain::Decode => StatusCode::BAD_REQUEST,
            Domain::Do => status_code(source),
            Domain::NewRequest | Domain::Encode => StatusCode::INTERNAL_SERVER_ERROR,
        },
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json_error() -> Error {
        serde_json::from_str::<serde_json::Value>("{nope")
            .unwrap_err()
            .into()
    }

    #[test]
    fn business_errors_are_client_errors() {
        for err in [
            ServiceError::TwoZeroes,
            ServiceError::MaxSizeExceeded,
            ServiceError::IntOverflow,
        ] {
            assert_eq!(status_code(&Error::Service(err)), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn unknown_errors_are_server_errors() {
        assert_eq!(
            status_code(&Error::internal("boom")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_code(&Error::Remote("upstream said no".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(status_code(&json_error()), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn decode_domain_is_client_error() {
        let err = Error::transport(Domain::Decode, json_error());
        assert_eq!(status_code(&err), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn do_domain_reclassifies_inner_error() {
        let business = Error::transport(Domain::Do, ServiceError::TwoZeroes.into());
        assert_eq!(status_code(&business), StatusCode::BAD_REQUEST);

        let opaque = Error::transport(Domain::Do, Error::internal("db down"));
        assert_eq!(status_code(&opaque), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn encode_domain_is_server_error() {
        let err = Error::transport(Domain::Encode, json_error());
        assert_eq!(status_code(&err), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn transport_wrapping_does_not_nest() {
        let inner = Error::transport(Domain::Decode, json_error());
        let outer = Error::transport(Domain::Do, inner);
        let (domain, source) = outer.unwrap_transport().unwrap();
        assert_eq!(domain, Domain::Decode);
        assert!(source.unwrap_transport().is_none());
    }

    #[test]
    fn transport_message_is_inner_message() {
        let err = Error::transport(Domain::Do, ServiceError::MaxSizeExceeded.into());
        assert_eq!(err.to_string(), "result exceeds maximum size");
        assert_eq!(err.domain(), Some(Domain::Do));
    }

    #[test]
    fn two_zeroes_message() {
        assert_eq!(
            ServiceError::TwoZeroes.to_string(),
            "both arguments cannot be zero"
        );
    }
}
