//! Error types for API calls.
//!
//! Every way a call can fail is surfaced through [`Error`], on the same
//! channel as success. The variants separate network-layer problems
//! ([`Error::Transport`]) from API-layer problems ([`Error::Status`]) and
//! payload-shape problems ([`Error::DeserializationFailed`],
//! [`Error::ResponseWithoutData`]).

use crate::transport::{TransportError, TransportErrorKind};
use crate::Response;
use http::StatusCode;

/// The error type for API calls.
///
/// # Examples
///
/// ```no_run
/// use netcall::{ApiRequest, Client, Error};
///
/// # async fn example() -> Result<(), Error> {
/// let client = Client::new();
/// let request = ApiRequest::new("https://api.example.com/endpoint");
///
/// match client.get::<serde_json::Value>(&request).await {
///     Ok(response) => println!("Success: {:?}", response.data),
///     Err(Error::Status { status, raw_response }) => {
///         eprintln!("HTTP error {}: {}", status, raw_response);
///     }
///     Err(Error::Transport(e)) => eprintln!("Network problem ({}): {}", e.kind(), e),
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The endpoint could not be turned into a URL.
    ///
    /// Raised before anything is sent; the transport is never invoked.
    #[error("Incorrect request: cannot build a URL from {endpoint:?}")]
    IncorrectRequest {
        /// The endpoint string as supplied by the caller.
        endpoint: String,
    },

    /// The transport failed before any HTTP response was received.
    ///
    /// For retryable kinds this is the error from the final attempt, once the
    /// retry budget is spent.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The server answered with a registered, non-2xx status code.
    #[error("HTTP error {status}: {raw_response}")]
    Status {
        /// The HTTP status code.
        status: StatusCode,
        /// The raw response body, possibly empty.
        raw_response: String,
    },

    /// The status indicated success but the response had no body.
    #[error("Response without data (status {status})")]
    ResponseWithoutData {
        /// The HTTP status code.
        status: u16,
    },

    /// The body could not be deserialized into the expected type.
    ///
    /// # Fields
    ///
    /// * `raw_response` - The raw response body as a string
    /// * `serde_error` - The error message from serde
    /// * `status` - The HTTP status code of the response
    #[error("Failed to deserialize response (status {status}): {serde_error}")]
    DeserializationFailed {
        /// The raw response body that failed to deserialize
        raw_response: String,
        /// The serde error message
        serde_error: String,
        /// The HTTP status code
        status: u16,
    },

    /// Invalid client configuration.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl Error {
    /// Returns `true` if a fresh attempt could succeed.
    ///
    /// Only transport failures of a retryable kind qualify. HTTP status
    /// failures are never retried.
    ///
    /// # Examples
    ///
    /// ```
    /// use netcall::Error;
    /// use netcall::transport::{TransportError, TransportErrorKind};
    ///
    /// let err = Error::from(TransportError::new(TransportErrorKind::TimedOut, "timed out"));
    /// assert!(err.is_retryable());
    ///
    /// let err = Error::Status {
    ///     status: http::StatusCode::SERVICE_UNAVAILABLE,
    ///     raw_response: String::new(),
    /// };
    /// assert!(!err.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport(e) => e.is_retryable(),
            Error::IncorrectRequest { .. } => false,
            Error::Status { .. } => false,
            Error::ResponseWithoutData { .. } => false,
            Error::DeserializationFailed { .. } => false,
            Error::ConfigurationError(_) => false,
        }
    }

    /// Returns the HTTP status code if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Status { status, .. } => Some(status.as_u16()),
            Error::ResponseWithoutData { status } => Some(*status),
            Error::DeserializationFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the raw response body if this error has one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::Status { raw_response, .. } => Some(raw_response),
            Error::DeserializationFailed { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }

    /// Returns the transport error kind for network-layer failures.
    pub fn transport_kind(&self) -> Option<TransportErrorKind> {
        match self {
            Error::Transport(e) => Some(e.kind()),
            _ => None,
        }
    }
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The outcome of one call: the decoded payload or the reason it failed.
pub type CallResult<T> = Result<Response<T>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transient_transport_errors_are_retryable() {
        let timeout = Error::from(TransportError::new(TransportErrorKind::TimedOut, "t"));
        assert!(timeout.is_retryable());

        let other = Error::from(TransportError::new(TransportErrorKind::Other, "tls"));
        assert!(!other.is_retryable());

        let server = Error::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            raw_response: "boom".to_string(),
        };
        assert!(!server.is_retryable());
        assert!(!Error::ResponseWithoutData { status: 200 }.is_retryable());
    }

    #[test]
    fn test_accessors() {
        let err = Error::DeserializationFailed {
            raw_response: "nope".to_string(),
            serde_error: "expected value".to_string(),
            status: 200,
        };
        assert_eq!(err.status(), Some(200));
        assert_eq!(err.raw_response(), Some("nope"));
        assert_eq!(err.transport_kind(), None);

        let err = Error::from(TransportError::new(TransportErrorKind::CannotFindHost, "x"));
        assert_eq!(err.transport_kind(), Some(TransportErrorKind::CannotFindHost));
        assert_eq!(err.status(), None);
    }
}
