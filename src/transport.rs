//! The transport seam.
//!
//! A [`Transport`] performs exactly one HTTP exchange per call to
//! [`Transport::send`]. It knows nothing about retries, status codes or
//! decoding; the [`Client`](crate::Client) layers those on top.
//!
//! [`ReqwestTransport`] is the production implementation. Tests and embedders
//! can supply their own.

use crate::request::RequestDescriptor;
use crate::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use http::HeaderMap;
use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Executes a single HTTP request.
///
/// Implementations must be safe to share between concurrent calls.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request` once and returns whatever the server answered.
    ///
    /// An `Err` means no HTTP response was received at all.
    async fn send(&self, request: &RequestDescriptor) -> std::result::Result<RawResponse, TransportError>;
}

/// An HTTP response as received, before any classification.
#[derive(Debug, Clone, Default)]
pub struct RawResponse {
    /// The numeric status code.
    pub status: u16,
    /// The response headers.
    pub headers: HeaderMap,
    /// The body. `None` when the server sent zero bytes.
    pub body: Option<Bytes>,
}

impl RawResponse {
    /// Creates a response with no headers. An empty `body` is stored as `None`.
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        Self {
            status,
            headers: HeaderMap::new(),
            body: (!body.is_empty()).then_some(body),
        }
    }
}

/// The kinds of transport failure this client distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    /// The attempt exceeded its time limit.
    TimedOut,
    /// The host name did not resolve to any address.
    CannotFindHost,
    /// The host was found but refused or failed the connection.
    CannotConnectToHost,
    /// An established connection dropped mid-exchange.
    NetworkConnectionLost,
    /// The resolver itself failed.
    DnsLookupFailed,
    /// Anything else (TLS, malformed response, I/O on the local side...).
    Other,
}

impl TransportErrorKind {
    /// Whether a failure of this kind is transient and worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransportErrorKind::TimedOut
                | TransportErrorKind::CannotFindHost
                | TransportErrorKind::CannotConnectToHost
                | TransportErrorKind::NetworkConnectionLost
                | TransportErrorKind::DnsLookupFailed
        )
    }
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransportErrorKind::TimedOut => "timed out",
            TransportErrorKind::CannotFindHost => "cannot find host",
            TransportErrorKind::CannotConnectToHost => "cannot connect to host",
            TransportErrorKind::NetworkConnectionLost => "network connection lost",
            TransportErrorKind::DnsLookupFailed => "DNS lookup failed",
            TransportErrorKind::Other => "other",
        };
        f.write_str(name)
    }
}

/// A failure that happened before any HTTP response was received.
#[derive(thiserror::Error, Debug)]
#[error("{kind}: {message}")]
pub struct TransportError {
    kind: TransportErrorKind,
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl TransportError {
    /// Creates an error of `kind` with a human-readable message.
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Attaches the underlying cause.
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// The failure kind.
    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }

    /// The message, without the kind prefix.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Shorthand for `self.kind().is_retryable()`.
    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let kind = classify_reqwest_error(&err);
        let message = err.to_string();
        TransportError::new(kind, message).with_source(err)
    }
}

/// Maps a `reqwest` failure onto a [`TransportErrorKind`].
///
/// `reqwest` only exposes coarse flags, so the source chain is walked for
/// I/O error kinds and resolver messages.
pub fn classify_reqwest_error(err: &reqwest::Error) -> TransportErrorKind {
    if err.is_timeout() {
        return TransportErrorKind::TimedOut;
    }

    let mut resolver_failed = false;
    let mut cause = err.source();
    while let Some(current) = cause {
        if let Some(io_err) = current.downcast_ref::<io::Error>() {
            match io_err.kind() {
                io::ErrorKind::TimedOut => return TransportErrorKind::TimedOut,
                io::ErrorKind::ConnectionRefused => {
                    return TransportErrorKind::CannotConnectToHost
                }
                io::ErrorKind::ConnectionReset
                | io::ErrorKind::ConnectionAborted
                | io::ErrorKind::BrokenPipe
                | io::ErrorKind::NotConnected
                | io::ErrorKind::UnexpectedEof => {
                    return TransportErrorKind::NetworkConnectionLost
                }
                _ => {}
            }
        }

        let text = current.to_string();
        if is_unknown_host_message(&text) {
            return TransportErrorKind::CannotFindHost;
        }
        if text.starts_with("dns error") {
            resolver_failed = true;
        }

        cause = current.source();
    }

    if resolver_failed {
        TransportErrorKind::DnsLookupFailed
    } else if err.is_connect() {
        TransportErrorKind::CannotConnectToHost
    } else {
        TransportErrorKind::Other
    }
}

// getaddrinfo wording differs between glibc, musl and the BSDs.
fn is_unknown_host_message(text: &str) -> bool {
    const MARKERS: [&str; 4] = [
        "Name or service not known",
        "nodename nor servname provided",
        "No address associated with hostname",
        "Name does not resolve",
    ];
    MARKERS.iter().any(|marker| text.contains(marker))
}

/// [`Transport`] backed by a `reqwest::Client`.
///
/// Sets no headers of its own; the descriptor's body, if any, is sent as-is.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with `reqwest`'s defaults.
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    /// Creates a transport whose every attempt is limited to `timeout`.
    ///
    /// An attempt that runs out of time fails with [`TransportErrorKind::TimedOut`].
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::ConfigurationError(format!("Failed to build HTTP client: {}", e))
            })?;
        Ok(Self { http })
    }

    /// Wraps an already configured `reqwest::Client`.
    pub fn from_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &RequestDescriptor) -> std::result::Result<RawResponse, TransportError> {
        let mut builder = self
            .http
            .request(request.method().to_http(), request.url().clone());

        if let Some(body) = request.body() {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(RawResponse {
            status,
            headers,
            body: (!body.is_empty()).then_some(body),
        })
    }
}

/// Returns the process-wide default transport, creating it on first use.
///
/// Every [`Client`](crate::Client) built without an explicit transport shares
/// this instance, and with it one connection pool.
pub fn shared_transport() -> Arc<dyn Transport> {
    static SHARED: OnceLock<Arc<ReqwestTransport>> = OnceLock::new();
    SHARED.get_or_init(|| Arc::new(ReqwestTransport::new())).clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_set() {
        let retryable = [
            TransportErrorKind::TimedOut,
            TransportErrorKind::CannotFindHost,
            TransportErrorKind::CannotConnectToHost,
            TransportErrorKind::NetworkConnectionLost,
            TransportErrorKind::DnsLookupFailed,
        ];
        for kind in retryable {
            assert!(kind.is_retryable(), "{} should be retryable", kind);
        }
        assert!(!TransportErrorKind::Other.is_retryable());
    }

    #[test]
    fn test_error_display_and_source() {
        let cause = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
        let err = TransportError::new(TransportErrorKind::CannotConnectToHost, "connect failed")
            .with_source(cause);

        assert_eq!(err.to_string(), "cannot connect to host: connect failed");
        assert_eq!(err.message(), "connect failed");
        assert!(err.source().is_some());
        assert!(err.is_retryable());
    }

    #[test]
    fn test_empty_body_is_absent() {
        assert!(RawResponse::new(200, "").body.is_none());
        assert_eq!(
            RawResponse::new(200, "{}").body,
            Some(Bytes::from_static(b"{}"))
        );
    }

    #[test]
    fn test_unknown_host_markers() {
        assert!(is_unknown_host_message(
            "failed to lookup address information: Name or service not known"
        ));
        assert!(is_unknown_host_message(
            "failed to lookup address information: nodename nor servname provided, or not known"
        ));
        assert!(!is_unknown_host_message("dns error"));
    }

    #[test]
    fn test_shared_transport_is_reused() {
        let first = shared_transport();
        let second = shared_transport();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
