//! The retrying executor.
//!
//! [`Client`] drives a request through its [`Transport`], retries transient
//! transport failures up to the request's bound, classifies the status code
//! and decodes the body. Use [`ClientBuilder`] to configure one.

use crate::{
    request::{ApiRequest, Method, RequestDescriptor},
    retry::{Backoff, RetryState},
    status,
    transport::{shared_transport, RawResponse, ReqwestTransport, Transport},
    CallResult, Error, Response, Result,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A client for typed JSON API calls.
///
/// Cheap to clone; clones share the transport. The client holds no mutable
/// state, so any number of calls may run on it concurrently.
///
/// # Examples
///
/// ```no_run
/// use netcall::{ApiRequest, Client, Response};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Translation {
///     text: String,
/// }
///
/// # async fn example() -> Result<(), netcall::Error> {
/// let client = Client::new();
///
/// let request = ApiRequest::new("https://api.example.com/translate")
///     .with_parameter("q", "hello")
///     .with_parameter("target", "it")
///     .with_max_retries(3);
///
/// let translation: Response<Translation> = client.get(&request).await?;
/// println!("{}", translation.text);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    transport: Arc<dyn Transport>,
    backoff: Backoff,
}

impl Client {
    /// Creates a client on the process-wide shared transport with no backoff.
    pub fn new() -> Self {
        Self::from_parts(shared_transport(), Backoff::None)
    }

    /// Creates a new `ClientBuilder` for configuring a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    fn from_parts(transport: Arc<dyn Transport>, backoff: Backoff) -> Self {
        Self {
            inner: Arc::new(ClientInner { transport, backoff }),
        }
    }

    /// Returns a client that sends through `transport` but is otherwise identical.
    ///
    /// Use this to override the transport for a single call.
    pub fn with_transport(&self, transport: Arc<dyn Transport>) -> Self {
        Self::from_parts(transport, self.inner.backoff.clone())
    }

    /// Makes a call with the given method.
    ///
    /// Fails with [`Error::IncorrectRequest`] without touching the transport
    /// when the endpoint does not form a URL.
    pub async fn call<T>(&self, method: Method, request: &ApiRequest) -> CallResult<T>
    where
        T: DeserializeOwned,
    {
        match request.descriptor(method) {
            Some(descriptor) => self.execute(&descriptor).await,
            None => {
                tracing::error!(
                    method = %method,
                    endpoint = %request.endpoint,
                    "Incorrect request, not sending"
                );
                Err(Error::IncorrectRequest {
                    endpoint: request.endpoint.clone(),
                })
            }
        }
    }

    /// Executes an already built descriptor.
    ///
    /// Only one attempt is in flight at a time. A transport failure of a
    /// retryable kind re-issues the identical request while the descriptor's
    /// retry budget lasts; the failure from the last attempt is returned
    /// unchanged once it is spent. Every other failure ends the call at once.
    pub async fn execute<T>(&self, descriptor: &RequestDescriptor) -> CallResult<T>
    where
        T: DeserializeOwned,
    {
        let start_time = Instant::now();
        let mut retry_state = RetryState::new(descriptor.max_retries());

        loop {
            tracing::debug!(
                method = %descriptor.method(),
                url = %descriptor.url(),
                attempt = retry_state.attempts(),
                "Executing HTTP request"
            );

            match self.inner.transport.send(descriptor).await {
                Ok(raw) => {
                    return self.resolve(raw, start_time.elapsed(), retry_state.attempts());
                }
                Err(e) if e.is_retryable() && retry_state.register_retry() => {
                    let delay = self.inner.backoff.delay_for_retry(retry_state.retries());
                    tracing::warn!(
                        error = %e,
                        retry = retry_state.retries(),
                        max_retries = retry_state.max_retries(),
                        delay_ms = delay.as_millis(),
                        url = %descriptor.url(),
                        "Transient transport failure, retrying"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        attempts = retry_state.attempts(),
                        retryable = e.is_retryable(),
                        url = %descriptor.url(),
                        "Request failed"
                    );
                    return Err(Error::Transport(e));
                }
            }
        }
    }

    /// Classifies the status and decodes the body of a received response.
    fn resolve<T>(&self, raw: RawResponse, latency: Duration, attempts: usize) -> CallResult<T>
    where
        T: DeserializeOwned,
    {
        let RawResponse {
            status: code,
            headers,
            body,
        } = raw;

        tracing::info!(
            status = code,
            latency_ms = latency.as_millis(),
            attempts = attempts,
            "Received HTTP response"
        );

        let raw_body = body
            .as_ref()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .unwrap_or_default();

        let outcome = status::classify(code);
        if let Some(err) = outcome.into_error(raw_body.as_str()) {
            match outcome.family {
                status::StatusFamily::ServerError => {
                    tracing::warn!(status = code, response = %raw_body, "Server error (5xx)")
                }
                _ => tracing::error!(
                    status = code,
                    family = %outcome.family,
                    response = %raw_body,
                    "Unsuccessful status"
                ),
            }
            return Err(err);
        }

        let Some(body) = body else {
            tracing::error!(status = code, "Response without data");
            return Err(Error::ResponseWithoutData { status: code });
        };

        match serde_json::from_slice::<T>(&body) {
            Ok(data) => Ok(Response::new(
                data, raw_body, code, headers, latency, attempts,
            )),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    raw_response = %raw_body,
                    "Failed to deserialize response"
                );

                Err(Error::DeserializationFailed {
                    raw_response: raw_body,
                    serde_error: e.to_string(),
                    status: code,
                })
            }
        }
    }

    /// Runs a call in the background and hands its result to `completion`.
    ///
    /// `completion` runs exactly once, on a Tokio worker, with either the
    /// decoded payload or the error that ended the call. There is no way to
    /// abort the call once dispatched.
    ///
    /// Must be invoked from within a Tokio runtime.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use netcall::{ApiRequest, Client, Method};
    ///
    /// # async fn example() {
    /// let client = Client::new();
    /// let request = ApiRequest::new("https://api.example.com/status");
    ///
    /// client.dispatch(Method::Get, request, |result: netcall::CallResult<serde_json::Value>| {
    ///     match result {
    ///         Ok(response) => println!("{}", response.data),
    ///         Err(e) => eprintln!("{}", e),
    ///     }
    /// });
    /// # }
    /// ```
    pub fn dispatch<T, F>(&self, method: Method, request: ApiRequest, completion: F)
    where
        T: DeserializeOwned + Send + 'static,
        F: FnOnce(CallResult<T>) + Send + 'static,
    {
        let client = self.clone();
        tokio::spawn(async move {
            let result = client.call::<T>(method, &request).await;
            completion(result);
        });
    }

    /// Makes a GET request.
    ///
    /// Parameters are sent both in the query string and as a form body.
    pub async fn get<T>(&self, request: &ApiRequest) -> CallResult<T>
    where
        T: DeserializeOwned,
    {
        self.call(Method::Get, request).await
    }

    /// Makes a POST request with the parameters as a form body.
    pub async fn post<T>(&self, request: &ApiRequest) -> CallResult<T>
    where
        T: DeserializeOwned,
    {
        self.call(Method::Post, request).await
    }

    /// Makes a DELETE request. Parameters go in the query string only.
    pub async fn delete<T>(&self, request: &ApiRequest) -> CallResult<T>
    where
        T: DeserializeOwned,
    {
        self.call(Method::Delete, request).await
    }

    /// Makes an UPLOAD request with the parameters as a form body.
    pub async fn upload<T>(&self, request: &ApiRequest) -> CallResult<T>
    where
        T: DeserializeOwned,
    {
        self.call(Method::Upload, request).await
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for configuring and creating a [`Client`].
///
/// # Examples
///
/// ```no_run
/// use netcall::{Backoff, ClientBuilder};
/// use std::time::Duration;
///
/// # fn example() -> Result<(), netcall::Error> {
/// let client = ClientBuilder::new()
///     .timeout(Duration::from_secs(10))
///     .backoff(Backoff::Exponential {
///         initial_delay: Duration::from_millis(100),
///         max_delay: Duration::from_secs(2),
///         jitter: true,
///     })
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct ClientBuilder {
    transport: Option<Arc<dyn Transport>>,
    timeout: Option<Duration>,
    backoff: Backoff,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sends through `transport` instead of the shared default.
    ///
    /// Takes precedence over [`timeout`](Self::timeout).
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Limits every attempt to `timeout`.
    ///
    /// This gives the client its own [`ReqwestTransport`] rather than the
    /// shared one. A timed-out attempt counts as a retryable failure.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the pause between retries.
    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Builds the configured `Client`.
    ///
    /// # Errors
    ///
    /// Returns an error if a dedicated HTTP client could not be created.
    pub fn build(self) -> Result<Client> {
        let transport: Arc<dyn Transport> = match (self.transport, self.timeout) {
            (Some(transport), _) => transport,
            (None, Some(timeout)) => Arc::new(ReqwestTransport::with_timeout(timeout)?),
            (None, None) => shared_transport(),
        };

        Ok(Client::from_parts(transport, self.backoff))
    }
}
