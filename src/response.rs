//! Successful call results.
//!
//! [`Response`] carries the decoded payload along with the details of the
//! exchange that produced it.

use http::HeaderMap;
use std::time::Duration;

/// A decoded, successful response.
///
/// # Type Parameters
///
/// * `T` - The type the body was decoded into
///
/// # Examples
///
/// ```no_run
/// use netcall::{ApiRequest, Client};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Translation {
///     text: String,
/// }
///
/// # async fn example() -> Result<(), netcall::Error> {
/// let client = Client::new();
/// let request = ApiRequest::new("https://api.example.com/translate")
///     .with_parameter("q", "hello")
///     .with_max_retries(2);
///
/// let response = client.get::<Translation>(&request).await?;
///
/// println!("Translation: {}", response.text);
/// println!("Took {:?} over {} attempt(s)", response.latency, response.attempts);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Response<T> {
    /// The decoded body.
    pub data: T,

    /// The body as received, lossily converted to UTF-8.
    pub raw_body: String,

    /// The HTTP status code.
    pub status: u16,

    /// The response headers.
    pub headers: HeaderMap,

    /// Time from the first attempt until the final response arrived.
    pub latency: Duration,

    /// Attempts made, including the first. `1` means no retries were needed.
    pub attempts: usize,
}

impl<T> Response<T> {
    /// Creates a new `Response`.
    pub fn new(
        data: T,
        raw_body: String,
        status: u16,
        headers: HeaderMap,
        latency: Duration,
        attempts: usize,
    ) -> Self {
        Self {
            data,
            raw_body,
            status,
            headers,
            latency,
            attempts,
        }
    }

    /// Maps the payload, keeping everything else.
    ///
    /// # Examples
    ///
    /// ```
    /// # use netcall::Response;
    /// # use http::HeaderMap;
    /// # use std::time::Duration;
    /// let response = Response::new(
    ///     42,
    ///     "42".to_string(),
    ///     200,
    ///     HeaderMap::new(),
    ///     Duration::from_millis(100),
    ///     1,
    /// );
    ///
    /// let string_response = response.map(|n| n.to_string());
    /// assert_eq!(string_response.data, "42");
    /// ```
    pub fn map<U, F>(self, f: F) -> Response<U>
    where
        F: FnOnce(T) -> U,
    {
        Response {
            data: f(self.data),
            raw_body: self.raw_body,
            status: self.status,
            headers: self.headers,
            latency: self.latency,
            attempts: self.attempts,
        }
    }

    /// Returns `true` if at least one retry was needed.
    pub fn was_retried(&self) -> bool {
        self.attempts > 1
    }

    /// Returns a header value by name, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// Drops the metadata and returns the payload.
    pub fn into_data(self) -> T {
        self.data
    }
}

impl<T> AsRef<T> for Response<T> {
    fn as_ref(&self) -> &T {
        &self.data
    }
}

impl<T> std::ops::Deref for Response<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}
