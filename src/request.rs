//! Request construction.
//!
//! An [`ApiRequest`] is what callers describe: an endpoint string, an optional
//! set of parameters and how many times transient failures may be retried.
//! Turning it into a [`RequestDescriptor`] for a given [`Method`] validates the
//! endpoint and encodes the parameters once, up front.

use bytes::Bytes;
use std::collections::HashMap;
use std::fmt;
use url::{form_urlencoded, Url};

/// Hard ceiling on retries for a single call, regardless of what was requested.
pub const MAX_RETRIES: usize = 10;

/// The HTTP verbs a call can be issued with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `DELETE`
    Delete,
    /// The `UPLOAD` extension verb.
    Upload,
}

impl Method {
    /// Returns the verb as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
            Method::Upload => "UPLOAD",
        }
    }

    /// Whether the encoded parameters are also sent as the request body.
    ///
    /// GET carries a body here too; the APIs this client talks to read
    /// form-encoded parameters from the body.
    pub fn carries_body(&self) -> bool {
        match self {
            Method::Get | Method::Post | Method::Upload => true,
            Method::Delete => false,
        }
    }

    /// Converts into an [`http::Method`].
    pub fn to_http(&self) -> http::Method {
        match self {
            Method::Get => http::Method::GET,
            Method::Post => http::Method::POST,
            Method::Delete => http::Method::DELETE,
            // "UPLOAD" is a valid token, so this never falls through.
            Method::Upload => {
                http::Method::from_bytes(b"UPLOAD").unwrap_or(http::Method::PUT)
            }
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A caller-side description of an API call.
///
/// # Examples
///
/// ```
/// use netcall::{ApiRequest, Method};
///
/// let request = ApiRequest::new("https://api.example.com/translate")
///     .with_parameter("q", "hello")
///     .with_max_retries(3);
///
/// let descriptor = request.descriptor(Method::Get).unwrap();
/// assert_eq!(descriptor.url().query(), Some("q=hello"));
/// assert_eq!(descriptor.max_retries(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiRequest {
    /// The absolute endpoint URL.
    pub endpoint: String,

    /// Parameters encoded into the query string (and body, for methods that carry one).
    pub parameters: Option<HashMap<String, String>>,

    /// Requested number of retries on transient transport failures.
    ///
    /// Clamped to [`MAX_RETRIES`] when the descriptor is built.
    pub max_retries: usize,
}

impl ApiRequest {
    /// Creates a request for `endpoint` with no parameters and no retries.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            parameters: None,
            max_retries: 0,
        }
    }

    /// Adds a single parameter. A repeated key replaces the earlier value.
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Adds multiple parameters.
    pub fn with_parameters(
        mut self,
        params: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        self.parameters
            .get_or_insert_with(HashMap::new)
            .extend(params);
        self
    }

    /// Sets the requested retry bound.
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Builds the wire descriptor for `method`.
    ///
    /// Returns `None` when the endpoint does not parse into an absolute URL
    /// with a host; such a request must never reach the transport.
    pub fn descriptor(&self, method: Method) -> Option<RequestDescriptor> {
        RequestDescriptor::build(method, &self.endpoint, self.parameters.as_ref(), self.max_retries)
    }
}

/// An immutable, fully-resolved request ready to hand to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    url: Url,
    method: Method,
    body: Option<Bytes>,
    max_retries: usize,
}

impl RequestDescriptor {
    /// Builds a descriptor from raw parts. See [`ApiRequest::descriptor`].
    pub fn build(
        method: Method,
        endpoint: &str,
        parameters: Option<&HashMap<String, String>>,
        max_retries: usize,
    ) -> Option<Self> {
        let mut url = Url::parse(endpoint.trim()).ok()?;
        if !url.has_host() {
            return None;
        }

        let encoded = parameters
            .filter(|params| !params.is_empty())
            .map(encode_parameters);

        if let Some(query) = &encoded {
            let combined = match url.query() {
                Some(existing) if !existing.is_empty() => format!("{}&{}", existing, query),
                _ => query.clone(),
            };
            url.set_query(Some(&combined));
        }

        let body = encoded
            .filter(|_| method.carries_body())
            .map(Bytes::from);

        Some(Self {
            url,
            method,
            body,
            max_retries: max_retries.min(MAX_RETRIES),
        })
    }

    /// The target URL, including encoded parameters.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The HTTP verb.
    pub fn method(&self) -> Method {
        self.method
    }

    /// The percent-encoded form body, if any.
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// The effective retry bound, never above [`MAX_RETRIES`].
    pub fn max_retries(&self) -> usize {
        self.max_retries
    }
}

/// Percent-encodes parameters as `application/x-www-form-urlencoded`, keys ascending.
fn encode_parameters(params: &HashMap<String, String>) -> String {
    let mut pairs: Vec<_> = params.iter().collect();
    pairs.sort();

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_parameter_round_trip() {
        let descriptor = ApiRequest::new("https://api.example.com/x")
            .with_parameter("q", "hello")
            .descriptor(Method::Get)
            .unwrap();

        let body = descriptor.body().unwrap();
        let pairs: Vec<(String, String)> = form_urlencoded::parse(body)
            .into_owned()
            .collect();
        assert_eq!(pairs, vec![("q".to_string(), "hello".to_string())]);

        let query: Vec<(String, String)> = descriptor.url().query_pairs().into_owned().collect();
        assert_eq!(query, pairs);
    }

    #[test]
    fn test_retry_bound_is_clamped() {
        for requested in [0, 1, 9, 10, 11, 50, usize::MAX] {
            let descriptor = ApiRequest::new("https://api.example.com")
                .with_max_retries(requested)
                .descriptor(Method::Post)
                .unwrap();
            assert!(descriptor.max_retries() <= MAX_RETRIES);
            assert_eq!(descriptor.max_retries(), requested.min(10));
        }
    }

    #[test]
    fn test_unparsable_endpoint_builds_nothing() {
        assert!(ApiRequest::new("not a url").descriptor(Method::Get).is_none());
        assert!(ApiRequest::new("/relative/path").descriptor(Method::Get).is_none());
        assert!(ApiRequest::new("").descriptor(Method::Get).is_none());
        assert!(ApiRequest::new("mailto:someone@example.com")
            .descriptor(Method::Get)
            .is_none());
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let request = ApiRequest::new("https://api.example.com/x")
            .with_parameter("b", "2")
            .with_parameter("a", "1 & 3")
            .with_parameter("c", "ü");

        let first = request.descriptor(Method::Post).unwrap();
        let second = request.descriptor(Method::Post).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first.body().map(|b| &b[..]),
            Some(&b"a=1+%26+3&b=2&c=%C3%BC"[..])
        );
    }

    #[test]
    fn test_delete_has_no_body() {
        let descriptor = ApiRequest::new("https://api.example.com/items/1")
            .with_parameter("force", "true")
            .descriptor(Method::Delete)
            .unwrap();

        assert!(descriptor.body().is_none());
        assert_eq!(descriptor.url().query(), Some("force=true"));
    }

    #[test]
    fn test_no_parameters_no_body() {
        let descriptor = ApiRequest::new("https://api.example.com/items")
            .descriptor(Method::Post)
            .unwrap();
        assert!(descriptor.body().is_none());
        assert_eq!(descriptor.url().query(), None);
    }

    #[test]
    fn test_existing_query_is_kept() {
        let descriptor = ApiRequest::new("https://api.example.com/x?v=2")
            .with_parameter("q", "hi")
            .descriptor(Method::Get)
            .unwrap();
        assert_eq!(descriptor.url().query(), Some("v=2&q=hi"));
        assert_eq!(descriptor.body().map(|b| &b[..]), Some(&b"q=hi"[..]));
    }

    #[test]
    fn test_upload_verb() {
        assert_eq!(Method::Upload.to_http().as_str(), "UPLOAD");
        assert_eq!(Method::Get.to_http(), http::Method::GET);
        assert_eq!(Method::Delete.to_string(), "DELETE");
    }
}
