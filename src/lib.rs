//! # Netcall - typed JSON API calls with bounded retry
//!
//! Netcall turns an endpoint and a set of parameters into a request, sends it
//! over a pluggable transport, retries transient network failures a bounded
//! number of times, classifies the HTTP status and decodes the body into a
//! caller-chosen type.
//!
//! ## Quick Start
//!
//! ```no_run
//! use netcall::{ApiRequest, Client};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Translation {
//!     #[serde(rename = "translatedText")]
//!     translated_text: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), netcall::Error> {
//!     let client = Client::new();
//!
//!     let request = ApiRequest::new("https://api.example.com/translate")
//!         .with_parameter("q", "hello")
//!         .with_parameter("langpair", "en|it")
//!         .with_max_retries(3);
//!
//!     let response = client.get::<Translation>(&request).await?;
//!     println!("{} ({} attempt(s))", response.translated_text, response.attempts);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Failure policy
//!
//! - Only transport failures are retried, and only the transient kinds:
//!   timeouts, unknown hosts, refused connections, dropped connections and
//!   resolver failures. At most [`MAX_RETRIES`] retries are made per call,
//!   whatever the request asks for.
//! - Any registered non-2xx status fails the call with [`Error::Status`] and
//!   is never retried. Codes with no registered meaning are not treated as
//!   errors.
//! - A 2xx response without a body fails with [`Error::ResponseWithoutData`].
//! - A body that does not decode fails with [`Error::DeserializationFailed`].
//! - An endpoint that is not an absolute URL fails with
//!   [`Error::IncorrectRequest`] before anything is sent.
//!
//! ## Callbacks
//!
//! [`Client::dispatch`] runs a call in the background and hands the
//! [`CallResult`] to a completion closure exactly once:
//!
//! ```no_run
//! use netcall::{ApiRequest, CallResult, Client, Method};
//!
//! # async fn example() {
//! let client = Client::new();
//! let request = ApiRequest::new("https://api.example.com/items").with_max_retries(2);
//!
//! client.dispatch(Method::Get, request, |result: CallResult<Vec<String>>| match result {
//!     Ok(items) => println!("{} items", items.len()),
//!     Err(e) => eprintln!("failed: {}", e),
//! });
//! # }
//! ```

mod client;
mod error;
pub mod request;
mod response;
pub mod retry;
pub mod status;
pub mod transport;

pub use client::{Client, ClientBuilder};
pub use error::{CallResult, Error, Result};
pub use request::{ApiRequest, Method, RequestDescriptor, MAX_RETRIES};
pub use response::Response;
pub use retry::Backoff;
pub use transport::{RawResponse, Transport, TransportError, TransportErrorKind};
