//! Fetches a translation record from the public MyMemory API.
//!
//! This example shows how to:
//! - Build a request from an endpoint and parameters
//! - Retry transient network failures
//! - Tell network, status and payload failures apart
//! - Receive a result through a completion callback
//!
//! Run with: `cargo run --example translate -- "good morning" en it`

use netcall::{ApiRequest, Backoff, CallResult, Client, Error, Method};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslationRecord {
    response_data: TranslatedText,
    response_status: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslatedText {
    translated_text: String,
    #[serde(rename = "match")]
    confidence: Option<f64>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("netcall=debug,translate=info")
        .init();

    let mut args = std::env::args().skip(1);
    let text = args.next().unwrap_or_else(|| "hello world".to_string());
    let source = args.next().unwrap_or_else(|| "en".to_string());
    let target = args.next().unwrap_or_else(|| "it".to_string());

    let client = Client::builder()
        .timeout(Duration::from_secs(10))
        .backoff(Backoff::Exponential {
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(2),
            jitter: true,
        })
        .build()?;

    let request = ApiRequest::new("https://api.mymemory.translated.net/get")
        .with_parameter("q", text.as_str())
        .with_parameter("langpair", format!("{}|{}", source, target))
        .with_max_retries(3);

    println!("=== Awaiting a call ===");
    match client.get::<TranslationRecord>(&request).await {
        Ok(record) => {
            println!("Translation: {}", record.response_data.translated_text);
            println!("Confidence: {:?}", record.response_data.confidence);
            println!("API status: {}", record.response_status);
            println!("Attempts: {}, latency: {:?}", record.attempts, record.latency);
        }
        Err(Error::Transport(e)) => eprintln!("Network problem ({}): {}", e.kind(), e),
        Err(Error::Status {
            status,
            raw_response,
        }) => eprintln!("API refused the request ({}): {}", status, raw_response),
        Err(e) => eprintln!("Unusable response: {}", e),
    }
    println!();

    println!("=== Completion callback ===");
    let (tx, rx) = tokio::sync::oneshot::channel();
    client.dispatch(
        Method::Get,
        request,
        move |result: CallResult<TranslationRecord>| {
            let _ = tx.send(result.map(|record| record.data.response_data.translated_text));
        },
    );

    match rx.await {
        Ok(Ok(translated)) => println!("Callback received: {}", translated),
        Ok(Err(e)) => eprintln!("Callback received an error: {}", e),
        Err(_) => eprintln!("Call ended without a result"),
    }

    Ok(())
}
