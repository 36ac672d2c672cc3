//! HTTP client wrapper for downloading from the archive API.

use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;

use crate::config::HTTP_TIMEOUT_SECS;
use crate::error::{HarvesterError, Result};

/// User agent string identifying this harvester.
const USER_AGENT: &str = concat!("zettel-harvester/", env!("CARGO_PKG_VERSION"));

/// Create a configured HTTP client.
///
/// The client is cheap to clone and is shared by all download workers.
pub fn create_client() -> Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// Download content from a URL with retry logic.
///
/// Server errors (5xx) and connection/timeout errors are retried up to
/// `attempts` times with exponential backoff starting at `base_delay`.
/// Client errors (4xx) and other request errors fail immediately.
pub fn download_bytes(
    client: &Client,
    url: &str,
    attempts: u32,
    base_delay: Duration,
) -> Result<Vec<u8>> {
    let mut last_error: Option<String> = None;

    for attempt in 0..attempts {
        if attempt > 0 {
            let delay = base_delay * (1 << (attempt - 1).min(16));
            tracing::debug!(url, attempt, delay_ms = delay.as_millis() as u64, "Retrying after delay");
            thread::sleep(delay);
        }

        match client.get(url).send() {
            Ok(response) => {
                let status = response.status();

                if status.is_server_error() {
                    tracing::warn!(
                        url,
                        status = %status,
                        attempt = attempt + 1,
                        max_attempts = attempts,
                        "Server error, will retry"
                    );
                    last_error = Some(format!("Server error: {status}"));
                    continue;
                }

                // 4xx won't succeed on retry
                let response = response.error_for_status()?;
                let bytes = response.bytes()?;
                return Ok(bytes.to_vec());
            }
            Err(e) => {
                if e.is_connect() || e.is_timeout() {
                    tracing::warn!(
                        url,
                        error = %e,
                        attempt = attempt + 1,
                        max_attempts = attempts,
                        "Connection error, will retry"
                    );
                    last_error = Some(e.to_string());
                    continue;
                }
                return Err(HarvesterError::Http(e));
            }
        }
    }

    Err(HarvesterError::RetriesExhausted {
        attempts,
        message: last_error.unwrap_or_else(|| "Unknown error".to_string()),
    })
}
