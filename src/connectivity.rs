//! Backend reachability probing.

use crate::endpoints::{self, ApiError};
use reqwest::Client;
use std::time::Duration;

/// How long [`probe()`] waits for the health endpoint.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// What a probe found out, in a form fit for showing to a person.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectivityResult {
    pub connected: bool,
    pub diagnostic: String,
}

/// Check whether the backend is up and answering sensibly.
///
/// A plain query: no retries, no caching, no state. Callers decide what
/// to do with a negative answer.
pub async fn probe(client: &Client, base_url: &str) -> ConnectivityResult {
    probe_with_timeout(client, base_url, PROBE_TIMEOUT).await
}

/// [`probe()`] with a caller-chosen bound instead of [`PROBE_TIMEOUT`].
pub async fn probe_with_timeout(
    client: &Client,
    base_url: &str,
    timeout: Duration,
) -> ConnectivityResult {
    match endpoints::health(client, base_url, timeout).await {
        Ok(()) => ConnectivityResult {
            connected: true,
            diagnostic: String::from("The backend server is running"),
        },
        Err(err) => {
            log::debug!("The probe failed: {}", err);

            ConnectivityResult {
                connected: false,
                diagnostic: diagnose(&err),
            }
        },
    }
}

/// Map a failed health call onto a message the user can act on.
fn diagnose(err: &ApiError) -> String {
    match err {
        ApiError::BadBody(_) | ApiError::UnexpectedResponse => {
            String::from("The server responded but with unexpected data")
        },
        // Timeout and transport failures already render as the
        // connectivity diagnostics; rejections carry the server's words.
        other => other.to_string(),
    }
}
