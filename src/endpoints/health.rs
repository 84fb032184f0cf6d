use crate::endpoints::ApiError;
use reqwest::Client;
use serde_derive::Deserialize;
use std::time::Duration;

const LIVENESS_MARKER: &str = "ok";

/// Hit the liveness endpoint, bounded by `timeout`.
///
/// Succeeds only when the server answers 2xx with `{"status": "ok"}`; a
/// success response saying anything else counts as unexpected.
pub async fn health(
    client: &Client,
    base_url: &str,
    timeout: Duration,
) -> Result<(), ApiError> {
    let url = super::endpoint_url(base_url, "health");
    log::debug!("Sending a health request to {}", url);

    let response = super::dispatch(client.get(&url).timeout(timeout)).await?;

    let body = response.text().await?;
    log::trace!("Response: {}", body);

    let doc: HealthResponse = serde_json::from_str(&body)?;
    if doc.status == LIVENESS_MARKER {
        Ok(())
    } else {
        log::warn!("The health endpoint answered with {:?}", doc.status);
        Err(ApiError::UnexpectedResponse)
    }
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
}
