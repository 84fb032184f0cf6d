use crate::endpoints::ApiError;
use crate::session::Identity;
use reqwest::Client;

/// Ask the server who the bearer of `token` is.
///
/// This is the bootstrap's verification step. A 401 here is the server
/// confirming the stored token is no longer any good, which is a very
/// different thing from not getting an answer at all.
pub async fn me(
    client: &Client,
    base_url: &str,
    token: &str,
) -> Result<Identity, ApiError> {
    let url = super::endpoint_url(base_url, "auth/me");
    log::debug!("Sending an identity request to {}", url);

    let response = super::dispatch(client.get(&url).bearer_auth(token)).await?;

    let body = response.text().await?;
    log::trace!("Response: {}", body);

    let identity: Identity = serde_json::from_str(&body)?;
    Ok(identity)
}
