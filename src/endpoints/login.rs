use crate::endpoints::{ApiError, AuthResponse};
use reqwest::Client;
use serde_derive::Serialize;
use std::fmt::{self, Debug, Formatter};

/// Exchange credentials for a token and the identity behind it.
///
/// Input checks (non-empty fields, password length) belong to the calling
/// form; the server gets whatever was passed and has the final say.
pub async fn login(
    client: &Client,
    base_url: &str,
    email: &str,
    password: &str,
) -> Result<AuthResponse, ApiError> {
    let data = Data { email, password };
    let response = super::post(client, base_url, "auth/login", &data).await?;

    let body = response.text().await?;
    log::trace!("Response: {}", body);

    let parsed: AuthResponse = serde_json::from_str(&body)?;
    log::info!("Logged in as {}", parsed.identity.username);

    Ok(parsed)
}

#[derive(Copy, Clone, Serialize)]
struct Data<'a> {
    email: &'a str,
    password: &'a str,
}

// Payloads get logged at trace level; keep the password out of them.
impl Debug for Data<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Data")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}
