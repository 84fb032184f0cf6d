//! The Librarium API's endpoints.

mod health;
mod login;
mod me;
mod register;

pub use health::health;
pub use login::login;
pub use me::me;
pub use register::{register, Payment, Registration};

use crate::session::{Identity, SessionRecord};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde_derive::Deserialize;
use std::fmt::Debug;

/// One error type for every way a call to the backend can fail.
///
/// The split that matters is connectivity (no response received at all)
/// versus an answer the server actually gave. The two demand different
/// reactions from the user, and the session bootstrap treats them
/// differently on purpose.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request hit its deadline without a response.
    #[error("Connection timeout. The server may be slow or not responding.")]
    Timeout(#[source] reqwest::Error),
    /// The request never reached the server.
    #[error(
        "Cannot connect to the server. Make sure the backend is running \
         and reachable."
    )]
    Transport(#[source] reqwest::Error),
    /// The server answered 401.
    #[error("{message}")]
    Unauthorized { message: String },
    /// Any other non-2xx answer.
    #[error("{message}")]
    RejectedByServer { status: StatusCode, message: String },
    /// A success response whose body couldn't be parsed.
    #[error("Unable to parse the server's response")]
    BadBody(#[from] serde_json::Error),
    /// A success response without the expected contents.
    #[error("The server responded unexpectedly")]
    UnexpectedResponse,
}

impl ApiError {
    /// No response was received. The server may be down rather than
    /// disagreeing with us, so nothing should be concluded about the
    /// credentials involved.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, ApiError::Timeout(_) | ApiError::Transport(_))
    }

    /// The server itself said the credentials are no good.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::Timeout(err)
        } else {
            ApiError::Transport(err)
        }
    }
}

/// What `login` and `register` answer with when the server accepts.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuthResponse {
    /// The bearer token to attach to authenticated calls.
    pub token: String,
    #[serde(flatten)]
    pub identity: Identity,
}

impl AuthResponse {
    /// The token/identity pair, ready for the store.
    pub fn into_record(self) -> SessionRecord {
        SessionRecord {
            token: self.token,
            identity: self.identity,
        }
    }
}

fn endpoint_url(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}

async fn post<D>(
    client: &Client,
    base_url: &str,
    path: &str,
    data: &D,
) -> Result<Response, ApiError>
where
    D: Debug + Serialize,
{
    let url = endpoint_url(base_url, path);

    log::debug!("Sending a request to {}", url);
    log::trace!("Payload: {:#?}", data);

    dispatch(client.post(&url).json(data)).await
}

async fn dispatch(request: RequestBuilder) -> Result<Response, ApiError> {
    let response = request.send().await?;
    let status = response.status();

    if status.is_success() {
        log::trace!("Headers: {:#?}", response.headers());
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    log::trace!("Error response: {}", body);

    Err(rejection(status, &body))
}

/// Turn a non-2xx answer into the classified error, preferring the
/// server's own `{"message"}` over a canned one.
fn rejection(status: StatusCode, body: &str) -> ApiError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .map(|body| body.message)
        .filter(|message| !message.is_empty());

    if status == StatusCode::UNAUTHORIZED {
        ApiError::Unauthorized {
            message: message.unwrap_or_else(|| String::from("Unauthorized")),
        }
    } else {
        ApiError::RejectedByServer {
            status,
            message: message.unwrap_or_else(|| {
                format!("The server rejected the request ({})", status)
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_servers_message_wins_on_401() {
        let err = rejection(
            StatusCode::UNAUTHORIZED,
            r#"{"message":"Invalid credentials"}"#,
        );

        assert!(err.is_unauthorized());
        assert!(!err.is_connectivity());
        assert_eq!(err.to_string(), "Invalid credentials");
    }

    #[test]
    fn a_bodyless_rejection_falls_back_to_the_status() {
        let err = rejection(StatusCode::INTERNAL_SERVER_ERROR, "");

        assert!(!err.is_unauthorized());
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn non_json_error_bodies_are_tolerated() {
        let err = rejection(StatusCode::BAD_GATEWAY, "<html>Bad Gateway</html>");

        match err {
            ApiError::RejectedByServer { status, .. } => {
                assert_eq!(status, StatusCode::BAD_GATEWAY)
            },
            other => panic!("expected a rejection, got {:?}", other),
        }
    }

    #[test]
    fn base_urls_may_carry_a_trailing_slash() {
        assert_eq!(
            endpoint_url("http://localhost:5000/api/", "auth/login"),
            "http://localhost:5000/api/auth/login"
        );
        assert_eq!(
            endpoint_url("http://localhost:5000/api", "health"),
            "http://localhost:5000/api/health"
        );
    }
}
