//! The client-side session and connectivity core of the Librarium
//! library-management app.
//!
//! The crate owns the authenticated-user lifecycle (login, registration,
//! logout, and the optimistic restore performed at startup) plus the
//! connection-health probe that tells "the server rejected this" apart from
//! "the server is unreachable". Everything else in the app holds a
//! read-only view of the [`Session`] through the [`SessionStore`].

#![forbid(unsafe_code)]

#[cfg(test)]
#[macro_use]
extern crate pretty_assertions;

mod connectivity;
pub mod endpoints;
mod manager;
mod persist;
mod session;

pub use connectivity::{
    probe, probe_with_timeout, ConnectivityResult, PROBE_TIMEOUT,
};
pub use manager::SessionManager;
pub use persist::{CredentialsFile, PersistError};
pub use session::{
    Identity, Role, Session, SessionRecord, SessionStore, UnknownRole,
};

use std::time::Duration;

/// The default user agent to use when communicating with the Librarium
/// server.
pub const DEFAULT_USER_AGENT: &str =
    concat!(env!("CARGO_PKG_NAME"), "-", env!("CARGO_PKG_VERSION"));

/// The timeout applied to general API calls by [`default_client()`]. The
/// liveness probe uses the shorter [`PROBE_TIMEOUT`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the HTTP client the rest of the crate expects: the crate user
/// agent and the ten second request timeout.
pub fn default_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(DEFAULT_USER_AGENT)
        .timeout(DEFAULT_TIMEOUT)
        .build()
}
