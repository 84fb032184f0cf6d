//! Session state and the store the rest of the app watches it through.

use serde_derive::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use tokio::sync::watch;

/// The part an account plays in the library.
///
/// This is a closed set. Anything that fails to parse as one of these
/// values must be treated as a plain member by whoever is making the
/// permission decision; nothing outside it ever counts as an admin.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Member,
    Admin,
}

impl Role {
    pub fn is_admin(self) -> bool { self == Role::Admin }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Member => f.write_str("member"),
            Role::Admin => f.write_str("admin"),
        }
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Role, Self::Err> {
        match s {
            "member" => Ok(Role::Member),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// The error returned when parsing a string which isn't `member` or
/// `admin`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Unknown role: {0:?}")]
pub struct UnknownRole(String);

/// Who the server says is logged in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: Role,
}

/// A credential token and the identity it belongs to.
///
/// The two always travel together. A token without an identity (or the
/// other way around) is never a valid session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub token: String,
    pub identity: Identity,
}

impl SessionRecord {
    pub fn new(token: impl Into<String>, identity: Identity) -> Self {
        SessionRecord {
            token: token.into(),
            identity,
        }
    }
}

/// The client's current belief about who is logged in.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub record: Option<SessionRecord>,
    /// Persisted credentials are still being restored. Only ever true
    /// between process start and the end of the bootstrap; no later
    /// operation sets it again.
    pub loading: bool,
}

impl Session {
    pub fn is_authenticated(&self) -> bool { self.record.is_some() }

    pub fn identity(&self) -> Option<&Identity> {
        self.record.as_ref().map(|record| &record.identity)
    }

    pub fn token(&self) -> Option<&str> {
        self.record.as_ref().map(|record| record.token.as_str())
    }
}

/// Shared, watchable session state.
///
/// Everything outside the session manager gets a read-only view: a
/// snapshot from [`SessionStore::current()`], or a receiver from
/// [`SessionStore::subscribe()`] that sees every transition. Mutation
/// stays inside this crate.
#[derive(Debug)]
pub struct SessionStore {
    tx: watch::Sender<Session>,
}

impl SessionStore {
    /// A store in its pre-bootstrap state: nobody logged in, still
    /// loading.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Session {
            record: None,
            loading: true,
        });
        SessionStore { tx }
    }

    /// A snapshot of the session as it is right now.
    pub fn current(&self) -> Session { self.tx.borrow().clone() }

    /// Subscribe to session transitions.
    pub fn subscribe(&self) -> watch::Receiver<Session> { self.tx.subscribe() }

    pub(crate) fn set_record(&self, record: SessionRecord) {
        self.tx.send_modify(|session| session.record = Some(record));
    }

    pub(crate) fn clear(&self) {
        self.tx.send_modify(|session| session.record = None);
    }

    pub(crate) fn finish_loading(&self) {
        self.tx.send_modify(|session| session.loading = false);
    }
}

impl Default for SessionStore {
    fn default() -> Self { SessionStore::new() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Identity {
        Identity {
            id: String::from("42"),
            username: String::from("alice"),
            email: String::from("alice@example.com"),
            role: Role::Member,
        }
    }

    #[test]
    fn roles_round_trip_as_lowercase_strings() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(
            serde_json::from_str::<Role>("\"member\"").unwrap(),
            Role::Member
        );
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
    }

    #[test]
    fn made_up_roles_never_parse() {
        let err = "librarian".parse::<Role>().unwrap_err();
        assert_eq!(err, UnknownRole(String::from("librarian")));
        assert!(serde_json::from_str::<Role>("\"librarian\"").is_err());
    }

    #[test]
    fn a_new_store_is_empty_and_loading() {
        let store = SessionStore::new();
        let session = store.current();

        assert!(!session.is_authenticated());
        assert!(session.loading);
        assert_eq!(session.identity(), None);
        assert_eq!(session.token(), None);
    }

    #[test]
    fn token_and_identity_travel_together() {
        let store = SessionStore::new();

        store.set_record(SessionRecord::new("tok-123", alice()));
        let session = store.current();
        assert_eq!(session.token(), Some("tok-123"));
        assert_eq!(session.identity(), Some(&alice()));

        store.clear();
        let session = store.current();
        assert_eq!(session.token(), None);
        assert_eq!(session.identity(), None);
    }

    #[test]
    fn subscribers_see_every_transition() {
        let store = SessionStore::new();
        let mut rx = store.subscribe();

        store.set_record(SessionRecord::new("tok-123", alice()));
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_authenticated());

        store.finish_loading();
        assert!(rx.has_changed().unwrap());
        assert!(!rx.borrow_and_update().loading);
    }
}
