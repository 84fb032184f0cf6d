//! The durable half of the session.
//!
//! A session survives restarts as two files under a caller-chosen
//! directory: the opaque token, and the identity serialized as JSON. The
//! pair is all-or-nothing; a half-present or unparseable pair reads as an
//! error so the caller can purge it instead of restoring a broken session.

use crate::session::{Identity, SessionRecord};
use std::{
    fs, io,
    path::{Path, PathBuf},
};

const TOKEN_FILE: &str = "token";
const IDENTITY_FILE: &str = "identity.json";

/// On-disk storage for the persisted session record.
#[derive(Debug, Clone, PartialEq)]
pub struct CredentialsFile {
    dir: PathBuf,
}

impl CredentialsFile {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        CredentialsFile { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path { &self.dir }

    /// Read the persisted record.
    ///
    /// `Ok(None)` means nothing is stored. Anything half-present or
    /// unparseable is an error, and callers are expected to
    /// [`CredentialsFile::purge()`] on it.
    pub fn load(&self) -> Result<Option<SessionRecord>, PersistError> {
        let token = read_optional(&self.dir.join(TOKEN_FILE))?;
        let identity = read_optional(&self.dir.join(IDENTITY_FILE))?;

        match (token, identity) {
            (None, None) => Ok(None),
            (Some(token), Some(identity)) => {
                let token = token.trim().to_string();
                if token.is_empty() {
                    return Err(PersistError::Incomplete);
                }

                let identity: Identity = serde_json::from_str(&identity)?;
                Ok(Some(SessionRecord { token, identity }))
            },
            _ => Err(PersistError::Incomplete),
        }
    }

    /// Write both halves of the record, creating the directory if needed.
    pub fn store(&self, record: &SessionRecord) -> Result<(), PersistError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.dir.join(TOKEN_FILE), &record.token)?;

        let identity = serde_json::to_string(&record.identity)?;
        fs::write(self.dir.join(IDENTITY_FILE), identity)?;

        Ok(())
    }

    /// Remove whatever is stored. Purging an absent record is fine.
    pub fn purge(&self) -> Result<(), PersistError> {
        remove_if_present(&self.dir.join(TOKEN_FILE))?;
        remove_if_present(&self.dir.join(IDENTITY_FILE))?;
        Ok(())
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, PersistError> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn remove_if_present(path: &Path) -> Result<(), PersistError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// The ways reading or writing the persisted record can fail.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("Unable to access the credentials directory")]
    Io(#[from] io::Error),
    #[error("The stored identity is not valid JSON")]
    Parse(#[from] serde_json::Error),
    /// Only one half of the record exists, or the token is blank.
    #[error("The stored session is incomplete")]
    Incomplete,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Role;

    fn alice() -> Identity {
        Identity {
            id: String::from("42"),
            username: String::from("alice"),
            email: String::from("alice@example.com"),
            role: Role::Member,
        }
    }

    #[test]
    fn a_record_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialsFile::new(dir.path());
        let record = SessionRecord::new("tok-123", alice());

        store.store(&record).unwrap();
        let loaded = store.load().unwrap();

        assert_eq!(loaded, Some(record));
    }

    #[test]
    fn an_empty_directory_is_just_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialsFile::new(dir.path());

        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn a_missing_directory_is_also_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialsFile::new(dir.path().join("never-created"));

        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn a_token_without_an_identity_is_incomplete() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(TOKEN_FILE), "tok-123").unwrap();

        let err = CredentialsFile::new(dir.path()).load().unwrap_err();
        assert!(matches!(err, PersistError::Incomplete));
    }

    #[test]
    fn a_blank_token_is_incomplete() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialsFile::new(dir.path());
        store.store(&SessionRecord::new("tok-123", alice())).unwrap();
        fs::write(dir.path().join(TOKEN_FILE), "  \n").unwrap();

        let err = store.load().unwrap_err();
        assert!(matches!(err, PersistError::Incomplete));
    }

    #[test]
    fn a_corrupt_identity_is_an_error_not_a_session() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(TOKEN_FILE), "tok-123").unwrap();
        fs::write(dir.path().join(IDENTITY_FILE), "{\"id\": 42,").unwrap();

        let err = CredentialsFile::new(dir.path()).load().unwrap_err();
        assert!(matches!(err, PersistError::Parse(_)));
    }

    #[test]
    fn purging_removes_both_halves_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialsFile::new(dir.path());
        store.store(&SessionRecord::new("tok-123", alice())).unwrap();

        store.purge().unwrap();
        assert!(!dir.path().join(TOKEN_FILE).exists());
        assert!(!dir.path().join(IDENTITY_FILE).exists());

        store.purge().unwrap();
    }
}
