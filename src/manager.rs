//! The session manager. Every identity transition goes through here.

use crate::{
    endpoints::{self, ApiError, Registration},
    persist::CredentialsFile,
    session::{Identity, SessionRecord, SessionStore},
};
use reqwest::Client;
use tokio::sync::OnceCell;
use url::Url;

/// Owns the session: restores it at startup, changes it on login,
/// registration, and logout, and never lets anything else write it.
///
/// The only two things that end an authenticated session are an explicit
/// [`SessionManager::logout()`] and the server answering 401 to the
/// bootstrap verification. A server we merely cannot reach changes
/// nothing.
pub struct SessionManager {
    client: Client,
    base_url: Url,
    credentials: CredentialsFile,
    session: SessionStore,
    bootstrapped: OnceCell<()>,
}

impl SessionManager {
    pub fn new(
        client: Client,
        base_url: Url,
        credentials: CredentialsFile,
    ) -> Self {
        SessionManager {
            client,
            base_url,
            credentials,
            session: SessionStore::new(),
            bootstrapped: OnceCell::new(),
        }
    }

    /// Read-only access to the session everybody else watches.
    pub fn session(&self) -> &SessionStore { &self.session }

    /// Restore and verify any persisted session.
    ///
    /// Runs once per manager; later calls, including concurrent ones,
    /// just wait for the first run to finish. A stored record is trusted
    /// immediately so the app is usable before (and without) a round
    /// trip, then checked against the server in the same call.
    pub async fn bootstrap(&self) {
        self.bootstrapped
            .get_or_init(|| async {
                self.restore_persisted_session().await;
            })
            .await;
    }

    async fn restore_persisted_session(&self) {
        match self.credentials.load() {
            Ok(None) => {
                log::debug!("No persisted session to restore");
            },
            Err(err) => {
                log::warn!(
                    "Discarding an unreadable persisted session: {}",
                    err
                );
                self.drop_persisted_record();
                self.session.clear();
            },
            Ok(Some(record)) => {
                log::info!(
                    "Restoring the session for {}",
                    record.identity.username
                );
                self.session.set_record(record.clone());
                self.verify_restored_session(&record).await;
            },
        }

        self.session.finish_loading();
    }

    async fn verify_restored_session(&self, record: &SessionRecord) {
        let verified = endpoints::me(
            &self.client,
            self.base_url.as_str(),
            &record.token,
        )
        .await;

        match verified {
            Ok(identity) => {
                let refreshed =
                    SessionRecord::new(record.token.clone(), identity);
                if let Err(err) = self.credentials.store(&refreshed) {
                    log::warn!(
                        "Unable to rewrite the persisted session: {}",
                        err
                    );
                }
                self.session.set_record(refreshed);
            },
            Err(err) if err.is_unauthorized() => {
                log::info!("The stored token is no longer valid, logging out");
                self.drop_persisted_record();
                self.session.clear();
            },
            Err(err) => {
                // Couldn't reach the server, or it answered nonsense. The
                // restored session stands until the server itself says the
                // token is bad.
                log::warn!("Couldn't verify the restored session: {}", err);
            },
        }
    }

    /// Exchange credentials for an authenticated session.
    ///
    /// On success the record is persisted and the store updated; on any
    /// failure both are left exactly as they were. Field validation
    /// (non-empty inputs, password length) is the calling form's job.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, ApiError> {
        let response = endpoints::login(
            &self.client,
            self.base_url.as_str(),
            email,
            password,
        )
        .await?;

        Ok(self.establish(response.into_record()))
    }

    /// Create an account and log straight into it. Same contract as
    /// [`SessionManager::login()`].
    pub async fn register(
        &self,
        registration: &Registration<'_>,
    ) -> Result<Identity, ApiError> {
        let response = endpoints::register(
            &self.client,
            self.base_url.as_str(),
            registration,
        )
        .await?;

        Ok(self.establish(response.into_record()))
    }

    fn establish(&self, record: SessionRecord) -> Identity {
        if let Err(err) = self.credentials.store(&record) {
            // The in-memory session still counts; it just won't survive a
            // restart.
            log::warn!("The session was established but not persisted: {}", err);
        }

        let identity = record.identity.clone();
        self.session.set_record(record);
        identity
    }

    /// End the session. Local only: nothing is sent to the server, and
    /// this cannot fail.
    pub fn logout(&self) {
        self.drop_persisted_record();
        self.session.clear();
        log::info!("Logged out");
    }

    fn drop_persisted_record(&self) {
        if let Err(err) = self.credentials.purge() {
            log::warn!("Unable to remove the persisted session: {}", err);
        }
    }
}
