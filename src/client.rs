//! Top-level client facade

use std::sync::Arc;

use crate::config::ClientConfig;
use crate::credentials::CredentialStore;
use crate::error::Result;
use crate::navigator::Navigator;
use crate::session::SessionManager;
use crate::store::NoteStore;
use crate::transport::Transport;

/// Everything the note-taking client needs, wired together
///
/// Construction is cheap and synchronous apart from reading the credential
/// file; [`start`](Self::start) connects the components and settles the
/// initial session state.
///
/// ```no_run
/// use std::sync::Arc;
/// use growing_client::{ClientConfig, GrowingClient, MockNavigator, Route};
///
/// # async fn run() -> growing_client::Result<()> {
/// let navigator = Arc::new(MockNavigator::new(Route::Login));
/// let client = GrowingClient::new(ClientConfig::default(), navigator)?;
/// client.start().await;
///
/// let outcome = client.session().login("ada@example.com", "hunter2").await;
/// if outcome.is_success() {
///     for note in client.notes().notes().await {
///         println!("{}: {}", note.id, note.title);
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct GrowingClient {
    config: ClientConfig,
    credentials: Arc<CredentialStore>,
    transport: Transport,
    session: SessionManager,
    notes: Arc<NoteStore>,
}

impl GrowingClient {
    /// Build the client against the host application's router
    pub fn new(config: ClientConfig, navigator: Arc<dyn Navigator>) -> Result<Self> {
        let credentials = Arc::new(CredentialStore::open(config.credentials_file()?)?);
        let transport = Transport::new(&config, Arc::clone(&credentials), navigator)?;
        let session = SessionManager::new(transport.clone(), Arc::clone(&credentials));
        let notes = Arc::new(NoteStore::new(
            transport.clone(),
            Arc::clone(&credentials),
        ));

        Ok(Self {
            config,
            credentials,
            transport,
            session,
            notes,
        })
    }

    /// Connect the components and settle the initial session
    ///
    /// The note store subscribes to session events before the session is
    /// initialized, so a restored session loads the collections right away.
    pub async fn start(&self) {
        Arc::clone(&self.notes).attach_session(&self.session);
        self.session.initialize().await;
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn notes(&self) -> &NoteStore {
        &self.notes
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigator::{MockNavigator, Route};
    use crate::session::SessionStatus;

    #[tokio::test]
    async fn test_builds_and_settles_without_a_credential() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 1,
            credentials_path: Some(dir.path().join("token")),
        };
        let navigator = Arc::new(MockNavigator::new(Route::Login));

        let client = GrowingClient::new(config, navigator).unwrap();
        client.start().await;

        assert_eq!(client.session().status().await, SessionStatus::Unauthenticated);
        assert!(client.notes().notes().await.is_empty());
    }
}
