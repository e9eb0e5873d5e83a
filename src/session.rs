//! Session lifecycle
//!
//! [`SessionManager`] owns who is signed in. It distinguishes the initial
//! "still checking the stored credential" state from a settled signed-out
//! state, and it serializes competing transitions with a session epoch: every
//! login, registration, logout, and auth failure bumps the epoch, and a
//! profile response issued under an older epoch is discarded instead of
//! clobbering the newer session.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use crate::credentials::CredentialStore;
use crate::transport::{AuthFailure, Transport};
use crate::types::{AuthPayload, OpOutcome, User};

/// Where the session currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Stored credential is still being checked
    Loading,
    /// No user; login or registration required
    Unauthenticated,
    /// A user is signed in
    Authenticated,
}

/// Session transitions other components react to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A user just became signed in
    Authenticated,
    /// The session ended, by logout or by a rejected credential
    LoggedOut,
}

#[derive(Debug)]
struct SessionState {
    user: Option<User>,
    loading: bool,
}

/// Tracks the signed-in user and runs auth flows
pub struct SessionManager {
    transport: Transport,
    credentials: Arc<CredentialStore>,
    state: Arc<RwLock<SessionState>>,
    /// Bumped on every session transition; stale profile replies check it
    epoch: Arc<AtomicU64>,
    events: broadcast::Sender<SessionEvent>,
    listener_spawned: AtomicBool,
}

impl SessionManager {
    pub fn new(transport: Transport, credentials: Arc<CredentialStore>) -> Self {
        let (events, _) = broadcast::channel(8);
        Self {
            transport,
            credentials,
            state: Arc::new(RwLock::new(SessionState {
                user: None,
                loading: true,
            })),
            epoch: Arc::new(AtomicU64::new(0)),
            events,
            listener_spawned: AtomicBool::new(false),
        }
    }

    /// Receive session transitions
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn user(&self) -> Option<User> {
        self.state.read().await.user.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.loading
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.user.is_some()
    }

    pub async fn status(&self) -> SessionStatus {
        let state = self.state.read().await;
        if state.loading {
            SessionStatus::Loading
        } else if state.user.is_some() {
            SessionStatus::Authenticated
        } else {
            SessionStatus::Unauthenticated
        }
    }

    /// Settle the initial session state from the stored credential
    ///
    /// Without a credential the session settles as unauthenticated without
    /// touching the network; with one, the profile endpoint decides.
    pub async fn initialize(&self) {
        self.spawn_auth_failure_listener();

        if !self.credentials.is_present().await {
            debug!("no stored credential");
            let mut state = self.state.write().await;
            state.user = None;
            state.loading = false;
            return;
        }

        self.refresh_profile().await;
    }

    /// Fetch the profile for the current credential and update the session
    ///
    /// A reply that raced with a newer login or logout is discarded. A
    /// rejected credential signs the session out; a network or server error
    /// keeps whatever user was already loaded.
    pub async fn refresh_profile(&self) {
        let issued = self.epoch.load(Ordering::SeqCst);
        let result = self.transport.fetch_profile().await;

        let mut state = self.state.write().await;
        state.loading = false;
        if self.epoch.load(Ordering::SeqCst) != issued {
            debug!("discarding stale profile response");
            return;
        }

        match result {
            Ok(user) => {
                let newly = state.user.is_none();
                info!(user_id = user.id, username = %user.username, "profile loaded");
                state.user = Some(user);
                drop(state);
                if newly {
                    let _ = self.events.send(SessionEvent::Authenticated);
                }
            }
            Err(e) if e.is_unauthorized() => {
                warn!("stored credential rejected, signing out");
                state.user = None;
                drop(state);
                self.credentials.clear().await;
            }
            Err(e) => {
                warn!(error = %e, "profile fetch failed, keeping session state");
            }
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> OpOutcome {
        match self.transport.login(email, password).await {
            Ok(payload) => {
                self.start_session(payload).await;
                OpOutcome::ok()
            }
            Err(e) => {
                warn!(error = %e, "login failed");
                OpOutcome::failed(e.user_message("Login failed"))
            }
        }
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> OpOutcome {
        match self.transport.register(username, email, password).await {
            Ok(payload) => {
                self.start_session(payload).await;
                OpOutcome::ok()
            }
            Err(e) => {
                warn!(error = %e, "registration failed");
                OpOutcome::failed(e.user_message("Registration failed"))
            }
        }
    }

    /// End the session locally; no remote call, cannot fail
    pub async fn logout(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.credentials.clear().await;

        let had_user = {
            let mut state = self.state.write().await;
            state.loading = false;
            state.user.take().is_some()
        };
        if had_user {
            info!("signed out");
        }
        let _ = self.events.send(SessionEvent::LoggedOut);
    }

    async fn start_session(&self, payload: AuthPayload) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.credentials.set(&payload.token).await;

        info!(user_id = payload.user.id, username = %payload.user.username, "signed in");
        {
            let mut state = self.state.write().await;
            state.user = Some(payload.user);
            state.loading = false;
        }
        let _ = self.events.send(SessionEvent::Authenticated);
    }

    /// Drop the in-memory user when the transport reports a rejected request
    ///
    /// The transport already cleared the credential and redirected; this
    /// keeps the session state and downstream subscribers in step.
    fn spawn_auth_failure_listener(&self) {
        if self.listener_spawned.swap(true, Ordering::SeqCst) {
            return;
        }

        let mut failures = self.transport.subscribe_auth_failures();
        let state = Arc::clone(&self.state);
        let epoch = Arc::clone(&self.epoch);
        let events = self.events.clone();

        tokio::spawn(async move {
            loop {
                match failures.recv().await {
                    Ok(AuthFailure) => {
                        epoch.fetch_add(1, Ordering::SeqCst);
                        let had_user = {
                            let mut state = state.write().await;
                            state.loading = false;
                            state.user.take().is_some()
                        };
                        if had_user {
                            warn!("session ended by an authentication failure");
                            let _ = events.send(SessionEvent::LoggedOut);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }
}
