//! Client-side state layer for the growing note-taking app
//!
//! This crate keeps a client's view of the growing API consistent: it stores
//! the bearer token durably, attaches it to every request, tracks who is
//! signed in, and mirrors the user's notes, categories, and statistics with
//! filter-aware refetching and stale-response protection.
//!
//! ```text
//! host UI (router)
//!       |  Navigator trait
//!       v
//! GrowingClient
//!   +-- SessionManager  -- who is signed in, login/register/logout
//!   +-- NoteStore       -- notes, categories, statistics, filters
//!   +-- Transport       -- bearer header, error mapping, 401 teardown
//!   +-- CredentialStore -- token persisted across restarts
//! ```
//!
//! The host supplies a [`Navigator`] so the client can observe the current
//! route and redirect to the login screen when a credential stops working.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use growing_client::{ClientConfig, GrowingClient, MockNavigator, NoteDraft, Route};
//!
//! # async fn run() -> growing_client::Result<()> {
//! let navigator = Arc::new(MockNavigator::new(Route::Login));
//! let client = GrowingClient::new(ClientConfig::default(), navigator)?;
//! client.start().await;
//!
//! let outcome = client.session().login("ada@example.com", "hunter2").await;
//! if outcome.is_success() {
//!     client
//!         .notes()
//!         .create_note(&NoteDraft::new("Groceries", "oat milk"))
//!         .await;
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod navigator;
pub mod session;
pub mod store;
pub mod transport;
pub mod types;

pub use client::GrowingClient;
pub use config::{ClientConfig, DEFAULT_BASE_URL};
pub use credentials::CredentialStore;
pub use error::{ApiError, Result};
pub use navigator::{MockNavigator, Navigator, Route};
pub use session::{SessionEvent, SessionManager, SessionStatus};
pub use store::NoteStore;
pub use transport::{AuthFailure, Transport};
pub use types::*;
