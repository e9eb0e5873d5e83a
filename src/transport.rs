//! Authenticated HTTP transport
//!
//! Every remote call in the crate flows through [`Transport`]: it attaches
//! the stored bearer token to outgoing requests, maps error replies onto
//! [`ApiError`], and reacts to 401 replies by clearing the credential and
//! sending the user to the login screen. Auth failures are also broadcast so
//! the session layer can drop its in-memory user.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::credentials::CredentialStore;
use crate::error::{ApiError, Result};
use crate::navigator::{Navigator, Route};
use crate::types::{
    AuthPayload, Category, CreateNoteReply, Note, NoteDraft, NoteFilters, NoteStats,
    UpdateNoteReply, User,
};

/// Notification that a request was rejected with 401 and the session is gone
#[derive(Debug, Clone, Copy)]
pub struct AuthFailure;

/// HTTP client for the growing notes API
#[derive(Clone)]
pub struct Transport {
    http: Client,
    base_url: String,
    credentials: Arc<CredentialStore>,
    navigator: Arc<dyn Navigator>,
    auth_failures: broadcast::Sender<AuthFailure>,
}

impl Transport {
    pub fn new(
        config: &ClientConfig,
        credentials: Arc<CredentialStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let http = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let (auth_failures, _) = broadcast::channel(8);

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials,
            navigator,
            auth_failures,
        })
    }

    /// Receive a notification whenever a 401 tears the session down
    pub fn subscribe_auth_failures(&self) -> broadcast::Receiver<AuthFailure> {
        self.auth_failures.subscribe()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `Authorization` header value for the current credential
    async fn auth_header(&self) -> Option<String> {
        self.credentials
            .get()
            .await
            .map(|token| format!("Bearer {}", token))
    }

    /// Attach the bearer token, send, and map error statuses
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let request = match self.auth_header().await {
            Some(auth) => request.header(header::AUTHORIZATION, auth),
            None => request,
        };
        let response = request.send().await?;
        self.check_status(response).await
    }

    async fn check_status(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = extract_message(&body);

        if status.as_u16() == 401 {
            self.on_unauthorized().await;
            return Err(ApiError::Unauthorized { message });
        }
        Err(ApiError::from_status(status.as_u16(), message))
    }

    /// Session teardown after a 401
    ///
    /// On the login and register screens a 401 is the expected answer to bad
    /// credentials, so nothing is torn down there.
    async fn on_unauthorized(&self) {
        let route = self.navigator.current_route();
        if route.is_unauthenticated_entry() {
            debug!(route = route.path(), "401 on an entry route, no redirect");
            return;
        }

        warn!(route = route.path(), "authentication rejected, clearing session");
        self.credentials.clear().await;
        let _ = self.auth_failures.send(AuthFailure);
        self.navigator.navigate(Route::Login);
    }

    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        Ok(response.json().await?)
    }

    // ==================== Authentication ====================

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthPayload> {
        let request = self
            .http
            .post(self.url("/auth/login"))
            .json(&LoginRequest { email, password });
        let response = self.send(request).await?;
        self.handle_response(response).await
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthPayload> {
        let request = self.http.post(self.url("/auth/register")).json(&RegisterRequest {
            username,
            email,
            password,
        });
        let response = self.send(request).await?;
        self.handle_response(response).await
    }

    pub async fn fetch_profile(&self) -> Result<User> {
        let request = self.http.get(self.url("/auth/profile"));
        let response = self.send(request).await?;
        let envelope: UserEnvelope = self.handle_response(response).await?;
        Ok(envelope.user)
    }

    // ==================== Notes ====================

    /// Notes matching `filters`, as the server orders them
    pub async fn list_notes(&self, filters: &NoteFilters) -> Result<Vec<Note>> {
        let mut params = Vec::new();
        if let Some(category_id) = filters.category_id {
            params.push(format!("categoryId={}", category_id));
        }
        params.push(format!("isArchived={}", filters.is_archived));
        if let Some(range) = filters.date_range {
            params.push(format!("startDate={}", range.start));
            params.push(format!("endDate={}", range.end));
        }

        let mut url = self.url("/notes");
        url.push('?');
        url.push_str(&params.join("&"));

        let response = self.send(self.http.get(url)).await?;
        let envelope: NotesEnvelope = self.handle_response(response).await?;
        Ok(envelope.notes)
    }

    /// All notes regardless of filters, archived included
    pub async fn list_all_notes(&self) -> Result<Vec<Note>> {
        let response = self.send(self.http.get(self.url("/notes"))).await?;
        let envelope: NotesEnvelope = self.handle_response(response).await?;
        Ok(envelope.notes)
    }

    pub async fn get_note(&self, id: i64) -> Result<Note> {
        let request = self.http.get(self.url(&format!("/notes/{}", id)));
        let response = self.send(request).await?;
        let envelope: NoteEnvelope = self.handle_response(response).await?;
        Ok(envelope.note)
    }

    pub async fn create_note(&self, draft: &NoteDraft) -> Result<CreateNoteReply> {
        let request = self.http.post(self.url("/notes")).json(draft);
        let response = self.send(request).await?;
        parse_reply(response).await
    }

    pub async fn update_note(&self, id: i64, draft: &NoteDraft) -> Result<UpdateNoteReply> {
        let request = self.http.put(self.url(&format!("/notes/{}", id))).json(draft);
        let response = self.send(request).await?;
        parse_reply(response).await
    }

    pub async fn delete_note(&self, id: i64) -> Result<()> {
        let request = self.http.delete(self.url(&format!("/notes/{}", id)));
        self.send(request).await?;
        Ok(())
    }

    pub async fn archive_note(&self, id: i64) -> Result<()> {
        let request = self.http.put(self.url(&format!("/notes/{}/archive", id)));
        self.send(request).await?;
        Ok(())
    }

    pub async fn unarchive_note(&self, id: i64) -> Result<()> {
        let request = self.http.put(self.url(&format!("/notes/{}/unarchive", id)));
        self.send(request).await?;
        Ok(())
    }

    // ==================== Statistics ====================

    pub async fn fetch_stats(&self) -> Result<NoteStats> {
        let response = self.send(self.http.get(self.url("/notes/stats"))).await?;
        let envelope: StatsEnvelope = self.handle_response(response).await?;
        Ok(envelope.stats)
    }

    // ==================== Categories ====================

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        let response = self.send(self.http.get(self.url("/categories"))).await?;
        let envelope: CategoriesEnvelope = self.handle_response(response).await?;
        Ok(envelope.categories)
    }

    pub async fn create_category(&self, name: &str) -> Result<()> {
        let request = self
            .http
            .post(self.url("/categories"))
            .json(&CategoryRequest { name });
        self.send(request).await?;
        Ok(())
    }

    pub async fn update_category(&self, id: i64, name: &str) -> Result<()> {
        let request = self
            .http
            .put(self.url(&format!("/categories/{}", id)))
            .json(&CategoryRequest { name });
        self.send(request).await?;
        Ok(())
    }

    pub async fn delete_category(&self, id: i64) -> Result<()> {
        let request = self.http.delete(self.url(&format!("/categories/{}", id)));
        self.send(request).await?;
        Ok(())
    }
}

/// Parse a mutation reply, treating an empty body as the default reply
async fn parse_reply<T: DeserializeOwned + Default>(response: reqwest::Response) -> Result<T> {
    let body = response.text().await?;
    if body.trim().is_empty() {
        return Ok(T::default());
    }
    Ok(serde_json::from_str(&body)?)
}

/// Pull the `message` field out of an error body, if there is one
fn extract_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_default()
}

// ==================== Wire shapes ====================

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct CategoryRequest<'a> {
    name: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct UserEnvelope {
    user: User,
}

#[derive(Deserialize)]
struct NotesEnvelope {
    notes: Vec<Note>,
}

#[derive(Deserialize)]
struct NoteEnvelope {
    note: Note,
}

#[derive(Deserialize)]
struct StatsEnvelope {
    stats: NoteStats,
}

#[derive(Deserialize)]
struct CategoriesEnvelope {
    categories: Vec<Category>,
}
