//! Client-side note collections
//!
//! [`NoteStore`] mirrors the server's notes, categories, and statistics and
//! keeps the mirror consistent across mutations. Reads are wholesale: a
//! refetch replaces the matching collection. Mutations reconcile locally
//! first (prepend, replace, remove) and refetch only what the server alone
//! can compute, which keeps the UI responsive without a full reload per edit.
//!
//! Every fetch carries a generation number per collection. Local surgery and
//! newer fetches bump the generation, and a response whose generation is no
//! longer current is discarded, so a slow reply can never overwrite newer
//! state.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tracing::{debug, error, info};

use crate::credentials::CredentialStore;
use crate::error::Result;
use crate::session::{SessionEvent, SessionManager};
use crate::transport::Transport;
use crate::types::{
    Category, FilterUpdate, Note, NoteDraft, NoteFilters, NoteStats, OpOutcome,
};

/// Failure message for mutations attempted without a credential
const SIGNED_OUT_MESSAGE: &str = "Not signed in";

#[derive(Debug, Default)]
struct StoreState {
    notes: Vec<Note>,
    categories: Vec<Category>,
    stats: Option<NoteStats>,
    filters: NoteFilters,
    loading: bool,
}

/// One counter per fetch target
#[derive(Debug, Default)]
struct FetchGenerations {
    notes: AtomicU64,
    categories: AtomicU64,
    stats: AtomicU64,
}

/// Synchronized mirror of the signed-in user's notes
pub struct NoteStore {
    transport: Transport,
    credentials: Arc<CredentialStore>,
    state: RwLock<StoreState>,
    generations: FetchGenerations,
    listener_spawned: AtomicBool,
}

impl NoteStore {
    pub fn new(transport: Transport, credentials: Arc<CredentialStore>) -> Self {
        Self {
            transport,
            credentials,
            state: RwLock::new(StoreState::default()),
            generations: FetchGenerations::default(),
            listener_spawned: AtomicBool::new(false),
        }
    }

    /// Reload collections when a session is established
    ///
    /// Takes the store by `Arc` because the listener task outlives the call.
    /// Logout leaves the collections in place; the next session's refresh
    /// replaces them wholesale.
    pub fn attach_session(self: Arc<Self>, session: &SessionManager) {
        if self.listener_spawned.swap(true, Ordering::SeqCst) {
            return;
        }

        let mut events = session.subscribe();

        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(SessionEvent::Authenticated) => {
                        info!("session established, loading collections");
                        self.refresh_all().await;
                    }
                    Ok(SessionEvent::LoggedOut) => {}
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    // ==================== Snapshots ====================

    /// Notes matching the active filters, as last fetched
    pub async fn notes(&self) -> Vec<Note> {
        self.state.read().await.notes.clone()
    }

    pub async fn categories(&self) -> Vec<Category> {
        self.state.read().await.categories.clone()
    }

    pub async fn stats(&self) -> Option<NoteStats> {
        self.state.read().await.stats.clone()
    }

    pub async fn filters(&self) -> NoteFilters {
        self.state.read().await.filters.clone()
    }

    /// Whether a notes fetch is in flight
    pub async fn is_loading(&self) -> bool {
        self.state.read().await.loading
    }

    // ==================== Fetches ====================

    /// Replace the notes collection with the server's answer for the active
    /// filters
    ///
    /// A failed fetch keeps the previous notes. A response superseded by a
    /// newer fetch or a local edit is discarded.
    pub async fn refetch_notes(&self) {
        if !self.credentials.is_present().await {
            return;
        }

        let generation = self.generations.notes.fetch_add(1, Ordering::SeqCst) + 1;
        let filters = {
            let mut state = self.state.write().await;
            state.loading = true;
            state.filters.clone()
        };

        let result = self.transport.list_notes(&filters).await;

        let mut state = self.state.write().await;
        state.loading = false;
        if self.generations.notes.load(Ordering::SeqCst) != generation {
            debug!("discarding stale notes response");
            return;
        }
        match result {
            Ok(notes) => {
                debug!(count = notes.len(), "notes loaded");
                state.notes = notes;
            }
            Err(e) => error!(error = %e, "notes fetch failed"),
        }
    }

    pub async fn refetch_categories(&self) {
        if !self.credentials.is_present().await {
            return;
        }

        let generation = self.generations.categories.fetch_add(1, Ordering::SeqCst) + 1;
        let result = self.transport.list_categories().await;

        let mut state = self.state.write().await;
        if self.generations.categories.load(Ordering::SeqCst) != generation {
            debug!("discarding stale categories response");
            return;
        }
        match result {
            Ok(categories) => state.categories = categories,
            Err(e) => error!(error = %e, "categories fetch failed"),
        }
    }

    pub async fn refetch_stats(&self) {
        if !self.credentials.is_present().await {
            return;
        }

        let generation = self.generations.stats.fetch_add(1, Ordering::SeqCst) + 1;
        let result = self.transport.fetch_stats().await;

        let mut state = self.state.write().await;
        if self.generations.stats.load(Ordering::SeqCst) != generation {
            debug!("discarding stale stats response");
            return;
        }
        match result {
            Ok(stats) => state.stats = Some(stats),
            Err(e) => error!(error = %e, "stats fetch failed"),
        }
    }

    /// Refetch notes, categories, and statistics together
    pub async fn refresh_all(&self) {
        tokio::join!(
            self.refetch_notes(),
            self.refetch_categories(),
            self.refetch_stats(),
        );
    }

    /// Newest unarchived notes across all filters, for dashboard previews
    pub async fn fetch_recent_notes(&self, limit: usize) -> Result<Vec<Note>> {
        if !self.credentials.is_present().await {
            return Ok(Vec::new());
        }
        let notes = self.transport.list_all_notes().await?;
        Ok(newest_active(notes, limit))
    }

    // ==================== Filters ====================

    /// Merge a filter change and refetch notes under the new filters
    pub async fn set_filters(&self, update: FilterUpdate) {
        {
            let mut state = self.state.write().await;
            update.apply(&mut state.filters);
            debug!(filters = ?state.filters, "filters changed");
        }
        self.refetch_notes().await;
    }

    /// Drop all restrictions, keeping only the archived flag
    pub async fn reset_filters(&self, is_archived: bool) {
        {
            let mut state = self.state.write().await;
            state.filters = NoteFilters::archived(is_archived);
        }
        self.refetch_notes().await;
    }

    // ==================== Note mutations ====================

    /// Create a note and prepend it to the collection
    ///
    /// Servers reply with the created note, with only its id (fetched as a
    /// follow-up), or with nothing. Statistics are refetched because creation
    /// changes counts the client cannot derive.
    pub async fn create_note(&self, draft: &NoteDraft) -> OpOutcome {
        if !self.credentials.is_present().await {
            return OpOutcome::failed(SIGNED_OUT_MESSAGE);
        }

        let reply = match self.transport.create_note(draft).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(error = %e, "note creation failed");
                return OpOutcome::failed(e.user_message("Failed to create note"));
            }
        };

        let created = match reply.note {
            Some(note) => Some(note),
            None => match reply.note_id {
                Some(id) => match self.transport.get_note(id).await {
                    Ok(note) => Some(note),
                    Err(e) => {
                        error!(error = %e, note_id = id, "could not load the created note");
                        return OpOutcome::failed(e.user_message("Failed to create note"));
                    }
                },
                None => None,
            },
        };

        if let Some(note) = created {
            let mut state = self.state.write().await;
            self.generations.notes.fetch_add(1, Ordering::SeqCst);
            state.notes.insert(0, note);
        }

        self.refetch_stats().await;
        OpOutcome::ok()
    }

    /// Update a note in place
    ///
    /// When the server echoes the updated note it replaces the local copy;
    /// otherwise the draft fields are merged in and the joined category name
    /// stays as it was until the next refetch.
    pub async fn update_note(&self, id: i64, draft: &NoteDraft) -> OpOutcome {
        if !self.credentials.is_present().await {
            return OpOutcome::failed(SIGNED_OUT_MESSAGE);
        }

        match self.transport.update_note(id, draft).await {
            Ok(reply) => {
                let mut state = self.state.write().await;
                self.generations.notes.fetch_add(1, Ordering::SeqCst);
                match reply.note {
                    Some(updated) => {
                        if let Some(slot) = state.notes.iter_mut().find(|n| n.id == id) {
                            *slot = updated;
                        }
                    }
                    None => {
                        if let Some(slot) = state.notes.iter_mut().find(|n| n.id == id) {
                            slot.title = draft.title.clone();
                            slot.content = draft.content.clone();
                            slot.category_id = draft.category_id;
                        }
                    }
                }
                OpOutcome::ok()
            }
            Err(e) => {
                error!(error = %e, note_id = id, "note update failed");
                OpOutcome::failed(e.user_message("Failed to update note"))
            }
        }
    }

    pub async fn delete_note(&self, id: i64) -> OpOutcome {
        if !self.credentials.is_present().await {
            return OpOutcome::failed(SIGNED_OUT_MESSAGE);
        }

        if let Err(e) = self.transport.delete_note(id).await {
            error!(error = %e, note_id = id, "note deletion failed");
            return OpOutcome::failed(e.user_message("Failed to delete note"));
        }

        {
            let mut state = self.state.write().await;
            self.generations.notes.fetch_add(1, Ordering::SeqCst);
            state.notes.retain(|n| n.id != id);
        }
        self.refetch_stats().await;
        OpOutcome::ok()
    }

    /// Archive a note, removing it from the active view
    pub async fn archive_note(&self, id: i64) -> OpOutcome {
        if !self.credentials.is_present().await {
            return OpOutcome::failed(SIGNED_OUT_MESSAGE);
        }

        if let Err(e) = self.transport.archive_note(id).await {
            error!(error = %e, note_id = id, "note archive failed");
            return OpOutcome::failed(e.user_message("Failed to archive note"));
        }

        {
            let mut state = self.state.write().await;
            // The note leaves this collection only when the archived view
            // is not the one being shown.
            if !state.filters.is_archived {
                self.generations.notes.fetch_add(1, Ordering::SeqCst);
                state.notes.retain(|n| n.id != id);
            }
        }
        self.refetch_stats().await;
        OpOutcome::ok()
    }

    /// Restore an archived note, removing it from the archived view
    pub async fn unarchive_note(&self, id: i64) -> OpOutcome {
        if !self.credentials.is_present().await {
            return OpOutcome::failed(SIGNED_OUT_MESSAGE);
        }

        if let Err(e) = self.transport.unarchive_note(id).await {
            error!(error = %e, note_id = id, "note unarchive failed");
            return OpOutcome::failed(e.user_message("Failed to unarchive note"));
        }

        {
            let mut state = self.state.write().await;
            if state.filters.is_archived {
                self.generations.notes.fetch_add(1, Ordering::SeqCst);
                state.notes.retain(|n| n.id != id);
            }
        }
        self.refetch_stats().await;
        OpOutcome::ok()
    }

    // ==================== Category mutations ====================

    pub async fn create_category(&self, name: &str) -> OpOutcome {
        if !self.credentials.is_present().await {
            return OpOutcome::failed(SIGNED_OUT_MESSAGE);
        }

        if let Err(e) = self.transport.create_category(name).await {
            error!(error = %e, "category creation failed");
            return OpOutcome::failed(e.user_message("Failed to create category"));
        }
        self.refetch_categories().await;
        OpOutcome::ok()
    }

    pub async fn update_category(&self, id: i64, name: &str) -> OpOutcome {
        if !self.credentials.is_present().await {
            return OpOutcome::failed(SIGNED_OUT_MESSAGE);
        }

        if let Err(e) = self.transport.update_category(id, name).await {
            error!(error = %e, category_id = id, "category update failed");
            return OpOutcome::failed(e.user_message("Failed to update category"));
        }
        self.refetch_categories().await;
        OpOutcome::ok()
    }

    pub async fn delete_category(&self, id: i64) -> OpOutcome {
        if !self.credentials.is_present().await {
            return OpOutcome::failed(SIGNED_OUT_MESSAGE);
        }

        if let Err(e) = self.transport.delete_category(id).await {
            error!(error = %e, category_id = id, "category deletion failed");
            return OpOutcome::failed(e.user_message("Failed to delete category"));
        }
        self.refetch_categories().await;
        OpOutcome::ok()
    }
}

/// Newest-first unarchived notes, at most `limit`
fn newest_active(mut notes: Vec<Note>, limit: usize) -> Vec<Note> {
    notes.retain(|n| !n.is_archived);
    notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    notes.truncate(limit);
    notes
}
