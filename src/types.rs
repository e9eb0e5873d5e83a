//! Types for the growing notes API

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Domain records
// ============================================================================

/// Identity of the signed-in user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Unique id assigned by the server
    pub id: i64,
    pub username: String,
    pub email: String,
}

/// A note as returned by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Unique id assigned by the server
    pub id: i64,
    pub title: String,
    pub content: String,
    /// Referenced category, if any
    #[serde(default)]
    pub category_id: Option<i64>,
    /// Category name joined in by the server; read-only
    #[serde(default)]
    pub category_name: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_archived: bool,
}

/// Note category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

// ============================================================================
// Statistics
// ============================================================================

/// Aggregate statistics computed by the server for the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteStats {
    pub total_stats: TotalStats,
    #[serde(default)]
    pub monthly_stats: Vec<MonthlyCount>,
    #[serde(default)]
    pub category_stats: Vec<CategoryCount>,
}

/// Lifetime counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TotalStats {
    pub total_notes: u32,
    pub archived_notes: u32,
    /// Distinct days with at least one note created
    pub active_days: u32,
}

/// Notes created in one calendar month (1-12)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyCount {
    pub month: u32,
    pub count: u32,
}

/// Notes in one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub name: String,
    pub count: u32,
}

// ============================================================================
// Filters
// ============================================================================

/// Inclusive creation-date range for filtering notes
///
/// A range always carries both bounds; a filter either restricts by date on
/// both ends or not at all.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }
}

/// Active note query predicate
///
/// The `notes` collection always reflects the server's answer for the last
/// applied filter; changing the filter triggers a full refetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteFilters {
    /// Restrict to one category
    pub category_id: Option<i64>,
    /// Archived view (`true`) or active view (`false`)
    pub is_archived: bool,
    /// Restrict by creation date
    pub date_range: Option<DateRange>,
}

impl NoteFilters {
    /// Unrestricted filter for the given archived flag
    pub fn archived(is_archived: bool) -> Self {
        Self {
            is_archived,
            ..Default::default()
        }
    }
}

/// Partial filter change; unset fields keep their current value
///
/// Built with the `with_*` methods and applied through the note store's
/// `set_filters`.
#[derive(Debug, Clone, Default)]
pub struct FilterUpdate {
    pub(crate) category_id: Option<Option<i64>>,
    pub(crate) is_archived: Option<bool>,
    pub(crate) date_range: Option<Option<DateRange>>,
}

impl FilterUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to one category, or `None` to lift the restriction
    pub fn with_category(mut self, category_id: Option<i64>) -> Self {
        self.category_id = Some(category_id);
        self
    }

    /// Switch between the archived and active views
    pub fn with_archived(mut self, is_archived: bool) -> Self {
        self.is_archived = Some(is_archived);
        self
    }

    /// Restrict by creation date, or `None` to lift the restriction
    pub fn with_date_range(mut self, range: Option<DateRange>) -> Self {
        self.date_range = Some(range);
        self
    }

    /// Merge this change into an existing filter set
    pub(crate) fn apply(self, filters: &mut NoteFilters) {
        if let Some(category_id) = self.category_id {
            filters.category_id = category_id;
        }
        if let Some(is_archived) = self.is_archived {
            filters.is_archived = is_archived;
        }
        if let Some(date_range) = self.date_range {
            filters.date_range = date_range;
        }
    }
}

// ============================================================================
// Requests and replies
// ============================================================================

/// Fields submitted when creating or updating a note
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    /// Sent as an explicit `null` when absent
    pub category_id: Option<i64>,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            category_id: None,
        }
    }

    pub fn with_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }
}

/// Token and user returned by login and registration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthPayload {
    pub token: String,
    pub user: User,
}

/// Reply to note creation
///
/// Servers answer with the created note, with only its id, or with neither;
/// an empty reply still means the note was created.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CreateNoteReply {
    #[serde(default)]
    pub note: Option<Note>,
    #[serde(default, rename = "noteId")]
    pub note_id: Option<i64>,
}

/// Reply to a note update; the updated note is optional
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UpdateNoteReply {
    #[serde(default)]
    pub note: Option<Note>,
}

// ============================================================================
// Operation outcomes
// ============================================================================

/// Descriptor returned by session and note-store operations
///
/// Failures carry a user-facing message; nothing in this layer panics or
/// aborts on a failed remote call.
#[derive(Debug, Clone, PartialEq)]
pub struct OpOutcome {
    pub success: bool,
    /// Failure message shown to the user; `None` on success
    pub message: Option<String>,
}

impl OpOutcome {
    /// Successful outcome
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    /// Failed outcome with a user-facing message
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
}
