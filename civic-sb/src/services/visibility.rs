//! Outbound projections of stored suggestions
//!
//! Which view a caller gets depends on the operation, never on the caller's
//! role. Neither view carries the revision counter, and the submitter id is
//! dropped whenever the suggestion is anonymous.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Category, MediaAttachment, Status, Suggestion};

/// Full record as shown to staff and to the submitter
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionView {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    pub anonymous: bool,
    pub category: Category,
    pub description: String,
    pub status: Status,
    pub assigned_department: Option<String>,
    pub assigned_to: Option<String>,
    pub action_taken: Option<String>,
    pub media: Vec<MediaAttachment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Minimal view for tracking by id and for the public resolved list
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackView {
    pub id: String,
    pub status: Status,
    pub category: Category,
    pub action_taken: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Suggestion> for SuggestionView {
    fn from(s: Suggestion) -> Self {
        let user = if s.anonymous { None } else { s.submitter_id };
        Self {
            id: s.id,
            user,
            anonymous: s.anonymous,
            category: s.category,
            description: s.description,
            status: s.status,
            assigned_department: s.assigned_department,
            assigned_to: s.assigned_to,
            action_taken: s.action_taken,
            media: s.media,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

impl From<Suggestion> for TrackView {
    fn from(s: Suggestion) -> Self {
        Self {
            id: s.id,
            status: s.status,
            category: s.category,
            action_taken: s.action_taken,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}
