//! Suggestion domain types
//!
//! `Suggestion` is the stored record and deliberately does not implement
//! `Serialize`: every outbound shape goes through `services::visibility`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use civic_common::api::Identity;
use civic_common::time::{parse_range_bound, RangeEdge};
use civic_common::{Error, Result};
use serde::{Deserialize, Serialize};

use super::{double_option, normalize_text};

/// Minimum description length in characters (after trimming)
pub const DESCRIPTION_MIN_CHARS: usize = 10;
/// Maximum description length in characters (after trimming)
pub const DESCRIPTION_MAX_CHARS: usize = 5000;
/// Maximum action-taken narrative length in characters
pub const ACTION_TAKEN_MAX_CHARS: usize = 20000;

/// Fixed set of suggestion categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Academic,
    Infrastructure,
    Administration,
    Hostel,
    Library,
    Canteen,
    Transport,
    Sports,
    Events,
    Other,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Academic,
        Category::Infrastructure,
        Category::Administration,
        Category::Hostel,
        Category::Library,
        Category::Canteen,
        Category::Transport,
        Category::Sports,
        Category::Events,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Academic => "academic",
            Category::Infrastructure => "infrastructure",
            Category::Administration => "administration",
            Category::Hostel => "hostel",
            Category::Library => "library",
            Category::Canteen => "canteen",
            Category::Transport => "transport",
            Category::Sports => "sports",
            Category::Events => "events",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    /// Case-insensitive on trimmed input
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::InvalidArgument(format!("Unknown category: {}", wanted)))
    }
}

/// Suggestion lifecycle state
///
/// Any state may move to any other; `Resolved` is terminal only for
/// reporting purposes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Status {
    #[default]
    #[serde(rename = "Received")]
    Received,
    #[serde(rename = "In Process")]
    InProcess,
    #[serde(rename = "Resolved")]
    Resolved,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Received, Status::InProcess, Status::Resolved];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Received => "Received",
            Status::InProcess => "In Process",
            Status::Resolved => "Resolved",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = Error;

    /// Exact match on one of the three labels (surrounding whitespace ignored)
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Status::ALL
            .into_iter()
            .find(|st| st.as_str() == wanted)
            .ok_or_else(|| Error::InvalidArgument(format!("Unknown status: {}", wanted)))
    }
}

/// Attachment kind, derived from the upload's content type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }

    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type.split(';').next()?.trim().to_ascii_lowercase();
        if essence.starts_with("image/") {
            Some(MediaKind::Image)
        } else if essence.starts_with("video/") {
            Some(MediaKind::Video)
        } else {
            None
        }
    }
}

impl FromStr for MediaKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "image" => Ok(MediaKind::Image),
            "video" => Ok(MediaKind::Video),
            other => Err(Error::Internal(format!("Unknown media kind in storage: {}", other))),
        }
    }
}

/// Media item owned by a suggestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAttachment {
    pub kind: MediaKind,
    pub url: String,
    pub original_name: String,
    pub content_type: String,
    pub size: u64,
}

/// Stored suggestion record
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub id: String,
    /// Never set when `anonymous` is true
    pub submitter_id: Option<String>,
    pub anonymous: bool,
    pub category: Category,
    pub description: String,
    pub status: Status,
    pub assigned_department: Option<String>,
    pub assigned_to: Option<String>,
    pub action_taken: Option<String>,
    pub media: Vec<MediaAttachment>,
    /// Internal version marker, bumped on every update
    pub revision: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// File received with a submission, not yet stored
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Raw submission as received from a client
#[derive(Debug, Clone, Default)]
pub struct NewSubmission {
    pub category: String,
    pub description: String,
    pub anonymous: bool,
    pub submitter: Option<Identity>,
    pub assigned_department: Option<String>,
    pub media: Vec<MediaUpload>,
}

/// Partial staff update
///
/// Absent fields stay unchanged. For the nullable fields an explicit
/// `null` clears the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SuggestionUpdate {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub assigned_department: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub assigned_to: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub action_taken: Option<Option<String>>,
}

/// Admin list filters, already validated
#[derive(Debug, Clone, Default)]
pub struct SuggestionFilter {
    pub category: Option<Category>,
    pub status: Option<Status>,
    pub assigned_department: Option<String>,
    /// Case-insensitive substring of description or action taken
    pub query: Option<String>,
    /// Inclusive lower bound on `created_at`
    pub created_from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `created_at`
    pub created_before: Option<DateTime<Utc>>,
}

/// Raw admin list query string parameters
///
/// Blank values count as absent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionQuery {
    pub category: Option<String>,
    pub status: Option<String>,
    pub assigned_department: Option<String>,
    pub q: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl TryFrom<SuggestionQuery> for SuggestionFilter {
    type Error = Error;

    fn try_from(query: SuggestionQuery) -> Result<Self> {
        Ok(SuggestionFilter {
            category: normalize_text(query.category)
                .map(|c| c.parse())
                .transpose()?,
            status: normalize_text(query.status).map(|s| s.parse()).transpose()?,
            assigned_department: normalize_text(query.assigned_department),
            query: normalize_text(query.q),
            created_from: normalize_text(query.from)
                .map(|f| parse_range_bound(&f, RangeEdge::Start))
                .transpose()?,
            created_before: normalize_text(query.to)
                .map(|t| parse_range_bound(&t, RangeEdge::End))
                .transpose()?,
        })
    }
}

/// Aggregate counts for the staff dashboard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionStats {
    pub total: i64,
    pub by_status: BTreeMap<String, i64>,
    pub by_category: BTreeMap<String, i64>,
    pub by_department: BTreeMap<String, i64>,
    pub unassigned: i64,
}
