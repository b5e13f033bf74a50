//! Domain models for the suggestion box

pub mod department;
pub mod suggestion;

pub use department::{CreateDepartment, Department, DepartmentFilter, UpdateDepartment};
pub use suggestion::{
    Category, MediaAttachment, MediaKind, MediaUpload, NewSubmission, Status, Suggestion,
    SuggestionFilter, SuggestionQuery, SuggestionStats, SuggestionUpdate,
};

use serde::{Deserialize, Deserializer};

/// Deserialize a field where absent, `null` and a value all mean different things
///
/// Use together with `#[serde(default)]`: absent -> `None`,
/// `null` -> `Some(None)`, value -> `Some(Some(v))`.
pub(crate) fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Trim an optional free-text field, mapping blank input to `None`
pub(crate) fn normalize_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
