//! Department registry types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::double_option;

/// Maximum department name length in characters
pub const NAME_MAX_CHARS: usize = 100;

/// Routing target for suggestions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: String,
    /// Unique, trimmed; suggestions reference departments by name
    pub name: String,
    pub description: Option<String>,
    pub head: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a department
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateDepartment {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub head: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Partial update of a department's non-identifying fields
///
/// The name is not updatable because suggestions reference it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateDepartment {
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub head: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Registry list filter
#[derive(Debug, Clone, Default)]
pub struct DepartmentFilter {
    pub active: Option<bool>,
    /// Case-insensitive substring of name, description or head
    pub text: Option<String>,
}
