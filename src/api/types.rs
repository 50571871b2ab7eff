// API record types.
// Defines the todo and user records exchanged with the remote REST resource.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// A todo item.
///
/// `id` is absent until the record has been persisted by the server.
/// Equality and hashing are defined solely by `id`: two todos with the same
/// persisted id are the same entity no matter what their other fields say.
/// This is identity semantics, not value semantics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Todo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(rename = "userId")]
    pub user_id: u64,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

impl Todo {
    /// A new, unsaved todo for the given owner.
    pub fn new(user_id: u64, title: impl Into<String>, completed: bool) -> Self {
        Self {
            id: None,
            user_id,
            title: title.into(),
            completed,
        }
    }
}

impl PartialEq for Todo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Todo {}

impl Hash for Todo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Partial update for a todo. Absent fields are omitted from the request
/// body and left unchanged by the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TodoPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(rename = "userId", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
}

impl TodoPatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }
}

/// A user account. Read-only from this library's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
}

impl User {
    /// Human-facing name, falling back to the username when the display
    /// name is empty.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.username
        } else {
            &self.name
        }
    }
}
