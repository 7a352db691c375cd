use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Id of the seeded folder that can never be deleted. Todos orphaned by a
/// folder deletion are reassigned here.
pub const DEFAULT_FOLDER_ID: &str = "default";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub folder_id: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FolderColor {
    #[default]
    Blue,
    Green,
    Purple,
    Red,
    Yellow,
    Pink,
    Indigo,
    Gray,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: FolderColor,
}

impl Folder {
    pub fn default_folder() -> Self {
        Self {
            id: DEFAULT_FOLDER_ID.to_string(),
            name: "General".to_string(),
            color: FolderColor::Blue,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    /// `None` means all folders.
    #[serde(default)]
    pub folder_id: Option<String>,
    /// OR-matched against each todo's tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoadingState {
    pub creating: bool,
    /// Id of the todo currently being deleted, if any.
    pub deleting: Option<String>,
}

/// The persisted `{todos, folders}` pair, also the payload exchanged between
/// running instances. A `None` field was absent from the payload: absent
/// todos replace with an empty list, absent folders are retained as-is.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub todos: Option<Vec<Todo>>,
    #[serde(default)]
    pub folders: Option<Vec<Folder>>,
}

impl Snapshot {
    pub fn capture(state: &AppState) -> Self {
        Self {
            todos: Some(state.todos.clone()),
            folders: Some(state.folders.clone()),
        }
    }
}

/// Validated input for a new todo. Field constraints (title length, tag
/// sizes) are enforced by the form layer before this reaches the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub folder_id: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Partial update for an existing todo; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub folder_id: Option<String>,
    pub tags: Option<Vec<String>>,
    pub completed: Option<bool>,
}

/// Partial update for the filter. The outer `Option` distinguishes "leave
/// alone" from "set", so the folder selection can be cleared explicitly.
#[derive(Debug, Clone, Default)]
pub struct FilterUpdate {
    pub folder_id: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
}

impl FilterUpdate {
    pub fn folder(folder_id: Option<String>) -> Self {
        Self {
            folder_id: Some(folder_id),
            ..Self::default()
        }
    }

    pub fn tags(tags: Vec<String>) -> Self {
        Self {
            tags: Some(tags),
            ..Self::default()
        }
    }
}

/// Partial update for the loading flags.
#[derive(Debug, Clone, Default)]
pub struct LoadingUpdate {
    pub creating: Option<bool>,
    pub deleting: Option<Option<String>>,
}

impl LoadingUpdate {
    pub fn creating(active: bool) -> Self {
        Self {
            creating: Some(active),
            ..Self::default()
        }
    }

    pub fn deleting(id: Option<String>) -> Self {
        Self {
            deleting: Some(id),
            ..Self::default()
        }
    }
}

/// Full in-memory state of one running instance.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub todos: Vec<Todo>,
    pub folders: Vec<Folder>,
    pub filter: Filter,
    pub search_query: String,
    pub loading: LoadingState,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            todos: Vec::new(),
            folders: vec![Folder::default_folder()],
            filter: Filter::default(),
            search_query: String::new(),
            loading: LoadingState::default(),
        }
    }
}
