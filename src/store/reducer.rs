use chrono::Utc;
use uuid::Uuid;

use super::types::{
    AppState, Filter, FilterUpdate, Folder, FolderColor, LoadingUpdate, Snapshot, Todo, TodoDraft,
    TodoPatch, DEFAULT_FOLDER_ID,
};

/// Every state transition the store knows about. `reduce` is total over this
/// set: preconditions that do not hold (missing id, reserved folder) make the
/// action a no-op rather than an error.
#[derive(Debug, Clone)]
pub enum Action {
    LoadSnapshot(Snapshot),
    AddTodo(TodoDraft),
    UpdateTodo { id: String, changes: TodoPatch },
    DeleteTodo { id: String },
    ReorderTodos(Vec<Todo>),
    AddFolder { name: String, color: FolderColor },
    DeleteFolder { id: String },
    SetFilter(FilterUpdate),
    SetSearch(String),
    SetLoading(LoadingUpdate),
}

impl Action {
    /// Whether this action can change the persisted `{todos, folders}` pair.
    /// Filter, search and loading flags live only in memory.
    pub fn touches_snapshot(&self) -> bool {
        matches!(
            self,
            Action::AddTodo(_)
                | Action::UpdateTodo { .. }
                | Action::DeleteTodo { .. }
                | Action::ReorderTodos(_)
                | Action::AddFolder { .. }
                | Action::DeleteFolder { .. }
        )
    }
}

/// Applies `action` to `state` in place. No I/O; persistence and
/// notifications are the store's concern.
pub fn reduce(state: &mut AppState, action: Action) {
    match action {
        Action::LoadSnapshot(snapshot) => {
            state.todos = snapshot.todos.unwrap_or_default();
            if let Some(folders) = snapshot.folders {
                state.folders = folders;
            }
        }

        Action::AddTodo(draft) => {
            if draft.title.trim().is_empty() {
                return;
            }
            let now = Utc::now();
            let folder_id = if draft.folder_id.is_empty() {
                DEFAULT_FOLDER_ID.to_string()
            } else {
                draft.folder_id
            };
            state.todos.push(Todo {
                id: Uuid::new_v4().to_string(),
                title: draft.title,
                description: draft.description,
                folder_id,
                tags: draft.tags,
                completed: false,
                created_at: now,
                updated_at: now,
            });
        }

        Action::UpdateTodo { id, changes } => {
            if let Some(todo) = state.todos.iter_mut().find(|t| t.id == id) {
                if let Some(title) = changes.title {
                    todo.title = title;
                }
                if let Some(description) = changes.description {
                    todo.description = description;
                }
                if let Some(folder_id) = changes.folder_id {
                    todo.folder_id = folder_id;
                }
                if let Some(tags) = changes.tags {
                    todo.tags = tags;
                }
                if let Some(completed) = changes.completed {
                    todo.completed = completed;
                }
                todo.updated_at = Utc::now();
            }
        }

        Action::DeleteTodo { id } => {
            state.todos.retain(|t| t.id != id);
        }

        Action::ReorderTodos(todos) => {
            state.todos = todos;
        }

        Action::AddFolder { name, color } => {
            if name.trim().is_empty() {
                return;
            }
            state.folders.push(Folder {
                id: Uuid::new_v4().to_string(),
                name,
                color,
            });
        }

        Action::DeleteFolder { id } => {
            if id == DEFAULT_FOLDER_ID {
                return;
            }
            state.folders.retain(|f| f.id != id);
            for todo in state.todos.iter_mut().filter(|t| t.folder_id == id) {
                todo.folder_id = DEFAULT_FOLDER_ID.to_string();
            }
        }

        Action::SetFilter(update) => {
            let Filter { folder_id, tags } = &mut state.filter;
            if let Some(selection) = update.folder_id {
                *folder_id = selection;
            }
            if let Some(selected_tags) = update.tags {
                *tags = selected_tags;
            }
        }

        Action::SetSearch(query) => {
            state.search_query = query;
        }

        Action::SetLoading(update) => {
            if let Some(creating) = update.creating {
                state.loading.creating = creating;
            }
            if let Some(deleting) = update.deleting {
                state.loading.deleting = deleting;
            }
        }
    }
}
