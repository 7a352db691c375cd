use std::time::Duration;

use tokio::time::sleep;

use super::reducer::Action;
use super::types::{FilterUpdate, FolderColor, LoadingUpdate, Todo, TodoDraft, TodoPatch};
use super::TodoStore;

/// Artificial staging delay before a creation lands.
const CREATE_STAGE_DELAY: Duration = Duration::from_millis(800);
/// Artificial staging delay before a deletion lands.
const DELETE_STAGE_DELAY: Duration = Duration::from_millis(600);

enum LoadingSlot {
    Creating,
    Deleting,
}

/// Clears a loading slot when dropped, so a busy flag set by a staged
/// command cannot outlive it.
struct LoadingGuard<'a> {
    store: &'a TodoStore,
    slot: LoadingSlot,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let update = match self.slot {
            LoadingSlot::Creating => LoadingUpdate::creating(false),
            LoadingSlot::Deleting => LoadingUpdate::deleting(None),
        };
        self.store.dispatch(Action::SetLoading(update));
    }
}

impl TodoStore {
    /// Stages a new todo: raises `loading.creating`, waits out the staging
    /// delay, then appends the todo. The flag is cleared on the way out no
    /// matter how the future completes. Concurrent calls share the single
    /// flag slot; both creations still land.
    pub async fn add_todo(&self, draft: TodoDraft) {
        self.dispatch(Action::SetLoading(LoadingUpdate::creating(true)));
        let _busy = LoadingGuard {
            store: self,
            slot: LoadingSlot::Creating,
        };

        sleep(CREATE_STAGE_DELAY).await;
        self.dispatch(Action::AddTodo(draft));
    }

    /// Stages a deletion: `loading.deleting` carries the id being removed
    /// until the deletion lands, then reverts to `None`.
    pub async fn delete_todo(&self, id: impl Into<String>) {
        let id = id.into();
        self.dispatch(Action::SetLoading(LoadingUpdate::deleting(Some(id.clone()))));
        let _busy = LoadingGuard {
            store: self,
            slot: LoadingSlot::Deleting,
        };

        sleep(DELETE_STAGE_DELAY).await;
        self.dispatch(Action::DeleteTodo { id });
    }

    pub fn update_todo(&self, id: impl Into<String>, changes: TodoPatch) {
        self.dispatch(Action::UpdateTodo {
            id: id.into(),
            changes,
        });
    }

    pub fn reorder_todos(&self, todos: Vec<Todo>) {
        self.dispatch(Action::ReorderTodos(todos));
    }

    pub fn add_folder(&self, name: impl Into<String>, color: FolderColor) {
        self.dispatch(Action::AddFolder {
            name: name.into(),
            color,
        });
    }

    pub fn delete_folder(&self, id: impl Into<String>) {
        self.dispatch(Action::DeleteFolder { id: id.into() });
    }

    pub fn set_filter(&self, update: FilterUpdate) {
        self.dispatch(Action::SetFilter(update));
    }

    pub fn set_search(&self, query: impl Into<String>) {
        self.dispatch(Action::SetSearch(query.into()));
    }
}
