use super::types::{AppState, Todo};

/// The filtered projection of the todo list: search, then folder filter,
/// then tag filter. Each stage is skipped when its criterion is empty, and
/// the stages compose with AND. Recomputed on demand, never cached.
pub fn filtered_todos(state: &AppState) -> Vec<Todo> {
    state
        .todos
        .iter()
        .filter(|todo| matches(state, todo))
        .cloned()
        .collect()
}

fn matches(state: &AppState, todo: &Todo) -> bool {
    if !state.search_query.is_empty() {
        let query = state.search_query.to_lowercase();
        let in_title = todo.title.to_lowercase().contains(&query);
        let in_description = todo.description.to_lowercase().contains(&query);
        let in_tags = todo.tags.iter().any(|tag| tag.to_lowercase().contains(&query));

        if !in_title && !in_description && !in_tags {
            return false;
        }
    }

    if let Some(folder_id) = &state.filter.folder_id {
        if todo.folder_id != *folder_id {
            return false;
        }
    }

    if !state.filter.tags.is_empty() {
        let has_matching_tag = state.filter.tags.iter().any(|tag| todo.tags.contains(tag));
        if !has_matching_tag {
            return false;
        }
    }

    true
}

/// Number of todos assigned to a folder.
pub fn folder_todo_count(state: &AppState, folder_id: &str) -> usize {
    state.todos.iter().filter(|t| t.folder_id == folder_id).count()
}

/// Every distinct tag in first-seen order, with its usage count.
pub fn all_tags(state: &AppState) -> Vec<(String, usize)> {
    let mut tags: Vec<(String, usize)> = Vec::new();
    for todo in &state.todos {
        for tag in &todo.tags {
            if let Some(entry) = tags.iter_mut().find(|(name, _)| name == tag) {
                entry.1 += 1;
            } else {
                tags.push((tag.clone(), 1));
            }
        }
    }
    tags
}
