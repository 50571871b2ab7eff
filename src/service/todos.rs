// Todo workflows for the logged-in user.
// Wraps the client with ownership checks and bulk conveniences.

use std::fmt;

use crate::api::types::{Todo, TodoPatch};
use crate::error::{MemoError, Result};

use super::session::Session;

/// Higher-level todo operations scoped to the session's user.
///
/// Every operation requires a login and refuses to observe or touch
/// another user's todos. Lookups of foreign or missing todos come back
/// as `None`/`false` rather than as errors.
pub struct TodoService {
    session: Session,
}

impl TodoService {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// The current user's todos.
    pub async fn current_user_todos(&self) -> Result<Vec<Todo>> {
        let user_id = self.required_user_id()?;
        self.session.client().get_user_todos(user_id).await
    }

    /// A single todo, only if it belongs to the current user.
    pub async fn todo(&self, id: u64) -> Result<Option<Todo>> {
        let user_id = self.required_user_id()?;
        Ok(self
            .session
            .client()
            .get_todo(id)
            .await?
            .filter(|todo| todo.user_id == user_id))
    }

    /// Creates a todo owned by the current user. The title is trimmed.
    pub async fn create(&self, title: &str, completed: bool) -> Result<Todo> {
        let user_id = self.required_user_id()?;
        let todo = Todo::new(user_id, title.trim(), completed);
        self.session.client().create_todo(&todo).await
    }

    /// Retitles and/or re-flags one of the current user's todos. Returns
    /// `None` when the todo does not exist or belongs to someone else.
    pub async fn update(
        &self,
        id: u64,
        title: Option<&str>,
        completed: Option<bool>,
    ) -> Result<Option<Todo>> {
        let title = title.map(str::trim);
        if title.is_some_and(str::is_empty) {
            return Err(MemoError::Validation {
                field: "title",
                message: "must not be blank",
            });
        }

        if self.todo(id).await?.is_none() {
            return Ok(None);
        }

        let patch = TodoPatch {
            title: title.map(String::from),
            completed,
            user_id: None,
        };
        Ok(Some(self.session.client().patch_todo(id, &patch).await?))
    }

    /// Flips a todo's completed flag. Returns `None` when the todo is not
    /// the current user's to toggle.
    pub async fn toggle_completion(&self, id: u64) -> Result<Option<Todo>> {
        let Some(todo) = self.todo(id).await? else {
            return Ok(None);
        };
        let patch = TodoPatch::completed(!todo.completed);
        Ok(Some(self.session.client().patch_todo(id, &patch).await?))
    }

    /// Deletes one of the current user's todos. Returns `false` when the
    /// todo does not exist or belongs to someone else.
    pub async fn delete(&self, id: u64) -> Result<bool> {
        if self.todo(id).await?.is_none() {
            return Ok(false);
        }
        self.session.client().delete_todo(id).await
    }

    /// The current user's completed todos, fetched fresh.
    pub async fn completed_todos(&self) -> Result<Vec<Todo>> {
        let user_id = self.required_user_id()?;
        self.session
            .client()
            .get_todos_by_completion(user_id, true)
            .await
    }

    /// The current user's pending todos, fetched fresh.
    pub async fn pending_todos(&self) -> Result<Vec<Todo>> {
        let user_id = self.required_user_id()?;
        self.session
            .client()
            .get_todos_by_completion(user_id, false)
            .await
    }

    /// Case-insensitive title search over the current user's todos. A
    /// blank term matches everything.
    pub async fn search(&self, term: &str) -> Result<Vec<Todo>> {
        let todos = self.current_user_todos().await?;
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(todos);
        }
        Ok(todos
            .into_iter()
            .filter(|todo| todo.title.to_lowercase().contains(&needle))
            .collect())
    }

    /// Completion statistics for the current user's todos.
    pub async fn stats(&self) -> Result<TodoStats> {
        let todos = self.current_user_todos().await?;
        let completed = todos.iter().filter(|todo| todo.completed).count();
        Ok(TodoStats {
            total: todos.len(),
            completed,
        })
    }

    /// Deletes every completed todo. Returns how many were deleted.
    pub async fn delete_all_completed(&self) -> Result<usize> {
        let completed = self.completed_todos().await?;
        let mut deleted = 0;
        for todo in completed {
            if let Some(id) = todo.id {
                if self.session.client().delete_todo(id).await? {
                    deleted += 1;
                }
            }
        }
        Ok(deleted)
    }

    /// Marks every pending todo completed. Returns how many were updated.
    pub async fn mark_all_completed(&self) -> Result<usize> {
        let pending = self.pending_todos().await?;
        let mut updated = 0;
        for todo in pending {
            if let Some(id) = todo.id {
                self.session
                    .client()
                    .patch_todo(id, &TodoPatch::completed(true))
                    .await?;
                updated += 1;
            }
        }
        Ok(updated)
    }

    fn required_user_id(&self) -> Result<u64> {
        self.session.current_user_id().ok_or(MemoError::NotLoggedIn)
    }
}

/// Completion counts for a set of todos.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TodoStats {
    pub total: usize,
    pub completed: usize,
}

impl TodoStats {
    pub fn pending(&self) -> usize {
        self.total - self.completed
    }

    /// Completed share in percent, 0 for an empty set.
    pub fn completed_percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 * 100.0 / self.total as f64
        }
    }
}

impl fmt::Display for TodoStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} completed ({:.0}%)",
            self.completed,
            self.total,
            self.completed_percentage()
        )
    }
}
