// Input validation for client operations.
// All checks run before any network I/O is attempted.

use crate::api::types::Todo;
use crate::error::{MemoError, Result};

/// Checks that an entity id is positive.
pub fn id(value: u64, field: &'static str) -> Result<()> {
    if value == 0 {
        return Err(MemoError::Validation {
            field,
            message: "must be positive",
        });
    }
    Ok(())
}

/// Checks that a user id is positive.
pub fn user_id(value: u64) -> Result<()> {
    id(value, "user id")
}

/// Checks that a username is non-blank.
pub fn username(value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(MemoError::Validation {
            field: "username",
            message: "must not be blank",
        });
    }
    Ok(())
}

/// Checks that a todo is well-formed enough to send to the server:
/// a positive owner and a non-blank title.
pub fn todo(todo: &Todo) -> Result<()> {
    user_id(todo.user_id)?;
    if todo.title.trim().is_empty() {
        return Err(MemoError::Validation {
            field: "title",
            message: "must not be blank",
        });
    }
    Ok(())
}
