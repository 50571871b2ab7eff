// Service module for user-facing workflows.
// Builds login sessions and todo conveniences on top of the client.

pub mod session;
pub mod todos;

pub use session::Session;
pub use todos::{TodoService, TodoStats};
