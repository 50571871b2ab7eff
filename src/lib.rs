//! Cached client library for JSONPlaceholder-style todo and user APIs.
//!
//! Reads go through an in-process TTL cache; writes go to the server and
//! keep the cache consistent. [`MemoClient`] is the main entry point, with
//! [`Session`] and [`TodoService`] layering login-scoped workflows on top.
//!
//! ```no_run
//! use memo::MemoClient;
//!
//! # async fn demo() -> memo::Result<()> {
//! let client = MemoClient::new()?;
//! let todos = client.get_user_todos(1).await?; // fetched from the server
//! let again = client.get_user_todos(1).await?; // served from the cache
//! assert_eq!(todos.len(), again.len());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cache;
pub mod error;
pub mod service;

mod validate;

#[cfg(test)]
pub(crate) mod test_util;

pub use api::client::{DEFAULT_BASE_URL, MemoClient};
pub use api::transport::{ApiRequest, ApiResponse, HttpTransport, Method, Transport};
pub use api::types::{Todo, TodoPatch, User};
pub use cache::clock::{Clock, ManualClock, SystemClock};
pub use cache::store::{CacheStats, CacheStore, DEFAULT_TTL};
pub use error::{MemoError, Result};
pub use service::session::Session;
pub use service::todos::{TodoService, TodoStats};
