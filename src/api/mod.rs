// API module for talking to the remote todo service.
// Houses the record types, the transport seam, and the cached client.

pub mod client;
pub mod transport;
pub mod types;

pub use client::{DEFAULT_BASE_URL, MemoClient};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Method, Transport};
pub use types::{Todo, TodoPatch, User};
