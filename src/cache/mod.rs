// Cache module for in-memory caching of API responses.
// Keeps todo lists and individual todos close at hand between requests.

pub mod clock;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use store::{CacheStats, CacheStore, DEFAULT_TTL};
