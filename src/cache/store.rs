// In-memory cache for todos and todo lists.
// List snapshots expire after a TTL; individual todos are kept until evicted.

use std::fmt;
use std::mem;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::api::types::Todo;

use super::clock::{Clock, SystemClock};

/// Default TTL for cached list snapshots: 5 minutes.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Rough per-entry bookkeeping cost used by the size estimate.
const ENTRY_OVERHEAD: usize = 48;

/// A cached value with the instant it was stored.
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    value: T,
    cached_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    fn new(value: T, cached_at: DateTime<Utc>) -> Self {
        Self { value, cached_at }
    }

    /// Check whether this entry has outlived `ttl` as of `now`.
    fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        let elapsed = now
            .signed_duration_since(self.cached_at)
            .to_std()
            .unwrap_or(Duration::MAX);

        elapsed > ttl
    }
}

/// Concurrent cache for todo data.
///
/// Three tiers share one store: per-user list snapshots, a single
/// all-todos snapshot, and a map of individual todos keyed by id. The
/// list tiers expire after the TTL and are evicted lazily on read; the
/// individual tier is refreshed on every write and never expires.
///
/// All operations take `&self` and are safe to call from many tasks at
/// once. List reads hand out clones, so a snapshot observed by one
/// caller is never mutated under it by another.
pub struct CacheStore {
    user_lists: DashMap<u64, CacheEntry<Vec<Todo>>>,
    all_todos: ArcSwapOption<CacheEntry<Vec<Todo>>>,
    todos: DashMap<u64, Todo>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl CacheStore {
    /// A cache whose list snapshots expire after `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    /// A cache driven by the given clock. Tests use this with
    /// [`ManualClock`](super::clock::ManualClock) to cross the TTL
    /// without sleeping.
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            user_lists: DashMap::new(),
            all_todos: ArcSwapOption::empty(),
            todos: DashMap::new(),
            ttl,
            clock,
        }
    }

    /// The configured list TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Caches a user's todo list and every saved todo in it.
    pub fn put_user_todos(&self, user_id: u64, todos: Vec<Todo>) {
        self.put_each(&todos);
        self.user_lists
            .insert(user_id, CacheEntry::new(todos, self.clock.now()));
    }

    /// Returns a user's cached list, evicting it first if it has expired.
    pub fn get_user_todos(&self, user_id: u64) -> Option<Vec<Todo>> {
        if let Some(entry) = self.user_lists.get(&user_id) {
            if !entry.is_expired(self.clock.now(), self.ttl) {
                return Some(entry.value.clone());
            }
        }
        // Read guard is released above; evict only if still expired.
        self.user_lists
            .remove_if(&user_id, |_, entry| entry.is_expired(self.clock.now(), self.ttl));
        None
    }

    /// Caches the all-todos snapshot and every saved todo in it.
    pub fn put_all_todos(&self, todos: Vec<Todo>) {
        self.put_each(&todos);
        self.all_todos
            .store(Some(Arc::new(CacheEntry::new(todos, self.clock.now()))));
    }

    /// Returns the cached all-todos snapshot, evicting it first if it has
    /// expired.
    pub fn get_all_todos(&self) -> Option<Vec<Todo>> {
        let entry = self.all_todos.load_full()?;
        if entry.is_expired(self.clock.now(), self.ttl) {
            // Clear the slot only if it still holds the snapshot we saw;
            // a concurrent repopulation wins.
            let _ = self.all_todos.compare_and_swap(&entry, None);
            return None;
        }
        Some(entry.value.clone())
    }

    /// Caches a single todo. Unsaved todos (no id) are ignored.
    pub fn put_todo(&self, todo: &Todo) {
        if let Some(id) = todo.id {
            self.todos.insert(id, todo.clone());
        }
    }

    /// Returns a cached todo by id. Individual todos do not expire.
    pub fn get_todo(&self, id: u64) -> Option<Todo> {
        self.todos.get(&id).map(|todo| todo.value().clone())
    }

    /// Drops a todo from the cache entirely: the individual entry and
    /// every occurrence inside cached list snapshots. Scrubbed lists keep
    /// their original timestamps, so removal does not extend their TTL.
    pub fn remove_todo(&self, id: u64) {
        self.todos.remove(&id);

        for mut entry in self.user_lists.iter_mut() {
            entry.value.retain(|todo| todo.id != Some(id));
        }

        self.all_todos.rcu(|snapshot| {
            snapshot.as_ref().map(|entry| {
                Arc::new(CacheEntry::new(
                    entry
                        .value
                        .iter()
                        .filter(|todo| todo.id != Some(id))
                        .cloned()
                        .collect(),
                    entry.cached_at,
                ))
            })
        });
    }

    /// Drops a user's cached list. Individual todos stay cached.
    pub fn invalidate_user(&self, user_id: u64) {
        self.user_lists.remove(&user_id);
    }

    /// Empties the cache completely.
    pub fn clear(&self) {
        self.user_lists.clear();
        self.all_todos.store(None);
        self.todos.clear();
    }

    /// Occupancy counts and an estimated memory footprint. The list count
    /// covers per-user lists; the all-todos snapshot feeds the byte
    /// estimate only.
    pub fn stats(&self) -> CacheStats {
        let mut estimated_bytes = 0;

        for entry in self.user_lists.iter() {
            estimated_bytes += ENTRY_OVERHEAD;
            estimated_bytes += entry.value.iter().map(todo_footprint).sum::<usize>();
        }
        if let Some(entry) = self.all_todos.load_full() {
            estimated_bytes += ENTRY_OVERHEAD;
            estimated_bytes += entry.value.iter().map(todo_footprint).sum::<usize>();
        }
        for entry in self.todos.iter() {
            estimated_bytes += ENTRY_OVERHEAD + todo_footprint(entry.value());
        }

        CacheStats {
            cached_lists: self.user_lists.len(),
            cached_todos: self.todos.len(),
            estimated_bytes,
        }
    }

    fn put_each(&self, todos: &[Todo]) {
        for todo in todos {
            self.put_todo(todo);
        }
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

fn todo_footprint(todo: &Todo) -> usize {
    mem::size_of::<Todo>() + todo.title.capacity()
}

/// Snapshot of cache occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Cached per-user list snapshots.
    pub cached_lists: usize,
    /// Individually cached todos.
    pub cached_todos: usize,
    /// Rough memory footprint of the cached data in bytes.
    pub estimated_bytes: usize,
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cached lists, {} cached todos, about {} bytes",
            self.cached_lists, self.cached_todos, self.estimated_bytes
        )
    }
}
