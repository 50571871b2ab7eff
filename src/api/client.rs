// Client for JSONPlaceholder-style todo and user APIs.
// Reads go through the cache; writes hit the server and keep the cache honest.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::api::transport::{ApiRequest, ApiResponse, HttpTransport, Method, Transport};
use crate::api::types::{Todo, TodoPatch, User};
use crate::cache::store::{CacheStats, CacheStore};
use crate::error::{MemoError, Result};
use crate::validate;

/// Public JSONPlaceholder instance.
pub const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com";

const TODOS_ENDPOINT: &str = "/todos";
const USERS_ENDPOINT: &str = "/users";

/// Deadline for the connectivity probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Cached client for a JSONPlaceholder-style REST API.
///
/// Todo reads are served from an in-process cache when possible; writes
/// always go to the server and then update or invalidate the affected
/// cache entries. Cloning is cheap and clones share the same cache and
/// connection pool.
#[derive(Clone)]
pub struct MemoClient {
    transport: Arc<dyn Transport>,
    cache: Arc<CacheStore>,
    base_url: String,
}

impl MemoClient {
    /// Client against the public JSONPlaceholder API with default caching.
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Client against a custom deployment of the API.
    pub fn with_base_url(base_url: impl AsRef<str>) -> Result<Self> {
        Ok(Self::with_transport(
            base_url,
            Arc::new(HttpTransport::new()?),
            CacheStore::default(),
        ))
    }

    /// Client with an injected transport and cache. This is the seam used
    /// by tests, and by callers that want a custom TTL via
    /// [`CacheStore::new`].
    pub fn with_transport(
        base_url: impl AsRef<str>,
        transport: Arc<dyn Transport>,
        cache: CacheStore,
    ) -> Self {
        Self {
            transport,
            cache: Arc::new(cache),
            base_url: normalize_base_url(base_url.as_ref()),
        }
    }

    /// All todos, served from the cached snapshot when it is still fresh.
    pub async fn get_all_todos(&self) -> Result<Vec<Todo>> {
        if let Some(todos) = self.cache.get_all_todos() {
            debug!(count = todos.len(), "all todos served from cache");
            return Ok(todos);
        }

        debug!("fetching all todos");
        let response = self.send(Method::Get, TODOS_ENDPOINT, None).await?;
        check_status(&response)?;
        let todos: Vec<Todo> = decode_list(&response.body)?;
        self.cache.put_all_todos(todos.clone());
        Ok(todos)
    }

    /// A user's todos, served from their cached list when it is still fresh.
    pub async fn get_user_todos(&self, user_id: u64) -> Result<Vec<Todo>> {
        validate::user_id(user_id)?;

        if let Some(todos) = self.cache.get_user_todos(user_id) {
            debug!(user_id, count = todos.len(), "user todos served from cache");
            return Ok(todos);
        }

        debug!(user_id, "fetching user todos");
        let path = format!("{TODOS_ENDPOINT}?userId={user_id}");
        let response = self.send(Method::Get, &path, None).await?;
        check_status(&response)?;
        let todos: Vec<Todo> = decode_list(&response.body)?;
        self.cache.put_user_todos(user_id, todos.clone());
        Ok(todos)
    }

    /// A single todo by id. `Ok(None)` means the server does not know it.
    pub async fn get_todo(&self, id: u64) -> Result<Option<Todo>> {
        validate::id(id, "todo id")?;

        if let Some(todo) = self.cache.get_todo(id) {
            debug!(id, "todo served from cache");
            return Ok(Some(todo));
        }

        debug!(id, "fetching todo");
        let response = self.send(Method::Get, &format!("{TODOS_ENDPOINT}/{id}"), None).await?;
        if response.status == 404 {
            return Ok(None);
        }
        check_status(&response)?;
        match decode_optional::<Todo>(&response.body)? {
            Some(todo) => {
                self.cache.put_todo(&todo);
                Ok(Some(todo))
            }
            None => Ok(None),
        }
    }

    /// Creates a todo and returns the server's copy with its assigned id.
    /// The owner's cached list is invalidated so the next read refetches.
    pub async fn create_todo(&self, todo: &Todo) -> Result<Todo> {
        validate::todo(todo)?;

        let body = encode(todo)?;
        let response = self.send(Method::Post, TODOS_ENDPOINT, Some(body)).await?;
        check_status(&response)?;
        let created: Todo = decode_entity(&response.body)?;

        debug!(id = ?created.id, user_id = todo.user_id, "created todo");
        self.cache.put_todo(&created);
        self.cache.invalidate_user(todo.user_id);
        Ok(created)
    }

    /// Replaces a todo wholesale. The todo must already have an id.
    pub async fn update_todo(&self, todo: &Todo) -> Result<Todo> {
        let id = todo.id.ok_or(MemoError::Validation {
            field: "todo id",
            message: "is required for update",
        })?;
        validate::id(id, "todo id")?;
        validate::todo(todo)?;

        let body = encode(todo)?;
        let response = self
            .send(Method::Put, &format!("{TODOS_ENDPOINT}/{id}"), Some(body))
            .await?;
        check_status(&response)?;
        let updated: Todo = decode_entity(&response.body)?;

        debug!(id, "updated todo");
        self.cache.put_todo(&updated);
        self.cache.invalidate_user(todo.user_id);
        Ok(updated)
    }

    /// Applies a partial update. Only the fields present in `patch` change.
    pub async fn patch_todo(&self, id: u64, patch: &TodoPatch) -> Result<Todo> {
        validate::id(id, "todo id")?;

        let body = encode(patch)?;
        let response = self
            .send(Method::Patch, &format!("{TODOS_ENDPOINT}/{id}"), Some(body))
            .await?;
        check_status(&response)?;
        let updated: Todo = decode_entity(&response.body)?;

        debug!(id, "patched todo");
        self.cache.put_todo(&updated);
        // The patch may not name the owner, so trust the server's copy.
        self.cache.invalidate_user(updated.user_id);
        Ok(updated)
    }

    /// Deletes a todo. Deleting one the server no longer knows still
    /// succeeds; either way the id is scrubbed from the cache.
    pub async fn delete_todo(&self, id: u64) -> Result<bool> {
        validate::id(id, "todo id")?;

        let response = self
            .send(Method::Delete, &format!("{TODOS_ENDPOINT}/{id}"), None)
            .await?;
        if response.status != 404 {
            check_status(&response)?;
        }

        debug!(id, "deleted todo");
        self.cache.remove_todo(id);
        Ok(true)
    }

    /// A user's todos filtered by completion state. Filtered views are
    /// always fetched fresh and never cached.
    pub async fn get_todos_by_completion(
        &self,
        user_id: u64,
        completed: bool,
    ) -> Result<Vec<Todo>> {
        validate::user_id(user_id)?;

        let path = format!("{TODOS_ENDPOINT}?userId={user_id}&completed={completed}");
        let response = self.send(Method::Get, &path, None).await?;
        check_status(&response)?;
        decode_list(&response.body)
    }

    /// All user accounts. Users are not cached.
    pub async fn get_all_users(&self) -> Result<Vec<User>> {
        let response = self.send(Method::Get, USERS_ENDPOINT, None).await?;
        check_status(&response)?;
        decode_list(&response.body)
    }

    /// A single user by id. `Ok(None)` means the server does not know them.
    pub async fn get_user(&self, user_id: u64) -> Result<Option<User>> {
        validate::user_id(user_id)?;

        let response = self
            .send(Method::Get, &format!("{USERS_ENDPOINT}/{user_id}"), None)
            .await?;
        if response.status == 404 {
            return Ok(None);
        }
        check_status(&response)?;
        Ok(Some(decode_entity(&response.body)?))
    }

    /// Probes the API with a bounded-time request. Returns whether the
    /// probe came back with HTTP 200; an unanswered probe is a
    /// [`MemoError::Timeout`].
    pub async fn test_connection(&self) -> Result<bool> {
        let request = ApiRequest::new(Method::Get, self.url(&format!("{TODOS_ENDPOINT}/1")));
        match tokio::time::timeout(PROBE_TIMEOUT, self.transport.execute(request)).await {
            Ok(response) => Ok(response?.status == 200),
            Err(_) => Err(MemoError::Timeout(PROBE_TIMEOUT)),
        }
    }

    /// Occupancy of the shared cache.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Drops everything cached.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// The shared cache store.
    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Points the client at a different deployment. Trailing slashes are
    /// trimmed; a blank URL falls back to [`DEFAULT_BASE_URL`].
    pub fn set_base_url(&mut self, base_url: &str) {
        self.base_url = normalize_base_url(base_url);
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, method: Method, path: &str, body: Option<String>) -> Result<ApiResponse> {
        let request = ApiRequest {
            method,
            url: self.url(path),
            body,
        };
        self.transport.execute(request).await
    }
}

fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim();
    if trimmed.is_empty() {
        DEFAULT_BASE_URL.to_string()
    } else {
        trimmed.trim_end_matches('/').to_string()
    }
}

fn check_status(response: &ApiResponse) -> Result<()> {
    if response.is_success() {
        Ok(())
    } else {
        Err(MemoError::from_response(response.status, &response.body))
    }
}

fn encode<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value)
        .map_err(|err| MemoError::Transport(format!("failed to encode request body: {err}")))
}

/// Decodes a JSON array body. An empty or `null` body reads as no items.
fn decode_list<T: DeserializeOwned>(body: &str) -> Result<Vec<T>> {
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    serde_json::from_str(trimmed)
        .map_err(|err| MemoError::Transport(format!("malformed response body: {err}")))
}

/// Decodes a JSON object body. An empty or `null` body is a transport
/// failure here, since the server promised an entity.
fn decode_entity<T: DeserializeOwned>(body: &str) -> Result<T> {
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Err(MemoError::Transport("response body was empty".into()));
    }
    serde_json::from_str(trimmed)
        .map_err(|err| MemoError::Transport(format!("malformed response body: {err}")))
}

/// Decodes a JSON object body where the server may legitimately answer
/// with nothing. Empty and `null` bodies read as absent.
fn decode_optional<T: DeserializeOwned>(body: &str) -> Result<Option<T>> {
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(None);
    }
    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|err| MemoError::Transport(format!("malformed response body: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::MockTransport;

    fn client_with(transport: Arc<MockTransport>) -> MemoClient {
        MemoClient::with_transport("http://localhost", transport, CacheStore::default())
    }

    fn todo_json(id: u64, user_id: u64, title: &str, completed: bool) -> String {
        format!(r#"{{"id":{id},"userId":{user_id},"title":"{title}","completed":{completed}}}"#)
    }

    #[tokio::test]
    async fn test_get_todo_hits_cache_on_second_read() {
        let transport = Arc::new(MockTransport::new());
        transport.push_response(200, &todo_json(1, 1, "delectus aut autem", false));
        let client = client_with(transport.clone());

        let first = client.get_todo(1).await.unwrap().unwrap();
        assert_eq!(first.title, "delectus aut autem");
        let second = client.get_todo(1).await.unwrap().unwrap();
        assert_eq!(second, first);

        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_get_todo_absent_maps_to_none() {
        let transport = Arc::new(MockTransport::new());
        transport.push_response(404, "{}");
        let client = client_with(transport);

        assert_eq!(client.get_todo(9999).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_get_todo_empty_body_reads_as_none() {
        let transport = Arc::new(MockTransport::new());
        transport.push_response(200, "");
        transport.push_response(200, "null");
        let client = client_with(transport);

        assert_eq!(client.get_todo(1).await.unwrap(), None);
        assert_eq!(client.get_todo(1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_validation_failures_never_touch_the_wire() {
        let transport = Arc::new(MockTransport::new());
        let client = client_with(transport.clone());

        assert!(matches!(
            client.get_todo(0).await,
            Err(MemoError::Validation { field: "todo id", .. })
        ));
        assert!(matches!(
            client.get_user_todos(0).await,
            Err(MemoError::Validation { field: "user id", .. })
        ));
        assert!(matches!(
            client.create_todo(&Todo::new(1, "   ", false)).await,
            Err(MemoError::Validation { field: "title", .. })
        ));

        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_update_requires_an_id() {
        let transport = Arc::new(MockTransport::new());
        let client = client_with(transport.clone());

        let err = client.update_todo(&Todo::new(1, "title", false)).await.unwrap_err();
        assert!(matches!(err, MemoError::Validation { field: "todo id", .. }));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_create_invalidates_owner_list() {
        let transport = Arc::new(MockTransport::new());
        let client = client_with(transport.clone());

        transport.push_response(200, &format!("[{}]", todo_json(1, 1, "old", false)));
        assert_eq!(client.get_user_todos(1).await.unwrap().len(), 1);

        transport.push_response(201, &todo_json(201, 1, "new", false));
        let created = client.create_todo(&Todo::new(1, "new", false)).await.unwrap();
        assert_eq!(created.id, Some(201));
        // The server's copy is cached under its assigned id right away.
        assert!(client.cache().get_todo(201).is_some());

        // The owner's list was invalidated, so this read goes to the wire.
        transport.push_response(
            200,
            &format!("[{},{}]", todo_json(1, 1, "old", false), todo_json(201, 1, "new", false)),
        );
        assert_eq!(client.get_user_todos(1).await.unwrap().len(), 2);
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent_and_scrubs_cache() {
        let transport = Arc::new(MockTransport::new());
        let client = client_with(transport.clone());

        transport.push_response(200, &format!("[{}]", todo_json(5, 2, "gone soon", false)));
        client.get_user_todos(2).await.unwrap();
        assert!(client.cache().get_todo(5).is_some());

        transport.push_response(404, "{}");
        assert!(client.delete_todo(5).await.unwrap());

        assert!(client.cache().get_todo(5).is_none());
        let cached = client.cache().get_user_todos(2).unwrap();
        assert!(cached.is_empty());
    }

    #[tokio::test]
    async fn test_patch_invalidates_server_reported_owner() {
        let transport = Arc::new(MockTransport::new());
        let client = client_with(transport.clone());

        transport.push_response(200, &format!("[{}]", todo_json(7, 3, "old title", false)));
        client.get_user_todos(3).await.unwrap();

        transport.push_response(200, &todo_json(7, 3, "new title", false));
        let updated = client.patch_todo(7, &TodoPatch::title("new title")).await.unwrap();
        assert_eq!(updated.title, "new title");

        assert!(client.cache().get_user_todos(3).is_none());
        assert_eq!(
            client.cache().get_todo(7).map(|t| t.title),
            Some("new title".into())
        );
    }

    #[tokio::test]
    async fn test_api_error_carries_server_message() {
        let transport = Arc::new(MockTransport::new());
        transport.push_response(500, r#"{"message":"database is on fire"}"#);
        let client = client_with(transport);

        let err = client.get_all_todos().await.unwrap_err();
        assert_eq!(err.to_string(), "API error (HTTP 500): database is on fire");
    }

    #[tokio::test]
    async fn test_transport_failure_propagates_and_skips_cache() {
        let transport = Arc::new(MockTransport::new());
        transport.push_error(MemoError::Transport("connection refused".into()));
        let client = client_with(transport);

        let err = client.get_all_todos().await.unwrap_err();
        assert!(matches!(err, MemoError::Transport(_)));
        assert_eq!(client.cache_stats().cached_lists, 0);
    }

    #[tokio::test]
    async fn test_completion_filter_bypasses_cache() {
        let transport = Arc::new(MockTransport::new());
        let client = client_with(transport.clone());

        transport.push_response(200, &format!("[{}]", todo_json(1, 3, "a", true)));
        transport.push_response(200, &format!("[{}]", todo_json(1, 3, "a", true)));

        client.get_todos_by_completion(3, true).await.unwrap();
        client.get_todos_by_completion(3, true).await.unwrap();
        assert_eq!(transport.calls(), 2);

        let requests = transport.requests();
        let url = &requests[0].url;
        assert!(url.ends_with("/todos?userId=3&completed=true"), "url was {url}");
    }

    #[tokio::test]
    async fn test_get_user_absent_maps_to_none() {
        let transport = Arc::new(MockTransport::new());
        transport.push_response(404, "{}");
        let client = client_with(transport);

        assert_eq!(client.get_user(9999).await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connection_probe_times_out() {
        let transport = Arc::new(MockTransport::hanging());
        let client = client_with(transport);

        let err = client.test_connection().await.unwrap_err();
        assert!(matches!(err, MemoError::Timeout(d) if d == PROBE_TIMEOUT));
    }

    #[tokio::test]
    async fn test_connection_probe_reports_status() {
        let transport = Arc::new(MockTransport::new());
        transport.push_response(200, &todo_json(1, 1, "x", false));
        let client = client_with(transport.clone());
        assert!(client.test_connection().await.unwrap());

        transport.push_response(503, "");
        assert!(!client.test_connection().await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_list_body_reads_as_no_items() {
        let transport = Arc::new(MockTransport::new());
        transport.push_response(200, "");
        let client = client_with(transport);

        assert!(client.get_all_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_cache_forces_refetch() {
        let transport = Arc::new(MockTransport::new());
        let client = client_with(transport.clone());

        transport.push_response(200, &format!("[{}]", todo_json(1, 1, "a", false)));
        client.get_user_todos(1).await.unwrap();
        assert_eq!(client.cache_stats().cached_todos, 1);

        client.clear_cache();
        assert_eq!(client.cache_stats().cached_todos, 0);

        transport.push_response(200, &format!("[{}]", todo_json(1, 1, "a", false)));
        client.get_user_todos(1).await.unwrap();
        assert_eq!(transport.calls(), 2);
    }

    #[test]
    fn test_base_url_normalization() {
        let transport = Arc::new(MockTransport::new());
        let mut client = MemoClient::with_transport(
            "http://localhost:8080///",
            transport,
            CacheStore::default(),
        );
        assert_eq!(client.base_url(), "http://localhost:8080");

        client.set_base_url("  http://example.com/api/ ");
        assert_eq!(client.base_url(), "http://example.com/api");

        client.set_base_url("   ");
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
    }
}
