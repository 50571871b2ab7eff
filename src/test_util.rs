// Test doubles shared by the unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::api::transport::{ApiRequest, ApiResponse, Transport};
use crate::error::{MemoError, Result};

/// Transport that replays queued responses and records every request.
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<ApiResponse>>>,
    requests: Mutex<Vec<ApiRequest>>,
    hang: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            hang: false,
        }
    }

    /// A transport that records the request and then never answers.
    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::new()
        }
    }

    /// Queues a canned response for the next request.
    pub fn push_response(&self, status: u16, body: &str) {
        self.responses.lock().unwrap().push_back(Ok(ApiResponse {
            status,
            body: body.to_string(),
        }));
    }

    /// Queues a failure for the next request.
    pub fn push_error(&self, error: MemoError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// How many requests reached this transport.
    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Everything that was asked of this transport, in order.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
        self.requests.lock().unwrap().push(request);
        if self.hang {
            // Far longer than any caller's deadline.
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(MemoError::Transport("no canned response queued".into())))
    }
}
