use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::debug;

use crate::core::{ChatClient, ChatMessage};
use crate::error::AIError;

pub const MOCK_MODEL: &str = "mock";

/// What the mock answers with for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockResponse {
    Text(String),
    Error(String),
}

impl MockResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }
}

#[derive(Debug, Default)]
struct MockState {
    queued: VecDeque<MockResponse>,
    fallback: Option<MockResponse>,
    requests: Vec<Vec<ChatMessage>>,
}

/// Shared control over a [`MockClient`]: queue answers, inspect what was sent.
#[derive(Debug, Default)]
pub struct MockHandle {
    state: Mutex<MockState>,
}

impl MockHandle {
    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A panicking test thread must not hide the recorded requests from the others
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn push(&self, response: MockResponse) {
        self.lock().queued.push_back(response);
    }

    /// Answer used once the queue is empty.
    pub fn set_fallback(&self, response: MockResponse) {
        self.lock().fallback = Some(response);
    }

    pub fn call_count(&self) -> usize {
        self.lock().requests.len()
    }

    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.lock().requests.clone()
    }

    pub fn last_request(&self) -> Option<Vec<ChatMessage>> {
        self.lock().requests.last().cloned()
    }
}

/// Offline client that replays scripted responses and records every request.
#[derive(Debug, Clone)]
pub struct MockClient {
    handle: Arc<MockHandle>,
}

impl MockClient {
    pub fn new() -> (Self, Arc<MockHandle>) {
        let handle = Arc::new(MockHandle::default());
        (Self { handle: Arc::clone(&handle) }, handle)
    }

    pub fn with_responses(responses: Vec<MockResponse>) -> (Self, Arc<MockHandle>) {
        let (client, handle) = Self::new();
        for response in responses {
            handle.push(response);
        }
        (client, handle)
    }
}

#[async_trait]
impl ChatClient for MockClient {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, AIError> {
        let response = {
            let mut state = self.handle.lock();
            state.requests.push(messages);
            state.queued.pop_front().or_else(|| state.fallback.clone())
        };
        debug!(calls = self.handle.call_count(), "Mock completion");

        match response {
            Some(MockResponse::Text(text)) => Ok(text),
            Some(MockResponse::Error(message)) => Err(AIError::Mock(message)),
            None => Ok("(mock tutor) No scripted response.".to_string()),
        }
    }

    fn model(&self) -> &str {
        MOCK_MODEL
    }

    fn clone_box(&self) -> Box<dyn ChatClient> {
        Box::new(self.clone())
    }
}
