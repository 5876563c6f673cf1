//! Scripted chat model for tests and dry runs.

use super::{ChatModel, ChatRequest};
use crate::error::ProviderError;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

type Responder = Box<dyn Fn(&ChatRequest) -> Result<String, ProviderError> + Send + Sync>;

/// A mock chat model.
///
/// Queued responses are returned first, in order; once the queue is empty
/// the fallback responder (if any) answers, otherwise the call fails.
pub struct MockChatModel {
    queued: Mutex<VecDeque<Result<String, ProviderError>>>,
    fallback: Option<Responder>,
    requests: Mutex<Vec<ChatRequest>>,
    call_count: AtomicUsize,
}

impl MockChatModel {
    /// Create a mock with no responses (every call fails).
    pub fn new() -> Self {
        Self {
            queued: Mutex::new(VecDeque::new()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
        }
    }

    /// Create a mock with pre-configured responses.
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mock = Self::new();
        mock.queued
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend(responses.into_iter().map(|r| Ok(r.into())));
        mock
    }

    /// Answer every request with a function of the request.
    pub fn responding_with<F>(responder: F) -> Self
    where
        F: Fn(&ChatRequest) -> Result<String, ProviderError> + Send + Sync + 'static,
    {
        Self {
            fallback: Some(Box::new(responder)),
            ..Self::new()
        }
    }

    /// Queue an error for the next unanswered call.
    pub fn push_error(&self, error: ProviderError) {
        self.queued
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Err(error));
    }

    /// Number of times `complete` was called.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Default for MockChatModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatModel for MockChatModel {
    fn complete(&self, request: &ChatRequest) -> Result<String, ProviderError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        let queued = self
            .queued
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        match (queued, &self.fallback) {
            (Some(response), _) => response,
            (None, Some(responder)) => responder(request),
            (None, None) => Err(ProviderError::MissingContent {
                provider: "mock".into(),
            }),
        }
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
