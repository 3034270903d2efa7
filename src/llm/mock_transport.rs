// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Mock completion transport for testing
//!
//! Returns scripted outcomes in order (the last one repeats) and records every
//! request it receives, so tests can assert on routing without a network.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{ApiError, ConfabError, Result};
use crate::llm::provider::{CompletionRequest, CompletionResponse, CompletionTransport};

/// A scripted transport outcome
#[derive(Clone, Debug)]
pub enum MockOutcome {
    /// Return this response
    Response(CompletionResponse),
    /// Fail with a transport error carrying this message
    Error(String),
    /// Never complete
    Pending,
}

/// A mock transport for testing
#[derive(Clone)]
pub struct MockTransport {
    /// Transport name
    name: String,
    /// Scripted outcomes
    outcomes: Arc<Mutex<Vec<MockOutcome>>>,
    /// Call counter
    call_count: Arc<AtomicUsize>,
    /// Recorded requests
    recorded_requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// Create a mock transport that answers "Mock response"
    pub fn new() -> Self {
        Self {
            name: "mock".to_string(),
            outcomes: Arc::new(Mutex::new(vec![MockOutcome::Response(
                CompletionResponse::from_text("Mock response"),
            )])),
            call_count: Arc::new(AtomicUsize::new(0)),
            recorded_requests: Arc::new(Mutex::new(vec![])),
        }
    }

    /// Answer every call with `text`
    pub fn with_response(self, text: impl Into<String>) -> Self {
        self.with_outcomes(vec![MockOutcome::Response(CompletionResponse::from_text(text))])
    }

    /// Queue multiple text responses (returned in order)
    pub fn with_responses(self, texts: Vec<String>) -> Self {
        self.with_outcomes(
            texts
                .into_iter()
                .map(|t| MockOutcome::Response(CompletionResponse::from_text(t)))
                .collect(),
        )
    }

    /// Answer every call with a raw response
    pub fn with_raw_response(self, response: CompletionResponse) -> Self {
        self.with_outcomes(vec![MockOutcome::Response(response)])
    }

    /// Fail every call
    pub fn with_error(self, message: impl Into<String>) -> Self {
        self.with_outcomes(vec![MockOutcome::Error(message.into())])
    }

    /// Replace the script
    pub fn with_outcomes(self, outcomes: Vec<MockOutcome>) -> Self {
        {
            let mut script = lock(&self.outcomes);
            script.clear();
            script.extend(outcomes);
        }
        self
    }

    /// Get the number of times complete() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Get all recorded requests
    pub fn recorded_requests(&self) -> Vec<CompletionRequest> {
        lock(&self.recorded_requests).clone()
    }

    /// Get the last request made
    pub fn last_request(&self) -> Option<CompletionRequest> {
        lock(&self.recorded_requests).last().cloned()
    }

    fn next_outcome(&self) -> MockOutcome {
        let count = self.call_count.fetch_add(1, Ordering::SeqCst);
        let script = lock(&self.outcomes);
        match script.len() {
            0 => MockOutcome::Response(CompletionResponse::default()),
            len => script[count.min(len - 1)].clone(),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("Mock transport lock was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

#[async_trait]
impl CompletionTransport for MockTransport {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        lock(&self.recorded_requests).push(request);

        match self.next_outcome() {
            MockOutcome::Response(response) => Ok(response),
            MockOutcome::Error(message) => Err(ConfabError::Api(ApiError::Network(message))),
            MockOutcome::Pending => std::future::pending().await,
        }
    }
}
