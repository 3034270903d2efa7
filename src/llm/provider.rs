// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Completion transport trait and related types
//!
//! The session only needs something that takes routed request parameters and
//! hands back a list of choices. How that happens (HTTP, SDK, mock) lives
//! behind [`CompletionTransport`].

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::llm::message::MessageEntry;

/// Executes completion requests
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    /// Transport name, used in logs
    fn name(&self) -> &str;

    /// Non-streaming completion
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;
}

/// Transport-ready request parameters
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Model identifier, possibly provider-prefixed
    pub model: String,

    /// Messages in the conversation
    pub messages: Vec<MessageEntry>,

    /// Credential, passed through unchanged
    pub api_key: String,

    /// Base URL override
    pub api_base: Option<String>,

    /// Wire protocol override
    pub custom_llm_provider: Option<String>,

    /// Extra HTTP headers
    pub extra_headers: Option<BTreeMap<String, String>>,

    /// Any other caller-supplied parameters (temperature, max_tokens, ...)
    pub extra_params: BTreeMap<String, serde_json::Value>,
}

/// Response from a completion request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Response ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Model used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Candidate completions
    #[serde(default)]
    pub choices: Vec<Choice>,

    /// Token usage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// One candidate completion
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub message: Option<ResponseMessage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Message carried by a choice
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(default)]
    pub content: Option<String>,
}

/// Token usage statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
}

impl CompletionResponse {
    /// Build a single-choice response carrying `content`
    pub fn from_text(content: impl Into<String>) -> Self {
        Self {
            choices: vec![Choice {
                message: Some(ResponseMessage {
                    role: Some("assistant".to_string()),
                    content: Some(content.into()),
                }),
                finish_reason: Some("stop".to_string()),
            }],
            ..Default::default()
        }
    }

    /// Content of the first choice's message, if any
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.as_deref())
    }
}

impl Usage {
    /// Get total tokens used
    pub fn total_tokens(&self) -> u32 {
        self.prompt_tokens.saturating_add(self.completion_tokens)
    }
}
