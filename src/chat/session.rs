// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Chat session management
//!
//! A [`ChatSession`] owns one conversation: its history, the active provider
//! configuration and the transport used to reach the model. Sends take
//! `&mut self`, so a session never has two requests in flight.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{ConfabError, Result};
use crate::llm::content::UserTurn;
use crate::llm::decompose::{decompose, ImageData};
use crate::llm::message::{render_turn, ContentBlock, History, MessageContent, MessageEntry, Role};
use crate::llm::provider::{CompletionResponse, CompletionTransport};
use crate::llm::routing::{ProviderConfig, RoutingPolicy};

/// Environment variable whose value becomes the `X-App-ID` header
pub const APP_URL_ENV: &str = "APP_URL";

/// Header carrying the application identifier
pub const APP_ID_HEADER: &str = "X-App-ID";

/// Encapsulates all state for one conversation
pub struct ChatSession {
    /// Opaque identifier, only used for correlation in logs
    session_id: String,

    /// Conversation history, system entry first
    history: History,

    /// Active provider configuration
    config: ProviderConfig,

    /// Proxy and capability rules
    routing: RoutingPolicy,

    /// Transport used for completions
    transport: Arc<dyn CompletionTransport>,
}

/// Builder for creating ChatSession instances
pub struct ChatSessionBuilder {
    api_key: String,
    session_id: Option<String>,
    system_message: String,
    initial_messages: Option<Vec<MessageEntry>>,
    custom_headers: BTreeMap<String, String>,
    app_id: Option<String>,
    provider: Option<(String, String)>,
    routing: Option<RoutingPolicy>,
    transport: Option<Arc<dyn CompletionTransport>>,
}

impl ChatSessionBuilder {
    /// Create a new builder for `api_key`
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            session_id: None,
            system_message: String::new(),
            initial_messages: None,
            custom_headers: BTreeMap::new(),
            app_id: None,
            provider: None,
            routing: None,
            transport: None,
        }
    }

    /// Set the session identifier (a random one is generated otherwise)
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Set the system prompt
    pub fn with_system_message(mut self, system_message: impl Into<String>) -> Self {
        self.system_message = system_message.into();
        self
    }

    /// Seed the history; replaces the system-prompt-only default verbatim
    pub fn with_initial_messages(mut self, messages: Vec<MessageEntry>) -> Self {
        self.initial_messages = Some(messages);
        self
    }

    /// Add several custom headers
    pub fn with_custom_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.custom_headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Set the application identifier. Falls back to `APP_URL` when unset.
    pub fn with_app_id(mut self, app_id: Option<String>) -> Self {
        self.app_id = app_id;
        self
    }

    /// Set the initial provider and model
    pub fn with_model(mut self, provider: impl Into<String>, model: impl Into<String>) -> Self {
        self.provider = Some((provider.into(), model.into()));
        self
    }

    /// Set the routing policy. Defaults to [`RoutingPolicy::from_env`].
    pub fn with_routing(mut self, routing: RoutingPolicy) -> Self {
        self.routing = Some(routing);
        self
    }

    /// Set the completion transport
    pub fn with_transport(mut self, transport: Arc<dyn CompletionTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the ChatSession
    pub fn build(self) -> Result<ChatSession> {
        let transport = self
            .transport
            .ok_or_else(|| ConfabError::Config("No completion transport set".into()))?;

        let mut config = ProviderConfig::new(self.api_key);
        if let Some((provider, model)) = self.provider {
            config.set_model(provider, model);
        }
        config.custom_headers = self.custom_headers;

        let app_id = self.app_id.or_else(|| {
            std::env::var(APP_URL_ENV)
                .ok()
                .filter(|value| !value.is_empty())
        });
        if let Some(app_id) = app_id {
            config.custom_headers.insert(APP_ID_HEADER.to_string(), app_id);
        }

        let history = match self.initial_messages {
            Some(messages) => History::from_entries(messages),
            None => History::new(self.system_message),
        };

        let session_id = self
            .session_id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        tracing::debug!(
            session_id = %session_id,
            provider = %config.provider,
            model = %config.model,
            transport = transport.name(),
            "Chat session created"
        );

        Ok(ChatSession {
            session_id,
            history,
            config,
            routing: self.routing.unwrap_or_else(RoutingPolicy::from_env),
            transport,
        })
    }
}

/// Undoes the user append if a send is dropped before it settles.
struct PendingTurn<'a> {
    history: &'a mut History,
    rollback_len: usize,
    armed: bool,
}

impl<'a> PendingTurn<'a> {
    /// An empty turn adds no user entry.
    fn begin(history: &'a mut History, blocks: Vec<ContentBlock>) -> Self {
        let rollback_len = history.len();
        if !blocks.is_empty() {
            history.append(Role::User, MessageContent::Blocks(blocks));
        }
        Self {
            history,
            rollback_len,
            armed: true,
        }
    }

    /// Settle the send, appending the assistant reply when there is one
    fn settle(mut self, reply: Option<&str>) {
        if let Some(text) = reply {
            self.history
                .append(Role::Assistant, MessageContent::Text(text.to_string()));
        }
        self.armed = false;
    }
}

impl Drop for PendingTurn<'_> {
    fn drop(&mut self) {
        if self.armed {
            tracing::warn!("Send interrupted before completion, rolling back user entry");
            self.history.rollback_to(self.rollback_len);
        }
    }
}

impl ChatSession {
    /// Create a session with the default provider and model
    pub fn new(
        api_key: impl Into<String>,
        session_id: impl Into<String>,
        system_message: impl Into<String>,
        transport: Arc<dyn CompletionTransport>,
    ) -> Self {
        let mut config = ProviderConfig::new(api_key);
        if let Some(app_id) = std::env::var(APP_URL_ENV).ok().filter(|v| !v.is_empty()) {
            config.custom_headers.insert(APP_ID_HEADER.to_string(), app_id);
        }

        Self {
            session_id: session_id.into(),
            history: History::new(system_message),
            config,
            routing: RoutingPolicy::from_env(),
            transport,
        }
    }

    /// Create a builder
    pub fn builder(api_key: impl Into<String>) -> ChatSessionBuilder {
        ChatSessionBuilder::new(api_key)
    }

    /// Switch provider and model for subsequent sends
    pub fn with_model(&mut self, provider: impl Into<String>, model: impl Into<String>) -> &mut Self {
        self.config.set_model(provider, model);
        self
    }

    /// Merge extra request parameters for subsequent sends
    pub fn with_params<I, K>(&mut self, params: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, serde_json::Value)>,
        K: Into<String>,
    {
        self.config
            .merge_params(params.into_iter().map(|(k, v)| (k.into(), v)));
        self
    }

    /// Set a single extra request parameter
    pub fn with_param(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> &mut Self {
        self.config.merge_params([(key.into(), value.into())]);
        self
    }

    /// Add several custom headers
    pub fn with_custom_headers<I, K, V>(&mut self, headers: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.config
            .custom_headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Replace the credential
    pub fn set_api_key(&mut self, api_key: impl Into<String>) -> &mut Self {
        self.config.api_key = api_key.into();
        self
    }

    /// Session identifier
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Active provider configuration
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Borrow the history
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Copy of the history as of now
    pub fn messages(&self) -> Vec<MessageEntry> {
        self.history.snapshot()
    }

    /// Send a turn and return the reply text
    pub async fn send(&mut self, turn: UserTurn) -> Result<String> {
        self.check_capability(&turn)?;
        self.log_send("text");

        let pending = PendingTurn::begin(&mut self.history, render_turn(&turn));
        let request = self
            .routing
            .build_request(&self.config, pending.history.snapshot());

        let outcome = match self.transport.complete(request).await {
            Ok(response) => extract_response_text(&response),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(text) => {
                pending.settle(Some(&text));
                tracing::debug!(session_id = %self.session_id, chars = text.len(), "Reply received");
                Ok(text)
            }
            Err(e) => {
                pending.settle(None);
                tracing::warn!(session_id = %self.session_id, error = %e, "Chat completion failed");
                Err(chat_failure("Failed to generate chat completion", e))
            }
        }
    }

    /// Send a turn and split the reply into text and inline images.
    ///
    /// The assistant entry is only recorded when the reply carries text.
    pub async fn send_multimodal(&mut self, turn: UserTurn) -> Result<(Option<String>, Vec<ImageData>)> {
        self.check_capability(&turn)?;
        self.log_send("multimodal");

        let pending = PendingTurn::begin(&mut self.history, render_turn(&turn));
        let request = self
            .routing
            .build_request(&self.config, pending.history.snapshot());

        match self.transport.complete(request).await {
            Ok(response) => {
                let decomposed = response
                    .first_content()
                    .map(decompose)
                    .unwrap_or_default();
                let text = decomposed.text.filter(|t| !t.is_empty());
                pending.settle(text.as_deref());
                tracing::debug!(
                    session_id = %self.session_id,
                    has_text = text.is_some(),
                    images = decomposed.images.len(),
                    "Multimodal reply received"
                );
                Ok((text, decomposed.images))
            }
            Err(e) => {
                pending.settle(None);
                tracing::warn!(session_id = %self.session_id, error = %e, "Multimodal completion failed");
                Err(chat_failure("Failed to generate multimodal completion", e))
            }
        }
    }

    fn check_capability(&self, turn: &UserTurn) -> Result<()> {
        if self
            .routing
            .first_unsupported(&self.config.provider, turn)
            .is_some()
        {
            return Err(ConfabError::Capability(format!(
                "File attachments are only supported with the {} provider (active: {})",
                self.routing.file_capable_provider, self.config.provider
            )));
        }
        Ok(())
    }

    fn log_send(&self, kind: &str) {
        let route = if self.routing.is_proxy_key(&self.config.api_key) {
            "proxy"
        } else {
            "direct"
        };
        tracing::info!(
            session_id = %self.session_id,
            provider = %self.config.provider,
            model = %self.config.model,
            route,
            kind,
            "Sending turn"
        );
    }
}

/// Text of the first choice's message
fn extract_response_text(response: &CompletionResponse) -> Result<String> {
    response
        .first_content()
        .map(str::to_string)
        .ok_or_else(|| ConfabError::Chat("Failed to extract response text".to_string()))
}

fn chat_failure(context: &str, err: ConfabError) -> ConfabError {
    let detail = match err {
        ConfabError::Chat(message) => message,
        other => other.to_string(),
    };
    ConfabError::Chat(format!("{}: {}", context, detail))
}
