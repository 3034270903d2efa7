// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Message types for LLM interactions
//!
//! Entries serialize to the OpenAI chat shape: plain string content for
//! system and assistant entries, a list of typed blocks for user turns.

use serde::{Deserialize, Serialize};

use crate::llm::content::{ContentPart, UserTurn};

/// A single entry in the conversation history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEntry {
    /// Role of the message sender
    pub role: Role,

    /// Content of the message
    pub content: MessageContent,
}

/// Role of the message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System prompt
    System,
    /// User message
    User,
    /// Assistant response
    Assistant,
}

/// Content of a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Simple text content
    Text(String),
    /// Rendered content blocks
    Blocks(Vec<ContentBlock>),
}

/// A rendered block of user content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Text content
    Text { text: String },

    /// Inline image as a data URI
    ImageUrl { image_url: ImageUrl },

    /// Inline file as a data URI
    File { file: FileData },
}

/// Image reference inside an `image_url` block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

/// File payload inside a `file` block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileData {
    pub file_data: String,
}

impl MessageEntry {
    /// Create a system entry
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: MessageContent::Text(content.into()),
        }
    }

    /// Create a plain-text user entry
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(content.into()),
        }
    }

    /// Create an assistant entry
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::Text(content.into()),
        }
    }

    /// Get the text content of the entry (first text block for block content)
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            MessageContent::Text(text) => Some(text),
            MessageContent::Blocks(blocks) => blocks.iter().find_map(|block| {
                if let ContentBlock::Text { text } = block {
                    Some(text.as_str())
                } else {
                    None
                }
            }),
        }
    }
}

impl ContentBlock {
    /// Render a single content part.
    ///
    /// Images always get an `image/png` data URI whatever their real format;
    /// downstream consumers depend on that exact prefix.
    pub fn from_part(part: &ContentPart) -> Self {
        match part {
            ContentPart::Text(text) => ContentBlock::Text { text: text.clone() },
            ContentPart::Image(image) => ContentBlock::ImageUrl {
                image_url: ImageUrl {
                    url: format!("data:image/png;base64,{}", image.data()),
                },
            },
            ContentPart::File(file) => ContentBlock::File {
                file: FileData {
                    file_data: format!("data:{};base64,{}", file.mime_type(), file.data()),
                },
            },
        }
    }
}

/// Render a turn into ordered content blocks: leading text first (if
/// non-empty), then one block per part.
pub fn render_turn(turn: &UserTurn) -> Vec<ContentBlock> {
    let mut blocks = Vec::with_capacity(turn.parts.len() + 1);
    if let Some(text) = turn.text.as_deref().filter(|t| !t.is_empty()) {
        blocks.push(ContentBlock::Text {
            text: text.to_string(),
        });
    }
    blocks.extend(turn.parts.iter().map(ContentBlock::from_part));
    blocks
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::System => write!(f, "system"),
        }
    }
}

/// Append-only conversation history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    entries: Vec<MessageEntry>,
}

impl History {
    /// Create a history holding only the system prompt
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            entries: vec![MessageEntry::system(system_prompt)],
        }
    }

    /// Create a history from pre-seeded entries, taken verbatim
    pub fn from_entries(entries: Vec<MessageEntry>) -> Self {
        Self { entries }
    }

    /// Add an entry at the tail
    pub fn append(&mut self, role: Role, content: MessageContent) {
        self.entries.push(MessageEntry { role, content });
    }

    /// Owned copy of every entry as of now
    pub fn snapshot(&self) -> Vec<MessageEntry> {
        self.entries.clone()
    }

    /// Borrow the entries
    pub fn entries(&self) -> &[MessageEntry] {
        &self.entries
    }

    /// Get entry count
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the history is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the last entry
    pub fn last(&self) -> Option<&MessageEntry> {
        self.entries.last()
    }

    /// Get the last assistant entry
    pub fn last_assistant(&self) -> Option<&MessageEntry> {
        self.entries.iter().rev().find(|m| m.role == Role::Assistant)
    }

    /// Drop entries past `len`. Only used to undo an interrupted send.
    pub(crate) fn rollback_to(&mut self, len: usize) {
        self.entries.truncate(len);
    }
}
