// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! confab - provider-agnostic conversational sessions over LLM backends.
//!
//! This crate exposes the session layer used by the `confab` CLI
//! (`src/main.rs`) and by library callers.
//!
//! Architecture highlights:
//! - `chat`: the session that owns history and drives sends
//! - `llm`: content model, history, routing, reply decomposition and transports
//! - `config`: user settings in `~/.confab/settings.json`
//! - `cli`: argument definitions for the binary

pub mod chat;
pub mod cli;
pub mod config;
pub mod error;
pub mod llm;

pub use error::{ConfabError, Result};
