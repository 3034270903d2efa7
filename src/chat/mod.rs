// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Chat session management
//!
//! This module provides the conversation session: history ownership,
//! provider switching and the text and multimodal send paths.

mod session;

pub use session::{ChatSession, ChatSessionBuilder, APP_ID_HEADER, APP_URL_ENV};
