// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! LLM module for confab
//!
//! Content model, conversation history, provider routing and the transports
//! that carry requests to a model.

pub mod content;
pub mod decompose;
pub mod message;
pub mod mock_transport;
pub mod provider;
pub mod providers;
pub mod routing;

pub use content::{ContentPart, UserTurn};
pub use decompose::{decompose, Decomposed, ImageData};
pub use message::*;
pub use provider::*;
pub use routing::{ProviderConfig, RoutingPolicy};
