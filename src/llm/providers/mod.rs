// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Transport implementations

pub mod openai_compat;

pub use openai_compat::OpenAiCompatTransport;
