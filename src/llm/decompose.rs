// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Split a model reply into text and inline data-URI images.
//!
//! Producers give no delimiter contract, so the reply is cut on every
//! `data:image/` marker. Everything before the first marker is text; every
//! later segment is parsed as `data:<mime>;base64,<payload>` and dropped if it
//! lacks the `;base64,` separator. A payload runs to the next marker, so text
//! written after an image stays glued to that image's data.

use serde::{Deserialize, Serialize};

const IMAGE_MARKER: &str = "data:image/";
const BASE64_SEPARATOR: &str = ";base64,";

/// One image recovered from a reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageData {
    /// e.g. `image/png`
    pub mime_type: String,
    /// Base64 payload, not decoded
    pub data: String,
}

/// Text and images recovered from a reply
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decomposed {
    pub text: Option<String>,
    pub images: Vec<ImageData>,
}

/// Decompose `content`. Never fails.
pub fn decompose(content: &str) -> Decomposed {
    if !content.contains(IMAGE_MARKER) {
        return Decomposed {
            text: Some(content.to_string()).filter(|t| !t.is_empty()),
            images: Vec::new(),
        };
    }

    let mut segments = content.split(IMAGE_MARKER);
    let text = segments
        .next()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    let images = segments
        .filter_map(|segment| {
            let fragment = format!("{IMAGE_MARKER}{segment}");
            let (mime, data) = fragment.split_once(BASE64_SEPARATOR)?;
            Some(ImageData {
                mime_type: mime.strip_prefix("data:").unwrap_or(mime).to_string(),
                data: data.to_string(),
            })
        })
        .collect();

    Decomposed { text, images }
}
