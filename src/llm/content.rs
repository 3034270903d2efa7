// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! User-supplied content
//!
//! A [`UserTurn`] is optional text plus an ordered list of [`ContentPart`]s.
//! Part payloads are fixed at construction; file-backed parts read and encode
//! their source eagerly so a bad path fails before any session is involved.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{ConfabError, Result};

/// One unit of user-supplied content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    /// Plain text
    Text(String),
    /// Base64-encoded image bytes
    Image(ImagePayload),
    /// Base64-encoded file bytes with a declared MIME type
    File(FilePayload),
}

/// Already-encoded image data. Not validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    data: String,
}

/// Encoded file contents plus the MIME type the caller declared for them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePayload {
    mime_type: String,
    data: String,
}

impl ContentPart {
    /// Create a text part
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text(text.into())
    }

    /// Create an image part from base64 data
    pub fn image(base64_data: impl Into<String>) -> Self {
        ContentPart::Image(ImagePayload {
            data: base64_data.into(),
        })
    }

    /// Read an image file and encode it
    pub fn image_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let data = read_base64(path.as_ref())?;
        Ok(ContentPart::Image(ImagePayload { data }))
    }

    /// Read a file and encode it, keeping `mime_type` verbatim
    pub fn file_with_mime_type(mime_type: impl Into<String>, path: impl AsRef<Path>) -> Result<Self> {
        let data = read_base64(path.as_ref())?;
        Ok(ContentPart::File(FilePayload {
            mime_type: mime_type.into(),
            data,
        }))
    }

    /// Whether this part is a file attachment
    pub fn is_file(&self) -> bool {
        matches!(self, ContentPart::File(_))
    }
}

impl ImagePayload {
    /// The base64 payload
    pub fn data(&self) -> &str {
        &self.data
    }
}

impl FilePayload {
    /// The declared MIME type
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// The base64 payload
    pub fn data(&self) -> &str {
        &self.data
    }
}

fn read_base64(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ConfabError::NotFound(path.to_path_buf()),
        _ => ConfabError::Io(e),
    })?;
    Ok(STANDARD.encode(bytes))
}

/// A caller-submitted turn
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserTurn {
    /// Leading text, rendered before any parts
    pub text: Option<String>,
    /// Parts in submission order
    pub parts: Vec<ContentPart>,
}

impl UserTurn {
    /// Create an empty turn
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a text-only turn
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            parts: Vec::new(),
        }
    }

    /// Append a content part
    pub fn with_part(mut self, part: ContentPart) -> Self {
        self.parts.push(part);
        self
    }

    /// Append several content parts
    pub fn with_parts(mut self, parts: impl IntoIterator<Item = ContentPart>) -> Self {
        self.parts.extend(parts);
        self
    }

    /// Whether any part is a file attachment
    pub fn has_file_parts(&self) -> bool {
        self.parts.iter().any(ContentPart::is_file)
    }
}

impl From<&str> for UserTurn {
    fn from(text: &str) -> Self {
        UserTurn::text(text)
    }
}

impl From<String> for UserTurn {
    fn from(text: String) -> Self {
        UserTurn::text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_text_part_accepts_empty() {
        assert_eq!(ContentPart::text(""), ContentPart::Text(String::new()));
    }

    #[test]
    fn test_image_part_is_not_validated() {
        let part = ContentPart::image("not base64 at all!");
        match part {
            ContentPart::Image(img) => assert_eq!(img.data(), "not base64 at all!"),
            _ => panic!("Expected image part"),
        }
    }

    #[test]
    fn test_file_part_reads_and_encodes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"hello").unwrap();

        let part = ContentPart::file_with_mime_type("application/pdf", file.path()).unwrap();
        match part {
            ContentPart::File(f) => {
                assert_eq!(f.mime_type(), "application/pdf");
                assert_eq!(f.data(), "aGVsbG8=");
            }
            _ => panic!("Expected file part"),
        }
    }

    #[test]
    fn test_file_part_missing_path_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.pdf");

        let err = ContentPart::file_with_mime_type("application/pdf", &missing).unwrap_err();
        match err {
            ConfabError::NotFound(path) => assert_eq!(path, missing),
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_file_part_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ContentPart::file_with_mime_type("text/plain", dir.path()).unwrap_err();
        assert!(matches!(err, ConfabError::Io(_)));
    }

    #[test]
    fn test_image_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0x89, b'P', b'N', b'G']).unwrap();

        let part = ContentPart::image_from_path(file.path()).unwrap();
        assert_eq!(part, ContentPart::image("iVBORw=="));
    }

    #[test]
    fn test_turn_builders_preserve_order() {
        let turn = UserTurn::text("look")
            .with_part(ContentPart::image("AAA"))
            .with_parts(vec![ContentPart::text("and"), ContentPart::image("BBB")]);

        assert_eq!(turn.text.as_deref(), Some("look"));
        assert_eq!(turn.parts.len(), 3);
        assert_eq!(turn.parts[2], ContentPart::image("BBB"));
        assert!(!turn.has_file_parts());
    }

    #[test]
    fn test_empty_turn_is_legal() {
        let turn = UserTurn::new();
        assert!(turn.text.is_none());
        assert!(turn.parts.is_empty());
    }
}
