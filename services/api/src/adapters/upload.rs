//! services/api/src/adapters/upload.rs
//!
//! The `DocumentSource` implementation for files received in a multipart
//! upload: only text extensions are accepted and the body must be UTF-8.

use async_trait::async_trait;
use std::path::Path;
use support_chat_core::ports::{DocumentSource, PortError, PortResult};

/// Extensions accepted as knowledge-base documents.
pub const ACCEPTED_EXTENSIONS: &[&str] = &["txt", "md", "json", "csv"];

fn check_extension(name: &str) -> PortResult<()> {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    if ACCEPTED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(())
    } else {
        Err(PortError::Decode(format!("Unsupported file type: .{}", ext)))
    }
}

fn decode(bytes: Vec<u8>) -> PortResult<String> {
    String::from_utf8(bytes)
        .map_err(|e| PortError::Decode(format!("File is not valid UTF-8 text: {}", e)))
}

/// A file received in a multipart request body.
#[derive(Debug)]
pub struct UploadedFile {
    name: String,
    bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

#[async_trait]
impl DocumentSource for UploadedFile {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read_text(&self) -> PortResult<String> {
        check_extension(&self.name)?;
        decode(self.bytes.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn accepts_text_extensions_case_insensitively() {
        for name in ["faq.txt", "Guide.MD", "data.json", "prices.Csv"] {
            let file = UploadedFile::new(name, b"hello".to_vec());
            assert_eq!(file.read_text().await.unwrap(), "hello", "{name}");
        }
    }

    #[tokio::test]
    async fn rejects_other_extensions() {
        for name in ["logo.png", "report.pdf", "README"] {
            let file = UploadedFile::new(name, b"hello".to_vec());
            assert!(matches!(file.read_text().await, Err(PortError::Decode(_))), "{name}");
        }
    }

    #[tokio::test]
    async fn rejects_invalid_utf8() {
        let file = UploadedFile::new("notes.txt", vec![0xff, 0xfe, 0x00]);
        assert!(matches!(file.read_text().await, Err(PortError::Decode(_))));
    }
}
