//! File text extraction for uploaded documents.

use std::path::Path;

use docent_core::{Error, Result};
use tracing::{debug, warn};

/// Supported file types for text extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    PlainText,
    Markdown,
    Pdf,
    Unknown,
}

impl FileType {
    /// Detect file type from extension.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "txt" | "text" => Self::PlainText,
            "md" | "mdx" => Self::Markdown,
            "pdf" => Self::Pdf,
            _ => Self::Unknown,
        }
    }

    pub fn from_filename(name: &str) -> Self {
        Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::Unknown)
    }
}

/// Extract plain text from uploaded bytes.
///
/// PDF pages come back newline-separated; the result is trimmed and must
/// not be empty.
pub fn extract_text(filename: &str, bytes: &[u8]) -> Result<String> {
    let text = match FileType::from_filename(filename) {
        FileType::Pdf => pdf_extract::extract_text_from_mem(bytes).map_err(|e| {
            warn!("PDF extraction failed for {}: {}", filename, e);
            Error::Extraction(format!("{}: {}", filename, e))
        })?,
        FileType::PlainText | FileType::Markdown => String::from_utf8(bytes.to_vec())
            .map_err(|_| Error::Extraction(format!("{} is not valid UTF-8", filename)))?,
        FileType::Unknown => return Err(Error::UnsupportedFile(filename.to_string())),
    };

    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(Error::Extraction(format!("no text found in {}", filename)));
    }
    debug!("Extracted {} chars from {}", text.len(), filename);
    Ok(text)
}

/// Sanitize a filename to prevent path traversal.
pub fn sanitize_filename(name: &str) -> String {
    let name = name
        .replace('/', "")
        .replace('\\', "")
        .replace("..", "");

    Path::new(&name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unnamed")
        .to_string()
}
