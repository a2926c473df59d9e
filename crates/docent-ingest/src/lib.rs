//! Document ingestion: file type detection and plain-text extraction.

pub mod file;

pub use file::{extract_text, sanitize_filename, FileType};
