//! In-memory registry of uploaded documents and their extracted text.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::Serialize;

/// Extracted text of one uploaded file.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentRecord {
    pub text: String,
    pub file_path: String,
    /// RFC 3339 upload time.
    pub timestamp: String,
}

/// Documents keyed by their sanitized filename. Re-uploading replaces.
#[derive(Debug, Default)]
pub struct DocumentStore {
    records: RwLock<HashMap<String, DocumentRecord>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, filename: impl Into<String>, text: String, file_path: String) -> DocumentRecord {
        let record = DocumentRecord {
            text,
            file_path,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        self.records.write().insert(filename.into(), record.clone());
        record
    }

    pub fn get(&self, filename: &str) -> Option<DocumentRecord> {
        self.records.read().get(filename).cloned()
    }

    pub fn text(&self, filename: &str) -> Option<String> {
        self.records.read().get(filename).map(|r| r.text.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_lookup() {
        let store = DocumentStore::new();
        assert!(store.get("paper.pdf").is_none());

        store.insert("paper.pdf", "abstract".into(), "data/uploads/paper.pdf".into());
        assert_eq!(store.text("paper.pdf").as_deref(), Some("abstract"));
        assert_eq!(store.get("paper.pdf").unwrap().file_path, "data/uploads/paper.pdf");
        assert!(store.get("other.pdf").is_none());
    }

    #[test]
    fn test_reupload_replaces() {
        let store = DocumentStore::new();
        store.insert("a.txt", "old".into(), "p".into());
        store.insert("a.txt", "new".into(), "p".into());
        assert_eq!(store.text("a.txt").as_deref(), Some("new"));
    }
}
