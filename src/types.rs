//! Core types and events for registry-dl

use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

/// Identifies a case in the registry
///
/// Both parts are opaque strings supplied by the caller. The secret code is
/// an access token required by every query; it is redacted from `Debug`
/// output.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CaseIdentifier {
    /// Case number
    pub case_number: String,
    /// Access token
    pub secret_code: String,
}

impl CaseIdentifier {
    /// Create a new CaseIdentifier
    pub fn new(case_number: impl Into<String>, secret_code: impl Into<String>) -> Self {
        Self {
            case_number: case_number.into(),
            secret_code: secret_code.into(),
        }
    }
}

impl std::fmt::Debug for CaseIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaseIdentifier")
            .field("case_number", &self.case_number)
            .field("secret_code", &"<redacted>")
            .finish()
    }
}

/// Reference to a document within a case, not yet containing content
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentDescriptor {
    /// Document identifier (the registry sends it as a string or a number)
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// File name declared by the registry
    #[serde(rename = "fileName", default)]
    pub file_name: String,
}

/// An `otherDocs` entry that could not be read as a [`DocumentDescriptor`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RejectedEntry {
    /// Position in the registry's document list
    pub index: usize,
    /// Why the entry was rejected
    pub reason: String,
}

/// Parsed result of a case query
#[derive(Clone, Debug)]
pub struct CaseRecord {
    /// Document descriptors in registry order, unique by id
    pub documents: Vec<DocumentDescriptor>,
    /// Entries of the document list that were skipped as unreadable
    pub rejected: Vec<RejectedEntry>,
    /// The case object exactly as returned, kept for the case summary file
    pub raw: serde_json::Value,
}

impl CaseRecord {
    /// Build a record from the raw `otherDocs` entries
    ///
    /// Each entry is parsed on its own. Unreadable entries are collected in
    /// [`rejected`](Self::rejected) and the rest are kept; a descriptor whose
    /// id was already seen is dropped.
    pub fn from_entries(entries: Vec<serde_json::Value>, raw: serde_json::Value) -> Self {
        let mut seen = std::collections::HashSet::new();
        let mut documents = Vec::with_capacity(entries.len());
        let mut rejected = Vec::new();

        for (index, entry) in entries.into_iter().enumerate() {
            match serde_json::from_value::<DocumentDescriptor>(entry) {
                Ok(descriptor) => {
                    if seen.insert(descriptor.id.clone()) {
                        documents.push(descriptor);
                    }
                }
                Err(e) => rejected.push(RejectedEntry {
                    index,
                    reason: e.to_string(),
                }),
            }
        }

        Self {
            documents,
            rejected,
            raw,
        }
    }
}

/// Document content as returned by the registry
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentPayload {
    /// File name reported with the content
    pub file_name: String,
    /// Base64-encoded content
    pub data: String,
}

/// A document written to local storage during this run
#[derive(Clone, PartialEq, Eq)]
pub struct PersistedDocument {
    /// Final path of the file
    pub path: PathBuf,
    /// Decoded bytes as written
    pub bytes: Vec<u8>,
}

impl PersistedDocument {
    /// File name component of the path, used as display name for notifications
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

impl std::fmt::Debug for PersistedDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistedDocument")
            .field("path", &self.path)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Result of a persistence attempt
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Content was written to the path
    Written(PersistedDocument),
    /// The file already existed and overwrite was not forced
    Skipped {
        /// The existing file
        path: PathBuf,
    },
}

impl WriteOutcome {
    /// The persisted document, if a write happened
    pub fn into_written(self) -> Option<PersistedDocument> {
        match self {
            WriteOutcome::Written(doc) => Some(doc),
            WriteOutcome::Skipped { .. } => None,
        }
    }
}

/// Per-document progress through the pipeline
///
/// `Pending → Fetched → Persisted → Notified` on success. `Failed` and
/// `Skipped` are terminal. A document whose notification fails stays
/// `Persisted`. There is no transition out of `Failed`; the state a document
/// had reached when it failed is reported as the `stage` of
/// [`Event::DocumentFailed`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentState {
    /// Not started
    Pending,
    /// Payload retrieved
    Fetched,
    /// Written to storage
    Persisted,
    /// Written and delivered to the notification channel
    Notified,
    /// Already present on disk, nothing written
    Skipped,
    /// Fetch or write failed
    Failed,
}

impl DocumentState {
    /// Whether the document produced a file during this run
    pub fn is_written(&self) -> bool {
        matches!(self, DocumentState::Persisted | DocumentState::Notified)
    }
}

/// Result of a case run
#[derive(Clone, Debug)]
pub enum CaseDownload {
    /// The case query returned no usable data; nothing was written
    NotFound,
    /// The case was found and every document was attempted
    Completed {
        /// Where the raw case JSON was written
        summary_path: PathBuf,
        /// Documents written during this run, in case order
        documents: Vec<PersistedDocument>,
    },
}

impl CaseDownload {
    /// Documents written during this run (empty for `NotFound`)
    pub fn documents(&self) -> &[PersistedDocument] {
        match self {
            CaseDownload::NotFound => &[],
            CaseDownload::Completed { documents, .. } => documents,
        }
    }
}

/// Effective inputs of one run, however the boundary layer collected them
#[derive(Clone, Debug, Default)]
pub struct RunRequest {
    /// Case number (required unless `document_id` is set)
    pub case_number: Option<String>,
    /// Access token (always required)
    pub secret_code: Option<String>,
    /// Download only this document (implies force overwrite)
    pub document_id: Option<String>,
    /// Replace existing documents in case mode
    pub force_overwrite: bool,
}

/// Result of [`Pipeline::run`](crate::Pipeline::run)
#[derive(Clone, Debug)]
pub enum RunOutput {
    /// Single-document mode
    Document(PersistedDocument),
    /// Case mode
    Case(CaseDownload),
}

impl RunOutput {
    /// Paths written during this run
    pub fn written_paths(&self) -> Vec<PathBuf> {
        match self {
            RunOutput::Document(doc) => vec![doc.path.clone()],
            RunOutput::Case(case) => case.documents().iter().map(|d| d.path.clone()).collect(),
        }
    }
}

/// Event emitted while the pipeline runs
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Case query succeeded
    CaseQueried {
        /// Case number
        case_number: String,
        /// Number of documents listed in the case
        documents: usize,
    },

    /// Case query returned nothing usable
    CaseNotFound {
        /// Case number
        case_number: String,
        /// Machine-readable reason
        reason: String,
    },

    /// Document payload retrieved
    DocumentFetched {
        /// Document ID
        document_id: String,
        /// File name reported by the registry
        file_name: String,
    },

    /// Document written to storage
    DocumentPersisted {
        /// Document ID
        document_id: String,
        /// Final path
        path: PathBuf,
        /// Number of bytes written
        size_bytes: u64,
    },

    /// Document already on disk and overwrite not forced
    DocumentSkipped {
        /// Document ID
        document_id: String,
        /// Existing path
        path: PathBuf,
    },

    /// An entry of the case's document list was unreadable and skipped
    DescriptorRejected {
        /// Case number
        case_number: String,
        /// Position in the document list
        index: usize,
        /// Parse error
        reason: String,
    },

    /// Document fetch or write failed
    DocumentFailed {
        /// Document ID
        document_id: String,
        /// Last state reached before the failure (`pending` or `fetched`)
        stage: DocumentState,
        /// Machine-readable error code
        code: String,
        /// Error message
        error: String,
    },

    /// Document delivered to the notification channel
    DocumentNotified {
        /// Document ID
        document_id: String,
        /// Forwarder name
        channel: String,
    },

    /// Notification channel failed (file stays on disk)
    NotificationFailed {
        /// Document ID
        document_id: String,
        /// Forwarder name
        channel: String,
        /// Error message
        error: String,
    },
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Num(n) => n.to_string(),
    })
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_descriptor_accepts_numeric_id() {
        let d: DocumentDescriptor =
            serde_json::from_value(json!({"id": 123456, "fileName": "a.pdf"})).unwrap();
        assert_eq!(d.id, "123456");
        assert_eq!(d.file_name, "a.pdf");

        let d: DocumentDescriptor = serde_json::from_value(json!({"id": "d1"})).unwrap();
        assert_eq!(d.id, "d1");
        assert_eq!(d.file_name, "");
    }

    #[test]
    fn test_case_record_drops_duplicate_ids_keeping_first() {
        let entries = vec![
            json!({"id": "d1", "fileName": "a.pdf"}),
            json!({"id": "d2", "fileName": "b.pdf"}),
            json!({"id": "d1", "fileName": "copy.pdf"}),
        ];
        let record = CaseRecord::from_entries(entries, json!({}));

        assert_eq!(record.documents.len(), 2);
        assert_eq!(record.documents[0].file_name, "a.pdf");
        assert_eq!(record.documents[1].id, "d2");
        assert!(record.rejected.is_empty());
    }

    #[test]
    fn test_case_record_keeps_valid_entries_next_to_unreadable_ones() {
        let entries = vec![
            json!({"fileName": "orphan.pdf"}),
            json!({"id": "d1", "fileName": "a.pdf"}),
            json!({"id": null, "fileName": "null.pdf"}),
            json!("not an object"),
            json!({"id": 7, "fileName": "b.pdf"}),
        ];
        let record = CaseRecord::from_entries(entries, json!({}));

        let ids: Vec<_> = record.documents.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["d1", "7"]);
        let rejected: Vec<_> = record.rejected.iter().map(|r| r.index).collect();
        assert_eq!(rejected, vec![0, 2, 3]);
    }

    #[test]
    fn test_case_identifier_debug_redacts_secret() {
        let id = CaseIdentifier::new("12345", "abc");
        let debug = format!("{:?}", id);
        assert!(debug.contains("12345"));
        assert!(!debug.contains("abc"));
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = Event::DocumentSkipped {
            document_id: "d1".into(),
            path: PathBuf::from("out/d1_a.pdf"),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "document_skipped");
        assert_eq!(value["document_id"], "d1");
    }

    #[test]
    fn test_failure_event_carries_stage() {
        let event = Event::DocumentFailed {
            document_id: "d1".into(),
            stage: DocumentState::Fetched,
            code: "decode_failed".into(),
            error: "bad".into(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "document_failed");
        assert_eq!(value["stage"], "fetched");
    }

    #[test]
    fn test_document_state_written() {
        assert!(DocumentState::Notified.is_written());
        assert!(DocumentState::Persisted.is_written());
        assert!(!DocumentState::Skipped.is_written());
        assert!(!DocumentState::Failed.is_written());
    }

    #[test]
    fn test_display_name_is_file_component() {
        let doc = PersistedDocument {
            path: PathBuf::from("out/d1_a.pdf"),
            bytes: vec![1, 2, 3],
        };
        assert_eq!(doc.display_name(), "d1_a.pdf");
        assert_eq!(format!("{:?}", doc), r#"PersistedDocument { path: "out/d1_a.pdf", bytes: 3 }"#);
    }
}
