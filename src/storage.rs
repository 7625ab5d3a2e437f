//! Local persistence of documents and case summaries.
//!
//! All files live in one flat output directory. Documents are named
//! `<documentId>_<fileName>`; the raw case JSON is named
//! `getSharedInfoByVP_<caseNumber>_<secretCode>.json`. Name components coming
//! from the registry are sanitised so they cannot address anything outside
//! that directory.
//!
//! Writes go to a uniquely named hidden file first and are renamed into
//! place, so a reader never sees a partially written document under its
//! final name. Temp names contain no `_`, which every final name does.

use crate::error::StorageError;
use crate::types::{CaseIdentifier, PersistedDocument, WriteOutcome};
use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Standard alphabet, padding optional
const TRANSPORT_ENCODING: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Writes documents into a flat output directory
#[derive(Clone, Debug)]
pub struct PersistenceStore {
    output_dir: PathBuf,
}

impl PersistenceStore {
    /// Create a store rooted at `output_dir` (not created until
    /// [`ensure_output_dir`](Self::ensure_output_dir) or a write)
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// The output directory
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Create the output directory if it does not exist
    pub async fn ensure_output_dir(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.output_dir).await
    }

    /// Deterministic path of a document: `<output_dir>/<documentId>_<fileName>`
    pub fn document_path(&self, document_id: &str, file_name: &str) -> PathBuf {
        self.output_dir.join(format!(
            "{}_{}",
            sanitize_component(document_id),
            sanitize_component(file_name)
        ))
    }

    /// Deterministic path of the case summary file
    pub fn case_summary_path(&self, case: &CaseIdentifier) -> PathBuf {
        self.output_dir.join(format!(
            "getSharedInfoByVP_{}_{}.json",
            sanitize_component(&case.case_number),
            sanitize_component(&case.secret_code)
        ))
    }

    /// Whether a file exists at `path`
    pub async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    /// Decode `encoded` and write it to `path`
    ///
    /// If the file exists and `force` is false nothing is decoded or written
    /// and [`WriteOutcome::Skipped`] is returned.
    ///
    /// # Errors
    /// [`StorageError::Decode`] if the content is not valid base64, or
    /// [`StorageError::Write`] if the file cannot be written.
    pub async fn write(
        &self,
        path: &Path,
        encoded: &str,
        force: bool,
    ) -> Result<WriteOutcome, StorageError> {
        if self.exists(path).await {
            if !force {
                debug!(path = %path.display(), "document already exists, skipping");
                return Ok(WriteOutcome::Skipped {
                    path: path.to_path_buf(),
                });
            }
            debug!(path = %path.display(), "document already exists, overwriting");
        }

        self.overwrite(path, encoded).await.map(WriteOutcome::Written)
    }

    /// Decode `encoded` and write it to `path`, replacing any existing file
    ///
    /// # Errors
    /// Same as [`write`](Self::write).
    pub async fn overwrite(
        &self,
        path: &Path,
        encoded: &str,
    ) -> Result<PersistedDocument, StorageError> {
        let bytes = decode_transport(encoded).map_err(|e| StorageError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        write_atomic(path, &bytes).await?;
        info!(path = %path.display(), size_bytes = bytes.len(), "document saved");

        Ok(PersistedDocument {
            path: path.to_path_buf(),
            bytes,
        })
    }

    /// Write the raw case JSON, replacing any previous summary
    ///
    /// # Errors
    /// [`StorageError::Encode`] if the JSON cannot be serialized, or
    /// [`StorageError::Write`] if the file cannot be written.
    pub async fn write_case_summary(
        &self,
        case: &CaseIdentifier,
        raw: &serde_json::Value,
    ) -> Result<PathBuf, StorageError> {
        let path = self.case_summary_path(case);
        let bytes = serde_json::to_vec(raw).map_err(|source| StorageError::Encode {
            path: path.clone(),
            source,
        })?;
        write_atomic(&path, &bytes).await?;
        info!(case_number = %case.case_number, path = %path.display(), "case summary saved");
        Ok(path)
    }
}

/// Decode transport-encoded content, ignoring embedded whitespace
pub fn decode_transport(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let compact: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    TRANSPORT_ENCODING.decode(compact)
}

/// Make a registry-provided string safe to use inside a single file name
fn sanitize_component(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}

/// Write through a fresh temp file in the same directory, then rename
///
/// The temp file is removed when any step fails.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let write_err = |source: std::io::Error| StorageError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = path
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let temp_path = tempfile::Builder::new()
        .prefix(".tmp")
        .suffix(".part")
        .tempfile_in(dir)
        .map_err(write_err)?
        .into_temp_path();

    tokio::fs::write(&temp_path, bytes).await.map_err(write_err)?;
    temp_path.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
