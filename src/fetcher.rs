//! Document retrieval on top of the query client.

use crate::error::QueryError;
use crate::query::QueryClient;
use crate::types::DocumentPayload;

/// Retrieves one document's payload by identifier
///
/// Rejects payloads that lack a file name or content instead of passing a
/// half-formed document on to storage. Empty content is not missing: it
/// decodes to a zero-byte document.
#[derive(Clone)]
pub struct DocumentFetcher {
    client: QueryClient,
}

impl DocumentFetcher {
    /// Create a fetcher over an existing query client
    pub fn new(client: QueryClient) -> Self {
        Self { client }
    }

    /// Fetch and validate a document payload
    ///
    /// # Errors
    /// Any [`QueryError`] from the query, or
    /// [`QueryError::IncompletePayload`] when `fileName` is missing or blank,
    /// or `data` is missing or null.
    pub async fn fetch(
        &self,
        document_id: &str,
        secret_code: &str,
    ) -> Result<DocumentPayload, QueryError> {
        let response = self.client.query_document(document_id, secret_code).await?;

        let file_name = response
            .file_name
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| QueryError::IncompletePayload {
                id: document_id.to_string(),
                missing: "fileName",
            })?;
        let data = response
            .data
            .ok_or_else(|| QueryError::IncompletePayload {
                id: document_id.to_string(),
                missing: "data",
            })?;

        Ok(DocumentPayload { file_name, data })
    }
}
