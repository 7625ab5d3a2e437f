//! Registry query client.
//!
//! Every query is a single JSON `POST` to the registry data endpoint. The
//! request carries a `filter` object naming the query kind and the access
//! token; the response is an envelope whose `mParams` field holds the result.
//! A `null` or missing `mParams` means "no data", which is reported as
//! [`QueryError::NotFound`] rather than a transport problem.

use crate::config::RegistryConfig;
use crate::error::{Error, QueryError, Result};
use crate::types::{CaseIdentifier, CaseRecord};
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue, ORIGIN, REFERER};
use serde::{Deserialize, Serialize};
use tracing::debug;

const CASE_QUERY: &str = "getSharedInfoByVP";
const DOCUMENT_QUERY: &str = "otherDecisionDocument";
const RECAPTCHA_ACTION: &str = "view_document";

/// Request body wrapper shared by both query kinds
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryBody<F> {
    filter: F,
    re_captcha_token: &'static str,
    re_captcha_action: &'static str,
}

impl<F> QueryBody<F> {
    fn new(filter: F) -> Self {
        Self {
            filter,
            re_captcha_token: "",
            re_captcha_action: RECAPTCHA_ACTION,
        }
    }
}

#[derive(Serialize)]
struct CaseFilter<'a> {
    #[serde(rename = "VpNum")]
    case_number: &'a str,
    #[serde(rename = "SecretNum")]
    secret_code: &'a str,
    #[serde(rename = "dataType")]
    data_type: &'static str,
}

#[derive(Serialize)]
struct DocumentFilter<'a> {
    #[serde(rename = "ID")]
    document_id: &'a str,
    #[serde(rename = "SecretNum")]
    secret_code: &'a str,
    #[serde(rename = "dataType")]
    data_type: &'static str,
    #[serde(rename = "isArtm")]
    is_artifact: bool,
}

/// Case fields the pipeline reads; entries are parsed one by one later
#[derive(Deserialize)]
struct CaseParams {
    #[serde(rename = "otherDocs", default)]
    documents: Option<Vec<serde_json::Value>>,
}

/// Document fields as returned by the registry, before completeness checks
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct DocumentResponse {
    /// Declared file name
    #[serde(rename = "fileName", default)]
    pub file_name: Option<String>,
    /// Base64-encoded content
    #[serde(default)]
    pub data: Option<String>,
}

/// HTTP client for the registry data endpoint
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct QueryClient {
    http_client: reqwest::Client,
    endpoint: url::Url,
}

impl QueryClient {
    /// Create a new query client
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the endpoint is not a valid URL, or
    /// [`Error::Other`] if the HTTP client cannot be created.
    pub fn new(config: &RegistryConfig) -> Result<Self> {
        let endpoint = url::Url::parse(&config.endpoint).map_err(|e| Error::Config {
            message: format!("invalid registry endpoint '{}': {}", config.endpoint, e),
            key: Some("registry.endpoint".to_string()),
        })?;

        let origin = endpoint.origin().ascii_serialization();
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Ok(value) = HeaderValue::from_str(&origin) {
            headers.insert(ORIGIN, value);
        }
        if let Ok(value) = HeaderValue::from_str(&format!("{}/", origin)) {
            headers.insert(REFERER, value);
        }

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint,
        })
    }

    /// Look up a case and its document list
    ///
    /// # Errors
    /// - [`QueryError::NotFound`] if the registry has no data for the case
    /// - [`QueryError::Transport`] on network failure or non-success status
    /// - [`QueryError::Malformed`] if the body is not a valid case envelope or
    ///   `otherDocs` is not a list. A single unreadable entry of the list is
    ///   not an error; it is reported in [`CaseRecord::rejected`].
    pub async fn query_case(
        &self,
        case: &CaseIdentifier,
    ) -> std::result::Result<CaseRecord, QueryError> {
        debug!(case_number = %case.case_number, "querying case");

        let filter = CaseFilter {
            case_number: &case.case_number,
            secret_code: &case.secret_code,
            data_type: CASE_QUERY,
        };
        let params = self
            .post(&QueryBody::new(filter))
            .await?
            .ok_or_else(|| QueryError::NotFound {
                kind: "case",
                id: case.case_number.clone(),
            })?;

        if !params.is_object() {
            return Err(QueryError::Malformed(format!(
                "case data is not an object: {}",
                json_kind(&params)
            )));
        }

        let parsed: CaseParams = serde_json::from_value(params.clone())
            .map_err(|e| QueryError::Malformed(format!("invalid case data: {}", e)))?;

        Ok(CaseRecord::from_entries(
            parsed.documents.unwrap_or_default(),
            params,
        ))
    }

    /// Retrieve a single document's payload
    ///
    /// Fields are returned as sent; use
    /// [`DocumentFetcher`](crate::DocumentFetcher) for a validated payload.
    ///
    /// # Errors
    /// Same classification as [`query_case`](Self::query_case).
    pub async fn query_document(
        &self,
        document_id: &str,
        secret_code: &str,
    ) -> std::result::Result<DocumentResponse, QueryError> {
        debug!(document_id, "querying document");

        let filter = DocumentFilter {
            document_id,
            secret_code,
            data_type: DOCUMENT_QUERY,
            is_artifact: false,
        };
        let params = self
            .post(&QueryBody::new(filter))
            .await?
            .ok_or_else(|| QueryError::NotFound {
                kind: "document",
                id: document_id.to_string(),
            })?;

        serde_json::from_value(params)
            .map_err(|e| QueryError::Malformed(format!("invalid document data: {}", e)))
    }

    /// Send one query and return the `mParams` value, if any
    async fn post<B: Serialize>(
        &self,
        body: &B,
    ) -> std::result::Result<Option<serde_json::Value>, QueryError> {
        let response = self
            .http_client
            .post(self.endpoint.clone())
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(QueryError::Transport(format!(
                "registry returned HTTP {}",
                status.as_u16()
            )));
        }

        let bytes = response.bytes().await?;
        let envelope: serde_json::Value = serde_json::from_slice(&bytes)
            .map_err(|e| QueryError::Malformed(format!("response is not JSON: {}", e)))?;

        let mut envelope = match envelope {
            serde_json::Value::Object(map) => map,
            other => {
                return Err(QueryError::Malformed(format!(
                    "envelope is not an object: {}",
                    json_kind(&other)
                )));
            }
        };

        Ok(envelope.remove("mParams").filter(|v| !v.is_null()))
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
