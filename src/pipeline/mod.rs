//! Retrieval pipeline: query → fetch → persist → notify.
//!
//! [`Pipeline`] owns one instance of each component and drives them for a
//! single document or for every document of a case. Per-document failures are
//! logged and reported as [`Event`]s but never fail the batch; the result of
//! a case run is the ordered list of documents actually written.


use crate::config::Config;
use crate::error::{Error, Result};
use crate::fetcher::DocumentFetcher;
use crate::notify::{self, NotificationForwarder};
use crate::query::QueryClient;
use crate::storage::PersistenceStore;
use crate::types::{
    CaseDownload, CaseIdentifier, DocumentDescriptor, DocumentState, Event, PersistedDocument,
    RejectedEntry, RunOutput, RunRequest, WriteOutcome,
};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Capacity of the event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Pipeline instance (cloneable - clones share clients, store and channel)
#[derive(Clone)]
pub struct Pipeline {
    client: QueryClient,
    fetcher: DocumentFetcher,
    store: PersistenceStore,
    forwarder: Arc<dyn NotificationForwarder>,
    event_tx: tokio::sync::broadcast::Sender<Event>,
    config: Arc<Config>,
}

impl Pipeline {
    /// Create a pipeline using the notification channel named in `config`
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the configuration is invalid, or an error
    /// if an HTTP client cannot be created.
    pub fn new(config: Config) -> Result<Self> {
        let forwarder = notify::from_config(&config.notifications)?;
        Self::with_forwarder(config, forwarder)
    }

    /// Create a pipeline with an explicit notification forwarder
    ///
    /// # Errors
    /// Same as [`new`](Self::new).
    pub fn with_forwarder(
        config: Config,
        forwarder: Arc<dyn NotificationForwarder>,
    ) -> Result<Self> {
        config.validate()?;
        let client = QueryClient::new(&config.registry)?;
        let fetcher = DocumentFetcher::new(client.clone());
        let store = PersistenceStore::new(config.download.output_dir.clone());
        let (event_tx, _rx) = tokio::sync::broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            client,
            fetcher,
            store,
            forwarder,
            event_tx,
            config: Arc::new(config),
        })
    }

    /// Subscribe to pipeline events
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Run with the effective inputs collected by a boundary layer
    ///
    /// A document id selects single-document mode (overwrite implied);
    /// otherwise the case is downloaded, honoring `force_overwrite` or the
    /// configured default.
    ///
    /// # Errors
    /// [`Error::InvalidInput`] if the access token is missing, or if neither a
    /// document id nor a case number is given. Otherwise the errors of
    /// [`download_single`](Self::download_single) and
    /// [`download_case`](Self::download_case).
    pub async fn run(&self, request: RunRequest) -> Result<RunOutput> {
        let secret_code = non_empty(request.secret_code)
            .ok_or_else(|| Error::InvalidInput("missing secret code".to_string()))?;

        if let Some(document_id) = non_empty(request.document_id) {
            let doc = self.download_single(&document_id, &secret_code).await?;
            return Ok(RunOutput::Document(doc));
        }

        let case_number = non_empty(request.case_number)
            .ok_or_else(|| Error::InvalidInput("missing case number".to_string()))?;
        let force = request.force_overwrite || self.config.download.force_overwrite;
        let case = CaseIdentifier::new(case_number, secret_code);

        Ok(RunOutput::Case(self.download_case(&case, force).await?))
    }

    /// Fetch one document, overwrite any existing copy, and notify
    ///
    /// # Errors
    /// [`Error::Query`] if the document cannot be fetched, [`Error::Storage`]
    /// or [`Error::Io`] if it cannot be written. Notification failures are
    /// not errors.
    pub async fn download_single(
        &self,
        document_id: &str,
        secret_code: &str,
    ) -> Result<PersistedDocument> {
        let payload = match self.fetcher.fetch(document_id, secret_code).await {
            Ok(payload) => payload,
            Err(e) => {
                let err = Error::Query(e);
                self.report_failure(document_id, DocumentState::Pending, &err);
                return Err(err);
            }
        };
        self.emit(Event::DocumentFetched {
            document_id: document_id.to_string(),
            file_name: payload.file_name.clone(),
        });

        self.store.ensure_output_dir().await?;
        let path = self.store.document_path(document_id, &payload.file_name);
        let doc = match self.store.overwrite(&path, &payload.data).await {
            Ok(doc) => doc,
            Err(e) => {
                let err = Error::Storage(e);
                self.report_failure(document_id, DocumentState::Fetched, &err);
                return Err(err);
            }
        };
        self.emit_persisted(document_id, &doc);

        self.notify(document_id, &doc).await;
        Ok(doc)
    }

    /// Download every document of a case
    ///
    /// Returns [`CaseDownload::NotFound`] if the case query yields nothing
    /// usable, for whatever reason; nothing is written in that case.
    /// Otherwise the raw case JSON is saved and each document goes through
    /// fetch → persist → notify, at most
    /// `download.max_concurrent_documents` at a time. Unreadable entries of
    /// the document list are reported and skipped. Only documents written
    /// during this run are returned, in case order.
    ///
    /// # Errors
    /// Only local failures that make the run impossible: the output directory
    /// or the case summary cannot be written.
    pub async fn download_case(&self, case: &CaseIdentifier, force: bool) -> Result<CaseDownload> {
        let record = match self.client.query_case(case).await {
            Ok(record) => record,
            Err(e) => {
                info!(case_number = %case.case_number, reason = %e, "case result is empty");
                self.emit(Event::CaseNotFound {
                    case_number: case.case_number.clone(),
                    reason: e.error_code().to_string(),
                });
                return Ok(CaseDownload::NotFound);
            }
        };

        self.store.ensure_output_dir().await?;
        let summary_path = self.store.write_case_summary(case, &record.raw).await?;

        info!(
            case_number = %case.case_number,
            documents = record.documents.len(),
            output_dir = %self.store.output_dir().display(),
            "start downloading documents"
        );
        self.emit(Event::CaseQueried {
            case_number: case.case_number.clone(),
            documents: record.documents.len(),
        });
        for entry in &record.rejected {
            self.report_rejected(&case.case_number, entry);
        }

        let concurrency = self.config.download.max_concurrent_documents.max(1);
        let secret_code = case.secret_code.as_str();
        let outcomes: Vec<(DocumentState, Option<PersistedDocument>)> =
            stream::iter(record.documents.iter())
                .map(|descriptor| self.process_document(descriptor, secret_code, force))
                .buffered(concurrency)
                .collect()
                .await;

        let count = |wanted: DocumentState| outcomes.iter().filter(|(s, _)| *s == wanted).count();
        info!(
            case_number = %case.case_number,
            attempted = record.documents.len(),
            notified = count(DocumentState::Notified),
            persisted = count(DocumentState::Persisted),
            skipped = count(DocumentState::Skipped),
            failed = count(DocumentState::Failed),
            "case download finished"
        );

        let documents: Vec<PersistedDocument> = outcomes
            .into_iter()
            .filter(|(state, _)| state.is_written())
            .filter_map(|(_, doc)| doc)
            .collect();

        Ok(CaseDownload::Completed {
            summary_path,
            documents,
        })
    }

    /// Drive one document to a terminal state
    async fn process_document(
        &self,
        descriptor: &DocumentDescriptor,
        secret_code: &str,
        force: bool,
    ) -> (DocumentState, Option<PersistedDocument>) {
        let document_id = descriptor.id.as_str();
        debug!(document_id, declared_name = %descriptor.file_name, "fetching document");

        let payload = match self.fetcher.fetch(document_id, secret_code).await {
            Ok(payload) => payload,
            Err(e) => {
                self.report_failure(document_id, DocumentState::Pending, &Error::Query(e));
                return (DocumentState::Failed, None);
            }
        };
        self.emit(Event::DocumentFetched {
            document_id: document_id.to_string(),
            file_name: payload.file_name.clone(),
        });

        let path = self.store.document_path(document_id, &payload.file_name);
        let doc = match self.store.write(&path, &payload.data, force).await {
            Ok(WriteOutcome::Written(doc)) => doc,
            Ok(WriteOutcome::Skipped { path }) => {
                info!(document_id, path = %path.display(), "document already exists, use force overwrite to replace it");
                self.emit(Event::DocumentSkipped {
                    document_id: document_id.to_string(),
                    path,
                });
                return (DocumentState::Skipped, None);
            }
            Err(e) => {
                self.report_failure(document_id, DocumentState::Fetched, &Error::Storage(e));
                return (DocumentState::Failed, None);
            }
        };
        self.emit_persisted(document_id, &doc);

        let state = self.notify(document_id, &doc).await;
        debug!(document_id, ?state, "document finished");
        (state, Some(doc))
    }

    /// Best-effort delivery; returns `Notified` or stays `Persisted`
    async fn notify(&self, document_id: &str, doc: &PersistedDocument) -> DocumentState {
        let channel = self.forwarder.name();
        match self.forwarder.deliver(&doc.display_name(), &doc.bytes).await {
            Ok(()) => {
                self.emit(Event::DocumentNotified {
                    document_id: document_id.to_string(),
                    channel: channel.to_string(),
                });
                DocumentState::Notified
            }
            Err(e) => {
                warn!(document_id, channel, error = %e, "notification failed");
                self.emit(Event::NotificationFailed {
                    document_id: document_id.to_string(),
                    channel: channel.to_string(),
                    error: e.to_string(),
                });
                DocumentState::Persisted
            }
        }
    }

    /// `stage` is the last state the document reached before failing
    fn report_failure(&self, document_id: &str, stage: DocumentState, error: &Error) {
        warn!(document_id, ?stage, code = error.error_code(), error = %error, "document failed");
        self.emit(Event::DocumentFailed {
            document_id: document_id.to_string(),
            stage,
            code: error.error_code().to_string(),
            error: error.to_string(),
        });
    }

    fn report_rejected(&self, case_number: &str, entry: &RejectedEntry) {
        warn!(case_number, index = entry.index, reason = %entry.reason, "skipping unreadable document entry");
        self.emit(Event::DescriptorRejected {
            case_number: case_number.to_string(),
            index: entry.index,
            reason: entry.reason.clone(),
        });
    }

    fn emit_persisted(&self, document_id: &str, doc: &PersistedDocument) {
        self.emit(Event::DocumentPersisted {
            document_id: document_id.to_string(),
            path: doc.path.clone(),
            size_bytes: doc.bytes.len() as u64,
        });
    }

    fn emit(&self, event: Event) {
        // No subscribers is fine
        self.event_tx.send(event).ok();
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
