//! # registry-dl
//!
//! Retrieval pipeline for case documents held by a remote registry.
//!
//! Given a case number and its access token, registry-dl queries the case,
//! fetches every document listed in it, writes each one to a flat output
//! directory exactly once (unless overwrite is forced) and relays the stored
//! bytes to a notification channel.
//!
//! ## Design Philosophy
//!
//! - **Failure isolation** - One bad document never aborts the batch
//! - **Idempotent storage** - Re-running a case only writes what is missing
//! - **Library-first** - No CLI; callers supply inputs and decide exit behavior
//! - **Event-driven** - Consumers subscribe to per-document events
//!
//! ## Quick Start
//!
//! ```no_run
//! use registry_dl::{CaseIdentifier, Config, Pipeline};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pipeline = Pipeline::new(Config::default())?;
//!
//!     let mut events = pipeline.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let case = CaseIdentifier::new("12345", "abc");
//!     let result = pipeline.download_case(&case, false).await?;
//!     for doc in result.documents() {
//!         println!("{}", doc.path.display());
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Validated document retrieval
pub mod fetcher;
/// Notification channels
pub mod notify;
/// Retrieval pipeline orchestration
pub mod pipeline;
/// Registry query client
pub mod query;
/// Local persistence
pub mod storage;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use config::{Config, DownloadConfig, NotificationConfig, RegistryConfig, TelegramConfig};
pub use error::{DeliveryError, Error, QueryError, Result, StorageError};
pub use fetcher::DocumentFetcher;
pub use notify::{NoOpForwarder, NotificationForwarder, TelegramForwarder};
pub use pipeline::Pipeline;
pub use query::QueryClient;
pub use storage::PersistenceStore;
pub use types::{
    CaseDownload, CaseIdentifier, CaseRecord, DocumentDescriptor, DocumentPayload, DocumentState,
    Event, PersistedDocument, RejectedEntry, RunOutput, RunRequest, WriteOutcome,
};
