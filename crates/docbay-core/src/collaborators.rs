//! Trait seams for the external services the orchestrator drives.
//!
//! Production implementations live in `docbay-clients`; tests use the
//! in-memory doubles from [`crate::fakes`].

use async_trait::async_trait;
use docbay_state::DocsRecord;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::DeploymentInformation;

/// Failure surface shared by all collaborator clients.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    /// The requested document or resource does not exist.
    #[error("resource not found")]
    NotFound,

    /// The service answered with a non-success status.
    #[error("api error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The service could not be reached at all.
    #[error("network error: {0}")]
    Network(String),
}

/// Result type for collaborator calls.
pub type CollaboratorResult<T> = std::result::Result<T, CollaboratorError>;

/// Receipt for a queued build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildTriggered {
    /// Key the build system hands back, e.g. `CORE-DR-1234`.
    pub build_result_key: String,
}

/// One row from the central log store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub source: String,
    pub message: String,
    /// Structured context fields the log row carried.
    pub fields: serde_json::Value,
}

/// Fetch raw manifest documents over the wire.
#[async_trait]
pub trait ManifestFetcher: Send + Sync {
    /// Fetch the document at `url`. `NotFound` when the document is absent.
    async fn fetch(&self, url: &str) -> CollaboratorResult<Vec<u8>>;
}

/// List remote refs that should carry documentation.
#[async_trait]
pub trait BranchLister: Send + Sync {
    /// `(branch_name, target_directory)` pairs in a deterministic order,
    /// already filtered to documentation-worthy refs.
    async fn list_branches(&self, repository_url: &str) -> CollaboratorResult<Vec<(String, String)>>;
}

/// Queue documentation builds.
#[async_trait]
pub trait BuildTrigger: Send + Sync {
    async fn trigger(&self, info: &DeploymentInformation) -> CollaboratorResult<BuildTriggered>;

    /// Re-queue a previously failed build by its key.
    async fn retrigger(&self, build_key: &str) -> CollaboratorResult<BuildTriggered>;
}

/// Announce noteworthy registry events.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify_discovery(&self, record: &DocsRecord) -> CollaboratorResult<()>;
}

/// Query the central log store.
#[async_trait]
pub trait LogSearch: Send + Sync {
    /// Matching entries, newest first. Implementations swallow transport
    /// errors and return an empty list instead.
    async fn search(&self, query: &str, limit: u32) -> Vec<LogEntry>;
}
