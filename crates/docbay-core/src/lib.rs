//! Docbay Core Library
//!
//! Re-exports core components for programmatic access to docbay
//! functionality: domain models, the build orchestrator, and the
//! collaborator trait seams its clients implement.

pub mod collaborators;
pub mod domain;
pub mod dump;
pub mod error;
pub mod fakes;
pub mod obs;
pub mod orchestrator;
pub mod telemetry;

pub use domain::{
    is_valid_package_name, DeploymentInformation, GerritChange, PackageManifest, PackageType,
    RefKind, RefSource, VersionRef, DOCS_HOME_REPOSITORY,
};

pub use collaborators::{
    BranchLister, BuildTrigger, BuildTriggered, CollaboratorError, CollaboratorResult, LogEntry,
    LogSearch, ManifestFetcher, NotificationSink,
};

pub use error::{DocbayError, Result};

pub use orchestrator::{
    resolve_manifest_url, DocsOrchestrator, OrchestratorConfig, ScanReport,
};

pub use docbay_state::{DocsRecord, DocsRegistry, DocsStatus, Redirect, RedirectStore};

pub use obs::{
    emit_branch_already_registered, emit_branch_skipped, emit_build_outcome, emit_build_triggered,
    emit_notification_failed, emit_package_discovered, emit_repository_scan_failed,
    emit_unknown_build_key, ScanSpan,
};
pub use telemetry::init_tracing;

/// Docbay version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
