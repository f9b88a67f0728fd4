//! In-memory collaborator doubles (testing only)
//!
//! Provides canned implementations of the collaborator traits so the
//! orchestrator can be exercised without any network.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use docbay_state::DocsRecord;

use crate::collaborators::{
    BranchLister, BuildTrigger, BuildTriggered, CollaboratorError, CollaboratorResult, LogEntry,
    LogSearch, ManifestFetcher, NotificationSink,
};
use crate::domain::DeploymentInformation;

// ---------------------------------------------------------------------------
// StaticManifestFetcher
// ---------------------------------------------------------------------------

/// Serves canned manifest documents by URL.
#[derive(Debug, Default)]
pub struct StaticManifestFetcher {
    documents: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl StaticManifestFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, url: impl Into<String>, body: impl Into<Vec<u8>>) {
        self.documents
            .lock()
            .unwrap()
            .insert(url.into(), body.into());
    }
}

#[async_trait]
impl ManifestFetcher for StaticManifestFetcher {
    async fn fetch(&self, url: &str) -> CollaboratorResult<Vec<u8>> {
        self.documents
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or(CollaboratorError::NotFound)
    }
}

// ---------------------------------------------------------------------------
// StaticBranchLister
// ---------------------------------------------------------------------------

/// Serves a canned branch listing per repository.
#[derive(Debug, Default)]
pub struct StaticBranchLister {
    listings: Mutex<BTreeMap<String, Vec<(String, String)>>>,
}

impl StaticBranchLister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `(branch_name, target_directory)` pairs for a repository.
    pub fn insert(&self, repository_url: impl Into<String>, branches: Vec<(String, String)>) {
        self.listings
            .lock()
            .unwrap()
            .insert(repository_url.into(), branches);
    }
}

#[async_trait]
impl BranchLister for StaticBranchLister {
    async fn list_branches(
        &self,
        repository_url: &str,
    ) -> CollaboratorResult<Vec<(String, String)>> {
        Ok(self
            .listings
            .lock()
            .unwrap()
            .get(repository_url)
            .cloned()
            .unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// RecordingTrigger
// ---------------------------------------------------------------------------

/// Records every trigger call and hands out sequential build keys.
#[derive(Debug)]
pub struct RecordingTrigger {
    triggered: Mutex<Vec<DeploymentInformation>>,
    retriggered: Mutex<Vec<String>>,
    failing: AtomicBool,
    next_key: AtomicU64,
}

impl RecordingTrigger {
    pub fn new() -> Self {
        Self {
            triggered: Mutex::new(Vec::new()),
            retriggered: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
            next_key: AtomicU64::new(1),
        }
    }

    /// Make every subsequent call fail with an API error.
    pub fn fail_from_now_on(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn triggered(&self) -> Vec<DeploymentInformation> {
        self.triggered.lock().unwrap().clone()
    }

    pub fn retriggered(&self) -> Vec<String> {
        self.retriggered.lock().unwrap().clone()
    }

    fn check_failing(&self) -> CollaboratorResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Api {
                status: 500,
                message: "queue rejected the plan".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for RecordingTrigger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BuildTrigger for RecordingTrigger {
    async fn trigger(&self, info: &DeploymentInformation) -> CollaboratorResult<BuildTriggered> {
        self.check_failing()?;
        let key = format!("CORE-DR-{}", self.next_key.fetch_add(1, Ordering::SeqCst));
        self.triggered.lock().unwrap().push(info.clone());
        Ok(BuildTriggered {
            build_result_key: key,
        })
    }

    async fn retrigger(&self, build_key: &str) -> CollaboratorResult<BuildTriggered> {
        self.check_failing()?;
        self.retriggered.lock().unwrap().push(build_key.to_string());
        Ok(BuildTriggered {
            build_result_key: build_key.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// RecordingSink
// ---------------------------------------------------------------------------

/// Captures discovery notifications.
#[derive(Debug, Default)]
pub struct RecordingSink {
    discoveries: Mutex<Vec<DocsRecord>>,
    failing: AtomicBool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with a network error.
    pub fn fail_from_now_on(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn discoveries(&self) -> Vec<DocsRecord> {
        self.discoveries.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn notify_discovery(&self, record: &DocsRecord) -> CollaboratorResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Network(
                "webhook unreachable".to_string(),
            ));
        }
        self.discoveries.lock().unwrap().push(record.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// NullLogSearch
// ---------------------------------------------------------------------------

/// A log store with nothing in it.
#[derive(Debug, Default)]
pub struct NullLogSearch;

impl NullLogSearch {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LogSearch for NullLogSearch {
    async fn search(&self, _query: &str, _limit: u32) -> Vec<LogEntry> {
        Vec::new()
    }
}
