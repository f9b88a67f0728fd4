//! Build orchestration over the documentation registry.
//!
//! The orchestrator owns every decision about when a registry row is
//! created, approved, and handed to the build system. Storage and external
//! services stay behind traits so the whole flow runs in memory under test.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use docbay_state::{DocsRecord, DocsRegistry, DocsStatus};

use crate::collaborators::{
    BranchLister, BuildTrigger, CollaboratorError, ManifestFetcher, NotificationSink,
};
use crate::domain::{DeploymentInformation, PackageManifest, VersionRef};
use crate::error::{DocbayError, Result};
use crate::obs;

/// Paths and names the orchestrator needs to assemble builds.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Directory below the workspace root reserved for machine-written files.
    pub private_dir: String,
    /// Subdirectory of `private_dir` holding deployment dumps.
    pub sub_dir: String,
    /// Manifest filename looked up on the pushed branch.
    pub manifest_file: String,
    /// Root the dump files are written beneath.
    pub workspace_root: PathBuf,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            private_dir: "private".to_string(),
            sub_dir: "docs".to_string(),
            manifest_file: "composer.json".to_string(),
            workspace_root: PathBuf::from("."),
        }
    }
}

/// Tally of one batch scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    /// Branches the remote listing produced.
    pub scanned: u32,
    /// Branches that queued a build.
    pub triggered: u32,
    /// Branches left alone: already registered, or not documentation-worthy.
    pub skipped: u32,
    /// Branches that failed validation, fetch, or trigger.
    pub failed: u32,
}

impl ScanReport {
    fn merge(&mut self, other: &ScanReport) {
        self.scanned += other.scanned;
        self.triggered += other.triggered;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

impl std::fmt::Display for ScanReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "scanned {} branches: {} triggered, {} skipped, {} failed",
            self.scanned, self.triggered, self.skipped, self.failed
        )
    }
}

/// Resolve the raw-content URL of the manifest on a given branch.
///
/// GitHub repositories get the `raw.githubusercontent.com` form; anything
/// else falls back to the forge-agnostic `<repo>/raw/<branch>/<file>` path.
pub fn resolve_manifest_url(repository_url: &str, branch: &str, manifest_file: &str) -> String {
    let trimmed = repository_url
        .trim_end_matches('/')
        .trim_end_matches(".git");
    if let Some(rest) = trimmed.strip_prefix("https://github.com/") {
        return format!("https://raw.githubusercontent.com/{rest}/{branch}/{manifest_file}");
    }
    format!("{trimmed}/raw/{branch}/{manifest_file}")
}

/// Copy deployment information onto a record headed for rendering.
///
/// Clears the build key: a rendering row only carries a key once the build
/// system has actually accepted the plan.
fn apply_deployment(record: &mut DocsRecord, info: &DeploymentInformation) {
    record.status = DocsStatus::Rendering;
    record.build_key = String::new();
    record.vendor = info.vendor.clone();
    record.name = info.name.clone();
    record.package_name = info.package_name.clone();
    record.extension_key = if info.extension_key.is_empty() {
        None
    } else {
        Some(info.extension_key.clone())
    };
    record.target_branch_directory = info.target_branch_directory.clone();
    record.type_long = info.type_long.clone();
    record.type_short = info.type_short.clone();
    record.min_version = info.min_version.clone();
    record.max_version = info.max_version.clone();
    record.branch = info.source_branch.clone();
}

/// Drives the full lifecycle of documentation builds.
///
/// Generic over the registry so tests run against the in-memory fake and
/// deployments run against SurrealDB without touching this code.
pub struct DocsOrchestrator<R: DocsRegistry> {
    registry: Arc<R>,
    manifests: Arc<dyn ManifestFetcher>,
    branches: Arc<dyn BranchLister>,
    builds: Arc<dyn BuildTrigger>,
    notifications: Arc<dyn NotificationSink>,
    config: OrchestratorConfig,
}

impl<R: DocsRegistry> DocsOrchestrator<R> {
    pub fn new(
        registry: Arc<R>,
        manifests: Arc<dyn ManifestFetcher>,
        branches: Arc<dyn BranchLister>,
        builds: Arc<dyn BuildTrigger>,
        notifications: Arc<dyn NotificationSink>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            registry,
            manifests,
            branches,
            builds,
            notifications,
            config,
        }
    }

    /// Fail when another repository already claims `package_name`.
    ///
    /// Read-only: a conflict must not leave any trace in the registry.
    pub async fn assert_package_unique(
        &self,
        repository_url: &str,
        package_name: &str,
    ) -> Result<()> {
        let conflicting = self
            .registry
            .find_conflicting(package_name, repository_url)
            .await?;
        if !conflicting.is_empty() {
            return Err(DocbayError::PackageConflict {
                package_name: package_name.to_string(),
            });
        }
        Ok(())
    }

    /// Fetch and validate the manifest for `branch`, then copy its fields
    /// onto the record.
    ///
    /// Resolves and remembers the manifest URL on first contact. Runs the
    /// package uniqueness assertion before anything is copied. Returns the
    /// validated manifest so callers can derive deployment information from
    /// it.
    pub async fn enrich_from_manifest(
        &self,
        record: &mut DocsRecord,
        branch: &str,
    ) -> Result<PackageManifest> {
        let url = match &record.manifest_url {
            Some(url) if !url.is_empty() => url.clone(),
            _ => {
                let url = resolve_manifest_url(
                    &record.repository_url,
                    branch,
                    &self.config.manifest_file,
                );
                record.manifest_url = Some(url.clone());
                url
            }
        };

        let bytes = self.manifests.fetch(&url).await.map_err(|e| match e {
            CollaboratorError::NotFound => DocbayError::ManifestNotFound { url: url.clone() },
            other => DocbayError::from(other),
        })?;
        let manifest = PackageManifest::from_bytes(&bytes, &record.repository_url)?;

        self.assert_package_unique(&record.repository_url, &manifest.name)
            .await?;

        record.package_name = manifest.name.clone();
        record.vendor = manifest.vendor().to_string();
        record.name = manifest.package().to_string();
        record.extension_key = manifest.extension_key.clone();
        record.min_version = manifest.min_version.clone();
        record.max_version = manifest.max_version.clone();
        Ok(manifest)
    }

    /// Register a single pushed branch and queue its build when allowed.
    ///
    /// A package whose repository already has an approved row is approved
    /// automatically and rendered right away; everything else parks as
    /// awaiting approval without touching the build system. A repository
    /// seen for the first time additionally announces itself through the
    /// notification sink.
    pub async fn add_new_build(
        &self,
        mut record: DocsRecord,
        info: &DeploymentInformation,
    ) -> Result<DocsRecord> {
        apply_deployment(&mut record, info);
        record.re_render_needed = false;

        let existing = self
            .registry
            .find_by_repository_and_package(&info.repository_url, &info.package_name)
            .await?;

        if existing.is_empty() {
            record.is_new = true;
            obs::emit_package_discovered(&record.repository_url, &record.package_name);
            // Discovery messages never gate the build flow.
            if let Err(e) = self.notifications.notify_discovery(&record).await {
                obs::emit_notification_failed(&record.package_name, &e);
            }
        } else {
            record.is_new = false;
        }

        if existing.iter().any(|doc| doc.approved) {
            let build_key = self.trigger_build(&record).await?;
            record.build_key = build_key;
            record.approved = true;
        } else {
            record.approved = false;
            record.status = DocsStatus::AwaitingApproval;
        }

        let record = self.registry.persist(record).await?;
        self.registry.flush().await?;
        Ok(record)
    }

    /// Manually approve a parked row and queue its build.
    pub async fn approve(&self, mut record: DocsRecord) -> Result<DocsRecord> {
        let build_key = self.trigger_build(&record).await?;
        record.build_key = build_key;
        record.approved = true;
        record.status = DocsStatus::Rendering;

        let record = self.registry.persist(record).await?;
        self.registry.flush().await?;
        Ok(record)
    }

    /// Walk every remote branch of one repository and register the ones the
    /// registry does not know yet.
    ///
    /// Failures on one branch never abort the batch: the branch is counted
    /// and logged, and the scan moves on. Rows are flushed one by one so a
    /// build callback arriving mid-scan finds its row.
    #[instrument(skip(self))]
    pub async fn rescan_repository(&self, repository_url: &str) -> Result<ScanReport> {
        let scan_id = Uuid::new_v4().to_string();
        let _span = obs::ScanSpan::enter(&scan_id);

        info!(repository = %repository_url, "scanning repository branches");
        let listing = self.branches.list_branches(repository_url).await?;

        let mut report = ScanReport::default();
        for (branch, target_directory) in listing {
            report.scanned += 1;

            // Someone may have rendered this branch in the meantime.
            let existing = self
                .registry
                .find_by_repository_and_target(repository_url, &target_directory)
                .await?;
            if !existing.is_empty() {
                obs::emit_branch_already_registered(repository_url, &branch);
                report.skipped += 1;
                continue;
            }

            match self.scan_branch(repository_url, &branch).await {
                Ok(_) => report.triggered += 1,
                Err(e) if e.is_do_not_care() => {
                    obs::emit_branch_skipped(repository_url, &branch, e.code(), &e.to_string());
                    report.skipped += 1;
                }
                Err(e) => {
                    obs::emit_branch_skipped(repository_url, &branch, e.code(), &e.to_string());
                    report.failed += 1;
                }
            }
        }

        info!(
            scanned = report.scanned,
            triggered = report.triggered,
            skipped = report.skipped,
            failed = report.failed,
            "scan finished"
        );
        Ok(report)
    }

    /// Re-scan every repository the registry knows about.
    ///
    /// A repository whose branch listing fails is logged and skipped; its
    /// branches do not show up in the combined report.
    pub async fn rescan_all(&self) -> Result<ScanReport> {
        let mut report = ScanReport::default();
        for repository_url in self.registry.all_repository_urls().await? {
            match self.rescan_repository(&repository_url).await {
                Ok(one) => report.merge(&one),
                Err(e) => obs::emit_repository_scan_failed(&repository_url, &e),
            }
        }
        Ok(report)
    }

    /// Re-derive deployment information for a registry row, dump the info
    /// file, and queue the build. Returns the build key.
    ///
    /// Trigger failures propagate: a row must not be marked rendering
    /// without a build key.
    pub async fn trigger_build(&self, record: &DocsRecord) -> Result<String> {
        let info = DeploymentInformation::from_registry(
            record,
            &self.config.private_dir,
            &self.config.sub_dir,
        )?;
        info.dump_to(&self.config.workspace_root)?;
        let triggered = self.builds.trigger(&info).await?;
        obs::emit_build_triggered(
            &record.repository_url,
            &record.branch,
            &triggered.build_result_key,
        );
        Ok(triggered.build_result_key)
    }

    /// Record the outcome of a finished build.
    ///
    /// An unknown build key is logged and ignored: the build system may
    /// report about rows that were deleted in the meantime.
    pub async fn record_build_outcome(
        &self,
        build_key: &str,
        success: bool,
    ) -> Result<Option<DocsRecord>> {
        let Some(mut record) = self.registry.find_by_build_key(build_key).await? else {
            obs::emit_unknown_build_key(build_key);
            return Ok(None);
        };

        record.status = if success {
            DocsStatus::Done
        } else {
            DocsStatus::Error
        };
        let record = self.registry.persist(record).await?;
        self.registry.flush().await?;
        obs::emit_build_outcome(build_key, success);
        Ok(Some(record))
    }

    /// Register and render one branch nobody has claimed yet.
    ///
    /// Scan rows are approved up front: the scan only runs against
    /// repositories that are already in the registry.
    async fn scan_branch(&self, repository_url: &str, branch: &str) -> Result<DocsRecord> {
        let mut record = DocsRecord::new(repository_url, branch);
        let manifest = self.enrich_from_manifest(&mut record, branch).await?;
        let version_ref = VersionRef::parse_any(branch)?;
        let info = DeploymentInformation::from_manifest(
            &manifest,
            &version_ref,
            repository_url,
            &self.config.private_dir,
            &self.config.sub_dir,
        )?;

        apply_deployment(&mut record, &info);
        record.re_render_needed = false;
        record.is_new = false;
        record.approved = true;

        let build_key = self.trigger_build(&record).await?;
        record.build_key = build_key;

        let record = self.registry.persist(record).await?;
        // Flush inside the loop: the build system may finish before the
        // scan has worked through the remaining branches.
        self.registry.flush().await?;
        Ok(record)
    }
}
