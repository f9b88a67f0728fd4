//! Structured observability hooks for docbay lifecycle events.
//!
//! This module provides:
//! - Scan-scoped tracing spans via `ScanSpan` RAII guard
//! - Emission functions for key lifecycle events: trigger, skip, discovery,
//!   build outcome
//!
//! Events are emitted at `info!` level (configurable via `RUST_LOG`). For
//! JSON output, pass `--json` to the CLI.

use tracing::{info, warn};

/// RAII guard that enters a scan-scoped tracing span for the duration of a
/// batch scan.
///
/// # Example
///
/// ```ignore
/// let _span = ScanSpan::enter("1f2e3d4c");
/// // Now all tracing calls are automatically associated with scan_id = "1f2e3d4c"
/// ```
pub struct ScanSpan {
    _span: tracing::span::EnteredSpan,
}

impl ScanSpan {
    /// Create and enter a span tagged with the scan_id.
    pub fn enter(scan_id: &str) -> Self {
        let span = tracing::info_span!("docbay.scan", scan_id = %scan_id);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: a documentation build was queued.
pub fn emit_build_triggered(repository_url: &str, branch: &str, build_key: &str) {
    info!(
        event = "build.triggered",
        repository = %repository_url,
        branch = %branch,
        build_key = %build_key,
    );
}

/// Emit event: a branch was skipped during a scan (warning level).
///
/// Carries the failure code and message so the log store can be queried for
/// skipped renders later.
pub fn emit_branch_skipped(repository_url: &str, branch: &str, code: u32, message: &str) {
    warn!(
        event = "scan.branch_skipped",
        repository = %repository_url,
        branch = %branch,
        exception_code = code,
        exception_message = %message,
    );
}

/// Emit event: a branch already had a registry row and was left alone.
pub fn emit_branch_already_registered(repository_url: &str, branch: &str) {
    info!(
        event = "scan.branch_already_registered",
        repository = %repository_url,
        branch = %branch,
    );
}

/// Emit event: a package was seen for the first time.
pub fn emit_package_discovered(repository_url: &str, package_name: &str) {
    info!(
        event = "registry.package_discovered",
        repository = %repository_url,
        package = %package_name,
    );
}

/// Emit event: a discovery notification could not be delivered (warning
/// level). Discovery messages never fail the surrounding operation.
pub fn emit_notification_failed(package_name: &str, error: &dyn std::fmt::Display) {
    warn!(
        event = "registry.notification_failed",
        package = %package_name,
        error = %error,
    );
}

/// Emit event: a build finished and its outcome was recorded.
pub fn emit_build_outcome(build_key: &str, success: bool) {
    info!(event = "build.outcome", build_key = %build_key, success = success);
}

/// Emit event: a build callback named a key the registry does not know
/// (warning level).
pub fn emit_unknown_build_key(build_key: &str) {
    warn!(event = "build.unknown_key", build_key = %build_key);
}

/// Emit event: one repository failed inside a batch scan (warning level).
pub fn emit_repository_scan_failed(repository_url: &str, error: &dyn std::fmt::Display) {
    warn!(
        event = "scan.repository_failed",
        repository = %repository_url,
        error = %error,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_span_create() {
        // Just ensure ScanSpan::enter doesn't panic
        let _span = ScanSpan::enter("test-scan-id");
    }
}
