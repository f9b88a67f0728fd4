//! Documentation registry rows.
//!
//! A [`DocsRecord`] is one persisted documentation build: a (repository URL,
//! target directory) pair with its package identity, approval state and the
//! CI build key of the last triggered render.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a documentation build.
///
/// Transitions: AwaitingApproval -> Rendering -> Done | Error.
/// Re-scans and re-triggers may re-enter Rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocsStatus {
    AwaitingApproval,
    Rendering,
    Done,
    Error,
}

impl DocsStatus {
    /// Stable string form used by storage backends.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocsStatus::AwaitingApproval => "awaiting_approval",
            DocsStatus::Rendering => "rendering",
            DocsStatus::Done => "done",
            DocsStatus::Error => "error",
        }
    }

    /// Parse the stable string form. Returns `None` for unknown values.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "awaiting_approval" => Some(DocsStatus::AwaitingApproval),
            "rendering" => Some(DocsStatus::Rendering),
            "done" => Some(DocsStatus::Done),
            "error" => Some(DocsStatus::Error),
            _ => None,
        }
    }
}

impl std::fmt::Display for DocsStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One persisted documentation build.
///
/// Identity: (repository_url, target_branch_directory) is unique at the
/// application level; callers probe with
/// [`crate::DocsRegistry::find_by_repository_and_target`] before creating a
/// new row. Rows are never hard-deleted by this layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocsRecord {
    /// Backend-assigned numeric id, `None` until first persisted.
    pub id: Option<i64>,
    pub repository_url: String,
    /// Public URL of the package manifest for `branch`, resolved on first
    /// enrichment.
    pub manifest_url: Option<String>,
    /// Full "vendor/package" name.
    pub package_name: String,
    pub vendor: String,
    pub name: String,
    pub extension_key: Option<String>,
    pub type_long: String,
    pub type_short: String,
    pub min_version: Option<String>,
    pub max_version: Option<String>,
    /// Source branch or tag the docs are rendered from.
    pub branch: String,
    /// Directory the rendered docs are deployed to.
    pub target_branch_directory: String,
    pub status: DocsStatus,
    pub approved: bool,
    /// Set when the repository had no rows at all when this one was created.
    pub is_new: bool,
    pub re_render_needed: bool,
    /// CI build key of the last triggered render, empty when none.
    pub build_key: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl DocsRecord {
    /// Create an empty record for a repository branch, prior to enrichment.
    pub fn new(repository_url: impl Into<String>, branch: impl Into<String>) -> Self {
        DocsRecord {
            id: None,
            repository_url: repository_url.into(),
            manifest_url: None,
            package_name: String::new(),
            vendor: String::new(),
            name: String::new(),
            extension_key: None,
            type_long: String::new(),
            type_short: String::new(),
            min_version: None,
            max_version: None,
            branch: branch.into(),
            target_branch_directory: String::new(),
            status: DocsStatus::AwaitingApproval,
            approved: false,
            is_new: false,
            re_render_needed: false,
            build_key: String::new(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Pre-save timestamp hook, invoked by every `persist` implementation.
    ///
    /// `updated_at` is set on every call; `created_at` only when unset, so
    /// the creation time survives subsequent saves.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = Some(now);
        if self.created_at.is_none() {
            self.created_at = Some(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn touch_sets_both_timestamps_on_first_call() {
        let mut record = DocsRecord::new("https://github.com/acme/docs.git", "main");
        let now = Utc::now();
        record.touch(now);

        assert_eq!(record.created_at, Some(now));
        assert_eq!(record.updated_at, Some(now));
    }

    #[test]
    fn touch_keeps_created_at_sticky() {
        let mut record = DocsRecord::new("https://github.com/acme/docs.git", "main");
        let first = Utc::now();
        record.touch(first);

        let later = first + Duration::seconds(90);
        record.touch(later);

        assert_eq!(record.created_at, Some(first));
        assert_eq!(record.updated_at, Some(later));
    }

    #[test]
    fn status_string_forms_round_trip() {
        for status in [
            DocsStatus::AwaitingApproval,
            DocsStatus::Rendering,
            DocsStatus::Done,
            DocsStatus::Error,
        ] {
            assert_eq!(DocsStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(DocsStatus::parse("queued"), None);
    }

    #[test]
    fn new_record_starts_unapproved_without_build_key() {
        let record = DocsRecord::new("https://github.com/acme/docs.git", "1.2");
        assert_eq!(record.status, DocsStatus::AwaitingApproval);
        assert!(!record.approved);
        assert!(record.build_key.is_empty());
        assert!(record.id.is_none());
        assert!(record.created_at.is_none());
    }
}
