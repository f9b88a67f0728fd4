//! Registry trait definitions for docbay
//!
//! These traits define the durable-state abstractions:
//! - `DocsRegistry`: documentation build rows keyed by (repository, target directory)
//! - `RedirectStore`: docs-server redirects
//!
//! All traits are async and backend-agnostic. In-memory fakes are provided
//! for testing via the `fakes` module.

use async_trait::async_trait;

use crate::docs::DocsRecord;
use crate::error::StorageError;
use crate::redirect::Redirect;

/// Result type for registry operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

// ---------------------------------------------------------------------------
// DocsRegistry — documentation build rows
// ---------------------------------------------------------------------------

/// Documentation build registry.
///
/// Guarantees:
/// - `persist` runs the record's timestamp touch hook (`updated_at` always,
///   `created_at` only when unset) and assigns the numeric id on first save.
/// - A row is durable once `persist` returns.
/// - `flush` drains buffered writes. Both shipped backends are
///   write-through, so their `flush` is a no-op; batch callers still invoke
///   it after every row so a buffered backend stays externally consistent
///   mid-scan.
/// - (repository_url, target_branch_directory) uniqueness is enforced by the
///   caller's skip-if-exists probe; backends mirror it with a unique index.
#[async_trait]
pub trait DocsRegistry: Send + Sync {
    /// Look up a row by its numeric id.
    async fn find_by_id(&self, id: i64) -> StorageResult<Option<DocsRecord>>;

    /// Rows for one (repository, target directory) pair. This is the
    /// skip-if-exists probe used during branch scans.
    async fn find_by_repository_and_target(
        &self,
        repository_url: &str,
        target_branch_directory: &str,
    ) -> StorageResult<Vec<DocsRecord>>;

    /// All rows a repository holds for one package, any branch.
    async fn find_by_repository_and_package(
        &self,
        repository_url: &str,
        package_name: &str,
    ) -> StorageResult<Vec<DocsRecord>>;

    /// Rows claiming `package_name` under a repository URL other than
    /// `repository_url`. Non-empty means an identity conflict.
    async fn find_conflicting(
        &self,
        package_name: &str,
        repository_url: &str,
    ) -> StorageResult<Vec<DocsRecord>>;

    /// Row holding a CI build key, if any. Build-completion callback path.
    async fn find_by_build_key(&self, build_key: &str) -> StorageResult<Option<DocsRecord>>;

    /// Distinct repository URLs known to the registry, sorted.
    async fn all_repository_urls(&self) -> StorageResult<Vec<String>>;

    /// Insert or update a row, returning the stored version with the id
    /// assigned and timestamps touched.
    async fn persist(&self, record: DocsRecord) -> StorageResult<DocsRecord>;

    /// Drain any buffered writes.
    async fn flush(&self) -> StorageResult<()>;
}

// ---------------------------------------------------------------------------
// RedirectStore — docs-server redirects
// ---------------------------------------------------------------------------

/// Redirect persistence.
///
/// Same persist contract as [`DocsRegistry`]: touch hook applied, id
/// assigned on first save, durable on return.
#[async_trait]
pub trait RedirectStore: Send + Sync {
    /// Insert or update a redirect, returning the stored version.
    async fn persist(&self, redirect: Redirect) -> StorageResult<Redirect>;

    /// All redirects, ordered by id.
    async fn list(&self) -> StorageResult<Vec<Redirect>>;
}
