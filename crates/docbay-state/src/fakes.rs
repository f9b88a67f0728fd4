//! In-memory fakes for registry traits (testing only)
//!
//! Provides `MemoryDocsRegistry` and `MemoryRedirectStore` that satisfy the
//! trait contracts without any external dependencies.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::docs::DocsRecord;
use crate::redirect::Redirect;
use crate::storage_traits::*;

// ---------------------------------------------------------------------------
// MemoryDocsRegistry
// ---------------------------------------------------------------------------

/// In-memory docs registry backed by a `BTreeMap<id, DocsRecord>`.
///
/// BTreeMap keeps iteration ordered by id so lookups return rows in
/// insertion order, matching the backend's `ORDER BY record_id`.
#[derive(Debug)]
pub struct MemoryDocsRegistry {
    rows: Mutex<BTreeMap<i64, DocsRecord>>,
    next_id: AtomicI64,
}

impl MemoryDocsRegistry {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for MemoryDocsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocsRegistry for MemoryDocsRegistry {
    async fn find_by_id(&self, id: i64) -> StorageResult<Option<DocsRecord>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.get(&id).cloned())
    }

    async fn find_by_repository_and_target(
        &self,
        repository_url: &str,
        target_branch_directory: &str,
    ) -> StorageResult<Vec<DocsRecord>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .values()
            .filter(|r| {
                r.repository_url == repository_url
                    && r.target_branch_directory == target_branch_directory
            })
            .cloned()
            .collect())
    }

    async fn find_by_repository_and_package(
        &self,
        repository_url: &str,
        package_name: &str,
    ) -> StorageResult<Vec<DocsRecord>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .values()
            .filter(|r| r.repository_url == repository_url && r.package_name == package_name)
            .cloned()
            .collect())
    }

    async fn find_conflicting(
        &self,
        package_name: &str,
        repository_url: &str,
    ) -> StorageResult<Vec<DocsRecord>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .values()
            .filter(|r| r.package_name == package_name && r.repository_url != repository_url)
            .cloned()
            .collect())
    }

    async fn find_by_build_key(&self, build_key: &str) -> StorageResult<Option<DocsRecord>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .values()
            .find(|r| !r.build_key.is_empty() && r.build_key == build_key)
            .cloned())
    }

    async fn all_repository_urls(&self) -> StorageResult<Vec<String>> {
        let rows = self.rows.lock().unwrap();
        let urls: BTreeSet<String> = rows.values().map(|r| r.repository_url.clone()).collect();
        Ok(urls.into_iter().collect())
    }

    async fn persist(&self, mut record: DocsRecord) -> StorageResult<DocsRecord> {
        record.touch(Utc::now());
        let id = match record.id {
            Some(id) => id,
            None => {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                record.id = Some(id);
                id
            }
        };
        let mut rows = self.rows.lock().unwrap();
        rows.insert(id, record.clone());
        Ok(record)
    }

    async fn flush(&self) -> StorageResult<()> {
        // Write-through: persist already stored everything.
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryRedirectStore
// ---------------------------------------------------------------------------

/// In-memory redirect store backed by a `BTreeMap<id, Redirect>`.
#[derive(Debug)]
pub struct MemoryRedirectStore {
    rows: Mutex<BTreeMap<i64, Redirect>>,
    next_id: AtomicI64,
}

impl MemoryRedirectStore {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for MemoryRedirectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RedirectStore for MemoryRedirectStore {
    async fn persist(&self, mut redirect: Redirect) -> StorageResult<Redirect> {
        redirect.touch(Utc::now());
        let id = match redirect.id {
            Some(id) => id,
            None => {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                redirect.id = Some(id);
                id
            }
        };
        let mut rows = self.rows.lock().unwrap();
        rows.insert(id, redirect.clone());
        Ok(redirect)
    }

    async fn list(&self) -> StorageResult<Vec<Redirect>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.values().cloned().collect())
    }
}
