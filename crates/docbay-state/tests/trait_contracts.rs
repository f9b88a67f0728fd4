//! Trait contract tests for DocsRegistry and RedirectStore.
//!
//! These tests verify the behavioral contracts of the storage traits
//! using in-memory fakes. Any conforming implementation must pass these.

use docbay_state::fakes::{MemoryDocsRegistry, MemoryRedirectStore};
use docbay_state::{
    DocsRecord, DocsRegistry, DocsStatus, Redirect, RedirectStore, StorageError,
    SurrealDocsRegistry,
};

fn sample_record(
    repository_url: &str,
    branch: &str,
    target: &str,
    package_name: &str,
) -> DocsRecord {
    let mut record = DocsRecord::new(repository_url, branch);
    let (vendor, name) = package_name.split_once('/').unwrap_or(("acme", "docs"));
    record.package_name = package_name.to_string();
    record.vendor = vendor.to_string();
    record.name = name.to_string();
    record.type_long = "extension".to_string();
    record.type_short = "p".to_string();
    record.target_branch_directory = target.to_string();
    record
}

// ===========================================================================
// DocsRegistry contract tests
// ===========================================================================

#[tokio::test]
async fn registry_persist_assigns_ids_in_order() {
    let registry = MemoryDocsRegistry::new();

    let a = registry
        .persist(sample_record("https://github.com/acme/a.git", "main", "main", "acme/a"))
        .await
        .unwrap();
    let b = registry
        .persist(sample_record("https://github.com/acme/b.git", "main", "main", "acme/b"))
        .await
        .unwrap();

    let id_a = a.id.unwrap();
    let id_b = b.id.unwrap();
    assert!(id_b > id_a);
}

#[tokio::test]
async fn registry_persist_sets_timestamps_once() {
    let registry = MemoryDocsRegistry::new();

    let first = registry
        .persist(sample_record("https://github.com/acme/a.git", "main", "main", "acme/a"))
        .await
        .unwrap();
    assert!(first.created_at.is_some());
    assert_eq!(first.created_at, first.updated_at);

    let second = registry.persist(first.clone()).await.unwrap();
    assert_eq!(second.created_at, first.created_at);
    assert!(second.updated_at >= first.updated_at);
}

#[tokio::test]
async fn registry_update_in_place_keeps_id() {
    let registry = MemoryDocsRegistry::new();

    let mut row = registry
        .persist(sample_record("https://github.com/acme/a.git", "main", "main", "acme/a"))
        .await
        .unwrap();
    let id = row.id.unwrap();

    row.status = DocsStatus::Rendering;
    row.build_key = "DOCS-BUILD-42".to_string();
    let updated = registry.persist(row).await.unwrap();

    assert_eq!(updated.id, Some(id));

    let rows = registry
        .find_by_repository_and_target("https://github.com/acme/a.git", "main")
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].status, DocsStatus::Rendering);
    assert_eq!(rows[0].build_key, "DOCS-BUILD-42");
}

#[tokio::test]
async fn registry_find_by_id_none_for_unknown() {
    let registry = MemoryDocsRegistry::new();
    assert!(registry.find_by_id(999).await.unwrap().is_none());
}

#[tokio::test]
async fn registry_find_by_repository_and_target_filters_both_columns() {
    let registry = MemoryDocsRegistry::new();
    let repo = "https://github.com/acme/a.git";

    registry
        .persist(sample_record(repo, "main", "main", "acme/a"))
        .await
        .unwrap();
    registry
        .persist(sample_record(repo, "9.5", "9.5", "acme/a"))
        .await
        .unwrap();
    registry
        .persist(sample_record("https://github.com/acme/b.git", "main", "main", "acme/b"))
        .await
        .unwrap();

    let rows = registry
        .find_by_repository_and_target(repo, "main")
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].branch, "main");

    let none = registry
        .find_by_repository_and_target(repo, "12.4")
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn registry_find_by_repository_and_package_filters_both_columns() {
    let registry = MemoryDocsRegistry::new();
    let repo = "https://github.com/acme/a.git";

    registry
        .persist(sample_record(repo, "main", "main", "acme/a"))
        .await
        .unwrap();
    registry
        .persist(sample_record(repo, "9.5", "9.5", "acme/a"))
        .await
        .unwrap();

    let rows = registry
        .find_by_repository_and_package(repo, "acme/a")
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);

    let none = registry
        .find_by_repository_and_package(repo, "acme/other")
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn registry_conflicting_requires_different_repository() {
    let registry = MemoryDocsRegistry::new();

    registry
        .persist(sample_record("https://github.com/acme/a.git", "main", "main", "acme/a"))
        .await
        .unwrap();

    // Same package under the same URL is not a conflict
    let same = registry
        .find_conflicting("acme/a", "https://github.com/acme/a.git")
        .await
        .unwrap();
    assert!(same.is_empty());

    // Same package under a different URL is
    let conflicts = registry
        .find_conflicting("acme/a", "https://github.com/fork/a.git")
        .await
        .unwrap();
    assert_eq!(conflicts.len(), 1);
}

#[tokio::test]
async fn registry_find_by_build_key_skips_unqueued_rows() {
    let registry = MemoryDocsRegistry::new();

    // Freshly registered rows carry an empty build key
    let mut row = registry
        .persist(sample_record("https://github.com/acme/a.git", "main", "main", "acme/a"))
        .await
        .unwrap();
    assert!(registry.find_by_build_key("").await.unwrap().is_none());

    row.build_key = "DOCS-BUILD-7".to_string();
    registry.persist(row).await.unwrap();

    let found = registry.find_by_build_key("DOCS-BUILD-7").await.unwrap();
    assert!(found.is_some());
    assert!(registry.find_by_build_key("").await.unwrap().is_none());
}

#[tokio::test]
async fn registry_all_repository_urls_sorted_and_distinct() {
    let registry = MemoryDocsRegistry::new();

    registry
        .persist(sample_record("https://github.com/zeta/z.git", "main", "main", "zeta/z"))
        .await
        .unwrap();
    registry
        .persist(sample_record("https://github.com/acme/a.git", "main", "main", "acme/a"))
        .await
        .unwrap();
    registry
        .persist(sample_record("https://github.com/acme/a.git", "9.5", "9.5", "acme/a"))
        .await
        .unwrap();

    let urls = registry.all_repository_urls().await.unwrap();
    assert_eq!(
        urls,
        vec![
            "https://github.com/acme/a.git".to_string(),
            "https://github.com/zeta/z.git".to_string(),
        ]
    );
}

#[tokio::test]
async fn registry_flush_succeeds() {
    let registry = MemoryDocsRegistry::new();
    registry.flush().await.unwrap();
}

// ===========================================================================
// RedirectStore contract tests
// ===========================================================================

#[tokio::test]
async fn redirects_persist_assigns_id_and_timestamps() {
    let store = MemoryRedirectStore::new();

    let redirect = store
        .persist(Redirect::new("/p/acme/a/8.7", "/p/acme/a/9.5"))
        .await
        .unwrap();

    assert!(redirect.id.is_some());
    assert!(redirect.created_at.is_some());
    assert_eq!(redirect.status_code(), 303);
}

#[tokio::test]
async fn redirects_list_ordered_by_id() {
    let store = MemoryRedirectStore::new();

    store
        .persist(Redirect::new("/first", "/target"))
        .await
        .unwrap();
    store
        .persist(Redirect::new("/second", "/target"))
        .await
        .unwrap();

    let all = store.list().await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].source, "/first");
    assert_eq!(all[1].source, "/second");
    assert!(all[0].id.unwrap() < all[1].id.unwrap());
}

#[tokio::test]
async fn redirects_update_in_place() {
    let store = MemoryRedirectStore::new();

    let mut redirect = store
        .persist(Redirect::new("/old", "/target"))
        .await
        .unwrap();
    let id = redirect.id.unwrap();

    redirect.set_status_code(301).unwrap();
    let updated = store.persist(redirect).await.unwrap();

    assert_eq!(updated.id, Some(id));

    let all = store.list().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].status_code(), 301);
}

// ===========================================================================
// SurrealDocsRegistry contract tests (mirrors MemoryDocsRegistry tests above)
// ===========================================================================

mod surreal_registry_tests {
    use super::*;

    async fn registry() -> SurrealDocsRegistry {
        SurrealDocsRegistry::in_memory()
            .await
            .expect("in_memory() failed")
    }

    #[tokio::test]
    async fn persist_assigns_ids_in_order() {
        let registry = registry().await;

        let a = registry
            .persist(sample_record("https://github.com/acme/a.git", "main", "main", "acme/a"))
            .await
            .unwrap();
        let b = registry
            .persist(sample_record("https://github.com/acme/b.git", "main", "main", "acme/b"))
            .await
            .unwrap();

        assert!(b.id.unwrap() > a.id.unwrap());
    }

    #[tokio::test]
    async fn persist_round_trips_all_fields() {
        let registry = registry().await;

        let mut record =
            sample_record("https://github.com/acme/a.git", "9.5", "9.5", "acme/a");
        record.extension_key = Some("a_extension".to_string());
        record.min_version = Some("9.5".to_string());
        record.max_version = Some("10.4".to_string());
        record.manifest_url = Some(
            "https://raw.githubusercontent.com/acme/a/9.5/composer.json".to_string(),
        );

        let stored = registry.persist(record).await.unwrap();
        let found = registry
            .find_by_id(stored.id.unwrap())
            .await
            .unwrap()
            .expect("row not found");

        assert_eq!(found.extension_key.as_deref(), Some("a_extension"));
        assert_eq!(found.min_version.as_deref(), Some("9.5"));
        assert_eq!(found.max_version.as_deref(), Some("10.4"));
        assert_eq!(found.status, DocsStatus::AwaitingApproval);
        assert_eq!(found.created_at, stored.created_at);
    }

    #[tokio::test]
    async fn update_in_place_keeps_id() {
        let registry = registry().await;

        let mut row = registry
            .persist(sample_record("https://github.com/acme/a.git", "main", "main", "acme/a"))
            .await
            .unwrap();
        let id = row.id.unwrap();

        row.status = DocsStatus::Done;
        row.build_key = "DOCS-BUILD-42".to_string();
        registry.persist(row).await.unwrap();

        let rows = registry
            .find_by_repository_and_target("https://github.com/acme/a.git", "main")
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, Some(id));
        assert_eq!(rows[0].status, DocsStatus::Done);
    }

    #[tokio::test]
    async fn conflicting_requires_different_repository() {
        let registry = registry().await;

        registry
            .persist(sample_record("https://github.com/acme/a.git", "main", "main", "acme/a"))
            .await
            .unwrap();

        let same = registry
            .find_conflicting("acme/a", "https://github.com/acme/a.git")
            .await
            .unwrap();
        assert!(same.is_empty());

        let conflicts = registry
            .find_conflicting("acme/a", "https://github.com/fork/a.git")
            .await
            .unwrap();
        assert_eq!(conflicts.len(), 1);
    }

    #[tokio::test]
    async fn find_by_build_key_skips_unqueued_rows() {
        let registry = registry().await;

        let mut row = registry
            .persist(sample_record("https://github.com/acme/a.git", "main", "main", "acme/a"))
            .await
            .unwrap();
        assert!(registry.find_by_build_key("").await.unwrap().is_none());

        row.build_key = "DOCS-BUILD-7".to_string();
        registry.persist(row).await.unwrap();

        assert!(registry
            .find_by_build_key("DOCS-BUILD-7")
            .await
            .unwrap()
            .is_some());
        assert!(registry.find_by_build_key("").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn all_repository_urls_sorted_and_distinct() {
        let registry = registry().await;

        registry
            .persist(sample_record("https://github.com/zeta/z.git", "main", "main", "zeta/z"))
            .await
            .unwrap();
        registry
            .persist(sample_record("https://github.com/acme/a.git", "main", "main", "acme/a"))
            .await
            .unwrap();
        registry
            .persist(sample_record("https://github.com/acme/a.git", "9.5", "9.5", "acme/a"))
            .await
            .unwrap();

        let urls = registry.all_repository_urls().await.unwrap();
        assert_eq!(
            urls,
            vec![
                "https://github.com/acme/a.git".to_string(),
                "https://github.com/zeta/z.git".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn duplicate_branch_directory_rejected_by_index() {
        let registry = registry().await;
        let repo = "https://github.com/acme/a.git";

        registry
            .persist(sample_record(repo, "main", "main", "acme/a"))
            .await
            .unwrap();

        // The unique (repository_url, target_branch_directory) index backstops
        // the orchestrator's skip-if-exists check.
        let err = registry
            .persist(sample_record(repo, "master", "main", "acme/a"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Backend(_)));
    }

    #[tokio::test]
    async fn redirect_store_shares_database() {
        let registry = registry().await;
        let store = registry.redirect_store();

        let redirect = store
            .persist(Redirect::new("/p/acme/a/8.7", "/p/acme/a/9.5"))
            .await
            .unwrap();
        assert!(redirect.id.is_some());

        let all = store.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].target, "/p/acme/a/9.5");
    }
}
