//! SurrealDB schema migrations and initialization
//!
//! This module provides initialization functions to set up all tables
//! with proper constraints and indexes.

use crate::Result;
use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::{debug, info};

/// Initialize all docbay tables in SurrealDB
///
/// This should be called once on first connection to set up the schema.
/// Safe to call multiple times (idempotent).
pub async fn init_schema(db: &Surreal<Any>) -> Result<()> {
    info!("Initializing docbay SurrealDB schema");

    init_docs_table(db).await?;
    init_redirects_table(db).await?;
    init_seq_table(db).await?;

    info!("docbay schema initialization complete");
    Ok(())
}

/// Initialize `docs` table with constraints and indexes
///
/// Schema:
/// ```text
/// TABLE docs {
///   record_id:                INT (primary key, unique)
///   repository_url:           STRING (indexed)
///   manifest_url:             STRING?
///   package_name:             STRING (indexed)
///   vendor:                   STRING
///   name:                     STRING
///   extension_key:            STRING?
///   type_long:                STRING
///   type_short:               STRING
///   min_version:              STRING?
///   max_version:              STRING?
///   branch:                   STRING
///   target_branch_directory:  STRING
///   status:                   STRING (enum: awaiting_approval | rendering | done | error)
///   approved:                 BOOL
///   is_new:                   BOOL
///   re_render_needed:         BOOL
///   build_key:                STRING (indexed, empty until a build is queued)
///   created_at:               DATETIME?
///   updated_at:               DATETIME?
/// }
/// ```
///
/// Constraints:
/// - `record_id` is unique (application-assigned via the `seq` counter)
/// - `(repository_url, target_branch_directory)` is unique: one row per
///   rendered branch directory of a repository
/// - `status` transitions are enforced via app logic
async fn init_docs_table(db: &Surreal<Any>) -> Result<()> {
    debug!("Initializing docs table");

    let sql = r#"
        DEFINE TABLE docs
            SCHEMALESS
            PERMISSIONS
                FOR create FULL
                FOR select FULL
                FOR update FULL
                FOR delete NONE;

        -- Ensure record_id is unique
        DEFINE INDEX idx_record_id ON TABLE docs COLUMNS record_id UNIQUE;

        -- One row per (repository, target directory) pair
        DEFINE INDEX idx_repo_target ON TABLE docs COLUMNS repository_url, target_branch_directory UNIQUE;

        -- Index repository_url for per-repository scans
        DEFINE INDEX idx_repository_url ON TABLE docs COLUMNS repository_url;

        -- Index package_name for conflict lookups across repositories
        DEFINE INDEX idx_package_name ON TABLE docs COLUMNS package_name;

        -- Composite index (repository_url, package_name) for approval-state lookups
        DEFINE INDEX idx_repo_package ON TABLE docs COLUMNS repository_url, package_name;

        -- Index build_key for build-completion callbacks
        DEFINE INDEX idx_build_key ON TABLE docs COLUMNS build_key;
    "#;

    db.query(sql).await?;
    info!("✓ docs table initialized");
    Ok(())
}

/// Initialize `redirects` table
async fn init_redirects_table(db: &Surreal<Any>) -> Result<()> {
    debug!("Initializing redirects table");

    let sql = r#"
        DEFINE TABLE redirects
            SCHEMALESS
            PERMISSIONS
                FOR create FULL
                FOR select FULL
                FOR update FULL
                FOR delete NONE;

        DEFINE INDEX idx_record_id ON TABLE redirects COLUMNS record_id UNIQUE;
        DEFINE INDEX idx_source ON TABLE redirects COLUMNS source;
    "#;

    db.query(sql).await?;
    info!("✓ redirects table initialized");
    Ok(())
}

/// Initialize `seq` table backing the numeric id counters
///
/// One record per counted table (`seq:docs`, `seq:redirects`), bumped
/// atomically via UPSERT.
async fn init_seq_table(db: &Surreal<Any>) -> Result<()> {
    debug!("Initializing seq table");

    let sql = r#"
        DEFINE TABLE seq
            SCHEMALESS
            PERMISSIONS
                FOR create FULL
                FOR select FULL
                FOR update FULL
                FOR delete NONE;
    "#;

    db.query(sql).await?;
    info!("✓ seq table initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    // Note: Full integration tests for migrations are in docbay-state/tests/
    // These tests verify actual schema creation and constraints
}
