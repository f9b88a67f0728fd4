//! SurrealDB-backed RedirectStore implementation
//!
//! Shares a connection with [`crate::surreal_registry::SurrealDocsRegistry`]
//! via [`SurrealDocsRegistry::redirect_store`]; the docs server and the CLI
//! manage redirects over the same database.
//!
//! [`SurrealDocsRegistry::redirect_store`]: crate::surreal_registry::SurrealDocsRegistry::redirect_store

use async_trait::async_trait;
use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::debug;

use crate::error::StorageError;
use crate::redirect::Redirect;
use crate::schema::RedirectRow;
use crate::storage_traits::{RedirectStore, StorageResult};
use crate::surreal_registry::next_record_id;

/// SurrealDB-backed implementation of [`RedirectStore`].
pub struct SurrealRedirectStore {
    db: Surreal<Any>,
}

impl SurrealRedirectStore {
    /// Wrap an already connected database handle.
    ///
    /// Schema setup is the registry's job; callers go through
    /// `SurrealDocsRegistry::redirect_store`.
    pub(crate) fn with_connection(db: Surreal<Any>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RedirectStore for SurrealRedirectStore {
    async fn persist(&self, mut redirect: Redirect) -> StorageResult<Redirect> {
        redirect.touch(chrono::Utc::now());

        match redirect.id {
            Some(record_id) => {
                let row = RedirectRow::from_redirect(&redirect, record_id);

                self.db
                    .query("UPDATE redirects CONTENT $row WHERE record_id = $rid")
                    .bind(("row", row))
                    .bind(("rid", record_id))
                    .await
                    .map_err(|e| StorageError::Backend(e.to_string()))?;

                Ok(redirect)
            }
            None => {
                let record_id = next_record_id(&self.db, "redirects").await?;
                let row = RedirectRow::from_redirect(&redirect, record_id);

                debug!(record_id, "creating redirect row");

                let _created: Option<RedirectRow> = self
                    .db
                    .create("redirects")
                    .content(row)
                    .await
                    .map_err(|e| StorageError::Backend(e.to_string()))?;

                redirect.id = Some(record_id);
                Ok(redirect)
            }
        }
    }

    async fn list(&self) -> StorageResult<Vec<Redirect>> {
        let mut res = self
            .db
            .query("SELECT * FROM redirects ORDER BY record_id ASC")
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        let rows: Vec<RedirectRow> = res
            .take(0)
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        rows.into_iter().map(RedirectRow::into_redirect).collect()
    }
}
