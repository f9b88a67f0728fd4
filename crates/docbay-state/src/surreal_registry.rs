//! SurrealDB-backed DocsRegistry implementation
//!
//! Uses `schema::DocsRow` for persistence, converting to/from the public
//! registry types at the boundary. Numeric record ids come from the `seq`
//! counter table so rows keep stable ids across backends.

use async_trait::async_trait;
use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::{debug, info};

use crate::docs::DocsRecord;
use crate::error::{StateError, StorageError};
use crate::migrations;
use crate::schema::DocsRow;
use crate::schema::SeqRow;
use crate::storage_traits::{DocsRegistry, StorageResult};
use crate::surreal_redirects::SurrealRedirectStore;

/// Configuration for a remote SurrealDB connection
#[derive(Debug, Clone)]
pub struct StateConfig {
    /// Endpoint URL (e.g., "wss://xxx.aws-use1.surrealdb.cloud" or "surrealkv://.docbay/db")
    pub endpoint: String,
    /// Database username
    pub username: String,
    /// Database password
    pub password: String,
    /// Namespace (default: "docbay")
    pub namespace: String,
    /// Database name (default: "main")
    pub database: String,
    /// Whether this is a root user (true) or database user (false)
    pub is_root: bool,
}

impl StateConfig {
    /// Create a new configuration for a database user
    pub fn new(
        endpoint: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            username: username.into(),
            password: password.into(),
            namespace: "docbay".to_string(),
            database: "main".to_string(),
            is_root: false,
        }
    }

    /// Create a new configuration for a root user
    pub fn new_root(
        endpoint: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            username: username.into(),
            password: password.into(),
            namespace: "docbay".to_string(),
            database: "main".to_string(),
            is_root: true,
        }
    }

    /// Set custom namespace
    pub fn with_namespace(mut self, ns: impl Into<String>) -> Self {
        self.namespace = ns.into();
        self
    }

    /// Set custom database
    pub fn with_database(mut self, db: impl Into<String>) -> Self {
        self.database = db.into();
        self
    }

    /// Set whether this is a root user
    pub fn with_root(mut self, is_root: bool) -> Self {
        self.is_root = is_root;
        self
    }

    /// Create from environment variables
    ///
    /// Reads:
    /// - DOCBAY_DB_ENDPOINT (required)
    /// - DOCBAY_DB_USERNAME (required)
    /// - DOCBAY_DB_PASSWORD (required)
    /// - DOCBAY_DB_NAMESPACE (optional, default: "docbay")
    /// - DOCBAY_DB_DATABASE (optional, default: "main")
    /// - DOCBAY_DB_ROOT (optional, default: "false") - set to "true" for root users
    pub fn from_env() -> std::result::Result<Self, String> {
        let endpoint =
            std::env::var("DOCBAY_DB_ENDPOINT").map_err(|_| "DOCBAY_DB_ENDPOINT not set")?;
        let username =
            std::env::var("DOCBAY_DB_USERNAME").map_err(|_| "DOCBAY_DB_USERNAME not set")?;
        let password =
            std::env::var("DOCBAY_DB_PASSWORD").map_err(|_| "DOCBAY_DB_PASSWORD not set")?;
        let namespace =
            std::env::var("DOCBAY_DB_NAMESPACE").unwrap_or_else(|_| "docbay".to_string());
        let database = std::env::var("DOCBAY_DB_DATABASE").unwrap_or_else(|_| "main".to_string());
        let is_root = std::env::var("DOCBAY_DB_ROOT")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(false);

        Ok(Self {
            endpoint,
            username,
            password,
            namespace,
            database,
            is_root,
        })
    }
}

/// Bump and return the counter for `table` in the `seq` table.
///
/// First call creates the counter record and returns 1.
pub(crate) async fn next_record_id(db: &Surreal<Any>, table: &str) -> StorageResult<i64> {
    let table_owned = table.to_string();
    let mut res = db
        .query("UPSERT type::thing('seq', $tbl) SET value += 1 RETURN AFTER")
        .bind(("tbl", table_owned))
        .await
        .map_err(|e| StorageError::Backend(e.to_string()))?;

    let rows: Vec<SeqRow> = res
        .take(0)
        .map_err(|e| StorageError::Backend(e.to_string()))?;

    rows.into_iter()
        .next()
        .map(|row| row.value)
        .ok_or_else(|| StorageError::Backend(format!("seq counter for {table} returned no row")))
}

/// SurrealDB-backed implementation of [`DocsRegistry`].
pub struct SurrealDocsRegistry {
    db: Surreal<Any>,
}

impl SurrealDocsRegistry {
    /// Create an in-memory instance for testing.
    ///
    /// Connects to `mem://`, selects `docbay/main`, and runs `init_schema`.
    pub async fn in_memory() -> crate::Result<Self> {
        let db = surrealdb::engine::any::connect("mem://")
            .await
            .map_err(|e| StateError::Connection(e.to_string()))?;

        db.use_ns("docbay")
            .use_db("main")
            .await
            .map_err(|e| StateError::Connection(e.to_string()))?;

        migrations::init_schema(&db).await?;

        info!("SurrealDocsRegistry connected (in-memory)");
        Ok(Self { db })
    }

    /// Connect to the endpoint described by `config` and run migrations.
    pub async fn connect(config: &StateConfig) -> crate::Result<Self> {
        use surrealdb::opt::auth::{Database, Root};

        let db = surrealdb::engine::any::connect(&config.endpoint)
            .await
            .map_err(|e| StateError::Connection(e.to_string()))?;

        if !config.username.is_empty() {
            if config.is_root {
                db.signin(Root {
                    username: &config.username,
                    password: &config.password,
                })
                .await
                .map_err(|e| StateError::Connection(format!("Root auth failed: {e}")))?;
            } else {
                db.signin(Database {
                    namespace: &config.namespace,
                    database: &config.database,
                    username: &config.username,
                    password: &config.password,
                })
                .await
                .map_err(|e| StateError::Connection(format!("DB auth failed: {e}")))?;
            }
        }

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await
            .map_err(|e| StateError::Connection(e.to_string()))?;

        migrations::init_schema(&db).await?;
        info!("SurrealDocsRegistry connected ({})", config.endpoint);
        Ok(Self { db })
    }

    /// Create from environment variables.
    ///
    /// Tries the full `StateConfig` env chain first, then `DOCBAY_DB_URL`
    /// (unauthenticated endpoint), then falls back to local persistence in
    /// `.docbay/db`.
    pub async fn from_env() -> crate::Result<Self> {
        if let Ok(config) = StateConfig::from_env() {
            return Self::connect(&config).await;
        }

        if let Ok(url) = std::env::var("DOCBAY_DB_URL") {
            let db = surrealdb::engine::any::connect(&url)
                .await
                .map_err(|e| StateError::Connection(e.to_string()))?;

            db.use_ns("docbay")
                .use_db("main")
                .await
                .map_err(|e| StateError::Connection(e.to_string()))?;

            migrations::init_schema(&db).await?;
            info!("SurrealDocsRegistry connected ({})", url);
            return Ok(Self { db });
        }

        // Default to local persistence in .docbay/db
        let path = ".docbay/db";
        std::fs::create_dir_all(path).map_err(|e| {
            StateError::Connection(format!(
                "Failed to create database directory {}: {}",
                path, e
            ))
        })?;
        let url = format!("surrealkv://{}", path);
        info!(
            "No DOCBAY_DB_ENDPOINT or DOCBAY_DB_URL found, using local persistence: {}",
            url
        );

        let db = surrealdb::engine::any::connect(&url)
            .await
            .map_err(|e| StateError::Connection(format!("Failed to connect to {}: {}", url, e)))?;

        db.use_ns("docbay")
            .use_db("main")
            .await
            .map_err(|e| StateError::Connection(e.to_string()))?;

        migrations::init_schema(&db).await?;
        Ok(Self { db })
    }

    /// Redirect store sharing this registry's connection.
    pub fn redirect_store(&self) -> SurrealRedirectStore {
        SurrealRedirectStore::with_connection(self.db.clone())
    }

    // -- private helpers -----------------------------------------------------

    /// Drain a docs query response and convert the resulting rows.
    fn take_records(mut res: surrealdb::Response) -> StorageResult<Vec<DocsRecord>> {
        let rows: Vec<DocsRow> = res
            .take(0)
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        rows.into_iter().map(DocsRow::into_record).collect()
    }
}

#[async_trait]
impl DocsRegistry for SurrealDocsRegistry {
    async fn find_by_id(&self, id: i64) -> StorageResult<Option<DocsRecord>> {
        let res = self
            .db
            .query("SELECT * FROM docs WHERE record_id = $id")
            .bind(("id", id))
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        Ok(Self::take_records(res)?.into_iter().next())
    }

    async fn find_by_repository_and_target(
        &self,
        repository_url: &str,
        target_branch_directory: &str,
    ) -> StorageResult<Vec<DocsRecord>> {
        let repo = repository_url.to_string();
        let target = target_branch_directory.to_string();
        let res = self
            .db
            .query(
                "SELECT * FROM docs \
                 WHERE repository_url = $repo AND target_branch_directory = $target \
                 ORDER BY record_id ASC",
            )
            .bind(("repo", repo))
            .bind(("target", target))
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        Self::take_records(res)
    }

    async fn find_by_repository_and_package(
        &self,
        repository_url: &str,
        package_name: &str,
    ) -> StorageResult<Vec<DocsRecord>> {
        let repo = repository_url.to_string();
        let package = package_name.to_string();
        let res = self
            .db
            .query(
                "SELECT * FROM docs \
                 WHERE repository_url = $repo AND package_name = $package \
                 ORDER BY record_id ASC",
            )
            .bind(("repo", repo))
            .bind(("package", package))
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        Self::take_records(res)
    }

    async fn find_conflicting(
        &self,
        package_name: &str,
        repository_url: &str,
    ) -> StorageResult<Vec<DocsRecord>> {
        let package = package_name.to_string();
        let repo = repository_url.to_string();
        let res = self
            .db
            .query(
                "SELECT * FROM docs \
                 WHERE package_name = $package AND repository_url != $repo \
                 ORDER BY record_id ASC",
            )
            .bind(("package", package))
            .bind(("repo", repo))
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        Self::take_records(res)
    }

    async fn find_by_build_key(&self, build_key: &str) -> StorageResult<Option<DocsRecord>> {
        // Rows without a queued build carry an empty build_key and never match.
        let key = build_key.to_string();
        let res = self
            .db
            .query("SELECT * FROM docs WHERE build_key = $key AND build_key != ''")
            .bind(("key", key))
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        Ok(Self::take_records(res)?.into_iter().next())
    }

    async fn all_repository_urls(&self) -> StorageResult<Vec<String>> {
        #[derive(serde::Deserialize)]
        struct UrlRow {
            repository_url: String,
        }

        let mut res = self
            .db
            .query("SELECT repository_url FROM docs")
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        let rows: Vec<UrlRow> = res
            .take(0)
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        let mut urls: Vec<String> = rows.into_iter().map(|r| r.repository_url).collect();
        urls.sort();
        urls.dedup();
        Ok(urls)
    }

    async fn persist(&self, mut record: DocsRecord) -> StorageResult<DocsRecord> {
        record.touch(chrono::Utc::now());

        match record.id {
            Some(record_id) => {
                let row = DocsRow::from_record(&record, record_id);

                self.db
                    .query("UPDATE docs CONTENT $row WHERE record_id = $rid")
                    .bind(("row", row))
                    .bind(("rid", record_id))
                    .await
                    .map_err(|e| StorageError::Backend(e.to_string()))?;

                Ok(record)
            }
            None => {
                let record_id = next_record_id(&self.db, "docs").await?;
                let row = DocsRow::from_record(&record, record_id);

                debug!(record_id, "creating docs row");

                let _created: Option<DocsRow> = self
                    .db
                    .create("docs")
                    .content(row)
                    .await
                    .map_err(|e| StorageError::Backend(e.to_string()))?;

                record.id = Some(record_id);
                Ok(record)
            }
        }
    }

    async fn flush(&self) -> StorageResult<()> {
        // Write-through: persist already stored everything.
        Ok(())
    }
}
