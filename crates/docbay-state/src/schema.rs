//! Schema definitions for docbay SurrealDB tables
//!
//! Tables:
//! - docs: documentation build rows
//! - redirects: docs-server redirects
//! - seq: per-table counters backing the numeric record ids
//!
//! Rows convert to/from the public registry types at the storage boundary;
//! everything SurrealDB-specific (Thing ids, datetime wrappers) stays here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::docs::{DocsRecord, DocsStatus};
use crate::error::StorageError;
use crate::redirect::Redirect;
use crate::storage_traits::StorageResult;

/// Module for serializing optional chrono DateTime to SurrealDB datetime format
mod surreal_datetime_opt {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};
    use surrealdb::sql::Datetime as SurrealDatetime;

    pub fn serialize<S>(date: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(d) => {
                let sd = SurrealDatetime::from(*d);
                serde::Serialize::serialize(&Some(sd), serializer)
            }
            None => serde::Serialize::serialize(&None::<SurrealDatetime>, serializer),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let sd = Option::<SurrealDatetime>::deserialize(deserializer)?;
        Ok(sd.map(DateTime::from))
    }
}

/// Documentation build row as stored in the `docs` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocsRow {
    /// SurrealDB record ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<surrealdb::sql::Thing>,
    /// Application-level numeric id
    pub record_id: i64,
    pub repository_url: String,
    pub manifest_url: Option<String>,
    pub package_name: String,
    pub vendor: String,
    pub name: String,
    pub extension_key: Option<String>,
    pub type_long: String,
    pub type_short: String,
    pub min_version: Option<String>,
    pub max_version: Option<String>,
    pub branch: String,
    pub target_branch_directory: String,
    /// Status string: "awaiting_approval" | "rendering" | "done" | "error"
    pub status: String,
    pub approved: bool,
    pub is_new: bool,
    pub re_render_needed: bool,
    pub build_key: String,
    #[serde(default, with = "surreal_datetime_opt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "surreal_datetime_opt")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl DocsRow {
    /// Build a row from a registry record. The record must already carry its
    /// numeric id (persist assigns it before converting).
    pub fn from_record(record: &DocsRecord, record_id: i64) -> Self {
        DocsRow {
            id: None,
            record_id,
            repository_url: record.repository_url.clone(),
            manifest_url: record.manifest_url.clone(),
            package_name: record.package_name.clone(),
            vendor: record.vendor.clone(),
            name: record.name.clone(),
            extension_key: record.extension_key.clone(),
            type_long: record.type_long.clone(),
            type_short: record.type_short.clone(),
            min_version: record.min_version.clone(),
            max_version: record.max_version.clone(),
            branch: record.branch.clone(),
            target_branch_directory: record.target_branch_directory.clone(),
            status: record.status.as_str().to_string(),
            approved: record.approved,
            is_new: record.is_new,
            re_render_needed: record.re_render_needed,
            build_key: record.build_key.clone(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }

    /// Convert a stored row back into a registry record.
    pub fn into_record(self) -> StorageResult<DocsRecord> {
        let status = DocsStatus::parse(&self.status).ok_or_else(|| StorageError::CorruptRow {
            reason: format!("unknown docs status: {}", self.status),
        })?;

        Ok(DocsRecord {
            id: Some(self.record_id),
            repository_url: self.repository_url,
            manifest_url: self.manifest_url,
            package_name: self.package_name,
            vendor: self.vendor,
            name: self.name,
            extension_key: self.extension_key,
            type_long: self.type_long,
            type_short: self.type_short,
            min_version: self.min_version,
            max_version: self.max_version,
            branch: self.branch,
            target_branch_directory: self.target_branch_directory,
            status,
            approved: self.approved,
            is_new: self.is_new,
            re_render_needed: self.re_render_needed,
            build_key: self.build_key,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Redirect row as stored in the `redirects` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedirectRow {
    /// SurrealDB record ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<surrealdb::sql::Thing>,
    /// Application-level numeric id
    pub record_id: i64,
    pub source: String,
    pub target: String,
    pub status_code: u16,
    #[serde(default, with = "surreal_datetime_opt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "surreal_datetime_opt")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl RedirectRow {
    pub fn from_redirect(redirect: &Redirect, record_id: i64) -> Self {
        RedirectRow {
            id: None,
            record_id,
            source: redirect.source.clone(),
            target: redirect.target.clone(),
            status_code: redirect.status_code(),
            created_at: redirect.created_at,
            updated_at: redirect.updated_at,
        }
    }

    /// Convert a stored row back into a redirect. Status codes are validated
    /// again on the way out so a hand-edited row cannot smuggle one in.
    pub fn into_redirect(self) -> StorageResult<Redirect> {
        let mut redirect = Redirect::with_status_code(self.source, self.target, self.status_code)?;
        redirect.id = Some(self.record_id);
        redirect.created_at = self.created_at;
        redirect.updated_at = self.updated_at;
        Ok(redirect)
    }
}

/// Counter row in the `seq` table, one per counted table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeqRow {
    pub value: i64,
}
