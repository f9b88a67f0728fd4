//! Docs-server redirect rows.
//!
//! The status code is validated at assignment time, never at persist time:
//! a [`Redirect`] holding an out-of-range code cannot be constructed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::storage_traits::StorageResult;

/// HTTP status codes a redirect may carry.
pub const ALLOWED_STATUS_CODES: [u16; 4] = [301, 302, 303, 307];

/// Status code used when none is given explicitly.
pub const DEFAULT_STATUS_CODE: u16 = 303;

/// A redirect served by the documentation web server.
///
/// The `status_code` field is private so every write path goes through
/// [`Redirect::set_status_code`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redirect {
    /// Backend-assigned numeric id, `None` until first persisted.
    pub id: Option<i64>,
    pub source: String,
    pub target: String,
    status_code: u16,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Redirect {
    /// Create a redirect with the default status code (303 See Other).
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Redirect {
            id: None,
            source: source.into(),
            target: target.into(),
            status_code: DEFAULT_STATUS_CODE,
            created_at: None,
            updated_at: None,
        }
    }

    /// Create a redirect with an explicit status code.
    pub fn with_status_code(
        source: impl Into<String>,
        target: impl Into<String>,
        status_code: u16,
    ) -> StorageResult<Self> {
        let mut redirect = Redirect::new(source, target);
        redirect.set_status_code(status_code)?;
        Ok(redirect)
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// Assign a status code, rejecting any value outside
    /// [`ALLOWED_STATUS_CODES`]. The previous value is kept on failure.
    pub fn set_status_code(&mut self, status_code: u16) -> StorageResult<()> {
        if !ALLOWED_STATUS_CODES.contains(&status_code) {
            return Err(StorageError::InvalidStatusCode { status_code });
        }
        self.status_code = status_code;
        Ok(())
    }

    /// Pre-save timestamp hook, same sticky created-at rule as
    /// [`crate::DocsRecord::touch`].
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = Some(now);
        if self.created_at.is_none() {
            self.created_at = Some(now);
        }
    }
}
