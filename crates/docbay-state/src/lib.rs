//! Docbay-State: SurrealDB Backend for the documentation registry
//!
//! This crate provides the persistence layer for docbay. It owns the
//! registry row types and all I/O with SurrealDB, behind storage traits the
//! orchestrator consumes.
//!
//! ## Key Components
//!
//! - `DocsRecord` / `Redirect`: registry row types with lifecycle hooks
//! - `DocsRegistry` / `RedirectStore`: storage traits
//! - `SurrealDocsRegistry`: SurrealDB implementation (in-memory, remote, or
//!   local surrealkv persistence)
//! - `fakes`: in-memory implementations for tests

mod docs;
mod error;
pub mod fakes;
pub mod migrations;
mod redirect;
mod schema;
pub mod storage_traits;
pub mod surreal_redirects;
pub mod surreal_registry;

pub use docs::{DocsRecord, DocsStatus};
pub use error::{StateError, StorageError};
pub use redirect::{Redirect, ALLOWED_STATUS_CODES, DEFAULT_STATUS_CODE};
pub use storage_traits::{DocsRegistry, RedirectStore, StorageResult};
pub use surreal_redirects::SurrealRedirectStore;
pub use surreal_registry::{StateConfig, SurrealDocsRegistry};

/// Result type for docbay-state operations
pub type Result<T> = std::result::Result<T, StateError>;
