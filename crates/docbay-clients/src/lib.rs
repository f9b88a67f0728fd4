//! Docbay collaborator clients
//!
//! Production implementations of the `docbay-core` collaborator traits:
//!
//! - `HttpManifestFetcher`: package manifests over plain HTTP
//! - `GitBranchLister`: remote ref discovery via `git ls-remote`
//! - `BambooClient`: build queueing and results against the Bamboo REST API
//! - `SlackClient`: discovery announcements via incoming webhook
//! - `GraylogClient`: read-only trigger log search, failures degrade to empty
//!
//! Each client reads its settings from a config struct; `from_env`
//! constructors exist for the binary edge, nothing reads the environment
//! per request.

pub mod bamboo;
mod error;
pub mod git;
pub mod graylog;
pub mod manifest;
pub mod slack;

pub use bamboo::{BambooClient, BambooConfig, BuildStatus};
pub use git::GitBranchLister;
pub use graylog::{GraylogClient, GraylogConfig};
pub use manifest::HttpManifestFetcher;
pub use slack::{SlackClient, SlackConfig};

/// User agent sent by every HTTP client in this crate.
pub(crate) const USER_AGENT: &str = concat!("docbay/", env!("CARGO_PKG_VERSION"));
