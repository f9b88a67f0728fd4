//! Domain models for docbay.
//!
//! Canonical definitions for the core entities:
//! - `VersionRef`: A pushed ref classified as documentation-worthy
//! - `GerritChange`: A review change eligible for a core pre-merge build
//! - `PackageManifest`: Validated composer.json-shaped manifest
//! - `DeploymentInformation`: Everything one render build needs

pub mod deployment;
pub mod gerrit;
pub mod manifest;
pub mod version_ref;

// Re-export main types
pub use deployment::DeploymentInformation;
pub use gerrit::GerritChange;
pub use manifest::{is_valid_package_name, PackageManifest, PackageType, DOCS_HOME_REPOSITORY};
pub use version_ref::{RefKind, RefSource, VersionRef};
