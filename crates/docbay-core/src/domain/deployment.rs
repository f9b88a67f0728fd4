//! Deployment information handed to the render pipeline.
//!
//! Both constructors are referentially transparent: the same inputs always
//! produce the same `DeploymentInformation`, which is what makes build
//! re-triggering safe.

use docbay_state::DocsRecord;
use serde::Serialize;

use crate::domain::manifest::{is_valid_package_name, PackageManifest, PackageType, DOCS_HOME_REPOSITORY};
use crate::domain::version_ref::VersionRef;
use crate::error::{DocbayError, Result};

/// Everything the render pipeline needs to know about one build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentInformation {
    pub repository_url: String,
    pub vendor: String,
    pub name: String,
    pub package_name: String,
    pub extension_key: String,
    pub type_long: String,
    pub type_short: String,
    pub source_branch: String,
    pub target_branch_directory: String,
    pub min_version: Option<String>,
    pub max_version: Option<String>,
    pub private_dir: String,
    pub sub_dir: String,
}

/// Map a repository and package type to `(type_short, type_long)`.
///
/// The docs-home override wins over whatever the manifest claims, so it is
/// checked before the type table.
fn resolve_type_codes(
    repository_url: &str,
    package_type: Option<PackageType>,
) -> Result<(&'static str, &'static str)> {
    if repository_url == DOCS_HOME_REPOSITORY {
        return Ok(("h", "docs-home"));
    }
    match package_type {
        Some(PackageType::Documentation) => Ok(("m", "manual")),
        Some(PackageType::CoreExtension) => Ok(("c", "core-extension")),
        Some(PackageType::Extension) => Ok(("p", "extension")),
        None => Err(DocbayError::ManifestTypeInvalid {
            found: String::new(),
        }),
    }
}

impl DeploymentInformation {
    /// Build deployment information for a freshly pushed ref.
    pub fn from_manifest(
        manifest: &PackageManifest,
        version_ref: &VersionRef,
        repository_url: &str,
        private_dir: &str,
        sub_dir: &str,
    ) -> Result<Self> {
        let (type_short, type_long) = resolve_type_codes(repository_url, manifest.package_type)?;
        Ok(DeploymentInformation {
            repository_url: repository_url.to_string(),
            vendor: manifest.vendor().to_string(),
            name: manifest.package().to_string(),
            package_name: manifest.name.clone(),
            extension_key: manifest.extension_key.clone().unwrap_or_default(),
            type_long: type_long.to_string(),
            type_short: type_short.to_string(),
            source_branch: version_ref.raw.clone(),
            target_branch_directory: version_ref.target_directory().to_string(),
            min_version: manifest.min_version.clone(),
            max_version: manifest.max_version.clone(),
            private_dir: private_dir.to_string(),
            sub_dir: sub_dir.to_string(),
        })
    }

    /// Re-derive deployment information from a persisted registry row.
    ///
    /// The stored type codes are trusted as-is, but the package name and the
    /// branch are re-validated: a hand-edited row must not reach the build
    /// system.
    pub fn from_registry(record: &DocsRecord, private_dir: &str, sub_dir: &str) -> Result<Self> {
        if !is_valid_package_name(&record.package_name) {
            return Err(DocbayError::ManifestNameInvalid {
                name: record.package_name.clone(),
            });
        }
        let Some((vendor, name)) = record.package_name.split_once('/') else {
            return Err(DocbayError::ManifestNameInvalid {
                name: record.package_name.clone(),
            });
        };
        let version_ref = VersionRef::parse_any(&record.branch)?;

        Ok(DeploymentInformation {
            repository_url: record.repository_url.clone(),
            vendor: vendor.to_string(),
            name: name.to_string(),
            package_name: record.package_name.clone(),
            extension_key: record.extension_key.clone().unwrap_or_default(),
            type_long: record.type_long.clone(),
            type_short: record.type_short.clone(),
            source_branch: record.branch.clone(),
            target_branch_directory: version_ref.target_directory().to_string(),
            min_version: record.min_version.clone(),
            max_version: record.max_version.clone(),
            private_dir: private_dir.to_string(),
            sub_dir: sub_dir.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_manifest() -> PackageManifest {
        PackageManifest {
            name: "acme/docs-demo".to_string(),
            package_type: Some(PackageType::Extension),
            extension_key: Some("docs_demo".to_string()),
            min_version: Some("9.5".to_string()),
            max_version: Some("10.4".to_string()),
        }
    }

    fn sample_ref() -> VersionRef {
        VersionRef::parse_any("9.5").unwrap()
    }

    #[test]
    fn manifest_fields_map_onto_deployment_information() {
        let info = DeploymentInformation::from_manifest(
            &sample_manifest(),
            &sample_ref(),
            "https://github.com/acme/docs-demo.git",
            "private",
            "docs",
        )
        .unwrap();

        assert_eq!(info.vendor, "acme");
        assert_eq!(info.name, "docs-demo");
        assert_eq!(info.package_name, "acme/docs-demo");
        assert_eq!(info.extension_key, "docs_demo");
        assert_eq!(info.type_short, "p");
        assert_eq!(info.type_long, "extension");
        assert_eq!(info.source_branch, "9.5");
        assert_eq!(info.target_branch_directory, "9.5");
        assert_eq!(info.min_version.as_deref(), Some("9.5"));
        assert_eq!(info.max_version.as_deref(), Some("10.4"));
        assert_eq!(info.private_dir, "private");
        assert_eq!(info.sub_dir, "docs");
    }

    #[test]
    fn builder_is_referentially_transparent() {
        let first = DeploymentInformation::from_manifest(
            &sample_manifest(),
            &sample_ref(),
            "https://github.com/acme/docs-demo.git",
            "private",
            "docs",
        )
        .unwrap();
        let second = DeploymentInformation::from_manifest(
            &sample_manifest(),
            &sample_ref(),
            "https://github.com/acme/docs-demo.git",
            "private",
            "docs",
        )
        .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn docs_home_overrides_the_manifest_type() {
        let mut manifest = sample_manifest();
        manifest.package_type = Some(PackageType::Documentation);
        let info = DeploymentInformation::from_manifest(
            &manifest,
            &sample_ref(),
            DOCS_HOME_REPOSITORY,
            "private",
            "docs",
        )
        .unwrap();
        assert_eq!(info.type_short, "h");
        assert_eq!(info.type_long, "docs-home");
    }

    #[test]
    fn core_extension_maps_to_its_codes() {
        let mut manifest = sample_manifest();
        manifest.package_type = Some(PackageType::CoreExtension);
        let info = DeploymentInformation::from_manifest(
            &manifest,
            &sample_ref(),
            "https://github.com/acme/docs-demo.git",
            "private",
            "docs",
        )
        .unwrap();
        assert_eq!(info.type_short, "c");
        assert_eq!(info.type_long, "core-extension");
    }

    fn sample_record(branch: &str) -> DocsRecord {
        let mut record = DocsRecord::new("https://github.com/acme/docs-demo.git", branch);
        record.package_name = "acme/docs-demo".to_string();
        record.vendor = "acme".to_string();
        record.name = "docs-demo".to_string();
        record.extension_key = Some("docs_demo".to_string());
        record.type_long = "extension".to_string();
        record.type_short = "p".to_string();
        record.target_branch_directory = "9.5".to_string();
        record
    }

    #[test]
    fn registry_row_rederives_the_target_directory() {
        let info =
            DeploymentInformation::from_registry(&sample_record("v9.5.1"), "private", "docs")
                .unwrap();
        assert_eq!(info.source_branch, "v9.5.1");
        assert_eq!(info.target_branch_directory, "9.5");
        assert_eq!(info.type_short, "p");
    }

    #[test]
    fn registry_rederivation_matches_the_fresh_build() {
        let fresh = DeploymentInformation::from_manifest(
            &sample_manifest(),
            &sample_ref(),
            "https://github.com/acme/docs-demo.git",
            "private",
            "docs",
        )
        .unwrap();

        let mut record = sample_record("9.5");
        record.min_version = Some("9.5".to_string());
        record.max_version = Some("10.4".to_string());
        let rederived =
            DeploymentInformation::from_registry(&record, "private", "docs").unwrap();

        assert_eq!(fresh, rederived);
    }

    #[test]
    fn registry_row_with_malformed_name_is_rejected() {
        let mut record = sample_record("main");
        record.package_name = "not-a-package".to_string();
        let err =
            DeploymentInformation::from_registry(&record, "private", "docs").unwrap_err();
        assert!(matches!(err, DocbayError::ManifestNameInvalid { .. }));
    }

    #[test]
    fn registry_row_with_unbuildable_branch_is_rejected() {
        let err =
            DeploymentInformation::from_registry(&sample_record("9.5-dev"), "private", "docs")
                .unwrap_err();
        assert!(err.is_do_not_care());
    }
}
