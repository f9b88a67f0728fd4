//! Package manifest parsing and validation.
//!
//! The manifest is a composer.json-shaped document fetched from the pushed
//! branch. Validation is strict: a manifest that fails here never reaches
//! the registry.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;

use crate::error::{DocbayError, Result};

/// Repository hosting the docs server homepage. Exempt from type validation
/// and always classified as docs-home downstream.
pub const DOCS_HOME_REPOSITORY: &str =
    "https://github.com/TYPO3-Documentation/DocsTypo3Org-Homepage.git";

/// Dependency whose constraint carries the supported core version bounds.
const CORE_DEPENDENCY: &str = "typo3/cms-core";

/// Recognized package types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageType {
    Documentation,
    CoreExtension,
    Extension,
}

impl PackageType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "typo3-cms-documentation" => Some(PackageType::Documentation),
            "typo3-cms-framework" => Some(PackageType::CoreExtension),
            "typo3-cms-extension" => Some(PackageType::Extension),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PackageType::Documentation => "typo3-cms-documentation",
            PackageType::CoreExtension => "typo3-cms-framework",
            PackageType::Extension => "typo3-cms-extension",
        }
    }
}

/// Validated package manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageManifest {
    /// `vendor/package` identifier.
    pub name: String,
    /// `None` only ever for the docs-home repository, which skips type
    /// validation entirely.
    pub package_type: Option<PackageType>,
    pub extension_key: Option<String>,
    pub min_version: Option<String>,
    pub max_version: Option<String>,
}

/// Raw document shape; unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct RawManifest {
    name: Option<String>,
    #[serde(rename = "type")]
    package_type: Option<String>,
    #[serde(default)]
    require: BTreeMap<String, String>,
    #[serde(default)]
    extra: serde_json::Value,
}

fn package_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\w-]+/[\w-]+$").expect("invalid regex"))
}

/// Check a `vendor/package` name against the accepted pattern.
pub fn is_valid_package_name(name: &str) -> bool {
    package_name_re().is_match(name)
}

fn version_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^v?(\d+)\.(\d+)").expect("invalid regex"))
}

impl PackageManifest {
    /// Parse and validate a raw manifest document.
    ///
    /// `repository_url` selects the docs-home exemption: for that one
    /// repository the `type` field may be absent or unrecognized.
    pub fn from_bytes(bytes: &[u8], repository_url: &str) -> Result<Self> {
        let raw: RawManifest =
            serde_json::from_slice(bytes).map_err(|e| DocbayError::ManifestInvalid {
                reason: format!("unparseable manifest document: {e}"),
            })?;

        let name = raw.name.ok_or_else(|| DocbayError::MissingValue {
            field: "name".to_string(),
        })?;
        if !package_name_re().is_match(&name) {
            return Err(DocbayError::ManifestNameInvalid { name });
        }

        let package_type = if repository_url == DOCS_HOME_REPOSITORY {
            raw.package_type.as_deref().and_then(PackageType::parse)
        } else {
            let raw_type = raw.package_type.ok_or_else(|| DocbayError::MissingValue {
                field: "type".to_string(),
            })?;
            let parsed = PackageType::parse(&raw_type)
                .ok_or(DocbayError::ManifestTypeInvalid { found: raw_type })?;
            Some(parsed)
        };

        let extension_key = raw
            .extra
            .get("typo3/cms")
            .and_then(|v| v.get("extension-key"))
            .and_then(|v| v.as_str())
            .map(str::to_string);

        if matches!(
            package_type,
            Some(PackageType::Extension) | Some(PackageType::CoreExtension)
        ) && extension_key.is_none()
        {
            return Err(DocbayError::MissingValue {
                field: "extra.typo3/cms.extension-key".to_string(),
            });
        }

        let (min_version, max_version) = parse_version_bounds(raw.require.get(CORE_DEPENDENCY))?;

        Ok(PackageManifest {
            name,
            package_type,
            extension_key,
            min_version,
            max_version,
        })
    }

    /// Vendor half of the `vendor/package` name.
    pub fn vendor(&self) -> &str {
        self.name.split_once('/').map(|(v, _)| v).unwrap_or(&self.name)
    }

    /// Package half of the `vendor/package` name.
    pub fn package(&self) -> &str {
        self.name.split_once('/').map(|(_, p)| p).unwrap_or(&self.name)
    }
}

/// Extract `major.minor` bounds from the core dependency constraint.
///
/// Each `||`-separated alternative contributes its `^`/`~`-stripped version;
/// the first alternative is the lower bound, the last the upper. Alternatives
/// that do not start with a version (e.g. `dev-main`) contribute nothing. The
/// constraint is inconsistent when nothing contributes or the bounds are out
/// of order.
fn parse_version_bounds(constraint: Option<&String>) -> Result<(Option<String>, Option<String>)> {
    let Some(constraint) = constraint else {
        return Ok((None, None));
    };

    let versions: Vec<(u32, u32)> = constraint
        .split("||")
        .filter_map(|alt| parse_alternative(alt.trim()))
        .collect();

    let (Some(first), Some(last)) = (versions.first(), versions.last()) else {
        return Err(DocbayError::DependencyConstraint {
            reason: format!("no usable version in constraint '{constraint}'"),
        });
    };

    if first > last {
        return Err(DocbayError::DependencyConstraint {
            reason: format!("version bounds out of order in constraint '{constraint}'"),
        });
    }

    Ok((
        Some(format!("{}.{}", first.0, first.1)),
        Some(format!("{}.{}", last.0, last.1)),
    ))
}

fn parse_alternative(alt: &str) -> Option<(u32, u32)> {
    let stripped = alt
        .strip_prefix('^')
        .or_else(|| alt.strip_prefix('~'))
        .unwrap_or(alt);
    let caps = version_prefix_re().captures(stripped)?;
    Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANY_REPO: &str = "https://github.com/acme/docs.git";

    fn manifest(json: &str) -> Result<PackageManifest> {
        PackageManifest::from_bytes(json.as_bytes(), ANY_REPO)
    }

    #[test]
    fn full_manifest_parses() {
        let parsed = manifest(
            r#"{
                "name": "acme/docs-demo",
                "type": "typo3-cms-extension",
                "require": { "typo3/cms-core": "^9.5 || ^10.4" },
                "extra": { "typo3/cms": { "extension-key": "docs_demo" } }
            }"#,
        )
        .unwrap();

        assert_eq!(parsed.name, "acme/docs-demo");
        assert_eq!(parsed.package_type, Some(PackageType::Extension));
        assert_eq!(parsed.extension_key.as_deref(), Some("docs_demo"));
        assert_eq!(parsed.min_version.as_deref(), Some("9.5"));
        assert_eq!(parsed.max_version.as_deref(), Some("10.4"));
        assert_eq!(parsed.vendor(), "acme");
        assert_eq!(parsed.package(), "docs-demo");
    }

    #[test]
    fn unparseable_document_is_invalid() {
        let err = manifest("{ not json").unwrap_err();
        assert!(matches!(err, DocbayError::ManifestInvalid { .. }));
    }

    #[test]
    fn missing_name_is_a_missing_value() {
        let err = manifest(r#"{ "type": "typo3-cms-documentation" }"#).unwrap_err();
        assert!(matches!(err, DocbayError::MissingValue { .. }));
    }

    #[test]
    fn name_must_split_exactly_once() {
        for bad in ["acme", "acme/docs/extra", "acme docs/pkg", "acme/do cs", "a.b/c"] {
            let err = manifest(&format!(
                r#"{{ "name": "{bad}", "type": "typo3-cms-documentation" }}"#
            ))
            .unwrap_err();
            assert!(
                matches!(err, DocbayError::ManifestNameInvalid { .. }),
                "name: {bad}"
            );
            assert_eq!(err.code(), 1553082490);
        }
    }

    #[test]
    fn unrecognized_type_is_rejected() {
        let err = manifest(r#"{ "name": "acme/docs", "type": "library" }"#).unwrap_err();
        assert!(matches!(err, DocbayError::ManifestTypeInvalid { .. }));
        assert_eq!(err.code(), 1557490474);
    }

    #[test]
    fn missing_type_is_a_missing_value() {
        let err = manifest(r#"{ "name": "acme/docs" }"#).unwrap_err();
        assert!(matches!(err, DocbayError::MissingValue { .. }));
    }

    #[test]
    fn docs_home_skips_type_validation() {
        let garbage = PackageManifest::from_bytes(
            r#"{ "name": "typo3/docs-homepage", "type": "whatever" }"#.as_bytes(),
            DOCS_HOME_REPOSITORY,
        )
        .unwrap();
        assert_eq!(garbage.package_type, None);

        let absent = PackageManifest::from_bytes(
            r#"{ "name": "typo3/docs-homepage" }"#.as_bytes(),
            DOCS_HOME_REPOSITORY,
        )
        .unwrap();
        assert_eq!(absent.package_type, None);
    }

    #[test]
    fn extension_types_require_the_extension_key() {
        for ty in ["typo3-cms-extension", "typo3-cms-framework"] {
            let err = manifest(&format!(r#"{{ "name": "acme/docs", "type": "{ty}" }}"#))
                .unwrap_err();
            assert!(matches!(err, DocbayError::MissingValue { .. }), "type: {ty}");
        }

        // Documentation packages carry no extension key
        let parsed =
            manifest(r#"{ "name": "acme/docs", "type": "typo3-cms-documentation" }"#).unwrap();
        assert_eq!(parsed.extension_key, None);
    }

    #[test]
    fn version_bounds_from_constraint_alternatives() {
        let parsed = manifest(
            r#"{
                "name": "acme/docs",
                "type": "typo3-cms-documentation",
                "require": { "typo3/cms-core": "~9.5.1" }
            }"#,
        )
        .unwrap();
        assert_eq!(parsed.min_version.as_deref(), Some("9.5"));
        assert_eq!(parsed.max_version.as_deref(), Some("9.5"));
    }

    #[test]
    fn absent_core_dependency_leaves_bounds_open() {
        let parsed = manifest(
            r#"{
                "name": "acme/docs",
                "type": "typo3-cms-documentation",
                "require": { "php": ">=7.2" }
            }"#,
        )
        .unwrap();
        assert_eq!(parsed.min_version, None);
        assert_eq!(parsed.max_version, None);
    }

    #[test]
    fn unusable_constraint_is_a_dependency_failure() {
        let err = manifest(
            r#"{
                "name": "acme/docs",
                "type": "typo3-cms-documentation",
                "require": { "typo3/cms-core": "dev-main" }
            }"#,
        )
        .unwrap_err();
        assert!(matches!(err, DocbayError::DependencyConstraint { .. }));
    }

    #[test]
    fn out_of_order_bounds_are_a_dependency_failure() {
        let err = manifest(
            r#"{
                "name": "acme/docs",
                "type": "typo3-cms-documentation",
                "require": { "typo3/cms-core": "^10.4 || ^9.5" }
            }"#,
        )
        .unwrap_err();
        assert!(matches!(err, DocbayError::DependencyConstraint { .. }));
    }

    #[test]
    fn mixed_constraint_skips_unversioned_alternatives() {
        let parsed = manifest(
            r#"{
                "name": "acme/docs",
                "type": "typo3-cms-documentation",
                "require": { "typo3/cms-core": "^9.5 || dev-main || ^11.5" }
            }"#,
        )
        .unwrap();
        assert_eq!(parsed.min_version.as_deref(), Some("9.5"));
        assert_eq!(parsed.max_version.as_deref(), Some("11.5"));
    }
}
