//! Branch and tag reference parsing.
//!
//! Every incoming push event carries a raw ref string. Parsing happens once
//! per event and yields an immutable [`VersionRef`]; refs that are not
//! documentation-worthy come back as the recoverable `DoNotCare` outcome.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{DocbayError, Result};

/// Which event produced the raw ref string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefSource {
    BranchPush,
    TagPush,
}

/// Classification of a documentation-worthy ref.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    /// Version branch such as `9.5`, `v9.5` or `9.5.x`.
    StableBranch,
    /// The repository's moving default: `master`, `main` or `latest`.
    LatestBranch,
    /// Release tag such as `v9.5.1`; the patch level collapses into the
    /// minor directory.
    ReleaseTag,
}

/// Parsed version reference, derived once per event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRef {
    pub kind: RefKind,
    /// The ref string exactly as pushed.
    pub raw: String,
    /// Normalized directory form: `main` or `<major>.<minor>`.
    pub normalized: String,
}

fn stable_branch_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^v?(\d+)\.(\d+)(?:\.x)?$").expect("invalid regex"))
}

fn release_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^v?(\d+)\.(\d+)\.(\d+)$").expect("invalid regex"))
}

impl VersionRef {
    /// Parse a raw ref string from the given source.
    ///
    /// Branch pushes accept `master`/`main`/`latest` plus version branches
    /// (`9.5`, `v9.5`, `9.5.x`); tag pushes accept full release tags
    /// (`v9.5.1`). Everything else is the expected `DoNotCare` short-circuit.
    pub fn parse(raw: &str, source: RefSource) -> Result<Self> {
        match source {
            RefSource::BranchPush => {
                if matches!(raw, "master" | "main" | "latest") {
                    return Ok(VersionRef {
                        kind: RefKind::LatestBranch,
                        raw: raw.to_string(),
                        normalized: "main".to_string(),
                    });
                }
                if let Some(caps) = stable_branch_re().captures(raw) {
                    return Ok(VersionRef {
                        kind: RefKind::StableBranch,
                        raw: raw.to_string(),
                        normalized: format!("{}.{}", &caps[1], &caps[2]),
                    });
                }
            }
            RefSource::TagPush => {
                if let Some(caps) = release_tag_re().captures(raw) {
                    return Ok(VersionRef {
                        kind: RefKind::ReleaseTag,
                        raw: raw.to_string(),
                        normalized: format!("{}.{}", &caps[1], &caps[2]),
                    });
                }
            }
        }

        Err(DocbayError::DoNotCare {
            reason: format!("ref '{raw}' does not map to a documentation branch"),
        })
    }

    /// Parse a stored ref name whose push source is no longer known.
    ///
    /// Registry rows keep the raw ref but not the event that delivered it;
    /// the branch interpretation wins, the tag interpretation is the
    /// fallback.
    pub fn parse_any(raw: &str) -> Result<Self> {
        Self::parse(raw, RefSource::BranchPush).or_else(|_| Self::parse(raw, RefSource::TagPush))
    }

    /// Directory the rendered documentation deploys into.
    pub fn target_directory(&self) -> &str {
        &self.normalized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_branch_names_normalize_to_main() {
        for raw in ["master", "main", "latest"] {
            let parsed = VersionRef::parse(raw, RefSource::BranchPush).unwrap();
            assert_eq!(parsed.kind, RefKind::LatestBranch);
            assert_eq!(parsed.normalized, "main");
            assert_eq!(parsed.raw, raw);
        }
    }

    #[test]
    fn stable_branches_collapse_to_major_minor() {
        for raw in ["9.5", "v9.5", "9.5.x", "v9.5.x"] {
            let parsed = VersionRef::parse(raw, RefSource::BranchPush).unwrap();
            assert_eq!(parsed.kind, RefKind::StableBranch, "raw: {raw}");
            assert_eq!(parsed.normalized, "9.5");
        }
    }

    #[test]
    fn release_tags_collapse_patch_level() {
        for raw in ["9.5.1", "v9.5.1", "10.4.22"] {
            let parsed = VersionRef::parse(raw, RefSource::TagPush).unwrap();
            assert_eq!(parsed.kind, RefKind::ReleaseTag, "raw: {raw}");
        }
        let parsed = VersionRef::parse("10.4.22", RefSource::TagPush).unwrap();
        assert_eq!(parsed.normalized, "10.4");
    }

    #[test]
    fn patch_branch_is_not_documentation_worthy() {
        let err = VersionRef::parse("9.5.1", RefSource::BranchPush).unwrap_err();
        assert!(err.is_do_not_care());
    }

    #[test]
    fn partial_tag_is_not_documentation_worthy() {
        let err = VersionRef::parse("9.5", RefSource::TagPush).unwrap_err();
        assert!(err.is_do_not_care());

        let err = VersionRef::parse("latest", RefSource::TagPush).unwrap_err();
        assert!(err.is_do_not_care());
    }

    #[test]
    fn arbitrary_refs_are_not_documentation_worthy() {
        for raw in ["foo", "feature/docs-rework", "9", "v9", "9.5.x.y", ""] {
            let err = VersionRef::parse(raw, RefSource::BranchPush).unwrap_err();
            assert!(err.is_do_not_care(), "raw: {raw}");
        }
    }

    #[test]
    fn target_directory_matches_normalized_form() {
        let latest = VersionRef::parse("master", RefSource::BranchPush).unwrap();
        assert_eq!(latest.target_directory(), "main");

        let stable = VersionRef::parse("v10.4", RefSource::BranchPush).unwrap();
        assert_eq!(stable.target_directory(), "10.4");
    }

    #[test]
    fn parse_any_falls_back_to_the_tag_interpretation() {
        let branch = VersionRef::parse_any("main").unwrap();
        assert_eq!(branch.kind, RefKind::LatestBranch);

        let tag = VersionRef::parse_any("v9.5.1").unwrap();
        assert_eq!(tag.kind, RefKind::ReleaseTag);
        assert_eq!(tag.target_directory(), "9.5");

        assert!(VersionRef::parse_any("feature/docs").unwrap_err().is_do_not_care());
    }
}
