//! Gerrit change reference parsing.
//!
//! Review events arrive with the change in one of several textual forms;
//! all of them carry the numeric change id the pre-merge build plan needs.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{DocbayError, Result};

/// A Gerrit change ready to hand to the pre-merge build plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GerritChange {
    pub change_id: u64,
    pub patch_set: u32,
}

fn c_segment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#/c/(\d+)").expect("invalid regex"))
}

fn trailing_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/(\d+)/?$").expect("invalid regex"))
}

impl GerritChange {
    /// Extract the change id from any of the accepted forms.
    ///
    /// Accepted: bare numeric (`58611`), review URL ending in the id
    /// (`https://review.typo3.org/48574/`), `#/c/<id>/` and
    /// `#/c/<id>/<patchset>`. Only pushes to `target_branch` with a non-zero
    /// patch set are buildable; everything else is `DoNotCare`.
    pub fn parse(change: &str, patch_set: u32, branch: &str, target_branch: &str) -> Result<Self> {
        if branch != target_branch {
            return Err(DocbayError::DoNotCare {
                reason: format!("branch '{branch}' is not the build target '{target_branch}'"),
            });
        }
        if patch_set == 0 {
            return Err(DocbayError::DoNotCare {
                reason: format!("change '{change}' has no patch set to build"),
            });
        }

        let change_id = Self::extract_change_id(change).ok_or_else(|| DocbayError::DoNotCare {
            reason: format!("no change id found in '{change}'"),
        })?;

        Ok(GerritChange {
            change_id,
            patch_set,
        })
    }

    fn extract_change_id(change: &str) -> Option<u64> {
        // The `#/c/<id>/<patchset>` form must win over the trailing-segment
        // match, which would otherwise pick up the patch set number.
        if let Some(caps) = c_segment_re().captures(change) {
            return caps[1].parse().ok();
        }
        if !change.is_empty() && change.bytes().all(|b| b.is_ascii_digit()) {
            return change.parse().ok();
        }
        trailing_id_re()
            .captures(change)
            .and_then(|caps| caps[1].parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_accepted_forms_yield_the_same_change() {
        let forms = [
            "58611",
            "https://review.typo3.org/58611/",
            "#/c/58611/",
            "#/c/58611/11",
        ];
        for form in forms {
            let change = GerritChange::parse(form, 11, "master", "master").unwrap();
            assert_eq!(
                change,
                GerritChange {
                    change_id: 58611,
                    patch_set: 11
                },
                "form: {form}"
            );
        }
    }

    #[test]
    fn review_url_with_different_id() {
        let change = GerritChange::parse("https://review.typo3.org/48574/", 3, "master", "master")
            .unwrap();
        assert_eq!(change.change_id, 48574);
        assert_eq!(change.patch_set, 3);
    }

    #[test]
    fn zero_patch_set_is_not_buildable() {
        let err = GerritChange::parse("58611", 0, "master", "master").unwrap_err();
        assert!(err.is_do_not_care());
    }

    #[test]
    fn non_target_branch_is_not_buildable() {
        let err = GerritChange::parse("58611", 11, "9.5", "master").unwrap_err();
        assert!(err.is_do_not_care());
    }

    #[test]
    fn unparseable_change_is_not_buildable() {
        for change in ["", "https://review.typo3.org/", "not-a-change", "#/c/x/"] {
            let err = GerritChange::parse(change, 1, "master", "master").unwrap_err();
            assert!(err.is_do_not_care(), "change: {change}");
        }
    }
}
