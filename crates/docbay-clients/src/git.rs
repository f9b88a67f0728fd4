//! Remote branch discovery via git.
//!
//! Batch re-scans walk the full ref listing of a repository instead of
//! waiting for push events. `git ls-remote` keeps this free of local
//! clones.

use std::collections::BTreeSet;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use docbay_core::{BranchLister, CollaboratorError, CollaboratorResult, RefSource, VersionRef};
use tokio::process::Command;
use tracing::debug;

const LS_REMOTE_TIMEOUT: Duration = Duration::from_secs(60);

/// Lists documentation-worthy refs of a remote repository.
pub struct GitBranchLister {
    timeout: Duration,
}

impl GitBranchLister {
    pub fn new() -> Self {
        GitBranchLister {
            timeout: LS_REMOTE_TIMEOUT,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        GitBranchLister { timeout }
    }
}

impl Default for GitBranchLister {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BranchLister for GitBranchLister {
    async fn list_branches(
        &self,
        repository_url: &str,
    ) -> CollaboratorResult<Vec<(String, String)>> {
        debug!(repository = %repository_url, "listing remote refs");

        let child = Command::new("git")
            .args(["ls-remote", "--heads", "--tags", repository_url])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| CollaboratorError::Network(format!("failed to spawn git: {e}")))?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                CollaboratorError::Network(format!(
                    "git ls-remote timed out after {} seconds",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| CollaboratorError::Network(format!("git ls-remote failed: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CollaboratorError::Network(format!(
                "git ls-remote failed: {}",
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(documentation_refs(&stdout))
    }
}

/// Extract documentation-worthy refs from `git ls-remote` output.
///
/// Each line is `<sha>\t<refname>`. Branch heads and release tags run
/// through the version parser; everything it rejects is dropped, as are
/// tag peel lines (`^{}`). Per target directory the first ref wins, so a
/// version branch shadows the release tags that deploy to the same
/// directory (git sorts heads before tags).
pub(crate) fn documentation_refs(output: &str) -> Vec<(String, String)> {
    let mut seen = BTreeSet::new();
    let mut refs = Vec::new();

    for line in output.lines() {
        let Some((_, refname)) = line.split_once('\t') else {
            continue;
        };

        let parsed = if let Some(branch) = refname.strip_prefix("refs/heads/") {
            VersionRef::parse(branch, RefSource::BranchPush)
        } else if let Some(tag) = refname.strip_prefix("refs/tags/") {
            if tag.ends_with("^{}") {
                continue;
            }
            VersionRef::parse(tag, RefSource::TagPush)
        } else {
            continue;
        };

        let Ok(version_ref) = parsed else { continue };
        if seen.insert(version_ref.target_directory().to_string()) {
            refs.push((
                version_ref.raw.clone(),
                version_ref.target_directory().to_string(),
            ));
        }
    }

    refs
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "\
fa1afe1fa1afe1fa1afe1fa1afe1fa1afe1fa1afe\trefs/heads/9.5\n\
0123456789abcdef0123456789abcdef01234567\trefs/heads/feature/docs-rework\n\
89abcdef0123456789abcdef0123456789abcdef\trefs/heads/main\n\
aaaabbbbccccddddeeeeffff0000111122223333\trefs/tags/v10.4.1\n\
aaaabbbbccccddddeeeeffff0000111122224444\trefs/tags/v10.4.1^{}\n\
aaaabbbbccccddddeeeeffff0000111122225555\trefs/tags/v9.5.3\n";

    #[test]
    fn branches_and_release_tags_are_listed_with_target_directories() {
        let refs = documentation_refs(LISTING);
        assert_eq!(
            refs,
            vec![
                ("9.5".to_string(), "9.5".to_string()),
                ("main".to_string(), "main".to_string()),
                ("v10.4.1".to_string(), "10.4".to_string()),
            ]
        );
    }

    #[test]
    fn first_ref_per_target_directory_wins() {
        // The 9.5 branch head comes first, so the 9.5.3 tag is shadowed.
        let refs = documentation_refs(LISTING);
        assert_eq!(refs.iter().filter(|(_, dir)| dir == "9.5").count(), 1);
        assert_eq!(refs[0].0, "9.5");
    }

    #[test]
    fn peel_lines_and_feature_branches_are_dropped() {
        let refs = documentation_refs(LISTING);
        assert!(refs.iter().all(|(raw, _)| !raw.contains("feature")));
        assert!(refs.iter().all(|(raw, _)| !raw.ends_with("^{}")));
    }

    #[test]
    fn patch_level_branches_are_not_documentation_worthy() {
        let refs =
            documentation_refs("feedfacefeedfacefeedfacefeedfacefeedface\trefs/heads/9.5.1\n");
        assert!(refs.is_empty());
    }

    #[test]
    fn empty_and_malformed_output_yield_no_refs() {
        assert!(documentation_refs("").is_empty());
        assert!(documentation_refs("not a ls-remote line\n").is_empty());
    }

    #[test]
    fn latest_branch_maps_onto_the_main_directory() {
        let refs =
            documentation_refs("cafebabecafebabecafebabecafebabecafebabe\trefs/heads/master\n");
        assert_eq!(refs, vec![("master".to_string(), "main".to_string())]);
    }
}
