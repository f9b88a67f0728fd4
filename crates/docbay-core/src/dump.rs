//! Deployment information dump files.
//!
//! The render pipeline picks its input up from disk. The filename embeds a
//! digest of the serialized content, so re-triggering the same build rewrites
//! one file instead of piling up copies.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::domain::DeploymentInformation;
use crate::error::Result;

impl DeploymentInformation {
    /// Serialize to pretty JSON and write below `root`.
    ///
    /// The file lands at
    /// `<root>/<private_dir>/<sub_dir>/deployment-<digest>.json` where
    /// `<digest>` is the first 12 hex chars of the SHA-256 of the serialized
    /// content. Parent directories are created as needed.
    pub fn dump_to(&self, root: &Path) -> Result<PathBuf> {
        let body = serde_json::to_vec_pretty(self)?;

        let mut hasher = Sha256::new();
        hasher.update(&body);
        let digest = hex::encode(hasher.finalize());

        let dir = root.join(&self.private_dir).join(&self.sub_dir);
        fs::create_dir_all(&dir)?;

        let path = dir.join(format!("deployment-{}.json", &digest[..12]));
        fs::write(&path, body)?;
        debug!(path = %path.display(), "wrote deployment information file");
        Ok(path)
    }
}
