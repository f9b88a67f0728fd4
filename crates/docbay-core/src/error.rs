//! Domain-level error taxonomy for docbay.
//!
//! A single tagged error type covers the whole pipeline. Every variant
//! carries a stable numeric code via [`DocbayError::code`]; callers match
//! on kind, never on message text.

use crate::collaborators::CollaboratorError;
use docbay_state::StorageError;

/// Docbay domain errors.
#[derive(Debug, thiserror::Error)]
pub enum DocbayError {
    /// The ref or change is not documentation-worthy. Expected and
    /// recoverable; batch loops skip it, single-item callers surface it.
    #[error("nothing to do: {reason}")]
    DoNotCare { reason: String },

    #[error("manifest not found at {url}")]
    ManifestNotFound { url: String },

    #[error("invalid manifest: {reason}")]
    ManifestInvalid { reason: String },

    #[error("manifest 'name' must be of form 'vendor/package', '{name}' given")]
    ManifestNameInvalid { name: String },

    #[error("manifest 'type' must be set to one of typo3-cms-documentation, typo3-cms-framework, typo3-cms-extension, '{found}' given")]
    ManifestTypeInvalid { found: String },

    #[error("manifest missing required value: {field}")]
    MissingValue { field: String },

    #[error("unusable core version constraint: {reason}")]
    DependencyConstraint { reason: String },

    #[error("package {package_name} is already registered with a different repository url")]
    PackageConflict { package_name: String },

    #[error("invalid redirect status code: {status_code}")]
    RedirectStatus { status_code: u16 },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("collaborator error: {0}")]
    Collaborator(#[from] CollaboratorError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DocbayError {
    /// Stable numeric code identifying the failure; log consumers key on it.
    pub fn code(&self) -> u32 {
        match self {
            DocbayError::DoNotCare { .. } => 1557490544,
            DocbayError::ManifestNotFound { .. } => 1553081064,
            DocbayError::ManifestInvalid { .. } => 1553082363,
            DocbayError::ManifestNameInvalid { .. } => 1553082490,
            DocbayError::ManifestTypeInvalid { .. } => 1557490474,
            DocbayError::MissingValue { .. } => 1557490221,
            DocbayError::DependencyConstraint { .. } => 1557490307,
            DocbayError::PackageConflict { .. } => 1558697388,
            DocbayError::RedirectStatus { .. } => 1553001673,
            DocbayError::Storage(_) => 1570305257,
            DocbayError::Collaborator(_) => 1570305258,
            DocbayError::Serialization(_) => 1570305259,
            DocbayError::Io(_) => 1570305260,
        }
    }

    /// True for the expected short-circuit on irrelevant input.
    pub fn is_do_not_care(&self) -> bool {
        matches!(self, DocbayError::DoNotCare { .. })
    }
}

impl From<StorageError> for DocbayError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidStatusCode { status_code } => {
                DocbayError::RedirectStatus { status_code }
            }
            other => DocbayError::Storage(other.to_string()),
        }
    }
}

/// Result type for docbay domain operations.
pub type Result<T> = std::result::Result<T, DocbayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_carries_context() {
        let err = DocbayError::ManifestNameInvalid {
            name: "not-a-package".to_string(),
        };
        assert!(err.to_string().contains("vendor/package"));
        assert!(err.to_string().contains("not-a-package"));

        let err = DocbayError::PackageConflict {
            package_name: "acme/docs".to_string(),
        };
        assert!(err.to_string().contains("acme/docs"));
        assert!(err.to_string().contains("different repository"));
    }

    #[test]
    fn codes_are_stable() {
        let cases: Vec<(DocbayError, u32)> = vec![
            (
                DocbayError::DoNotCare {
                    reason: "x".to_string(),
                },
                1557490544,
            ),
            (
                DocbayError::ManifestNameInvalid {
                    name: "x".to_string(),
                },
                1553082490,
            ),
            (
                DocbayError::ManifestTypeInvalid {
                    found: "x".to_string(),
                },
                1557490474,
            ),
            (
                DocbayError::PackageConflict {
                    package_name: "x".to_string(),
                },
                1558697388,
            ),
            (DocbayError::RedirectStatus { status_code: 200 }, 1553001673),
        ];
        for (err, code) in cases {
            assert_eq!(err.code(), code);
        }
    }

    #[test]
    fn do_not_care_is_distinguished() {
        let skip = DocbayError::DoNotCare {
            reason: "branch 1-0".to_string(),
        };
        assert!(skip.is_do_not_care());

        let hard = DocbayError::ManifestInvalid {
            reason: "bad json".to_string(),
        };
        assert!(!hard.is_do_not_care());
    }

    #[test]
    fn storage_errors_map_into_the_taxonomy() {
        let err: DocbayError = StorageError::InvalidStatusCode { status_code: 404 }.into();
        assert!(matches!(
            err,
            DocbayError::RedirectStatus { status_code: 404 }
        ));
        assert_eq!(err.code(), 1553001673);

        let err: DocbayError = StorageError::Backend("connection reset".to_string()).into();
        assert!(matches!(err, DocbayError::Storage(_)));
        assert!(err.to_string().contains("connection reset"));
    }
}
