//! Core traits and types for the cross-reference stages.
//!
//! Two severities are kept apart:
//! - [`Warning`]: a per-package problem; the package is skipped and the run
//!   continues
//! - [`IndexError`]: a repository-wide invariant broke; the run aborts

use thiserror::Error;

use crate::model::ChecksumAlgorithm;

// ============================================================================
// Stage Trait
// ============================================================================

/// A stage that derives one artifact from loaded repository metadata.
///
/// Stages are pure: they see the whole package set at once and run to
/// completion without suspension points.
///
/// # Examples
///
/// ```ignore
/// struct CountStage;
///
/// impl XrefStage for CountStage {
///     type Input = RepoSnapshot;
///     type Output = PackageCount;
///     type Error = std::convert::Infallible;
///
///     fn execute(&self, input: Self::Input) -> Result<Self::Output, Self::Error> {
///         Ok(PackageCount(input.packages.len()))
///     }
///
///     fn stage_name(&self) -> &'static str {
///         "count"
///     }
/// }
/// ```
pub trait XrefStage: Send + Sync {
    /// Input type consumed by this stage
    type Input;

    /// Output type produced by this stage
    type Output: StageReport;

    /// Error type for fatal stage failures
    type Error: std::error::Error + Send + Sync + 'static;

    /// Runs the stage over the complete input.
    ///
    /// # Errors
    ///
    /// Returns `Err` only for conditions that invalidate the whole output.
    /// Per-package problems are reported through [`StageReport::warnings`].
    fn execute(&self, input: Self::Input) -> Result<Self::Output, Self::Error>;

    /// Returns a human-readable name for this stage, used in logs.
    fn stage_name(&self) -> &'static str;
}

/// Recoverable conditions collected while a stage ran.
pub trait StageReport {
    fn warnings(&self) -> &[Warning] {
        &[]
    }
}

// ============================================================================
// Warnings
// ============================================================================

/// A package that was skipped; the rest of the run is unaffected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// Binary package without a source-package reference
    #[error("{package} has no source RPM reference")]
    MissingSourceReference { package: String },

    /// The referenced source package is not next to the binary package
    #[error("{package} has no source RPM in the directory (expected {expected})")]
    SourceNotInDirectory { package: String, expected: String },

    /// A later package with an already indexed file name
    #[error("package {file_name} is duplicated ({relative_path} ignored)")]
    DuplicatePackage {
        file_name: String,
        relative_path: String,
    },
}

// ============================================================================
// Errors
// ============================================================================

/// Repository-wide inconsistencies that make the index unusable.
#[derive(Error, Debug)]
pub enum IndexError {
    /// Every checksum in the index must use the same algorithm
    #[error("Unexpected checksum algorithm for {package}: expected {expected}, got {actual}")]
    UnexpectedChecksum {
        package: String,
        expected: ChecksumAlgorithm,
        actual: ChecksumAlgorithm,
    },

    /// Two packages share one `name-epoch:version-release.arch`
    #[error("Duplicate module artifact key: {0}")]
    DuplicateArtifactKey(String),

    /// A package listed by two modules
    #[error("Package {artifact} claimed by module {module} but already labelled {existing}")]
    ModuleConflict {
        artifact: String,
        existing: String,
        module: String,
    },

    /// A module artifact with no matching package
    #[error("Module {module} lists artifact {artifact} which is missing from package metadata")]
    UnresolvedArtifact { module: String, artifact: String },

    /// A package named like a module build that no module claims
    #[error("Modular package {0} has no module label")]
    MissingModuleLabel(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_messages() {
        let warning = Warning::SourceNotInDirectory {
            package: "b/pkg-1.0.x86_64.rpm".to_string(),
            expected: "b/pkg-1.0.src.rpm".to_string(),
        };
        assert_eq!(
            warning.to_string(),
            "b/pkg-1.0.x86_64.rpm has no source RPM in the directory (expected b/pkg-1.0.src.rpm)"
        );
    }

    #[test]
    fn test_checksum_error_message() {
        let err = IndexError::UnexpectedChecksum {
            package: "foo.rpm".to_string(),
            expected: ChecksumAlgorithm::Sha256,
            actual: ChecksumAlgorithm::Sha1,
        };
        assert_eq!(
            err.to_string(),
            "Unexpected checksum algorithm for foo.rpm: expected sha256, got sha1"
        );
    }
}
