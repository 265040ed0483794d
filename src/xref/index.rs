//! Package index: one record per package file name, optionally labelled
//! with the module that owns it.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use super::modules::{ModuleResolver, ResolutionStats};
use super::traits::{IndexError, StageReport, Warning, XrefStage};
use crate::config::ArtifactClassifier;
use crate::model::{ChecksumAlgorithm, PackageRecord, RepoSnapshot};

/// The only checksum algorithm the index carries.
pub const EXPECTED_CHECKSUM: ChecksumAlgorithm = ChecksumAlgorithm::Sha256;

/// One package in the index document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub rpm: String,
    pub sha256: String,
    pub license: String,
    pub srpm: Option<String>,
    pub requires: Vec<String>,
    pub provides: Vec<String>,
    #[serde(rename = "file-provides")]
    pub file_provides: Vec<String>,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modularitylabel: Option<String>,
}

impl IndexEntry {
    fn from_record(record: &PackageRecord) -> Self {
        Self {
            rpm: record.file_name().to_string(),
            sha256: record.checksum.digest.clone(),
            license: record.license.clone(),
            srpm: record.source_rpm.clone(),
            requires: record.requires.clone(),
            provides: record.provides.clone(),
            file_provides: record.file_provides.clone(),
            url: record.download_url.clone(),
            modularitylabel: None,
        }
    }
}

/// File name -> package record.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageIndex {
    pub entries: BTreeMap<String, IndexEntry>,
}

impl PackageIndex {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, file_name: &str) -> Option<&IndexEntry> {
        self.entries.get(file_name)
    }
}

#[derive(Debug, Default, Clone)]
pub struct IndexReport {
    pub index: PackageIndex,
    pub warnings: Vec<Warning>,
    /// `None` when module resolution was disabled.
    pub modules: Option<ResolutionStats>,
}

impl StageReport for IndexReport {
    fn warnings(&self) -> &[Warning] {
        &self.warnings
    }
}

/// Builds the package index and, unless disabled, resolves module labels.
#[derive(Debug, Clone)]
pub struct IndexBuilder {
    classifier: ArtifactClassifier,
    resolve_modules: bool,
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self::new(ArtifactClassifier::default())
    }
}

impl IndexBuilder {
    pub fn new(classifier: ArtifactClassifier) -> Self {
        Self {
            classifier,
            resolve_modules: true,
        }
    }

    pub fn with_module_resolution(mut self, enabled: bool) -> Self {
        self.resolve_modules = enabled;
        self
    }

    /// Indexes `snapshot.packages` in order; the first package with a given
    /// file name wins.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError`] for a non-SHA-256 checksum, a duplicated
    /// artifact key, or any module resolution failure.
    #[instrument(skip_all, fields(packages = snapshot.packages.len(), modules = snapshot.modules.len()))]
    pub fn build(&self, snapshot: &RepoSnapshot) -> Result<IndexReport, IndexError> {
        let mut report = IndexReport::default();
        // Artifact key -> file name of the indexed package.
        let mut by_artifact: HashMap<String, String> = HashMap::new();

        for record in &snapshot.packages {
            let file_name = record.file_name();
            if report.index.entries.contains_key(file_name) {
                debug!(file_name, "Duplicate package");
                report.warnings.push(Warning::DuplicatePackage {
                    file_name: file_name.to_string(),
                    relative_path: record.relative_path.clone(),
                });
                continue;
            }

            if record.checksum.algorithm != EXPECTED_CHECKSUM {
                return Err(IndexError::UnexpectedChecksum {
                    package: record.relative_path.clone(),
                    expected: EXPECTED_CHECKSUM,
                    actual: record.checksum.algorithm.clone(),
                });
            }

            let key = record.artifact_key();
            if by_artifact.contains_key(&key) {
                return Err(IndexError::DuplicateArtifactKey(key));
            }
            by_artifact.insert(key, file_name.to_string());

            report
                .index
                .entries
                .insert(file_name.to_string(), IndexEntry::from_record(record));
        }

        if self.resolve_modules {
            let resolver = ModuleResolver::new(&self.classifier);
            let stats = resolver.resolve(
                &mut report.index,
                &by_artifact,
                &snapshot.modules,
                &snapshot.filtered_artifacts,
            )?;
            resolver.check_labels(&report.index)?;
            report.modules = Some(stats);
        }

        info!(
            indexed = report.index.len(),
            duplicates = report.warnings.len(),
            labelled = report.modules.as_ref().map(|s| s.labelled).unwrap_or(0),
            "Index built"
        );
        Ok(report)
    }
}

impl XrefStage for IndexBuilder {
    type Input = RepoSnapshot;
    type Output = IndexReport;
    type Error = IndexError;

    fn execute(&self, input: Self::Input) -> Result<Self::Output, Self::Error> {
        self.build(&input)
    }

    fn stage_name(&self) -> &'static str {
        "package_index"
    }
}
