//! Source RPM to binary RPM pairing.
//!
//! Binary packages are attributed to the source package named by their
//! `sourcerpm` header, looked up only in the binary package's own directory.
//! Build results that keep each SRPM next to its RPMs pair up completely;
//! anything else is reported.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::convert::Infallible;

use tracing::{debug, info, instrument};

use super::traits::{StageReport, Warning, XrefStage};
use crate::model::{dirname, join_path, normalize_path, PackageRecord, RepoSnapshot};

/// Normalized source package path -> binary package paths built from it.
pub type PairingMap = BTreeMap<String, BTreeSet<String>>;

#[derive(Debug, Default, Clone)]
pub struct PairingReport {
    pub pairs: PairingMap,
    pub warnings: Vec<Warning>,
    /// Source packages seen, paired or not.
    pub source_count: usize,
}

impl StageReport for PairingReport {
    fn warnings(&self) -> &[Warning] {
        &self.warnings
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PairingEngine;

impl PairingEngine {
    pub fn new() -> Self {
        Self
    }

    #[instrument(skip_all, fields(packages = packages.len()))]
    pub fn pair(&self, packages: &[PackageRecord]) -> PairingReport {
        let sources: HashSet<String> = packages
            .iter()
            .filter(|p| p.is_source())
            .map(|p| normalize_path(&p.relative_path))
            .collect();

        let mut report = PairingReport {
            source_count: sources.len(),
            ..Default::default()
        };

        for package in packages.iter().filter(|p| !p.is_source()) {
            let srpm = match package.source_rpm.as_deref() {
                Some(srpm) if !srpm.is_empty() => srpm,
                _ => {
                    debug!(package = %package.relative_path, "No source RPM reference");
                    report.warnings.push(Warning::MissingSourceReference {
                        package: package.relative_path.clone(),
                    });
                    continue;
                }
            };

            let directory = dirname_of(&package.relative_path);
            let expected = join_path(&directory, srpm);

            // A reference with a separator points out of the directory.
            if srpm.contains('/') || !sources.contains(&expected) {
                debug!(package = %package.relative_path, %expected, "Source RPM not in directory");
                report.warnings.push(Warning::SourceNotInDirectory {
                    package: package.relative_path.clone(),
                    expected,
                });
                continue;
            }

            report
                .pairs
                .entry(expected)
                .or_default()
                .insert(package.relative_path.clone());
        }

        info!(
            sources = report.source_count,
            paired = report.pairs.len(),
            unattributed = report.warnings.len(),
            "Pairing completed"
        );
        report
    }
}

fn dirname_of(relative_path: &str) -> String {
    dirname(&normalize_path(relative_path)).to_string()
}

impl XrefStage for PairingEngine {
    type Input = RepoSnapshot;
    type Output = PairingReport;
    type Error = Infallible;

    fn execute(&self, input: Self::Input) -> Result<Self::Output, Self::Error> {
        Ok(self.pair(&input.packages))
    }

    fn stage_name(&self) -> &'static str {
        "srpm_pairing"
    }
}
