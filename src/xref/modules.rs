//! Module label resolution.
//!
//! Every artifact a module lists is looked up by its
//! `name-epoch:version-release.arch` key. Source and debug artifacts are
//! not expected in the binary index and may be missing; any other miss means
//! module metadata and package metadata disagree.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;
use tracing::{debug, info};

use super::index::PackageIndex;
use super::traits::IndexError;
use crate::config::ArtifactClassifier;
use crate::model::ModuleInfo;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolutionStats {
    pub modules: usize,
    /// Packages that received a module label.
    pub labelled: usize,
    /// Missing artifacts skipped as source, debug, or filtered packages.
    pub tolerated: usize,
}

pub struct ModuleResolver<'a> {
    classifier: &'a ArtifactClassifier,
}

impl<'a> ModuleResolver<'a> {
    pub fn new(classifier: &'a ArtifactClassifier) -> Self {
        Self { classifier }
    }

    /// Labels every indexed package that some module lists.
    pub fn resolve(
        &self,
        index: &mut PackageIndex,
        by_artifact: &HashMap<String, String>,
        modules: &[ModuleInfo],
        filtered: &BTreeSet<String>,
    ) -> Result<ResolutionStats, IndexError> {
        let mut stats = ResolutionStats {
            modules: modules.len(),
            ..Default::default()
        };

        for module in modules {
            for artifact in &module.artifacts {
                let entry = match by_artifact
                    .get(artifact)
                    .and_then(|file_name| index.entries.get_mut(file_name))
                {
                    Some(entry) => entry,
                    None if self.classifier.is_tolerated_miss(artifact)
                        || filtered.contains(artifact) =>
                    {
                        debug!(%artifact, module = %module.full_identifier, "Skipping absent artifact");
                        stats.tolerated += 1;
                        continue;
                    }
                    None => {
                        return Err(IndexError::UnresolvedArtifact {
                            module: module.full_identifier.clone(),
                            artifact: artifact.clone(),
                        })
                    }
                };

                if let Some(existing) = &entry.modularitylabel {
                    return Err(IndexError::ModuleConflict {
                        artifact: artifact.clone(),
                        existing: existing.clone(),
                        module: module.full_identifier.clone(),
                    });
                }
                entry.modularitylabel = Some(module.full_identifier.clone());
                stats.labelled += 1;
            }
        }

        info!(
            modules = stats.modules,
            labelled = stats.labelled,
            tolerated = stats.tolerated,
            "Module labels resolved"
        );
        Ok(stats)
    }

    /// Every package named like a module build must carry a label.
    pub fn check_labels(&self, index: &PackageIndex) -> Result<(), IndexError> {
        match index.entries.iter().find(|(file_name, entry)| {
            self.classifier.looks_modular(file_name) && entry.modularitylabel.is_none()
        }) {
            Some((file_name, _)) => Err(IndexError::MissingModuleLabel(file_name.clone())),
            None => Ok(()),
        }
    }
}
