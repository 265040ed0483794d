//! Run configuration.
//!
//! Every field has a default, so an empty file (or no file at all) yields the
//! conventions of Fedora/CentOS style repositories.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse TOML config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Failed to parse JSON config: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct XrefConfig {
    pub classifier: ArtifactClassifier,
    pub loader: LoaderConfig,
}

impl XrefConfig {
    /// Loads a config file; `.toml` files are parsed as TOML, anything else
    /// as JSON.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            Ok(toml::from_str(&content)?)
        } else {
            Ok(serde_json::from_str(&content)?)
        }
    }
}

/// Naming conventions used to classify module artifacts and packages.
///
/// These are repository conventions rather than structural facts, which is
/// why they live in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactClassifier {
    /// Artifact key suffixes naming source packages.
    pub source_suffixes: Vec<String>,
    /// Substrings naming debug packages.
    pub debug_markers: Vec<String>,
    /// Substring in the file name of a package built inside a module.
    pub module_marker: String,
}

impl Default for ArtifactClassifier {
    fn default() -> Self {
        Self {
            source_suffixes: vec![".src".to_string()],
            debug_markers: vec!["debuginfo".to_string(), "debugsource".to_string()],
            module_marker: ".module_".to_string(),
        }
    }
}

impl ArtifactClassifier {
    pub fn is_source_artifact(&self, artifact: &str) -> bool {
        self.source_suffixes.iter().any(|s| artifact.ends_with(s.as_str()))
    }

    pub fn is_debug_artifact(&self, artifact: &str) -> bool {
        self.debug_markers.iter().any(|m| artifact.contains(m.as_str()))
    }

    /// Artifacts expected to be absent from the binary index.
    pub fn is_tolerated_miss(&self, artifact: &str) -> bool {
        self.is_source_artifact(artifact) || self.is_debug_artifact(artifact)
    }

    pub fn looks_modular(&self, file_name: &str) -> bool {
        !self.module_marker.is_empty() && file_name.contains(self.module_marker.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Repositories loaded at the same time.
    pub concurrency: usize,
    /// Upper bound on loading all repositories, in seconds.
    pub timeout_secs: u64,
    pub module_hotfixes: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            timeout_secs: 300,
            module_hotfixes: true,
        }
    }
}
