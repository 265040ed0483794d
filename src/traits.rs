use crate::model::{RepoSnapshot, RepoSpec};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Unsupported repository location: {0}")]
    UnsupportedLocation(String),
    #[error("Missing repository metadata: {0}")]
    MissingMetadata(String),
    #[error("Unsupported compression for {0}")]
    UnsupportedCompression(String),
    #[error("Failed to parse {document}: {reason}")]
    InvalidContent { document: String, reason: String },
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl LoadError {
    pub(crate) fn invalid(document: &str, reason: impl Into<String>) -> Self {
        Self::InvalidContent {
            document: document.to_string(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Returns the identifier of this provider (e.g., "repodata").
    fn provider_id(&self) -> &str;

    /// Loads every package record and module of one repository.
    async fn load(&self, repo: &RepoSpec) -> Result<RepoSnapshot, LoadError>;
}
