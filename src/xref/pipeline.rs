//! Cross-reference pipeline executor.
//!
//! [`XrefPipeline`] loads every repository (concurrently, under one
//! timeout), drops records of the installed-system pseudo-repository, then
//! runs a single [`XrefStage`] over the merged snapshot. Timings and counts
//! are returned in [`PipelineStats`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::timeout;
use tracing::{info, warn};

use super::traits::{StageReport, XrefStage};
use crate::config::LoaderConfig;
use crate::executor::LoadExecutor;
use crate::model::{RepoSnapshot, RepoSpec, SYSTEM_REPO_ID};
use crate::traits::{LoadError, MetadataProvider};

// ============================================================================
// Pipeline Types
// ============================================================================

/// Stage output together with run statistics.
#[derive(Debug)]
pub struct XrefResult<T> {
    pub output: T,
    pub stats: PipelineStats,
}

#[derive(Debug, Default, Clone)]
pub struct PipelineStats {
    /// Total time for load and stage (milliseconds)
    pub total_duration_ms: u64,

    /// Time spent loading metadata (milliseconds)
    pub load_duration_ms: u64,

    /// Time spent in the stage (milliseconds)
    pub stage_duration_ms: u64,

    pub repositories: usize,

    /// Packages handed to the stage
    pub packages_loaded: usize,

    /// Packages dropped because they describe the installed system
    pub packages_excluded: usize,

    pub warnings: usize,
}

// ============================================================================
// Pipeline Errors
// ============================================================================

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("At least one repository is required")]
    NoRepositories,

    #[error("Loading timed out after {timeout_secs}s")]
    LoadTimeout { timeout_secs: u64 },

    #[error("Loading failed: {0}")]
    LoadFailed(#[from] LoadError),

    #[error("Stage '{stage}' failed: {source}")]
    StageFailed {
        stage: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

// ============================================================================
// Pipeline Executor
// ============================================================================

/// Load-then-derive pipeline over one [`MetadataProvider`].
///
/// # Example
///
/// ```ignore
/// let pipeline = XrefPipeline::new(Arc::new(RepodataProvider::new()))
///     .with_timeout(Duration::from_secs(60));
/// let result = pipeline
///     .run(vec![RepoSpec::new("/srv/repo")], &PairingEngine::new())
///     .await?;
/// println!("{} pairs", result.output.pairs.len());
/// ```
pub struct XrefPipeline<P: MetadataProvider + ?Sized> {
    provider: Arc<P>,
    executor: LoadExecutor,

    /// Timeout for loading all repositories (default: 5 minutes)
    load_timeout: Duration,
}

impl<P: MetadataProvider + ?Sized + 'static> XrefPipeline<P> {
    /// Creates a pipeline loading up to 4 repositories at a time with a
    /// 5 minute timeout.
    pub fn new(provider: Arc<P>) -> Self {
        Self::with_config(provider, &LoaderConfig::default())
    }

    pub fn with_config(provider: Arc<P>, config: &LoaderConfig) -> Self {
        Self {
            provider,
            executor: LoadExecutor::new(config.concurrency),
            load_timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = timeout;
        self
    }

    /// Loads and merges all repositories, in the order given.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if no repository is given, loading exceeds
    /// the timeout, or any repository fails to load.
    pub async fn load(
        &self,
        repos: Vec<RepoSpec>,
        stats: &mut PipelineStats,
    ) -> Result<RepoSnapshot, PipelineError> {
        if repos.is_empty() {
            return Err(PipelineError::NoRepositories);
        }
        stats.repositories = repos.len();

        info!(repositories = repos.len(), "Starting load stage");
        let load_start = Instant::now();

        let mut snapshot = timeout(
            self.load_timeout,
            self.executor.execute_all(Arc::clone(&self.provider), repos),
        )
        .await
        .map_err(|_| PipelineError::LoadTimeout {
            timeout_secs: self.load_timeout.as_secs(),
        })??;

        let before = snapshot.packages.len();
        snapshot.packages.retain(|p| p.repo_id != SYSTEM_REPO_ID);
        stats.packages_excluded = before - snapshot.packages.len();
        if stats.packages_excluded > 0 {
            warn!(
                excluded = stats.packages_excluded,
                "Dropped installed-system records"
            );
        }

        stats.packages_loaded = snapshot.packages.len();
        stats.load_duration_ms = load_start.elapsed().as_millis() as u64;
        info!(
            duration_ms = stats.load_duration_ms,
            packages = stats.packages_loaded,
            modules = snapshot.modules.len(),
            "Load completed"
        );
        Ok(snapshot)
    }

    /// Loads the repositories and runs `stage` over them.
    pub async fn run<S>(
        &self,
        repos: Vec<RepoSpec>,
        stage: &S,
    ) -> Result<XrefResult<S::Output>, PipelineError>
    where
        S: XrefStage<Input = RepoSnapshot>,
    {
        let start = Instant::now();
        let mut stats = PipelineStats::default();

        let snapshot = self.load(repos, &mut stats).await?;

        info!(stage = stage.stage_name(), "Starting stage");
        let stage_start = Instant::now();
        let output = stage
            .execute(snapshot)
            .map_err(|e| PipelineError::StageFailed {
                stage: stage.stage_name().to_string(),
                source: Box::new(e),
            })?;

        stats.stage_duration_ms = stage_start.elapsed().as_millis() as u64;
        stats.warnings = output.warnings().len();
        stats.total_duration_ms = start.elapsed().as_millis() as u64;
        info!(
            stage = stage.stage_name(),
            duration_ms = stats.stage_duration_ms,
            warnings = stats.warnings,
            "Stage completed"
        );

        Ok(XrefResult { output, stats })
    }
}

// ============================================================================
// Tests
// ============================================================================
