use crate::model::{RepoSnapshot, RepoSpec};
use crate::traits::{LoadError, MetadataProvider};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{info, instrument};

/// Loads several repositories concurrently, bounded by a semaphore.
#[derive(Clone)]
pub struct LoadExecutor {
    semaphore: Arc<Semaphore>,
}

impl LoadExecutor {
    pub fn new(concurrency_limit: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(concurrency_limit.max(1))),
        }
    }

    #[instrument(skip(self, provider, repo), fields(repo = %repo.id))]
    pub async fn execute<P>(&self, provider: Arc<P>, repo: RepoSpec) -> Result<RepoSnapshot, LoadError>
    where
        P: MetadataProvider + ?Sized + 'static,
    {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| LoadError::Unknown(format!("Semaphore error: {}", e)))?;

        info!(provider = provider.provider_id(), location = %repo.location, "Loading repository");
        let snapshot = provider.load(&repo).await?;
        info!(
            packages = snapshot.packages.len(),
            modules = snapshot.modules.len(),
            "Repository loaded"
        );
        Ok(snapshot)
    }

    /// Loads every repository and merges the snapshots in the order given,
    /// regardless of which load finishes first.
    pub async fn execute_all<P>(
        &self,
        provider: Arc<P>,
        repos: Vec<RepoSpec>,
    ) -> Result<RepoSnapshot, LoadError>
    where
        P: MetadataProvider + ?Sized + 'static,
    {
        let handles: Vec<_> = repos
            .into_iter()
            .map(|repo| {
                let executor = self.clone();
                let provider = Arc::clone(&provider);
                tokio::spawn(async move { executor.execute(provider, repo).await })
            })
            .collect();

        let mut merged = RepoSnapshot::default();
        for handle in handles {
            let snapshot = handle
                .await
                .map_err(|e| LoadError::Unknown(format!("Task join error: {}", e)))??;
            merged.merge(snapshot);
        }
        Ok(merged)
    }
}
