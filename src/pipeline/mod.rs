mod ingest;
mod recompute;
mod stats;

pub use ingest::IngestPipeline;
pub use recompute::RecomputePass;

use crate::db::ArticleStore;
use crate::error::Result;

/// Connectivity check: counts the stored articles and releases the store.
pub async fn healthcheck(mut store: Box<dyn ArticleStore>) -> Result<u64> {
    let result = async {
        store.ensure_schema().await?;
        store.count_articles().await
    }
    .await;

    if let Err(e) = store.close().await {
        tracing::warn!(error = %e, "Failed to close article store");
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Repository;

    #[tokio::test]
    async fn test_healthcheck_on_fresh_store() {
        let store = Repository::open_in_memory().await.unwrap();
        assert_eq!(healthcheck(Box::new(store)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_healthcheck_fails_on_closed_store() {
        let mut store = Repository::open_in_memory().await.unwrap();
        store.close().await.unwrap();
        assert!(healthcheck(Box::new(store)).await.is_err());
    }
}
