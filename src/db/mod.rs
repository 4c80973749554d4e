mod remote;
mod repository;
mod schema;

use async_trait::async_trait;

use crate::config::Credentials;
use crate::error::{AppError, Result};
use crate::models::{ArticleRecord, DerivedMetadata, StoredUrl};

pub use remote::RemoteStore;
pub use repository::Repository;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A row with the same `external_id` already existed; nothing was written.
    Duplicate,
}

/// Owner of the `articles` table.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Creates the table if it does not exist.
    async fn ensure_schema(&self) -> Result<()>;

    /// Latest `ingest_date`, or `None` for an empty table.
    async fn max_ingest_date(&self) -> Result<Option<String>>;

    async fn insert_if_absent(&self, record: &ArticleRecord) -> Result<InsertOutcome>;

    /// Overwrites the URL-derived fields of one row. Never touches
    /// `external_id` or `fulltext`.
    async fn update_derived_fields(&self, rowid: i64, derived: &DerivedMetadata) -> Result<()>;

    async fn article_urls(&self) -> Result<Vec<StoredUrl>>;

    async fn count_articles(&self) -> Result<u64>;

    /// Releases the connection. Safe to call more than once.
    async fn close(&mut self) -> Result<()>;
}

/// Picks the backend from the database URL: `libsql://` and `http(s)://`
/// go to a remote libSQL server, anything else is opened as a SQLite file.
pub async fn open_store(credentials: &Credentials) -> Result<Box<dyn ArticleStore>> {
    let url = credentials.database_url.as_str();

    if url.starts_with("libsql://") || url.starts_with("https://") || url.starts_with("http://")
    {
        tracing::debug!("Using remote libSQL store at {}", url);
        let store = RemoteStore::new(url, &credentials.auth_token)?;
        return Ok(Box::new(store));
    }

    if url.contains("://") {
        return Err(AppError::Config(format!(
            "Unsupported database URL scheme: {}",
            url
        )));
    }

    tracing::debug!("Using SQLite store at {}", url);
    let store = Repository::open(url).await?;
    Ok(Box::new(store))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(url: &str) -> Credentials {
        Credentials::new(Some(url.to_string()), Some("token".to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_open_store_sqlite_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("news.db");
        let mut store = open_store(&credentials(path.to_str().unwrap())).await.unwrap();

        store.ensure_schema().await.unwrap();
        assert_eq!(store.count_articles().await.unwrap(), 0);
        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_open_store_rejects_unknown_scheme() {
        let err = open_store(&credentials("postgres://localhost/news"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::Config(_)));
    }
}
