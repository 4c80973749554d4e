use async_trait::async_trait;
use rusqlite::{params, params_from_iter};
use tokio_rusqlite::Connection;

use crate::error::{AppError, Result};
use crate::models::{ArticleRecord, DerivedMetadata, StoredUrl};

use super::schema::{
    insert_values, COUNT_ARTICLES, INSERT_ARTICLE, SCHEMA, SELECT_ARTICLE_URLS,
    SELECT_MAX_INGEST_DATE, UPDATE_DERIVED_FIELDS,
};
use super::{ArticleStore, InsertOutcome};

/// Articles table in a local SQLite database.
pub struct Repository {
    conn: Option<Connection>,
}

impl Repository {
    /// Opens a file path, a `file:` URI or `:memory:`.
    pub async fn open(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;
        Ok(Self { conn: Some(conn) })
    }

    #[cfg(test)]
    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await?;
        Ok(Self { conn: Some(conn) })
    }

    fn conn(&self) -> Result<&Connection> {
        self.conn
            .as_ref()
            .ok_or(AppError::Database(tokio_rusqlite::Error::ConnectionClosed))
    }
}

#[async_trait]
impl ArticleStore for Repository {
    async fn ensure_schema(&self) -> Result<()> {
        self.conn()?
            .call(|conn| {
                conn.execute_batch(SCHEMA)?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    async fn max_ingest_date(&self) -> Result<Option<String>> {
        let date = self
            .conn()?
            .call(|conn| {
                let date: Option<String> =
                    conn.query_row(SELECT_MAX_INGEST_DATE, [], |row| row.get(0))?;
                Ok(date)
            })
            .await?;
        Ok(date)
    }

    async fn insert_if_absent(&self, record: &ArticleRecord) -> Result<InsertOutcome> {
        let values = insert_values(record);
        let changed = self
            .conn()?
            .call(move |conn| {
                let changed = conn.execute(INSERT_ARTICLE, params_from_iter(values.iter()))?;
                Ok(changed)
            })
            .await?;

        Ok(if changed > 0 {
            InsertOutcome::Inserted
        } else {
            InsertOutcome::Duplicate
        })
    }

    async fn update_derived_fields(&self, rowid: i64, derived: &DerivedMetadata) -> Result<()> {
        let derived = derived.clone();
        self.conn()?
            .call(move |conn| {
                conn.execute(
                    UPDATE_DERIVED_FIELDS,
                    params![
                        derived.source,
                        derived.region_by_source,
                        derived.region_by_url,
                        derived.subregion_by_url,
                        rowid,
                    ],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    async fn article_urls(&self) -> Result<Vec<StoredUrl>> {
        let rows = self
            .conn()?
            .call(|conn| {
                let mut stmt = conn.prepare(SELECT_ARTICLE_URLS)?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok(StoredUrl {
                            rowid: row.get(0)?,
                            url: row.get(1)?,
                        })
                    })?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;
        Ok(rows)
    }

    async fn count_articles(&self) -> Result<u64> {
        let count = self
            .conn()?
            .call(|conn| {
                let count: i64 = conn.query_row(COUNT_ARTICLES, [], |row| row.get(0))?;
                Ok(count)
            })
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.close().await?;
        }
        Ok(())
    }
}
