use crate::db::ArticleStore;
use crate::error::Result;
use crate::metadata::MetadataResolver;

use super::stats::RecomputeStats;

const PROGRESS_EVERY: usize = 200;

/// Re-derives the URL-based fields of every stored row with the current
/// lookup tables. Rows are addressed by rowid; `external_id` and `fulltext`
/// stay as they are.
pub struct RecomputePass {
    store: Box<dyn ArticleStore>,
    resolver: MetadataResolver,
}

impl RecomputePass {
    pub fn new(store: Box<dyn ArticleStore>, resolver: MetadataResolver) -> Self {
        Self { store, resolver }
    }

    pub async fn run(mut self) -> Result<RecomputeStats> {
        let result = self.recompute().await;

        if let Err(e) = self.store.close().await {
            tracing::warn!(error = %e, "Failed to close article store");
        }

        result
    }

    async fn recompute(&self) -> Result<RecomputeStats> {
        self.store.ensure_schema().await?;

        let rows = self.store.article_urls().await?;
        let mut stats = RecomputeStats {
            total: rows.len(),
            ..Default::default()
        };
        tracing::info!(rows = stats.total, "Recomputing URL metadata");

        for (i, row) in rows.iter().enumerate() {
            let derived = self.resolver.recompute_metadata(row.url.as_deref());

            match self.store.update_derived_fields(row.rowid, &derived).await {
                Ok(()) => stats.updated += 1,
                Err(e) => {
                    tracing::warn!(rowid = row.rowid, error = %e, "Failed to update row");
                    stats.failed += 1;
                }
            }

            if (i + 1) % PROGRESS_EVERY == 0 {
                tracing::info!(rows = i + 1, total = stats.total, "Recompute progress");
            }
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::Path;

    use crate::db::{InsertOutcome, Repository};
    use crate::models::ArticleRecord;

    type Row = (String, String, String, Option<String>, String);

    fn resolver() -> MetadataResolver {
        MetadataResolver::new(
            HashMap::from([("null".to_string(), "Keine Region".to_string())]),
            HashMap::from([
                ("tagesschau".to_string(), "Bundesweit".to_string()),
                ("br".to_string(), "Bayern".to_string()),
            ]),
            vec![
                ("bayern".to_string(), "Bayern".to_string()),
                ("hamburg".to_string(), "Hamburg".to_string()),
            ],
        )
    }

    fn record(id: &str, url: Option<&str>, derived_by: &MetadataResolver) -> ArticleRecord {
        let derived = derived_by.recompute_metadata(url);
        ArticleRecord {
            external_id: id.to_string(),
            sophora_id: Some(format!("{}-101", id)),
            title: Some("Titel".to_string()),
            published_at: Some("2025-03-01T10:00:00+01:00".to_string()),
            ressort: Some("inland".to_string()),
            article_type: Some("story".to_string()),
            url: url.map(str::to_string),
            source: derived.source,
            region_by_api: "Keine Region".to_string(),
            region_by_source: derived.region_by_source,
            region_by_url: derived.region_by_url,
            subregion_by_url: derived.subregion_by_url,
            meta_infos_multiple: "{}".to_string(),
            fulltext: format!("Volltext {}", id),
            ingest_date: "2025-03-01T12:00:00".to_string(),
        }
    }

    async fn seed(path: &Path, records: &[ArticleRecord]) {
        let mut repo = Repository::open(path.to_str().unwrap()).await.unwrap();
        repo.ensure_schema().await.unwrap();
        for r in records {
            assert_eq!(repo.insert_if_absent(r).await.unwrap(), InsertOutcome::Inserted);
        }
        repo.close().await.unwrap();
    }

    fn rows(path: &Path) -> Vec<Row> {
        let conn = rusqlite::Connection::open(path).unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT external_id, source, region_by_url, subregion_by_url, fulltext
                 FROM articles ORDER BY rowid",
            )
            .unwrap();
        stmt.query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?)))
            .unwrap()
            .collect::<std::result::Result<Vec<Row>, _>>()
            .unwrap()
    }

    async fn recompute(path: &Path) -> RecomputeStats {
        let store = Repository::open(path.to_str().unwrap()).await.unwrap();
        RecomputePass::new(Box::new(store), resolver()).run().await.unwrap()
    }

    #[tokio::test]
    async fn test_recompute_with_same_tables_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("news.db");
        let resolver = resolver();
        seed(
            &db,
            &[
                record(
                    "a",
                    Some("https://www.tagesschau.de/inland/regional/bayern/muenchen-demo-101.html"),
                    &resolver,
                ),
                record("b", Some("https://www.br.de/nachrichten/bayern/ober_bayern/x"), &resolver),
                record("c", None, &resolver),
            ],
        )
        .await;
        let before = rows(&db);

        let stats = recompute(&db).await;

        assert_eq!(stats.total, 3);
        assert_eq!(stats.updated, 3);
        assert_eq!(stats.failed, 0);
        assert_eq!(rows(&db), before);
    }

    #[tokio::test]
    async fn test_recompute_applies_new_tables() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("news.db");
        // Stored with tables that knew no keywords at all.
        let stale = MetadataResolver::new(HashMap::new(), HashMap::new(), Vec::new());
        seed(
            &db,
            &[record(
                "hh",
                Some("https://www.ndr.de/nachrichten/hamburg/altona_nord/elbe-101.html"),
                &stale,
            )],
        )
        .await;
        assert_eq!(rows(&db)[0].2, "Bundesweit");

        recompute(&db).await;

        let (id, source, region, subregion, fulltext) = rows(&db).remove(0);
        assert_eq!(id, "hh");
        assert_eq!(source, "ndr");
        assert_eq!(region, "Hamburg");
        assert_eq!(subregion.as_deref(), Some("Altona Nord"));
        assert_eq!(fulltext, "Volltext hh");
    }

    #[tokio::test]
    async fn test_recompute_on_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("news.db");

        let stats = recompute(&db).await;

        assert_eq!(stats, RecomputeStats::default());
    }
}
