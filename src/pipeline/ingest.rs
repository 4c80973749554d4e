use std::collections::HashSet;

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::config::Filters;
use crate::db::{ArticleStore, InsertOutcome};
use crate::error::{AppError, Result};
use crate::feed::{extract_fulltext, FeedSource};
use crate::metadata::MetadataResolver;
use crate::models::{ArticleRecord, IndexArticle};

use super::stats::{ArticleOutcome, FilterReason, RunStats};

/// Fetches the upstream index, filters it against the exclusion lists and the
/// watermark, and stores every new article with its derived metadata.
pub struct IngestPipeline {
    feed: Box<dyn FeedSource>,
    store: Box<dyn ArticleStore>,
    resolver: MetadataResolver,
    filters: Filters,
    published_after: Option<String>,
}

impl IngestPipeline {
    pub fn new(
        feed: Box<dyn FeedSource>,
        store: Box<dyn ArticleStore>,
        resolver: MetadataResolver,
        filters: Filters,
        published_after: Option<String>,
    ) -> Self {
        Self {
            feed,
            store,
            resolver,
            filters,
            published_after,
        }
    }

    pub async fn run(self) -> Result<RunStats> {
        let ingest_date = ingest_timestamp(Utc::now());
        self.run_with_ingest_date(ingest_date).await
    }

    /// Runs one ingest with the given `ingest_date` stamp. The store is closed
    /// before returning, whatever the outcome.
    pub async fn run_with_ingest_date(mut self, ingest_date: String) -> Result<RunStats> {
        let result = self.ingest(ingest_date).await;

        if let Err(e) = self.store.close().await {
            tracing::warn!(error = %e, "Failed to close article store");
        }

        result
    }

    async fn ingest(&self, ingest_date: String) -> Result<RunStats> {
        self.store.ensure_schema().await?;

        let watermark = self.load_watermark().await;
        tracing::info!(
            watermark = watermark.as_deref().unwrap_or("none"),
            "Ingest watermark loaded"
        );

        let mut stats = RunStats::new(ingest_date, watermark);

        let index = self.feed.fetch_index().await?;

        for article in &index {
            stats.api_returned += 1;

            if let Some(reason) = self.filter_reason(article, stats.watermark.as_deref()) {
                stats.record_filtered(reason);
                continue;
            }
            stats.eligible += 1;

            match self.process_article(article, &stats.ingest_date).await {
                Ok(outcome) => stats.record_outcome(outcome),
                Err(e) => {
                    tracing::warn!(
                        external_id = article.external_id.as_deref().unwrap_or("?"),
                        error = %e,
                        "Failed to ingest article"
                    );
                    stats.failed += 1;
                }
            }
        }

        tracing::info!(
            inserted = stats.inserted,
            failed = stats.failed,
            "Ingest finished"
        );
        Ok(stats)
    }

    /// Stored maximum `ingest_date`, else the configured default. An
    /// unreachable store counts as "no watermark".
    async fn load_watermark(&self) -> Option<String> {
        let stored = match self.store.max_ingest_date().await {
            Ok(date) => date,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read watermark");
                None
            }
        };

        stored.or_else(|| self.published_after.clone())
    }

    fn filter_reason(&self, article: &IndexArticle, watermark: Option<&str>) -> Option<FilterReason> {
        if is_excluded(article.article_type.as_deref(), &self.filters.types) {
            return Some(FilterReason::Type);
        }

        if is_excluded(article.ressort.as_deref(), &self.filters.ressorts) {
            return Some(FilterReason::Ressort);
        }

        if let (Some(watermark), Some(published)) = (watermark, article.date.as_deref()) {
            if is_at_or_before(published, watermark) {
                return Some(FilterReason::Watermark);
            }
        }

        None
    }

    async fn process_article(
        &self,
        article: &IndexArticle,
        ingest_date: &str,
    ) -> Result<ArticleOutcome> {
        let external_id = article
            .external_id
            .as_deref()
            .ok_or(AppError::MissingField("externalId"))?;
        let sophora_id = article
            .sophora_id
            .as_deref()
            .ok_or(AppError::MissingField("sophoraId"))?;

        let detail = self.feed.fetch_detail(sophora_id).await?;

        let fulltext = extract_fulltext(&detail);
        if fulltext.is_empty() {
            tracing::debug!(external_id, "Skipping article without fulltext");
            return Ok(ArticleOutcome::NoFulltext);
        }

        let url = article.share_url.clone();
        let derived = self.resolver.recompute_metadata(url.as_deref());

        let record = ArticleRecord {
            external_id: external_id.to_string(),
            sophora_id: Some(sophora_id.to_string()),
            title: article.title.clone(),
            published_at: article.date.clone(),
            ressort: article.ressort.clone(),
            article_type: article.article_type.clone(),
            url,
            source: derived.source,
            region_by_api: self.resolver.region_by_api(article.regions.as_deref()),
            region_by_source: derived.region_by_source,
            region_by_url: derived.region_by_url,
            subregion_by_url: derived.subregion_by_url,
            meta_infos_multiple: serde_json::json!({}).to_string(),
            fulltext,
            ingest_date: ingest_date.to_string(),
        };

        Ok(match self.store.insert_if_absent(&record).await? {
            InsertOutcome::Inserted => ArticleOutcome::Inserted,
            InsertOutcome::Duplicate => ArticleOutcome::Duplicate,
        })
    }
}

fn is_excluded(value: Option<&str>, excluded: &HashSet<String>) -> bool {
    value.is_some_and(|v| excluded.contains(v))
}

/// UTC, second precision, no offset: `2025-03-01T12:00:00`.
fn ingest_timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%dT%H:%M:%S").to_string()
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Offset-less values are our own ingest stamps, which are UTC.
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// `published <= watermark`. Compares instants when both parse, the raw
/// strings otherwise.
fn is_at_or_before(published: &str, watermark: &str) -> bool {
    match (parse_timestamp(published), parse_timestamp(watermark)) {
        (Some(published), Some(watermark)) => published <= watermark,
        _ => published <= watermark,
    }
}
