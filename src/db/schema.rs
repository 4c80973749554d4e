use crate::models::ArticleRecord;

pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS articles (
    external_id TEXT PRIMARY KEY,
    sophora_id TEXT,
    title TEXT,
    published_at TEXT,
    ressort TEXT,
    type TEXT,
    url TEXT,
    source TEXT,
    region_by_api TEXT,
    region_by_source TEXT,
    region_by_url TEXT,
    subregion_by_url TEXT,
    meta_infos_multiple TEXT,
    fulltext TEXT NOT NULL,
    ingest_date TEXT NOT NULL
)
"#;

pub const INSERT_ARTICLE: &str = r#"INSERT OR IGNORE INTO articles (
    external_id, sophora_id, title, published_at, ressort, type, url, source,
    region_by_api, region_by_source, region_by_url, subregion_by_url,
    meta_infos_multiple, fulltext, ingest_date
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"#;

pub const SELECT_MAX_INGEST_DATE: &str = "SELECT MAX(ingest_date) FROM articles";

pub const UPDATE_DERIVED_FIELDS: &str = r#"UPDATE articles
    SET source = ?1, region_by_source = ?2, region_by_url = ?3, subregion_by_url = ?4
    WHERE rowid = ?5"#;

pub const SELECT_ARTICLE_URLS: &str = "SELECT rowid, url FROM articles ORDER BY rowid";

pub const COUNT_ARTICLES: &str = "SELECT COUNT(*) FROM articles";

/// Bind values for [`INSERT_ARTICLE`], in placeholder order.
pub fn insert_values(record: &ArticleRecord) -> Vec<Option<String>> {
    vec![
        Some(record.external_id.clone()),
        record.sophora_id.clone(),
        record.title.clone(),
        record.published_at.clone(),
        record.ressort.clone(),
        record.article_type.clone(),
        record.url.clone(),
        Some(record.source.clone()),
        Some(record.region_by_api.clone()),
        Some(record.region_by_source.clone()),
        Some(record.region_by_url.clone()),
        record.subregion_by_url.clone(),
        Some(record.meta_infos_multiple.clone()),
        Some(record.fulltext.clone()),
        Some(record.ingest_date.clone()),
    ]
}
