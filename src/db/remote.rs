use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{ArticleRecord, DerivedMetadata, StoredUrl};

use super::schema::{
    insert_values, COUNT_ARTICLES, INSERT_ARTICLE, SCHEMA, SELECT_ARTICLE_URLS,
    SELECT_MAX_INGEST_DATE, UPDATE_DERIVED_FIELDS,
};
use super::{ArticleStore, InsertOutcome};

const PIPELINE_PATH: &str = "/v2/pipeline";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Value {
    Null,
    Integer { value: String },
    Float { value: f64 },
    Text { value: String },
    Blob { base64: String },
}

impl Value {
    fn text(value: Option<&str>) -> Self {
        match value {
            Some(v) => Value::Text {
                value: v.to_string(),
            },
            None => Value::Null,
        }
    }

    fn integer(value: i64) -> Self {
        Value::Integer {
            value: value.to_string(),
        }
    }

    fn as_text(&self) -> Option<String> {
        match self {
            Value::Text { value } | Value::Integer { value } => Some(value.clone()),
            _ => None,
        }
    }

    fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer { value } => value.parse().ok(),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize)]
struct PipelineRequest<'a> {
    baton: Option<String>,
    requests: Vec<StreamRequest<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum StreamRequest<'a> {
    Execute { stmt: Statement<'a> },
    Close,
}

#[derive(Debug, Serialize)]
struct Statement<'a> {
    sql: &'a str,
    args: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct PipelineResponse {
    results: Vec<StreamResult>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum StreamResult {
    Ok { response: StreamResponse },
    Error { error: StreamError },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum StreamResponse {
    Execute { result: StatementResult },
    Close,
}

#[derive(Debug, Deserialize)]
struct StatementResult {
    #[serde(default)]
    rows: Vec<Vec<Value>>,
    #[serde(default)]
    affected_row_count: u64,
}

#[derive(Debug, Deserialize)]
struct StreamError {
    message: String,
}

/// Articles table in a remote libSQL database (Turso), reached over HTTP.
///
/// Every statement is sent as its own pipeline of `execute` + `close`, so no
/// stream state outlives a call.
pub struct RemoteStore {
    client: Client,
    pipeline_url: String,
    auth_token: String,
}

impl RemoteStore {
    /// `base_url` may use the `libsql://` scheme; it is rewritten to `https://`.
    pub fn new(base_url: &str, auth_token: &str) -> Result<Self> {
        let base = match base_url.strip_prefix("libsql://") {
            Some(rest) => format!("https://{}", rest),
            None => base_url.to_string(),
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Remote(e.to_string()))?;

        Ok(Self {
            client,
            pipeline_url: format!("{}{}", base.trim_end_matches('/'), PIPELINE_PATH),
            auth_token: auth_token.to_string(),
        })
    }

    async fn execute(&self, sql: &str, args: Vec<Value>) -> Result<StatementResult> {
        let request = PipelineRequest {
            baton: None,
            requests: vec![
                StreamRequest::Execute {
                    stmt: Statement { sql, args },
                },
                StreamRequest::Close,
            ],
        };

        let response = self
            .client
            .post(&self.pipeline_url)
            .bearer_auth(&self.auth_token)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Remote(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Remote(format!("HTTP {}: {}", status, body)));
        }

        let pipeline: PipelineResponse = response
            .json()
            .await
            .map_err(|e| AppError::Remote(e.to_string()))?;

        match pipeline.results.into_iter().next() {
            Some(StreamResult::Ok {
                response: StreamResponse::Execute { result },
            }) => Ok(result),
            Some(StreamResult::Error { error }) => Err(AppError::Remote(error.message)),
            _ => Err(AppError::Remote(
                "Pipeline response has no statement result".to_string(),
            )),
        }
    }
}

#[async_trait]
impl ArticleStore for RemoteStore {
    async fn ensure_schema(&self) -> Result<()> {
        self.execute(SCHEMA, Vec::new()).await?;
        Ok(())
    }

    async fn max_ingest_date(&self) -> Result<Option<String>> {
        let result = self.execute(SELECT_MAX_INGEST_DATE, Vec::new()).await?;
        Ok(result
            .rows
            .first()
            .and_then(|row| row.first())
            .and_then(Value::as_text))
    }

    async fn insert_if_absent(&self, record: &ArticleRecord) -> Result<InsertOutcome> {
        let args = insert_values(record)
            .iter()
            .map(|v| Value::text(v.as_deref()))
            .collect();
        let result = self.execute(INSERT_ARTICLE, args).await?;

        Ok(if result.affected_row_count > 0 {
            InsertOutcome::Inserted
        } else {
            InsertOutcome::Duplicate
        })
    }

    async fn update_derived_fields(&self, rowid: i64, derived: &DerivedMetadata) -> Result<()> {
        let args = vec![
            Value::text(Some(derived.source.as_str())),
            Value::text(Some(derived.region_by_source.as_str())),
            Value::text(Some(derived.region_by_url.as_str())),
            Value::text(derived.subregion_by_url.as_deref()),
            Value::integer(rowid),
        ];
        self.execute(UPDATE_DERIVED_FIELDS, args).await?;
        Ok(())
    }

    async fn article_urls(&self) -> Result<Vec<StoredUrl>> {
        let result = self.execute(SELECT_ARTICLE_URLS, Vec::new()).await?;
        result
            .rows
            .iter()
            .map(|row| {
                let rowid = row
                    .first()
                    .and_then(Value::as_i64)
                    .ok_or_else(|| AppError::Remote("Row without rowid".to_string()))?;
                let url = row.get(1).and_then(Value::as_text);
                Ok(StoredUrl { rowid, url })
            })
            .collect()
    }

    async fn count_articles(&self) -> Result<u64> {
        let result = self.execute(COUNT_ARTICLES, Vec::new()).await?;
        let count = result
            .rows
            .first()
            .and_then(|row| row.first())
            .and_then(Value::as_i64)
            .unwrap_or(0);
        Ok(count.max(0) as u64)
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
