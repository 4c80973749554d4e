use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::config::ApiConfig;
use crate::error::{AppError, Result};
use crate::models::{IndexArticle, IndexResponse, StoryDetail};

const USER_AGENT: &str = concat!("tagesschau-ingest/", env!("CARGO_PKG_VERSION"));

/// Upstream index and story lookups.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_index(&self) -> Result<Vec<IndexArticle>>;

    async fn fetch_detail(&self, sophora_id: &str) -> Result<StoryDetail>;
}

pub struct FeedFetcher {
    client: Client,
    api: ApiConfig,
}

impl FeedFetcher {
    pub fn new(api: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(api.timeout))
            .connect_timeout(Duration::from_secs(api.timeout))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|source| AppError::Transport {
                url: api.base_index_url.clone(),
                source,
            })?;

        Ok(Self {
            client,
            api: api.clone(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let transport = |source| AppError::Transport {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(transport)?;

        if !response.status().is_success() {
            return Err(AppError::HttpStatus {
                url: url.to_string(),
                status: response.status(),
            });
        }

        response.json::<T>().await.map_err(transport)
    }
}

#[async_trait]
impl FeedSource for FeedFetcher {
    async fn fetch_index(&self) -> Result<Vec<IndexArticle>> {
        let index: IndexResponse = self.get_json(&self.api.base_index_url).await?;
        tracing::debug!("Fetched {} index entries", index.news.len());
        Ok(index.news)
    }

    async fn fetch_detail(&self, sophora_id: &str) -> Result<StoryDetail> {
        let url = self.api.detail_url(sophora_id);
        self.get_json(&url).await
    }
}
