use serde::Deserialize;

/// One entry of the upstream `news` index.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexArticle {
    pub external_id: Option<String>,
    pub sophora_id: Option<String>,
    pub title: Option<String>,
    pub date: Option<String>,
    pub ressort: Option<String>,
    #[serde(rename = "type")]
    pub article_type: Option<String>,
    #[serde(rename = "shareURL")]
    pub share_url: Option<String>,
    #[serde(default)]
    pub regions: Option<Vec<i64>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IndexResponse {
    #[serde(default)]
    pub news: Vec<IndexArticle>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoryDetail {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

/// A block of a story body. `value` stays untyped: only `text` and
/// `headline` blocks carry it as a string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: Option<String>,
    pub value: Option<serde_json::Value>,
}

/// The four fields derived from an article URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedMetadata {
    pub source: String,
    pub region_by_source: String,
    pub region_by_url: String,
    pub subregion_by_url: Option<String>,
}

/// A row of the `articles` table.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleRecord {
    pub external_id: String,
    pub sophora_id: Option<String>,
    pub title: Option<String>,
    pub published_at: Option<String>,
    pub ressort: Option<String>,
    pub article_type: Option<String>,
    pub url: Option<String>,
    pub source: String,
    pub region_by_api: String,
    pub region_by_source: String,
    pub region_by_url: String,
    pub subregion_by_url: Option<String>,
    pub meta_infos_multiple: String,
    pub fulltext: String,
    pub ingest_date: String,
}

/// Row anchor for the metadata recompute pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUrl {
    pub rowid: i64,
    pub url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_article_from_api_json() {
        let json = r#"{
            "news": [{
                "sophoraId": "muenchen-demo-101",
                "externalId": "tagesschau_fm-story-muenchen-demo",
                "title": "Demo in München",
                "date": "2025-03-01T10:15:00.000+01:00",
                "ressort": "inland",
                "type": "story",
                "shareURL": "https://www.tagesschau.de/inland/regional/bayern/muenchen-demo-101.html",
                "regions": [2],
                "tags": [{"tag": "Demo"}]
            }, {
                "externalId": "no-regions",
                "type": "video"
            }]
        }"#;

        let index: IndexResponse = serde_json::from_str(json).unwrap();
        assert_eq!(index.news.len(), 2);

        let first = &index.news[0];
        assert_eq!(first.sophora_id.as_deref(), Some("muenchen-demo-101"));
        assert_eq!(first.article_type.as_deref(), Some("story"));
        assert_eq!(first.regions, Some(vec![2]));
        assert!(first.share_url.as_deref().unwrap().contains("/bayern/"));

        let second = &index.news[1];
        assert!(second.regions.is_none());
        assert!(second.share_url.is_none());
    }

    #[test]
    fn test_story_detail_tolerates_non_text_blocks() {
        let json = r#"{
            "content": [
                {"type": "text", "value": "<p>Hallo</p>"},
                {"type": "box", "box": {"title": "Mehr"}},
                {"type": "quotation", "value": {"text": "Zitat"}}
            ]
        }"#;

        let detail: StoryDetail = serde_json::from_str(json).unwrap();
        assert_eq!(detail.content.len(), 3);
        assert!(detail.content[1].value.is_none());
        assert!(detail.content[2].value.as_ref().unwrap().is_object());
    }
}
