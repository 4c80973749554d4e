use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{AppError, Result};

pub const API_CONFIG_FILE: &str = "api_config.json";
pub const REGIONS_FILE: &str = "regions.json";
pub const SOURCE_REGIONS_FILE: &str = "source_regions.json";
pub const URL_REGION_KEYWORDS_FILE: &str = "url_region_keywords.json";
pub const FILTERS_FILE: &str = "filters.json";

/// Key of the region-id table entry used when an article carries no mappable region.
pub const REGION_NULL_KEY: &str = "null";

/// Database URL and auth token, supplied once at startup.
#[derive(Clone)]
pub struct Credentials {
    pub database_url: String,
    pub auth_token: String,
}

impl Credentials {
    /// Both parts are required; empty values count as missing.
    pub fn new(database_url: Option<String>, auth_token: Option<String>) -> Result<Self> {
        let database_url = database_url
            .filter(|v| !v.trim().is_empty())
            .ok_or(AppError::MissingCredential("TURSO_DB_URL"))?;
        let auth_token = auth_token
            .filter(|v| !v.trim().is_empty())
            .ok_or(AppError::MissingCredential("TURSO_AUTH_TOKEN"))?;

        Ok(Self {
            database_url,
            auth_token,
        })
    }
}

// Keep the token out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("database_url", &self.database_url)
            .field("auth_token", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_index_url: String,

    /// Detail endpoint; `{sophora_id}` is replaced by the story id.
    pub base_detail_url: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default)]
    pub published_after: Option<String>,
}

fn default_timeout() -> u64 {
    10
}

impl ApiConfig {
    pub fn detail_url(&self, sophora_id: &str) -> String {
        self.base_detail_url.replace("{sophora_id}", sophora_id)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Filters {
    #[serde(default)]
    pub types: HashSet<String>,
    #[serde(default)]
    pub ressorts: HashSet<String>,
}

#[derive(Debug, Deserialize)]
struct FiltersFile {
    exclude: Filters,
}

/// Lookup tables consumed by the metadata resolver and the ingest filters.
#[derive(Debug, Clone, Default)]
pub struct ConfigTables {
    pub regions: HashMap<String, String>,
    pub source_regions: HashMap<String, String>,
    /// Scanned in this order; the first matching keyword wins.
    pub url_region_keywords: Vec<(String, String)>,
    pub filters: Filters,
}

impl ConfigTables {
    pub fn load(dir: &Path) -> Result<Self> {
        let regions: HashMap<String, String> = read_json(&dir.join(REGIONS_FILE))?;
        if !regions.contains_key(REGION_NULL_KEY) {
            return Err(AppError::Config(format!(
                "{} has no \"{}\" entry",
                REGIONS_FILE, REGION_NULL_KEY
            )));
        }

        let source_regions = read_json(&dir.join(SOURCE_REGIONS_FILE))?;

        let keywords: IndexMap<String, String> =
            read_json(&dir.join(URL_REGION_KEYWORDS_FILE))?;
        let url_region_keywords = keywords.into_iter().collect();

        let filters = read_json::<FiltersFile>(&dir.join(FILTERS_FILE))?.exclude;

        Ok(Self {
            regions,
            source_regions,
            url_region_keywords,
            filters,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub api: ApiConfig,
    pub tables: ConfigTables,
}

impl Config {
    pub fn load(config_dir: &Path, credentials: Credentials) -> Result<Self> {
        let api = read_json(&config_dir.join(API_CONFIG_FILE))?;
        let tables = ConfigTables::load(config_dir)?;

        Ok(Self {
            credentials,
            api,
            tables,
        })
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|source| AppError::ConfigFile {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| AppError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config_dir(keywords: &str) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(API_CONFIG_FILE),
            r#"{
                "base_index_url": "https://www.tagesschau.de/api2u/news/",
                "base_detail_url": "https://www.tagesschau.de/api2u/{sophora_id}.json"
            }"#,
        )
        .unwrap();
        fs::write(
            dir.path().join(REGIONS_FILE),
            r#"{"null": "Keine Region", "2": "Bayern", "9": "Hamburg"}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join(SOURCE_REGIONS_FILE),
            r#"{"br": "Bayern", "unknown": "Unbekannt"}"#,
        )
        .unwrap();
        fs::write(dir.path().join(URL_REGION_KEYWORDS_FILE), keywords).unwrap();
        fs::write(
            dir.path().join(FILTERS_FILE),
            r#"{"exclude": {"types": ["video"], "ressorts": ["sport"]}}"#,
        )
        .unwrap();
        dir
    }

    fn credentials() -> Credentials {
        Credentials::new(Some("file:test.db".into()), Some("token".into())).unwrap()
    }

    #[test]
    fn test_missing_credentials_are_rejected() {
        let err = Credentials::new(None, Some("token".into())).unwrap_err();
        assert!(matches!(err, AppError::MissingCredential("TURSO_DB_URL")));

        let err = Credentials::new(Some("file:x.db".into()), Some("  ".into())).unwrap_err();
        assert!(matches!(err, AppError::MissingCredential("TURSO_AUTH_TOKEN")));
    }

    #[test]
    fn test_credentials_debug_hides_token() {
        let creds = Credentials::new(Some("file:x.db".into()), Some("secret".into())).unwrap();
        let printed = format!("{:?}", creds);
        assert!(!printed.contains("secret"));
    }

    #[test]
    fn test_load_full_config() {
        let dir = write_config_dir(r#"{"bayern": "Bayern", "hamburg": "Hamburg"}"#);
        let config = Config::load(dir.path(), credentials()).unwrap();

        assert_eq!(config.api.timeout, 10);
        assert!(config.api.published_after.is_none());
        assert_eq!(
            config.api.detail_url("abc-100"),
            "https://www.tagesschau.de/api2u/abc-100.json"
        );
        assert_eq!(config.tables.regions["2"], "Bayern");
        assert!(config.tables.filters.types.contains("video"));
        assert!(config.tables.filters.ressorts.contains("sport"));
    }

    #[test]
    fn test_keyword_order_follows_file() {
        let dir = write_config_dir(
            r#"{"niedersachsen": "Niedersachsen", "bayern": "Bayern", "berlin": "Berlin"}"#,
        );
        let tables = ConfigTables::load(dir.path()).unwrap();
        let keys: Vec<&str> = tables
            .url_region_keywords
            .iter()
            .map(|(k, _)| k.as_str())
            .collect();
        assert_eq!(keys, vec!["niedersachsen", "bayern", "berlin"]);
    }

    #[test]
    fn test_regions_without_null_sentinel_fail() {
        let dir = write_config_dir(r#"{"bayern": "Bayern"}"#);
        fs::write(dir.path().join(REGIONS_FILE), r#"{"2": "Bayern"}"#).unwrap();
        let err = ConfigTables::load(dir.path()).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(dir.path(), credentials()).unwrap_err();
        assert!(matches!(err, AppError::ConfigFile { .. }));
    }

    #[test]
    fn test_shipped_config_dir_loads() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("config");
        let config = Config::load(&dir, credentials()).unwrap();
        assert_eq!(config.tables.regions[REGION_NULL_KEY], "Keine Region");
        assert_eq!(config.tables.url_region_keywords[1].0, "bayern");
    }
}
