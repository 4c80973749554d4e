use std::collections::HashMap;

use url::Url;

use crate::config::{ConfigTables, REGION_NULL_KEY};
use crate::models::DerivedMetadata;

/// Returned by `source_from_url` and used as the fallback key of the source table.
pub const UNKNOWN_SOURCE: &str = "unknown";

/// Used when neither the source nor the `unknown` key is in the source table.
pub const UNKNOWN_REGION: &str = "Unbekannt";

/// Region of articles whose URL names no federal state.
pub const NATIONWIDE: &str = "Bundesweit";

/// Derives source and region metadata from article URLs and region ids.
///
/// Holds only the lookup tables and does no I/O, so the same URL always
/// yields the same metadata. Ingest and the recompute pass both go through
/// [`MetadataResolver::recompute_metadata`].
#[derive(Debug, Clone)]
pub struct MetadataResolver {
    regions: HashMap<String, String>,
    source_regions: HashMap<String, String>,
    url_region_keywords: Vec<(String, String)>,
}

impl MetadataResolver {
    pub fn new(
        regions: HashMap<String, String>,
        source_regions: HashMap<String, String>,
        url_region_keywords: Vec<(String, String)>,
    ) -> Self {
        Self {
            regions,
            source_regions,
            url_region_keywords,
        }
    }

    pub fn from_tables(tables: &ConfigTables) -> Self {
        Self::new(
            tables.regions.clone(),
            tables.source_regions.clone(),
            tables.url_region_keywords.clone(),
        )
    }

    /// The single derivation of the URL-based fields.
    pub fn recompute_metadata(&self, url: Option<&str>) -> DerivedMetadata {
        let source = source_from_url(url);
        let region_by_source = self.region_by_source(&source);
        let (region_by_url, subregion_by_url) = self.region_by_url(url);

        DerivedMetadata {
            source,
            region_by_source,
            region_by_url,
            subregion_by_url,
        }
    }

    pub fn region_by_source(&self, source: &str) -> String {
        self.source_regions
            .get(source)
            .or_else(|| self.source_regions.get(UNKNOWN_SOURCE))
            .cloned()
            .unwrap_or_else(|| UNKNOWN_REGION.to_string())
    }

    pub fn region_by_url(&self, url: Option<&str>) -> (String, Option<String>) {
        let nationwide = || (NATIONWIDE.to_string(), None);

        let Some(path) = url.and_then(url_path) else {
            return nationwide();
        };

        let Some((keyword, region)) = self
            .url_region_keywords
            .iter()
            .find(|(keyword, _)| path.contains(&format!("/{}/", keyword)))
        else {
            return nationwide();
        };

        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        let subregion = segments
            .iter()
            .position(|segment| *segment == keyword.as_str())
            .and_then(|idx| segments.get(idx + 1))
            .and_then(|candidate| subregion_from_segment(candidate));

        (region.clone(), subregion)
    }

    pub fn region_by_api(&self, region_ids: Option<&[i64]>) -> String {
        let names: Vec<&str> = region_ids
            .unwrap_or_default()
            .iter()
            .filter_map(|id| self.regions.get(&id.to_string()))
            .filter(|name| !name.is_empty())
            .map(String::as_str)
            .collect();

        if names.is_empty() {
            self.null_region()
        } else {
            names.join(", ")
        }
    }

    fn null_region(&self) -> String {
        self.regions
            .get(REGION_NULL_KEY)
            .cloned()
            .unwrap_or_else(|| UNKNOWN_REGION.to_string())
    }
}

/// First label of the host, without a leading `www.`/`www1.`.
pub fn source_from_url(url: Option<&str>) -> String {
    let host = url
        .and_then(|u| Url::parse(u).ok())
        .and_then(|u| u.host_str().map(str::to_lowercase))
        .unwrap_or_default();

    let host = host
        .strip_prefix("www.")
        .or_else(|| host.strip_prefix("www1."))
        .unwrap_or(&host);

    match host.split('.').next() {
        Some(label) if !label.is_empty() => label.to_string(),
        _ => UNKNOWN_SOURCE.to_string(),
    }
}

/// Lower-cased path with every segment percent-decoded, so `w%C3%BCrzburg`
/// reads as `würzburg` again.
fn url_path(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segments: Vec<String> = parsed
        .path_segments()?
        .map(|segment| {
            let bytes = urlencoding::decode_binary(segment.as_bytes());
            String::from_utf8_lossy(&bytes).to_lowercase()
        })
        .collect();
    Some(format!("/{}", segments.join("/")))
}

// Slugs like `muenchen-demo-101` are article names, not places.
fn subregion_from_segment(segment: &str) -> Option<String> {
    if !segment.contains('_') && segment.contains('-') {
        return None;
    }

    let spaced = segment.replace('_', " ");
    let head = spaced.split('-').next().unwrap_or_default();
    Some(title_case(head))
}

/// Upper-cases the first letter of every alphabetic run, lower-cases the rest.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;

    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }

    out
}
