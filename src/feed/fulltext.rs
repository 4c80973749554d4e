use std::sync::OnceLock;

use html_escape::decode_html_entities;
use regex::Regex;

use crate::models::StoryDetail;

const TEXT_BLOCK_TYPES: [&str; 2] = ["text", "headline"];

fn tag_regex() -> &'static Regex {
    static TAG_RE: OnceLock<Regex> = OnceLock::new();
    TAG_RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("static tag pattern"))
}

/// Joins the cleaned `text` and `headline` blocks of a story, in upstream order.
///
/// Returns an empty string when no block survives cleaning.
pub fn extract_fulltext(detail: &StoryDetail) -> String {
    detail
        .content
        .iter()
        .filter(|block| {
            block
                .block_type
                .as_deref()
                .is_some_and(|t| TEXT_BLOCK_TYPES.contains(&t))
        })
        .filter_map(|block| block.value.as_ref().and_then(|v| v.as_str()))
        .map(clean_html)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Decodes entities first so escaped markup is stripped too.
pub fn clean_html(text: &str) -> String {
    let unescaped = decode_html_entities(text);
    tag_regex().replace_all(&unescaped, "").trim().to_string()
}
