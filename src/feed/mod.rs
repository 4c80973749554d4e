mod fetcher;
mod fulltext;

pub use fetcher::{FeedFetcher, FeedSource};
pub use fulltext::extract_fulltext;
