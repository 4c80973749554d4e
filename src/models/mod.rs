mod article;

pub use article::{
    ArticleRecord, ContentBlock, DerivedMetadata, IndexArticle, IndexResponse, StoredUrl,
    StoryDetail,
};
