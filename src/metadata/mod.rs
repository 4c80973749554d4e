mod resolver;

pub use resolver::MetadataResolver;
