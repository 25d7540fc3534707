pub mod filing_document;
pub mod identifier_resolver;
pub mod ingest;
pub mod investor_directory;
pub mod leveraged_registry;
pub mod matching;
pub mod normalize;
pub mod similarity;
