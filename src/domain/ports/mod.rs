pub mod checkpoint_repository;
pub mod filing_source;
pub mod holding_repository;
pub mod investor_repository;
pub mod mapping_api;
pub mod similarity;
