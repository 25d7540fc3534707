pub mod cosine;

pub use cosine::CosineSimilarity;
