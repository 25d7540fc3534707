pub mod client;
pub mod pacer;

pub use client::EdgarClient;
pub use pacer::RequestPacer;
