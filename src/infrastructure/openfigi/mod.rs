pub mod client;

pub use client::OpenFigiClient;
