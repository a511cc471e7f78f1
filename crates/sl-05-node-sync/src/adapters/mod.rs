//! Adapters for node synchronization

pub mod http;

pub use http::HttpPeerClient;
