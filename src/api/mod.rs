pub mod client;
pub mod parser;
pub mod poller;

pub use client::ApiClient;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {code}: {body}")]
    Status { code: u16, body: String },

    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),
}
