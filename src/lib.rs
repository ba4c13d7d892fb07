/// YouTube Stat - Rust Implementation
///
/// Crawls a channel's public video metadata, annotates titles with
/// morphological analysis and compiles a one-hot feature matrix for
/// downstream regression.

pub mod artifacts;
pub mod config;
pub mod crawler;
pub mod data;
pub mod http;
pub mod parser;
pub mod processing;

use std::path::PathBuf;

// Re-export main types for easy access
pub use crate::artifacts::{ArtifactStore, WorkdirLock};
pub use crate::config::{Config, ConfigBuilder};
pub use crate::crawler::{Crawler, ListItem, RawVideoItem, YouTubeClient};
pub use crate::data::{CanonicalRecord, DatasetBuilder, FeatureEncoder, FeatureMatrix, FeatureSchema, Vocabulary, VocabularyBuilder};
pub use crate::http::{FetchClient, ReqwestTransport, Transport};
pub use crate::parser::{ParsedWord, WordParser, YahooParser};
pub use crate::processing::Pipeline;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Error types for pipeline operations
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("request to {url} failed with status {status}: {body}")]
    FatalRequest { url: String, status: u16, body: String },

    #[error("transient network error for {url}: {message}")]
    TransientNetwork {
        url: String,
        status: Option<u16>,
        message: String,
    },

    #[error("missing precondition: {0}")]
    MissingPrecondition(String),

    #[error("malformed record {id}: {reason}")]
    MalformedRecord { id: String, reason: String },

    #[error("artifact not found: {}", .0.display())]
    ArtifactNotFound(PathBuf),

    #[error("invalid artifact {}: {reason}", .path.display())]
    InvalidArtifact { path: PathBuf, reason: String },

    #[error("working directory is locked by another run: {}", .0.display())]
    Locked(PathBuf),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl PipelineError {
    /// Whether the fetch client may retry after this error
    pub fn is_transient(&self) -> bool {
        matches!(self, PipelineError::TransientNetwork { .. })
    }
}
