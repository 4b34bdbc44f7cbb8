use thiserror::Error;

use crate::seeker::TargetKind;

#[derive(Error, Debug)]
pub enum ScrapediaError {
    #[error("the page at {url} could not be reached: {source}")]
    Connection {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("the page at {path} answered with status {status}")]
    Fetch { status: u16, path: String },

    #[error("the expected {kind} data could not be found: {context}")]
    NotFound { kind: TargetKind, context: String },

    #[error("the {kind} raw data could not be parsed: {detail}")]
    Parse { kind: TargetKind, detail: String },

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ScrapediaError>;
