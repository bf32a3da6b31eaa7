use std::path::PathBuf;
use thiserror::Error;

/// Why a config stack could not be turned into a `MemedashConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// `origin` is a file path, or `<inline>` for in-memory contents.
    #[error("{origin} is not valid JSON5: {source}")]
    Syntax {
        origin: String,
        #[source]
        source: json5::Error,
    },
    /// The merged layers passed the schema check but not the typed model.
    #[error("config does not match the model: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid config at {path}: {message}")]
    InvalidField { path: String, message: String },
    #[error("invalid environment override {name}: {message}")]
    InvalidEnv { name: String, message: String },
}
