use std::path::PathBuf;

use thiserror::Error;

/// Errors raised at the I/O edges of the pipeline.
///
/// The extraction core (templates, readable length, identifier harvesting)
/// never produces these; it degrades to empty or zero results instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed bundle record on line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse config YAML {path:?}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
