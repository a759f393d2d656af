use std::io;
use std::path::PathBuf;

use polars::prelude::PolarsError;
use thiserror::Error;

/// Error type for loading, cleaning, aggregating and rendering the movie table.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("cannot read movie table from '{}': {reason}", path.display())]
    DataAccess { path: PathBuf, reason: String },
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("aggregate undefined for '{subject}': {reason}")]
    UndefinedAggregate {
        subject: String,
        reason: &'static str,
    },
    #[error("failed to render chart '{}': {source}", path.display())]
    Render {
        path: PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error(transparent)]
    Polars(#[from] PolarsError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("invalid configuration file: {0}")]
    Toml(#[from] toml::de::Error),
}

impl AnalysisError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn undefined(subject: impl Into<String>, reason: &'static str) -> Self {
        Self::UndefinedAggregate {
            subject: subject.into(),
            reason,
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
