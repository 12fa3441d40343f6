use std::fmt;

use thiserror::Error;

/// One failed attempt against a candidate model, kept for the final error.
#[derive(Debug, Clone)]
pub struct ModelAttempt {
    pub model: String,
    pub message: String,
}

impl ModelAttempt {
    pub fn new(model: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ModelAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.model, self.message)
    }
}

#[derive(Debug, Error)]
pub enum InsightsError {
    #[error("no text-generation credentials found in the environment")]
    MissingCredentials,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model {model} returned an empty response")]
    EmptyResponse { model: String },

    #[error("no candidate model produced a response; attempts: {attempts:?}")]
    NoUsableModel { attempts: Vec<ModelAttempt> },

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("summary computation error: {0}")]
    Summary(String),
}

pub type Result<T> = std::result::Result<T, InsightsError>;
