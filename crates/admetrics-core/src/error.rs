// crates/admetrics-core/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{file} line {line_index}: cannot parse date '{value}'")]
    MalformedDate {
        file: String,
        line_index: usize,
        value: String,
    },

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Data processing error: {0}")]
    Processing(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
