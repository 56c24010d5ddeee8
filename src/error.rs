// src/error.rs

use thiserror::Error;

/// Common result type for classification operations
pub type Result<T> = std::result::Result<T, ClassifyError>;

#[derive(Debug, Error)]
pub enum ClassifyError {
    /// Tolerance ranges, sampling density or other settings are unusable
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A required column is missing or non-numeric
    #[error("Data error at row {row}: {message}")]
    Data { row: usize, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ClassifyError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn data(row: usize, message: impl Into<String>) -> Self {
        Self::Data {
            row,
            message: message.into(),
        }
    }
}
