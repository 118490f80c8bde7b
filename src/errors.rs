//! Error types for nextword
//!
//! This module defines the error types used throughout the library.
//! Not-found and degenerate-fit conditions are deliberately *not* errors:
//! lookups return `Option`, probabilities fall back to 0.0, and fit validity
//! is a reported flag. Errors are reserved for I/O, corrupt files, and
//! invalid configuration.

use thiserror::Error;

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, NextwordError>;

/// Main error type for nextword
#[derive(Error, Debug, Clone)]
pub enum NextwordError {
    /// Underlying I/O failure (file open, read, write)
    #[error("I/O error: {message}")]
    Io { message: String },

    /// A persisted index or model file failed structural validation
    #[error("Corrupt file {path}: {message}")]
    CorruptFile { path: String, message: String },

    /// The requested word is not indexed in the dictionary
    #[error("Word not found: {word}")]
    WordNotFound { word: String },

    /// The word has no precursor examples to train on
    #[error("No training data for word: {word}")]
    NoTrainingData { word: String },

    /// The word's weights are populated neither in memory nor on disk
    #[error("Model not fitted for word: {word}")]
    ModelNotFitted { word: String },

    /// Configuration validation failed
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl NextwordError {
    /// Create a corrupt-file error
    pub fn corrupt_file(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CorruptFile {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a word-not-found error
    pub fn word_not_found(word: impl Into<String>) -> Self {
        Self::WordNotFound { word: word.into() }
    }

    /// Create a no-training-data error
    pub fn no_training_data(word: impl Into<String>) -> Self {
        Self::NoTrainingData { word: word.into() }
    }

    /// Create a model-not-fitted error
    pub fn model_not_fitted(word: impl Into<String>) -> Self {
        Self::ModelNotFitted { word: word.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Check if this error wraps an underlying I/O failure
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

impl From<std::io::Error> for NextwordError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for NextwordError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}
