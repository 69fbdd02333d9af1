//! Error handling for embedding search and experiment sweeps

use thiserror::Error;

/// Result type for crate operations
pub type Result<T> = core::result::Result<T, RcmError>;

/// Error types shared by the search and sweep tools
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RcmError {
    /// Problem or embedding file parsing errors
    #[error("Parse error: {message} at line {line}")]
    ParseError { message: String, line: usize },

    /// Invalid CLI arguments or configuration file contents
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The embedding-size search ran past its ceiling
    #[error("No embedding could be found for Chimera sizes {min_size}..={max_size}")]
    SearchExhausted { min_size: usize, max_size: usize },

    /// Problem has no nonzero quadratic interactions
    #[error("Degenerate model: {0}")]
    DegenerateModel(String),

    /// Embedding does not fit the problem or target topology
    #[error("Embedding error: {0}")]
    EmbeddingError(String),

    /// Sampler could not produce a sample set
    #[error("Sampler error: {0}")]
    SamplerError(String),

    /// Topology-related errors
    #[error("Topology error: {0}")]
    TopologyError(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(String),

    /// Result (de)serialization failures
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl RcmError {
    /// Create a parse error
    pub fn parse_error(message: impl Into<String>, line: usize) -> Self {
        Self::ParseError {
            message: message.into(),
            line,
        }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Create a degenerate-model error
    pub fn degenerate_model(message: impl Into<String>) -> Self {
        Self::DegenerateModel(message.into())
    }

    /// Create an embedding error
    pub fn embedding_error(message: impl Into<String>) -> Self {
        Self::EmbeddingError(message.into())
    }

    /// Create a sampler error
    pub fn sampler_error(message: impl Into<String>) -> Self {
        Self::SamplerError(message.into())
    }

    /// Create a topology error
    pub fn topology_error(message: impl Into<String>) -> Self {
        Self::TopologyError(message.into())
    }

    /// Create a serialization error
    pub fn serialization_error(message: impl Into<String>) -> Self {
        Self::SerializationError(message.into())
    }

    /// Whether the error was raised before any external call was made
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::ConfigError(_))
    }
}

impl From<std::io::Error> for RcmError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for RcmError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for RcmError {
    fn from(err: serde_yaml::Error) -> Self {
        // Malformed YAML and missing or unknown fields are all schema failures.
        Self::ConfigError(err.to_string())
    }
}

impl From<csv::Error> for RcmError {
    fn from(err: csv::Error) -> Self {
        Self::IoError(err.to_string())
    }
}

impl From<tempfile::PersistError> for RcmError {
    fn from(err: tempfile::PersistError) -> Self {
        Self::IoError(err.error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = RcmError::parse_error("expected bias", 3);
        assert_eq!(err.to_string(), "Parse error: expected bias at line 3");
    }

    #[test]
    fn test_search_exhausted_message() {
        let err = RcmError::SearchExhausted { min_size: 2, max_size: 4 };
        assert!(err.to_string().contains("2..=4"));
    }

    #[test]
    fn test_config_classification() {
        assert!(RcmError::config_error("min-size > max-size").is_config_error());
        assert!(!RcmError::sampler_error("offline").is_config_error());
    }
}
