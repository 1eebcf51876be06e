//! Error types for the meetwise domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all meetwise operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Model client errors ---
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    // --- Memory errors ---
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    // --- Integration errors ---
    #[error("Integration error: {0}")]
    Integration(#[from] IntegrationError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Transport-level failures as seen by an HTTP provider.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),
}

/// Failures of the external model client.
///
/// The context subsystem treats all three identically: degrade to an empty result.
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    #[error("model unavailable: {0}")]
    Unavailable(String),

    #[error("model call timed out after {0}s")]
    Timeout(u64),

    #[error("malformed model response: {0}")]
    MalformedResponse(String),
}

impl From<ProviderError> for ModelError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::MalformedResponse(msg) => ModelError::MalformedResponse(msg),
            other => ModelError::Unavailable(other.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

#[derive(Debug, Error)]
pub enum IntegrationError {
    #[error("Integration not configured: {0}")]
    NotConfigured(String),

    #[error("Integration request failed: {source_name}: {reason}")]
    RequestFailed { source_name: String, reason: String },

    #[error("Meeting not found: {0}")]
    MeetingNotFound(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Generation failed for {tool_name}: {source}")]
    GenerationFailed {
        tool_name: String,
        #[source]
        source: ModelError,
    },

    #[error("Insufficient context to run {0}")]
    InsufficientContext(String),

    #[error("Invalid tool input: {0}")]
    InvalidInput(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn provider_timeout_maps_to_unavailable() {
        let err: ModelError = ProviderError::Network("connection reset".into()).into();
        assert!(matches!(err, ModelError::Unavailable(_)));
    }

    #[test]
    fn provider_malformed_maps_to_malformed() {
        let err: ModelError = ProviderError::MalformedResponse("no choices".into()).into();
        assert!(matches!(err, ModelError::MalformedResponse(_)));
    }

    #[test]
    fn tool_error_carries_model_cause() {
        let err = Error::Tool(ToolError::GenerationFailed {
            tool_name: "summarization".into(),
            source: ModelError::Timeout(60),
        });
        assert!(err.to_string().contains("summarization"));
        assert!(err.to_string().contains("60"));
    }
}
