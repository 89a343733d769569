//! Error types for the financial voice summarizer

use thiserror::Error;

/// Result type alias for summarizer operations
pub type Result<T> = std::result::Result<T, VoiceAgentError>;

#[derive(Error, Debug)]
pub enum VoiceAgentError {
    // =============================
    // Pipeline Errors
    // =============================

    /// Ledger store unreachable or the monthly query failed.
    #[error("Ledger data unavailable: {0}")]
    DataUnavailable(String),

    /// Script generator unreachable, errored, or returned nothing usable.
    #[error("Script generation failed: {0}")]
    GenerationFailure(String),

    /// Speech synthesizer errored. Terminal for the run.
    #[error("Speech synthesis failed: {0}")]
    SynthesisFailure(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),
}
