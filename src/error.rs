/// Unified error types for ENS Attest
use thiserror::Error;

/// Main error type for name resolution and credential lookup
#[derive(Error, Debug)]
pub enum AttestError {
    /// Input is not a valid registry name
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// Registry or presentation service call failed
    #[error("Network error: {0}")]
    Network(String),

    /// Malformed record content or response payload
    #[error("Parse error: {0}")]
    Parse(String),

    /// Call succeeded but returned no usable data
    #[error("No usable data: {0}")]
    SoftFailure(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for attest operations
pub type AttestResult<T> = Result<T, AttestError>;
