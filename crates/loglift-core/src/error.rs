/// Error types for loglift operations
#[derive(thiserror::Error, Debug)]
pub enum LogliftError {
    /// Rewriting kept changing the unit after the cycle budget ran out
    #[error("Rewrite of {unit} did not converge after {cycles} cycles")]
    NonConvergence { unit: String, cycles: usize },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown logging framework: {0}")]
    UnknownFramework(String),

    #[error("Unknown severity: {0}")]
    UnknownSeverity(String),

    #[error("Unknown rule: {0}")]
    UnknownRule(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for loglift operations
pub type Result<T> = std::result::Result<T, LogliftError>;
