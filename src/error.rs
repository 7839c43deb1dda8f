use thiserror::Error;

/// Main error type for ChemKG
#[derive(Error, Debug)]
pub enum ChemkgError {
    /// Rejected before any query is sent (empty sets, zero step bound, bad IRI)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Any failure reported by the SPARQL endpoint or the transport to it.
    /// Carries the engine's message verbatim; never retried locally.
    #[error("Engine query failed: {0}")]
    EngineQueryFailed(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or malformed bindings in a result set
    #[error("Parse error: {0}")]
    Parse(String),

    /// JSON (de)serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ChemkgError {
    /// Short machine-readable name, used in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            ChemkgError::InvalidArgument(_) => "invalid_argument",
            ChemkgError::EngineQueryFailed(_) => "engine_query_failed",
            ChemkgError::Config(_) => "config",
            ChemkgError::Io(_) => "io",
            ChemkgError::Parse(_) => "parse",
            ChemkgError::Json(_) => "json",
        }
    }
}

/// Convenient Result type using ChemkgError
pub type Result<T> = std::result::Result<T, ChemkgError>;
