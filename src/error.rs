use thiserror::Error;

/// Errors raised by the sampling and rendering pipeline.
#[derive(Debug, Error)]
pub enum ScopeError {
    #[error("ring buffer capacity must be at least 1")]
    InvalidCapacity,

    #[error("telemetry source has no snapshot")]
    SourceUnavailable,

    #[error("drawing surface is no longer available")]
    SurfaceUnavailable,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed telemetry: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ScopeError {
    /// Errors that only mean "skip this tick", not that something broke.
    pub fn is_transient(&self) -> bool {
        matches!(self, ScopeError::SourceUnavailable | ScopeError::SurfaceUnavailable)
    }
}
