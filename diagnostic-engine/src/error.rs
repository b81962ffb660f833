use thiserror::Error;

/// The only failure the engine raises: a reading whose numeric fields cannot be
/// evaluated. Never retried; the caller decides whether the batch halts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("invalid reading '{reading_id}': {reason}")]
    InvalidReading { reading_id: String, reason: String },
}

impl EngineError {
    pub fn invalid(reading_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidReading {
            reading_id: reading_id.into(),
            reason: reason.into(),
        }
    }

    pub fn reading_id(&self) -> &str {
        match self {
            Self::InvalidReading { reading_id, .. } => reading_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown region '{0}'")]
pub struct ParseRegionError(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("condition tag must not be empty")]
pub struct ParseConditionError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be a finite, non-negative threshold (got {value})")]
    InvalidThreshold { field: String, value: f64 },
    #[error("extra rule '{0}' has an empty label")]
    MissingLabel(String),
}
