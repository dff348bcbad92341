use crate::flight::FlightId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Raw flight data missing or unreadable. Fatal to the whole engine.
    #[error("flight data source unavailable: {0}")]
    SourceUnavailable(String),

    /// Prediction capability not initialized. Fatal to prediction and
    /// optimization calls; cascade detection does not need the model.
    #[error("delay model not initialized")]
    ModelUnavailable,

    #[error("no flight record matches id {0}")]
    NotFound(FlightId),

    #[error("hour {0} outside valid range 0-23")]
    InvalidHour(u32),
}

impl EngineError {
    pub fn source_unavailable(err: impl std::fmt::Display) -> Self {
        EngineError::SourceUnavailable(err.to_string())
    }
}
