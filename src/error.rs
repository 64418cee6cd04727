use std::time::Duration;
use thiserror::Error;

/// Failures of a single recognition pass.
///
/// Non-finite values inside the spectrogram are not errors; the shaper zeroes
/// them.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("audio has {got} samples, at least {need} are required for one frame")]
    InsufficientSamples { got: usize, need: usize },

    #[error("classifier unavailable: {0}")]
    ModelUnavailable(String),

    #[error("cannot pick a top label from {got} scores (vocabulary has {expected})")]
    EmptyScoreSet { got: usize, expected: usize },

    #[error("failed to decode audio payload: {0}")]
    Decoding(String),

    #[error("recognition did not finish within {0:?}")]
    Timeout(Duration),

    #[error("recognition worker failed: {0}")]
    Worker(String),

    #[error("tensor shape error: {0}")]
    Shape(String),
}

impl From<base64::DecodeError> for PipelineError {
    fn from(err: base64::DecodeError) -> Self {
        PipelineError::Decoding(format!("invalid base64: {err}"))
    }
}

impl From<ndarray::ShapeError> for PipelineError {
    fn from(err: ndarray::ShapeError) -> Self {
        PipelineError::Shape(err.to_string())
    }
}
