use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("device unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("timed out after {seconds}s waiting for {stage}")]
    Timeout { stage: &'static str, seconds: u64 },
    #[error("unable to classify waste: {0}")]
    ClassificationAmbiguous(String),
    #[error("invalid item weight: {0}")]
    InvalidMeasurement(f64),
    #[error("failed to persist record: {0}")]
    Persistence(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
