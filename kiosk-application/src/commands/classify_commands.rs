use std::path::PathBuf;

use tracing::{error, info, warn};

use kiosk_domain::{parse_reply, CapturedImage, Classification, WasteCategory};

use crate::{AppError, AppState};

/// Classifies the image left at the configured capture path.
pub async fn classify_capture(state: &AppState) -> Result<Classification, AppError> {
    let path = PathBuf::from(&state.config.image_path);
    let bytes = tokio::fs::read(&path).await.map_err(|err| {
        AppError::BadRequest(format!("no captured image at {}: {}", path.display(), err))
    })?;
    classify_image(state, &CapturedImage { path, bytes }).await
}

pub async fn classify_image(
    state: &AppState,
    image: &CapturedImage,
) -> Result<Classification, AppError> {
    let reply = state.classifier.describe(image).await.map_err(|err| {
        error!("vision classification failed: {:#}", err);
        AppError::Internal(err.context("vision classification failed"))
    })?;
    let classification = parse_reply(&reply);
    state.metrics.record_classification(classification.label);
    info!(
        "classifier reply {:?} -> {}",
        reply.trim(),
        classification.label.as_str()
    );
    Ok(classification)
}

/// UNKNOWN ends the run before anything is sent to the sorter.
pub fn require_category(classification: &Classification) -> Result<WasteCategory, AppError> {
    classification.label.category().ok_or_else(|| {
        warn!("unable to classify waste from reply {:?}", classification.reply);
        AppError::ClassificationAmbiguous(classification.reply.trim().to_string())
    })
}
