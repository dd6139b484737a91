use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Serialize;

use kiosk_application::commands::capture_commands::{self, ImmediateTrigger};
use kiosk_application::commands::{classify_commands, measure_commands, reward_commands};
use kiosk_application::queries::status_queries;
use kiosk_application::AppState;
use kiosk_domain::{
    Classification, DeviceStatus, IssuedReward, ManualRewardPayload, ProcessWastePayload,
};

use crate::error::HttpError;
use crate::middleware::authorize;

#[derive(Debug, Serialize)]
pub struct WeightResponse {
    pub weight: f64,
}

#[derive(Debug, Serialize)]
pub struct CaptureResponse {
    pub image: String,
}

#[derive(Debug, Serialize)]
pub struct ClassifyResponse {
    /// `<subcategory>, <main-category>`, or the model's own words when undecided.
    pub category: String,
    #[serde(rename = "type")]
    pub label: String,
    pub subcategory: Option<String>,
}

impl From<Classification> for ClassifyResponse {
    fn from(classification: Classification) -> Self {
        Self {
            category: classification.summary(),
            label: classification.label.as_str().to_string(),
            subcategory: classification.subcategory,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RewardResponse {
    pub id: String,
    pub waste_type: String,
    pub weight: f64,
    pub amount: f64,
    pub claimed: bool,
    /// Base64 PNG.
    pub qr_code: String,
}

impl From<IssuedReward> for RewardResponse {
    fn from(reward: IssuedReward) -> Self {
        Self {
            id: reward.id.to_string(),
            waste_type: reward.waste_type.as_record_str().to_string(),
            weight: reward.weight,
            amount: reward.amount,
            claimed: false,
            qr_code: BASE64.encode(&reward.qr.png),
        }
    }
}

pub async fn get_status(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<DeviceStatus>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    Ok(Json(status_queries::device_status(&state).await))
}

pub async fn measure_base(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<WeightResponse>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let weight = measure_commands::measure_base_weight(&state).await?;
    Ok(Json(WeightResponse { weight }))
}

pub async fn capture(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CaptureResponse>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let image = capture_commands::capture_image(&state, &ImmediateTrigger)
        .await?
        .ok_or_else(|| HttpError::BadRequest("capture cancelled".to_string()))?;
    Ok(Json(CaptureResponse {
        image: BASE64.encode(&image.bytes),
    }))
}

pub async fn classify(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ClassifyResponse>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let classification = classify_commands::classify_capture(&state).await?;
    Ok(Json(classification.into()))
}

pub async fn process_waste(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ProcessWastePayload>,
) -> Result<Json<RewardResponse>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let category = reward_commands::parse_category(&payload.waste_type)?;
    let reward = reward_commands::process_waste(&state, category).await?;
    Ok(Json(reward.into()))
}

pub async fn manual_reward(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ManualRewardPayload>,
) -> Result<Json<RewardResponse>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let reward =
        reward_commands::issue_manual_reward(&state, &payload.waste_type, payload.weight).await?;
    Ok(Json(reward.into()))
}

#[cfg(test)]
mod tests {
    use kiosk_domain::WasteLabel;

    use super::*;

    #[test]
    fn structured_reply_is_summarised_for_clients() {
        let response = ClassifyResponse::from(Classification {
            label: WasteLabel::Wet,
            subcategory: Some("organic".to_string()),
            reply: r#"{"subcategory": "organic", "category": "wet-waste"}"#.to_string(),
        });

        assert_eq!(response.category, "organic, wet-waste");
        assert_eq!(response.label, "WET");
        assert_eq!(response.subcategory.as_deref(), Some("organic"));
    }

    #[test]
    fn undecided_reply_keeps_model_words() {
        let response = ClassifyResponse::from(Classification {
            label: WasteLabel::Unknown,
            subcategory: None,
            reply: "a blurry shoe\n".to_string(),
        });

        assert_eq!(response.category, "a blurry shoe");
        assert_eq!(response.label, "UNKNOWN");
    }
}
