use tracing::{error, info, warn};

use kiosk_domain::ports::StoreError;
use kiosk_domain::{
    compute_amount, IssuedReward, ReadingKind, RecordId, RedeemableRecord, SerialCommand,
    WasteCategory,
};

use crate::commands::measure_commands::{read_reading, send};
use crate::{AppError, AppState};

pub fn parse_category(raw: &str) -> Result<WasteCategory, AppError> {
    raw.parse::<WasteCategory>()
        .map_err(|err| AppError::BadRequest(err.to_string()))
}

/// Sorts the item on the tray, weighs it and issues the reward record.
pub async fn process_waste(
    state: &AppState,
    category: WasteCategory,
) -> Result<IssuedReward, AppError> {
    let weight = {
        let _guard = state.device_lock.lock().await;
        sort_and_weigh_locked(state, category).await?
    };
    issue_reward(state, category, weight).await
}

pub(crate) async fn sort_and_weigh_locked(
    state: &AppState,
    category: WasteCategory,
) -> Result<f64, AppError> {
    let scale = state.require_scale()?;
    info!("sorting {} waste", category);
    send(scale.as_ref(), SerialCommand::Sort(category)).await?;
    let weight = read_reading(
        state,
        scale.as_ref(),
        ReadingKind::ItemWeight,
        state.config.item_weight_timeout_seconds,
    )
    .await?;
    if weight <= 0.0 {
        state.metrics.record_invalid_measurement();
        error!("invalid item weight: {} g", weight);
        return Err(AppError::InvalidMeasurement(weight));
    }
    info!("item weight: {} g", weight);
    Ok(weight)
}

/// Operator-entered category and weight; no devices involved.
pub async fn issue_manual_reward(
    state: &AppState,
    waste_type: &str,
    weight: f64,
) -> Result<IssuedReward, AppError> {
    let category = parse_category(waste_type)?;
    if !weight.is_finite() || weight <= 0.0 {
        return Err(AppError::BadRequest(
            "weight must be a positive number of grams".to_string(),
        ));
    }
    issue_reward(state, category, weight).await
}

/// Prices the item, writes the record and renders its QR code.
///
/// The QR artifact is only produced once the store accepted the record.
pub async fn issue_reward(
    state: &AppState,
    category: WasteCategory,
    weight: f64,
) -> Result<IssuedReward, AppError> {
    let amount = compute_amount(weight, category, &state.config.rates);
    let record = RedeemableRecord::unclaimed(category, weight, amount);
    let id = persist_record(state, &record).await?;

    let qr = state.qr_renderer.render(&id).await.map_err(|err| {
        error!("record {} stored but its QR code failed to render: {:#}", id, err);
        AppError::Internal(err.context(format!(
            "record {} stored but its QR code could not be rendered",
            id
        )))
    })?;

    state.metrics.record_issued();
    info!("issued {} for {} g {} waste, amount {:.2}", id, weight, category, amount);
    Ok(IssuedReward {
        id,
        waste_type: category,
        weight,
        amount,
        qr,
    })
}

async fn persist_record(state: &AppState, record: &RedeemableRecord) -> Result<RecordId, AppError> {
    let attempts = state.config.id_attempts.max(1);
    for attempt in 1..=attempts {
        let id = RecordId::generate();
        match state.record_repo.create_record(&id, record).await {
            Ok(()) => return Ok(id),
            Err(StoreError::Conflict(taken)) => {
                warn!("identifier {} already taken (attempt {}/{})", taken, attempt, attempts);
            }
            Err(StoreError::Backend(err)) => {
                state.metrics.record_persistence_failure();
                error!("record write failed: {:#}", err);
                return Err(AppError::Persistence(err.to_string()));
            }
        }
    }
    state.metrics.record_persistence_failure();
    Err(AppError::Persistence(format!(
        "no free identifier after {} attempts",
        attempts
    )))
}
