use std::future::Future;

use tracing::{info, warn};

use kiosk_domain::ports::CaptureTrigger;
use kiosk_domain::{Classification, IssuedReward, SerialCommand};

use crate::commands::capture_commands::capture_image_locked;
use crate::commands::classify_commands::{classify_image, require_category};
use crate::commands::measure_commands::{measure_base_weight_locked, send};
use crate::commands::reward_commands::{issue_reward, sort_and_weigh_locked};
use crate::{AppError, AppState};

#[derive(Debug)]
pub struct CycleReport {
    pub base_weight: f64,
    pub classification: Classification,
    pub reward: IssuedReward,
}

#[derive(Debug)]
pub enum CycleOutcome {
    Completed(CycleReport),
    Cancelled,
}

#[derive(Debug)]
pub enum SortOutcome {
    Sorted(Classification),
    Cancelled,
}

/// One full kiosk cycle: tare, capture, classify, sort, weigh, reward.
///
/// The devices stay locked for the whole cycle. Any failure before the
/// record is written leaves no record and no QR artifact behind.
pub async fn run_cycle(
    state: &AppState,
    trigger: &dyn CaptureTrigger,
) -> Result<CycleOutcome, AppError> {
    let _guard = state.device_lock.lock().await;

    let base_weight = measure_base_weight_locked(state).await?;

    let Some(image) = capture_image_locked(state, trigger).await? else {
        return Ok(CycleOutcome::Cancelled);
    };

    let classification = classify_image(state, &image).await?;
    let category = require_category(&classification)?;

    let weight = sort_and_weigh_locked(state, category).await?;
    let reward = issue_reward(state, category, weight).await?;

    Ok(CycleOutcome::Completed(CycleReport {
        base_weight,
        classification,
        reward,
    }))
}

/// Capture, classify and drive the servo until `stop` resolves, then park it.
/// Nothing is weighed or recorded.
pub async fn run_sort_only<F>(
    state: &AppState,
    trigger: &dyn CaptureTrigger,
    stop: F,
) -> Result<SortOutcome, AppError>
where
    F: Future<Output = anyhow::Result<()>> + Send,
{
    let _guard = state.device_lock.lock().await;
    let scale = state.require_scale()?;

    let Some(image) = capture_image_locked(state, trigger).await? else {
        return Ok(SortOutcome::Cancelled);
    };
    let classification = classify_image(state, &image).await?;
    let category = require_category(&classification)?;

    send(scale.as_ref(), SerialCommand::Sort(category)).await?;
    info!("servo active for {} waste", category);

    let stopped = stop.await;
    if let Err(err) = &stopped {
        warn!("stop signal failed: {}", err);
    }
    send(scale.as_ref(), SerialCommand::Stop).await?;
    info!("servo stopped");
    stopped?;

    Ok(SortOutcome::Sorted(classification))
}
