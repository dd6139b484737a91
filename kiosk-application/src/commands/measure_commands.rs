use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use kiosk_domain::ports::ScaleLink;
use kiosk_domain::{match_reading, LineMatch, ReadingKind, SerialCommand};

use crate::{AppError, AppState};

pub async fn measure_base_weight(state: &AppState) -> Result<f64, AppError> {
    let _guard = state.device_lock.lock().await;
    measure_base_weight_locked(state).await
}

pub(crate) async fn measure_base_weight_locked(state: &AppState) -> Result<f64, AppError> {
    let scale = state.require_scale()?;
    send(scale.as_ref(), SerialCommand::Base).await?;
    let weight = read_reading(
        state,
        scale.as_ref(),
        ReadingKind::BaseWeight,
        state.config.base_weight_timeout_seconds,
    )
    .await?;
    state.metrics.record_base_measurement();
    info!("base weight: {} g", weight);
    Ok(weight)
}

pub(crate) async fn send(scale: &dyn ScaleLink, command: SerialCommand) -> Result<(), AppError> {
    scale.send_command(command).await.map_err(|err| {
        error!("failed to send {} to board: {}", command, err);
        AppError::DeviceUnavailable(format!("serial write failed: {}", err))
    })
}

pub(crate) async fn read_reading(
    state: &AppState,
    scale: &dyn ScaleLink,
    kind: ReadingKind,
    seconds: u64,
) -> Result<f64, AppError> {
    let reading = wait_for_reading(scale, kind, Duration::from_secs(seconds))
        .await
        .map_err(|err| {
            error!("serial read failed while waiting for {}: {}", kind.prefix(), err);
            AppError::DeviceUnavailable(format!("serial read failed: {}", err))
        })?;
    match reading {
        Some(value) => Ok(value),
        None => {
            state.metrics.record_serial_timeout();
            error!("no {} reading within {}s", kind.prefix(), seconds);
            Err(AppError::Timeout {
                stage: kind.stage(),
                seconds,
            })
        }
    }
}

/// Reads lines until one carries `kind`'s prefix or `timeout` elapses.
///
/// Empty and foreign lines are skipped; a prefixed line whose value does not
/// parse is logged and skipped too. `Ok(None)` means the deadline passed.
pub async fn wait_for_reading(
    scale: &dyn ScaleLink,
    kind: ReadingKind,
    timeout: Duration,
) -> anyhow::Result<Option<f64>> {
    let deadline = Instant::now() + timeout;
    loop {
        if Instant::now() >= deadline {
            return Ok(None);
        }
        let line = match tokio::time::timeout_at(deadline, scale.read_line()).await {
            Ok(line) => line?,
            Err(_) => return Ok(None),
        };
        let Some(line) = line else {
            continue;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        debug!("board: {}", line);
        match match_reading(line, kind) {
            LineMatch::Value(value) => return Ok(Some(value)),
            LineMatch::Malformed => warn!("ignoring malformed {} line: {:?}", kind.prefix(), line),
            LineMatch::Ignored => {}
        }
    }
}
