use std::path::Path;

use async_trait::async_trait;
use tracing::{error, info};

use kiosk_domain::ports::CaptureTrigger;
use kiosk_domain::{CapturedImage, TriggerSignal};

use crate::{AppError, AppState};

/// Trigger that fires as soon as it is awaited; the HTTP request itself is
/// the capture signal.
pub struct ImmediateTrigger;

#[async_trait]
impl CaptureTrigger for ImmediateTrigger {
    async fn wait(&self) -> anyhow::Result<TriggerSignal> {
        Ok(TriggerSignal::Capture)
    }

    fn wants_preview(&self) -> bool {
        false
    }
}

/// Returns `None` when the operator cancelled.
pub async fn capture_image(
    state: &AppState,
    trigger: &dyn CaptureTrigger,
) -> Result<Option<CapturedImage>, AppError> {
    let _guard = state.device_lock.lock().await;
    capture_image_locked(state, trigger).await
}

pub(crate) async fn capture_image_locked(
    state: &AppState,
    trigger: &dyn CaptureTrigger,
) -> Result<Option<CapturedImage>, AppError> {
    if trigger.wants_preview() {
        state.camera.start_preview().await.map_err(|err| {
            error!("camera not accessible: {}", err);
            AppError::DeviceUnavailable(format!("camera: {}", err))
        })?;
    } else if !state.camera.probe().await {
        error!("camera not accessible");
        return Err(AppError::DeviceUnavailable("camera: device not found".to_string()));
    }

    let signal = trigger.wait().await;
    state.camera.stop_preview().await;

    match signal? {
        TriggerSignal::Cancel => {
            info!("capture cancelled");
            Ok(None)
        }
        TriggerSignal::Capture => {
            let path = Path::new(&state.config.image_path);
            let image = state.camera.capture_still(path).await.map_err(|err| {
                error!("frame capture failed: {}", err);
                AppError::DeviceUnavailable(format!("camera: {}", err))
            })?;
            state.metrics.record_capture();
            info!("image captured to {}", image.path.display());
            Ok(Some(image))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FixedTrigger, TestRig};

    #[tokio::test]
    async fn capture_persists_one_frame_and_closes_preview() {
        let rig = TestRig::new();
        let image = capture_image(&rig.state(), &ImmediateTrigger)
            .await
            .expect("capture")
            .expect("image");
        assert_eq!(image.path, Path::new("captured.jpg"));
        assert_eq!(rig.camera.stills(), 1);
        assert!(!rig.camera.preview_open());
    }

    #[tokio::test]
    async fn cancel_yields_no_image() {
        let rig = TestRig::new();
        let image = capture_image(&rig.state(), &FixedTrigger(TriggerSignal::Cancel))
            .await
            .expect("capture");
        assert!(image.is_none());
        assert_eq!(rig.camera.stills(), 0);
        assert!(!rig.camera.preview_open());
    }

    #[tokio::test]
    async fn immediate_capture_skips_the_preview() {
        let rig = TestRig::new().preview_broken();
        let image = capture_image(&rig.state(), &ImmediateTrigger)
            .await
            .expect("capture")
            .expect("image");
        assert_eq!(image.bytes, b"jpeg-bytes".to_vec());
        assert_eq!(rig.camera.stills(), 1);
    }

    #[tokio::test]
    async fn broken_preview_fails_operator_capture() {
        let rig = TestRig::new().preview_broken();
        let err = capture_image(&rig.state(), &FixedTrigger(TriggerSignal::Capture))
            .await
            .expect_err("preview down");
        assert!(matches!(err, AppError::DeviceUnavailable(_)));
        assert_eq!(rig.camera.stills(), 0);
    }

    #[tokio::test]
    async fn unavailable_camera_is_terminal() {
        let rig = TestRig::new().camera_unavailable();
        let err = capture_image(&rig.state(), &ImmediateTrigger)
            .await
            .expect_err("camera down");
        assert!(matches!(err, AppError::DeviceUnavailable(_)));
    }
}
