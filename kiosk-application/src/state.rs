use std::sync::Arc;

use kiosk_domain::ports::{Camera, QrRenderer, RecordRepository, ScaleLink, VisionClassifier};
use kiosk_domain::RuntimeConfig;
use tokio::sync::Mutex;

use crate::{AppError, Metrics};

#[derive(Clone)]
pub struct AppState {
    pub config: RuntimeConfig,
    /// `None` when the board could not be opened at startup.
    pub scale: Option<Arc<dyn ScaleLink>>,
    pub camera: Arc<dyn Camera>,
    pub classifier: Arc<dyn VisionClassifier>,
    pub record_repo: Arc<dyn RecordRepository>,
    pub qr_renderer: Arc<dyn QrRenderer>,
    pub metrics: Arc<Metrics>,
    /// Held by every stage that talks to the board or the camera.
    pub device_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn require_scale(&self) -> Result<Arc<dyn ScaleLink>, AppError> {
        self.scale
            .clone()
            .ok_or_else(|| AppError::DeviceUnavailable("sorter board not connected".to_string()))
    }
}
