use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use tokio::sync::Mutex;
use tracing::{info, warn};

use kiosk_application::{AppState, Metrics};
use kiosk_domain::ports::{RecordRepository, ScaleLink};
use kiosk_infrastructure::{
    AppConfig, FfmpegCamera, FirestoreRecordRepository, GeminiClassifier,
    JsonFileRecordRepository, PngQrRenderer, RecordStoreKind, SerialScaleLink,
};

/// How the sorter board is treated at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleMode {
    /// Opening the port must succeed.
    Required,
    /// A failure is logged and the state carries no scale.
    Optional,
    /// The port is never opened.
    Disabled,
}

pub struct AppContext {
    pub state: AppState,
}

impl AppContext {
    pub async fn new(config: &AppConfig, scale_mode: ScaleMode) -> Result<Self> {
        let runtime_config = config.to_runtime_config();

        let scale = open_scale(config, scale_mode).await?;
        let camera = Arc::new(FfmpegCamera::new(config.to_camera_settings()));
        let classifier = Arc::new(GeminiClassifier::new(config.to_vision_settings())?);
        if config.gemini_api_key.is_none() {
            warn!("gemini_api_key not set, classification requests will fail");
        }
        let record_repo = build_record_repo(config)?;
        let qr_renderer = Arc::new(PngQrRenderer::new(Some(PathBuf::from(&config.qr_dir))));

        let state = AppState {
            config: runtime_config,
            scale,
            camera,
            classifier,
            record_repo,
            qr_renderer,
            metrics: Arc::new(Metrics::default()),
            device_lock: Arc::new(Mutex::new(())),
        };

        Ok(Self { state })
    }
}

async fn open_scale(
    config: &AppConfig,
    scale_mode: ScaleMode,
) -> Result<Option<Arc<dyn ScaleLink>>> {
    if scale_mode == ScaleMode::Disabled {
        return Ok(None);
    }
    let settings = config.to_serial_settings();
    match SerialScaleLink::open(&settings).await {
        Ok(link) => {
            info!("connected to sorter board on {}", settings.port);
            Ok(Some(Arc::new(link)))
        }
        Err(err) if scale_mode == ScaleMode::Optional => {
            warn!("sorter board unavailable: {:#}", err);
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

fn build_record_repo(config: &AppConfig) -> Result<Arc<dyn RecordRepository>> {
    match config.store_kind()? {
        RecordStoreKind::Firestore => {
            let settings = config
                .to_firestore_settings()
                .ok_or_else(|| anyhow!("firestore_project_id is not configured"))?;
            info!(
                "records go to firestore project {} collection {}",
                settings.project_id, settings.collection
            );
            Ok(Arc::new(FirestoreRecordRepository::new(settings)?))
        }
        RecordStoreKind::File => {
            info!("records go to {}", config.records_path);
            Ok(Arc::new(JsonFileRecordRepository::new(&config.records_path)))
        }
    }
}
