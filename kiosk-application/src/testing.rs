// In-memory port doubles shared by the command tests.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use tokio::sync::Mutex;

use kiosk_domain::ports::{
    Camera, CaptureTrigger, QrRenderer, RecordRepository, ScaleLink, StoreError, VisionClassifier,
};
use kiosk_domain::{
    CapturedImage, QrArtifact, RateTable, RecordId, RedeemableRecord, RuntimeConfig,
    SerialCommand, TriggerSignal,
};

use crate::{AppState, Metrics};

#[derive(Default)]
pub struct FakeScale {
    lines: StdMutex<VecDeque<String>>,
    sent: StdMutex<Vec<SerialCommand>>,
}

impl FakeScale {
    pub fn with_lines(lines: &[&str]) -> Self {
        Self {
            lines: StdMutex::new(lines.iter().map(|line| line.to_string()).collect()),
            sent: StdMutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<SerialCommand> {
        self.sent.lock().expect("sent lock").clone()
    }
}

#[async_trait]
impl ScaleLink for FakeScale {
    async fn send_command(&self, command: SerialCommand) -> anyhow::Result<()> {
        self.sent.lock().expect("sent lock").push(command);
        Ok(())
    }

    async fn read_line(&self) -> anyhow::Result<Option<String>> {
        let next = self.lines.lock().expect("lines lock").pop_front();
        if next.is_none() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        Ok(next)
    }
}

#[derive(Default)]
pub struct FakeCamera {
    unavailable: bool,
    preview_broken: bool,
    preview_open: AtomicBool,
    stills: AtomicU32,
}

impl FakeCamera {
    pub fn stills(&self) -> u32 {
        self.stills.load(Ordering::SeqCst)
    }

    pub fn preview_open(&self) -> bool {
        self.preview_open.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Camera for FakeCamera {
    async fn probe(&self) -> bool {
        !self.unavailable
    }

    async fn start_preview(&self) -> anyhow::Result<()> {
        if self.unavailable || self.preview_broken {
            return Err(anyhow!("camera not accessible"));
        }
        self.preview_open.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop_preview(&self) {
        self.preview_open.store(false, Ordering::SeqCst);
    }

    async fn capture_still(&self, path: &Path) -> anyhow::Result<CapturedImage> {
        self.stills.fetch_add(1, Ordering::SeqCst);
        Ok(CapturedImage {
            path: path.to_path_buf(),
            bytes: b"jpeg-bytes".to_vec(),
        })
    }
}

pub struct FixedTrigger(pub TriggerSignal);

#[async_trait]
impl CaptureTrigger for FixedTrigger {
    async fn wait(&self) -> anyhow::Result<TriggerSignal> {
        Ok(self.0)
    }
}

pub struct FakeClassifier {
    reply: String,
    calls: AtomicU32,
}

impl FakeClassifier {
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VisionClassifier for FakeClassifier {
    async fn describe(&self, _image: &CapturedImage) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }
}

#[derive(Default)]
pub struct MemoryRecords {
    records: StdMutex<HashMap<RecordId, RedeemableRecord>>,
    failing: bool,
    conflicts: AtomicU32,
}

impl MemoryRecords {
    pub fn records(&self) -> Vec<(RecordId, RedeemableRecord)> {
        self.records
            .lock()
            .expect("records lock")
            .iter()
            .map(|(id, record)| (id.clone(), record.clone()))
            .collect()
    }
}

#[async_trait]
impl RecordRepository for MemoryRecords {
    async fn create_record(
        &self,
        id: &RecordId,
        record: &RedeemableRecord,
    ) -> Result<(), StoreError> {
        if self.failing {
            return Err(StoreError::Backend(anyhow!("store offline")));
        }
        if self
            .conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(StoreError::Conflict(id.clone()));
        }
        self.records
            .lock()
            .expect("records lock")
            .insert(id.clone(), record.clone());
        Ok(())
    }

    async fn ping(&self) -> anyhow::Result<()> {
        if self.failing {
            return Err(anyhow!("store offline"));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeQr {
    failing: bool,
    rendered: StdMutex<Vec<RecordId>>,
}

impl FakeQr {
    pub fn rendered(&self) -> Vec<RecordId> {
        self.rendered.lock().expect("qr lock").clone()
    }
}

#[async_trait]
impl QrRenderer for FakeQr {
    async fn render(&self, id: &RecordId) -> anyhow::Result<QrArtifact> {
        if self.failing {
            return Err(anyhow!("qr encoder unavailable"));
        }
        self.rendered.lock().expect("qr lock").push(id.clone());
        Ok(QrArtifact {
            png: vec![0x89, b'P', b'N', b'G'],
            text: id.to_string(),
            saved_to: None,
        })
    }
}

pub fn test_config() -> RuntimeConfig {
    RuntimeConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        api_token: None,
        image_path: "captured.jpg".to_string(),
        qr_dir: "qr".to_string(),
        rates: RateTable::default(),
        base_weight_timeout_seconds: 1,
        item_weight_timeout_seconds: 1,
        id_attempts: 3,
        max_body_bytes: 1024 * 1024,
        request_timeout_seconds: 5,
    }
}

/// Builder for an `AppState` wired to the doubles above.
pub struct TestRig {
    pub config: RuntimeConfig,
    pub scale: Option<Arc<FakeScale>>,
    pub camera: Arc<FakeCamera>,
    pub classifier: Arc<FakeClassifier>,
    pub records: Arc<MemoryRecords>,
    pub qr: Arc<FakeQr>,
    pub metrics: Arc<Metrics>,
}

impl TestRig {
    pub fn new() -> Self {
        Self {
            config: test_config(),
            scale: Some(Arc::new(FakeScale::default())),
            camera: Arc::new(FakeCamera::default()),
            classifier: Arc::new(FakeClassifier {
                reply: "plastic, dry-waste".to_string(),
                calls: AtomicU32::new(0),
            }),
            records: Arc::new(MemoryRecords::default()),
            qr: Arc::new(FakeQr::default()),
            metrics: Arc::new(Metrics::default()),
        }
    }

    pub fn serial_lines(mut self, lines: &[&str]) -> Self {
        self.scale = Some(Arc::new(FakeScale::with_lines(lines)));
        self
    }

    pub fn without_scale(mut self) -> Self {
        self.scale = None;
        self
    }

    pub fn camera_unavailable(mut self) -> Self {
        self.camera = Arc::new(FakeCamera {
            unavailable: true,
            ..FakeCamera::default()
        });
        self
    }

    pub fn preview_broken(mut self) -> Self {
        self.camera = Arc::new(FakeCamera {
            preview_broken: true,
            ..FakeCamera::default()
        });
        self
    }

    pub fn classifier_reply(mut self, reply: &str) -> Self {
        self.classifier = Arc::new(FakeClassifier {
            reply: reply.to_string(),
            calls: AtomicU32::new(0),
        });
        self
    }

    pub fn failing_qr(mut self) -> Self {
        self.qr = Arc::new(FakeQr {
            failing: true,
            ..FakeQr::default()
        });
        self
    }

    pub fn failing_store(mut self) -> Self {
        self.records = Arc::new(MemoryRecords {
            failing: true,
            ..MemoryRecords::default()
        });
        self
    }

    pub fn store_conflicts(mut self, count: u32) -> Self {
        self.records = Arc::new(MemoryRecords {
            conflicts: AtomicU32::new(count),
            ..MemoryRecords::default()
        });
        self
    }

    pub fn sent(&self) -> Vec<SerialCommand> {
        self.scale.as_ref().map(|scale| scale.sent()).unwrap_or_default()
    }

    pub fn state(&self) -> AppState {
        AppState {
            config: self.config.clone(),
            scale: self
                .scale
                .clone()
                .map(|scale| scale as Arc<dyn ScaleLink>),
            camera: self.camera.clone(),
            classifier: self.classifier.clone(),
            record_repo: self.records.clone(),
            qr_renderer: self.qr.clone(),
            metrics: self.metrics.clone(),
            device_lock: Arc::new(Mutex::new(())),
        }
    }
}
