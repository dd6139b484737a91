use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use kiosk_domain::ports::Camera;
use kiosk_domain::CapturedImage;

const PREVIEW_STARTUP: Duration = Duration::from_millis(300);

#[derive(Debug, Clone)]
pub struct CameraSettings {
    /// Device path, or a bare index such as `1` for `/dev/video1`.
    pub device: String,
    pub input_format: Option<String>,
    pub preview: bool,
    pub ffmpeg_path: String,
    pub ffplay_path: String,
}

/// Camera backed by `ffplay` for the live view and `ffmpeg` for stills.
pub struct FfmpegCamera {
    settings: CameraSettings,
    device: String,
    preview: Mutex<Option<Child>>,
}

impl FfmpegCamera {
    pub fn new(settings: CameraSettings) -> Self {
        let device = normalize_device(&settings.device);
        Self {
            settings,
            device,
            preview: Mutex::new(None),
        }
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    fn input_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(format) = &self.settings.input_format {
            args.push("-f".to_string());
            args.push(format.clone());
        }
        args.push("-i".to_string());
        args.push(self.device.clone());
        args
    }

    fn preview_args(&self) -> Vec<String> {
        let mut args = vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-window_title".to_string(),
            "Camera Feed".to_string(),
            "-noborder".to_string(),
        ];
        if let Some(format) = &self.settings.input_format {
            args.push("-f".to_string());
            args.push(format.clone());
        }
        args.push(self.device.clone());
        args
    }

    fn still_args(&self, output: &Path) -> Vec<String> {
        let mut args = vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-y".to_string(),
        ];
        args.extend(self.input_args());
        args.extend([
            "-frames:v".to_string(),
            "1".to_string(),
            "-update".to_string(),
            "1".to_string(),
        ]);
        args.push(output.to_string_lossy().to_string());
        args
    }
}

#[async_trait]
impl Camera for FfmpegCamera {
    async fn probe(&self) -> bool {
        if self.device.starts_with("/dev/") {
            return Path::new(&self.device).exists();
        }
        true
    }

    async fn start_preview(&self) -> Result<()> {
        if !self.probe().await {
            bail!("camera device {} not found", self.device);
        }
        if !self.settings.preview {
            return Ok(());
        }

        let mut guard = self.preview.lock().await;
        if guard.is_some() {
            return Ok(());
        }
        let mut child = Command::new(&self.settings.ffplay_path)
            .args(self.preview_args())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to launch {}", self.settings.ffplay_path))?;

        tokio::time::sleep(PREVIEW_STARTUP).await;
        if let Some(status) = child.try_wait()? {
            bail!(
                "camera preview exited early ({}), device {} not accessible",
                status,
                self.device
            );
        }
        info!("camera preview started on {}", self.device);
        *guard = Some(child);
        Ok(())
    }

    async fn stop_preview(&self) {
        let Some(mut child) = self.preview.lock().await.take() else {
            return;
        };
        if let Err(err) = child.kill().await {
            warn!("failed to stop camera preview: {}", err);
        }
        debug!("camera preview stopped");
    }

    async fn capture_still(&self, path: &Path) -> Result<CapturedImage> {
        let output = Command::new(&self.settings.ffmpeg_path)
            .args(self.still_args(path))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("failed to launch {}", self.settings.ffmpeg_path))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!(
                "frame capture failed ({}): {}",
                output.status,
                stderr.trim()
            ));
        }

        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("captured frame missing at {}", path.display()))?;
        info!("image captured: {} ({} bytes)", path.display(), bytes.len());
        Ok(CapturedImage {
            path: PathBuf::from(path),
            bytes,
        })
    }
}

fn parse_device_index(device: &str) -> Option<u32> {
    device.trim().parse::<u32>().ok()
}

fn normalize_device(device: &str) -> String {
    match parse_device_index(device) {
        Some(index) => format!("/dev/video{index}"),
        None => device.trim().to_string(),
    }
}
