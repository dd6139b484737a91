use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Luma};
use qrcode::render::unicode::Dense1x2;
use qrcode::QrCode;
use tracing::{info, warn};

use kiosk_domain::ports::QrRenderer;
use kiosk_domain::{QrArtifact, RecordId};

const MODULE_PIXELS: u32 = 10;

/// Encodes `payload` as a PNG and as a terminal-printable block drawing.
pub fn render_qr(payload: &str) -> Result<(Vec<u8>, String)> {
    let code = QrCode::new(payload.as_bytes()).context("payload does not fit a QR code")?;

    let buffer = code
        .render::<Luma<u8>>()
        .quiet_zone(true)
        .module_dimensions(MODULE_PIXELS, MODULE_PIXELS)
        .build();
    let mut png = Vec::new();
    DynamicImage::ImageLuma8(buffer)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .context("failed to encode QR code as PNG")?;

    let text = code
        .render::<Dense1x2>()
        .dark_color(Dense1x2::Light)
        .light_color(Dense1x2::Dark)
        .build();
    Ok((png, text))
}

/// Renders record ids, optionally keeping a `<id>.png` copy on disk.
pub struct PngQrRenderer {
    output_dir: Option<PathBuf>,
}

impl PngQrRenderer {
    pub fn new(output_dir: Option<PathBuf>) -> Self {
        Self { output_dir }
    }
}

#[async_trait]
impl QrRenderer for PngQrRenderer {
    async fn render(&self, id: &RecordId) -> Result<QrArtifact> {
        let (png, text) = render_qr(id.as_str())?;
        let saved_to = match &self.output_dir {
            Some(dir) => match save_png(dir, id, &png).await {
                Ok(path) => {
                    info!("QR code saved to {}", path.display());
                    Some(path.to_string_lossy().to_string())
                }
                Err(err) => {
                    warn!("QR code for {} not saved: {:#}", id, err);
                    None
                }
            },
            None => None,
        };
        Ok(QrArtifact {
            png,
            text,
            saved_to,
        })
    }
}

async fn save_png(dir: &Path, id: &RecordId, png: &[u8]) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("failed to create {}", dir.display()))?;
    let path = dir.join(format!("{}.png", id));
    tokio::fs::write(&path, png)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}
