// Image capture entities

use std::path::PathBuf;

/// Signal that ends the capture wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSignal {
    Capture,
    Cancel,
}

#[derive(Debug, Clone)]
pub struct CapturedImage {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

impl CapturedImage {
    pub fn mime_type(&self) -> &'static str {
        match self
            .path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("png") => "image/png",
            _ => "image/jpeg",
        }
    }
}
