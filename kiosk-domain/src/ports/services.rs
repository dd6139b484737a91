use async_trait::async_trait;

use crate::entities::{CapturedImage, QrArtifact};
use crate::value_objects::RecordId;

#[async_trait]
pub trait VisionClassifier: Send + Sync {
    /// Raw reply text for the captured image.
    async fn describe(&self, image: &CapturedImage) -> anyhow::Result<String>;
}

#[async_trait]
pub trait QrRenderer: Send + Sync {
    async fn render(&self, id: &RecordId) -> anyhow::Result<QrArtifact>;
}
