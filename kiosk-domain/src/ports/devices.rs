use std::path::Path;

use async_trait::async_trait;

use crate::entities::{CapturedImage, TriggerSignal};
use crate::services::SerialCommand;

/// Serial connection to the scale/actuator board.
#[async_trait]
pub trait ScaleLink: Send + Sync {
    async fn send_command(&self, command: SerialCommand) -> anyhow::Result<()>;
    /// Next complete line, or `None` when the read window elapsed first.
    async fn read_line(&self) -> anyhow::Result<Option<String>>;
}

#[async_trait]
pub trait Camera: Send + Sync {
    async fn probe(&self) -> bool;
    /// Opens the live preview. A failure here means the device is unusable.
    async fn start_preview(&self) -> anyhow::Result<()>;
    async fn stop_preview(&self);
    async fn capture_still(&self, path: &Path) -> anyhow::Result<CapturedImage>;
}

/// Source of the capture/cancel decision.
#[async_trait]
pub trait CaptureTrigger: Send + Sync {
    async fn wait(&self) -> anyhow::Result<TriggerSignal>;

    /// Whether an operator watches the live view while waiting.
    fn wants_preview(&self) -> bool {
        true
    }
}
