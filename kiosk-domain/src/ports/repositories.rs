use async_trait::async_trait;
use thiserror::Error;

use crate::entities::RedeemableRecord;
use crate::value_objects::RecordId;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record {0} already exists")]
    Conflict(RecordId),
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// Create-only write; an existing key yields `StoreError::Conflict`.
    async fn create_record(
        &self,
        id: &RecordId,
        record: &RedeemableRecord,
    ) -> Result<(), StoreError>;
    async fn ping(&self) -> anyhow::Result<()>;
}
