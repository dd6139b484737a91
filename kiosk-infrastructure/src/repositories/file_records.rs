use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::info;

use kiosk_domain::ports::{RecordRepository, StoreError};
use kiosk_domain::{now_rfc3339, RecordId, RedeemableRecord};

/// Bench-top record store: a single JSON object keyed by record id.
pub struct JsonFileRecordRepository {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileRecordRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<Map<String, Value>> {
        if !fs::try_exists(&self.path).await? {
            return Ok(Map::new());
        }
        let content = fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&content)? {
            Value::Object(map) => Ok(map),
            _ => Err(anyhow!("{} is not a JSON object", self.path.display())),
        }
    }

    async fn store(&self, records: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = non_empty_parent(&self.path) {
            fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(records)?).await?;
        fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl RecordRepository for JsonFileRecordRepository {
    async fn create_record(
        &self,
        id: &RecordId,
        record: &RedeemableRecord,
    ) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await?;
        if records.contains_key(id.as_str()) {
            return Err(StoreError::Conflict(id.clone()));
        }

        let mut document = serde_json::to_value(record).map_err(anyhow::Error::from)?;
        if let Value::Object(fields) = &mut document {
            fields.insert("createdAt".to_string(), Value::String(now_rfc3339()));
        }
        records.insert(id.to_string(), document);
        self.store(&records).await?;
        info!("record {} written to {}", id, self.path.display());
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        let Some(parent) = non_empty_parent(&self.path) else {
            return Ok(());
        };
        if !fs::try_exists(parent).await? {
            return Err(anyhow!("record directory {} missing", parent.display()));
        }
        Ok(())
    }
}

fn non_empty_parent(path: &Path) -> Option<&Path> {
    path.parent().filter(|parent| !parent.as_os_str().is_empty())
}
