use serde::{Deserialize, Serialize};

use crate::value_objects::RateTable;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub image_path: String,
    pub qr_dir: String,
    pub rates: RateTable,
    pub base_weight_timeout_seconds: u64,
    pub item_weight_timeout_seconds: u64,
    pub id_attempts: u32,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub arduino_connected: bool,
    pub camera_available: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProcessWastePayload {
    #[serde(rename = "type")]
    pub waste_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManualRewardPayload {
    #[serde(rename = "type")]
    pub waste_type: String,
    pub weight: f64,
}
