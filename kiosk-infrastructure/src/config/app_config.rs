use std::env;
use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use tokio::fs;
use tracing::{info, warn};

use kiosk_domain::{RateTable, RuntimeConfig, DEFAULT_DRY_RATE, DEFAULT_WET_RATE};

use crate::config::validation::{require_positive, validate_rate};
use crate::devices::{CameraSettings, SerialSettings};
use crate::repositories::FirestoreSettings;
use crate::services::VisionSettings;

pub const CONFIG_ENV: &str = "ECOSORT_CONFIG";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStoreKind {
    Firestore,
    File,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub serial_port: String,
    pub baud_rate: u32,
    pub serial_read_timeout_ms: u64,
    pub serial_settle_ms: u64,
    pub base_weight_timeout_seconds: u64,
    pub item_weight_timeout_seconds: u64,
    pub camera_device: String,
    pub camera_input_format: Option<String>,
    pub camera_preview: bool,
    pub ffmpeg_path: String,
    pub ffplay_path: String,
    pub image_path: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub gemini_temperature: f32,
    pub structured_output: bool,
    pub vision_timeout_seconds: u64,
    pub record_store: String,
    pub firestore_project_id: Option<String>,
    pub firestore_database: String,
    pub firestore_collection: String,
    pub firestore_access_token: Option<String>,
    pub firestore_api_key: Option<String>,
    pub firestore_base_url: String,
    pub records_path: String,
    pub qr_dir: String,
    pub dry_rate: f64,
    pub wet_rate: f64,
    pub id_attempts: u32,
    pub log_dir: Option<String>,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
    /// File the configuration was read from, or would have been.
    #[serde(skip)]
    pub source_path: String,
    #[serde(skip)]
    pub source_found: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_string(),
            api_token: None,
            serial_port: "/dev/ttyACM0".to_string(),
            baud_rate: 9600,
            serial_read_timeout_ms: 2000,
            serial_settle_ms: 2000,
            base_weight_timeout_seconds: 8,
            item_weight_timeout_seconds: 20,
            camera_device: "/dev/video1".to_string(),
            camera_input_format: Some("video4linux2".to_string()),
            camera_preview: true,
            ffmpeg_path: "ffmpeg".to_string(),
            ffplay_path: "ffplay".to_string(),
            image_path: "./captured.jpg".to_string(),
            gemini_api_key: None,
            gemini_model: "gemini-2.5-flash".to_string(),
            gemini_base_url: "https://generativelanguage.googleapis.com".to_string(),
            gemini_temperature: 0.1,
            structured_output: true,
            vision_timeout_seconds: 60,
            record_store: "firestore".to_string(),
            firestore_project_id: None,
            firestore_database: "(default)".to_string(),
            firestore_collection: "qr_codes".to_string(),
            firestore_access_token: None,
            firestore_api_key: None,
            firestore_base_url: "https://firestore.googleapis.com".to_string(),
            records_path: "./records.json".to_string(),
            qr_dir: "./qr".to_string(),
            dry_rate: DEFAULT_DRY_RATE,
            wet_rate: DEFAULT_WET_RATE,
            id_attempts: 3,
            log_dir: None,
            max_body_bytes: 8 * 1024 * 1024,
            request_timeout_seconds: 60,
            source_path: String::new(),
            source_found: false,
        }
    }
}

impl AppConfig {
    pub async fn load() -> Result<Self> {
        let path = env::var(CONFIG_ENV).unwrap_or_else(|_| "./config.toml".to_string());
        Self::load_from(&path, |key| env::var(key).ok()).await
    }

    /// Reads `path` (defaults when absent), then applies `lookup` overrides.
    /// Runs before logging is up; call [`AppConfig::log_source`] afterwards.
    pub async fn load_from<F>(path: &str, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file_path = Path::new(path);
        let base_dir = file_path.parent();
        let mut config = if file_path.exists() {
            let content = fs::read_to_string(file_path).await?;
            let mut config = toml::from_str::<AppConfig>(&content)?;
            config.source_found = true;
            config
        } else {
            AppConfig::default()
        };
        config.source_path = path.to_string();
        config.apply_overrides(lookup);
        config.resolve_paths(base_dir);
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn log_source(&self) {
        if self.source_found {
            info!("configuration loaded from {}", self.source_path);
        } else {
            warn!("{} not found, using defaults", self.source_path);
        }
    }

    pub fn normalize(&mut self) {
        for value in [
            &mut self.api_token,
            &mut self.camera_input_format,
            &mut self.gemini_api_key,
            &mut self.firestore_project_id,
            &mut self.firestore_access_token,
            &mut self.firestore_api_key,
            &mut self.log_dir,
        ] {
            if value.as_deref().map(str::trim).is_some_and(str::is_empty) {
                *value = None;
            }
        }
        self.record_store = self.record_store.trim().to_lowercase();
        self.gemini_base_url = self.gemini_base_url.trim_end_matches('/').to_string();
        self.firestore_base_url = self.firestore_base_url.trim_end_matches('/').to_string();
    }

    fn resolve_paths(&mut self, base_dir: Option<&Path>) {
        let Some(base) = base_dir else {
            return;
        };
        self.image_path = resolve_path(base, &self.image_path);
        self.records_path = resolve_path(base, &self.records_path);
        self.qr_dir = resolve_path(base, &self.qr_dir);
        if let Some(log_dir) = &self.log_dir {
            self.log_dir = Some(resolve_path(base, log_dir));
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.bind_addr
            .parse::<std::net::SocketAddr>()
            .map_err(|err| anyhow!("invalid bind_addr: {}", err))?;
        if self.serial_port.trim().is_empty() {
            return Err(anyhow!("serial_port must not be empty"));
        }
        require_positive("baud_rate", u64::from(self.baud_rate))?;
        require_positive("serial_read_timeout_ms", self.serial_read_timeout_ms)?;
        require_positive("base_weight_timeout_seconds", self.base_weight_timeout_seconds)?;
        require_positive("item_weight_timeout_seconds", self.item_weight_timeout_seconds)?;
        require_positive("vision_timeout_seconds", self.vision_timeout_seconds)?;
        require_positive("id_attempts", u64::from(self.id_attempts))?;
        require_positive("max_body_bytes", self.max_body_bytes)?;
        if self.request_timeout_seconds <= self.item_weight_timeout_seconds {
            return Err(anyhow!(
                "request_timeout_seconds must exceed item_weight_timeout_seconds"
            ));
        }
        validate_rate("dry_rate", self.dry_rate)?;
        validate_rate("wet_rate", self.wet_rate)?;
        if !(0.0..=2.0).contains(&self.gemini_temperature) {
            return Err(anyhow!("gemini_temperature must be within 0.0..=2.0"));
        }
        if self.image_path.trim().is_empty() {
            return Err(anyhow!("image_path must not be empty"));
        }
        if self.store_kind()? == RecordStoreKind::Firestore && self.firestore_project_id.is_none() {
            return Err(anyhow!(
                "firestore_project_id is required when record_store = \"firestore\""
            ));
        }
        Ok(())
    }

    pub fn store_kind(&self) -> Result<RecordStoreKind> {
        match self.record_store.as_str() {
            "firestore" => Ok(RecordStoreKind::Firestore),
            "file" => Ok(RecordStoreKind::File),
            other => Err(anyhow!(
                "unknown record_store '{}', expected firestore or file",
                other
            )),
        }
    }

    pub fn to_runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            bind_addr: self.bind_addr.clone(),
            api_token: self.api_token.clone(),
            image_path: self.image_path.clone(),
            qr_dir: self.qr_dir.clone(),
            rates: RateTable {
                dry: self.dry_rate,
                wet: self.wet_rate,
            },
            base_weight_timeout_seconds: self.base_weight_timeout_seconds,
            item_weight_timeout_seconds: self.item_weight_timeout_seconds,
            id_attempts: self.id_attempts,
            max_body_bytes: self.max_body_bytes,
            request_timeout_seconds: self.request_timeout_seconds,
        }
    }

    pub fn to_serial_settings(&self) -> SerialSettings {
        SerialSettings {
            port: self.serial_port.clone(),
            baud_rate: self.baud_rate,
            read_timeout: Duration::from_millis(self.serial_read_timeout_ms),
            settle: Duration::from_millis(self.serial_settle_ms),
        }
    }

    pub fn to_camera_settings(&self) -> CameraSettings {
        CameraSettings {
            device: self.camera_device.clone(),
            input_format: self.camera_input_format.clone(),
            preview: self.camera_preview,
            ffmpeg_path: self.ffmpeg_path.clone(),
            ffplay_path: self.ffplay_path.clone(),
        }
    }

    pub fn to_vision_settings(&self) -> VisionSettings {
        VisionSettings {
            api_key: self.gemini_api_key.clone(),
            model: self.gemini_model.clone(),
            base_url: self.gemini_base_url.clone(),
            temperature: self.gemini_temperature,
            structured_output: self.structured_output,
            timeout: Duration::from_secs(self.vision_timeout_seconds),
        }
    }

    pub fn to_firestore_settings(&self) -> Option<FirestoreSettings> {
        let project_id = self.firestore_project_id.clone()?;
        Some(FirestoreSettings {
            project_id,
            database: self.firestore_database.clone(),
            collection: self.firestore_collection.clone(),
            access_token: self.firestore_access_token.clone(),
            api_key: self.firestore_api_key.clone(),
            base_url: self.firestore_base_url.clone(),
            timeout: Duration::from_secs(self.request_timeout_seconds),
        })
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("ECOSORT_BIND_ADDR") {
            self.bind_addr = value;
        }
        if let Some(value) = lookup("ECOSORT_API_TOKEN") {
            self.api_token = Some(value);
        }
        if let Some(value) = lookup("ECOSORT_SERIAL_PORT") {
            self.serial_port = value;
        }
        if let Some(value) = lookup("ECOSORT_BAUD_RATE") {
            self.baud_rate = value.parse().unwrap_or(self.baud_rate);
        }
        if let Some(value) = lookup("ECOSORT_BASE_WEIGHT_TIMEOUT_SECONDS") {
            self.base_weight_timeout_seconds =
                value.parse().unwrap_or(self.base_weight_timeout_seconds);
        }
        if let Some(value) = lookup("ECOSORT_ITEM_WEIGHT_TIMEOUT_SECONDS") {
            self.item_weight_timeout_seconds =
                value.parse().unwrap_or(self.item_weight_timeout_seconds);
        }
        if let Some(value) = lookup("ECOSORT_CAMERA_DEVICE") {
            self.camera_device = value;
        }
        if let Some(value) = lookup("ECOSORT_CAMERA_PREVIEW") {
            self.camera_preview = value.parse().unwrap_or(self.camera_preview);
        }
        if let Some(value) = lookup("ECOSORT_IMAGE_PATH") {
            self.image_path = value;
        }
        if let Some(value) = lookup("ECOSORT_GEMINI_API_KEY") {
            self.gemini_api_key = Some(value);
        }
        if let Some(value) = lookup("ECOSORT_GEMINI_MODEL") {
            self.gemini_model = value;
        }
        if let Some(value) = lookup("ECOSORT_STRUCTURED_OUTPUT") {
            self.structured_output = value.parse().unwrap_or(self.structured_output);
        }
        if let Some(value) = lookup("ECOSORT_RECORD_STORE") {
            self.record_store = value;
        }
        if let Some(value) = lookup("ECOSORT_FIRESTORE_PROJECT_ID") {
            self.firestore_project_id = Some(value);
        }
        if let Some(value) = lookup("ECOSORT_FIRESTORE_COLLECTION") {
            self.firestore_collection = value;
        }
        if let Some(value) = lookup("ECOSORT_FIRESTORE_ACCESS_TOKEN") {
            self.firestore_access_token = Some(value);
        }
        if let Some(value) = lookup("ECOSORT_FIRESTORE_API_KEY") {
            self.firestore_api_key = Some(value);
        }
        if let Some(value) = lookup("ECOSORT_RECORDS_PATH") {
            self.records_path = value;
        }
        if let Some(value) = lookup("ECOSORT_QR_DIR") {
            self.qr_dir = value;
        }
        if let Some(value) = lookup("ECOSORT_DRY_RATE") {
            self.dry_rate = value.parse().unwrap_or(self.dry_rate);
        }
        if let Some(value) = lookup("ECOSORT_WET_RATE") {
            self.wet_rate = value.parse().unwrap_or(self.wet_rate);
        }
        if let Some(value) = lookup("ECOSORT_LOG_DIR") {
            self.log_dir = Some(value);
        }
        if let Some(value) = lookup("ECOSORT_REQUEST_TIMEOUT_SECONDS") {
            self.request_timeout_seconds = value.parse().unwrap_or(self.request_timeout_seconds);
        }
    }
}

fn resolve_path(base: &Path, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return trimmed.to_string();
    }
    let path = Path::new(trimmed);
    if path.is_absolute() {
        trimmed.to_string()
    } else {
        base.join(path).to_string_lossy().to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn file_store_config() -> AppConfig {
        AppConfig {
            record_store: "file".to_string(),
            ..AppConfig::default()
        }
    }

    #[test]
    fn defaults_need_a_firestore_project() {
        let err = AppConfig::default().validate().expect_err("missing project");
        assert!(err.to_string().contains("firestore_project_id"));
        file_store_config().validate().expect("file store defaults validate");
    }

    #[test]
    fn parses_toml_with_partial_fields() {
        let config: AppConfig = toml::from_str(
            r#"
serial_port = "COM10"
item_weight_timeout_seconds = 25
record_store = "file"
dry_rate = 0.03
"#,
        )
        .expect("parse");
        assert_eq!(config.serial_port, "COM10");
        assert_eq!(config.item_weight_timeout_seconds, 25);
        assert_eq!(config.base_weight_timeout_seconds, 8);
        assert_eq!(config.to_runtime_config().rates.dry, 0.03);
        config.validate().expect("valid");
    }

    #[test]
    fn normalize_drops_blank_optionals() {
        let mut config = AppConfig {
            api_token: Some("  ".to_string()),
            gemini_api_key: Some(String::new()),
            record_store: " File ".to_string(),
            gemini_base_url: "http://localhost:9000/".to_string(),
            ..AppConfig::default()
        };
        config.normalize();
        assert_eq!(config.api_token, None);
        assert_eq!(config.gemini_api_key, None);
        assert_eq!(config.store_kind().expect("kind"), RecordStoreKind::File);
        assert_eq!(config.gemini_base_url, "http://localhost:9000");
    }

    #[test]
    fn rejects_negative_rates_and_short_request_timeout() {
        let config = AppConfig {
            wet_rate: -0.1,
            ..file_store_config()
        };
        assert!(config.validate().is_err());

        let config = AppConfig {
            request_timeout_seconds: 20,
            ..file_store_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn overrides_replace_values_and_ignore_garbage() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("ECOSORT_SERIAL_PORT", "/dev/ttyUSB0"),
            ("ECOSORT_BAUD_RATE", "not-a-number"),
            ("ECOSORT_RECORD_STORE", "file"),
            ("ECOSORT_GEMINI_API_KEY", "key"),
        ]);
        let mut config = AppConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|value| value.to_string()));
        assert_eq!(config.serial_port, "/dev/ttyUSB0");
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.record_store, "file");
        assert_eq!(config.gemini_api_key.as_deref(), Some("key"));
    }

    #[tokio::test]
    async fn load_from_reads_file_and_remembers_source() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "record_store = \"file\"\nqr_dir = \"codes\"\n").expect("seed");
        let path = path.to_string_lossy().to_string();

        let config = AppConfig::load_from(&path, |_| None).await.expect("load");

        assert!(config.source_found);
        assert_eq!(config.source_path, path);
        assert_eq!(config.store_kind().expect("kind"), RecordStoreKind::File);
        assert_eq!(config.qr_dir, dir.path().join("codes").to_string_lossy());
    }

    #[tokio::test]
    async fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("absent.toml").to_string_lossy().to_string();

        let config = AppConfig::load_from(&path, |key| {
            (key == "ECOSORT_RECORD_STORE").then(|| "file".to_string())
        })
        .await
        .expect("load");

        assert!(!config.source_found);
        assert_eq!(config.source_path, path);
        assert_eq!(config.serial_port, "/dev/ttyACM0");
    }

    #[test]
    fn relative_paths_follow_config_dir() {
        let mut config = AppConfig::default();
        config.resolve_paths(Some(Path::new("/etc/ecosort")));
        assert_eq!(config.image_path, "/etc/ecosort/./captured.jpg");
        assert_eq!(config.qr_dir, "/etc/ecosort/./qr");
    }
}
