use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use kiosk_domain::ports::VisionClassifier;
use kiosk_domain::{CapturedImage, CLASSIFICATION_PROMPT, STRUCTURED_CLASSIFICATION_PROMPT};

#[derive(Debug, Clone)]
pub struct VisionSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub structured_output: bool,
    pub timeout: Duration,
}

pub struct GeminiClassifier {
    client: Client,
    settings: VisionSettings,
}

impl GeminiClassifier {
    pub fn new(settings: VisionSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .context("failed to build vision HTTP client")?;
        Ok(Self { client, settings })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.settings.base_url, self.settings.model
        )
    }
}

#[async_trait]
impl VisionClassifier for GeminiClassifier {
    async fn describe(&self, image: &CapturedImage) -> Result<String> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("gemini_api_key is not configured"))?;
        let body = build_request(&self.settings, image);

        info!(
            "sending {} ({} bytes) to {}",
            image.path.display(),
            image.bytes.len(),
            self.settings.model
        );
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .context("vision request failed")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(anyhow!("vision model returned {}: {}", status, detail.trim()));
        }
        let payload: GenerateContentResponse = response
            .json()
            .await
            .context("unreadable vision model response")?;
        let reply = extract_reply(payload)?;
        debug!("vision reply: {}", reply);
        Ok(reply)
    }
}

pub fn build_request(settings: &VisionSettings, image: &CapturedImage) -> Value {
    let prompt = if settings.structured_output {
        STRUCTURED_CLASSIFICATION_PROMPT
    } else {
        CLASSIFICATION_PROMPT
    };
    let mut generation_config = json!({ "temperature": settings.temperature });
    if settings.structured_output {
        generation_config["responseMimeType"] = json!("application/json");
        generation_config["responseSchema"] = response_schema();
    }

    json!({
        "contents": [{
            "role": "user",
            "parts": [
                { "text": prompt },
                {
                    "inline_data": {
                        "mime_type": image.mime_type(),
                        "data": BASE64.encode(&image.bytes),
                    }
                }
            ]
        }],
        "generationConfig": generation_config,
    })
}

fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "subcategory": { "type": "STRING" },
            "category": {
                "type": "STRING",
                "enum": ["dry-waste", "wet-waste"]
            }
        },
        "required": ["subcategory", "category"]
    })
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct Part {
    #[serde(default)]
    pub text: Option<String>,
}

/// Concatenated text of the first candidate.
pub fn extract_reply(response: GenerateContentResponse) -> Result<String> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();
    let text = text.trim();
    if text.is_empty() {
        return Err(anyhow!("vision model returned no text"));
    }
    Ok(text.to_string())
}
