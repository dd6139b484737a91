use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use kiosk_domain::ports::{RecordRepository, StoreError};
use kiosk_domain::{RecordId, RedeemableRecord};

#[derive(Debug, Clone)]
pub struct FirestoreSettings {
    pub project_id: String,
    pub database: String,
    pub collection: String,
    /// OAuth bearer token; requests go unauthenticated apart from the API key
    /// when absent.
    pub access_token: Option<String>,
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
}

impl FirestoreSettings {
    fn database_path(&self) -> String {
        format!(
            "projects/{}/databases/{}/documents",
            self.project_id, self.database
        )
    }

    fn document_name(&self, id: &RecordId) -> String {
        format!("{}/{}/{}", self.database_path(), self.collection, id)
    }
}

/// Records stored as documents in a Firestore collection via the REST API.
pub struct FirestoreRecordRepository {
    client: Client,
    settings: FirestoreSettings,
}

impl FirestoreRecordRepository {
    pub fn new(settings: FirestoreSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .context("failed to build document store HTTP client")?;
        Ok(Self { client, settings })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = match &self.settings.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        match &self.settings.api_key {
            Some(key) => request.query(&[("key", key)]),
            None => request,
        }
    }
}

#[async_trait]
impl RecordRepository for FirestoreRecordRepository {
    async fn create_record(
        &self,
        id: &RecordId,
        record: &RedeemableRecord,
    ) -> Result<(), StoreError> {
        let body = build_commit_body(&self.settings, id, record)?;
        let url = format!(
            "{}/v1/{}:commit",
            self.settings.base_url,
            self.settings.database_path()
        );
        let response = self
            .authorize(self.client.post(url))
            .json(&body)
            .send()
            .await
            .context("document store request failed")?;

        let status = response.status();
        if status.is_success() {
            info!("record {} stored in {}", id, self.settings.collection);
            return Ok(());
        }
        let detail = response.text().await.unwrap_or_default();
        if status == StatusCode::CONFLICT || detail.contains("ALREADY_EXISTS") {
            return Err(StoreError::Conflict(id.clone()));
        }
        Err(StoreError::Backend(anyhow!(
            "document store returned {}: {}",
            status,
            detail.trim()
        )))
    }

    async fn ping(&self) -> Result<()> {
        let url = format!(
            "{}/v1/{}/{}",
            self.settings.base_url,
            self.settings.database_path(),
            self.settings.collection
        );
        let response = self
            .authorize(self.client.get(url).query(&[("pageSize", "1")]))
            .send()
            .await
            .context("document store unreachable")?;
        let status = response.status();
        debug!("document store ping: {}", status);
        if !status.is_success() {
            return Err(anyhow!("document store returned {}", status));
        }
        Ok(())
    }
}

/// Commit request that creates the document only if it does not exist yet and
/// stamps `createdAt` with the server's request time.
pub fn build_commit_body(
    settings: &FirestoreSettings,
    id: &RecordId,
    record: &RedeemableRecord,
) -> Result<Value> {
    let fields = match serde_json::to_value(record).context("failed to encode record")? {
        Value::Object(map) => map,
        other => return Err(anyhow!("record encoded as {} instead of an object", other)),
    };
    let fields: Map<String, Value> = fields
        .into_iter()
        .map(|(key, value)| (key, to_firestore_value(&value)))
        .collect();

    Ok(json!({
        "writes": [{
            "update": {
                "name": settings.document_name(id),
                "fields": fields,
            },
            "currentDocument": { "exists": false },
            "updateTransforms": [{
                "fieldPath": "createdAt",
                "setToServerValue": "REQUEST_TIME",
            }],
        }]
    }))
}

fn to_firestore_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(flag) => json!({ "booleanValue": flag }),
        Value::Number(number) => match number.as_i64() {
            Some(int) if !number.is_f64() => json!({ "integerValue": int.to_string() }),
            _ => json!({ "doubleValue": number.as_f64().unwrap_or_default() }),
        },
        Value::String(text) => json!({ "stringValue": text }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(to_firestore_value).collect::<Vec<_>>() }
        }),
        Value::Object(map) => json!({
            "mapValue": {
                "fields": map
                    .iter()
                    .map(|(key, value)| (key.clone(), to_firestore_value(value)))
                    .collect::<Map<String, Value>>()
            }
        }),
    }
}
