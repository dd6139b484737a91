use axum::http::HeaderMap;

use kiosk_domain::RuntimeConfig;

pub fn authorize(config: &RuntimeConfig, headers: &HeaderMap) -> bool {
    if let Some(api_token) = &config.api_token {
        return extract_bearer(headers)
            .map(|v| v == *api_token)
            .unwrap_or(false);
    }
    true
}

fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get("Authorization")?.to_str().ok()?.trim();
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use kiosk_domain::{RateTable, RuntimeConfig};

    use super::*;

    fn config(api_token: Option<&str>) -> RuntimeConfig {
        RuntimeConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            api_token: api_token.map(str::to_string),
            image_path: "captured.jpg".to_string(),
            qr_dir: "qr".to_string(),
            rates: RateTable::default(),
            base_weight_timeout_seconds: 8,
            item_weight_timeout_seconds: 20,
            id_attempts: 3,
            max_body_bytes: 1024,
            request_timeout_seconds: 60,
        }
    }

    fn bearer(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Authorization",
            HeaderValue::from_str(value).expect("header value"),
        );
        headers
    }

    #[test]
    fn open_when_no_token_configured() {
        assert!(authorize(&config(None), &HeaderMap::new()));
    }

    #[test]
    fn requires_matching_bearer_token() {
        let config = config(Some("kiosk-secret"));
        assert!(authorize(&config, &bearer("Bearer kiosk-secret")));
        assert!(!authorize(&config, &bearer("Bearer other")));
        assert!(!authorize(&config, &bearer("kiosk-secret")));
        assert!(!authorize(&config, &bearer("Bearer ")));
        assert!(!authorize(&config, &HeaderMap::new()));
    }
}
