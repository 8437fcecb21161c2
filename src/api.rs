//! APIsetu transport gateway client for certificate verification

use crate::config::{
    CONNECT_TIMEOUT_SECS, CredentialStore, DEFAULT_BASE_URL, REQUEST_TIMEOUT_SECS,
};
use crate::error::{ApiSetuError, Result};
use crate::request::{
    DrivingLicenseParams, ResponseFormat, VehicleRegistrationParams, VerificationParams,
    VerificationPayload,
};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

pub const API_KEY_HEADER: &str = "X-APISETU-APIKEY";
pub const CLIENT_ID_HEADER: &str = "X-APISETU-CLIENTID";

/// Raw response body. The schema belongs to the gateway.
pub type VerificationResult = serde_json::Value;

/// Client for the certificate endpoints.
///
/// Credentials are read from the injected store on every call. One request per
/// call, never retried.
pub struct VerificationClient<S> {
    store: S,
    base_url: String,
    http: reqwest::Client,
}

impl<S: CredentialStore> VerificationClient<S> {
    /// Create a client against the production gateway.
    pub fn new(store: S) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ApiSetuError::Transport(describe_transport_error(&e)))?;

        Ok(Self {
            store,
            base_url: DEFAULT_BASE_URL.to_string(),
            http,
        })
    }

    /// Point the client at another gateway (staging, local fake).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn verify_driving_license(
        &self,
        params: DrivingLicenseParams,
        format: ResponseFormat,
    ) -> Result<VerificationResult> {
        self.verify(&VerificationParams::DrivingLicense(params), format)
            .await
    }

    pub async fn verify_vehicle_registration(
        &self,
        params: VehicleRegistrationParams,
        format: ResponseFormat,
    ) -> Result<VerificationResult> {
        self.verify(&VerificationParams::VehicleRegistration(params), format)
            .await
    }

    /// Verify one certificate.
    ///
    /// Fails with a configuration error before touching the network if either
    /// credential is missing.
    pub async fn verify(
        &self,
        params: &VerificationParams,
        format: ResponseFormat,
    ) -> Result<VerificationResult> {
        let kind = params.kind();
        let payload = VerificationPayload::build(params, format);
        let credentials = self.store.credentials()?;

        let url = format!("{}{}", self.base_url, kind.endpoint());
        tracing::debug!(
            %url,
            txn_id = %payload.txn_id,
            format = %payload.format,
            "sending {} verification request",
            kind.display_name()
        );

        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, credentials.api_key())
            .header(CLIENT_ID_HEADER, credentials.client_id())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| ApiSetuError::Transport(describe_transport_error(&e)))?;

        let status = response.status();
        let body = response.bytes().await;

        if !status.is_success() {
            // A response arrived; an unreadable body only loses the detail.
            let body = body.unwrap_or_default();
            let err = map_status_to_error(status, &body);
            tracing::debug!(status = status.as_u16(), "gateway rejected request: {err}");
            return Err(err);
        }

        let body = body.map_err(|e| ApiSetuError::Transport(describe_transport_error(&e)))?;
        tracing::debug!(status = status.as_u16(), bytes = body.len(), "gateway responded");
        Ok(parse_result(&body))
    }
}

/// Successful bodies are returned as-is; a non-JSON body becomes a JSON string.
fn parse_result(body: &[u8]) -> VerificationResult {
    serde_json::from_slice(body)
        .unwrap_or_else(|_| serde_json::Value::String(String::from_utf8_lossy(body).into_owned()))
}

#[derive(Deserialize)]
struct GatewayErrorBody {
    message: Option<serde_json::Value>,
}

/// Remote detail message, falling back to the HTTP status phrase.
fn error_detail(status: StatusCode, body: &[u8]) -> String {
    let remote = serde_json::from_slice::<GatewayErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .and_then(|m| match m {
            serde_json::Value::String(s) if !s.is_empty() => Some(s),
            serde_json::Value::String(_)
            | serde_json::Value::Null
            | serde_json::Value::Bool(false) => None,
            other => Some(other.to_string()),
        });

    remote.unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown").to_string())
}

/// Map a non-2xx gateway response to a request error.
///
/// Pure: no I/O, usable without a network.
#[must_use]
pub fn map_status_to_error(status: StatusCode, body: &[u8]) -> ApiSetuError {
    let code = status.as_u16();
    let message = match code {
        400 => format!("Bad Request: {}", error_detail(status, body)),
        401 => "Unauthorized: Invalid API credentials".to_string(),
        404 => format!("Not Found: {}", error_detail(status, body)),
        500 => format!("Server Error: {}", error_detail(status, body)),
        502 => "Bad Gateway: Publisher service error".to_string(),
        503 => format!("Service Unavailable: {}", error_detail(status, body)),
        504 => "Gateway Timeout: Service took too long to respond".to_string(),
        _ => format!("API Error ({code}): {}", error_detail(status, body)),
    };
    ApiSetuError::Request {
        status: code,
        message,
    }
}

/// Full cause chain of a client error, joined with `": "`.
fn describe_transport_error(err: &reqwest::Error) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        let text = cause.to_string();
        if parts.last() != Some(&text) {
            parts.push(text);
        }
        source = cause.source();
    }
    parts.join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryCredentialStore;

    fn message(status: u16, body: &str) -> String {
        let status = StatusCode::from_u16(status).unwrap();
        map_status_to_error(status, body.as_bytes()).to_string()
    }

    #[test]
    fn known_statuses_use_remote_detail() {
        let body = r#"{"message":"db down"}"#;
        assert_eq!(message(400, body), "Bad Request: db down");
        assert_eq!(message(404, body), "Not Found: db down");
        assert_eq!(message(500, body), "Server Error: db down");
        assert_eq!(message(503, body), "Service Unavailable: db down");
    }

    #[test]
    fn fixed_messages_ignore_the_body() {
        let body = r#"{"message":"ignored"}"#;
        assert_eq!(message(401, body), "Unauthorized: Invalid API credentials");
        assert_eq!(message(502, body), "Bad Gateway: Publisher service error");
        assert_eq!(message(504, body), "Gateway Timeout: Service took too long to respond");
    }

    #[test]
    fn missing_detail_falls_back_to_status_phrase() {
        assert_eq!(message(400, ""), "Bad Request: Bad Request");
        assert_eq!(message(404, "<html>nope</html>"), "Not Found: Not Found");
        assert_eq!(message(500, r#"{"error":"x"}"#), "Server Error: Internal Server Error");
        assert_eq!(
            message(503, r#"{"message":""}"#),
            "Service Unavailable: Service Unavailable"
        );
    }

    #[test]
    fn other_statuses_include_the_code() {
        assert_eq!(
            message(403, r#"{"message":"forbidden scope"}"#),
            "API Error (403): forbidden scope"
        );
        assert_eq!(message(429, ""), "API Error (429): Too Many Requests");
    }

    #[test]
    fn request_errors_carry_status() {
        let err = map_status_to_error(StatusCode::BAD_GATEWAY, b"");
        assert!(matches!(err, ApiSetuError::Request { status: 502, .. }));
    }

    #[test]
    fn non_json_success_body_is_kept_as_text() {
        assert_eq!(parse_result(b"<xml/>"), serde_json::Value::String("<xml/>".to_string()));
        assert_eq!(parse_result(br#"{"status":"VALID"}"#), serde_json::json!({"status": "VALID"}));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = VerificationClient::new(MemoryCredentialStore::new())
            .unwrap()
            .with_base_url("http://localhost:8080/v3/");
        assert_eq!(client.base_url(), "http://localhost:8080/v3");
    }

    #[tokio::test]
    async fn missing_credentials_fail_before_any_request() {
        // Port 9 (discard) on a non-routable address; never contacted.
        let client = VerificationClient::new(MemoryCredentialStore::new())
            .unwrap()
            .with_base_url("http://192.0.2.1:9");
        let params = DrivingLicenseParams {
            dlno: Some("KL01X1234".to_string()),
            ..Default::default()
        };

        let err = client
            .verify_driving_license(params, ResponseFormat::Xml)
            .await
            .unwrap_err();
        assert!(err.is_configuration(), "unexpected error: {err:?}");
    }
}
