//! # n8n Webhook Client
//!
//! One-shot HTTP calls to n8n workflow webhooks with a uniform response
//! envelope. Two failure tiers are kept apart: a `WebhookError` means the
//! request never completed (connect/DNS/TLS/timeout), while a response
//! carrying `error: true` is a workflow-level failure the caller branches on.

use serde_json::{Map, Value};
use thiserror::Error;

/// Header carrying the shared secret, when one is configured.
pub const SECRET_HEADER: &str = "X-Webhook-Secret";

/// HTTP method for a webhook call. n8n exposes GET for read-only checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WebhookMethod {
    Get,
    #[default]
    Post,
}

/// A single outbound webhook call. Constructed fresh per command invocation,
/// never persisted.
#[derive(Debug, Clone)]
pub struct WebhookRequest {
    /// Webhook path on the n8n instance (e.g. `utr-stock-check`).
    pub path: String,
    pub body: Map<String, Value>,
    pub method: WebhookMethod,
}

impl WebhookRequest {
    pub fn post(path: impl Into<String>, body: Map<String, Value>) -> Self {
        Self {
            path: path.into(),
            body,
            method: WebhookMethod::Post,
        }
    }

    /// GET variant; the body is sent as query parameters instead of JSON.
    pub fn get(path: impl Into<String>, query: Map<String, Value>) -> Self {
        Self {
            path: path.into(),
            body: query,
            method: WebhookMethod::Get,
        }
    }
}

/// What came back from a workflow, normalized so every handler can branch the
/// same way: `is_error` first, then pick fields out of `raw`.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookResponse {
    pub is_error: bool,
    pub status: Option<u16>,
    pub message: Option<String>,
    /// Backend-specific fields, untouched.
    pub raw: Map<String, Value>,
}

impl WebhookResponse {
    fn http_error(status: u16, body: String) -> Self {
        Self {
            is_error: true,
            status: Some(status),
            message: Some(body),
            raw: Map::new(),
        }
    }

    fn from_object(status: u16, raw: Map<String, Value>) -> Self {
        let is_error = raw.get("error").is_some_and(truthy);
        let message = raw
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string);
        Self {
            is_error,
            status: Some(status),
            message,
            raw,
        }
    }

    fn from_text(status: u16, text: String) -> Self {
        let mut raw = Map::new();
        raw.insert("response".to_string(), Value::String(text));
        Self {
            is_error: false,
            status: Some(status),
            message: None,
            raw,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.raw.get(key)
    }

    /// Plain-text body, for workflows that do not answer with JSON.
    pub fn text(&self) -> Option<&str> {
        self.get("response").and_then(Value::as_str)
    }
}

/// Transport-tier failure: the call itself never completed. Distinct from a
/// response with `error: true`, which is a normal (non-exceptional) branch.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("webhook path must not be empty")]
    EmptyPath,
    #[error("webhook request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Client for calling n8n webhooks. One reusable HTTP client for the process
/// lifetime; no retries, no per-call sessions.
pub struct N8nClient {
    base_url: String,
    secret: Option<String>,
    http: reqwest::Client,
}

impl N8nClient {
    pub fn new(base_url: &str, secret: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            secret,
            http: reqwest::Client::new(),
        }
    }

    /// Perform exactly one HTTP round trip and classify the outcome:
    ///
    /// - status >= 400: `is_error` with the raw body text as the message,
    ///   no JSON parse attempted;
    /// - status < 400 with a JSON object body: the object becomes `raw`, and
    ///   a truthy `error` field marks a workflow-level failure;
    /// - status < 400 otherwise: wrapped as `{"response": <text>}`.
    pub async fn invoke(&self, request: &WebhookRequest) -> Result<WebhookResponse, WebhookError> {
        if request.path.is_empty() {
            return Err(WebhookError::EmptyPath);
        }

        let url = format!("{}/webhook/{}", self.base_url, request.path);
        tracing::debug!("Calling webhook {url}");

        let mut builder = match request.method {
            WebhookMethod::Get => self.http.get(&url).query(&request.body),
            WebhookMethod::Post => self.http.post(&url).json(&request.body),
        };
        builder = builder.header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(secret) = &self.secret {
            builder = builder.header(SECRET_HEADER, secret);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        if status >= 400 {
            return Ok(WebhookResponse::http_error(status, text));
        }

        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(raw)) => Ok(WebhookResponse::from_object(status, raw)),
            _ => Ok(WebhookResponse::from_text(status, text)),
        }
    }
}

/// Python-style truthiness. The backend does not guarantee a boolean `error`
/// field, so any non-empty/non-zero value counts as set.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn post(client: &N8nClient, path: &str) -> Result<WebhookResponse, WebhookError> {
        client.invoke(&WebhookRequest::post(path, Map::new())).await
    }

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[tokio::test]
    async fn error_envelope_in_successful_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webhook/ping"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "error": true,
                "message": "x",
            })))
            .mount(&server)
            .await;

        let client = N8nClient::new(&server.uri(), None);
        let response = post(&client, "ping").await.unwrap();
        assert!(response.is_error);
        assert_eq!(response.message.as_deref(), Some("x"));
    }

    #[tokio::test]
    async fn http_error_keeps_body_as_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webhook/ping"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = N8nClient::new(&server.uri(), None);
        let response = post(&client, "ping").await.unwrap();
        assert!(response.is_error);
        assert_eq!(response.status, Some(500));
        assert_eq!(response.message.as_deref(), Some("boom"));
        assert!(response.raw.is_empty());
    }

    #[tokio::test]
    async fn plain_text_body_is_wrapped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webhook/ping"))
            .respond_with(ResponseTemplate::new(200).set_body_string("plain text"))
            .mount(&server)
            .await;

        let client = N8nClient::new(&server.uri(), None);
        let response = post(&client, "ping").await.unwrap();
        assert!(!response.is_error);
        assert_eq!(response.text(), Some("plain text"));
        assert_eq!(response.raw, object(json!({"response": "plain text"})));
    }

    #[tokio::test]
    async fn repeated_invocations_are_identical() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webhook/ping"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
            .mount(&server)
            .await;

        let client = N8nClient::new(&server.uri(), None);
        let request = WebhookRequest::post("ping", object(json!({"a": 1})));
        let first = client.invoke(&request).await.unwrap();
        let second = client.invoke(&request).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn secret_header_sent_when_configured() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webhook/ping"))
            .and(header(SECRET_HEADER, "s3cret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let client = N8nClient::new(&server.uri(), Some("s3cret".to_string()));
        post(&client, "ping").await.unwrap();
    }

    #[tokio::test]
    async fn secret_header_absent_when_unset() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webhook/ping"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let client = N8nClient::new(&server.uri(), None);
        post(&client, "ping").await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(!requests[0].headers.contains_key("x-webhook-secret"));
    }

    #[tokio::test]
    async fn post_sends_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webhook/ping"))
            .and(body_json(json!({"a": 1})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let client = N8nClient::new(&server.uri(), None);
        client
            .invoke(&WebhookRequest::post("ping", object(json!({"a": 1}))))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn get_sends_query_parameters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/webhook/health"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let client = N8nClient::new(&server.uri(), None);
        let request = WebhookRequest::get("health", object(json!({"service": "plex"})));
        client.invoke(&request).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests[0].url.query(), Some("service=plex"));
    }

    #[tokio::test]
    async fn empty_path_is_rejected_without_a_request() {
        let client = N8nClient::new("http://127.0.0.1:1", None);
        let result = post(&client, "").await;
        assert!(matches!(result, Err(WebhookError::EmptyPath)));
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() {
        let client = N8nClient::new("http://127.0.0.1:1", None);
        let result = post(&client, "ping").await;
        assert!(matches!(result, Err(WebhookError::Transport(_))));
    }

    #[test]
    fn truthiness_matches_backend_conventions() {
        assert!(truthy(&json!(true)));
        assert!(truthy(&json!("oops")));
        assert!(truthy(&json!(1)));
        assert!(!truthy(&json!(false)));
        assert!(!truthy(&json!(null)));
        assert!(!truthy(&json!("")));
        assert!(!truthy(&json!(0)));
    }
}
