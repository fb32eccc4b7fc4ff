//! Google Gemini `generateContent` transport with JSON response schema.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::InferenceError;
use crate::backend::{ModelRequest, Transport};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// JSON Schema keywords the Gemini response schema does not accept.
const UNSUPPORTED_SCHEMA_KEYS: &[&str] = &["additionalProperties", "minimum", "maximum"];

pub struct GeminiTransport {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiTransport {
    pub fn new(api_key: &str, model: &str) -> Result<Self, InferenceError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: GEMINI_BASE_URL.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn generate_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn body(&self, request: &ModelRequest<'_>) -> Result<Value, InferenceError> {
        let mut parts = Vec::with_capacity(request.images.len() + 1);
        if let Some(text) = &request.text {
            parts.push(json!({"text": text}));
        }
        for url in &request.images {
            let (mime_type, data) = split_data_url(url)?;
            parts.push(json!({"inline_data": {"mime_type": mime_type, "data": data}}));
        }

        // The structured-output envelope wraps the actual schema.
        let raw_schema = request.schema.get("schema").unwrap_or(&request.schema);

        Ok(json!({
            "system_instruction": {"parts": [{"text": request.system_prompt}]},
            "contents": [{"role": "user", "parts": parts}],
            "generation_config": {
                "response_mime_type": "application/json",
                "response_schema": clean_schema(raw_schema),
            },
        }))
    }
}

#[async_trait]
impl Transport for GeminiTransport {
    async fn generate(&self, request: &ModelRequest<'_>) -> Result<String, InferenceError> {
        let url = self.generate_url();
        let body = self.body(request)?;
        debug!(
            url = %url,
            schema = %request.schema["name"],
            images = request.images.len(),
            "sending generateContent"
        );

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(InferenceError::Server {
                status: status.as_u16(),
                body: text,
            });
        }

        extract_text(&text)
    }
}

/// Split `data:<mime>;base64,<payload>` into mime type and payload.
fn split_data_url(url: &str) -> Result<(&str, &str), InferenceError> {
    let (header, payload) = url
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
        .ok_or_else(|| InferenceError::InvalidImage("expected data:<mime>;base64,<payload>".into()))?;
    let mime_type = header
        .strip_suffix(";base64")
        .ok_or_else(|| InferenceError::InvalidImage(format!("not base64 encoded: {header}")))?;
    if mime_type.is_empty() || payload.is_empty() {
        return Err(InferenceError::InvalidImage("empty mime type or payload".into()));
    }
    Ok((mime_type, payload))
}

/// Drop unsupported keywords and upper-case `type` values, recursively.
fn clean_schema(schema: &Value) -> Value {
    match schema {
        Value::Object(map) => {
            let cleaned: Map<String, Value> = map
                .iter()
                .filter(|(key, _)| !UNSUPPORTED_SCHEMA_KEYS.contains(&key.as_str()))
                .map(|(key, value)| {
                    let value = match (key.as_str(), value) {
                        ("type", Value::String(t)) => Value::String(t.to_ascii_uppercase()),
                        _ => clean_schema(value),
                    };
                    (key.clone(), value)
                })
                .collect();
            Value::Object(cleaned)
        }
        Value::Array(items) => Value::Array(items.iter().map(clean_schema).collect()),
        other => other.clone(),
    }
}

fn extract_text(body: &str) -> Result<String, InferenceError> {
    let parsed: GenerateResponse = serde_json::from_str(body)?;
    let text: String = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(InferenceError::EmptyResponse);
    }
    Ok(text)
}
