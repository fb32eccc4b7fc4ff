//! OpenAI Chat Completions transport with `json_schema` structured output.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::InferenceError;
use crate::backend::{ModelRequest, Transport};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub struct OpenAiTransport {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}

impl OpenAiTransport {
    pub fn new(api_key: &str, model: &str) -> Result<Self, InferenceError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: OPENAI_BASE_URL.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    /// Point at an OpenAI-compatible endpoint, e.g. `http://localhost:8080/v1`.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn body(&self, request: &ModelRequest<'_>) -> Value {
        let mut content = Vec::with_capacity(request.images.len() + 1);
        if let Some(text) = &request.text {
            content.push(json!({"type": "text", "text": text}));
        }
        for url in &request.images {
            content.push(json!({"type": "image_url", "image_url": {"url": url}}));
        }

        json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": request.system_prompt},
                {"role": "user", "content": content},
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": request.schema,
            },
        })
    }
}

#[async_trait]
impl Transport for OpenAiTransport {
    async fn generate(&self, request: &ModelRequest<'_>) -> Result<String, InferenceError> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(
            url = %url,
            model = %self.model,
            schema = %request.schema["name"],
            images = request.images.len(),
            "sending chat completion"
        );

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.body(request))
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(InferenceError::Server {
                status: status.as_u16(),
                body,
            });
        }

        extract_content(&body)
    }
}

fn extract_content(body: &str) -> Result<String, InferenceError> {
    let parsed: ChatResponse = serde_json::from_str(body)?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(InferenceError::EmptyResponse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use realview_core::schema;

    fn transport() -> OpenAiTransport {
        OpenAiTransport::new("sk-test", "gpt-4.1-mini").unwrap()
    }

    #[test]
    fn base_url_trims_trailing_slash() {
        let t = transport().with_base_url("http://localhost:8080/v1/");
        assert_eq!(t.base_url, "http://localhost:8080/v1");
    }

    #[test]
    fn body_orders_text_before_images() {
        let request = ModelRequest {
            system_prompt: "sys".into(),
            schema: schema::consolidation_schema(),
            text: Some("Room type to consolidate: kitchen".into()),
            images: vec!["data:image/png;base64,AA", "data:image/png;base64,BB"],
        };
        let body = transport().body(&request);

        assert_eq!(body["model"], "gpt-4.1-mini");
        assert_eq!(body["messages"][0]["content"], "sys");
        let content = body["messages"][1]["content"].as_array().unwrap();
        assert_eq!(content.len(), 3);
        assert_eq!(content[0]["type"], "text");
        assert_eq!(content[2]["image_url"]["url"], "data:image/png;base64,BB");
        assert_eq!(body["response_format"]["json_schema"]["name"], "pass25_result");
        assert_eq!(body["response_format"]["json_schema"]["strict"], true);
    }

    #[test]
    fn extract_first_choice_content() {
        let body = r#"{"choices": [{"message": {"role": "assistant", "content": "{\"features\": []}"}}]}"#;
        assert_eq!(extract_content(body).unwrap(), r#"{"features": []}"#);
    }

    #[test]
    fn missing_content_is_empty_response() {
        let null_content = r#"{"choices": [{"message": {"content": null}}]}"#;
        assert!(matches!(
            extract_content(null_content),
            Err(InferenceError::EmptyResponse)
        ));
        assert!(matches!(
            extract_content(r#"{"choices": []}"#),
            Err(InferenceError::EmptyResponse)
        ));
    }

    #[test]
    fn malformed_envelope_is_json_error() {
        assert!(matches!(
            extract_content("<html>bad gateway</html>"),
            Err(InferenceError::Json(_))
        ));
    }
}
