use crate::config::GatewayConfig;
use crate::models::InlinePayload;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde_json::{Value, json};

/// Text generation backend. Any error is treated by callers as "upstream failed".
#[async_trait]
pub trait GenerativeClient: Send + Sync {
    async fn generate_text(&self, prompt: &str) -> Result<String>;

    async fn generate_from_payload(&self, prompt: &str, payload: &InlinePayload) -> Result<String>;
}

pub struct GeminiClient {
    http: reqwest::Client,
    api_base: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .build()
            .context("Failed to build upstream HTTP client")?;

        Ok(Self {
            http,
            api_base: config.api_base.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn endpoint(&self) -> String {
        let model = self.model.trim();
        let model_path = if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{}", model)
        };
        format!("{}/{}:generateContent", self.api_base, model_path)
    }

    async fn generate(&self, parts: Vec<Value>) -> Result<String> {
        let body = json!({
            "contents": [{ "role": "user", "parts": parts }]
        });

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("Upstream request failed")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(anyhow!("Upstream returned {}: {}", status, detail));
        }

        let payload: Value = response
            .json()
            .await
            .context("Upstream response was not valid JSON")?;

        extract_text(&payload)
    }
}

#[async_trait]
impl GenerativeClient for GeminiClient {
    async fn generate_text(&self, prompt: &str) -> Result<String> {
        self.generate(vec![json!({ "text": prompt })]).await
    }

    async fn generate_from_payload(&self, prompt: &str, payload: &InlinePayload) -> Result<String> {
        self.generate(vec![
            json!({
                "inline_data": {
                    "mime_type": payload.mime_type,
                    "data": payload.base64_data,
                }
            }),
            json!({ "text": prompt }),
        ])
        .await
    }
}

/// Concatenate the text parts of the first candidate
fn extract_text(payload: &Value) -> Result<String> {
    if let Some(reason) = payload
        .pointer("/promptFeedback/blockReason")
        .and_then(Value::as_str)
    {
        return Err(anyhow!("Prompt was blocked upstream: {}", reason));
    }

    let parts = payload
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("Upstream response contained no candidates"))?;

    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();

    if text.is_empty() {
        return Err(anyhow!("Upstream response contained no text"));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_prefixes_model_path() {
        let mut config = GatewayConfig::production();
        config.model = "gemini-1.5-pro".to_string();
        let client = GeminiClient::new(&config).unwrap();
        assert_eq!(
            client.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-pro:generateContent"
        );

        config.model = "models/gemini-1.5-pro".to_string();
        let client = GeminiClient::new(&config).unwrap();
        assert!(client.endpoint().ends_with("/models/gemini-1.5-pro:generateContent"));
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let payload = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "AI is " }, { "text": "useful." }] }
            }]
        });
        assert_eq!(extract_text(&payload).unwrap(), "AI is useful.");
    }

    #[test]
    fn test_extract_text_errors() {
        assert!(extract_text(&json!({})).is_err());
        assert!(extract_text(&json!({ "candidates": [{ "content": { "parts": [] } }] })).is_err());
        assert!(
            extract_text(&json!({ "promptFeedback": { "blockReason": "SAFETY" } }))
                .unwrap_err()
                .to_string()
                .contains("SAFETY")
        );
    }
}
