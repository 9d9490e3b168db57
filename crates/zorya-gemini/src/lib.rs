//! Gemini adapter for the text-generation port. One POST per call; retry
//! policy lives with the caller.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use zorya_core::generation::TextGenerator;
use zorya_core::{Error, Result};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub struct GeminiClient {
    api_key: String,
    model: String,
    temperature: f64,
    http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, temperature: f64) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            temperature,
            http: reqwest::Client::builder()
                .build()
                .expect("reqwest client build"),
        }
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str, timeout: Duration) -> Result<String> {
        let url = format!("{API_BASE}/{}:generateContent", self.model);
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "temperature": self.temperature },
        });
        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| Error::Provider(format!("gemini request failed: {e}")))?;

        let status = response.status();
        let payload = response
            .text()
            .await
            .map_err(|e| Error::Provider(format!("gemini response unreadable: {e}")))?;
        if !status.is_success() {
            let snippet: String = payload.chars().take(200).collect();
            return Err(Error::Provider(format!("gemini returned {status}: {snippet}")));
        }

        let value: Value = serde_json::from_str(&payload)
            .map_err(|e| Error::Provider(format!("gemini returned non-JSON: {e}")))?;
        extract_text(&value)
            .ok_or_else(|| Error::Provider("gemini response carried no candidates".to_string()))
    }
}

/// Join the text parts of the first candidate. `None` means no usable
/// candidate at all; a present-but-empty part list yields an empty string,
/// which the soft-failure handling upstream treats as a retryable blank.
fn extract_text(value: &Value) -> Option<String> {
    let parts = value
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;
    let text = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join("");
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_joined_candidate_text() {
        let value: Value = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Зірки "},{"text":"кажуть"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_text(&value).as_deref(), Some("Зірки кажуть"));
    }

    #[test]
    fn empty_parts_yield_an_empty_string() {
        let value: Value =
            serde_json::from_str(r#"{"candidates":[{"content":{"parts":[]}}]}"#).unwrap();
        assert_eq!(extract_text(&value).as_deref(), Some(""));
    }

    #[test]
    fn missing_candidates_yield_none() {
        let value: Value = serde_json::from_str(r#"{"promptFeedback":{}}"#).unwrap();
        assert_eq!(extract_text(&value), None);
    }
}
