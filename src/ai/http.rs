//! HTTP client for a chat-style text-generation service
//!
//! Speaks either the Anthropic messages API or the Ollama chat API. One
//! request per prompt, no streaming and no retry.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{json, Value};
use tracing::{debug, error};

use crate::config::{AiProvider, Settings};
use crate::error::{FinanceError, FinanceResult};

use super::TextGenerator;

const SYSTEM_PROMPT: &str = "You are a careful personal finance assistant. \
    Work only from the figures you are given and answer concisely.";

const ANTHROPIC_VERSION: &str = "2023-06-01";

const MAX_TOKENS: u32 = 1024;

/// Blocking HTTP text generator
pub struct HttpTextGenerator {
    client: Client,
    provider: AiProvider,
    url: String,
    model: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for HttpTextGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTextGenerator")
            .field("provider", &self.provider)
            .field("url", &self.url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<set>"))
            .finish()
    }
}

impl HttpTextGenerator {
    /// Build a client from settings
    ///
    /// The Anthropic provider needs a key, from `FINTRACK_AI_KEY` or the
    /// settings file.
    pub fn from_settings(settings: &Settings) -> FinanceResult<Self> {
        let api_key = settings.ai_api_key();
        if settings.ai.provider == AiProvider::Anthropic && api_key.is_none() {
            return Err(FinanceError::Config(format!(
                "The anthropic provider needs an API key; set {}",
                crate::config::settings::AI_KEY_ENV
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.ai.timeout_secs))
            .build()
            .map_err(|e| FinanceError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            provider: settings.ai.provider,
            url: settings.ai.url.clone(),
            model: settings.ai.model.clone(),
            api_key,
        })
    }

    fn headers(&self) -> FinanceResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        if self.provider == AiProvider::Anthropic {
            if let Some(key) = &self.api_key {
                let value = HeaderValue::from_str(key).map_err(|_| {
                    FinanceError::Config("API key contains invalid characters".into())
                })?;
                headers.insert("x-api-key", value);
            }
            headers.insert("anthropic-version", HeaderValue::from_static(ANTHROPIC_VERSION));
        }
        Ok(headers)
    }
}

/// Request body for the given provider
fn request_body(provider: AiProvider, model: &str, prompt: &str) -> Value {
    match provider {
        AiProvider::Anthropic => json!({
            "model": model,
            "max_tokens": MAX_TOKENS,
            "system": SYSTEM_PROMPT,
            "messages": [
                {"role": "user", "content": prompt}
            ]
        }),
        AiProvider::Ollama => json!({
            "model": model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": prompt}
            ],
            "stream": false
        }),
    }
}

/// Pull the generated text out of a provider response
fn response_text(provider: AiProvider, body: &Value) -> FinanceResult<String> {
    let text = match provider {
        AiProvider::Anthropic => body["content"][0]["text"].as_str(),
        AiProvider::Ollama => body["message"]["content"].as_str(),
    };
    text.map(str::to_string).ok_or_else(|| {
        FinanceError::Insight(format!("Unexpected response shape from {} service", provider))
    })
}

impl TextGenerator for HttpTextGenerator {
    fn generate(&self, prompt: &str) -> FinanceResult<String> {
        debug!(
            provider = %self.provider,
            model = %self.model,
            chars = prompt.len(),
            "sending prompt"
        );

        let resp = self
            .client
            .post(&self.url)
            .headers(self.headers()?)
            .json(&request_body(self.provider, &self.model, prompt))
            .send()
            .map_err(|e| FinanceError::Insight(format!("Text service unavailable: {}", e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().unwrap_or_default();
            error!(%status, body = %text, "text service returned an error");
            return Err(FinanceError::Insight(format!(
                "Text service returned {}",
                status
            )));
        }

        let body: Value = resp.json()?;
        response_text(self.provider, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ollama_body() {
        let body = request_body(AiProvider::Ollama, "llama3", "hello");
        assert_eq!(body["model"], "llama3");
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"][1]["content"], "hello");
    }

    #[test]
    fn test_anthropic_body() {
        let body = request_body(AiProvider::Anthropic, "some-model", "hello");
        assert_eq!(body["max_tokens"], 1024);
        assert_eq!(body["messages"][0]["role"], "user");
        assert!(body["system"].is_string());
    }

    #[test]
    fn test_response_text() {
        let ollama = json!({"message": {"role": "assistant", "content": "- Spend less"}});
        assert_eq!(
            response_text(AiProvider::Ollama, &ollama).unwrap(),
            "- Spend less"
        );

        let anthropic = json!({"content": [{"type": "text", "text": "ok"}]});
        assert_eq!(response_text(AiProvider::Anthropic, &anthropic).unwrap(), "ok");
    }

    #[test]
    fn test_unexpected_response_is_error() {
        let err =
            response_text(AiProvider::Ollama, &json!({"error": "model not found"})).unwrap_err();
        assert!(matches!(err, FinanceError::Insight(_)));
    }

    #[test]
    fn test_debug_hides_key() {
        let mut settings = Settings::default();
        settings.ai.api_key = Some("placeholder-key".into());
        let generator = HttpTextGenerator::from_settings(&settings).unwrap();
        let debug = format!("{:?}", generator);
        assert!(!debug.contains("placeholder-key"));
    }
}
