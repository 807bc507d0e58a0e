//! Gemini REST client.
//!
//! The API key is read from the environment exactly once (in `main`) and the
//! resulting config is injected wherever generation is needed, so the crawler
//! path stays testable without ambient state. Placeholder keys route every
//! caller to its deterministic mock output.

use anyhow::{anyhow, Result};
use serde_json::{json, Value};
use tracing::debug;

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
}

impl GeminiConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("GEMINI_API_KEY").ok(),
            model: std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
        }
    }

    /// A key counts as configured only if it looks real; "your-..." template
    /// values and "dummy" force mock behavior for demos.
    pub fn is_configured(&self) -> bool {
        match self.api_key.as_deref() {
            Some(key) => !key.is_empty() && !key.contains("your-") && key != "dummy",
            None => false,
        }
    }
}

pub struct GeminiClient {
    config: GeminiConfig,
    http: reqwest::Client,
    base_url: String,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
            base_url: GEMINI_API_URL.to_string(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    /// Single-prompt text generation via `models/{model}:generateContent`.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("GEMINI_API_KEY not configured"))?;
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.config.model, key
        );

        debug!(model = %self.config.model, "Gemini generate request");

        let response = self
            .http
            .post(&url)
            .json(&json!({
                "contents": [{ "parts": [{ "text": prompt }] }]
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(anyhow!("Gemini API error ({}): {}", status, error_text));
        }

        let body: Value = response.json().await?;
        let text = body["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| anyhow!("Gemini response carried no text candidate"))?;
        Ok(text.to_string())
    }

    /// Generation plus markdown-fence cleanup and JSON parse. The model is
    /// asked for raw JSON but wraps it in ``` fences often enough that we
    /// strip them unconditionally.
    pub async fn generate_json(&self, prompt: &str) -> Result<Value> {
        let text = self.generate(prompt).await?;
        let cleaned = strip_code_fences(&text);
        Ok(serde_json::from_str(&cleaned)?)
    }
}

pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_json_fences() {
        let raw = "```json\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(raw), "{\"a\": 1}");
    }

    #[test]
    fn strips_bare_fences_and_whitespace() {
        assert_eq!(strip_code_fences("```\n[1, 2]\n```  "), "[1, 2]");
        assert_eq!(strip_code_fences("{\"ok\": true}"), "{\"ok\": true}");
    }

    #[test]
    fn placeholder_keys_are_unconfigured() {
        let cases = [None, Some(""), Some("your-api-key-here"), Some("dummy")];
        for key in cases {
            let config = GeminiConfig {
                api_key: key.map(String::from),
                model: DEFAULT_MODEL.to_string(),
            };
            assert!(!config.is_configured(), "key {:?} should be rejected", key);
        }
        let real = GeminiConfig {
            api_key: Some("AIzaSyTest123".to_string()),
            model: DEFAULT_MODEL.to_string(),
        };
        assert!(real.is_configured());
    }
}
