//! Text generation behind an OpenAI-compatible chat completions endpoint.
//!
//! Works with Ollama, vLLM, LM Studio, OpenAI and any server that speaks the
//! same wire format. Failures never propagate past [`TextGenerator::generate`];
//! they become sentinel answer text so the evaluation flow can continue.

use crate::config::GenerationConfig;
use crate::error::GenerationError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Answer text used when the endpoint replied but carried no assistant content.
pub const EXTRACTION_FAILED: &str = "Failed to extract the response.";

/// A generated answer and how long it took.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub text: String,
    /// Wall-clock seconds; `0.0` when the request failed outright.
    pub elapsed_secs: f64,
}

impl Generation {
    fn failed(error: &GenerationError) -> Self {
        Self {
            text: format!("An error occurred: {error}"),
            elapsed_secs: 0.0,
        }
    }
}

/// Produces an answer for a single-turn prompt.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Generation;

    /// Model identifier, for display and logging.
    fn model_name(&self) -> &str;
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiCompatibleGenerator {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_new_tokens: u32,
    temperature: f32,
    top_p: f32,
    timeout_secs: u64,
}

impl OpenAiCompatibleGenerator {
    /// Create a generator from configuration.
    ///
    /// The API key comes from `config.api_key`, then the environment variable named
    /// by `config.api_key_env`. Local endpoints get a placeholder key.
    pub fn new(config: &GenerationConfig) -> Result<Self, GenerationError> {
        let is_local =
            config.base_url.contains("localhost") || config.base_url.contains("127.0.0.1");

        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var(&config.api_key_env).ok())
            .or_else(|| {
                if is_local {
                    debug!("No API key set for local endpoint; using dummy bearer token");
                    Some("ollama".to_string())
                } else {
                    None
                }
            })
            .ok_or_else(|| GenerationError::AuthFailed {
                message: format!("env var '{}' not set", config.api_key_env),
            })?;

        Self::new_with_key(config, api_key)
    }

    /// Create a generator with an explicitly provided API key.
    pub fn new_with_key(config: &GenerationConfig, api_key: String) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GenerationError::ApiRequest {
                message: format!("Failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            max_new_tokens: config.max_new_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
            timeout_secs: config.timeout_secs,
        })
    }

    fn request_body(&self, prompt: &str) -> Value {
        json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "max_tokens": self.max_new_tokens,
            "temperature": self.temperature,
            "top_p": self.top_p,
            "stream": false,
        })
    }

    /// Send one completion request and return the trimmed assistant text.
    pub async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(url = %url, model = %self.model, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout {
                        timeout_secs: self.timeout_secs,
                    }
                } else {
                    GenerationError::ApiRequest {
                        message: format!("Request failed: {e}"),
                    }
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| GenerationError::ApiRequest {
            message: format!("Failed to read response body: {e}"),
        })?;

        if !status.is_success() {
            return Err(map_http_error(status, &body));
        }

        let json: Value = serde_json::from_str(&body).map_err(|e| GenerationError::ResponseParse {
            message: format!("Invalid JSON: {e}"),
        })?;
        parse_completion(&json)
    }
}

#[async_trait]
impl TextGenerator for OpenAiCompatibleGenerator {
    async fn generate(&self, prompt: &str) -> Generation {
        let start = Instant::now();
        match self.complete(prompt).await {
            Ok(text) => {
                let elapsed_secs = start.elapsed().as_secs_f64();
                info!(model = %self.model, elapsed_secs, "Generated response");
                Generation { text, elapsed_secs }
            }
            Err(GenerationError::ResponseParse { message }) => {
                warn!(%message, "Could not extract assistant response");
                Generation {
                    text: EXTRACTION_FAILED.to_string(),
                    elapsed_secs: start.elapsed().as_secs_f64(),
                }
            }
            Err(e) => {
                warn!(error = %e, "Generation failed");
                Generation::failed(&e)
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Extract `choices[0].message.content`; blank content counts as missing.
fn parse_completion(body: &Value) -> Result<String, GenerationError> {
    let message = body
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .ok_or_else(|| GenerationError::ResponseParse {
            message: "No message in response".to_string(),
        })?;

    let text = message
        .get("content")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default();

    if text.is_empty() {
        return Err(GenerationError::ResponseParse {
            message: "Empty assistant content".to_string(),
        });
    }
    Ok(text.to_string())
}

fn map_http_error(status: reqwest::StatusCode, body: &str) -> GenerationError {
    match status.as_u16() {
        401 | 403 => {
            debug!(body = %body, "Authentication failed ({})", status);
            GenerationError::AuthFailed {
                message: format!("HTTP {status}"),
            }
        }
        code if code >= 500 => GenerationError::ApiRequest {
            message: format!("Server error ({status}): {body}"),
        },
        _ => GenerationError::ApiRequest {
            message: format!("HTTP {status}: {body}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_config() -> GenerationConfig {
        GenerationConfig {
            base_url: "http://localhost:11434/v1/".to_string(),
            api_key_env: "EVALOG_TEST_KEY_THAT_IS_NOT_SET".to_string(),
            ..GenerationConfig::default()
        }
    }

    #[test]
    fn test_local_endpoint_needs_no_key() {
        let generator = OpenAiCompatibleGenerator::new(&local_config()).unwrap();
        assert_eq!(generator.api_key, "ollama");
        assert_eq!(generator.base_url, "http://localhost:11434/v1");
        assert_eq!(generator.model_name(), "llama3.2:3b");
    }

    #[test]
    fn test_remote_endpoint_requires_key() {
        let config = GenerationConfig {
            base_url: "https://api.example.com/v1".to_string(),
            ..local_config()
        };
        let result = OpenAiCompatibleGenerator::new(&config);
        assert!(matches!(result, Err(GenerationError::AuthFailed { .. })));
    }

    #[test]
    fn test_explicit_key_wins() {
        let config = GenerationConfig {
            api_key: Some("sk-test".to_string()),
            ..local_config()
        };
        let generator = OpenAiCompatibleGenerator::new(&config).unwrap();
        assert_eq!(generator.api_key, "sk-test");
    }

    #[test]
    fn test_request_body_carries_sampling_settings() {
        let generator = OpenAiCompatibleGenerator::new(&local_config()).unwrap();
        let body = generator.request_body("What is Rust?");
        assert_eq!(body["max_tokens"], 512);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "What is Rust?");
        assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
        assert!((body["top_p"].as_f64().unwrap() - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_parse_completion() {
        let body = json!({
            "choices": [{ "message": { "role": "assistant", "content": "  Hello there.\n" } }]
        });
        assert_eq!(parse_completion(&body).unwrap(), "Hello there.");
    }

    #[test]
    fn test_parse_completion_missing_or_blank() {
        assert!(matches!(
            parse_completion(&json!({ "choices": [] })),
            Err(GenerationError::ResponseParse { .. })
        ));
        let blank = json!({ "choices": [{ "message": { "content": "   " } }] });
        assert!(matches!(
            parse_completion(&blank),
            Err(GenerationError::ResponseParse { .. })
        ));
    }

    #[test]
    fn test_map_http_error() {
        use reqwest::StatusCode;
        assert!(matches!(
            map_http_error(StatusCode::UNAUTHORIZED, ""),
            GenerationError::AuthFailed { .. }
        ));
        let err = map_http_error(StatusCode::BAD_GATEWAY, "upstream down");
        assert!(err.to_string().contains("Server error"));
        assert!(err.to_string().contains("upstream down"));
    }

    #[test]
    fn test_failed_generation_text() {
        let generation = Generation::failed(&GenerationError::Timeout { timeout_secs: 5 });
        assert_eq!(generation.text, "An error occurred: Request timed out after 5s");
        assert_eq!(generation.elapsed_secs, 0.0);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_yields_error_text() {
        let config = GenerationConfig {
            base_url: "http://127.0.0.1:9/v1".to_string(),
            timeout_secs: 2,
            ..local_config()
        };
        let generator = OpenAiCompatibleGenerator::new(&config).unwrap();
        let generation = generator.generate("hello").await;
        assert!(generation.text.starts_with("An error occurred: "));
        assert_eq!(generation.elapsed_secs, 0.0);
    }
}
