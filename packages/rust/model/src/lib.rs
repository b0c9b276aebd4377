//! Generative-model collaborator for deploynote.
//!
//! One synchronous chat-completions exchange per invocation against an
//! OpenAI-compatible endpoint (DeepSeek by default). There is no retry:
//! the pipeline runs once per change-request event, and retrying a flaky
//! call would duplicate user-visible comments rather than fix anything.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use deploynote_shared::{DeployNoteError, Result};

// ---------------------------------------------------------------------------
// ModelClient trait
// ---------------------------------------------------------------------------

/// The generative-model operation the pipeline depends on.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Submit one prompt exchange and return the raw trimmed completion
    /// text. The text is untrusted; structural validation happens downstream.
    async fn complete(&self, system: &str, prompt: &str) -> Result<String>;
}

// ---------------------------------------------------------------------------
// Chat client
// ---------------------------------------------------------------------------

/// Decoding parameters for a completion request.
#[derive(Debug, Clone)]
pub struct ModelParams {
    /// Model ID (e.g. `deepseek-reasoner`).
    pub model: String,
    /// Fixed sampling temperature.
    pub temperature: f32,
    /// Output-length cap in tokens.
    pub max_tokens: u32,
}

/// Chat-completions client for OpenAI-compatible APIs.
pub struct ChatClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    params: ModelParams,
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

impl ChatClient {
    /// Build a client. The key must already be present: a missing credential
    /// is a configuration error raised before any network call.
    pub fn new(base_url: &str, api_key: String, params: ModelParams) -> Result<Self> {
        if api_key.is_empty() {
            return Err(DeployNoteError::config("model API key is empty"));
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!("deploynote/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| DeployNoteError::synthesis_from("failed to build HTTP client", e))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            params,
        })
    }
}

#[async_trait]
impl ModelClient for ChatClient {
    #[instrument(skip_all, fields(model = %self.params.model))]
    async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.params.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.params.temperature,
            max_tokens: self.params.max_tokens,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| DeployNoteError::synthesis_from("chat completion request failed", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeployNoteError::synthesis(format!(
                "chat completion failed: HTTP {status}: {body}"
            )));
        }

        let body: ChatResponse = response.json().await.map_err(|e| {
            DeployNoteError::synthesis_from("invalid chat completion response", e)
        })?;

        // An empty choice list yields an empty candidate; the validator
        // downstream repairs it to the null note.
        let text = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();

        debug!(len = text.len(), "completion received");
        Ok(text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ModelParams {
        ModelParams {
            model: "deepseek-reasoner".into(),
            temperature: 0.3,
            max_tokens: 1000,
        }
    }

    #[test]
    fn empty_api_key_is_a_config_error() {
        let err = ChatClient::new("https://api.deepseek.com/v1", String::new(), params())
            .err()
            .expect("empty key must be rejected");
        assert!(err.to_string().starts_with("config error"));
    }

    #[test]
    fn base_url_is_normalized() {
        let client =
            ChatClient::new("https://api.deepseek.com/v1/", "key".into(), params()).unwrap();
        assert_eq!(client.base_url, "https://api.deepseek.com/v1");
    }

    #[test]
    fn request_serializes_with_fixed_decoding() {
        let request = ChatRequest {
            model: "deepseek-reasoner",
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "sys",
                },
                ChatMessage {
                    role: "user",
                    content: "prompt",
                },
            ],
            temperature: 0.3,
            max_tokens: 1000,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "deepseek-reasoner");
        let temperature = json["temperature"].as_f64().unwrap();
        assert!((temperature - 0.3).abs() < 1e-6);
        assert_eq!(json["max_tokens"], 1000);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "prompt");
    }

    #[test]
    fn response_deserializes() {
        let json = r####"{
            "choices": [
                { "message": { "role": "assistant", "content": "### note text" } }
            ]
        }"####;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.choices[0].message.content, "### note text");
    }

    #[test]
    fn response_tolerates_no_choices() {
        let json = r#"{ "choices": [] }"#;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        assert!(response.choices.is_empty());
    }
}
