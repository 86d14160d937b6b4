//! Ollama API provider
//!
//! Connects to a running Ollama server (default: localhost:11434)

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::provider::{
    CompletionRequest, CompletionResponse, LlmError, LlmProvider, Message, MessageRole,
};

/// Ollama API message format
#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

impl From<&Message> for OllamaMessage {
    fn from(msg: &Message) -> Self {
        Self {
            role: match msg.role {
                MessageRole::System => "system".to_string(),
                MessageRole::User => "user".to_string(),
                MessageRole::Assistant => "assistant".to_string(),
            },
            content: msg.content.clone(),
        }
    }
}

/// Ollama chat request
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

/// Ollama chat response
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
    model: String,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

/// Ollama version response
#[derive(Debug, Deserialize)]
struct OllamaVersion {
    version: String,
}

/// Ollama provider configuration
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.1".to_string(),
            timeout_secs: 120,
        }
    }
}

/// Ollama LLM provider
pub struct OllamaProvider {
    config: OllamaConfig,
    client: Client,
}

impl OllamaProvider {
    pub fn new(config: OllamaConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    pub fn with_default_config() -> Result<Self, LlmError> {
        Self::new(OllamaConfig::default())
    }

    /// Check if the Ollama server is running
    pub async fn check_connection(&self) -> Result<String, LlmError> {
        let url = format!("{}/api/version", self.config.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LlmError::ProviderUnavailable(format!("Cannot connect to Ollama: {}", e)))?;

        let version: OllamaVersion = response
            .json()
            .await
            .map_err(|e| LlmError::ProviderUnavailable(format!("Bad version response: {}", e)))?;

        Ok(version.version)
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn provider_name(&self) -> &'static str {
        "ollama"
    }

    async fn is_ready(&self) -> bool {
        self.check_connection().await.is_ok()
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        if request.messages.is_empty() {
            return Err(LlmError::InvalidRequest("no messages provided".to_string()));
        }

        let options = OllamaOptions {
            temperature: request.temperature,
            top_p: request.top_p,
            num_predict: request.max_tokens,
            stop: request.stop.clone(),
        };

        let body = OllamaChatRequest {
            model: self.config.model.clone(),
            messages: request.messages.iter().map(OllamaMessage::from).collect(),
            stream: false,
            options: Some(options),
        };

        let url = format!("{}/api/chat", self.config.base_url);
        debug!("Sending completion request to {} ({})", url, self.config.model);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            if status.as_u16() == 404 {
                return Err(LlmError::ModelNotFound(format!(
                    "{} (is `{}` pulled?)",
                    text, self.config.model
                )));
            }
            return Err(LlmError::InferenceFailed(format!("{}: {}", status, text)));
        }

        let chat: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InferenceFailed(format!("unparseable response: {}", e)))?;

        Ok(CompletionResponse {
            content: chat.message.content,
            model: chat.model,
            prompt_tokens: chat.prompt_eval_count,
            completion_tokens: chat.eval_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OllamaConfig::default();
        assert_eq!(config.base_url, "http://localhost:11434");
        assert_eq!(config.timeout_secs, 120);
    }

    #[test]
    fn test_message_role_mapping() {
        let msg = Message::system("you are helpful");
        let ollama = OllamaMessage::from(&msg);
        assert_eq!(ollama.role, "system");
    }
}
