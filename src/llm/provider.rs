//! LLM Provider trait and types
//!
//! Defines the common interface for text-generation backends. The service is
//! treated as a black-box oracle: one prompt in, one text response out, no
//! streaming.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error types for LLM operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LlmError {
    /// Model not found or not pulled
    ModelNotFound(String),
    /// Provider not available (e.g., Ollama not running)
    ProviderUnavailable(String),
    /// Request failed (network, timeout, etc.)
    RequestFailed(String),
    /// Invalid request parameters
    InvalidRequest(String),
    /// Inference/completion failed
    InferenceFailed(String),
    /// Provider not initialized
    NotInitialized,
    /// Generic error
    Other(String),
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmError::ModelNotFound(msg) => write!(f, "Model not found: {}", msg),
            LlmError::ProviderUnavailable(msg) => write!(f, "Provider unavailable: {}", msg),
            LlmError::RequestFailed(msg) => write!(f, "Request failed: {}", msg),
            LlmError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            LlmError::InferenceFailed(msg) => write!(f, "Inference failed: {}", msg),
            LlmError::NotInitialized => write!(f, "Provider not initialized"),
            LlmError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for LlmError {}

/// Role of a message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// A message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Request for text completion/generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Conversation messages
    pub messages: Vec<Message>,
    /// Maximum tokens to generate (None = model default)
    pub max_tokens: Option<u32>,
    /// Temperature for sampling (0.0 = deterministic, 1.0+ = creative)
    pub temperature: Option<f32>,
    /// Top-p nucleus sampling
    pub top_p: Option<f32>,
    /// Stop sequences
    pub stop: Option<Vec<String>>,
}

impl Default for CompletionRequest {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            max_tokens: None,
            temperature: Some(0.7),
            top_p: None,
            stop: None,
        }
    }
}

impl CompletionRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn with_system_and_user(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self::new(vec![Message::system(system), Message::user(user)])
    }
}

/// Response from a completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Generated text content
    pub content: String,
    /// Model that generated the response
    pub model: String,
    /// Number of tokens in the prompt
    pub prompt_tokens: Option<u32>,
    /// Number of tokens generated
    pub completion_tokens: Option<u32>,
}

/// The trait all LLM providers implement
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name (e.g., "ollama")
    fn provider_name(&self) -> &'static str;

    /// Check if the provider is ready (server running, model available)
    async fn is_ready(&self) -> bool;

    /// Run a completion request
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}
