// LLM integration: the provider port, the Ollama HTTP adapter and the
// structured-output parsing utilities.

pub mod json;
pub mod ollama;
pub mod provider;
pub mod sections;

pub use json::extract_json_block;
pub use ollama::{OllamaConfig, OllamaProvider};
pub use provider::{
    CompletionRequest, CompletionResponse, LlmError, LlmProvider, Message, MessageRole,
};
