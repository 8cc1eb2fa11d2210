//! External API integrations

pub mod llm;

pub use llm::{GroqClient, LlmBackend, LlmError, LlmProvider, OllamaClient, TextGenerator};
