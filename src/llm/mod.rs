//! Provider adapters for hosted and local chat models.
//!
//! Every adapter implements [`provider::ProviderAdapter`], taking the whole
//! transcript and returning the assistant reply as plain text.

/// Anthropic Messages API adapter.
pub mod anthropic;
pub(crate) mod http;
/// Ollama local chat adapter.
pub mod ollama;
/// Groq and OpenAI chat-completions adapter.
pub mod openai_compat;
/// Provider ids, transcript messages, and adapter dispatch.
pub mod provider;
#[cfg(test)]
pub(crate) mod scripted;
