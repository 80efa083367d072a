//! Terminal chat client for Groq, OpenAI, Anthropic and local Ollama models.
//!
//! [`ChatClient`] keeps the conversation transcript and forwards it to the
//! provider adapter picked once from configuration.

pub mod client;
pub mod commands;
pub mod config;
pub mod llm;
pub mod ui;

pub use client::ChatClient;
