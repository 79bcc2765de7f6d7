//! Chat orchestration on top of the rate limit store.
//!
//! - [`ChatOrchestrator`]: gates each message, sends it, counts it on success.
//! - [`CompletionClient`]: the completion endpoint seam; [`OpenRouterClient`] talks to
//!   OpenRouter (feature `openrouter`).
//! - [`Message`] and helpers that annotate replies with code blocks, a category, and
//!   follow-up suggestions.

pub mod client;
pub mod message;
pub mod model;
#[cfg(feature = "openrouter")]
pub mod openrouter;
pub mod orchestrator;

pub use client::CompletionClient;
pub use message::{
    determine_category, generate_quick_replies, parse_code_blocks, Category, CodeBlock, Message,
};
pub use model::{default_models, AiModel, SYSTEM_PROMPT};
#[cfg(feature = "openrouter")]
pub use openrouter::OpenRouterClient;
pub use orchestrator::ChatOrchestrator;
