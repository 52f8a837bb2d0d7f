//! # agent-core
//!
//! Provider-agnostic abstraction over generative-text backends.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      ProviderChain                           │
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐        │
//! │  │  OpenAI     │──▶│  Gemini     │──▶│  DeepSeek   │ ──▶ …  │
//! │  │ (ping+call) │   │ (ping+call) │   │ (ping+call) │        │
//! │  └─────────────┘   └─────────────┘   └─────────────┘        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `LlmProvider` trait enables swapping between OpenAI, Gemini, DeepSeek,
//! Ollama or any other backend without changing the callers. A chain with no
//! providers at all is valid: callers simply get `ProviderUnavailable` back
//! and fall back to their own deterministic output.

pub mod provider;
pub mod message;
pub mod error;

pub use error::{AgentError, Result};
pub use message::{Message, Role};
pub use provider::{ChainCompletion, Completion, GenerationOptions, LlmProvider, ProviderChain};
