//! LLM provider implementations for meetwise.
//!
//! All providers implement the `meetwise_core::Provider` trait. The router
//! builds the configured provider and `ModelClient` wraps it with the
//! per-call deadline and response-shape handling every caller relies on.

pub mod client;
pub mod openai_compat;
pub mod router;
pub mod scripted;

pub use client::{extract_json, ModelCall, ModelClient};
pub use openai_compat::OpenAiCompatProvider;
pub use router::{build_from_config, resolve_model, ProviderRouter};
pub use scripted::ScriptedProvider;
