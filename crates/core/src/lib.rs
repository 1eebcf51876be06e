//! # meetwise Core
//!
//! Domain types, traits, and error definitions for the meetwise meeting assistant.
//! This crate does no I/O: it defines the domain model that all other
//! crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is a trait here: the language model
//! (`Provider`), the memory store (`MemoryStore`) and the meeting-data
//! integrations (`IntegrationSource`). Implementations live in their
//! respective crates, so tests can swap in scripted or in-memory versions.

pub mod error;
pub mod event;
pub mod integration;
pub mod intent;
pub mod memory;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, IntegrationError, MemoryError, ModelError, ProviderError, Result, ToolError};
pub use event::{DomainEvent, EventBus};
pub use integration::{IntegrationQuery, IntegrationSource, MeetingData, NoIntegrations, StaticIntegrations};
pub use intent::{ExtractedInfo, Intent};
pub use memory::{MemoryCategory, MemoryRecord, MemoryStore, SessionId};
pub use message::{Message, Role};
pub use provider::{Completion, Provider, ProviderRequest, ProviderResponse, ResponseShape, Usage};
pub use tool::ToolKind;
