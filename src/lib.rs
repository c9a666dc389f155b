//! CiviResolve support assistant.
//!
//! Answers questions about Sri Lanka government services with a remote Gemini
//! session, falling back to a local keyword search over a static knowledge base.

pub mod agent;
pub mod ai;
pub mod chat;
pub mod config;
pub mod error;
pub mod knowledge;
pub mod logger;
pub mod services;

pub use agent::{ChatAgent, Reply, ReplySource};
pub use chat::{ChatMessage, ChatSession, Role};
pub use config::Config;
pub use error::ChatError;
pub use knowledge::{KnowledgeBase, KnowledgeSection, QaEntry};
