//! gutcheck-ai: chat-completion and structured-extraction client
//!
//! This crate provides the message types shared across the workspace and a
//! client for an OpenAI-compatible Chat Completions endpoint. Two calls are
//! exposed: free-form generation (optionally offering tools to the model)
//! and schema-constrained extraction via a forced function call.

pub mod client;
pub mod error;
pub mod types;

pub use client::ChatClient;
pub use error::{Error, Result};
pub use types::*;
