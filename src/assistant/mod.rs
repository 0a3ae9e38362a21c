//! Assistant module
//!
//! Talks to the remote chat-completion endpoint that answers product questions
//! and builds routines.
//!
//! # Architecture
//!
//! - `client` - `AssistantBackend` trait and the error type shared by backends
//! - `endpoint` - HTTP backend posting `{messages, model, web_search}`
//! - `prompts` - fixed system instructions for free chat and routine generation
mod client;
mod endpoint;
mod prompts;

pub use client::{AssistantBackend, ChatError, ChatResult};
pub use endpoint::{HttpAssistant, extract_reply};
pub use prompts::Prompts;
