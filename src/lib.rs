//! supportline: a customer-support chat service built around one streaming
//! contract: the proxy forwards a role-tagged history to the completion
//! provider and relays the reply token-by-token; the client appends each
//! fragment to the in-progress assistant message as it arrives.

pub mod client;
pub mod config;
pub mod conversation;
pub mod decode;
pub mod provider;
pub mod server;
pub mod types;

pub use client::ChatClient;
pub use conversation::Conversation;
pub use provider::{ChatError, ChatResult, CompletionProvider};
pub use types::{ChatMessage, Role};
