//! natter-backend: HTTP streaming client for the chat reply endpoint
//!
//! This crate knows nothing about chats or selection; it turns a message
//! history into one streaming request and decodes the newline-delimited
//! `data: {json}` records the backend answers with.

pub mod client;
pub mod config;
pub mod decoder;
pub mod error;

pub use client::{BackendClient, ChatBackend, OutboundMessage, ReplyStream};
pub use config::BackendConfig;
pub use decoder::{RecordDecoder, ReplyEvent};
pub use error::{Error, Result};
