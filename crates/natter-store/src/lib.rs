//! natter-store: client-side conversation state
//!
//! Owns the chat list, selection, and the visible message view; keeps the
//! durable key-value store in sync on every mutation; and feeds streamed
//! assistant replies into the in-flight message as deltas arrive.

pub mod persist;
pub mod signal;
pub mod store;
pub mod types;

pub use persist::{FileStore, MemoryStore, StateStore};
pub use signal::{BusyGuard, BusySignal};
pub use store::ChatStore;
pub use types::{Chat, Message, MessageStatus, Role};
