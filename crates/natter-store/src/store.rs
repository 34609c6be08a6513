//! The conversation store
//!
//! Owns all chats, the selection, and the materialized view of the
//! selected chat's messages. Every mutation persists through the
//! [`StateStore`] under the same lock acquisition, so memory and storage
//! never drift apart by more than one step. Sending a user message
//! orchestrates the backend call and feeds streamed deltas back into the
//! in-flight assistant message.

use std::collections::HashMap;
use std::sync::Arc;

use futures::StreamExt;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use natter_backend::{ChatBackend, Error as BackendError, OutboundMessage, ReplyEvent};

use crate::persist::StateStore;
use crate::signal::BusySignal;
use crate::types::{self, Chat, Message, MessageStatus, Role, truncate_title};

struct State {
    /// All chats, most recently created first
    chats: Vec<Chat>,
    /// Selected chat id, if any
    selected: Option<String>,
    /// Materialized copy of the selected chat's messages
    view: Vec<Message>,
}

/// Client-side conversation state and streaming orchestration.
///
/// Explicitly constructed and shared by reference (typically in an
/// `Arc`); there is no ambient global. All methods take `&self` and are
/// safe to call while a reply stream is in flight.
pub struct ChatStore {
    state: Mutex<State>,
    persist: Box<dyn StateStore>,
    backend: Arc<dyn ChatBackend>,
    signal: BusySignal,
    /// Per-chat cancellation roots; each send listens on a child token,
    /// so deleting a chat stops every stream still feeding it.
    in_flight: Mutex<HashMap<String, CancellationToken>>,
}

impl ChatStore {
    /// Hydrate the store from persisted state.
    ///
    /// A stored selection pointing at a chat that no longer exists falls
    /// back to the first chat, or to nothing when the list is empty.
    pub fn new(persist: Box<dyn StateStore>, backend: Arc<dyn ChatBackend>) -> Self {
        let (chats, stored) = persist.load();
        let selected = stored
            .filter(|id| chats.iter().any(|c| &c.id == id))
            .or_else(|| chats.first().map(|c| c.id.clone()));
        let mut state = State {
            chats,
            selected,
            view: Vec::new(),
        };
        sync_view(&mut state);
        Self {
            state: Mutex::new(state),
            persist,
            backend,
            signal: BusySignal::new(),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    // --- read accessors ---

    /// Snapshot of all chats, most recently created first
    pub fn chats(&self) -> Vec<Chat> {
        self.state.lock().chats.clone()
    }

    /// Currently selected chat id
    pub fn selected_chat_id(&self) -> Option<String> {
        self.state.lock().selected.clone()
    }

    /// The visible message view of the selected chat
    pub fn messages(&self) -> Vec<Message> {
        self.state.lock().view.clone()
    }

    /// Whether the visible message view is empty
    pub fn no_messages(&self) -> bool {
        self.state.lock().view.is_empty()
    }

    /// The selected chat, or `None`
    pub fn get_selected_chat(&self) -> Option<Chat> {
        let state = self.state.lock();
        let id = state.selected.as_ref()?;
        state.chats.iter().find(|c| &c.id == id).cloned()
    }

    /// Handle to the shared busy indicator
    pub fn busy_signal(&self) -> BusySignal {
        self.signal.clone()
    }

    /// Whether an assistant reply is currently being generated
    pub fn is_busy(&self) -> bool {
        self.signal.is_busy()
    }

    // --- mutations ---

    /// Select a chat and recompute the visible view.
    ///
    /// Unknown ids are ignored so the selection always refers to a chat
    /// that exists.
    pub fn select_chat(&self, chat_id: &str) {
        let mut state = self.state.lock();
        if !state.chats.iter().any(|c| c.id == chat_id) {
            tracing::warn!(chat_id, "select_chat: unknown chat id");
            return;
        }
        state.selected = Some(chat_id.to_string());
        sync_view(&mut state);
        self.persist.save_selected(Some(chat_id));
    }

    /// Create a new empty chat, select it, and return its id
    pub fn create_chat(&self, title: &str) -> String {
        let mut state = self.state.lock();
        self.create_chat_locked(&mut state, title)
    }

    fn create_chat_locked(&self, state: &mut State, title: &str) -> String {
        let chat = Chat::new(title);
        let id = chat.id.clone();
        state.chats.insert(0, chat);
        state.selected = Some(id.clone());
        state.view.clear();
        self.persist.save_chats(&state.chats);
        self.persist.save_selected(Some(&id));
        id
    }

    /// Replace the title of a chat
    pub fn edit_chat(&self, chat_id: &str, new_title: &str) {
        let mut state = self.state.lock();
        let Some(chat) = state.chats.iter_mut().find(|c| c.id == chat_id) else {
            return;
        };
        chat.title = new_title.to_string();
        self.persist.save_chats(&state.chats);
    }

    /// Delete a chat.
    ///
    /// A reply still streaming into the chat is cancelled; it has nowhere
    /// to go. If the chat was selected, selection moves to the first
    /// remaining chat or to nothing.
    pub fn delete_chat(&self, chat_id: &str) {
        if let Some(token) = self.in_flight.lock().remove(chat_id) {
            token.cancel();
        }
        let mut state = self.state.lock();
        state.chats.retain(|c| c.id != chat_id);
        if state.selected.as_deref() == Some(chat_id) {
            state.selected = state.chats.first().map(|c| c.id.clone());
        }
        sync_view(&mut state);
        self.persist.save_chats(&state.chats);
        self.persist.save_selected(state.selected.as_deref());
    }

    /// Append a message and, for user messages, stream the assistant reply.
    ///
    /// Whitespace-only text is a no-op. With no chat selected one is
    /// created, titled from the (truncated) text. Non-user roles are
    /// appended directly without contacting the backend. Failures never
    /// propagate: they land in the chat as an assistant error message,
    /// and the busy signal clears on every path.
    pub async fn send_message(&self, text: &str, role: Role) {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return;
        }

        let chat_id = {
            let mut state = self.state.lock();
            let chat_id = match state.selected.clone() {
                Some(id) => id,
                None => self.create_chat_locked(&mut state, &truncate_title(trimmed)),
            };
            append_message(&mut state, &chat_id, Message::new(&chat_id, role, trimmed));
            self.persist.save_chats(&state.chats);
            chat_id
        };

        // Assistant messages can be injected directly, without a backend
        // round trip.
        if role != Role::User {
            return;
        }

        {
            let mut state = self.state.lock();
            append_message(&mut state, &chat_id, Message::pending(&chat_id));
            self.persist.save_chats(&state.chats);
        }

        let _busy = self.signal.start();
        let cancel = self
            .in_flight
            .lock()
            .entry(chat_id.clone())
            .or_insert_with(CancellationToken::new)
            .child_token();

        let result = self.consume_reply(&chat_id, &cancel).await;

        if let Err(err) = result {
            if !cancel.is_cancelled() {
                self.record_failure(&chat_id, &err);
            }
        }
    }

    /// Run one streaming request for `chat_id` and apply its events.
    async fn consume_reply(
        &self,
        chat_id: &str,
        cancel: &CancellationToken,
    ) -> Result<(), BackendError> {
        let history = {
            let state = self.state.lock();
            let Some(chat) = state.chats.iter().find(|c| c.id == chat_id) else {
                return Ok(());
            };
            chat.messages
                .iter()
                .filter(|m| m.status != MessageStatus::Pending)
                .map(|m| OutboundMessage {
                    role: m.role.as_str().to_string(),
                    content: m.text.clone(),
                    timestamp: m.timestamp,
                    id: m.id.clone(),
                })
                .collect::<Vec<_>>()
        };

        let mut stream = self.backend.stream_reply(history).await?;

        // Promote the placeholder to a real empty message before the first
        // delta, so the pending state is never observable once streaming
        // has begun.
        let message_id = {
            let mut state = self.state.lock();
            let id = promote_placeholder(&mut state, chat_id);
            self.persist.save_chats(&state.chats);
            id
        };

        let mut acc = String::new();
        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                event = stream.next() => event,
            };
            match event {
                Some(Ok(ReplyEvent::Delta(delta))) => {
                    acc.push_str(&delta);
                    let mut state = self.state.lock();
                    set_message_text(&mut state, chat_id, &message_id, &acc);
                    self.persist.save_chats(&state.chats);
                }
                Some(Ok(ReplyEvent::Done)) | None => break,
                Some(Err(err)) => return Err(err),
            }
        }

        let mut state = self.state.lock();
        settle_streaming(&mut state, chat_id);
        self.persist.save_chats(&state.chats);
        Ok(())
    }

    /// Drop the placeholder, settle any partial reply, and surface the
    /// failure as an assistant message.
    fn record_failure(&self, chat_id: &str, err: &BackendError) {
        tracing::warn!(chat_id, error = %err, "reply stream failed");
        let mut state = self.state.lock();
        if let Some(chat) = state.chats.iter_mut().find(|c| c.id == chat_id) {
            chat.messages.retain(|m| m.status != MessageStatus::Pending);
            for message in &mut chat.messages {
                if message.status == MessageStatus::Streaming {
                    message.status = MessageStatus::Complete;
                }
            }
            let text = format!(
                "There was a problem getting a response from the assistant. {}",
                err
            );
            chat.messages.push(Message::assistant(chat_id, &text));
        }
        if state.selected.as_deref() == Some(chat_id) {
            sync_view(&mut state);
        }
        self.persist.save_chats(&state.chats);
    }
}

/// Recompute the materialized view from the selected chat
fn sync_view(state: &mut State) {
    state.view = state
        .selected
        .as_ref()
        .and_then(|id| state.chats.iter().find(|c| &c.id == id))
        .map(|c| c.messages.clone())
        .unwrap_or_default();
}

fn append_message(state: &mut State, chat_id: &str, message: Message) {
    if let Some(chat) = state.chats.iter_mut().find(|c| c.id == chat_id) {
        chat.messages.push(message);
    }
    if state.selected.as_deref() == Some(chat_id) {
        sync_view(state);
    }
}

/// Replace the pending placeholder with a fresh-id empty streaming
/// message, appending one if no placeholder is present. Returns the id
/// the deltas should target.
fn promote_placeholder(state: &mut State, chat_id: &str) -> String {
    let id = types::new_id();
    if let Some(chat) = state.chats.iter_mut().find(|c| c.id == chat_id) {
        match chat
            .messages
            .iter()
            .position(|m| m.status == MessageStatus::Pending)
        {
            Some(pos) => {
                let message = &mut chat.messages[pos];
                message.id = id.clone();
                message.text.clear();
                message.timestamp = types::now_millis();
                message.status = MessageStatus::Streaming;
            }
            None => chat.messages.push(Message::streaming(chat_id, &id)),
        }
    }
    if state.selected.as_deref() == Some(chat_id) {
        sync_view(state);
    }
    id
}

fn set_message_text(state: &mut State, chat_id: &str, message_id: &str, text: &str) {
    if let Some(chat) = state.chats.iter_mut().find(|c| c.id == chat_id) {
        if let Some(message) = chat.messages.iter_mut().find(|m| m.id == message_id) {
            text.clone_into(&mut message.text);
        }
    }
    if state.selected.as_deref() == Some(chat_id) {
        sync_view(state);
    }
}

fn settle_streaming(state: &mut State, chat_id: &str) {
    if let Some(chat) = state.chats.iter_mut().find(|c| c.id == chat_id) {
        for message in &mut chat.messages {
            if message.status == MessageStatus::Streaming {
                message.status = MessageStatus::Complete;
            }
        }
    }
    if state.selected.as_deref() == Some(chat_id) {
        sync_view(state);
    }
}
