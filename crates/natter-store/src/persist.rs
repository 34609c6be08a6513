//! Durable key-value persistence for the chat list and selection
//!
//! Two entries mirror the in-memory state: the serialized chat list and
//! the selected chat id. Reads tolerate missing or corrupt data by
//! degrading to empty defaults; writes log and swallow failures. The
//! adapter never fails outward.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::types::Chat;

const CHATS_FILE: &str = "chats.json";
const SELECTED_FILE: &str = "selected_chat";

/// Mirror of the store's persistent state
pub trait StateStore: Send + Sync {
    /// Reconstruct persisted state at startup
    fn load(&self) -> (Vec<Chat>, Option<String>);
    /// Persist the full chat list
    fn save_chats(&self, chats: &[Chat]);
    /// Persist the selected chat id; `None` removes the entry
    fn save_selected(&self, chat_id: Option<&str>);
}

/// On-disk store under the platform data directory
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Default data directory
    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("natter")
    }

    /// Store under the default data directory
    pub fn new() -> Self {
        Self::at(Self::data_dir())
    }

    /// Store under an explicit directory
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl Default for FileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore for FileStore {
    fn load(&self) -> (Vec<Chat>, Option<String>) {
        let chats = match fs::read_to_string(self.dir.join(CHATS_FILE)) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(chats) => chats,
                Err(err) => {
                    tracing::warn!(%err, "stored chat list is corrupt, starting empty");
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        };
        let selected = fs::read_to_string(self.dir.join(SELECTED_FILE))
            .ok()
            .map(|raw| raw.trim().to_string())
            .filter(|id| !id.is_empty());
        (chats, selected)
    }

    fn save_chats(&self, chats: &[Chat]) {
        let raw = match serde_json::to_string(chats) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(%err, "failed to serialize chat list");
                return;
            }
        };
        let result =
            fs::create_dir_all(&self.dir).and_then(|_| fs::write(self.dir.join(CHATS_FILE), raw));
        if let Err(err) = result {
            tracing::warn!(%err, "failed to persist chat list");
        }
    }

    fn save_selected(&self, chat_id: Option<&str>) {
        let path = self.dir.join(SELECTED_FILE);
        let result = match chat_id {
            Some(id) => fs::create_dir_all(&self.dir).and_then(|_| fs::write(&path, id)),
            None => match fs::remove_file(&path) {
                Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
                other => other,
            },
        };
        if let Err(err) = result {
            tracing::warn!(%err, "failed to persist selected chat");
        }
    }
}

/// In-memory store for tests and ephemeral sessions.
///
/// Clones share the same backing state, so a reload observes everything
/// previously saved.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<(Vec<Chat>, Option<String>)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing state
    pub fn with_state(chats: Vec<Chat>, selected: Option<String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new((chats, selected))),
        }
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> (Vec<Chat>, Option<String>) {
        self.inner.lock().clone()
    }

    fn save_chats(&self, chats: &[Chat]) {
        self.inner.lock().0 = chats.to_vec();
    }

    fn save_selected(&self, chat_id: Option<&str>) {
        self.inner.lock().1 = chat_id.map(str::to_string);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Message, Role};

    fn temp_store() -> FileStore {
        let dir = std::env::temp_dir()
            .join("natter-test")
            .join(uuid::Uuid::new_v4().to_string());
        FileStore::at(dir)
    }

    #[test]
    fn test_load_missing_files_yields_defaults() {
        let store = temp_store();
        let (chats, selected) = store.load();
        assert!(chats.is_empty());
        assert!(selected.is_none());
    }

    #[test]
    fn test_round_trip_preserves_chats_and_selection() {
        let store = temp_store();
        let mut chat = Chat::new("errands");
        chat.messages.push(Message::new(&chat.id, Role::User, "milk"));
        store.save_chats(std::slice::from_ref(&chat));
        store.save_selected(Some(&chat.id));

        let (chats, selected) = store.load();
        assert_eq!(chats, vec![chat.clone()]);
        assert_eq!(selected.as_deref(), Some(chat.id.as_str()));
    }

    #[test]
    fn test_corrupt_chat_list_degrades_to_empty() {
        let store = temp_store();
        store.save_selected(Some("c1"));
        fs::create_dir_all(&store.dir).unwrap();
        fs::write(store.dir.join(CHATS_FILE), "{not json").unwrap();

        let (chats, selected) = store.load();
        assert!(chats.is_empty());
        assert_eq!(selected.as_deref(), Some("c1"));
    }

    #[test]
    fn test_save_selected_none_removes_entry() {
        let store = temp_store();
        store.save_selected(Some("c1"));
        store.save_selected(None);
        assert!(!store.dir.join(SELECTED_FILE).exists());
        // Removing twice is fine.
        store.save_selected(None);
        let (_, selected) = store.load();
        assert!(selected.is_none());
    }

    #[test]
    fn test_memory_store_clones_share_state() {
        let store = MemoryStore::new();
        let chat = Chat::new("shared");
        store.save_chats(std::slice::from_ref(&chat));
        store.save_selected(Some(&chat.id));

        let other = store.clone();
        let (chats, selected) = other.load();
        assert_eq!(chats.len(), 1);
        assert_eq!(selected.as_deref(), Some(chat.id.as_str()));
    }
}
