use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::RwLock;
use uuid::Uuid;

/// One rendered turn of a conversation. Display state for the UI only:
/// retrieval always works from the current question alone.
#[derive(Debug, Clone, Serialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

pub struct SessionEntry {
    pub history: Vec<ChatTurn>,
    pub last_accessed: SystemTime,
}

/// In-memory conversation store. Entries expire two hours after their last
/// access; nothing survives the process.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<String, SessionEntry>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Resolve an existing conversation or mint a fresh uuid for a new one.
    pub async fn get_or_create(&self, conversation_id: Option<&str>) -> String {
        let id = conversation_id
            .map(|s| s.to_string())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let mut store = self.inner.write().await;
        self.evict_expired(&mut store);

        store
            .entry(id.clone())
            .and_modify(|entry| entry.last_accessed = SystemTime::now())
            .or_insert_with(|| SessionEntry {
                history: Vec::new(),
                last_accessed: SystemTime::now(),
            });

        id
    }

    /// Record a completed question/answer exchange.
    pub async fn append(&self, conversation_id: &str, question: &str, answer: &str) {
        let mut store = self.inner.write().await;
        if let Some(entry) = store.get_mut(conversation_id) {
            entry.history.push(ChatTurn {
                role: "user".to_string(),
                content: question.to_string(),
            });
            entry.history.push(ChatTurn {
                role: "assistant".to_string(),
                content: answer.to_string(),
            });
            entry.last_accessed = SystemTime::now();
        }
    }

    pub async fn history(&self, conversation_id: &str) -> Vec<ChatTurn> {
        let store = self.inner.read().await;
        store
            .get(conversation_id)
            .map(|entry| entry.history.clone())
            .unwrap_or_default()
    }

    pub async fn delete(&self, conversation_id: &str) {
        let mut store = self.inner.write().await;
        store.remove(conversation_id);
    }

    fn evict_expired(&self, store: &mut HashMap<String, SessionEntry>) {
        let now = SystemTime::now();
        let ttl = Duration::from_secs(2 * 60 * 60);

        store.retain(|_, entry| match now.duration_since(entry.last_accessed) {
            Ok(elapsed) => elapsed < ttl,
            Err(_) => true,
        });
    }
}
