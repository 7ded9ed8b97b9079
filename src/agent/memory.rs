// src/agent/memory.rs

use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Agent,
    ToolResult,
}

/// One entry of a conversation. Never modified after it is appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn agent(content: impl Into<String>) -> Self {
        Self { role: Role::Agent, content: content.into() }
    }

    pub fn tool_result(content: impl Into<String>) -> Self {
        Self { role: Role::ToolResult, content: content.into() }
    }
}

type Thread = Arc<Mutex<Vec<Message>>>;

/// Per-thread conversation histories.
///
/// Every thread has its own lock, so appends to one conversation never wait
/// on another. Histories are append-only and grow without bound; callers that
/// only need recent context use [`ConversationMemory::append_and_snapshot`]
/// with a window.
#[derive(Debug, Default)]
pub struct ConversationMemory {
    threads: DashMap<String, Thread>,
}

impl ConversationMemory {
    pub fn new() -> Self {
        Self::default()
    }

    fn thread(&self, thread_id: &str) -> Thread {
        // Clone the Arc so the shard guard is released before any await.
        self.threads
            .entry(thread_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Vec::new())))
            .clone()
    }

    pub async fn append(&self, thread_id: &str, message: Message) {
        self.thread(thread_id).lock().await.push(message);
    }

    /// Appends `messages` as one unit: readers see all of them or none.
    pub async fn append_all(&self, thread_id: &str, messages: Vec<Message>) {
        if messages.is_empty() {
            return;
        }
        self.thread(thread_id).lock().await.extend(messages);
    }

    /// Appends `message` and returns the last `window` messages including it
    /// (the whole history when `window` is 0), under a single lock.
    pub async fn append_and_snapshot(
        &self,
        thread_id: &str,
        message: Message,
        window: usize,
    ) -> Vec<Message> {
        let thread = self.thread(thread_id);
        let mut history = thread.lock().await;
        history.push(message);
        let start = if window == 0 { 0 } else { history.len().saturating_sub(window) };
        history[start..].to_vec()
    }

    /// Full history of a thread, oldest first. Unknown threads are empty.
    pub async fn history(&self, thread_id: &str) -> Vec<Message> {
        let thread = self.threads.get(thread_id).map(|entry| entry.value().clone());
        match thread {
            Some(thread) => thread.lock().await.clone(),
            None => Vec::new(),
        }
    }

    pub fn contains(&self, thread_id: &str) -> bool {
        self.threads.contains_key(thread_id)
    }

    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }
}
