//! crates/support_chat_core/src/store.rs
//!
//! The persistent store adapter. Each collection lives in its own named slot
//! of a `KeyValueStore` and is written through as a whole after every change.

use crate::ports::{KeyValueStore, PortError, PortResult};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::warn;

/// A named persistence key, one per collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Messages,
    Faqs,
    Documents,
}

impl Slot {
    pub fn key(&self) -> &'static str {
        match self {
            Slot::Messages => "chatMessages",
            Slot::Faqs => "companyFaqs",
            Slot::Documents => "companyDocuments",
        }
    }
}

/// Typed load/save of whole collections on top of a string key-value store.
#[derive(Clone)]
pub struct SlotStore {
    kv: Arc<dyn KeyValueStore>,
}

impl SlotStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Loads a collection. An absent, unreadable or corrupt slot yields `None`
    /// and the caller substitutes its default.
    pub async fn load<T: DeserializeOwned>(&self, slot: Slot) -> Option<Vec<T>> {
        let raw = match self.kv.get(slot.key()).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(slot = slot.key(), "Failed to read slot: {}", e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(items) => Some(items),
            Err(e) => {
                warn!(slot = slot.key(), "Discarding corrupt slot: {}", e);
                None
            }
        }
    }

    pub async fn save<T: Serialize>(&self, slot: Slot, items: &[T]) -> PortResult<()> {
        let raw = serde_json::to_string(items).map_err(|e| PortError::Storage(e.to_string()))?;
        self.kv.set(slot.key(), &raw).await
    }
}

/// A process-local `KeyValueStore`, used in tests and as a scratch backend.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| PortError::Storage(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> PortResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| PortError::Storage(e.to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DocumentEntry, FaqEntry};
    use chrono::Utc;
    use uuid::Uuid;

    #[tokio::test]
    async fn faqs_and_documents_round_trip() {
        let store = SlotStore::new(Arc::new(MemoryStore::new()));

        let faqs: Vec<FaqEntry> = (1..=3)
            .map(|i| FaqEntry {
                id: Uuid::new_v4(),
                question: format!("Question {i}?"),
                answer: format!("Answer {i}"),
            })
            .collect();
        let documents: Vec<DocumentEntry> = ["a.txt", "b.md"]
            .iter()
            .map(|name| DocumentEntry {
                id: Uuid::new_v4(),
                name: name.to_string(),
                content: format!("contents of {name}\nline two"),
                uploaded_at: Utc::now(),
            })
            .collect();

        store.save(Slot::Faqs, &faqs).await.unwrap();
        store.save(Slot::Documents, &documents).await.unwrap();

        let loaded_faqs: Vec<FaqEntry> = store.load(Slot::Faqs).await.unwrap();
        let loaded_docs: Vec<DocumentEntry> = store.load(Slot::Documents).await.unwrap();
        assert_eq!(loaded_faqs, faqs);
        assert_eq!(loaded_docs, documents);
    }

    #[tokio::test]
    async fn absent_slot_loads_as_none() {
        let store = SlotStore::new(Arc::new(MemoryStore::new()));
        assert!(store.load::<FaqEntry>(Slot::Faqs).await.is_none());
    }

    #[tokio::test]
    async fn corrupt_slot_loads_as_none() {
        let kv = Arc::new(MemoryStore::new());
        kv.set(Slot::Documents.key(), "{not json").await.unwrap();
        let store = SlotStore::new(kv);
        assert!(store.load::<DocumentEntry>(Slot::Documents).await.is_none());
    }

    #[test]
    fn slot_keys_are_distinct() {
        assert_eq!(Slot::Messages.key(), "chatMessages");
        assert_eq!(Slot::Faqs.key(), "companyFaqs");
        assert_eq!(Slot::Documents.key(), "companyDocuments");
    }
}
