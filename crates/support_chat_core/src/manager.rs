//! crates/support_chat_core/src/manager.rs
//!
//! Add/delete operations over the FAQ and document collections. Every
//! mutation is followed by a write-through save of the affected slot.

use crate::domain::{DocumentEntry, FaqEntry};
use crate::ports::{DocumentSource, PortError, PortResult};
use crate::state::{FaqForm, SharedState};
use crate::store::{Slot, SlotStore};
use chrono::Utc;
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

/// Shown to the user when an uploaded file cannot be read.
pub const UNREADABLE_FILE_NOTICE: &str = "Error reading file. Please try again.";

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// The file could not be decoded; nothing was stored.
    #[error("Error reading file. Please try again.")]
    Unreadable(#[source] PortError),
    /// The document was added in memory but could not be persisted.
    #[error("Failed to save documents: {0}")]
    Persist(#[source] PortError),
}

/// Knowledge-base sizes shown next to the chat header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KnowledgeCounts {
    pub faqs: usize,
    pub documents: usize,
}

#[derive(Clone)]
pub struct KnowledgeBaseManager {
    state: SharedState,
    store: SlotStore,
}

impl KnowledgeBaseManager {
    pub fn new(state: SharedState, store: SlotStore) -> Self {
        Self { state, store }
    }

    pub async fn faqs(&self) -> Vec<FaqEntry> {
        self.state.lock().await.faqs.clone()
    }

    pub async fn documents(&self) -> Vec<DocumentEntry> {
        self.state.lock().await.documents.clone()
    }

    pub async fn counts(&self) -> KnowledgeCounts {
        let state = self.state.lock().await;
        KnowledgeCounts {
            faqs: state.faqs.len(),
            documents: state.documents.len(),
        }
    }

    pub async fn faq_form(&self) -> FaqForm {
        self.state.lock().await.faq_form.clone()
    }

    pub async fn set_faq_form(&self, question: impl Into<String>, answer: impl Into<String>) {
        self.state.lock().await.faq_form = FaqForm {
            question: question.into(),
            answer: answer.into(),
        };
    }

    pub async fn cancel_faq_form(&self) {
        self.state.lock().await.faq_form = FaqForm::default();
    }

    /// Adds the FAQ currently held in the form.
    pub async fn add_faq_from_form(&self) -> PortResult<Option<FaqEntry>> {
        let form = self.faq_form().await;
        self.add_faq(&form.question, &form.answer).await
    }

    /// Appends a FAQ. Returns `Ok(None)` without any change when either field is
    /// blank after trimming.
    pub async fn add_faq(&self, question: &str, answer: &str) -> PortResult<Option<FaqEntry>> {
        if question.trim().is_empty() || answer.trim().is_empty() {
            return Ok(None);
        }

        let entry = FaqEntry {
            id: Uuid::new_v4(),
            question: question.to_string(),
            answer: answer.to_string(),
        };

        let mut state = self.state.lock().await;
        state.faqs.push(entry.clone());
        state.faq_form = FaqForm::default();
        info!(id = %entry.id, "FAQ added");
        self.persist(Slot::Faqs, &state.faqs).await?;
        Ok(Some(entry))
    }

    /// Removes a FAQ by id. Returns `false` when no such entry exists.
    pub async fn delete_faq(&self, id: Uuid) -> PortResult<bool> {
        let mut state = self.state.lock().await;
        let before = state.faqs.len();
        state.faqs.retain(|faq| faq.id != id);
        if state.faqs.len() == before {
            return Ok(false);
        }
        info!(%id, "FAQ deleted");
        self.persist(Slot::Faqs, &state.faqs).await?;
        Ok(true)
    }

    /// Reads the whole file as text and stores it as a new document.
    pub async fn upload_document(
        &self,
        source: &dyn DocumentSource,
    ) -> Result<DocumentEntry, UploadError> {
        let content = source.read_text().await.map_err(|e| {
            error!(file = source.name(), "Error reading file: {}", e);
            UploadError::Unreadable(e)
        })?;

        let entry = DocumentEntry {
            id: Uuid::new_v4(),
            name: source.name().to_string(),
            content,
            uploaded_at: Utc::now(),
        };

        let mut state = self.state.lock().await;
        state.documents.push(entry.clone());
        info!(id = %entry.id, name = %entry.name, bytes = entry.content.len(), "Document uploaded");
        self.persist(Slot::Documents, &state.documents)
            .await
            .map_err(UploadError::Persist)?;
        Ok(entry)
    }

    /// Removes a document by id. Returns `false` when no such entry exists.
    pub async fn delete_document(&self, id: Uuid) -> PortResult<bool> {
        let mut state = self.state.lock().await;
        let before = state.documents.len();
        state.documents.retain(|doc| doc.id != id);
        if state.documents.len() == before {
            return Ok(false);
        }
        info!(%id, "Document deleted");
        self.persist(Slot::Documents, &state.documents).await?;
        Ok(true)
    }

    async fn persist<T: Serialize>(&self, slot: Slot, items: &[T]) -> PortResult<()> {
        self.store.save(slot, items).await.map_err(|e| {
            error!(slot = slot.key(), "Failed to persist collection: {}", e);
            e
        })
    }
}
