//! crates/support_chat_core/src/state.rs
//!
//! Defines the single application state shared by the conversation controller
//! and the knowledge base manager.

use crate::domain::{DocumentEntry, FaqEntry, Message};
use crate::store::{Slot, SlotStore};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

pub const WELCOME_GREETING: &str = "Hello! I'm your AI support assistant. I can help answer questions about our company, products, and services based on our knowledge base. How can I help you today?";
pub const CLEARED_GREETING: &str = "Chat cleared. How can I help you today?";

/// Whether a chat submission is currently waiting on the completion service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Sending,
}

/// The pending "add FAQ" form fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaqForm {
    pub question: String,
    pub answer: String,
}

/// Everything the presentation layer renders, owned in one place.
#[derive(Debug, Clone)]
pub struct ChatState {
    pub messages: Vec<Message>,
    pub faqs: Vec<FaqEntry>,
    pub documents: Vec<DocumentEntry>,
    pub input: String,
    pub faq_form: FaqForm,
    pub phase: Phase,
}

/// The handle both controllers lock before touching the collections.
pub type SharedState = Arc<Mutex<ChatState>>;

impl Default for ChatState {
    fn default() -> Self {
        Self {
            messages: vec![Message::assistant(WELCOME_GREETING)],
            faqs: Vec::new(),
            documents: Vec::new(),
            input: String::new(),
            faq_form: FaqForm::default(),
            phase: Phase::Idle,
        }
    }
}

impl ChatState {
    /// Loads the three collections, substituting defaults for absent or corrupt
    /// slots. A stored but empty message list is reseeded with the greeting.
    pub async fn restore(store: &SlotStore) -> Self {
        let mut state = Self::default();

        if let Some(messages) = store.load::<Message>(Slot::Messages).await {
            if !messages.is_empty() {
                state.messages = messages;
            }
        }
        if let Some(faqs) = store.load(Slot::Faqs).await {
            state.faqs = faqs;
        }
        if let Some(documents) = store.load(Slot::Documents).await {
            state.documents = documents;
        }

        info!(
            messages = state.messages.len(),
            faqs = state.faqs.len(),
            documents = state.documents.len(),
            "Restored chat state"
        );
        state
    }

    pub fn shared(self) -> SharedState {
        Arc::new(Mutex::new(self))
    }
}
