//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use std::sync::Arc;
use support_chat_core::{
    ChatState, CompletionService, ConversationController, KnowledgeBaseManager, SlotStore,
};

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub conversation: ConversationController,
    pub knowledge: KnowledgeBaseManager,
}

impl AppState {
    /// Restores the persisted collections and wires both controllers to the
    /// same in-memory copy.
    pub async fn new(
        config: Arc<Config>,
        store: SlotStore,
        completion: Arc<dyn CompletionService>,
    ) -> Self {
        let chat_state = ChatState::restore(&store).await.shared();

        let conversation = ConversationController::new(
            chat_state.clone(),
            store.clone(),
            completion,
            config.completion_settings(),
        );
        let knowledge = KnowledgeBaseManager::new(chat_state, store);

        Self {
            config,
            conversation,
            knowledge,
        }
    }
}
