pub mod conversation;
pub mod domain;
pub mod knowledge;
pub mod manager;
pub mod ports;
pub mod state;
pub mod store;

pub use conversation::{CompletionSettings, ConversationController, RejectReason, SubmitOutcome};
pub use domain::{CompletionRequest, DocumentEntry, FaqEntry, Message, Role, Turn};
pub use knowledge::build_knowledge_base;
pub use manager::{KnowledgeBaseManager, KnowledgeCounts, UploadError};
pub use ports::{CompletionService, DocumentSource, KeyValueStore, PortError, PortResult};
pub use state::{ChatState, SharedState};
pub use store::{MemoryStore, Slot, SlotStore};
