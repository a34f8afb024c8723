//! services/api/src/web/rest.rs
//!
//! Contains the request/response payloads shared by the REST handlers and the
//! master definition for the OpenAPI specification.

use crate::web::{chat, knowledge};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use support_chat_core::{DocumentEntry, FaqEntry, Message};
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        chat::get_messages_handler,
        chat::send_message_handler,
        chat::clear_chat_handler,
        knowledge::list_faqs_handler,
        knowledge::add_faq_handler,
        knowledge::delete_faq_handler,
        knowledge::list_documents_handler,
        knowledge::upload_document_handler,
        knowledge::delete_document_handler,
        knowledge::summary_handler,
    ),
    components(
        schemas(
            MessageDto,
            TranscriptResponse,
            SendMessageRequest,
            SendMessageResponse,
            FaqDto,
            AddFaqRequest,
            DocumentDto,
            SummaryResponse,
        )
    ),
    tags(
        (name = "Support Chat API", description = "Chat with the support assistant and manage its knowledge base.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// One transcript entry.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageDto {
    /// `user` or `assistant`.
    pub role: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl From<&Message> for MessageDto {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role.as_str().to_string(),
            content: message.content.clone(),
            timestamp: message.timestamp,
        }
    }
}

/// The full transcript plus whether an answer is still pending.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TranscriptResponse {
    pub messages: Vec<MessageDto>,
    pub sending: bool,
}

impl TranscriptResponse {
    pub fn new(messages: &[Message], sending: bool) -> Self {
        Self {
            messages: messages.iter().map(MessageDto::from).collect(),
            sending,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendMessageRequest {
    pub content: String,
}

/// The assistant's reply to a submitted question.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SendMessageResponse {
    /// `answered` when the model replied, `fallback` when the apology was used.
    pub outcome: String,
    pub reply: MessageDto,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FaqDto {
    pub id: Uuid,
    pub question: String,
    pub answer: String,
}

impl From<&FaqEntry> for FaqDto {
    fn from(faq: &FaqEntry) -> Self {
        Self {
            id: faq.id,
            question: faq.question.clone(),
            answer: faq.answer.clone(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddFaqRequest {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentDto {
    pub id: Uuid,
    pub name: String,
    pub content: String,
    pub uploaded_at: DateTime<Utc>,
}

impl From<&DocumentEntry> for DocumentDto {
    fn from(doc: &DocumentEntry) -> Self {
        Self {
            id: doc.id,
            name: doc.name.clone(),
            content: doc.content.clone(),
            uploaded_at: doc.uploaded_at,
        }
    }
}

/// Header information for the chat view.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SummaryResponse {
    pub faqs: usize,
    pub documents: usize,
    pub messages: usize,
    pub sending: bool,
    pub model: String,
}
