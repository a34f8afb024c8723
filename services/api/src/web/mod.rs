pub mod chat;
pub mod knowledge;
pub mod rest;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get},
    Router,
};
use std::sync::Arc;
use state::AppState;

// Re-export the handlers to make them easily accessible
// to the binary that will build the web server router.
pub use chat::{clear_chat_handler, get_messages_handler, send_message_handler};
pub use knowledge::{
    add_faq_handler, delete_document_handler, delete_faq_handler, list_documents_handler,
    list_faqs_handler, summary_handler, upload_document_handler,
};

/// Builds the API routes. Uploads are not size-capped.
pub fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/messages",
            get(get_messages_handler)
                .post(send_message_handler)
                .delete(clear_chat_handler),
        )
        .route("/faqs", get(list_faqs_handler).post(add_faq_handler))
        .route("/faqs/{id}", delete(delete_faq_handler))
        .route(
            "/documents",
            get(list_documents_handler).post(upload_document_handler),
        )
        .route("/documents/{id}", delete(delete_document_handler))
        .route("/summary", get(summary_handler))
        .layer(DefaultBodyLimit::disable())
        .with_state(app_state)
}
