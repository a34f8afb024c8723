//! services/api/src/web/knowledge.rs
//!
//! Axum handlers for managing the knowledge base: FAQs, documents and the
//! counts shown in the chat header.

use crate::adapters::UploadedFile;
use crate::web::rest::{AddFaqRequest, DocumentDto, FaqDto, SummaryResponse};
use crate::web::state::AppState;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;
use support_chat_core::UploadError;
use tracing::error;
use uuid::Uuid;

fn internal_error(context: &str, e: impl std::fmt::Debug) -> (StatusCode, String) {
    error!("{}: {:?}", context, e);
    (StatusCode::INTERNAL_SERVER_ERROR, context.to_string())
}

//=========================================================================================
// FAQs
//=========================================================================================

#[utoipa::path(
    get,
    path = "/faqs",
    responses(
        (status = 200, description = "All FAQs in insertion order", body = [FaqDto])
    )
)]
pub async fn list_faqs_handler(State(app_state): State<Arc<AppState>>) -> Json<Vec<FaqDto>> {
    let faqs = app_state.knowledge.faqs().await;
    Json(faqs.iter().map(FaqDto::from).collect())
}

/// Add a FAQ. Both fields must contain more than whitespace.
#[utoipa::path(
    post,
    path = "/faqs",
    request_body = AddFaqRequest,
    responses(
        (status = 201, description = "FAQ added", body = FaqDto),
        (status = 400, description = "Question or answer was blank"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn add_faq_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<AddFaqRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let added = app_state
        .knowledge
        .add_faq(&payload.question, &payload.answer)
        .await
        .map_err(|e| internal_error("Failed to save FAQ", e))?;

    match added {
        Some(faq) => Ok((StatusCode::CREATED, Json(FaqDto::from(&faq)))),
        None => Err((
            StatusCode::BAD_REQUEST,
            "Question and answer are both required".to_string(),
        )),
    }
}

#[utoipa::path(
    delete,
    path = "/faqs/{id}",
    params(
        ("id" = Uuid, Path, description = "The FAQ to remove.")
    ),
    responses(
        (status = 204, description = "FAQ deleted"),
        (status = 404, description = "No FAQ with that id"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn delete_faq_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let deleted = app_state
        .knowledge
        .delete_faq(id)
        .await
        .map_err(|e| internal_error("Failed to delete FAQ", e))?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, format!("FAQ {} not found", id)))
    }
}

//=========================================================================================
// Documents
//=========================================================================================

#[utoipa::path(
    get,
    path = "/documents",
    responses(
        (status = 200, description = "All documents in upload order", body = [DocumentDto])
    )
)]
pub async fn list_documents_handler(
    State(app_state): State<Arc<AppState>>,
) -> Json<Vec<DocumentDto>> {
    let documents = app_state.knowledge.documents().await;
    Json(documents.iter().map(DocumentDto::from).collect())
}

/// Upload a text document.
///
/// Accepts a multipart/form-data request; the first part with a file name
/// is stored (.txt, .md, .json or .csv).
#[utoipa::path(
    post,
    path = "/documents",
    request_body(content_type = "multipart/form-data", description = "The document to upload."),
    responses(
        (status = 201, description = "Document stored", body = DocumentDto),
        (status = 400, description = "Missing or unreadable file"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn upload_document_handler(
    State(app_state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let file = read_upload(&mut multipart).await?;
    let document = store_upload(&app_state, file).await?;
    Ok((StatusCode::CREATED, Json(document)))
}

/// Reads the first part that carries a file name. Plain form fields are skipped.
pub(crate) async fn read_upload(
    multipart: &mut Multipart,
) -> Result<UploadedFile, (StatusCode, String)> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            format!("Failed to read multipart data: {}", e),
        )
    })? {
        let Some(name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let data = field.bytes().await.map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                format!("Failed to read file bytes: {}", e),
            )
        })?;
        return Ok(UploadedFile::new(name, data.to_vec()));
    }

    Err((
        StatusCode::BAD_REQUEST,
        "Multipart form must include a file".to_string(),
    ))
}

/// Hands a received file to the knowledge base manager.
pub(crate) async fn store_upload(
    app_state: &AppState,
    file: UploadedFile,
) -> Result<DocumentDto, (StatusCode, String)> {
    match app_state.knowledge.upload_document(&file).await {
        Ok(document) => Ok(DocumentDto::from(&document)),
        Err(e @ UploadError::Unreadable(_)) => Err((StatusCode::BAD_REQUEST, e.to_string())),
        Err(e @ UploadError::Persist(_)) => Err(internal_error("Failed to save document", e)),
    }
}

#[utoipa::path(
    delete,
    path = "/documents/{id}",
    params(
        ("id" = Uuid, Path, description = "The document to remove.")
    ),
    responses(
        (status = 204, description = "Document deleted"),
        (status = 404, description = "No document with that id"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn delete_document_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let deleted = app_state
        .knowledge
        .delete_document(id)
        .await
        .map_err(|e| internal_error("Failed to delete document", e))?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, format!("Document {} not found", id)))
    }
}

//=========================================================================================
// Summary
//=========================================================================================

#[utoipa::path(
    get,
    path = "/summary",
    responses(
        (status = 200, description = "Knowledge base counts and chat status", body = SummaryResponse)
    )
)]
pub async fn summary_handler(State(app_state): State<Arc<AppState>>) -> Json<SummaryResponse> {
    let counts = app_state.knowledge.counts().await;
    let messages = app_state.conversation.messages().await.len();
    let sending = app_state.conversation.is_sending().await;

    Json(SummaryResponse {
        faqs: counts.faqs,
        documents: counts.documents,
        messages,
        sending,
        model: app_state.config.completion_model.clone(),
    })
}
