use axum::{Json, extract::State, http::StatusCode};
use uuid::Uuid;

use super::live_person;
use crate::{
    AppState,
    auth::OrgMember,
    error::{AppError, ErrorResponse, ValidationErrorResponse},
    extract::{ApiJson, ApiPath},
    models::{
        AvatarResponse, CreateAvatarRequest, CreateDocumentRequest, CreatedResponse,
        DocumentResponse, DocumentType, DocumentsResponse, UpdateDocumentRequest,
    },
    repository::SoftDeletable,
};

const DOCUMENT_NOT_FOUND: &str = "Documento não encontrado.";

#[utoipa::path(
    get,
    path = "/organizations/{slug}/persons/{person_id}/documents",
    tag = "documents",
    params(
        ("slug" = String, Path, description = "Organization slug"),
        ("person_id" = Uuid, Path, description = "Person id")
    ),
    responses(
        (status = 200, description = "Documents, newest first", body = DocumentsResponse),
        (status = 404, description = "Person not found", body = ErrorResponse)
    )
)]
pub async fn list_documents(
    member: OrgMember,
    State(state): State<AppState>,
    ApiPath((_slug, person_id)): ApiPath<(String, Uuid)>,
) -> Result<Json<DocumentsResponse>, AppError> {
    let person = live_person(&state, &member, person_id).await?;
    let documents = state.repo.list_documents(person.id).await?;
    Ok(Json(DocumentsResponse { documents }))
}

#[utoipa::path(
    get,
    path = "/organizations/{slug}/persons/{person_id}/documents/{document_id}",
    tag = "documents",
    params(
        ("slug" = String, Path, description = "Organization slug"),
        ("person_id" = Uuid, Path, description = "Person id"),
        ("document_id" = Uuid, Path, description = "Document id")
    ),
    responses(
        (status = 200, description = "The document, or null", body = DocumentResponse),
        (status = 404, description = "Person not found", body = ErrorResponse)
    )
)]
pub async fn get_document(
    member: OrgMember,
    State(state): State<AppState>,
    ApiPath((_slug, person_id, document_id)): ApiPath<(String, Uuid, Uuid)>,
) -> Result<Json<DocumentResponse>, AppError> {
    let person = live_person(&state, &member, person_id).await?;
    let document = state.repo.get_document(person.id, document_id).await?;
    Ok(Json(DocumentResponse { document }))
}

/// create_document
///
/// [Organization Route] Stores a reference to a file the client already uploaded
/// elsewhere. The URL is kept as given.
#[utoipa::path(
    post,
    path = "/organizations/{slug}/persons/{person_id}/documents",
    tag = "documents",
    params(
        ("slug" = String, Path, description = "Organization slug"),
        ("person_id" = Uuid, Path, description = "Person id")
    ),
    request_body = CreateDocumentRequest,
    responses(
        (status = 201, description = "Document created", body = CreatedResponse),
        (status = 400, description = "Invalid payload", body = ValidationErrorResponse),
        (status = 404, description = "Person not found", body = ErrorResponse)
    )
)]
pub async fn create_document(
    member: OrgMember,
    State(state): State<AppState>,
    ApiPath((_slug, person_id)): ApiPath<(String, Uuid)>,
    ApiJson(payload): ApiJson<CreateDocumentRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), AppError> {
    let person = live_person(&state, &member, person_id).await?;
    let id = state.repo.create_document(person.id, &payload).await?;
    tracing::info!(document_id = %id, %person_id, document_type = ?payload.document_type, "document created");
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

#[utoipa::path(
    put,
    path = "/organizations/{slug}/persons/{person_id}/documents/{document_id}",
    tag = "documents",
    params(
        ("slug" = String, Path, description = "Organization slug"),
        ("person_id" = Uuid, Path, description = "Person id"),
        ("document_id" = Uuid, Path, description = "Document id")
    ),
    request_body = UpdateDocumentRequest,
    responses(
        (status = 204, description = "Document updated"),
        (status = 404, description = "Person or document not found", body = ErrorResponse)
    )
)]
pub async fn update_document(
    member: OrgMember,
    State(state): State<AppState>,
    ApiPath((_slug, person_id, document_id)): ApiPath<(String, Uuid, Uuid)>,
    ApiJson(payload): ApiJson<UpdateDocumentRequest>,
) -> Result<StatusCode, AppError> {
    let person = live_person(&state, &member, person_id).await?;
    let document = state
        .repo
        .get_document(person.id, document_id)
        .await?
        .ok_or_else(|| AppError::not_found(DOCUMENT_NOT_FOUND))?;

    state.repo.update_document(document.id, &payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/organizations/{slug}/persons/{person_id}/documents/{document_id}",
    tag = "documents",
    params(
        ("slug" = String, Path, description = "Organization slug"),
        ("person_id" = Uuid, Path, description = "Person id"),
        ("document_id" = Uuid, Path, description = "Document id")
    ),
    responses(
        (status = 204, description = "Document deleted"),
        (status = 404, description = "Person or document not found", body = ErrorResponse)
    )
)]
pub async fn delete_document(
    member: OrgMember,
    State(state): State<AppState>,
    ApiPath((_slug, person_id, document_id)): ApiPath<(String, Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    let person = live_person(&state, &member, person_id).await?;
    let document = state
        .repo
        .get_document(person.id, document_id)
        .await?
        .ok_or_else(|| AppError::not_found(DOCUMENT_NOT_FOUND))?;

    let deleted = state
        .repo
        .soft_delete(SoftDeletable::Document, document.id)
        .await?;
    if !deleted {
        return Err(AppError::not_found(DOCUMENT_NOT_FOUND));
    }
    tracing::info!(%document_id, %person_id, "document soft-deleted");
    Ok(StatusCode::NO_CONTENT)
}

// --- Avatar (latest WALLET_PHOTO document) ---

#[utoipa::path(
    get,
    path = "/organizations/{slug}/persons/{person_id}/avatar",
    tag = "documents",
    params(
        ("slug" = String, Path, description = "Organization slug"),
        ("person_id" = Uuid, Path, description = "Person id")
    ),
    responses(
        (status = 200, description = "Latest wallet photo, or null", body = AvatarResponse),
        (status = 404, description = "Person not found", body = ErrorResponse)
    )
)]
pub async fn get_avatar(
    member: OrgMember,
    State(state): State<AppState>,
    ApiPath((_slug, person_id)): ApiPath<(String, Uuid)>,
) -> Result<Json<AvatarResponse>, AppError> {
    let person = live_person(&state, &member, person_id).await?;
    let avatar = state
        .repo
        .latest_document(person.id, DocumentType::WalletPhoto)
        .await?;
    Ok(Json(AvatarResponse { avatar }))
}

/// create_avatar
///
/// [Organization Route] Adds a document that becomes the person's avatar. Older wallet
/// photos are kept; the newest one wins.
#[utoipa::path(
    post,
    path = "/organizations/{slug}/persons/{person_id}/avatar",
    tag = "documents",
    params(
        ("slug" = String, Path, description = "Organization slug"),
        ("person_id" = Uuid, Path, description = "Person id")
    ),
    request_body = CreateAvatarRequest,
    responses(
        (status = 201, description = "Avatar stored", body = CreatedResponse),
        (status = 404, description = "Person not found", body = ErrorResponse)
    )
)]
pub async fn create_avatar(
    member: OrgMember,
    State(state): State<AppState>,
    ApiPath((_slug, person_id)): ApiPath<(String, Uuid)>,
    ApiJson(payload): ApiJson<CreateAvatarRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), AppError> {
    let person = live_person(&state, &member, person_id).await?;
    let document = CreateDocumentRequest::from(payload);
    let id = state.repo.create_document(person.id, &document).await?;
    tracing::info!(document_id = %id, %person_id, "avatar stored");
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}
