use axum::{Json, extract::State, http::StatusCode};
use uuid::Uuid;

use super::live_person;
use crate::{
    AppState,
    auth::OrgMember,
    error::{AppError, ErrorResponse},
    extract::{ApiJson, ApiPath},
    models::{
        AssistanceResponse, AssistancesResponse, CreateAssistanceRequest, CreatedResponse,
        UpdateAssistanceRequest,
    },
    repository::SoftDeletable,
};

const ASSISTANCE_TYPE_NOT_FOUND: &str = "Tipo de assistência não encontrado.";
const ASSISTANCE_NOT_FOUND: &str = "Registro de assistência não encontrado.";

#[utoipa::path(
    get,
    path = "/organizations/{slug}/persons/{person_id}/assistances",
    tag = "assistances",
    params(
        ("slug" = String, Path, description = "Organization slug"),
        ("person_id" = Uuid, Path, description = "Person id")
    ),
    responses(
        (status = 200, description = "Assistances, most recent first", body = AssistancesResponse),
        (status = 404, description = "Person not found", body = ErrorResponse)
    )
)]
pub async fn list_assistances(
    member: OrgMember,
    State(state): State<AppState>,
    ApiPath((_slug, person_id)): ApiPath<(String, Uuid)>,
) -> Result<Json<AssistancesResponse>, AppError> {
    let person = live_person(&state, &member, person_id).await?;
    let assistances = state.repo.list_assistances(person.id).await?;
    Ok(Json(AssistancesResponse { assistances }))
}

#[utoipa::path(
    get,
    path = "/organizations/{slug}/persons/{person_id}/assistances/{assistance_id}",
    tag = "assistances",
    params(
        ("slug" = String, Path, description = "Organization slug"),
        ("person_id" = Uuid, Path, description = "Person id"),
        ("assistance_id" = Uuid, Path, description = "Assistance id")
    ),
    responses(
        (status = 200, description = "The assistance, or null", body = AssistanceResponse),
        (status = 404, description = "Person not found", body = ErrorResponse)
    )
)]
pub async fn get_assistance(
    member: OrgMember,
    State(state): State<AppState>,
    ApiPath((_slug, person_id, assistance_id)): ApiPath<(String, Uuid, Uuid)>,
) -> Result<Json<AssistanceResponse>, AppError> {
    let person = live_person(&state, &member, person_id).await?;
    let assistance = state.repo.get_assistance(person.id, assistance_id).await?;
    Ok(Json(AssistanceResponse { assistance }))
}

/// create_assistance
///
/// [Organization Route] Records an assistance of a live type. `receivedAt` defaults to now.
#[utoipa::path(
    post,
    path = "/organizations/{slug}/persons/{person_id}/assistances",
    tag = "assistances",
    params(
        ("slug" = String, Path, description = "Organization slug"),
        ("person_id" = Uuid, Path, description = "Person id")
    ),
    request_body = CreateAssistanceRequest,
    responses(
        (status = 201, description = "Assistance recorded", body = CreatedResponse),
        (status = 404, description = "Person or assistance type not found", body = ErrorResponse)
    )
)]
pub async fn create_assistance(
    member: OrgMember,
    State(state): State<AppState>,
    ApiPath((_slug, person_id)): ApiPath<(String, Uuid)>,
    ApiJson(payload): ApiJson<CreateAssistanceRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), AppError> {
    let person = live_person(&state, &member, person_id).await?;

    state
        .repo
        .get_assistance_type(payload.assistance_type_id)
        .await?
        .ok_or_else(|| AppError::not_found(ASSISTANCE_TYPE_NOT_FOUND))?;

    let id = state.repo.create_assistance(person.id, &payload).await?;
    tracing::info!(assistance_id = %id, %person_id, "assistance recorded");
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

#[utoipa::path(
    put,
    path = "/organizations/{slug}/persons/{person_id}/assistances/{assistance_id}",
    tag = "assistances",
    params(
        ("slug" = String, Path, description = "Organization slug"),
        ("person_id" = Uuid, Path, description = "Person id"),
        ("assistance_id" = Uuid, Path, description = "Assistance id")
    ),
    request_body = UpdateAssistanceRequest,
    responses(
        (status = 204, description = "Assistance updated"),
        (status = 404, description = "Person or assistance not found", body = ErrorResponse)
    )
)]
pub async fn update_assistance(
    member: OrgMember,
    State(state): State<AppState>,
    ApiPath((_slug, person_id, assistance_id)): ApiPath<(String, Uuid, Uuid)>,
    ApiJson(payload): ApiJson<UpdateAssistanceRequest>,
) -> Result<StatusCode, AppError> {
    let person = live_person(&state, &member, person_id).await?;
    let assistance = state
        .repo
        .get_assistance(person.id, assistance_id)
        .await?
        .ok_or_else(|| AppError::not_found(ASSISTANCE_NOT_FOUND))?;

    state.repo.update_assistance(assistance.id, &payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/organizations/{slug}/persons/{person_id}/assistances/{assistance_id}",
    tag = "assistances",
    params(
        ("slug" = String, Path, description = "Organization slug"),
        ("person_id" = Uuid, Path, description = "Person id"),
        ("assistance_id" = Uuid, Path, description = "Assistance id")
    ),
    responses(
        (status = 204, description = "Assistance deleted"),
        (status = 404, description = "Person or assistance not found", body = ErrorResponse)
    )
)]
pub async fn delete_assistance(
    member: OrgMember,
    State(state): State<AppState>,
    ApiPath((_slug, person_id, assistance_id)): ApiPath<(String, Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    let person = live_person(&state, &member, person_id).await?;
    let assistance = state
        .repo
        .get_assistance(person.id, assistance_id)
        .await?
        .ok_or_else(|| AppError::not_found(ASSISTANCE_NOT_FOUND))?;

    let deleted = state
        .repo
        .soft_delete(SoftDeletable::Assistance, assistance.id)
        .await?;
    if !deleted {
        return Err(AppError::not_found(ASSISTANCE_NOT_FOUND));
    }
    tracing::info!(%assistance_id, %person_id, "assistance soft-deleted");
    Ok(StatusCode::NO_CONTENT)
}
