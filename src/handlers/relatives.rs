use axum::{Json, extract::State, http::StatusCode};
use uuid::Uuid;

use super::live_person;
use crate::{
    AppState,
    auth::OrgMember,
    error::{AppError, ErrorResponse},
    extract::{ApiJson, ApiPath},
    models::{
        CreateRelativeRequest, CreatedResponse, RelativeResponse, RelativesResponse,
        UpdateRelativeRequest,
    },
    repository::SoftDeletable,
};

const RELATIVE_NOT_FOUND: &str = "Parente não encontrado.";

#[utoipa::path(
    get,
    path = "/organizations/{slug}/persons/{person_id}/relatives",
    tag = "relatives",
    params(
        ("slug" = String, Path, description = "Organization slug"),
        ("person_id" = Uuid, Path, description = "Person id")
    ),
    responses(
        (status = 200, description = "Relatives ordered by name", body = RelativesResponse),
        (status = 404, description = "Person not found", body = ErrorResponse)
    )
)]
pub async fn list_relatives(
    member: OrgMember,
    State(state): State<AppState>,
    ApiPath((_slug, person_id)): ApiPath<(String, Uuid)>,
) -> Result<Json<RelativesResponse>, AppError> {
    let person = live_person(&state, &member, person_id).await?;
    let relatives = state.repo.list_relatives(person.id).await?;
    Ok(Json(RelativesResponse { relatives }))
}

#[utoipa::path(
    get,
    path = "/organizations/{slug}/persons/{person_id}/relatives/{relative_id}",
    tag = "relatives",
    params(
        ("slug" = String, Path, description = "Organization slug"),
        ("person_id" = Uuid, Path, description = "Person id"),
        ("relative_id" = Uuid, Path, description = "Relative id")
    ),
    responses(
        (status = 200, description = "The relative, or null", body = RelativeResponse),
        (status = 404, description = "Person not found", body = ErrorResponse)
    )
)]
pub async fn get_relative(
    member: OrgMember,
    State(state): State<AppState>,
    ApiPath((_slug, person_id, relative_id)): ApiPath<(String, Uuid, Uuid)>,
) -> Result<Json<RelativeResponse>, AppError> {
    let person = live_person(&state, &member, person_id).await?;
    let relative = state.repo.get_relative(person.id, relative_id).await?;
    Ok(Json(RelativeResponse { relative }))
}

#[utoipa::path(
    post,
    path = "/organizations/{slug}/persons/{person_id}/relatives",
    tag = "relatives",
    params(
        ("slug" = String, Path, description = "Organization slug"),
        ("person_id" = Uuid, Path, description = "Person id")
    ),
    request_body = CreateRelativeRequest,
    responses(
        (status = 201, description = "Relative created", body = CreatedResponse),
        (status = 404, description = "Person not found", body = ErrorResponse)
    )
)]
pub async fn create_relative(
    member: OrgMember,
    State(state): State<AppState>,
    ApiPath((_slug, person_id)): ApiPath<(String, Uuid)>,
    ApiJson(payload): ApiJson<CreateRelativeRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), AppError> {
    let person = live_person(&state, &member, person_id).await?;
    let id = state.repo.create_relative(person.id, &payload).await?;
    tracing::info!(relative_id = %id, %person_id, "relative created");
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

#[utoipa::path(
    put,
    path = "/organizations/{slug}/persons/{person_id}/relatives/{relative_id}",
    tag = "relatives",
    params(
        ("slug" = String, Path, description = "Organization slug"),
        ("person_id" = Uuid, Path, description = "Person id"),
        ("relative_id" = Uuid, Path, description = "Relative id")
    ),
    request_body = UpdateRelativeRequest,
    responses(
        (status = 204, description = "Relative updated"),
        (status = 404, description = "Person or relative not found", body = ErrorResponse)
    )
)]
pub async fn update_relative(
    member: OrgMember,
    State(state): State<AppState>,
    ApiPath((_slug, person_id, relative_id)): ApiPath<(String, Uuid, Uuid)>,
    ApiJson(payload): ApiJson<UpdateRelativeRequest>,
) -> Result<StatusCode, AppError> {
    let person = live_person(&state, &member, person_id).await?;
    let relative = state
        .repo
        .get_relative(person.id, relative_id)
        .await?
        .ok_or_else(|| AppError::not_found(RELATIVE_NOT_FOUND))?;

    state.repo.update_relative(relative.id, &payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/organizations/{slug}/persons/{person_id}/relatives/{relative_id}",
    tag = "relatives",
    params(
        ("slug" = String, Path, description = "Organization slug"),
        ("person_id" = Uuid, Path, description = "Person id"),
        ("relative_id" = Uuid, Path, description = "Relative id")
    ),
    responses(
        (status = 204, description = "Relative deleted"),
        (status = 404, description = "Person or relative not found", body = ErrorResponse)
    )
)]
pub async fn delete_relative(
    member: OrgMember,
    State(state): State<AppState>,
    ApiPath((_slug, person_id, relative_id)): ApiPath<(String, Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    let person = live_person(&state, &member, person_id).await?;
    let relative = state
        .repo
        .get_relative(person.id, relative_id)
        .await?
        .ok_or_else(|| AppError::not_found(RELATIVE_NOT_FOUND))?;

    let deleted = state
        .repo
        .soft_delete(SoftDeletable::Relative, relative.id)
        .await?;
    if !deleted {
        return Err(AppError::not_found(RELATIVE_NOT_FOUND));
    }
    tracing::info!(%relative_id, %person_id, "relative soft-deleted");
    Ok(StatusCode::NO_CONTENT)
}
