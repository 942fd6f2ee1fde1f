use axum::{Json, extract::State, http::StatusCode};
use uuid::Uuid;

use super::{PERSON_NOT_FOUND, live_person};
use crate::{
    AppState,
    auth::OrgMember,
    error::{AppError, ErrorResponse, ValidationErrorResponse},
    extract::{ApiJson, ApiPath, ApiQuery},
    models::{
        CreatePersonRequest, CreatedResponse, PersonFilter, PersonResponse, PersonsResponse,
        UpdatePersonRequest,
    },
    repository::SoftDeletable,
};

/// list_persons
///
/// [Organization Route] Live persons of the organization ordered by full name.
/// `search` narrows by name, CPF, phone or parents' names; `page` returns a fixed
/// window of 15.
#[utoipa::path(
    get,
    path = "/organizations/{slug}/persons",
    tag = "persons",
    params(("slug" = String, Path, description = "Organization slug"), PersonFilter),
    responses((status = 200, description = "Persons", body = PersonsResponse))
)]
pub async fn list_persons(
    member: OrgMember,
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<PersonFilter>,
) -> Result<Json<PersonsResponse>, AppError> {
    let persons = state
        .repo
        .list_persons(member.organization.id, &filter)
        .await?;
    Ok(Json(PersonsResponse { persons }))
}

/// create_person
///
/// [Organization Route] Registers a person. CPF and NIS must not belong to another
/// live person of the same organization; both conflicts are reported together.
#[utoipa::path(
    post,
    path = "/organizations/{slug}/persons",
    tag = "persons",
    params(("slug" = String, Path, description = "Organization slug")),
    request_body = CreatePersonRequest,
    responses(
        (status = 201, description = "Person created", body = CreatedResponse),
        (status = 400, description = "CPF or NIS already registered, or invalid payload", body = ValidationErrorResponse)
    )
)]
pub async fn create_person(
    member: OrgMember,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreatePersonRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), AppError> {
    let organization_id = member.organization.id;

    let conflicts = state
        .repo
        .find_person_conflicts(
            organization_id,
            Some(payload.cpf.as_str()),
            payload.nis.as_deref(),
            None,
        )
        .await?;
    if let Some(message) = conflicts.message() {
        return Err(AppError::bad_request(message));
    }

    let id = state.repo.create_person(organization_id, &payload).await?;
    tracing::info!(person_id = %id, %organization_id, "person created");
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

#[utoipa::path(
    get,
    path = "/organizations/{slug}/persons/{person_id}",
    tag = "persons",
    params(
        ("slug" = String, Path, description = "Organization slug"),
        ("person_id" = Uuid, Path, description = "Person id")
    ),
    responses(
        (status = 200, description = "Person", body = PersonResponse),
        (status = 404, description = "Person not found", body = ErrorResponse)
    )
)]
pub async fn get_person(
    member: OrgMember,
    State(state): State<AppState>,
    ApiPath((_slug, person_id)): ApiPath<(String, Uuid)>,
) -> Result<Json<PersonResponse>, AppError> {
    let person = live_person(&state, &member, person_id).await?;
    Ok(Json(PersonResponse { person }))
}

/// update_person
///
/// [Organization Route] Partial update. Only a CPF or NIS that actually changes is
/// checked for duplicates, and the person itself is excluded from the check.
#[utoipa::path(
    put,
    path = "/organizations/{slug}/persons/{person_id}",
    tag = "persons",
    params(
        ("slug" = String, Path, description = "Organization slug"),
        ("person_id" = Uuid, Path, description = "Person id")
    ),
    request_body = UpdatePersonRequest,
    responses(
        (status = 204, description = "Person updated"),
        (status = 400, description = "CPF or NIS already registered", body = ErrorResponse),
        (status = 404, description = "Person not found", body = ErrorResponse)
    )
)]
pub async fn update_person(
    member: OrgMember,
    State(state): State<AppState>,
    ApiPath((_slug, person_id)): ApiPath<(String, Uuid)>,
    ApiJson(payload): ApiJson<UpdatePersonRequest>,
) -> Result<StatusCode, AppError> {
    let person = live_person(&state, &member, person_id).await?;

    let new_cpf = payload.cpf.as_deref().filter(|cpf| *cpf != person.cpf);
    let new_nis = payload
        .nis
        .as_ref()
        .and_then(|nis| nis.as_deref())
        .filter(|nis| Some(*nis) != person.nis.as_deref());

    if new_cpf.is_some() || new_nis.is_some() {
        let conflicts = state
            .repo
            .find_person_conflicts(member.organization.id, new_cpf, new_nis, Some(person.id))
            .await?;
        if let Some(message) = conflicts.message() {
            return Err(AppError::bad_request(message));
        }
    }

    state.repo.update_person(person.id, &payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// delete_person
///
/// [Organization Route] Soft delete. The person disappears from every read and frees
/// its CPF/NIS for new registrations.
#[utoipa::path(
    delete,
    path = "/organizations/{slug}/persons/{person_id}",
    tag = "persons",
    params(
        ("slug" = String, Path, description = "Organization slug"),
        ("person_id" = Uuid, Path, description = "Person id")
    ),
    responses(
        (status = 204, description = "Person deleted"),
        (status = 404, description = "Person not found", body = ErrorResponse)
    )
)]
pub async fn delete_person(
    member: OrgMember,
    State(state): State<AppState>,
    ApiPath((_slug, person_id)): ApiPath<(String, Uuid)>,
) -> Result<StatusCode, AppError> {
    let person = live_person(&state, &member, person_id).await?;
    let deleted = state
        .repo
        .soft_delete(SoftDeletable::Person, person.id)
        .await?;
    // Lost a race with a concurrent delete.
    if !deleted {
        return Err(AppError::not_found(PERSON_NOT_FOUND));
    }
    tracing::info!(%person_id, "person soft-deleted");
    Ok(StatusCode::NO_CONTENT)
}
