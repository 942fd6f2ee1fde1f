use axum::{Json, extract::State, http::StatusCode};
use uuid::Uuid;

use super::live_person;
use crate::{
    AppState,
    auth::OrgMember,
    error::{AppError, ErrorResponse},
    extract::{ApiJson, ApiPath},
    models::{
        CreateEnrollmentRequest, CreatedResponse, EnrollmentResponse, EnrollmentsResponse,
        UpdateEnrollmentRequest,
    },
    repository::SoftDeletable,
};

const COURSE_NOT_FOUND: &str = "Curso não encontrado.";
const ALREADY_ENROLLED: &str = "Pessoa já matriculada neste curso.";
const ENROLLMENT_NOT_FOUND: &str = "Matrícula não encontrada.";

#[utoipa::path(
    get,
    path = "/organizations/{slug}/persons/{person_id}/enrollments",
    tag = "enrollments",
    params(
        ("slug" = String, Path, description = "Organization slug"),
        ("person_id" = Uuid, Path, description = "Person id")
    ),
    responses(
        (status = 200, description = "Enrollments, newest first", body = EnrollmentsResponse),
        (status = 404, description = "Person not found", body = ErrorResponse)
    )
)]
pub async fn list_enrollments(
    member: OrgMember,
    State(state): State<AppState>,
    ApiPath((_slug, person_id)): ApiPath<(String, Uuid)>,
) -> Result<Json<EnrollmentsResponse>, AppError> {
    let person = live_person(&state, &member, person_id).await?;
    let enrollments = state.repo.list_enrollments(person.id).await?;
    Ok(Json(EnrollmentsResponse { enrollments }))
}

#[utoipa::path(
    get,
    path = "/organizations/{slug}/persons/{person_id}/enrollments/{enrollment_id}",
    tag = "enrollments",
    params(
        ("slug" = String, Path, description = "Organization slug"),
        ("person_id" = Uuid, Path, description = "Person id"),
        ("enrollment_id" = Uuid, Path, description = "Enrollment id")
    ),
    responses(
        (status = 200, description = "The enrollment, or null", body = EnrollmentResponse),
        (status = 404, description = "Person not found", body = ErrorResponse)
    )
)]
pub async fn get_enrollment(
    member: OrgMember,
    State(state): State<AppState>,
    ApiPath((_slug, person_id, enrollment_id)): ApiPath<(String, Uuid, Uuid)>,
) -> Result<Json<EnrollmentResponse>, AppError> {
    let person = live_person(&state, &member, person_id).await?;
    let enrollment = state.repo.get_enrollment(person.id, enrollment_id).await?;
    Ok(Json(EnrollmentResponse { enrollment }))
}

/// create_enrollment
///
/// [Organization Route] Enrolls a person in a live course. A person holds at most one
/// live enrollment per course.
#[utoipa::path(
    post,
    path = "/organizations/{slug}/persons/{person_id}/enrollments",
    tag = "enrollments",
    params(
        ("slug" = String, Path, description = "Organization slug"),
        ("person_id" = Uuid, Path, description = "Person id")
    ),
    request_body = CreateEnrollmentRequest,
    responses(
        (status = 201, description = "Enrollment created", body = CreatedResponse),
        (status = 400, description = "Already enrolled", body = ErrorResponse),
        (status = 404, description = "Person or course not found", body = ErrorResponse)
    )
)]
pub async fn create_enrollment(
    member: OrgMember,
    State(state): State<AppState>,
    ApiPath((_slug, person_id)): ApiPath<(String, Uuid)>,
    ApiJson(payload): ApiJson<CreateEnrollmentRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), AppError> {
    let person = live_person(&state, &member, person_id).await?;

    state
        .repo
        .get_course(payload.course_id)
        .await?
        .ok_or_else(|| AppError::not_found(COURSE_NOT_FOUND))?;

    if state
        .repo
        .find_enrollment_by_course(person.id, payload.course_id)
        .await?
        .is_some()
    {
        return Err(AppError::bad_request(ALREADY_ENROLLED));
    }

    let id = state.repo.create_enrollment(person.id, &payload).await?;
    tracing::info!(enrollment_id = %id, %person_id, course_id = %payload.course_id, "enrollment created");
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

#[utoipa::path(
    put,
    path = "/organizations/{slug}/persons/{person_id}/enrollments/{enrollment_id}",
    tag = "enrollments",
    params(
        ("slug" = String, Path, description = "Organization slug"),
        ("person_id" = Uuid, Path, description = "Person id"),
        ("enrollment_id" = Uuid, Path, description = "Enrollment id")
    ),
    request_body = UpdateEnrollmentRequest,
    responses(
        (status = 204, description = "Enrollment updated"),
        (status = 404, description = "Person or enrollment not found", body = ErrorResponse)
    )
)]
pub async fn update_enrollment(
    member: OrgMember,
    State(state): State<AppState>,
    ApiPath((_slug, person_id, enrollment_id)): ApiPath<(String, Uuid, Uuid)>,
    ApiJson(payload): ApiJson<UpdateEnrollmentRequest>,
) -> Result<StatusCode, AppError> {
    let person = live_person(&state, &member, person_id).await?;
    let enrollment = state
        .repo
        .get_enrollment(person.id, enrollment_id)
        .await?
        .ok_or_else(|| AppError::not_found(ENROLLMENT_NOT_FOUND))?;

    state.repo.update_enrollment(enrollment.id, &payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/organizations/{slug}/persons/{person_id}/enrollments/{enrollment_id}",
    tag = "enrollments",
    params(
        ("slug" = String, Path, description = "Organization slug"),
        ("person_id" = Uuid, Path, description = "Person id"),
        ("enrollment_id" = Uuid, Path, description = "Enrollment id")
    ),
    responses(
        (status = 204, description = "Enrollment deleted"),
        (status = 404, description = "Person or enrollment not found", body = ErrorResponse)
    )
)]
pub async fn delete_enrollment(
    member: OrgMember,
    State(state): State<AppState>,
    ApiPath((_slug, person_id, enrollment_id)): ApiPath<(String, Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    let person = live_person(&state, &member, person_id).await?;
    let enrollment = state
        .repo
        .get_enrollment(person.id, enrollment_id)
        .await?
        .ok_or_else(|| AppError::not_found(ENROLLMENT_NOT_FOUND))?;

    let deleted = state
        .repo
        .soft_delete(SoftDeletable::Enrollment, enrollment.id)
        .await?;
    if !deleted {
        return Err(AppError::not_found(ENROLLMENT_NOT_FOUND));
    }
    tracing::info!(%enrollment_id, %person_id, "enrollment soft-deleted");
    Ok(StatusCode::NO_CONTENT)
}
