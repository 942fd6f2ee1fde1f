use axum::{Json, extract::State};

use crate::{
    AppState,
    auth::OrgMember,
    error::{AppError, ErrorResponse},
    models::{AssistanceTypesResponse, CoursesResponse},
};

/// list_courses
///
/// [Organization Route] Courses are a global catalog; membership in any organization
/// is enough to read it.
#[utoipa::path(
    get,
    path = "/organizations/{slug}/courses",
    tag = "lookups",
    params(("slug" = String, Path, description = "Organization slug")),
    responses(
        (status = 200, description = "Live courses ordered by title", body = CoursesResponse),
        (status = 401, description = "Not a member", body = ErrorResponse)
    )
)]
pub async fn list_courses(
    _member: OrgMember,
    State(state): State<AppState>,
) -> Result<Json<CoursesResponse>, AppError> {
    let courses = state.repo.list_courses().await?;
    Ok(Json(CoursesResponse { courses }))
}

#[utoipa::path(
    get,
    path = "/organizations/{slug}/assistance-types",
    tag = "lookups",
    params(("slug" = String, Path, description = "Organization slug")),
    responses(
        (status = 200, description = "Live assistance types ordered by name", body = AssistanceTypesResponse),
        (status = 401, description = "Not a member", body = ErrorResponse)
    )
)]
pub async fn list_assistance_types(
    _member: OrgMember,
    State(state): State<AppState>,
) -> Result<Json<AssistanceTypesResponse>, AppError> {
    let assistance_types = state.repo.list_assistance_types().await?;
    Ok(Json(AssistanceTypesResponse { assistance_types }))
}
