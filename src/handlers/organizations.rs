use axum::{Json, extract::State, http::StatusCode};

use crate::{
    AppState,
    auth::{AuthUser, OrgMember},
    error::{AppError, ErrorResponse, ValidationErrorResponse},
    extract::ApiJson,
    models::{
        CreateOrganizationRequest, CreateOrganizationResponse, CreatedResponse,
        MembershipResponse, OrganizationResponse, OrganizationsResponse,
    },
};

const ORGANIZATION_EXISTS: &str = "Essa organização já existe";

/// create_organization
///
/// [Authenticated Route] Creates an organization and makes the caller its OWNER.
/// Both rows are written in one transaction.
#[utoipa::path(
    post,
    path = "/organizations",
    tag = "organizations",
    request_body = CreateOrganizationRequest,
    responses(
        (status = 201, description = "Organization created", body = CreateOrganizationResponse),
        (status = 400, description = "Slug already taken or invalid payload", body = ValidationErrorResponse),
        (status = 401, description = "No session", body = ErrorResponse)
    )
)]
pub async fn create_organization(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateOrganizationRequest>,
) -> Result<(StatusCode, Json<CreateOrganizationResponse>), AppError> {
    if state
        .repo
        .get_organization_by_slug(&payload.slug)
        .await?
        .is_some()
    {
        return Err(AppError::bad_request(ORGANIZATION_EXISTS));
    }

    let id = state.repo.create_organization(user.id, &payload).await?;
    tracing::info!(organization_id = %id, slug = %payload.slug, "organization created");

    Ok((
        StatusCode::CREATED,
        Json(CreateOrganizationResponse {
            organization: CreatedResponse { id },
        }),
    ))
}

/// list_organizations
///
/// [Authenticated Route] Organizations the caller is a member of.
#[utoipa::path(
    get,
    path = "/organizations",
    tag = "organizations",
    responses((status = 200, description = "My organizations", body = OrganizationsResponse))
)]
pub async fn list_organizations(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<OrganizationsResponse>, AppError> {
    let organizations = state.repo.list_organizations_for_user(user.id).await?;
    Ok(Json(OrganizationsResponse { organizations }))
}

#[utoipa::path(
    get,
    path = "/organizations/{slug}",
    tag = "organizations",
    params(("slug" = String, Path, description = "Organization slug")),
    responses(
        (status = 200, description = "Organization", body = OrganizationResponse),
        (status = 401, description = "Not a member", body = ErrorResponse)
    )
)]
pub async fn get_organization(member: OrgMember) -> Json<OrganizationResponse> {
    Json(OrganizationResponse {
        organization: member.organization.into(),
    })
}

/// get_membership
///
/// The caller's own membership (role) in the organization.
#[utoipa::path(
    get,
    path = "/organizations/{slug}/membership",
    tag = "organizations",
    params(("slug" = String, Path, description = "Organization slug")),
    responses(
        (status = 200, description = "Membership", body = MembershipResponse),
        (status = 401, description = "Not a member", body = ErrorResponse)
    )
)]
pub async fn get_membership(member: OrgMember) -> Json<MembershipResponse> {
    Json(MembershipResponse {
        membership: member.membership,
    })
}
