use axum::{Json, extract::State, http::StatusCode};
use uuid::Uuid;

use crate::{
    AppState,
    auth::{AuthUser, OrgMember},
    error::{AppError, ErrorResponse},
    extract::{ApiJson, ApiPath},
    models::{
        CreateInviteRequest, CreateInviteResponse, Invite, InvitesResponse,
        PendingInvitesResponse,
    },
};

const NO_PERMISSION: &str = "Você não tem permissão para gerenciar convites.";
const DUPLICATE_INVITE: &str = "Another invite with same e-mail already exists.";
const ALREADY_MEMBER: &str = "A member with same e-mail already belong to the organization.";
const INVITE_NOT_FOUND: &str = "Invite not found.";
const INVITE_NOT_FOUND_OR_EXPIRED: &str = "Invite not found or expired.";
const USER_NOT_FOUND: &str = "User not found.";
const FOREIGN_INVITE: &str = "This invite belongs to another user.";

fn require_invite_manager(member: &OrgMember) -> Result<(), AppError> {
    if member.membership.role.can_manage_invites() {
        Ok(())
    } else {
        Err(AppError::unauthorized(NO_PERMISSION))
    }
}

/// create_invite
///
/// [Organization Route] OWNER/ADMIN only. Rejects an e-mail that already has an invite
/// or already belongs to a member of the organization.
#[utoipa::path(
    post,
    path = "/organizations/{slug}/invites",
    tag = "invites",
    params(("slug" = String, Path, description = "Organization slug")),
    request_body = CreateInviteRequest,
    responses(
        (status = 201, description = "Invite created", body = CreateInviteResponse),
        (status = 400, description = "Duplicate invite or member", body = ErrorResponse),
        (status = 401, description = "Not allowed", body = ErrorResponse)
    )
)]
pub async fn create_invite(
    member: OrgMember,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateInviteRequest>,
) -> Result<(StatusCode, Json<CreateInviteResponse>), AppError> {
    require_invite_manager(&member)?;
    let organization_id = member.organization.id;

    if state
        .repo
        .find_invite_by_email(organization_id, &payload.email)
        .await?
        .is_some()
    {
        return Err(AppError::bad_request(DUPLICATE_INVITE));
    }

    if state
        .repo
        .member_email_exists(organization_id, &payload.email)
        .await?
    {
        return Err(AppError::bad_request(ALREADY_MEMBER));
    }

    let invite_id = state
        .repo
        .create_invite(organization_id, member.user.id, &payload.email, payload.role)
        .await?;
    tracing::info!(%invite_id, %organization_id, role = ?payload.role, "invite created");

    Ok((StatusCode::CREATED, Json(CreateInviteResponse { invite_id })))
}

#[utoipa::path(
    get,
    path = "/organizations/{slug}/invites",
    tag = "invites",
    params(("slug" = String, Path, description = "Organization slug")),
    responses((status = 200, description = "Invites, newest first", body = InvitesResponse))
)]
pub async fn list_invites(
    member: OrgMember,
    State(state): State<AppState>,
) -> Result<Json<InvitesResponse>, AppError> {
    let invites = state.repo.list_invites(member.organization.id).await?;
    Ok(Json(InvitesResponse { invites }))
}

/// revoke_invite
///
/// [Organization Route] OWNER/ADMIN only. An invite of another organization is
/// reported exactly like a missing one.
#[utoipa::path(
    delete,
    path = "/organizations/{slug}/invites/{invite_id}",
    tag = "invites",
    params(
        ("slug" = String, Path, description = "Organization slug"),
        ("invite_id" = Uuid, Path, description = "Invite id")
    ),
    responses(
        (status = 204, description = "Invite revoked"),
        (status = 400, description = "Invite not found", body = ErrorResponse),
        (status = 401, description = "Not allowed", body = ErrorResponse)
    )
)]
pub async fn revoke_invite(
    member: OrgMember,
    State(state): State<AppState>,
    ApiPath((_slug, invite_id)): ApiPath<(String, Uuid)>,
) -> Result<StatusCode, AppError> {
    require_invite_manager(&member)?;

    let invite = state
        .repo
        .get_invite(invite_id)
        .await?
        .filter(|invite| invite.organization_id == member.organization.id)
        .ok_or_else(|| AppError::bad_request(INVITE_NOT_FOUND))?;

    state.repo.delete_invite(invite.id).await?;
    tracing::info!(%invite_id, "invite revoked");
    Ok(StatusCode::NO_CONTENT)
}

/// list_pending_invites
///
/// [Authenticated Route] Invites addressed to the caller's e-mail across all organizations.
#[utoipa::path(
    get,
    path = "/pending-invites",
    tag = "invites",
    responses((status = 200, description = "Pending invites", body = PendingInvitesResponse))
)]
pub async fn list_pending_invites(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<PendingInvitesResponse>, AppError> {
    let invites = state.repo.list_pending_invites(&user.email).await?;
    Ok(Json(PendingInvitesResponse { invites }))
}

/// Loads an invite and checks that it is addressed to the caller. Nothing is mutated
/// when a check fails.
async fn owned_invite(state: &AppState, user: &AuthUser, invite_id: Uuid) -> Result<Invite, AppError> {
    let invite = state
        .repo
        .get_invite(invite_id)
        .await?
        .ok_or_else(|| AppError::bad_request(INVITE_NOT_FOUND_OR_EXPIRED))?;

    let stored_user = state
        .repo
        .get_user(user.id)
        .await?
        .ok_or_else(|| AppError::bad_request(USER_NOT_FOUND))?;

    if invite.email != stored_user.email {
        return Err(AppError::bad_request(FOREIGN_INVITE));
    }
    Ok(invite)
}

/// accept_invite
///
/// [Authenticated Route] Turns the invite into a membership with the invited role and
/// consumes it, atomically.
#[utoipa::path(
    post,
    path = "/invites/{invite_id}/accept",
    tag = "invites",
    params(("invite_id" = Uuid, Path, description = "Invite id")),
    responses(
        (status = 204, description = "Invite accepted"),
        (status = 400, description = "Invite missing or addressed to someone else", body = ErrorResponse)
    )
)]
pub async fn accept_invite(
    user: AuthUser,
    State(state): State<AppState>,
    ApiPath(invite_id): ApiPath<Uuid>,
) -> Result<StatusCode, AppError> {
    let invite = owned_invite(&state, &user, invite_id).await?;
    state.repo.accept_invite(&invite, user.id).await?;
    tracing::info!(%invite_id, user_id = %user.id, "invite accepted");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/invites/{invite_id}/reject",
    tag = "invites",
    params(("invite_id" = Uuid, Path, description = "Invite id")),
    responses(
        (status = 204, description = "Invite rejected"),
        (status = 400, description = "Invite missing or addressed to someone else", body = ErrorResponse)
    )
)]
pub async fn reject_invite(
    user: AuthUser,
    State(state): State<AppState>,
    ApiPath(invite_id): ApiPath<Uuid>,
) -> Result<StatusCode, AppError> {
    let invite = owned_invite(&state, &user, invite_id).await?;
    state.repo.delete_invite(invite.id).await?;
    tracing::info!(%invite_id, user_id = %user.id, "invite rejected");
    Ok(StatusCode::NO_CONTENT)
}
