use crate::{
    AppState,
    handlers::{invites, organizations},
};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Routes for any caller with a resolved session that are not scoped to a single
/// organization.
///
/// Access Control Strategy:
/// The `auth_middleware` layer above this module resolves `AuthUser` once per request.
/// Invite acceptance and rejection additionally compare the invite e-mail with the
/// caller's stored e-mail before mutating anything.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET/POST /organizations
        // Lists the caller's organizations, or creates one with the caller as OWNER
        // (organization and membership in one transaction).
        .route(
            "/organizations",
            get(organizations::list_organizations).post(organizations::create_organization),
        )
        // --- Invites addressed to the caller ---
        // GET /pending-invites
        // Invites whose e-mail equals the caller's, with organization name and author.
        .route("/pending-invites", get(invites::list_pending_invites))
        // POST /invites/{invite_id}/accept
        // Creates the membership and deletes the invite atomically.
        .route("/invites/{invite_id}/accept", post(invites::accept_invite))
        // POST /invites/{invite_id}/reject
        // Deletes the invite without creating a membership.
        .route("/invites/{invite_id}/reject", post(invites::reject_invite))
}
