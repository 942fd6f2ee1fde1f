/// Router Module Index
///
/// Splits the HTTP surface by the identity it requires. Access control is applied
/// at the module level (via Axum layers) so no protected endpoint is reachable
/// without the layer above it.

/// Routes reachable without a session: health check and the identity proxy.
pub mod public;

/// Routes protected by the `AuthUser` middleware that do not target a single
/// organization (creating organizations, handling one's own invites).
pub mod authenticated;

/// Routes under `/organizations/{slug}`. Every handler here also extracts
/// `OrgMember`, so a caller outside the organization gets 401 before any work.
pub mod organization;
