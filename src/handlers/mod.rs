//! Thin axum handlers. Each one composes extractors (identity, membership, payload)
//! with repository calls and returns a minimal JSON envelope.

use uuid::Uuid;

use crate::{AppState, auth::OrgMember, error::AppError, models::Person};

pub mod addresses;
pub mod assistances;
pub mod auth_proxy;
pub mod documents;
pub mod enrollments;
pub mod invites;
pub mod lookups;
pub mod organizations;
pub mod persons;
pub mod relatives;

pub const PERSON_NOT_FOUND: &str = "Pessoa não encontrada.";

/// live_person
///
/// Re-verifies that `person_id` is a live person of the caller's organization. Every
/// person-scoped handler calls this before touching a child resource, so a person of
/// another tenant (or a soft-deleted one) is indistinguishable from a missing one.
pub(crate) async fn live_person(
    state: &AppState,
    member: &OrgMember,
    person_id: Uuid,
) -> Result<Person, AppError> {
    state
        .repo
        .get_person(member.organization.id, person_id)
        .await?
        .ok_or_else(|| AppError::not_found(PERSON_NOT_FOUND))
}
