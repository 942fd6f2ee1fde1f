use crate::{
    AppState,
    handlers::{
        addresses, assistances, documents, enrollments, invites, lookups, organizations,
        persons, relatives,
    },
};
use axum::{
    Router,
    routing::{delete, get},
};

/// Organization Router Module
///
/// Every route is keyed by the organization slug. Handlers take the `OrgMember`
/// extractor, which loads the caller's membership for `{slug}` and rejects
/// non-members with 401. Person-scoped handlers then re-check that the person is a
/// live member of the same organization before reading or writing any child row.
pub fn organization_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /organizations/{slug}
        .route("/organizations/{slug}", get(organizations::get_organization))
        // GET /organizations/{slug}/membership
        // The caller's own role in this organization.
        .route(
            "/organizations/{slug}/membership",
            get(organizations::get_membership),
        )
        // --- Invites (OWNER/ADMIN) ---
        .route(
            "/organizations/{slug}/invites",
            get(invites::list_invites).post(invites::create_invite),
        )
        .route(
            "/organizations/{slug}/invites/{invite_id}",
            delete(invites::revoke_invite),
        )
        // --- Lookups ---
        // Global catalogs, readable by any member.
        .route("/organizations/{slug}/courses", get(lookups::list_courses))
        .route(
            "/organizations/{slug}/assistance-types",
            get(lookups::list_assistance_types),
        )
        // --- Persons ---
        // GET /organizations/{slug}/persons?search=...&page=...
        // Live persons ordered by name; a page holds 15 rows.
        .route(
            "/organizations/{slug}/persons",
            get(persons::list_persons).post(persons::create_person),
        )
        // PUT/DELETE soft-delete; CPF and NIS stay unique among live rows only.
        .route(
            "/organizations/{slug}/persons/{person_id}",
            get(persons::get_person)
                .put(persons::update_person)
                .delete(persons::delete_person),
        )
        // --- Address (single live instance per person) ---
        .route(
            "/organizations/{slug}/persons/{person_id}/address",
            get(addresses::get_address)
                .post(addresses::create_address)
                .put(addresses::update_address)
                .delete(addresses::delete_address),
        )
        // --- Relatives ---
        .route(
            "/organizations/{slug}/persons/{person_id}/relatives",
            get(relatives::list_relatives).post(relatives::create_relative),
        )
        .route(
            "/organizations/{slug}/persons/{person_id}/relatives/{relative_id}",
            get(relatives::get_relative)
                .put(relatives::update_relative)
                .delete(relatives::delete_relative),
        )
        // --- Enrollments ---
        .route(
            "/organizations/{slug}/persons/{person_id}/enrollments",
            get(enrollments::list_enrollments).post(enrollments::create_enrollment),
        )
        .route(
            "/organizations/{slug}/persons/{person_id}/enrollments/{enrollment_id}",
            get(enrollments::get_enrollment)
                .put(enrollments::update_enrollment)
                .delete(enrollments::delete_enrollment),
        )
        // --- Assistances ---
        .route(
            "/organizations/{slug}/persons/{person_id}/assistances",
            get(assistances::list_assistances).post(assistances::create_assistance),
        )
        .route(
            "/organizations/{slug}/persons/{person_id}/assistances/{assistance_id}",
            get(assistances::get_assistance)
                .put(assistances::update_assistance)
                .delete(assistances::delete_assistance),
        )
        // --- Documents ---
        // Only references to files stored elsewhere; nothing is uploaded here.
        .route(
            "/organizations/{slug}/persons/{person_id}/documents",
            get(documents::list_documents).post(documents::create_document),
        )
        .route(
            "/organizations/{slug}/persons/{person_id}/documents/{document_id}",
            get(documents::get_document)
                .put(documents::update_document)
                .delete(documents::delete_document),
        )
        // GET/POST /organizations/{slug}/persons/{person_id}/avatar
        // The avatar is the newest live WALLET_PHOTO document.
        .route(
            "/organizations/{slug}/persons/{person_id}/avatar",
            get(documents::get_avatar).post(documents::create_avatar),
        )
}
