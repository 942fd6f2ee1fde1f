use axum::{Json, extract::State, http::StatusCode};
use uuid::Uuid;

use super::live_person;
use crate::{
    AppState,
    auth::OrgMember,
    error::{AppError, ErrorResponse},
    extract::{ApiJson, ApiPath},
    models::{AddressResponse, CreateAddressRequest, CreatedResponse, UpdateAddressRequest},
    repository::SoftDeletable,
};

const ADDRESS_EXISTS: &str = "Endereço já cadastrado.";
const ADDRESS_NOT_FOUND: &str = "Endereço não encontrado.";

#[utoipa::path(
    get,
    path = "/organizations/{slug}/persons/{person_id}/address",
    tag = "address",
    params(
        ("slug" = String, Path, description = "Organization slug"),
        ("person_id" = Uuid, Path, description = "Person id")
    ),
    responses(
        (status = 200, description = "The live address, or null", body = AddressResponse),
        (status = 404, description = "Person not found", body = ErrorResponse)
    )
)]
pub async fn get_address(
    member: OrgMember,
    State(state): State<AppState>,
    ApiPath((_slug, person_id)): ApiPath<(String, Uuid)>,
) -> Result<Json<AddressResponse>, AppError> {
    let person = live_person(&state, &member, person_id).await?;
    let address = state.repo.get_address(person.id).await?;
    Ok(Json(AddressResponse { address }))
}

/// create_address
///
/// [Organization Route] A person has at most one live address. A second one is
/// rejected rather than replacing the first.
#[utoipa::path(
    post,
    path = "/organizations/{slug}/persons/{person_id}/address",
    tag = "address",
    params(
        ("slug" = String, Path, description = "Organization slug"),
        ("person_id" = Uuid, Path, description = "Person id")
    ),
    request_body = CreateAddressRequest,
    responses(
        (status = 201, description = "Address created", body = CreatedResponse),
        (status = 400, description = "Address already registered", body = ErrorResponse),
        (status = 404, description = "Person not found", body = ErrorResponse)
    )
)]
pub async fn create_address(
    member: OrgMember,
    State(state): State<AppState>,
    ApiPath((_slug, person_id)): ApiPath<(String, Uuid)>,
    ApiJson(payload): ApiJson<CreateAddressRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), AppError> {
    let person = live_person(&state, &member, person_id).await?;

    if state.repo.get_address(person.id).await?.is_some() {
        return Err(AppError::bad_request(ADDRESS_EXISTS));
    }

    let id = state.repo.create_address(person.id, &payload).await?;
    tracing::info!(address_id = %id, %person_id, "address created");
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

#[utoipa::path(
    put,
    path = "/organizations/{slug}/persons/{person_id}/address",
    tag = "address",
    params(
        ("slug" = String, Path, description = "Organization slug"),
        ("person_id" = Uuid, Path, description = "Person id")
    ),
    request_body = UpdateAddressRequest,
    responses(
        (status = 204, description = "Address updated"),
        (status = 404, description = "Person or address not found", body = ErrorResponse)
    )
)]
pub async fn update_address(
    member: OrgMember,
    State(state): State<AppState>,
    ApiPath((_slug, person_id)): ApiPath<(String, Uuid)>,
    ApiJson(payload): ApiJson<UpdateAddressRequest>,
) -> Result<StatusCode, AppError> {
    let person = live_person(&state, &member, person_id).await?;
    let address = state
        .repo
        .get_address(person.id)
        .await?
        .ok_or_else(|| AppError::not_found(ADDRESS_NOT_FOUND))?;

    state.repo.update_address(address.id, &payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/organizations/{slug}/persons/{person_id}/address",
    tag = "address",
    params(
        ("slug" = String, Path, description = "Organization slug"),
        ("person_id" = Uuid, Path, description = "Person id")
    ),
    responses(
        (status = 204, description = "Address deleted"),
        (status = 404, description = "Person or address not found", body = ErrorResponse)
    )
)]
pub async fn delete_address(
    member: OrgMember,
    State(state): State<AppState>,
    ApiPath((_slug, person_id)): ApiPath<(String, Uuid)>,
) -> Result<StatusCode, AppError> {
    let person = live_person(&state, &member, person_id).await?;
    let address = state
        .repo
        .get_address(person.id)
        .await?
        .ok_or_else(|| AppError::not_found(ADDRESS_NOT_FOUND))?;

    let deleted = state
        .repo
        .soft_delete(SoftDeletable::Address, address.id)
        .await?;
    if !deleted {
        return Err(AppError::not_found(ADDRESS_NOT_FOUND));
    }
    tracing::info!(address_id = %address.id, %person_id, "address soft-deleted");
    Ok(StatusCode::NO_CONTENT)
}
