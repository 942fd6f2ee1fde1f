use axum::{
    Json,
    body::{Body, to_bytes},
    extract::{Request, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::AppState;

/// Body returned when the identity service cannot be reached.
#[derive(Serialize, ToSchema)]
pub struct AuthFailureResponse {
    pub error: &'static str,
    pub code: &'static str,
}

impl AuthFailureResponse {
    fn response() -> Response {
        let body = Self {
            error: "Internal authentication error",
            code: "AUTH_FAILURE",
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

// Identity service payloads are small JSON documents.
const MAX_BODY_BYTES: usize = 1024 * 1024;

// Headers describing the hop itself; reqwest and hyper set their own.
const HOP_HEADERS: [header::HeaderName; 4] = [
    header::HOST,
    header::CONNECTION,
    header::CONTENT_LENGTH,
    header::TRANSFER_ENCODING,
];

/// proxy_auth
///
/// [Public Route] Forwards any request under `/api/auth/` to the identity service
/// unchanged and relays its status, headers and body back to the caller.
#[utoipa::path(
    get,
    path = "/api/auth/{path}",
    tag = "auth",
    params(("path" = String, Path, description = "Path handled by the identity service")),
    responses(
        (status = 200, description = "Relayed identity service response"),
        (status = 500, description = "Identity service unreachable", body = AuthFailureResponse)
    )
)]
pub async fn proxy_auth(State(state): State<AppState>, request: Request) -> Response {
    let Some(base_url) = state.config.auth_service_url.as_deref() else {
        tracing::error!("auth proxy called without AUTH_SERVICE_URL configured");
        return AuthFailureResponse::response();
    };

    let (parts, body) = request.into_parts();
    let body = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::error!(error = %err, "auth proxy request body could not be read");
            return AuthFailureResponse::response();
        }
    };

    let uri = &parts.uri;
    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    let target = format!("{}{}", base_url.trim_end_matches('/'), path_and_query);

    let mut forwarded = parts.headers;
    for name in &HOP_HEADERS {
        forwarded.remove(name);
    }

    let upstream = state
        .http
        .request(parts.method, &target)
        .headers(forwarded)
        .body(body)
        .send()
        .await;

    let upstream = match upstream {
        Ok(response) => response,
        Err(err) => {
            tracing::error!(error = %err, %target, "identity service request failed");
            return AuthFailureResponse::response();
        }
    };

    let status = upstream.status();
    let mut relayed = upstream.headers().clone();
    for name in &HOP_HEADERS {
        relayed.remove(name);
    }

    let bytes = match upstream.bytes().await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::error!(error = %err, %target, "identity service body could not be read");
            return AuthFailureResponse::response();
        }
    };

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    *response.headers_mut() = relayed;
    response
}
