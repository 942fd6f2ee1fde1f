use std::time::Duration;

use axum::{
    Router,
    extract::{FromRef, Request},
    http::{HeaderName, HeaderValue, Method, header},
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod session;
pub mod validation;

// Module for routing segregation (Public, Authenticated, Organization).
pub mod routes;
use auth::AuthUser;
use routes::{authenticated, organization, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use repository::{PostgresRepository, RepositoryState};
pub use session::{SessionState, session_provider};

/// ApiDoc
///
/// Aggregates every `#[utoipa::path]` handler and the schemas they exchange. Served
/// at `/api-docs/openapi.json` and browsable under `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::organizations::create_organization, handlers::organizations::list_organizations,
        handlers::organizations::get_organization, handlers::organizations::get_membership,
        handlers::invites::create_invite, handlers::invites::list_invites,
        handlers::invites::revoke_invite, handlers::invites::list_pending_invites,
        handlers::invites::accept_invite, handlers::invites::reject_invite,
        handlers::persons::list_persons, handlers::persons::create_person,
        handlers::persons::get_person, handlers::persons::update_person,
        handlers::persons::delete_person,
        handlers::addresses::get_address, handlers::addresses::create_address,
        handlers::addresses::update_address, handlers::addresses::delete_address,
        handlers::relatives::list_relatives, handlers::relatives::get_relative,
        handlers::relatives::create_relative, handlers::relatives::update_relative,
        handlers::relatives::delete_relative,
        handlers::enrollments::list_enrollments, handlers::enrollments::get_enrollment,
        handlers::enrollments::create_enrollment, handlers::enrollments::update_enrollment,
        handlers::enrollments::delete_enrollment,
        handlers::assistances::list_assistances, handlers::assistances::get_assistance,
        handlers::assistances::create_assistance, handlers::assistances::update_assistance,
        handlers::assistances::delete_assistance,
        handlers::documents::list_documents, handlers::documents::get_document,
        handlers::documents::create_document, handlers::documents::update_document,
        handlers::documents::delete_document, handlers::documents::get_avatar,
        handlers::documents::create_avatar,
        handlers::lookups::list_courses, handlers::lookups::list_assistance_types,
        handlers::auth_proxy::proxy_auth,
    ),
    components(
        schemas(
            models::Role, models::EducationLevel, models::KinshipDegree, models::DocumentType,
            models::Organization, models::OrganizationSummary, models::Membership,
            models::Person, models::Address, models::Relative, models::Enrollment,
            models::Assistance, models::Document, models::Course, models::AssistanceType,
            models::InviteAuthor, models::OrganizationInvite, models::InviteOrganization,
            models::PendingInvite,
            models::CreateOrganizationRequest, models::CreateInviteRequest,
            models::CreatePersonRequest, models::UpdatePersonRequest,
            models::CreateAddressRequest, models::UpdateAddressRequest,
            models::CreateRelativeRequest, models::UpdateRelativeRequest,
            models::CreateEnrollmentRequest, models::UpdateEnrollmentRequest,
            models::CreateAssistanceRequest, models::UpdateAssistanceRequest,
            models::CreateDocumentRequest, models::CreateAvatarRequest,
            models::UpdateDocumentRequest,
            models::CreatedResponse, models::CreateOrganizationResponse,
            models::CreateInviteResponse, models::OrganizationsResponse,
            models::OrganizationResponse, models::MembershipResponse, models::InvitesResponse,
            models::PendingInvitesResponse, models::PersonsResponse, models::PersonResponse,
            models::AddressResponse, models::RelativesResponse, models::RelativeResponse,
            models::EnrollmentsResponse, models::EnrollmentResponse,
            models::AssistancesResponse, models::AssistanceResponse,
            models::DocumentsResponse, models::DocumentResponse, models::AvatarResponse,
            models::CoursesResponse, models::AssistanceTypesResponse,
            error::FieldError, error::ErrorResponse, error::ValidationErrorResponse,
            handlers::auth_proxy::AuthFailureResponse,
        )
    ),
    tags(
        (name = "case-portal", description = "Social assistance case management API")
    )
)]
pub struct ApiDoc;

/// AppState
///
/// The single container shared by every request. Handlers pull the pieces they need
/// through `FromRef`.
#[derive(Clone)]
pub struct AppState {
    /// Repository Layer: all persistence, tenant-scoped by the caller's organization.
    pub repo: RepositoryState,
    /// Resolves the caller's identity from cookies or a Bearer token.
    pub sessions: SessionState,
    /// Configuration: the loaded, immutable environment configuration.
    pub config: AppConfig,
    /// Shared HTTP client for the auth proxy.
    pub http: reqwest::Client,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for SessionState {
    fn from_ref(app_state: &AppState) -> SessionState {
        app_state.sessions.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

impl FromRef<AppState> for reqwest::Client {
    fn from_ref(app_state: &AppState) -> reqwest::Client {
        app_state.http.clone()
    }
}

/// auth_middleware
///
/// Guards every non-public route. The `AuthUser` extractor rejects unauthenticated
/// requests with 401 before the handler runs. On success the identity is stored in
/// the request extensions so handler-level extractors (`AuthUser`, `OrgMember`) reuse
/// it instead of asking the session provider a second time.
async fn auth_middleware(auth_user: AuthUser, mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(auth_user);
    next.run(request).await
}

/// cors_layer
///
/// Allows exactly the configured web client origin, with credentials.
fn cors_layer(client_origin: &str) -> CorsLayer {
    let allowed = client_origin.trim_end_matches('/').to_string();
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _request_parts| origin.as_bytes() == allowed.as_bytes(),
        ))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-requested-with"),
        ])
        .allow_credentials(true)
        .max_age(Duration::from_secs(86_400))
}

/// create_router
///
/// Assembles the routing structure, applies global and scoped middleware, and
/// registers the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = cors_layer(&state.config.client_origin);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: Serve the auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public Routes: No middleware applied.
        .merge(public::public_routes())
        // Authenticated and organization routes share the session layer. Organization
        // handlers add the membership check through the `OrgMember` extractor.
        .merge(
            authenticated::authenticated_routes()
                .merge(organization::organization_routes())
                .route_layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        )
        // Apply the Unified State to all routes.
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID Generation: a UUID for every incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request Tracing: one span per request, carrying the request ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID Propagation: echo x-request-id back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Builds the `http_request` span for `TraceLayer` with method, URI and the
/// `x-request-id` set by `SetRequestIdLayer`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
