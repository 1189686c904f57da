use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use std::path::Path;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Persistence: table descriptions, audited repository, audit writer.
pub mod audit;
pub mod models;
pub mod repository;
pub mod resource;

// Request handling.
pub mod auth;
pub mod errors;
pub mod gateway;
pub mod handlers;
pub mod permissions;
pub mod validation;

pub mod config;

// Module for routing segregation (Public, Authenticated).
pub mod routes;
use auth::AuthUser;
use routes::{authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use errors::{AppError, RepoError};
pub use repository::{PostgresRepository, RepositoryState};

/// ApiDoc
///
/// Auto-generated OpenAPI document, served at `/api-docs/openapi.json`.
/// The per-table CRUD routes are generic and therefore undocumented as paths;
/// their row and request schemas are listed under components.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::approve_company, handlers::unlock_merchant_user,
        handlers::role_capability_tree, handlers::get_me,
        handlers::list_audit_logs, handlers::dashboard_stats
    ),
    components(
        schemas(
            models::AuditStamp, models::Merchant, models::CreateMerchantRequest,
            models::UpdateMerchantRequest, models::Branch, models::CreateBranchRequest,
            models::UpdateBranchRequest, models::AllowedCompany, models::CreateCompanyRequest,
            models::UpdateCompanyRequest, models::ApprovalRequest, models::SystemUser,
            models::CreateSystemUserRequest, models::UpdateSystemUserRequest, models::Role,
            models::CreateRoleRequest, models::UpdateRoleRequest, models::RoleCapability,
            models::CreateRoleCapabilityRequest, models::UpdateRoleCapabilityRequest,
            models::CapabilityNode, models::ArifpayEndpoint, models::CreateArifpayEndpointRequest,
            models::UpdateArifpayEndpointRequest, models::MerchantUser,
            models::CreateMerchantUserRequest, models::UpdateMerchantUserRequest,
            models::StreamPaySetting, models::CreateStreamPaySettingRequest,
            models::UpdateStreamPaySettingRequest, models::UssdPushSetting,
            models::CreateUssdPushSettingRequest, models::UpdateUssdPushSettingRequest,
            models::AuditLog, models::DashboardStats,
        )
    ),
    tags(
        (name = "backoffice", description = "Payment operator back-office API")
    )
)]
pub struct ApiDoc;

/// AppState
///
/// The single, thread-safe and immutable container shared by every request.
#[derive(Clone)]
pub struct AppState {
    /// Repository Layer: abstracts database access via the PgPool connection.
    pub repo: RepositoryState,
    /// Configuration: the loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Enforces authentication for the authenticated routes. `AuthUser` rejects with
/// 401 before the handler runs when no system user can be resolved.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the routing structure, applies global and scoped middleware, and
/// registers the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let mut base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .nest(
            "/api",
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        );

    // Everything else is the dashboard UI bundle, when one is deployed alongside.
    // Unknown paths fall back to index.html so client-side routes resolve.
    if let Some(dir) = &state.config.static_dir {
        let index = Path::new(dir).join("index.html");
        let ui = ServeDir::new(dir).not_found_service(ServeFile::new(index));
        base_router = base_router.fallback_service(ui);
    }

    // 3. Page Gateway: anonymous browser navigations to protected pages go to the login page.
    let base_router = base_router
        .layer(middleware::from_fn_with_state(state.clone(), gateway::page_guard))
        .with_state(state);

    // 4. Observability and Correlation Layers (Applied outermost/first)
    base_router
        .layer(
            ServiceBuilder::new()
                // 4a. Request ID Generation: a UUID per incoming request, also stored on audit rows.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 4b. Request Tracing: one span per request carrying the request id.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 4c. Request ID Propagation: echo x-request-id back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 5. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Customizes the span created by `TraceLayer` so every log line of a request is
/// correlated by its `x-request-id`.
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
