use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
    routing::get,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod ordering;
pub mod repository;
pub mod validation;

// Routers grouped by required credential (public, catalog, authenticated).
pub mod routes;
use auth::AuthUser;
use routes::{authenticated, catalog, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::AppError;
pub use ordering::ReorderPolicy;
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};

/// ApiDoc
///
/// OpenAPI document assembled from the `#[utoipa::path]` handlers and the
/// `ToSchema` models. Served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::categories::create_category, handlers::categories::list_categories,
        handlers::categories::update_category, handlers::categories::delete_category,
        handlers::menus::create_menu, handlers::menus::list_menus, handlers::menus::get_menu,
        handlers::menus::update_menu, handlers::menus::delete_menu,
        handlers::users::sign_up, handlers::users::sign_in, handlers::users::sign_out,
        handlers::users::get_me
    ),
    components(
        schemas(
            models::Role, models::MenuStatus, models::CreateCategoryRequest,
            models::UpdateCategoryRequest, models::CreateMenuRequest, models::UpdateMenuRequest,
            models::SignUpRequest, models::SignInRequest, models::CategorySummary,
            models::MenuSummary, models::MenuDetail, models::UserProfile,
            models::MessageResponse, models::ErrorResponse,
        )
    ),
    tags(
        (name = "restaurant-catalog", description = "Restaurant categories, menus and accounts")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Persistence gateway (Postgres or in-memory).
    pub repo: RepositoryState,
    pub config: AppConfig,
}

impl AppState {
    /// State backed by an empty in-memory store. Used by tests and by
    /// `STORAGE_BACKEND=memory`.
    pub fn in_memory(config: AppConfig) -> Self {
        Self {
            repo: std::sync::Arc::new(InMemoryRepository::new()),
            config,
        }
    }
}

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
/// Rejects the request unless the `AuthUser` extractor succeeds (401 with the
/// cookie cleared). The resolved user is stored in the request extensions for
/// the handlers behind it.
async fn auth_middleware(auth_user: AuthUser, mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(auth_user);
    next.run(request).await
}

/// create_router
///
/// Assembles the routers under `/api`, the documentation and the
/// observability layers, and binds the application state.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let api = Router::new()
        .merge(public::public_routes())
        .merge(catalog::catalog_routes())
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        );

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(|| async { "Welcome" }))
        // Liveness check for load balancers.
        .route("/health", get(|| async { "ok" }))
        .nest("/api", api)
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for each request carrying method, URI and the `x-request-id`, so all
/// log lines of one request can be correlated.
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
