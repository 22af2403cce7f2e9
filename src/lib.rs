use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
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
pub mod db;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod seed;
pub mod slug;

// Routers segregated by access level (public, authenticated, admin).
pub mod routes;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::ApiError;
pub use repository::{MemoryRepository, PostgresRepository, RepositoryState};

/// ApiDoc
///
/// OpenAPI document generated from the `#[utoipa::path]` annotations. Served at
/// `/api-docs/openapi.json` and browsable under `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::system::api_status, handlers::system::health, handlers::system::warmup,
        handlers::system::db_status, handlers::system::set_admin,
        handlers::auth::register, handlers::auth::login, handlers::auth::me,
        handlers::blog::list_posts, handlers::blog::get_post, handlers::blog::list_categories,
        handlers::blog::list_tags, handlers::blog::get_config,
        handlers::comments::list_comments, handlers::comments::create_comment,
        handlers::admin::list_posts, handlers::admin::create_post, handlers::admin::update_post,
        handlers::admin::delete_post, handlers::admin::list_categories,
        handlers::admin::create_category, handlers::admin::update_category,
        handlers::admin::delete_category, handlers::admin::list_tags, handlers::admin::create_tag,
        handlers::admin::update_tag, handlers::admin::delete_tag, handlers::admin::list_comments,
        handlers::admin::delete_comment, handlers::admin::list_users,
        handlers::admin::update_user_role, handlers::admin::delete_user
    ),
    components(
        schemas(
            models::User, models::AuthorSummary, models::TermRef, models::PostView,
            models::PostPage, models::Category, models::Tag, models::ReplyView,
            models::CommentThread, models::PostRef, models::ModerationComment,
            models::UserSummary, models::Credentials, models::CreatePostRequest,
            models::UpdatePostRequest, models::CategoryRequest, models::TagRequest,
            models::CreateCommentRequest, models::UpdateRoleRequest, models::SetAdminRequest,
            models::AuthResponse, models::MeResponse, models::MessageResponse,
            models::PromotedUser, models::BlogAuthor, models::BlogConfig,
            models::HealthResponse, models::WarmupResponse, models::EnvironmentInfo,
            models::ApiStatus, models::DbStatus,
        )
    ),
    tags(
        (name = "inkpost", description = "Inkpost blog API")
    )
)]
pub struct ApiDoc;

/// AppState
///
/// Shared, cheaply clonable state handed to every handler and extractor.
#[derive(Clone)]
pub struct AppState {
    /// Persistence layer (Postgres in production, in-memory in tests).
    pub repo: RepositoryState,
    /// The loaded, immutable configuration.
    pub config: AppConfig,
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

/// create_router
///
/// Assembles the routing tree under `/api`, applies the access guards as route
/// layers and wraps everything in the request-id/tracing/CORS stack.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let api = Router::new()
        .merge(public::public_routes())
        // Any signed-in user.
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth::auth_middleware,
            )),
        )
        // Admins only: 401 without a token, 403 for other roles.
        .nest(
            "/admin",
            admin::admin_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth::admin_middleware,
            )),
        );

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
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
/// Opens the `http_request` span with method, URI and the generated request id
/// so every log line of one request can be correlated.
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
