use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Unauthenticated endpoints. Blog reads only ever return published posts;
/// that filter lives in the repository queries.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // --- Service & Diagnostics ---
        .route("/", get(handlers::system::api_status))
        .route("/health", get(handlers::system::health))
        .route("/warmup", get(handlers::system::warmup))
        .route("/db-status", get(handlers::system::db_status))
        // POST /dev/set-admin
        // Local-only promotion helper; the handler answers 404 in production.
        .route("/dev/set-admin", post(handlers::system::set_admin))
        // --- Auth ---
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        // --- Blog ---
        // GET /blog/posts?page=&limit=&tag=&category=
        .route("/blog/posts", get(handlers::blog::list_posts))
        .route("/blog/posts/{slug}", get(handlers::blog::get_post))
        .route("/blog/categories", get(handlers::blog::list_categories))
        .route("/blog/tags", get(handlers::blog::list_tags))
        .route("/blog/config", get(handlers::blog::get_config))
        // GET /comments?postId=
        .route("/comments", get(handlers::comments::list_comments))
}
