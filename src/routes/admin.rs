use crate::{AppState, handlers::admin};
use axum::{
    Router,
    routing::{get, put},
};

/// Admin Router Module
///
/// Content and user management, mounted at `/api/admin`. The whole router sits
/// behind `admin_middleware`: 401 without a token, 403 for non-admin roles.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // --- Posts ---
        // Drafts included; creation stamps the calling admin as author.
        .route("/posts", get(admin::list_posts).post(admin::create_post))
        .route(
            "/posts/{id}",
            put(admin::update_post).delete(admin::delete_post),
        )
        // --- Taxonomy ---
        .route(
            "/categories",
            get(admin::list_categories).post(admin::create_category),
        )
        .route(
            "/categories/{id}",
            put(admin::update_category).delete(admin::delete_category),
        )
        .route("/tags", get(admin::list_tags).post(admin::create_tag))
        .route(
            "/tags/{id}",
            put(admin::update_tag).delete(admin::delete_tag),
        )
        // --- Moderation ---
        .route("/comments", get(admin::list_comments))
        .route(
            "/comments/{id}",
            axum::routing::delete(admin::delete_comment),
        )
        // --- Users ---
        // Role changes and deletions enforce the last-admin rule.
        .route("/users", get(admin::list_users))
        .route(
            "/users/{id}",
            put(admin::update_user_role).delete(admin::delete_user),
        )
}
