use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Routes for any signed-in user. The `auth_middleware` route layer applied in
/// `create_router` rejects anonymous requests with 401 before these run.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /auth/me
        // The caller's stored profile (role as currently persisted).
        .route("/auth/me", get(handlers::auth::me))
        // POST /comments
        // Comment or reply on a post. Replies to replies are re-parented to the root.
        .route("/comments", post(handlers::comments::create_comment))
}
