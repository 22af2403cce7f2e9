use axum::{
    body::Body,
    extract::FromRequestParts,
    http::{Request, StatusCode, header, request::Parts},
    response::IntoResponse,
};
use inkpost::{
    AppState, MemoryRepository,
    auth::{AuthUser, issue_token},
    config::{AppConfig, Env},
    error::ApiError,
    models::User,
    repository::{ROLE_ADMIN, ROLE_USER, Repository, RepositoryState},
};
use std::sync::Arc;
use uuid::Uuid;

// --- Helpers ---

struct Ctx {
    state: AppState,
    repo: Arc<MemoryRepository>,
}

fn ctx(env: Env) -> Ctx {
    let repo = Arc::new(MemoryRepository::new());
    let config = AppConfig {
        env,
        jwt_secret: "auth-test-secret".to_string(),
        ..AppConfig::default()
    };
    let state = AppState {
        repo: repo.clone() as RepositoryState,
        config,
    };
    Ctx { state, repo }
}

fn parts(headers: &[(header::HeaderName, String)]) -> Parts {
    let mut builder = Request::builder().uri("/api/auth/me");
    for (name, value) in headers {
        builder = builder.header(name, value);
    }
    builder.body(Body::empty()).unwrap().into_parts().0
}

async fn extract(state: &AppState, headers: &[(header::HeaderName, String)]) -> Result<AuthUser, ApiError> {
    let mut parts = parts(headers);
    AuthUser::from_request_parts(&mut parts, state).await
}

fn bearer(user: &User, secret: &str) -> (header::HeaderName, String) {
    let token = issue_token(user, secret, chrono::Duration::hours(1)).unwrap();
    (header::AUTHORIZATION, format!("Bearer {token}"))
}

// --- Tests ---

#[tokio::test]
async fn test_valid_bearer_token_resolves_user() {
    let ctx = ctx(Env::Production);
    let user = ctx.repo.create_user("reader", "hash", ROLE_USER).await.unwrap();

    let auth = extract(&ctx.state, &[bearer(&user, "auth-test-secret")])
        .await
        .unwrap();

    assert_eq!(auth.id, user.id);
    assert_eq!(auth.name, "reader");
    assert!(!auth.is_admin());
}

#[tokio::test]
async fn test_token_cookie_is_accepted() {
    let ctx = ctx(Env::Production);
    let user = ctx.repo.create_user("cookie_fan", "hash", ROLE_USER).await.unwrap();
    let token = issue_token(&user, "auth-test-secret", chrono::Duration::hours(1)).unwrap();

    let auth = extract(&ctx.state, &[(header::COOKIE, format!("token={token}"))])
        .await
        .unwrap();
    assert_eq!(auth.id, user.id);
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let ctx = ctx(Env::Production);
    let err = extract(&ctx.state, &[]).await.unwrap_err();
    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_rejected() {
    let ctx = ctx(Env::Production);
    let user = ctx.repo.create_user("mallory", "hash", ROLE_ADMIN).await.unwrap();

    let err = extract(&ctx.state, &[bearer(&user, "forged-secret")])
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(_)));
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let ctx = ctx(Env::Production);
    let user = ctx.repo.create_user("sleepy", "hash", ROLE_USER).await.unwrap();
    let token = issue_token(&user, "auth-test-secret", chrono::Duration::hours(-3)).unwrap();

    let err = extract(
        &ctx.state,
        &[(header::AUTHORIZATION, format!("Bearer {token}"))],
    )
    .await
    .unwrap_err();
    assert_eq!(err, ApiError::Unauthorized("token expired".to_string()));
}

#[tokio::test]
async fn test_deleted_user_loses_access() {
    let ctx = ctx(Env::Production);
    let user = ctx.repo.create_user("ghost", "hash", ROLE_USER).await.unwrap();
    let header = bearer(&user, "auth-test-secret");
    ctx.repo.delete_user(user.id).await.unwrap();

    let err = extract(&ctx.state, &[header]).await.unwrap_err();
    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_role_comes_from_token_claim() {
    let ctx = ctx(Env::Production);
    let user = ctx.repo.create_user("promoted", "hash", ROLE_USER).await.unwrap();
    let header = bearer(&user, "auth-test-secret");

    // Promotion after issuance is only visible with a fresh token.
    ctx.repo.update_user_role(user.id, ROLE_ADMIN).await.unwrap();
    let auth = extract(&ctx.state, &[header]).await.unwrap();
    assert_eq!(auth.role, ROLE_USER);
}

#[tokio::test]
async fn test_local_bypass_uses_stored_role() {
    let ctx = ctx(Env::Local);
    let admin = ctx.repo.create_user("local_admin", "hash", ROLE_ADMIN).await.unwrap();

    let auth = extract(
        &ctx.state,
        &[(header::HeaderName::from_static("x-user-id"), admin.id.to_string())],
    )
    .await
    .unwrap();
    assert!(auth.is_admin());
}

#[tokio::test]
async fn test_bypass_is_ignored_in_production() {
    let ctx = ctx(Env::Production);
    let admin = ctx.repo.create_user("prod_admin", "hash", ROLE_ADMIN).await.unwrap();

    let err = extract(
        &ctx.state,
        &[(header::HeaderName::from_static("x-user-id"), admin.id.to_string())],
    )
    .await
    .unwrap_err();
    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_bypass_with_unknown_id_falls_through_to_token() {
    let ctx = ctx(Env::Local);
    let err = extract(
        &ctx.state,
        &[(header::HeaderName::from_static("x-user-id"), Uuid::new_v4().to_string())],
    )
    .await
    .unwrap_err();
    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
}
