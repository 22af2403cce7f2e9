use axum::extract::State;

use crate::{
    AppState,
    auth::{AuthUser, hash_password, issue_token, validate_name, validate_password, verify_password},
    error::ApiError,
    extract::Json,
    models::{AuthResponse, Credentials, MeResponse, MessageResponse, User},
    repository::ROLE_USER,
};

const BAD_CREDENTIALS: &str = "invalid name or password";

/// register
///
/// [Public Route] Creates a `user`-role account and signs the caller in.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = Credentials,
    responses(
        (status = 200, description = "Registered", body = AuthResponse),
        (status = 400, description = "Invalid name or password", body = MessageResponse),
        (status = 409, description = "Name taken", body = MessageResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<Credentials>,
) -> Result<Json<AuthResponse>, ApiError> {
    let name = validate_name(&payload.name)?;
    validate_password(&payload.password)?;

    // Concurrent duplicates still hit the unique index and map to 409.
    if state.repo.find_credentials(&name).await?.is_some() {
        return Err(ApiError::Conflict("this name is already taken".to_string()));
    }

    let password_hash = hash_password(payload.password, state.config.bcrypt_cost).await?;
    let user = state.repo.create_user(&name, &password_hash, ROLE_USER).await?;
    tracing::info!(user_id = %user.id, "user registered");

    let token = issue_token(&user, &state.config.jwt_secret, state.config.token_ttl())?;
    Ok(Json(AuthResponse { user, token }))
}

/// login
///
/// [Public Route] Exchanges name and password for a token. Unknown names and
/// wrong passwords produce the same 401.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = Credentials,
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 401, description = "Bad credentials", body = MessageResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<Credentials>,
) -> Result<Json<AuthResponse>, ApiError> {
    let name = validate_name(&payload.name)?;
    validate_password(&payload.password)?;

    let record = state
        .repo
        .find_credentials(&name)
        .await?
        .ok_or_else(|| ApiError::Unauthorized(BAD_CREDENTIALS.to_string()))?;

    if !verify_password(payload.password, record.password_hash.clone()).await? {
        tracing::info!(user_id = %record.id, "rejected login attempt");
        return Err(ApiError::Unauthorized(BAD_CREDENTIALS.to_string()));
    }

    let user = User::from(record);
    let token = issue_token(&user, &state.config.jwt_secret, state.config.token_ttl())?;
    Ok(Json(AuthResponse { user, token }))
}

/// me
///
/// [Authenticated Route] Returns the caller's current stored profile.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = MeResponse),
        (status = 401, description = "Not signed in", body = MessageResponse)
    )
)]
pub async fn me(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<MeResponse>, ApiError> {
    let user = state
        .repo
        .get_user(id)
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;
    Ok(Json(MeResponse { user }))
}
