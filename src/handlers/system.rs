use axum::{extract::State, http::StatusCode};
use chrono::Utc;

use super::required_text;
use crate::{
    AppState,
    config::Env,
    db::with_timeout,
    error::ApiError,
    extract::Json,
    models::{
        ApiStatus, DbStatus, EnvironmentInfo, HealthResponse, MessageResponse, PromotedUser,
        SetAdminRequest, WarmupResponse,
    },
    repository::REQUIRED_TABLES,
};

/// health
///
/// [Public Route] Liveness probe. Never touches the database.
#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "Alive", body = HealthResponse))
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        t: Utc::now().timestamp_millis(),
    })
}

/// warmup
///
/// [Public Route] Hit by schedulers to keep the instance warm.
#[utoipa::path(
    get,
    path = "/api/warmup",
    responses((status = 200, description = "Warm", body = WarmupResponse))
)]
pub async fn warmup() -> Json<WarmupResponse> {
    Json(WarmupResponse {
        status: "ok".to_string(),
        timestamp: Utc::now(),
    })
}

#[utoipa::path(
    get,
    path = "/api",
    responses((status = 200, description = "Service status", body = ApiStatus))
)]
pub async fn api_status(State(state): State<AppState>) -> Json<ApiStatus> {
    Json(ApiStatus {
        message: "Inkpost API is running".to_string(),
        timestamp: Utc::now(),
        environment: EnvironmentInfo {
            env: state.config.env.as_str().to_string(),
            has_jwt_secret: state.config.has_jwt_secret(),
        },
    })
}

/// db_status
///
/// [Public Route] Connectivity and schema check: 200 when every required
/// table exists, 400 listing the missing ones, 504 when the database is slow.
#[utoipa::path(
    get,
    path = "/api/db-status",
    responses(
        (status = 200, description = "Schema complete", body = DbStatus),
        (status = 400, description = "Tables missing", body = DbStatus),
        (status = 504, description = "Database timeout", body = MessageResponse)
    )
)]
pub async fn db_status(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<DbStatus>), ApiError> {
    let tables = with_timeout(state.config.db_timeout(), state.repo.existing_tables()).await?;

    let missing_tables: Vec<String> = REQUIRED_TABLES
        .iter()
        .filter(|required| !tables.iter().any(|t| t.as_str() == **required))
        .map(|t| t.to_string())
        .collect();

    if missing_tables.is_empty() {
        Ok((
            StatusCode::OK,
            Json(DbStatus {
                message: "database is ready".to_string(),
                tables,
                missing_tables,
            }),
        ))
    } else {
        tracing::warn!(?missing_tables, "database schema is incomplete");
        Ok((
            StatusCode::BAD_REQUEST,
            Json(DbStatus {
                message: "database schema is incomplete; run the migrations".to_string(),
                tables,
                missing_tables,
            }),
        ))
    }
}

/// set_admin
///
/// [Local Only] Promotes a user by name. Answers 404 outside `Env::Local`.
#[utoipa::path(
    post,
    path = "/api/dev/set-admin",
    request_body = SetAdminRequest,
    responses(
        (status = 200, description = "Promoted", body = PromotedUser),
        (status = 404, description = "Unknown user, or not a local build", body = MessageResponse)
    )
)]
pub async fn set_admin(
    State(state): State<AppState>,
    Json(payload): Json<SetAdminRequest>,
) -> Result<Json<PromotedUser>, ApiError> {
    if state.config.env != Env::Local {
        return Err(ApiError::not_found("not found"));
    }

    let name = required_text(&payload.name, "name")?;
    let user = state
        .repo
        .promote_to_admin(&name)
        .await
        .map_err(ApiError::missing("user"))?;

    tracing::warn!(user_id = %user.id, "user promoted to admin via dev endpoint");
    Ok(Json(PromotedUser {
        message: format!("{} is now an admin", user.name),
        user,
    }))
}
