use std::{future::Future, time::Duration};

use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{config::AppConfig, repository::RepoError};

/// connect
///
/// Opens the pool and applies pending migrations from `./migrations`. Shared by
/// the server and the maintenance binaries.
pub async fn connect(config: &AppConfig) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_millis(config.db_timeout_ms.max(1000)))
        .connect(&config.db_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied.");
    Ok(pool)
}

/// with_timeout
///
/// Bounds a repository call. A slow database (typically a cold connection) turns
/// into `RepoError::Timeout` instead of holding the request open.
pub async fn with_timeout<T, F>(budget: Duration, query: F) -> Result<T, RepoError>
where
    F: Future<Output = Result<T, RepoError>>,
{
    match tokio::time::timeout(budget, query).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(budget_ms = budget.as_millis() as u64, "database read timed out");
            Err(RepoError::Timeout)
        }
    }
}

/// or_default
///
/// Substitutes `T::default()` for a failed read. Used by public listing
/// endpoints that should degrade to an empty page rather than fail.
pub fn or_default<T: Default>(label: &str, result: Result<T, RepoError>) -> T {
    result.unwrap_or_else(|e| {
        tracing::warn!(query = label, error = %e, "falling back to default value");
        T::default()
    })
}
