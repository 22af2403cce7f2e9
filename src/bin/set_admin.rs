use inkpost::{
    config::AppConfig,
    db,
    repository::{PostgresRepository, RepoError, Repository},
};

/// main
///
/// Promotes an existing account to admin: `set_admin <name>`, or
/// `ADMIN_USERNAME=<name> set_admin`. The new role applies from the next login.
#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inkpost=info".into()),
        )
        .init();

    let Some(name) = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("ADMIN_USERNAME").ok())
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
    else {
        eprintln!("usage: set_admin <name>  (or set ADMIN_USERNAME)");
        std::process::exit(2);
    };

    let pool = db::connect(&config)
        .await
        .expect("FATAL: Failed to connect to Postgres or migrate. Check DATABASE_URL.");
    let repo = PostgresRepository::new(pool);

    match repo.promote_to_admin(&name).await {
        Ok(user) => tracing::info!(name = %user.name, "user promoted to admin"),
        Err(RepoError::NotFound) => {
            tracing::error!(name = %name, "no such user; register the account first");
            std::process::exit(1);
        }
        Err(e) => {
            tracing::error!("promotion failed: {e}");
            std::process::exit(1);
        }
    }
}
