use inkpost::{
    config::{AppConfig, Env},
    db,
    repository::PostgresRepository,
    seed::{self, SeedAccount},
};
use std::env;

/// Reads an account from `<PREFIX>_NAME` / `<PREFIX>_PASSWORD`. Production
/// refuses the built-in password.
fn account(config: &AppConfig, prefix: &str, name: &str, password: &str) -> SeedAccount {
    let name = env::var(format!("{prefix}_NAME")).unwrap_or_else(|_| name.to_string());
    let password = match (env::var(format!("{prefix}_PASSWORD")), &config.env) {
        (Ok(password), _) => password,
        (Err(_), Env::Local) => password.to_string(),
        (Err(_), Env::Production) => {
            panic!("FATAL: {prefix}_PASSWORD must be set when seeding a production database.")
        }
    };
    SeedAccount { name, password }
}

/// main
///
/// Fills a database with the site owner, a reader, starter categories/tags and
/// sample posts. Safe to run repeatedly.
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

    let admin = account(&config, "SEED_ADMIN", "admin", "admin123");
    let reader = account(&config, "SEED_READER", "reader", "reader123");

    let pool = db::connect(&config)
        .await
        .expect("FATAL: Failed to connect to Postgres or migrate. Check DATABASE_URL.");
    let repo = PostgresRepository::new(pool);

    match seed::run(&repo, &admin, &reader, config.bcrypt_cost).await {
        Ok(report) => tracing::info!(
            users = report.users,
            categories = report.categories,
            tags = report.tags,
            posts = report.posts,
            comments = report.comments,
            "seed finished"
        ),
        Err(e) => {
            tracing::error!("seeding failed: {e}");
            std::process::exit(1);
        }
    }
}
