use inkpost::{
    models::User,
    repository::{
        NewComment, NewPost, PostChanges, PostgresRepository, PublishedPostQuery, ROLE_ADMIN,
        ROLE_USER, RepoError, Repository, TermDraft,
    },
};
use sqlx::{
    PgPool,
    postgres::{PgConnectOptions, PgPoolOptions},
};
use tokio::test;
use uuid::Uuid;

// These run against a real database: `DATABASE_URL=... cargo test -- --ignored`.

// --- Test Context and Setup ---

struct DbTestContext {
    pool: PgPool,
    schema: Option<String>,
}

fn database_url() -> String {
    dotenv::dotenv().ok();
    std::env::var("DATABASE_URL").expect("DATABASE_URL must be set to run integration tests")
}

impl DbTestContext {
    async fn setup() -> Self {
        let db_url = database_url();

        let pool = PgPool::connect(&db_url)
            .await
            .expect("Failed to connect to database for integration tests.");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run database migrations.");

        DbTestContext { pool, schema: None }
    }

    /// A context with its own schema, so its user table holds only what the
    /// test inserts. Needed wherever the admin count matters.
    async fn isolated() -> Self {
        let db_url = database_url();
        let schema = format!("inkpost_test_{}", Uuid::new_v4().simple());

        let bootstrap = PgPool::connect(&db_url)
            .await
            .expect("Failed to connect to database for integration tests.");
        sqlx::query(&format!("CREATE SCHEMA {schema}"))
            .execute(&bootstrap)
            .await
            .expect("Failed to create test schema.");
        bootstrap.close().await;

        let options: PgConnectOptions = db_url.parse().expect("DATABASE_URL is not a valid URL");
        let pool = PgPoolOptions::new()
            .max_connections(4)
            .connect_with(options.options([("search_path", schema.as_str())]))
            .await
            .expect("Failed to connect to the test schema.");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run database migrations.");

        DbTestContext {
            pool,
            schema: Some(schema),
        }
    }

    async fn teardown(self) {
        if let Some(schema) = self.schema {
            sqlx::query(&format!("DROP SCHEMA {schema} CASCADE"))
                .execute(&self.pool)
                .await
                .expect("Failed to drop test schema.");
        }
        self.pool.close().await;
    }

    fn repository(&self) -> PostgresRepository {
        PostgresRepository::new(self.pool.clone())
    }
}

// --- Test Data Helpers ---

/// A name unique to this run so tests can share one database.
fn unique(prefix: &str) -> String {
    format!("{prefix}_{}", &Uuid::new_v4().simple().to_string()[..8])
}

async fn create_test_user(repo: &PostgresRepository, role: &str) -> User {
    repo.create_user(&unique("u"), "hash", role)
        .await
        .expect("Failed to create test user")
}

fn draft(name: &str) -> TermDraft {
    TermDraft {
        name: name.to_string(),
        slug: name.to_lowercase().replace('_', "-"),
        description: None,
    }
}

fn new_post(title: &str, published: bool) -> NewPost {
    NewPost {
        title: title.to_string(),
        slug: title.to_lowercase().replace('_', "-"),
        content: "body".to_string(),
        published,
        ..Default::default()
    }
}

// --- Tests ---

#[test]
#[ignore = "requires a running Postgres at DATABASE_URL"]
async fn test_schema_tables_exist() {
    let ctx = DbTestContext::setup().await;
    let tables = ctx.repository().existing_tables().await.unwrap();
    for required in inkpost::repository::REQUIRED_TABLES {
        assert!(tables.iter().any(|t| t == required), "{required} missing");
    }
}

#[test]
#[ignore = "requires a running Postgres at DATABASE_URL"]
async fn test_user_name_is_unique() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let user = create_test_user(&repo, ROLE_USER).await;

    let err = repo.create_user(&user.name, "hash", ROLE_USER).await.unwrap_err();
    assert!(matches!(err, RepoError::Conflict(_)));

    let creds = repo.find_credentials(&user.name).await.unwrap().unwrap();
    assert_eq!(creds.password_hash, "hash");
}

#[test]
#[ignore = "requires a running Postgres at DATABASE_URL"]
async fn test_post_lifecycle_with_terms() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let author = create_test_user(&repo, ROLE_ADMIN).await;
    let tag = repo.create_tag(draft(&unique("tag"))).await.unwrap();
    let category = repo.create_category(draft(&unique("cat"))).await.unwrap();

    let title = unique("post");
    let post = repo
        .create_post(
            author.id,
            NewPost {
                tag_ids: vec![tag.id, tag.id],
                category_ids: vec![category.id],
                ..new_post(&title, false)
            },
        )
        .await
        .unwrap();
    assert_eq!(post.author.name, author.name);
    assert_eq!(post.tags.len(), 1);
    assert!(repo.get_published_post(&post.slug).await.unwrap().is_none());

    let updated = repo
        .update_post(
            post.id,
            PostChanges {
                published: Some(true),
                tag_ids: Some(vec![]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(updated.published);
    assert!(updated.tags.is_empty());
    assert_eq!(updated.categories[0].id, category.id);
    assert!(updated.updated_at >= post.updated_at);

    let page = repo
        .list_published_posts(PublishedPostQuery {
            category: Some(category.slug.clone()),
            limit: 10,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.1, 1);
    assert_eq!(page.0[0].id, post.id);

    repo.delete_post(post.id).await.unwrap();
    assert!(matches!(repo.delete_post(post.id).await, Err(RepoError::NotFound)));
}

#[test]
#[ignore = "requires a running Postgres at DATABASE_URL"]
async fn test_unknown_term_ids_are_rejected() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let author = create_test_user(&repo, ROLE_ADMIN).await;

    let err = repo
        .create_post(
            author.id,
            NewPost {
                tag_ids: vec![Uuid::new_v4()],
                ..new_post(&unique("orphan"), true)
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::InvalidReference(_)));
}

#[test]
#[ignore = "requires a running Postgres at DATABASE_URL"]
async fn test_comment_cascade_and_threads() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let author = create_test_user(&repo, ROLE_ADMIN).await;
    let post = repo.create_post(author.id, new_post(&unique("talk"), true)).await.unwrap();

    let root = repo
        .create_comment(NewComment {
            post_id: post.id,
            author_id: author.id,
            parent_id: None,
            content: "root".to_string(),
        })
        .await
        .unwrap();
    repo.create_comment(NewComment {
        post_id: post.id,
        author_id: author.id,
        parent_id: Some(root.id),
        content: "reply".to_string(),
    })
    .await
    .unwrap();

    let threads = repo.list_comment_threads(post.id).await.unwrap();
    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0].replies.len(), 1);
    assert_eq!(threads[0].author.name, author.name);

    repo.delete_comment(root.id).await.unwrap();
    assert!(repo.list_comment_threads(post.id).await.unwrap().is_empty());
    repo.delete_post(post.id).await.unwrap();
}

#[test]
#[ignore = "requires a running Postgres at DATABASE_URL"]
async fn test_authors_cannot_be_deleted() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    // A spare admin keeps the last-admin rule out of the way.
    create_test_user(&repo, ROLE_ADMIN).await;
    let author = create_test_user(&repo, ROLE_ADMIN).await;
    let post = repo.create_post(author.id, new_post(&unique("kept"), true)).await.unwrap();

    let err = repo.delete_user(author.id).await.unwrap_err();
    assert!(matches!(err, RepoError::Conflict(_)));

    repo.delete_post(post.id).await.unwrap();
    repo.delete_user(author.id).await.unwrap();
    assert!(repo.get_user(author.id).await.unwrap().is_none());
}

#[test]
#[ignore = "requires a running Postgres at DATABASE_URL"]
async fn test_role_update_round_trip() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    create_test_user(&repo, ROLE_ADMIN).await;
    let user = create_test_user(&repo, ROLE_USER).await;

    let promoted = repo.promote_to_admin(&user.name).await.unwrap();
    assert_eq!(promoted.role, ROLE_ADMIN);

    let demoted = repo.update_user_role(user.id, ROLE_USER).await.unwrap();
    assert_eq!(demoted.role, ROLE_USER);

    assert!(matches!(
        repo.update_user_role(Uuid::new_v4(), ROLE_USER).await,
        Err(RepoError::NotFound)
    ));
}

#[test]
#[ignore = "requires a running Postgres at DATABASE_URL"]
async fn test_sole_admin_cannot_be_demoted_or_deleted() {
    let ctx = DbTestContext::isolated().await;
    let repo = ctx.repository();
    let admin = create_test_user(&repo, ROLE_ADMIN).await;
    create_test_user(&repo, ROLE_USER).await;

    assert!(matches!(
        repo.update_user_role(admin.id, ROLE_USER).await,
        Err(RepoError::LastAdmin)
    ));
    assert!(matches!(repo.delete_user(admin.id).await, Err(RepoError::LastAdmin)));

    // Re-asserting the admin role is not a demotion.
    let same = repo.update_user_role(admin.id, ROLE_ADMIN).await.unwrap();
    assert_eq!(same.role, ROLE_ADMIN);

    ctx.teardown().await;
}

#[test]
#[ignore = "requires a running Postgres at DATABASE_URL"]
async fn test_concurrent_demotions_keep_one_admin() {
    let ctx = DbTestContext::isolated().await;
    let repo = ctx.repository();
    let first = create_test_user(&repo, ROLE_ADMIN).await;
    let second = create_test_user(&repo, ROLE_ADMIN).await;

    let (a, b) = tokio::join!(
        repo.update_user_role(first.id, ROLE_USER),
        repo.update_user_role(second.id, ROLE_USER),
    );

    let outcomes = [a, b];
    let demoted = outcomes.iter().filter(|r| r.is_ok()).count();
    let refused = outcomes
        .iter()
        .filter(|r| matches!(r, Err(RepoError::LastAdmin)))
        .count();
    assert_eq!((demoted, refused), (1, 1));

    let admins: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'admin'")
        .fetch_one(&ctx.pool)
        .await
        .unwrap();
    assert_eq!(admins, 1);

    ctx.teardown().await;
}

#[test]
#[ignore = "requires a running Postgres at DATABASE_URL"]
async fn test_concurrent_admin_deletions_keep_one_admin() {
    let ctx = DbTestContext::isolated().await;
    let repo = ctx.repository();
    let first = create_test_user(&repo, ROLE_ADMIN).await;
    let second = create_test_user(&repo, ROLE_ADMIN).await;

    let (a, b) = tokio::join!(repo.delete_user(first.id), repo.delete_user(second.id));
    assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);

    let remaining = repo.list_users().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].role, ROLE_ADMIN);

    ctx.teardown().await;
}
