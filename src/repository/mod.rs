use crate::models::{
    AuthorSummary, Category, Comment, CommentThread, ModerationComment, Post, PostView, ReplyView,
    Tag, User, UserCredentials, UserSummary,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::MemoryRepository;
pub use postgres::PostgresRepository;

/// Role names stored in `users.role`.
pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";

/// Tables the service expects to find in the `public` schema.
pub const REQUIRED_TABLES: [&str; 5] = ["users", "posts", "categories", "tags", "comments"];

/// RepoError
///
/// Persistence failures the handlers need to tell apart.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("record not found")]
    NotFound,
    /// A unique constraint or dependent rows block the write.
    #[error("{0}")]
    Conflict(String),
    /// The payload points at rows that do not exist (e.g. unknown tag ids).
    #[error("{0}")]
    InvalidReference(String),
    /// The write would leave the system without an admin.
    #[error("at least one admin must remain")]
    LastAdmin,
    #[error("database query timed out")]
    Timeout,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type RepoResult<T> = Result<T, RepoError>;

/// PublishedPostQuery
///
/// Filters for the public post listing. `offset`/`limit` are already clamped.
#[derive(Debug, Clone, Default)]
pub struct PublishedPostQuery {
    pub tag: Option<String>,
    pub category: Option<String>,
    pub offset: i64,
    pub limit: i64,
}

/// NewPost
///
/// A validated post ready for insertion.
#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub published: bool,
    pub category_ids: Vec<Uuid>,
    pub tag_ids: Vec<Uuid>,
}

/// PostChanges
///
/// A validated partial update. `None` leaves the column untouched;
/// `Some(None)` clears a nullable column.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<Option<String>>,
    pub cover_image: Option<Option<String>>,
    pub published: Option<bool>,
    pub category_ids: Option<Vec<Uuid>>,
    pub tag_ids: Option<Vec<Uuid>>,
}

/// TermDraft
///
/// Validated category or tag fields. Tags ignore `description`.
#[derive(Debug, Clone, Default)]
pub struct TermDraft {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}

/// NewComment
#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: Uuid,
    pub author_id: Uuid,
    // Always a top-level comment; the handler flattens replies-to-replies.
    pub parent_id: Option<Uuid>,
    pub content: String,
}

/// Repository Trait
///
/// Abstract contract for all persistence operations. Handlers only see
/// `Arc<dyn Repository>`, so the Postgres and in-memory backends are
/// interchangeable.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users & Auth ---
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>>;
    async fn find_credentials(&self, name: &str) -> RepoResult<Option<UserCredentials>>;
    // Conflict when the name is taken.
    async fn create_user(&self, name: &str, password_hash: &str, role: &str) -> RepoResult<User>;
    async fn list_users(&self) -> RepoResult<Vec<UserSummary>>;
    /// Changes a role. `LastAdmin` when demoting the only admin.
    async fn update_user_role(&self, id: Uuid, role: &str) -> RepoResult<User>;
    /// Deletes a user. `LastAdmin` for the only admin, `Conflict` while they author posts.
    async fn delete_user(&self, id: Uuid) -> RepoResult<()>;
    async fn promote_to_admin(&self, name: &str) -> RepoResult<User>;
    /// First admin by creation time, else the first user.
    async fn find_site_author(&self) -> RepoResult<Option<AuthorSummary>>;

    // --- Posts ---
    /// Published posts only, newest first, plus the total matching count.
    async fn list_published_posts(
        &self,
        query: PublishedPostQuery,
    ) -> RepoResult<(Vec<PostView>, i64)>;
    async fn get_published_post(&self, slug: &str) -> RepoResult<Option<PostView>>;
    async fn count_published_posts(&self) -> RepoResult<i64>;
    /// Every post, most recently updated first.
    async fn list_all_posts(&self) -> RepoResult<Vec<PostView>>;
    async fn get_post(&self, id: Uuid) -> RepoResult<Option<Post>>;
    async fn create_post(&self, author_id: Uuid, post: NewPost) -> RepoResult<PostView>;
    async fn update_post(&self, id: Uuid, changes: PostChanges) -> RepoResult<PostView>;
    async fn delete_post(&self, id: Uuid) -> RepoResult<()>;

    // --- Categories ---
    /// Newest first with `post_count`; `published_only` restricts the count.
    async fn list_categories(&self, published_only: bool) -> RepoResult<Vec<Category>>;
    async fn create_category(&self, draft: TermDraft) -> RepoResult<Category>;
    async fn update_category(&self, id: Uuid, draft: TermDraft) -> RepoResult<Category>;
    async fn delete_category(&self, id: Uuid) -> RepoResult<()>;

    // --- Tags ---
    async fn list_tags(&self, published_only: bool) -> RepoResult<Vec<Tag>>;
    async fn create_tag(&self, draft: TermDraft) -> RepoResult<Tag>;
    async fn update_tag(&self, id: Uuid, draft: TermDraft) -> RepoResult<Tag>;
    async fn delete_tag(&self, id: Uuid) -> RepoResult<()>;

    // --- Comments ---
    /// Top-level comments newest first, each with replies oldest first.
    async fn list_comment_threads(&self, post_id: Uuid) -> RepoResult<Vec<CommentThread>>;
    async fn get_comment(&self, id: Uuid) -> RepoResult<Option<Comment>>;
    async fn create_comment(&self, comment: NewComment) -> RepoResult<ReplyView>;
    async fn list_all_comments(&self) -> RepoResult<Vec<ModerationComment>>;
    /// Replies go with their parent.
    async fn delete_comment(&self, id: Uuid) -> RepoResult<()>;

    // --- Diagnostics ---
    async fn existing_tables(&self) -> RepoResult<Vec<String>>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// Removes duplicate ids while keeping the first occurrence order.
pub(crate) fn dedup_ids(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = std::collections::HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}
