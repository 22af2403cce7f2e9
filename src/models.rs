use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// Public view of a row in the `users` table. The password hash lives only in
/// `UserCredentials` and is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    // Unique display/login name.
    pub name: String,
    // The RBAC field: 'user' or 'admin'.
    pub role: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// UserCredentials
///
/// Internal row used by the login flow. Holds the bcrypt hash.
#[derive(Debug, Clone, FromRow, Default)]
pub struct UserCredentials {
    pub id: Uuid,
    pub name: String,
    pub role: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl From<UserCredentials> for User {
    fn from(record: UserCredentials) -> Self {
        User {
            id: record.id,
            name: record.name,
            role: record.role,
            created_at: record.created_at,
        }
    }
}

/// Post
///
/// Raw row of the `posts` table. Handlers return the enriched `PostView`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    // Markdown source. Rendering happens client-side.
    pub content: String,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub published: bool,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// AuthorSummary
///
/// Minimal author identity embedded in posts and comments.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct AuthorSummary {
    pub id: Uuid,
    pub name: String,
}

/// TermRef
///
/// A category or tag reference as embedded in a post (`{id, name, slug}`).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct TermRef {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

/// PostView
///
/// A post together with its author, categories and tags. This is the shape
/// every post endpoint (public and admin) returns.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PostView {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub published: bool,
    pub author_id: Uuid,
    pub author: AuthorSummary,
    pub categories: Vec<TermRef>,
    pub tags: Vec<TermRef>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl PostView {
    pub fn assemble(
        post: Post,
        author_name: String,
        categories: Vec<TermRef>,
        tags: Vec<TermRef>,
    ) -> Self {
        PostView {
            id: post.id,
            title: post.title,
            slug: post.slug,
            content: post.content,
            excerpt: post.excerpt,
            cover_image: post.cover_image,
            published: post.published,
            author_id: post.author_id,
            author: AuthorSummary {
                id: post.author_id,
                name: author_name,
            },
            categories,
            tags,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

/// PostPage
///
/// Paginated listing returned by `GET /api/blog/posts`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PostPage {
    pub posts: Vec<PostView>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

/// Category
///
/// Row of the `categories` table. `post_count` is only populated by listing
/// queries, which compute it with a sub-select.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
    #[sqlx(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_count: Option<i64>,
}

/// Tag
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[sqlx(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_count: Option<i64>,
}

/// Comment
///
/// Raw row of the `comments` table. `parent_id` is `None` for top-level comments.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub content: String,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// CommentRow
///
/// A comment joined with its author's name.
#[derive(Debug, Clone, FromRow, Default)]
pub struct CommentRow {
    pub id: Uuid,
    pub content: String,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub author_name: String,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// ReplyView
///
/// A comment with its author. Replies carry no further nesting.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ReplyView {
    pub id: Uuid,
    pub content: String,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub author: AuthorSummary,
    pub parent_id: Option<Uuid>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl From<CommentRow> for ReplyView {
    fn from(row: CommentRow) -> Self {
        ReplyView {
            id: row.id,
            content: row.content,
            post_id: row.post_id,
            author_id: row.author_id,
            author: AuthorSummary {
                id: row.author_id,
                name: row.author_name,
            },
            parent_id: row.parent_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// CommentThread
///
/// A top-level comment and its replies (oldest first).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CommentThread {
    pub id: Uuid,
    pub content: String,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub author: AuthorSummary,
    pub parent_id: Option<Uuid>,
    pub replies: Vec<ReplyView>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl CommentThread {
    pub fn new(root: CommentRow, replies: Vec<ReplyView>) -> Self {
        let root = ReplyView::from(root);
        CommentThread {
            id: root.id,
            content: root.content,
            post_id: root.post_id,
            author_id: root.author_id,
            author: root.author,
            parent_id: root.parent_id,
            replies,
            created_at: root.created_at,
            updated_at: root.updated_at,
        }
    }
}

/// PostRef
///
/// The post a comment belongs to, as shown in the moderation list.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PostRef {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
}

/// ModerationComment
///
/// Row of the admin comment listing: comment, author, post and reply count.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ModerationComment {
    pub id: Uuid,
    pub content: String,
    pub author: AuthorSummary,
    pub post: PostRef,
    pub parent_id: Option<Uuid>,
    pub reply_count: i64,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// UserSummary
///
/// Row of the admin user listing.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub role: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    pub post_count: i64,
    pub comment_count: i64,
}

// --- Request Payloads (Input Schemas) ---

/// Credentials
///
/// Input payload for `POST /api/auth/register` and `POST /api/auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Credentials {
    #[schema(example = "alice")]
    pub name: String,
    pub password: String,
}

/// CreatePostRequest
///
/// Input payload for `POST /api/admin/posts`. The slug is derived from the title
/// when omitted.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreatePostRequest {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
    #[serde(default)]
    pub category_ids: Vec<Uuid>,
    #[serde(default)]
    pub tag_ids: Vec<Uuid>,
}

/// UpdatePostRequest
///
/// Partial update for `PUT /api/admin/posts/{id}`. Absent fields stay untouched;
/// present `categoryIds`/`tagIds` replace the whole set. `excerpt` and
/// `coverImage` may be sent as `null` to clear them.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdatePostRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    #[ts(optional)]
    #[schema(value_type = Option<String>)]
    pub excerpt: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    #[ts(optional)]
    #[schema(value_type = Option<String>)]
    pub cover_image: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_ids: Option<Vec<Uuid>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_ids: Option<Vec<Uuid>>,
}

/// A present key becomes `Some`, so an explicit `null` reads as `Some(None)`.
fn nullable<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// CategoryRequest
///
/// Input payload for creating or renaming a category.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CategoryRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

/// TagRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct TagRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

/// CreateCommentRequest
///
/// Input payload for `POST /api/comments`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateCommentRequest {
    pub content: String,
    pub post_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,
}

/// UpdateRoleRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateRoleRequest {
    #[schema(example = "admin")]
    pub role: String,
}

/// SetAdminRequest
///
/// Development-only promotion by user name.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct SetAdminRequest {
    pub name: String,
}

// --- Output Schemas ---

/// AuthResponse
///
/// Returned by register and login: the user plus a freshly issued bearer token.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

/// MeResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct MeResponse {
    pub user: User,
}

/// MessageResponse
///
/// Generic `{ "message": ... }` body used by deletions and every error response.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// PromotedUser
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct PromotedUser {
    pub message: String,
    pub user: User,
}

/// BlogAuthor
///
/// The blog owner shown in the sidebar. `id` is `None` for the built-in fallback.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BlogAuthor {
    pub id: Option<Uuid>,
    pub name: String,
    pub post_count: i64,
}

/// BlogConfig
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BlogConfig {
    pub site_name: String,
    pub site_description: String,
    pub author: BlogAuthor,
}

/// HealthResponse
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct HealthResponse {
    pub ok: bool,
    /// Unix time in milliseconds.
    pub t: i64,
}

/// WarmupResponse
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct WarmupResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

/// EnvironmentInfo
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentInfo {
    pub env: String,
    pub has_jwt_secret: bool,
}

/// ApiStatus
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct ApiStatus {
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub environment: EnvironmentInfo,
}

/// DbStatus
///
/// Result of the schema check. `missing_tables` is empty when the schema is complete.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct DbStatus {
    pub message: String,
    pub tables: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_tables: Vec<String>,
}
