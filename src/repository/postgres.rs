use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{FromRow, PgConnection, PgPool, Postgres, query_builder::QueryBuilder};
use uuid::Uuid;

use super::{
    NewComment, NewPost, PostChanges, PublishedPostQuery, ROLE_ADMIN, RepoError, RepoResult,
    Repository, TermDraft, dedup_ids,
};
use crate::models::{
    AuthorSummary, Category, Comment, CommentRow, CommentThread, ModerationComment, Post,
    PostRef, PostView, ReplyView, Tag, TermRef, User, UserCredentials, UserSummary,
};

/// Shared projection for every post query. Callers append WHERE/ORDER clauses.
const POST_SELECT: &str = r#"
    SELECT p.id, p.title, p.slug, p.content, p.excerpt, p.cover_image, p.published,
           p.author_id, p.created_at, p.updated_at, u.name AS author_name
    FROM posts p
    JOIN users u ON u.id = p.author_id
"#;

const COMMENT_SELECT: &str = r#"
    SELECT c.id, c.content, c.post_id, c.author_id, u.name AS author_name,
           c.parent_id, c.created_at, c.updated_at
    FROM comments c
    JOIN users u ON u.id = c.author_id
"#;

/// A post row joined with its author's name.
#[derive(FromRow)]
struct PostRow {
    #[sqlx(flatten)]
    post: Post,
    author_name: String,
}

/// A category or tag attached to a post.
#[derive(FromRow)]
struct TermLink {
    post_id: Uuid,
    #[sqlx(flatten)]
    term: TermRef,
}

#[derive(FromRow)]
struct ModerationRow {
    #[sqlx(flatten)]
    comment: CommentRow,
    post_title: String,
    post_slug: String,
    reply_count: i64,
}

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Loads categories and tags for a batch of posts with two queries total.
    async fn attach_terms(&self, rows: Vec<PostRow>) -> RepoResult<Vec<PostView>> {
        if rows.is_empty() {
            return Ok(vec![]);
        }
        let ids: Vec<Uuid> = rows.iter().map(|row| row.post.id).collect();

        let categories = sqlx::query_as::<_, TermLink>(
            r#"
            SELECT pc.post_id, c.id, c.name, c.slug
            FROM post_categories pc
            JOIN categories c ON c.id = pc.category_id
            WHERE pc.post_id = ANY($1)
            ORDER BY c.name
            "#,
        )
        .bind(ids.clone())
        .fetch_all(&self.pool)
        .await?;

        let tags = sqlx::query_as::<_, TermLink>(
            r#"
            SELECT pt.post_id, t.id, t.name, t.slug
            FROM post_tags pt
            JOIN tags t ON t.id = pt.tag_id
            WHERE pt.post_id = ANY($1)
            ORDER BY t.name
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut categories = group_terms(categories);
        let mut tags = group_terms(tags);

        Ok(rows
            .into_iter()
            .map(|row| {
                let id = row.post.id;
                PostView::assemble(
                    row.post,
                    row.author_name,
                    categories.remove(&id).unwrap_or_default(),
                    tags.remove(&id).unwrap_or_default(),
                )
            })
            .collect())
    }

    async fn post_view(&self, id: Uuid) -> RepoResult<Option<PostView>> {
        let row = sqlx::query_as::<_, PostRow>(&format!("{POST_SELECT} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(self.attach_terms(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }
}

fn group_terms(links: Vec<TermLink>) -> HashMap<Uuid, Vec<TermRef>> {
    let mut grouped: HashMap<Uuid, Vec<TermRef>> = HashMap::new();
    for link in links {
        grouped.entry(link.post_id).or_default().push(link.term);
    }
    grouped
}

/// Translates constraint violations into domain errors.
fn classify(err: sqlx::Error, conflict: &str, missing: &str) -> RepoError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() {
            return RepoError::Conflict(conflict.to_string());
        }
        if db_err.is_foreign_key_violation() {
            return RepoError::InvalidReference(missing.to_string());
        }
    }
    RepoError::Database(err)
}

fn push_published_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &PublishedPostQuery) {
    builder.push(" WHERE p.published = TRUE");
    if let Some(tag) = &query.tag {
        builder.push(
            " AND EXISTS (SELECT 1 FROM post_tags pt JOIN tags t ON t.id = pt.tag_id \
             WHERE pt.post_id = p.id AND t.slug = ",
        );
        builder.push_bind(tag.clone());
        builder.push(")");
    }
    if let Some(category) = &query.category {
        builder.push(
            " AND EXISTS (SELECT 1 FROM post_categories pc JOIN categories c ON c.id = pc.category_id \
             WHERE pc.post_id = p.id AND c.slug = ",
        );
        builder.push_bind(category.clone());
        builder.push(")");
    }
}

async fn set_post_categories(conn: &mut PgConnection, post_id: Uuid, ids: &[Uuid]) -> RepoResult<()> {
    sqlx::query("DELETE FROM post_categories WHERE post_id = $1")
        .bind(post_id)
        .execute(&mut *conn)
        .await?;
    if ids.is_empty() {
        return Ok(());
    }
    sqlx::query("INSERT INTO post_categories (post_id, category_id) SELECT $1, UNNEST($2::uuid[])")
        .bind(post_id)
        .bind(dedup_ids(ids))
        .execute(&mut *conn)
        .await
        .map_err(|e| classify(e, "duplicate category link", "unknown category id"))?;
    Ok(())
}

async fn set_post_tags(conn: &mut PgConnection, post_id: Uuid, ids: &[Uuid]) -> RepoResult<()> {
    sqlx::query("DELETE FROM post_tags WHERE post_id = $1")
        .bind(post_id)
        .execute(&mut *conn)
        .await?;
    if ids.is_empty() {
        return Ok(());
    }
    sqlx::query("INSERT INTO post_tags (post_id, tag_id) SELECT $1, UNNEST($2::uuid[])")
        .bind(post_id)
        .bind(dedup_ids(ids))
        .execute(&mut *conn)
        .await
        .map_err(|e| classify(e, "duplicate tag link", "unknown tag id"))?;
    Ok(())
}

#[async_trait]
impl Repository for PostgresRepository {
    // --- USERS ---

    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT id, name, role, created_at FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_credentials(&self, name: &str) -> RepoResult<Option<UserCredentials>> {
        let record = sqlx::query_as::<_, UserCredentials>(
            "SELECT id, name, role, password_hash, created_at FROM users WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn create_user(&self, name: &str, password_hash: &str, role: &str) -> RepoResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, password_hash, role, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING id, name, role, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(password_hash)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, "this name is already taken", "invalid user reference"))
    }

    async fn list_users(&self) -> RepoResult<Vec<UserSummary>> {
        let users = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT u.id, u.name, u.role, u.created_at,
                   (SELECT COUNT(*) FROM posts p WHERE p.author_id = u.id) AS post_count,
                   (SELECT COUNT(*) FROM comments c WHERE c.author_id = u.id) AS comment_count
            FROM users u
            ORDER BY u.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    /// update_user_role
    ///
    /// Locks every admin row before counting, so two concurrent demotions
    /// serialize and the second one sees the reduced count.
    async fn update_user_role(&self, id: Uuid, role: &str) -> RepoResult<User> {
        let mut tx = self.pool.begin().await?;

        let admins: Vec<Uuid> = sqlx::query_scalar(
            "SELECT id FROM users WHERE role = 'admin' ORDER BY id FOR UPDATE",
        )
        .fetch_all(&mut *tx)
        .await?;

        let current: Option<String> =
            sqlx::query_scalar("SELECT role FROM users WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let current = current.ok_or(RepoError::NotFound)?;

        if current == ROLE_ADMIN && role != ROLE_ADMIN && admins.len() <= 1 {
            return Err(RepoError::LastAdmin);
        }

        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET role = $2 WHERE id = $1 RETURNING id, name, role, created_at",
        )
        .bind(id)
        .bind(role)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(user)
    }

    async fn delete_user(&self, id: Uuid) -> RepoResult<()> {
        let mut tx = self.pool.begin().await?;

        let admins: Vec<Uuid> = sqlx::query_scalar(
            "SELECT id FROM users WHERE role = 'admin' ORDER BY id FOR UPDATE",
        )
        .fetch_all(&mut *tx)
        .await?;

        let current: Option<String> =
            sqlx::query_scalar("SELECT role FROM users WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let current = current.ok_or(RepoError::NotFound)?;

        if current == ROLE_ADMIN && admins.len() <= 1 {
            return Err(RepoError::LastAdmin);
        }

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| match classify(e, "user conflict", "") {
                // posts.author_id is ON DELETE RESTRICT
                RepoError::InvalidReference(_) => RepoError::Conflict(
                    "this user still authors posts; delete or reassign them first".to_string(),
                ),
                other => other,
            })?;

        tx.commit().await?;
        Ok(())
    }

    async fn promote_to_admin(&self, name: &str) -> RepoResult<User> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET role = 'admin' WHERE name = $1 RETURNING id, name, role, created_at",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepoError::NotFound)
    }

    async fn find_site_author(&self) -> RepoResult<Option<AuthorSummary>> {
        let author = sqlx::query_as::<_, AuthorSummary>(
            "SELECT id, name FROM users ORDER BY (role = 'admin') DESC, created_at ASC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(author)
    }

    // --- POSTS ---

    /// list_published_posts
    ///
    /// Builds the filter with QueryBuilder so tag/category slugs are always bound
    /// parameters. The base clause enforces `published = TRUE`.
    async fn list_published_posts(
        &self,
        query: PublishedPostQuery,
    ) -> RepoResult<(Vec<PostView>, i64)> {
        let mut count: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM posts p");
        push_published_filters(&mut count, &query);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(POST_SELECT);
        push_published_filters(&mut builder, &query);
        builder.push(" ORDER BY p.created_at DESC LIMIT ");
        builder.push_bind(query.limit);
        builder.push(" OFFSET ");
        builder.push_bind(query.offset);

        let rows = builder
            .build_query_as::<PostRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok((self.attach_terms(rows).await?, total))
    }

    async fn get_published_post(&self, slug: &str) -> RepoResult<Option<PostView>> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "{POST_SELECT} WHERE p.slug = $1 AND p.published = TRUE"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => Ok(self.attach_terms(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn count_published_posts(&self) -> RepoResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE published = TRUE")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn list_all_posts(&self) -> RepoResult<Vec<PostView>> {
        let rows = sqlx::query_as::<_, PostRow>(&format!("{POST_SELECT} ORDER BY p.updated_at DESC"))
            .fetch_all(&self.pool)
            .await?;
        self.attach_terms(rows).await
    }

    async fn get_post(&self, id: Uuid) -> RepoResult<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, title, slug, content, excerpt, cover_image, published,
                   author_id, created_at, updated_at
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(post)
    }

    async fn create_post(&self, author_id: Uuid, post: NewPost) -> RepoResult<PostView> {
        let id = Uuid::new_v4();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO posts (id, title, slug, content, excerpt, cover_image, published,
                               author_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW(), NOW())
            "#,
        )
        .bind(id)
        .bind(post.title)
        .bind(post.slug)
        .bind(post.content)
        .bind(post.excerpt)
        .bind(post.cover_image)
        .bind(post.published)
        .bind(author_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| classify(e, "a post with this slug already exists", "unknown author"))?;

        set_post_categories(&mut tx, id, &post.category_ids).await?;
        set_post_tags(&mut tx, id, &post.tag_ids).await?;

        tx.commit().await?;
        self.post_view(id).await?.ok_or(RepoError::NotFound)
    }

    /// update_post
    ///
    /// COALESCE keeps columns whose field is `None`; term sets are replaced only
    /// when provided. Everything happens in one transaction.
    async fn update_post(&self, id: Uuid, changes: PostChanges) -> RepoResult<PostView> {
        let PostChanges {
            title,
            slug,
            content,
            excerpt,
            cover_image,
            published,
            category_ids,
            tag_ids,
        } = changes;

        let (set_excerpt, set_cover) = (excerpt.is_some(), cover_image.is_some());
        let mut tx = self.pool.begin().await?;

        let updated: Option<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE posts
            SET title = COALESCE($2, title),
                slug = COALESCE($3, slug),
                content = COALESCE($4, content),
                excerpt = CASE WHEN $8 THEN $5 ELSE excerpt END,
                cover_image = CASE WHEN $9 THEN $6 ELSE cover_image END,
                published = COALESCE($7, published),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(slug)
        .bind(content)
        .bind(excerpt.flatten())
        .bind(cover_image.flatten())
        .bind(published)
        .bind(set_excerpt)
        .bind(set_cover)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| classify(e, "a post with this slug already exists", "unknown author"))?;

        if updated.is_none() {
            return Err(RepoError::NotFound);
        }
        if let Some(ids) = category_ids {
            set_post_categories(&mut tx, id, &ids).await?;
        }
        if let Some(ids) = tag_ids {
            set_post_tags(&mut tx, id, &ids).await?;
        }

        tx.commit().await?;
        self.post_view(id).await?.ok_or(RepoError::NotFound)
    }

    async fn delete_post(&self, id: Uuid) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    // --- CATEGORIES ---

    async fn list_categories(&self, published_only: bool) -> RepoResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT c.id, c.name, c.slug, c.description, c.created_at, c.updated_at,
                   (SELECT COUNT(*)
                    FROM post_categories pc
                    JOIN posts p ON p.id = pc.post_id
                    WHERE pc.category_id = c.id AND (NOT $1 OR p.published)) AS post_count
            FROM categories c
            ORDER BY c.created_at DESC
            "#,
        )
        .bind(published_only)
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    async fn create_category(&self, draft: TermDraft) -> RepoResult<Category> {
        sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (id, name, slug, description, created_at, updated_at)
            VALUES ($1, $2, $3, $4, NOW(), NOW())
            RETURNING id, name, slug, description, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(draft.name)
        .bind(draft.slug)
        .bind(draft.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, "a category with this name or slug already exists", "invalid reference"))
    }

    async fn update_category(&self, id: Uuid, draft: TermDraft) -> RepoResult<Category> {
        sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories
            SET name = $2, slug = $3, description = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, slug, description, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(draft.name)
        .bind(draft.slug)
        .bind(draft.description)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify(e, "a category with this name or slug already exists", "invalid reference"))?
        .ok_or(RepoError::NotFound)
    }

    async fn delete_category(&self, id: Uuid) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    // --- TAGS ---

    async fn list_tags(&self, published_only: bool) -> RepoResult<Vec<Tag>> {
        let tags = sqlx::query_as::<_, Tag>(
            r#"
            SELECT t.id, t.name, t.slug, t.created_at,
                   (SELECT COUNT(*)
                    FROM post_tags pt
                    JOIN posts p ON p.id = pt.post_id
                    WHERE pt.tag_id = t.id AND (NOT $1 OR p.published)) AS post_count
            FROM tags t
            ORDER BY t.created_at DESC
            "#,
        )
        .bind(published_only)
        .fetch_all(&self.pool)
        .await?;
        Ok(tags)
    }

    async fn create_tag(&self, draft: TermDraft) -> RepoResult<Tag> {
        sqlx::query_as::<_, Tag>(
            r#"
            INSERT INTO tags (id, name, slug, created_at)
            VALUES ($1, $2, $3, NOW())
            RETURNING id, name, slug, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(draft.name)
        .bind(draft.slug)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, "a tag with this name or slug already exists", "invalid reference"))
    }

    async fn update_tag(&self, id: Uuid, draft: TermDraft) -> RepoResult<Tag> {
        sqlx::query_as::<_, Tag>(
            "UPDATE tags SET name = $2, slug = $3 WHERE id = $1 RETURNING id, name, slug, created_at",
        )
        .bind(id)
        .bind(draft.name)
        .bind(draft.slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify(e, "a tag with this name or slug already exists", "invalid reference"))?
        .ok_or(RepoError::NotFound)
    }

    async fn delete_tag(&self, id: Uuid) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    // --- COMMENTS ---

    async fn list_comment_threads(&self, post_id: Uuid) -> RepoResult<Vec<CommentThread>> {
        let roots = sqlx::query_as::<_, CommentRow>(&format!(
            "{COMMENT_SELECT} WHERE c.post_id = $1 AND c.parent_id IS NULL ORDER BY c.created_at DESC"
        ))
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        if roots.is_empty() {
            return Ok(vec![]);
        }
        let root_ids: Vec<Uuid> = roots.iter().map(|c| c.id).collect();

        let replies = sqlx::query_as::<_, CommentRow>(&format!(
            "{COMMENT_SELECT} WHERE c.parent_id = ANY($1) ORDER BY c.created_at ASC"
        ))
        .bind(root_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_parent: HashMap<Uuid, Vec<ReplyView>> = HashMap::new();
        for reply in replies {
            if let Some(parent) = reply.parent_id {
                by_parent.entry(parent).or_default().push(reply.into());
            }
        }

        Ok(roots
            .into_iter()
            .map(|root| {
                let replies = by_parent.remove(&root.id).unwrap_or_default();
                CommentThread::new(root, replies)
            })
            .collect())
    }

    async fn get_comment(&self, id: Uuid) -> RepoResult<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, content, post_id, author_id, parent_id, created_at, updated_at
            FROM comments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(comment)
    }

    /// create_comment
    ///
    /// Inserts and joins the author name in one round trip (CTE).
    async fn create_comment(&self, comment: NewComment) -> RepoResult<ReplyView> {
        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            WITH inserted AS (
                INSERT INTO comments (id, content, post_id, author_id, parent_id, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
                RETURNING id, content, post_id, author_id, parent_id, created_at, updated_at
            )
            SELECT i.id, i.content, i.post_id, i.author_id, u.name AS author_name,
                   i.parent_id, i.created_at, i.updated_at
            FROM inserted i
            JOIN users u ON u.id = i.author_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(comment.content)
        .bind(comment.post_id)
        .bind(comment.author_id)
        .bind(comment.parent_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, "duplicate comment", "post or parent comment does not exist"))?;
        Ok(row.into())
    }

    async fn list_all_comments(&self) -> RepoResult<Vec<ModerationComment>> {
        let rows = sqlx::query_as::<_, ModerationRow>(
            r#"
            SELECT c.id, c.content, c.post_id, c.author_id, u.name AS author_name,
                   c.parent_id, c.created_at, c.updated_at,
                   p.title AS post_title, p.slug AS post_slug,
                   (SELECT COUNT(*) FROM comments r WHERE r.parent_id = c.id) AS reply_count
            FROM comments c
            JOIN users u ON u.id = c.author_id
            JOIN posts p ON p.id = c.post_id
            ORDER BY c.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ModerationComment {
                id: row.comment.id,
                content: row.comment.content,
                author: AuthorSummary {
                    id: row.comment.author_id,
                    name: row.comment.author_name,
                },
                post: PostRef {
                    id: row.comment.post_id,
                    title: row.post_title,
                    slug: row.post_slug,
                },
                parent_id: row.comment.parent_id,
                reply_count: row.reply_count,
                created_at: row.comment.created_at,
            })
            .collect())
    }

    async fn delete_comment(&self, id: Uuid) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    // --- DIAGNOSTICS ---

    async fn existing_tables(&self) -> RepoResult<Vec<String>> {
        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT tablename::text FROM pg_tables WHERE schemaname = 'public' ORDER BY tablename",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(tables)
    }
}
