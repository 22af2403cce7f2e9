use axum::{extract::State, http::StatusCode};
use uuid::Uuid;

use super::{optional_text, required_text};
use crate::{
    AppState,
    auth::AuthUser,
    error::ApiError,
    extract::{Json, Path},
    models::{
        Category, CategoryRequest, CreatePostRequest, MessageResponse, ModerationComment,
        PostView, Tag, TagRequest, UpdatePostRequest, UpdateRoleRequest, User, UserSummary,
    },
    repository::{NewPost, PostChanges, ROLE_ADMIN, ROLE_USER, TermDraft},
    slug::{resolve_slug, validate_slug},
};

// --- Posts ---

/// list_posts
///
/// [Admin Route] Every post, drafts included, most recently updated first.
#[utoipa::path(
    get,
    path = "/api/admin/posts",
    responses(
        (status = 200, description = "All posts", body = [PostView]),
        (status = 403, description = "Not an admin", body = MessageResponse)
    )
)]
pub async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<PostView>>, ApiError> {
    Ok(Json(state.repo.list_all_posts().await?))
}

/// create_post
///
/// [Admin Route] Creates a post authored by the calling admin. The slug is
/// derived from the title when omitted.
#[utoipa::path(
    post,
    path = "/api/admin/posts",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Created", body = PostView),
        (status = 400, description = "Invalid payload", body = MessageResponse),
        (status = 409, description = "Duplicate slug", body = MessageResponse)
    )
)]
pub async fn create_post(
    AuthUser { id: author_id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<PostView>), ApiError> {
    let title = required_text(&payload.title, "title")?;
    let content = required_text(&payload.content, "content")?;
    let slug = resolve_slug(payload.slug.as_deref(), &title)?;

    let post = state
        .repo
        .create_post(
            author_id,
            NewPost {
                title,
                slug,
                content,
                excerpt: optional_text(payload.excerpt),
                cover_image: optional_text(payload.cover_image),
                published: payload.published.unwrap_or(false),
                category_ids: payload.category_ids,
                tag_ids: payload.tag_ids,
            },
        )
        .await?;

    tracing::info!(post_id = %post.id, slug = %post.slug, published = post.published, "post created");
    Ok((StatusCode::CREATED, Json(post)))
}

/// update_post
///
/// [Admin Route] Partial update. Absent fields are kept; `categoryIds` and
/// `tagIds` replace the whole set when present.
#[utoipa::path(
    put,
    path = "/api/admin/posts/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Updated", body = PostView),
        (status = 404, description = "Not found", body = MessageResponse),
        (status = 409, description = "Duplicate slug", body = MessageResponse)
    )
)]
pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePostRequest>,
) -> Result<Json<PostView>, ApiError> {
    let title = payload
        .title
        .as_deref()
        .map(|t| required_text(t, "title"))
        .transpose()?;
    let content = payload
        .content
        .as_deref()
        .map(|c| required_text(c, "content"))
        .transpose()?;
    let slug = match payload.slug.as_deref().map(str::trim) {
        Some(slug) => {
            validate_slug(slug)?;
            Some(slug.to_string())
        }
        None => None,
    };

    let changes = PostChanges {
        title,
        slug,
        content,
        excerpt: payload.excerpt.map(optional_text),
        cover_image: payload.cover_image.map(optional_text),
        published: payload.published,
        category_ids: payload.category_ids,
        tag_ids: payload.tag_ids,
    };

    let post = state
        .repo
        .update_post(id, changes)
        .await
        .map_err(ApiError::missing("post"))?;
    tracing::info!(post_id = %post.id, published = post.published, "post updated");
    Ok(Json(post))
}

/// delete_post
///
/// [Admin Route] Deletes a post. Its comments go with it.
#[utoipa::path(
    delete,
    path = "/api/admin/posts/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "Not found", body = MessageResponse)
    )
)]
pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .repo
        .delete_post(id)
        .await
        .map_err(ApiError::missing("post"))?;
    tracing::info!(post_id = %id, "post deleted");
    Ok(Json(MessageResponse::new("post deleted")))
}

// --- Categories ---

fn category_draft(payload: CategoryRequest) -> Result<TermDraft, ApiError> {
    let name = required_text(&payload.name, "name")?;
    let slug = resolve_slug(payload.slug.as_deref(), &name)?;
    Ok(TermDraft {
        name,
        slug,
        description: optional_text(payload.description),
    })
}

/// list_categories
///
/// [Admin Route] Categories newest first, counting drafts too.
#[utoipa::path(
    get,
    path = "/api/admin/categories",
    responses((status = 200, description = "Categories", body = [Category]))
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(state.repo.list_categories(false).await?))
}

#[utoipa::path(
    post,
    path = "/api/admin/categories",
    request_body = CategoryRequest,
    responses(
        (status = 201, description = "Created", body = Category),
        (status = 400, description = "Blank name or unusable slug", body = MessageResponse),
        (status = 409, description = "Duplicate name or slug", body = MessageResponse)
    )
)]
pub async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CategoryRequest>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    let category = state.repo.create_category(category_draft(payload)?).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

#[utoipa::path(
    put,
    path = "/api/admin/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Updated", body = Category),
        (status = 404, description = "Not found", body = MessageResponse),
        (status = 409, description = "Duplicate name or slug", body = MessageResponse)
    )
)]
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CategoryRequest>,
) -> Result<Json<Category>, ApiError> {
    let category = state
        .repo
        .update_category(id, category_draft(payload)?)
        .await
        .map_err(ApiError::missing("category"))?;
    Ok(Json(category))
}

#[utoipa::path(
    delete,
    path = "/api/admin/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "Not found", body = MessageResponse)
    )
)]
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .repo
        .delete_category(id)
        .await
        .map_err(ApiError::missing("category"))?;
    Ok(Json(MessageResponse::new("category deleted")))
}

// --- Tags ---

fn tag_draft(payload: TagRequest) -> Result<TermDraft, ApiError> {
    let name = required_text(&payload.name, "name")?;
    let slug = resolve_slug(payload.slug.as_deref(), &name)?;
    Ok(TermDraft {
        name,
        slug,
        description: None,
    })
}

#[utoipa::path(
    get,
    path = "/api/admin/tags",
    responses((status = 200, description = "Tags", body = [Tag]))
)]
pub async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<Tag>>, ApiError> {
    Ok(Json(state.repo.list_tags(false).await?))
}

#[utoipa::path(
    post,
    path = "/api/admin/tags",
    request_body = TagRequest,
    responses(
        (status = 201, description = "Created", body = Tag),
        (status = 400, description = "Blank name or unusable slug", body = MessageResponse),
        (status = 409, description = "Duplicate name or slug", body = MessageResponse)
    )
)]
pub async fn create_tag(
    State(state): State<AppState>,
    Json(payload): Json<TagRequest>,
) -> Result<(StatusCode, Json<Tag>), ApiError> {
    let tag = state.repo.create_tag(tag_draft(payload)?).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

#[utoipa::path(
    put,
    path = "/api/admin/tags/{id}",
    params(("id" = Uuid, Path, description = "Tag ID")),
    request_body = TagRequest,
    responses(
        (status = 200, description = "Updated", body = Tag),
        (status = 404, description = "Not found", body = MessageResponse),
        (status = 409, description = "Duplicate name or slug", body = MessageResponse)
    )
)]
pub async fn update_tag(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TagRequest>,
) -> Result<Json<Tag>, ApiError> {
    let tag = state
        .repo
        .update_tag(id, tag_draft(payload)?)
        .await
        .map_err(ApiError::missing("tag"))?;
    Ok(Json(tag))
}

#[utoipa::path(
    delete,
    path = "/api/admin/tags/{id}",
    params(("id" = Uuid, Path, description = "Tag ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "Not found", body = MessageResponse)
    )
)]
pub async fn delete_tag(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .repo
        .delete_tag(id)
        .await
        .map_err(ApiError::missing("tag"))?;
    Ok(Json(MessageResponse::new("tag deleted")))
}

// --- Comments ---

/// list_comments
///
/// [Admin Route] Moderation view: every comment newest first with its post
/// and reply count.
#[utoipa::path(
    get,
    path = "/api/admin/comments",
    responses((status = 200, description = "All comments", body = [ModerationComment]))
)]
pub async fn list_comments(
    State(state): State<AppState>,
) -> Result<Json<Vec<ModerationComment>>, ApiError> {
    Ok(Json(state.repo.list_all_comments().await?))
}

#[utoipa::path(
    delete,
    path = "/api/admin/comments/{id}",
    params(("id" = Uuid, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Deleted with its replies", body = MessageResponse),
        (status = 404, description = "Not found", body = MessageResponse)
    )
)]
pub async fn delete_comment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .repo
        .delete_comment(id)
        .await
        .map_err(ApiError::missing("comment"))?;
    tracing::info!(comment_id = %id, "comment removed by moderator");
    Ok(Json(MessageResponse::new("comment deleted")))
}

// --- Users ---

#[utoipa::path(
    get,
    path = "/api/admin/users",
    responses((status = 200, description = "All users with activity counts", body = [UserSummary]))
)]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserSummary>>, ApiError> {
    Ok(Json(state.repo.list_users().await?))
}

/// update_user_role
///
/// [Admin Route] Sets a user's role. Demoting the last admin is refused.
#[utoipa::path(
    put,
    path = "/api/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Updated", body = User),
        (status = 400, description = "Unknown role or last admin", body = MessageResponse),
        (status = 404, description = "Not found", body = MessageResponse)
    )
)]
pub async fn update_user_role(
    AuthUser { id: actor, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRoleRequest>,
) -> Result<Json<User>, ApiError> {
    let role = payload.role.trim();
    if role != ROLE_USER && role != ROLE_ADMIN {
        return Err(ApiError::bad_request("role must be 'user' or 'admin'"));
    }

    let user = state
        .repo
        .update_user_role(id, role)
        .await
        .map_err(ApiError::missing("user"))?;
    tracing::info!(actor = %actor, user_id = %user.id, role = %user.role, "role changed");
    Ok(Json(user))
}

/// delete_user
///
/// [Admin Route] Deletes an account. Admins cannot delete themselves or the
/// last admin, and authors must lose their posts first.
#[utoipa::path(
    delete,
    path = "/api/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 400, description = "Self-deletion or last admin", body = MessageResponse),
        (status = 404, description = "Not found", body = MessageResponse),
        (status = 409, description = "User still authors posts", body = MessageResponse)
    )
)]
pub async fn delete_user(
    AuthUser { id: actor, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    if id == actor {
        return Err(ApiError::bad_request("you cannot delete your own account"));
    }

    state
        .repo
        .delete_user(id)
        .await
        .map_err(ApiError::missing("user"))?;
    tracing::info!(actor = %actor, user_id = %id, "user deleted");
    Ok(Json(MessageResponse::new("user deleted")))
}
