use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    AppState,
    auth::AuthUser,
    error::ApiError,
    extract::{Json, Query},
    models::{CommentThread, CreateCommentRequest, MessageResponse, ReplyView},
    repository::NewComment,
};

pub const MAX_COMMENT_CHARS: usize = 2000;

/// CommentQuery
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(rename_all = "camelCase")]
pub struct CommentQuery {
    /// Id of the post whose comments are listed.
    pub post_id: Option<String>,
}

/// list_comments
///
/// [Public Route] Threads for one post: top-level comments newest first, each
/// with its replies oldest first.
#[utoipa::path(
    get,
    path = "/api/comments",
    params(CommentQuery),
    responses(
        (status = 200, description = "Comment threads", body = [CommentThread]),
        (status = 400, description = "Missing or malformed postId", body = MessageResponse)
    )
)]
pub async fn list_comments(
    State(state): State<AppState>,
    Query(query): Query<CommentQuery>,
) -> Result<Json<Vec<CommentThread>>, ApiError> {
    let raw = query
        .post_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::bad_request("missing postId parameter"))?;
    let post_id =
        Uuid::parse_str(raw).map_err(|_| ApiError::bad_request("postId is not a valid id"))?;

    let threads = state.repo.list_comment_threads(post_id).await?;
    Ok(Json(threads))
}

/// create_comment
///
/// [Authenticated Route] Adds a comment or a reply. Threads are one level deep:
/// replying to a reply attaches the new comment to that reply's root.
#[utoipa::path(
    post,
    path = "/api/comments",
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment created", body = ReplyView),
        (status = 400, description = "Empty or oversized content", body = MessageResponse),
        (status = 401, description = "Not signed in", body = MessageResponse),
        (status = 404, description = "Post or parent comment not found", body = MessageResponse)
    )
)]
pub async fn create_comment(
    AuthUser { id: author_id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<ReplyView>), ApiError> {
    let content = payload.content.trim();
    if content.is_empty() {
        return Err(ApiError::bad_request("comment must not be empty"));
    }
    if content.chars().count() > MAX_COMMENT_CHARS {
        return Err(ApiError::bad_request(format!(
            "comment must not exceed {MAX_COMMENT_CHARS} characters"
        )));
    }

    if state.repo.get_post(payload.post_id).await?.is_none() {
        return Err(ApiError::not_found("post not found"));
    }

    let parent_id = match payload.parent_id {
        Some(parent_id) => {
            let parent = state
                .repo
                .get_comment(parent_id)
                .await?
                .filter(|parent| parent.post_id == payload.post_id)
                .ok_or_else(|| ApiError::not_found("parent comment not found"))?;
            Some(parent.parent_id.unwrap_or(parent.id))
        }
        None => None,
    };

    let comment = state
        .repo
        .create_comment(NewComment {
            post_id: payload.post_id,
            author_id,
            parent_id,
            content: content.to_string(),
        })
        .await?;

    tracing::info!(comment_id = %comment.id, post_id = %comment.post_id, "comment created");
    Ok((StatusCode::CREATED, Json(comment)))
}
