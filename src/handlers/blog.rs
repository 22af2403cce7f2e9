use axum::extract::State;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    AppState,
    db::{or_default, with_timeout},
    error::ApiError,
    extract::{Json, Path, Query},
    models::{BlogAuthor, BlogConfig, Category, MessageResponse, PostPage, PostView, Tag},
    repository::{PublishedPostQuery, RepoError},
};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Shown in the sidebar when no user exists yet or the database is unreachable.
pub const FALLBACK_AUTHOR_NAME: &str = "Blogger";

/// PostFilter
///
/// Query parameters of the public post listing (`GET /api/blog/posts`).
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct PostFilter {
    /// 1-based page number (default 1).
    pub page: Option<i64>,
    /// Page size, clamped to 1..=100 (default 10).
    pub limit: Option<i64>,
    /// Tag slug.
    pub tag: Option<String>,
    /// Category slug.
    pub category: Option<String>,
}

impl PostFilter {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    fn to_query(&self) -> PublishedPostQuery {
        let slug = |s: &Option<String>| {
            s.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        };
        PublishedPostQuery {
            tag: slug(&self.tag),
            category: slug(&self.category),
            offset: (self.page() - 1).saturating_mul(self.limit()),
            limit: self.limit(),
        }
    }
}

/// list_posts
///
/// [Public Route] Published posts, newest first, optionally filtered by tag
/// and/or category slug.
#[utoipa::path(
    get,
    path = "/api/blog/posts",
    params(PostFilter),
    responses(
        (status = 200, description = "One page of published posts", body = PostPage),
        (status = 504, description = "Database timeout", body = MessageResponse)
    )
)]
pub async fn list_posts(
    State(state): State<AppState>,
    Query(filter): Query<PostFilter>,
) -> Result<Json<PostPage>, ApiError> {
    let (page, limit) = (filter.page(), filter.limit());
    let (posts, total) = with_timeout(
        state.config.db_timeout(),
        state.repo.list_published_posts(filter.to_query()),
    )
    .await?;

    Ok(Json(PostPage {
        posts,
        total,
        page,
        limit,
        total_pages: (total + limit - 1) / limit,
    }))
}

/// get_post
///
/// [Public Route] A published post by slug. Drafts and missing slugs are 404.
/// A timed-out read is also reported as 404 so a cold database never surfaces
/// as a server error on article pages.
#[utoipa::path(
    get,
    path = "/api/blog/posts/{slug}",
    params(("slug" = String, Path, description = "Post slug")),
    responses(
        (status = 200, description = "Post", body = PostView),
        (status = 404, description = "Not found", body = MessageResponse)
    )
)]
pub async fn get_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<PostView>, ApiError> {
    let lookup = with_timeout(
        state.config.detail_timeout(),
        state.repo.get_published_post(&slug),
    )
    .await;

    match lookup {
        Ok(Some(post)) => Ok(Json(post)),
        Ok(None) | Err(RepoError::Timeout) => Err(ApiError::not_found("post not found")),
        Err(e) => Err(e.into()),
    }
}

/// list_categories
///
/// [Public Route] Every category with its published post count. Degrades to
/// an empty list.
#[utoipa::path(
    get,
    path = "/api/blog/categories",
    responses((status = 200, description = "Categories", body = [Category]))
)]
pub async fn list_categories(State(state): State<AppState>) -> Json<Vec<Category>> {
    let categories = with_timeout(state.config.db_timeout(), state.repo.list_categories(true)).await;
    Json(or_default("blog.categories", categories))
}

/// list_tags
///
/// [Public Route] Every tag with its published post count. Degrades to an
/// empty list.
#[utoipa::path(
    get,
    path = "/api/blog/tags",
    responses((status = 200, description = "Tags", body = [Tag]))
)]
pub async fn list_tags(State(state): State<AppState>) -> Json<Vec<Tag>> {
    let tags = with_timeout(state.config.db_timeout(), state.repo.list_tags(true)).await;
    Json(or_default("blog.tags", tags))
}

/// get_config
///
/// [Public Route] Site name, description and the author card. Always 200.
#[utoipa::path(
    get,
    path = "/api/blog/config",
    responses((status = 200, description = "Blog configuration", body = BlogConfig))
)]
pub async fn get_config(State(state): State<AppState>) -> Json<BlogConfig> {
    let budget = state.config.db_timeout();
    let author = or_default(
        "blog.author",
        with_timeout(budget, state.repo.find_site_author()).await,
    );

    let author = match author {
        Some(author) => BlogAuthor {
            id: Some(author.id),
            name: author.name,
            post_count: or_default(
                "blog.post_count",
                with_timeout(budget, state.repo.count_published_posts()).await,
            ),
        },
        None => BlogAuthor {
            id: None,
            name: FALLBACK_AUTHOR_NAME.to_string(),
            post_count: 0,
        },
    };

    Json(BlogConfig {
        site_name: state.config.site_name.clone(),
        site_description: state.config.site_description.clone(),
        author,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_and_clamps() {
        let filter = PostFilter::default();
        assert_eq!((filter.page(), filter.limit()), (1, DEFAULT_PAGE_SIZE));

        let filter = PostFilter {
            page: Some(0),
            limit: Some(1000),
            ..Default::default()
        };
        assert_eq!((filter.page(), filter.limit()), (1, MAX_PAGE_SIZE));

        let filter = PostFilter {
            page: Some(3),
            limit: Some(0),
            ..Default::default()
        };
        assert_eq!(filter.to_query().offset, 2);
    }

    #[test]
    fn huge_page_saturates_offset() {
        let filter = PostFilter {
            page: Some(i64::MAX),
            limit: Some(20),
            ..Default::default()
        };
        assert_eq!(filter.to_query().offset, i64::MAX);
    }

    #[test]
    fn blank_slugs_are_ignored() {
        let filter = PostFilter {
            tag: Some("  ".to_string()),
            category: Some("rust".to_string()),
            ..Default::default()
        };
        let query = filter.to_query();
        assert_eq!(query.tag, None);
        assert_eq!(query.category.as_deref(), Some("rust"));
    }
}
