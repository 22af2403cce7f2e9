use std::{collections::HashSet, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use super::{
    NewComment, NewPost, PostChanges, PublishedPostQuery, ROLE_ADMIN, RepoError, RepoResult,
    Repository, TermDraft, dedup_ids,
};
use crate::models::{
    AuthorSummary, Category, Comment, CommentRow, CommentThread, ModerationComment, Post,
    PostRef, PostView, ReplyView, Tag, TermRef, User, UserCredentials, UserSummary,
};

const TABLES: [&str; 7] = [
    "categories",
    "comments",
    "post_categories",
    "post_tags",
    "posts",
    "tags",
    "users",
];

#[derive(Default)]
struct Store {
    users: Vec<UserCredentials>,
    posts: Vec<Post>,
    categories: Vec<Category>,
    tags: Vec<Tag>,
    // (post_id, category_id)
    post_categories: Vec<(Uuid, Uuid)>,
    // (post_id, tag_id)
    post_tags: Vec<(Uuid, Uuid)>,
    comments: Vec<Comment>,
    last_tick: Option<DateTime<Utc>>,
}

impl Store {
    /// Strictly increasing timestamps so "newest first" orderings are stable.
    fn tick(&mut self) -> DateTime<Utc> {
        let mut now = Utc::now();
        if let Some(last) = self.last_tick {
            if now <= last {
                now = last + chrono::Duration::microseconds(1);
            }
        }
        self.last_tick = Some(now);
        now
    }

    fn user_name(&self, id: Uuid) -> String {
        self.users
            .iter()
            .find(|u| u.id == id)
            .map(|u| u.name.clone())
            .unwrap_or_default()
    }

    fn admin_count(&self) -> usize {
        self.users.iter().filter(|u| u.role == ROLE_ADMIN).count()
    }

    fn view(&self, post: &Post) -> PostView {
        let mut categories: Vec<TermRef> = self
            .post_categories
            .iter()
            .filter(|(post_id, _)| *post_id == post.id)
            .filter_map(|(_, id)| self.categories.iter().find(|c| c.id == *id))
            .map(|c| TermRef {
                id: c.id,
                name: c.name.clone(),
                slug: c.slug.clone(),
            })
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));

        let mut tags: Vec<TermRef> = self
            .post_tags
            .iter()
            .filter(|(post_id, _)| *post_id == post.id)
            .filter_map(|(_, id)| self.tags.iter().find(|t| t.id == *id))
            .map(|t| TermRef {
                id: t.id,
                name: t.name.clone(),
                slug: t.slug.clone(),
            })
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));

        PostView::assemble(post.clone(), self.user_name(post.author_id), categories, tags)
    }

    fn comment_row(&self, comment: &Comment) -> CommentRow {
        CommentRow {
            id: comment.id,
            content: comment.content.clone(),
            post_id: comment.post_id,
            author_id: comment.author_id,
            author_name: self.user_name(comment.author_id),
            parent_id: comment.parent_id,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        }
    }

    fn check_terms(&self, category_ids: &[Uuid], tag_ids: &[Uuid]) -> RepoResult<()> {
        if category_ids
            .iter()
            .any(|id| !self.categories.iter().any(|c| c.id == *id))
        {
            return Err(RepoError::InvalidReference("unknown category id".to_string()));
        }
        if tag_ids.iter().any(|id| !self.tags.iter().any(|t| t.id == *id)) {
            return Err(RepoError::InvalidReference("unknown tag id".to_string()));
        }
        Ok(())
    }

    fn set_categories(&mut self, post_id: Uuid, ids: &[Uuid]) {
        self.post_categories.retain(|(p, _)| *p != post_id);
        self.post_categories
            .extend(dedup_ids(ids).into_iter().map(|id| (post_id, id)));
    }

    fn set_tags(&mut self, post_id: Uuid, ids: &[Uuid]) {
        self.post_tags.retain(|(p, _)| *p != post_id);
        self.post_tags
            .extend(dedup_ids(ids).into_iter().map(|id| (post_id, id)));
    }

    /// Removes the matching comments and, transitively, their replies.
    fn remove_comments(&mut self, mut doomed: impl FnMut(&Comment) -> bool) {
        let mut removed: HashSet<Uuid> = HashSet::new();
        self.comments.retain(|c| {
            if doomed(c) {
                removed.insert(c.id);
                false
            } else {
                true
            }
        });
        while !removed.is_empty() {
            let mut next = HashSet::new();
            self.comments.retain(|c| match c.parent_id {
                Some(parent) if removed.contains(&parent) => {
                    next.insert(c.id);
                    false
                }
                _ => true,
            });
            removed = next;
        }
    }
}

/// MemoryRepository
///
/// In-process implementation of `Repository` with the same constraint
/// semantics as the Postgres schema (unique names and slugs, cascades,
/// restrict on post authors). Backs the handler and router tests.
#[derive(Default)]
pub struct MemoryRepository {
    store: RwLock<Store>,
    latency: Duration,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every call, simulating a slow database.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    async fn read(&self) -> RwLockReadGuard<'_, Store> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.store.read().await
    }

    async fn write(&self) -> RwLockWriteGuard<'_, Store> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.store.write().await
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        let store = self.read().await;
        Ok(store
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .map(User::from))
    }

    async fn find_credentials(&self, name: &str) -> RepoResult<Option<UserCredentials>> {
        let store = self.read().await;
        Ok(store.users.iter().find(|u| u.name == name).cloned())
    }

    async fn create_user(&self, name: &str, password_hash: &str, role: &str) -> RepoResult<User> {
        let mut store = self.write().await;
        if store.users.iter().any(|u| u.name == name) {
            return Err(RepoError::Conflict("this name is already taken".to_string()));
        }
        let record = UserCredentials {
            id: Uuid::new_v4(),
            name: name.to_string(),
            role: role.to_string(),
            password_hash: password_hash.to_string(),
            created_at: store.tick(),
        };
        store.users.push(record.clone());
        Ok(record.into())
    }

    async fn list_users(&self) -> RepoResult<Vec<UserSummary>> {
        let store = self.read().await;
        let mut users: Vec<UserSummary> = store
            .users
            .iter()
            .map(|u| UserSummary {
                id: u.id,
                name: u.name.clone(),
                role: u.role.clone(),
                created_at: u.created_at,
                post_count: store.posts.iter().filter(|p| p.author_id == u.id).count() as i64,
                comment_count: store.comments.iter().filter(|c| c.author_id == u.id).count()
                    as i64,
            })
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn update_user_role(&self, id: Uuid, role: &str) -> RepoResult<User> {
        let mut store = self.write().await;
        let admins = store.admin_count();
        let user = store
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(RepoError::NotFound)?;
        if user.role == ROLE_ADMIN && role != ROLE_ADMIN && admins <= 1 {
            return Err(RepoError::LastAdmin);
        }
        user.role = role.to_string();
        Ok(user.clone().into())
    }

    async fn delete_user(&self, id: Uuid) -> RepoResult<()> {
        let mut store = self.write().await;
        let user = store
            .users
            .iter()
            .find(|u| u.id == id)
            .ok_or(RepoError::NotFound)?;
        if user.role == ROLE_ADMIN && store.admin_count() <= 1 {
            return Err(RepoError::LastAdmin);
        }
        if store.posts.iter().any(|p| p.author_id == id) {
            return Err(RepoError::Conflict(
                "this user still authors posts; delete or reassign them first".to_string(),
            ));
        }
        store.remove_comments(|c| c.author_id == id);
        store.users.retain(|u| u.id != id);
        Ok(())
    }

    async fn promote_to_admin(&self, name: &str) -> RepoResult<User> {
        let mut store = self.write().await;
        let user = store
            .users
            .iter_mut()
            .find(|u| u.name == name)
            .ok_or(RepoError::NotFound)?;
        user.role = ROLE_ADMIN.to_string();
        Ok(user.clone().into())
    }

    async fn find_site_author(&self) -> RepoResult<Option<AuthorSummary>> {
        let store = self.read().await;
        let author = store
            .users
            .iter()
            .filter(|u| u.role == ROLE_ADMIN)
            .min_by_key(|u| u.created_at)
            .or_else(|| store.users.iter().min_by_key(|u| u.created_at))
            .map(|u| AuthorSummary {
                id: u.id,
                name: u.name.clone(),
            });
        Ok(author)
    }

    async fn list_published_posts(
        &self,
        query: PublishedPostQuery,
    ) -> RepoResult<(Vec<PostView>, i64)> {
        let store = self.read().await;

        let has_tag = |post: &Post, slug: &str| {
            store.post_tags.iter().any(|(p, t)| {
                *p == post.id && store.tags.iter().any(|tag| tag.id == *t && tag.slug == slug)
            })
        };
        let has_category = |post: &Post, slug: &str| {
            store.post_categories.iter().any(|(p, c)| {
                *p == post.id
                    && store
                        .categories
                        .iter()
                        .any(|cat| cat.id == *c && cat.slug == slug)
            })
        };

        let mut matching: Vec<&Post> = store
            .posts
            .iter()
            .filter(|p| p.published)
            .filter(|p| query.tag.as_deref().is_none_or(|slug| has_tag(*p, slug)))
            .filter(|p| {
                query
                    .category
                    .as_deref()
                    .is_none_or(|slug| has_category(*p, slug))
            })
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(query.offset.max(0) as usize)
            .take(query.limit.max(0) as usize)
            .map(|p| store.view(p))
            .collect();
        Ok((page, total))
    }

    async fn get_published_post(&self, slug: &str) -> RepoResult<Option<PostView>> {
        let store = self.read().await;
        Ok(store
            .posts
            .iter()
            .find(|p| p.slug == slug && p.published)
            .map(|p| store.view(p)))
    }

    async fn count_published_posts(&self) -> RepoResult<i64> {
        let store = self.read().await;
        Ok(store.posts.iter().filter(|p| p.published).count() as i64)
    }

    async fn list_all_posts(&self) -> RepoResult<Vec<PostView>> {
        let store = self.read().await;
        let mut posts: Vec<&Post> = store.posts.iter().collect();
        posts.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(posts.into_iter().map(|p| store.view(p)).collect())
    }

    async fn get_post(&self, id: Uuid) -> RepoResult<Option<Post>> {
        let store = self.read().await;
        Ok(store.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn create_post(&self, author_id: Uuid, post: NewPost) -> RepoResult<PostView> {
        let mut store = self.write().await;
        if !store.users.iter().any(|u| u.id == author_id) {
            return Err(RepoError::InvalidReference("unknown author".to_string()));
        }
        if store.posts.iter().any(|p| p.slug == post.slug) {
            return Err(RepoError::Conflict(
                "a post with this slug already exists".to_string(),
            ));
        }
        store.check_terms(&post.category_ids, &post.tag_ids)?;

        let now = store.tick();
        let record = Post {
            id: Uuid::new_v4(),
            title: post.title,
            slug: post.slug,
            content: post.content,
            excerpt: post.excerpt,
            cover_image: post.cover_image,
            published: post.published,
            author_id,
            created_at: now,
            updated_at: now,
        };
        store.set_categories(record.id, &post.category_ids);
        store.set_tags(record.id, &post.tag_ids);
        let view = store.view(&record);
        store.posts.push(record);
        Ok(view)
    }

    async fn update_post(&self, id: Uuid, changes: PostChanges) -> RepoResult<PostView> {
        let mut store = self.write().await;
        if !store.posts.iter().any(|p| p.id == id) {
            return Err(RepoError::NotFound);
        }
        if let Some(slug) = &changes.slug {
            if store.posts.iter().any(|p| p.id != id && &p.slug == slug) {
                return Err(RepoError::Conflict(
                    "a post with this slug already exists".to_string(),
                ));
            }
        }
        store.check_terms(
            changes.category_ids.as_deref().unwrap_or_default(),
            changes.tag_ids.as_deref().unwrap_or_default(),
        )?;

        let now = store.tick();
        if let Some(ids) = &changes.category_ids {
            store.set_categories(id, ids);
        }
        if let Some(ids) = &changes.tag_ids {
            store.set_tags(id, ids);
        }

        let post = store
            .posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(RepoError::NotFound)?;
        if let Some(title) = changes.title {
            post.title = title;
        }
        if let Some(slug) = changes.slug {
            post.slug = slug;
        }
        if let Some(content) = changes.content {
            post.content = content;
        }
        if let Some(excerpt) = changes.excerpt {
            post.excerpt = excerpt;
        }
        if let Some(cover_image) = changes.cover_image {
            post.cover_image = cover_image;
        }
        if let Some(published) = changes.published {
            post.published = published;
        }
        post.updated_at = now;

        let post = post.clone();
        Ok(store.view(&post))
    }

    async fn delete_post(&self, id: Uuid) -> RepoResult<()> {
        let mut store = self.write().await;
        if !store.posts.iter().any(|p| p.id == id) {
            return Err(RepoError::NotFound);
        }
        store.posts.retain(|p| p.id != id);
        store.post_categories.retain(|(p, _)| *p != id);
        store.post_tags.retain(|(p, _)| *p != id);
        store.remove_comments(|c| c.post_id == id);
        Ok(())
    }

    async fn list_categories(&self, published_only: bool) -> RepoResult<Vec<Category>> {
        let store = self.read().await;
        let mut categories: Vec<Category> = store
            .categories
            .iter()
            .map(|c| {
                let count = store
                    .post_categories
                    .iter()
                    .filter(|(post_id, cat)| {
                        *cat == c.id
                            && store
                                .posts
                                .iter()
                                .any(|p| p.id == *post_id && (!published_only || p.published))
                    })
                    .count();
                Category {
                    post_count: Some(count as i64),
                    ..c.clone()
                }
            })
            .collect();
        categories.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(categories)
    }

    async fn create_category(&self, draft: TermDraft) -> RepoResult<Category> {
        let mut store = self.write().await;
        if store
            .categories
            .iter()
            .any(|c| c.name == draft.name || c.slug == draft.slug)
        {
            return Err(RepoError::Conflict(
                "a category with this name or slug already exists".to_string(),
            ));
        }
        let now = store.tick();
        let category = Category {
            id: Uuid::new_v4(),
            name: draft.name,
            slug: draft.slug,
            description: draft.description,
            created_at: now,
            updated_at: now,
            post_count: None,
        };
        store.categories.push(category.clone());
        Ok(category)
    }

    async fn update_category(&self, id: Uuid, draft: TermDraft) -> RepoResult<Category> {
        let mut store = self.write().await;
        if !store.categories.iter().any(|c| c.id == id) {
            return Err(RepoError::NotFound);
        }
        if store
            .categories
            .iter()
            .any(|c| c.id != id && (c.name == draft.name || c.slug == draft.slug))
        {
            return Err(RepoError::Conflict(
                "a category with this name or slug already exists".to_string(),
            ));
        }
        let now = store.tick();
        let category = store
            .categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(RepoError::NotFound)?;
        category.name = draft.name;
        category.slug = draft.slug;
        category.description = draft.description;
        category.updated_at = now;
        Ok(category.clone())
    }

    async fn delete_category(&self, id: Uuid) -> RepoResult<()> {
        let mut store = self.write().await;
        if !store.categories.iter().any(|c| c.id == id) {
            return Err(RepoError::NotFound);
        }
        store.categories.retain(|c| c.id != id);
        store.post_categories.retain(|(_, c)| *c != id);
        Ok(())
    }

    async fn list_tags(&self, published_only: bool) -> RepoResult<Vec<Tag>> {
        let store = self.read().await;
        let mut tags: Vec<Tag> = store
            .tags
            .iter()
            .map(|t| {
                let count = store
                    .post_tags
                    .iter()
                    .filter(|(post_id, tag)| {
                        *tag == t.id
                            && store
                                .posts
                                .iter()
                                .any(|p| p.id == *post_id && (!published_only || p.published))
                    })
                    .count();
                Tag {
                    post_count: Some(count as i64),
                    ..t.clone()
                }
            })
            .collect();
        tags.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tags)
    }

    async fn create_tag(&self, draft: TermDraft) -> RepoResult<Tag> {
        let mut store = self.write().await;
        if store
            .tags
            .iter()
            .any(|t| t.name == draft.name || t.slug == draft.slug)
        {
            return Err(RepoError::Conflict(
                "a tag with this name or slug already exists".to_string(),
            ));
        }
        let tag = Tag {
            id: Uuid::new_v4(),
            name: draft.name,
            slug: draft.slug,
            created_at: store.tick(),
            post_count: None,
        };
        store.tags.push(tag.clone());
        Ok(tag)
    }

    async fn update_tag(&self, id: Uuid, draft: TermDraft) -> RepoResult<Tag> {
        let mut store = self.write().await;
        if !store.tags.iter().any(|t| t.id == id) {
            return Err(RepoError::NotFound);
        }
        if store
            .tags
            .iter()
            .any(|t| t.id != id && (t.name == draft.name || t.slug == draft.slug))
        {
            return Err(RepoError::Conflict(
                "a tag with this name or slug already exists".to_string(),
            ));
        }
        let tag = store
            .tags
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(RepoError::NotFound)?;
        tag.name = draft.name;
        tag.slug = draft.slug;
        Ok(tag.clone())
    }

    async fn delete_tag(&self, id: Uuid) -> RepoResult<()> {
        let mut store = self.write().await;
        if !store.tags.iter().any(|t| t.id == id) {
            return Err(RepoError::NotFound);
        }
        store.tags.retain(|t| t.id != id);
        store.post_tags.retain(|(_, t)| *t != id);
        Ok(())
    }

    async fn list_comment_threads(&self, post_id: Uuid) -> RepoResult<Vec<CommentThread>> {
        let store = self.read().await;
        let mut roots: Vec<&Comment> = store
            .comments
            .iter()
            .filter(|c| c.post_id == post_id && c.parent_id.is_none())
            .collect();
        roots.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(roots
            .into_iter()
            .map(|root| {
                let mut replies: Vec<&Comment> = store
                    .comments
                    .iter()
                    .filter(|c| c.parent_id == Some(root.id))
                    .collect();
                replies.sort_by(|a, b| a.created_at.cmp(&b.created_at));
                let replies: Vec<ReplyView> = replies
                    .into_iter()
                    .map(|c| store.comment_row(c).into())
                    .collect();
                CommentThread::new(store.comment_row(root), replies)
            })
            .collect())
    }

    async fn get_comment(&self, id: Uuid) -> RepoResult<Option<Comment>> {
        let store = self.read().await;
        Ok(store.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn create_comment(&self, comment: NewComment) -> RepoResult<ReplyView> {
        let mut store = self.write().await;
        let missing =
            || RepoError::InvalidReference("post or parent comment does not exist".to_string());
        if !store.posts.iter().any(|p| p.id == comment.post_id) {
            return Err(missing());
        }
        if let Some(parent) = comment.parent_id {
            if !store.comments.iter().any(|c| c.id == parent) {
                return Err(missing());
            }
        }
        if !store.users.iter().any(|u| u.id == comment.author_id) {
            return Err(RepoError::InvalidReference("unknown author".to_string()));
        }

        let now = store.tick();
        let record = Comment {
            id: Uuid::new_v4(),
            content: comment.content,
            post_id: comment.post_id,
            author_id: comment.author_id,
            parent_id: comment.parent_id,
            created_at: now,
            updated_at: now,
        };
        let view = store.comment_row(&record).into();
        store.comments.push(record);
        Ok(view)
    }

    async fn list_all_comments(&self) -> RepoResult<Vec<ModerationComment>> {
        let store = self.read().await;
        let mut comments: Vec<ModerationComment> = store
            .comments
            .iter()
            .filter_map(|c| {
                let post = store.posts.iter().find(|p| p.id == c.post_id)?;
                Some(ModerationComment {
                    id: c.id,
                    content: c.content.clone(),
                    author: AuthorSummary {
                        id: c.author_id,
                        name: store.user_name(c.author_id),
                    },
                    post: PostRef {
                        id: post.id,
                        title: post.title.clone(),
                        slug: post.slug.clone(),
                    },
                    parent_id: c.parent_id,
                    reply_count: store
                        .comments
                        .iter()
                        .filter(|r| r.parent_id == Some(c.id))
                        .count() as i64,
                    created_at: c.created_at,
                })
            })
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(comments)
    }

    async fn delete_comment(&self, id: Uuid) -> RepoResult<()> {
        let mut store = self.write().await;
        if !store.comments.iter().any(|c| c.id == id) {
            return Err(RepoError::NotFound);
        }
        store.remove_comments(|c| c.id == id);
        Ok(())
    }

    async fn existing_tables(&self) -> RepoResult<Vec<String>> {
        let _store = self.read().await;
        Ok(TABLES.iter().map(|t| t.to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str, slug: &str) -> TermDraft {
        TermDraft {
            name: name.to_string(),
            slug: slug.to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn timestamps_are_strictly_increasing() {
        let repo = MemoryRepository::new();
        let a = repo.create_user("a1", "h", "user").await.unwrap();
        let b = repo.create_user("b2", "h", "user").await.unwrap();
        assert!(b.created_at > a.created_at);
    }

    #[tokio::test]
    async fn deleting_root_comment_removes_replies() {
        let repo = MemoryRepository::new();
        let author = repo.create_user("writer", "h", ROLE_ADMIN).await.unwrap();
        let post = repo
            .create_post(
                author.id,
                NewPost {
                    title: "T".into(),
                    slug: "t".into(),
                    content: "c".into(),
                    published: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let root = repo
            .create_comment(NewComment {
                post_id: post.id,
                author_id: author.id,
                parent_id: None,
                content: "root".into(),
            })
            .await
            .unwrap();
        repo.create_comment(NewComment {
            post_id: post.id,
            author_id: author.id,
            parent_id: Some(root.id),
            content: "reply".into(),
        })
        .await
        .unwrap();

        repo.delete_comment(root.id).await.unwrap();
        assert!(repo.list_all_comments().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn tag_names_are_unique() {
        let repo = MemoryRepository::new();
        repo.create_tag(draft("Rust", "rust")).await.unwrap();
        let err = repo.create_tag(draft("Rust", "rust-2")).await.unwrap_err();
        assert!(matches!(err, RepoError::Conflict(_)));
    }

    #[tokio::test]
    async fn renaming_missing_tag_is_not_found_even_on_clash() {
        let repo = MemoryRepository::new();
        repo.create_tag(draft("Rust", "rust")).await.unwrap();
        let err = repo
            .update_tag(Uuid::new_v4(), draft("Rust", "rust"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::NotFound));
    }

    #[tokio::test]
    async fn cleared_post_fields_become_null() {
        let repo = MemoryRepository::new();
        let author = repo.create_user("writer", "h", ROLE_ADMIN).await.unwrap();
        let post = repo
            .create_post(
                author.id,
                NewPost {
                    title: "T".into(),
                    slug: "t".into(),
                    content: "c".into(),
                    excerpt: Some("old".into()),
                    cover_image: Some("cover.png".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let kept = repo
            .update_post(post.id, PostChanges::default())
            .await
            .unwrap();
        assert_eq!(kept.excerpt.as_deref(), Some("old"));

        let cleared = repo
            .update_post(
                post.id,
                PostChanges {
                    excerpt: Some(None),
                    cover_image: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(cleared.excerpt, None);
        assert_eq!(cleared.cover_image, None);
    }

    #[tokio::test]
    async fn unknown_term_ids_are_rejected() {
        let repo = MemoryRepository::new();
        let author = repo.create_user("writer", "h", ROLE_ADMIN).await.unwrap();
        let err = repo
            .create_post(
                author.id,
                NewPost {
                    title: "T".into(),
                    slug: "t".into(),
                    content: "c".into(),
                    tag_ids: vec![Uuid::new_v4()],
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::InvalidReference(_)));
    }
}
