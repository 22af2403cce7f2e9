//! Starter content for a fresh install: the blog owner, a reader account, a
//! small taxonomy and a handful of published posts.
//!
//! Seeding is idempotent. Rows are matched by name (users) or slug (terms and
//! posts), and anything already present is left as it is.

use std::collections::HashMap;

use thiserror::Error;
use uuid::Uuid;

use crate::{
    auth::hash_password,
    error::ApiError,
    repository::{NewComment, NewPost, ROLE_ADMIN, ROLE_USER, RepoError, Repository, TermDraft},
};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("could not hash a seed password: {0}")]
    Hash(ApiError),
}

/// Account to create when missing.
#[derive(Debug, Clone)]
pub struct SeedAccount {
    pub name: String,
    pub password: String,
}

/// What a run actually inserted.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub users: usize,
    pub categories: usize,
    pub tags: usize,
    pub posts: usize,
    pub comments: usize,
}

struct SamplePost {
    title: &'static str,
    slug: &'static str,
    excerpt: &'static str,
    content: &'static str,
    category: &'static str,
    tags: &'static [&'static str],
}

const CATEGORIES: [(&str, &str, &str); 3] = [
    ("React", "react-learning", "Articles about the React framework"),
    ("Frontend Engineering", "frontend-engineering", "Tooling and build practice"),
    ("Networking", "network-basics", "Computer networking fundamentals"),
];

const TAGS: [(&str, &str); 7] = [
    ("React", "react"),
    ("Vue3", "vue3"),
    ("Next.js", "nextjs"),
    ("TypeScript", "typescript"),
    ("Frontend Engineering", "frontend-engineering"),
    ("Networking", "network-basics"),
    ("Vanilla JS", "vanilla-js"),
];

const POSTS: [SamplePost; 4] = [
    SamplePost {
        title: "Learning React through hooks (part 1)",
        slug: "learning-react-from-hooks-part-1",
        excerpt: "Start with useState and useEffect and let the rest of React follow.",
        content: "# Learning React through hooks\n\n\
            Hooks are a good entry point into React: state, effects and reuse all \
            show up in a handful of functions.\n\n\
            ## useState\n\n\
            ```tsx\nconst [count, setCount] = useState(0);\n```\n\n\
            ## useEffect\n\n\
            Effects run after render. Keep the dependency array honest.\n",
        category: "react-learning",
        tags: &["react", "typescript"],
    },
    SamplePost {
        title: "Understanding HTTP",
        slug: "understanding-http-protocol",
        excerpt: "Requests, methods, status codes and what HTTPS adds on top.",
        content: "# Understanding HTTP\n\n\
            HTTP is a stateless request/response protocol.\n\n\
            ## Methods\n\n\
            `GET` reads, `POST` creates, `PUT` replaces, `DELETE` removes.\n\n\
            ## Status codes\n\n\
            2xx success, 3xx redirects, 4xx client errors, 5xx server errors.\n",
        category: "network-basics",
        tags: &["network-basics"],
    },
    SamplePost {
        title: "Modern frontend build tools",
        slug: "modern-frontend-build-tools",
        excerpt: "Webpack and Vite compared, and when to reach for each.",
        content: "# Modern frontend build tools\n\n\
            Webpack bundles everything up front. Vite serves native ES modules in \
            development and bundles with Rollup for production.\n",
        category: "frontend-engineering",
        tags: &["frontend-engineering", "nextjs"],
    },
    SamplePost {
        title: "TypeScript best practices",
        slug: "typescript-best-practices",
        excerpt: "Types, interfaces and habits that keep a codebase honest.",
        content: "# TypeScript best practices\n\n\
            Turn on `strict`. Prefer unions over enums. Let inference do the work \
            inside functions and annotate the boundaries.\n",
        category: "react-learning",
        tags: &["typescript", "react"],
    },
];

const COMMENTS: [(&str, bool); 2] = [
    ("Great write-up, hooks finally make sense to me.", false),
    ("Thanks! The effect dependency array trips everyone up at first.", true),
];

/// run
///
/// Seeds `repo`. `admin` becomes the site author; `reader` comments on the
/// first post the first time it is created.
pub async fn run(
    repo: &dyn Repository,
    admin: &SeedAccount,
    reader: &SeedAccount,
    bcrypt_cost: u32,
) -> Result<SeedReport, SeedError> {
    let mut report = SeedReport::default();

    let admin_id = ensure_user(repo, admin, ROLE_ADMIN, bcrypt_cost, &mut report).await?;
    let reader_id = ensure_user(repo, reader, ROLE_USER, bcrypt_cost, &mut report).await?;

    let mut categories: HashMap<String, Uuid> = repo
        .list_categories(false)
        .await?
        .into_iter()
        .map(|c| (c.slug, c.id))
        .collect();
    for (name, slug, description) in CATEGORIES {
        if categories.contains_key(slug) {
            continue;
        }
        let created = repo
            .create_category(TermDraft {
                name: name.to_string(),
                slug: slug.to_string(),
                description: Some(description.to_string()),
            })
            .await?;
        categories.insert(created.slug, created.id);
        report.categories += 1;
    }

    let mut tags: HashMap<String, Uuid> = repo
        .list_tags(false)
        .await?
        .into_iter()
        .map(|t| (t.slug, t.id))
        .collect();
    for (name, slug) in TAGS {
        if tags.contains_key(slug) {
            continue;
        }
        let created = repo
            .create_tag(TermDraft {
                name: name.to_string(),
                slug: slug.to_string(),
                description: None,
            })
            .await?;
        tags.insert(created.slug, created.id);
        report.tags += 1;
    }

    let existing: Vec<String> = repo
        .list_all_posts()
        .await?
        .into_iter()
        .map(|p| p.slug)
        .collect();
    for (index, sample) in POSTS.iter().enumerate() {
        if existing.iter().any(|slug| slug == sample.slug) {
            continue;
        }
        let post = repo
            .create_post(
                admin_id,
                NewPost {
                    title: sample.title.to_string(),
                    slug: sample.slug.to_string(),
                    content: sample.content.to_string(),
                    excerpt: Some(sample.excerpt.to_string()),
                    cover_image: None,
                    published: true,
                    category_ids: categories.get(sample.category).copied().into_iter().collect(),
                    tag_ids: sample.tags.iter().filter_map(|t| tags.get(*t).copied()).collect(),
                },
            )
            .await?;
        report.posts += 1;

        if index == 0 {
            for (content, by_admin) in COMMENTS {
                repo.create_comment(NewComment {
                    post_id: post.id,
                    author_id: if by_admin { admin_id } else { reader_id },
                    parent_id: None,
                    content: content.to_string(),
                })
                .await?;
                report.comments += 1;
            }
        }
    }

    Ok(report)
}

/// Looks the account up by name and creates it with `role` when missing. An
/// existing account keeps its role and password.
async fn ensure_user(
    repo: &dyn Repository,
    account: &SeedAccount,
    role: &str,
    bcrypt_cost: u32,
    report: &mut SeedReport,
) -> Result<Uuid, SeedError> {
    if let Some(existing) = repo.find_credentials(&account.name).await? {
        tracing::info!(name = %existing.name, "seed account already exists");
        return Ok(existing.id);
    }
    let hash = hash_password(account.password.clone(), bcrypt_cost)
        .await
        .map_err(SeedError::Hash)?;
    let user = repo.create_user(&account.name, &hash, role).await?;
    tracing::info!(name = %user.name, role = %user.role, "seed account created");
    report.users += 1;
    Ok(user.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryRepository;

    fn account(name: &str, password: &str) -> SeedAccount {
        SeedAccount {
            name: name.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn fresh_store_gets_everything() {
        let repo = MemoryRepository::new();
        let report = run(&repo, &account("owner", "admin123"), &account("reader", "test123"), 4)
            .await
            .unwrap();

        assert_eq!(
            report,
            SeedReport {
                users: 2,
                categories: 3,
                tags: 7,
                posts: 4,
                comments: 2,
            }
        );

        let owner = repo.find_credentials("owner").await.unwrap().unwrap();
        assert_eq!(owner.role, ROLE_ADMIN);
        assert!(bcrypt::verify("admin123", &owner.password_hash).unwrap());

        let author = repo.find_site_author().await.unwrap().unwrap();
        assert_eq!(author.name, "owner");
        assert_eq!(repo.count_published_posts().await.unwrap(), 4);

        let first = repo
            .get_published_post("learning-react-from-hooks-part-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.categories[0].slug, "react-learning");
        assert_eq!(first.tags.len(), 2);
        assert_eq!(repo.list_comment_threads(first.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn second_run_inserts_nothing() {
        let repo = MemoryRepository::new();
        let admin = account("owner", "admin123");
        let reader = account("reader", "test123");
        run(&repo, &admin, &reader, 4).await.unwrap();

        let again = run(&repo, &admin, &reader, 4).await.unwrap();
        assert_eq!(again, SeedReport::default());
        assert_eq!(repo.list_all_comments().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn existing_accounts_keep_their_role() {
        let repo = MemoryRepository::new();
        repo.create_user("owner", "hash", ROLE_USER).await.unwrap();

        let report = run(&repo, &account("owner", "admin123"), &account("reader", "test123"), 4)
            .await
            .unwrap();
        assert_eq!(report.users, 1);

        let owner = repo.find_credentials("owner").await.unwrap().unwrap();
        assert_eq!(owner.role, ROLE_USER);
        assert_eq!(owner.password_hash, "hash");
    }
}
