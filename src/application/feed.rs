//! Feed assembly: timelines, post/comment writes, and follow edges.

use std::sync::Arc;

use slug::slugify;
use thiserror::Error;
use tracing::debug;

use crate::application::pagination::{Page, paginate};
use crate::application::relations::RelationResolver;
use crate::application::repos::{
    CommentsRepo, CreateCommentParams, CreateGroupParams, CreatePostParams, FollowsRepo,
    GroupsRepo, PostsRepo, RepoError, UpdatePostParams, UsersRepo,
};
use crate::cache::TimelineCache;
use crate::domain::entities::{CommentRecord, GroupRecord, PostRecord, UserRecord};
use crate::domain::error::DomainError;
use crate::domain::posts;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("`{entity}` not found")]
    NotFound { entity: &'static str },
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("only the author may edit a post")]
    Forbidden,
    #[error("a user cannot follow themselves")]
    SelfFollow,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl FeedError {
    fn not_found(entity: &'static str) -> Self {
        Self::NotFound { entity }
    }
}

impl From<DomainError> for FeedError {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::Validation { message } => FeedError::Validation(message),
        }
    }
}

/// Draft content for a new post or an edit of an existing one.
#[derive(Debug, Clone, Default)]
pub struct PostDraft {
    pub text: String,
    pub group_slug: Option<String>,
    pub image: Option<String>,
}

/// Assembles ordered post sequences and applies the write paths.
///
/// The timeline cache is an explicit collaborator of the global-timeline
/// path only; every other timeline is computed per request.
#[derive(Clone)]
pub struct FeedService {
    users: Arc<dyn UsersRepo>,
    groups: Arc<dyn GroupsRepo>,
    posts: Arc<dyn PostsRepo>,
    comments: Arc<dyn CommentsRepo>,
    follows: Arc<dyn FollowsRepo>,
    relations: RelationResolver,
    cache: Option<Arc<TimelineCache>>,
    page_size: u32,
}

impl FeedService {
    pub fn new(
        users: Arc<dyn UsersRepo>,
        groups: Arc<dyn GroupsRepo>,
        posts: Arc<dyn PostsRepo>,
        comments: Arc<dyn CommentsRepo>,
        follows: Arc<dyn FollowsRepo>,
        cache: Option<Arc<TimelineCache>>,
        page_size: u32,
    ) -> Self {
        let relations = RelationResolver::new(follows.clone());
        Self {
            users,
            groups,
            posts,
            comments,
            follows,
            relations,
            cache,
            page_size,
        }
    }

    pub fn relations(&self) -> &RelationResolver {
        &self.relations
    }

    pub fn cache(&self) -> Option<&Arc<TimelineCache>> {
        self.cache.as_ref()
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    // ------------------------------------------------------------------
    // Timelines
    // ------------------------------------------------------------------

    /// Every post, in the global ordering.
    pub async fn global_timeline(&self) -> Result<Vec<PostRecord>, FeedError> {
        Ok(self.posts.list_all().await?)
    }

    /// The cached global-timeline path: a fresh cached page short-circuits
    /// both the assembler and the paginator.
    pub async fn global_timeline_page(
        &self,
        page_number: u32,
    ) -> Result<Page<PostRecord>, FeedError> {
        if let Some(cache) = &self.cache {
            if let Some(page) = cache.get(page_number) {
                debug!(page_number, "global timeline served from cache");
                return Ok(page);
            }
        }

        let timeline = self.global_timeline().await?;
        let page = paginate(timeline, self.page_size, page_number);

        if let Some(cache) = &self.cache {
            cache.insert(page.number, page.clone());
            // An out-of-range request keeps its own key so a repeat of the
            // same stale link hits instead of recomputing.
            if page_number != page.number {
                cache.insert(page_number, page.clone());
            }
        }
        Ok(page)
    }

    pub async fn group_timeline(
        &self,
        slug: &str,
    ) -> Result<(GroupRecord, Vec<PostRecord>), FeedError> {
        let group = self
            .groups
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| FeedError::not_found("group"))?;
        let timeline = self.posts.list_for_group(group.id).await?;
        Ok((group, timeline))
    }

    pub async fn author_timeline(
        &self,
        username: &str,
    ) -> Result<(UserRecord, Vec<PostRecord>), FeedError> {
        let author = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| FeedError::not_found("user"))?;
        let timeline = self.posts.list_for_author(username).await?;
        Ok((author, timeline))
    }

    /// Posts from every followed author, merged into the global ordering.
    /// One membership predicate over the follow relation, never a
    /// per-author concatenation.
    pub async fn followed_timeline(&self, user: &str) -> Result<Vec<PostRecord>, FeedError> {
        Ok(self.posts.list_for_followed(user).await?)
    }

    pub async fn post_detail(
        &self,
        username: &str,
        post_id: i64,
    ) -> Result<(PostRecord, Vec<CommentRecord>), FeedError> {
        let post = self
            .posts
            .find_by_author_and_id(username, post_id)
            .await?
            .ok_or_else(|| FeedError::not_found("post"))?;
        let comments = self.comments.list_for_post(post.id).await?;
        Ok((post, comments))
    }

    // ------------------------------------------------------------------
    // Write paths
    // ------------------------------------------------------------------

    pub async fn create_post(&self, author: &str, draft: PostDraft) -> Result<PostRecord, FeedError> {
        posts::validate_text(&draft.text)?;
        let author = self.users.ensure(author).await?;
        let group_id = self.resolve_group(draft.group_slug.as_deref()).await?;

        let record = self
            .posts
            .create_post(CreatePostParams {
                author: author.username,
                text: draft.text,
                group_id,
                image: draft.image,
            })
            .await?;
        debug!(post_id = record.id, author = %record.author_username, "post created");
        Ok(record)
    }

    /// Identity (`pub_date`, author) is preserved; only the author may edit.
    pub async fn edit_post(
        &self,
        editor: &str,
        username: &str,
        post_id: i64,
        draft: PostDraft,
    ) -> Result<PostRecord, FeedError> {
        let post = self
            .posts
            .find_by_author_and_id(username, post_id)
            .await?
            .ok_or_else(|| FeedError::not_found("post"))?;

        if post.author_username != editor {
            return Err(FeedError::Forbidden);
        }

        posts::validate_text(&draft.text)?;
        let group_id = self.resolve_group(draft.group_slug.as_deref()).await?;

        Ok(self
            .posts
            .update_post(UpdatePostParams {
                id: post.id,
                text: draft.text,
                group_id,
                image: draft.image,
            })
            .await?)
    }

    pub async fn add_comment(
        &self,
        user: &str,
        username: &str,
        post_id: i64,
        text: &str,
    ) -> Result<CommentRecord, FeedError> {
        let post = self
            .posts
            .find_by_author_and_id(username, post_id)
            .await?
            .ok_or_else(|| FeedError::not_found("post"))?;

        posts::validate_text(text)?;
        let author = self.users.ensure(user).await?;

        Ok(self
            .comments
            .create_comment(CreateCommentParams {
                post_id: post.id,
                author: author.username,
                text: text.to_string(),
            })
            .await?)
    }

    /// Idempotent: an existing `(user, target)` edge is left as-is.
    pub async fn follow(&self, user: &str, target: &str) -> Result<(), FeedError> {
        if user == target {
            return Err(FeedError::SelfFollow);
        }
        self.users
            .find_by_username(target)
            .await?
            .ok_or_else(|| FeedError::not_found("user"))?;
        let user = self.users.ensure(user).await?;

        let created = self.follows.create_follow(&user.username, target).await?;
        debug!(user = %user.username, author = target, created, "follow edge requested");
        Ok(())
    }

    /// NotFound when no edge exists; callers decide whether that is
    /// user-visible (the HTTP layer swallows it and redirects).
    pub async fn unfollow(&self, user: &str, target: &str) -> Result<(), FeedError> {
        let removed = self.follows.delete_follow(user, target).await?;
        if removed {
            Ok(())
        } else {
            Err(FeedError::not_found("follow"))
        }
    }

    pub async fn list_groups(&self) -> Result<Vec<GroupRecord>, FeedError> {
        Ok(self.groups.list_all().await?)
    }

    /// Operational group creation. The slug is derived from the title when
    /// not supplied; a duplicate slug surfaces as a conflict.
    pub async fn create_group(
        &self,
        title: &str,
        slug: Option<&str>,
        description: &str,
    ) -> Result<GroupRecord, FeedError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(FeedError::Validation("title must not be empty".to_string()));
        }
        let slug = match slug.map(str::trim) {
            Some(slug) if !slug.is_empty() => slug.to_string(),
            _ => slugify(title),
        };

        Ok(self
            .groups
            .create_group(CreateGroupParams {
                title: title.to_string(),
                slug,
                description: description.trim().to_string(),
            })
            .await?)
    }

    async fn resolve_group(&self, slug: Option<&str>) -> Result<Option<i64>, FeedError> {
        match slug {
            None => Ok(None),
            Some(slug) => {
                let group = self
                    .groups
                    .find_by_slug(slug)
                    .await?
                    .ok_or_else(|| FeedError::not_found("group"))?;
                Ok(Some(group.id))
            }
        }
    }
}
