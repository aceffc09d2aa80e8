//! Repository traits describing persistence adapters.
//!
//! The entity store is an external collaborator: anything satisfying these
//! traits (Postgres in production, the in-memory store for tests and demo
//! runs) can back the feed services.

use async_trait::async_trait;
use std::collections::BTreeSet;
use thiserror::Error;

use crate::domain::entities::{CommentRecord, GroupRecord, PostRecord, UserRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("integrity error: {message}")]
    Integrity { message: String },
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    pub fn duplicate(constraint: impl Into<String>) -> Self {
        Self::Duplicate {
            constraint: constraint.into(),
        }
    }

    pub fn integrity(message: impl Into<String>) -> Self {
        Self::Integrity {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateGroupParams {
    pub title: String,
    pub slug: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub author: String,
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

/// Mutable subset of a post. Identity (`pub_date`, author) is preserved by
/// every implementation.
#[derive(Debug, Clone)]
pub struct UpdatePostParams {
    pub id: i64,
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateCommentParams {
    pub post_id: i64,
    pub author: String,
    pub text: String,
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepoError>;

    /// Get-or-create the row for an externally authenticated username.
    async fn ensure(&self, username: &str) -> Result<UserRecord, RepoError>;
}

#[async_trait]
pub trait GroupsRepo: Send + Sync {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<GroupRecord>, RepoError>;

    async fn list_all(&self) -> Result<Vec<GroupRecord>, RepoError>;

    async fn create_group(&self, params: CreateGroupParams) -> Result<GroupRecord, RepoError>;
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// Every post in the global timeline ordering.
    async fn list_all(&self) -> Result<Vec<PostRecord>, RepoError>;

    async fn list_for_group(&self, group_id: i64) -> Result<Vec<PostRecord>, RepoError>;

    async fn list_for_author(&self, username: &str) -> Result<Vec<PostRecord>, RepoError>;

    /// Posts whose author is followed by `username`, merged into the global
    /// ordering. Implementations express this as one membership predicate
    /// over the follow relation, not a per-author fan-out.
    async fn list_for_followed(&self, username: &str) -> Result<Vec<PostRecord>, RepoError>;

    /// A post is addressed by the (author username, id) pair; an id under the
    /// wrong username does not resolve.
    async fn find_by_author_and_id(
        &self,
        username: &str,
        post_id: i64,
    ) -> Result<Option<PostRecord>, RepoError>;

    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError>;
}

#[async_trait]
pub trait CommentsRepo: Send + Sync {
    /// Comments for a post in creation order (oldest first).
    async fn list_for_post(&self, post_id: i64) -> Result<Vec<CommentRecord>, RepoError>;

    async fn create_comment(&self, params: CreateCommentParams) -> Result<CommentRecord, RepoError>;
}

#[async_trait]
pub trait FollowsRepo: Send + Sync {
    async fn followed_authors(&self, username: &str) -> Result<BTreeSet<String>, RepoError>;

    async fn is_following(&self, user: &str, author: &str) -> Result<bool, RepoError>;

    /// Idempotent: creating an existing edge is a no-op. Returns whether a
    /// new edge was created.
    async fn create_follow(&self, user: &str, author: &str) -> Result<bool, RepoError>;

    /// Returns whether an edge existed and was removed.
    async fn delete_follow(&self, user: &str, author: &str) -> Result<bool, RepoError>;
}
