//! Follow-relation resolution.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::application::repos::{FollowsRepo, RepoError};

/// Resolves the follow graph around a user. Pure reads; the write paths live
/// on [`crate::application::feed::FeedService`].
#[derive(Clone)]
pub struct RelationResolver {
    follows: Arc<dyn FollowsRepo>,
}

impl RelationResolver {
    pub fn new(follows: Arc<dyn FollowsRepo>) -> Self {
        Self { follows }
    }

    /// Every author `user` has an active follow edge to.
    pub async fn followed_authors(&self, user: &str) -> Result<BTreeSet<String>, RepoError> {
        self.follows.followed_authors(user).await
    }

    pub async fn is_following(&self, user: &str, author: &str) -> Result<bool, RepoError> {
        self.follows.is_following(user, author).await
    }
}
