use std::collections::BTreeSet;

use async_trait::async_trait;
use sqlx::{query, query_scalar};

use crate::application::repos::{FollowsRepo, RepoError};

use super::{PostgresRepositories, map_sqlx_error};

#[async_trait]
impl FollowsRepo for PostgresRepositories {
    async fn followed_authors(&self, username: &str) -> Result<BTreeSet<String>, RepoError> {
        let authors: Vec<String> = query_scalar(
            "SELECT au.username \
             FROM follows f \
             JOIN users u ON u.id = f.user_id \
             JOIN users au ON au.id = f.author_id \
             WHERE u.username = $1",
        )
        .bind(username)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(authors.into_iter().collect())
    }

    async fn is_following(&self, user: &str, author: &str) -> Result<bool, RepoError> {
        let exists: bool = query_scalar(
            "SELECT EXISTS ( \
                SELECT 1 FROM follows f \
                JOIN users u ON u.id = f.user_id \
                JOIN users au ON au.id = f.author_id \
                WHERE u.username = $1 AND au.username = $2)",
        )
        .bind(user)
        .bind(author)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(exists)
    }

    async fn create_follow(&self, user: &str, author: &str) -> Result<bool, RepoError> {
        // ON CONFLICT DO NOTHING makes repeated follows a no-op at the
        // unique (user_id, author_id) constraint.
        let result = query(
            "INSERT INTO follows (user_id, author_id) \
             SELECT u.id, au.id FROM users u, users au \
             WHERE u.username = $1 AND au.username = $2 \
             ON CONFLICT ON CONSTRAINT unique_follows DO NOTHING",
        )
        .bind(user)
        .bind(author)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_follow(&self, user: &str, author: &str) -> Result<bool, RepoError> {
        let result = query(
            "DELETE FROM follows f \
             USING users u, users au \
             WHERE f.user_id = u.id AND f.author_id = au.id \
               AND u.username = $1 AND au.username = $2",
        )
        .bind(user)
        .bind(author)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }
}
