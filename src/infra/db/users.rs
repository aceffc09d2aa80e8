use async_trait::async_trait;
use sqlx::query_as;

use crate::application::repos::{RepoError, UsersRepo};
use crate::domain::entities::UserRecord;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        UserRecord {
            id: row.id,
            username: row.username,
        }
    }
}

#[async_trait]
impl UsersRepo for PostgresRepositories {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepoError> {
        let row: Option<UserRow> =
            query_as("SELECT id, username FROM users WHERE username = $1")
                .bind(username)
                .fetch_optional(self.pool())
                .await
                .map_err(map_sqlx_error)?;
        Ok(row.map(Into::into))
    }

    async fn ensure(&self, username: &str) -> Result<UserRecord, RepoError> {
        // Upsert so concurrent first requests for the same principal agree
        // on one row.
        let row: UserRow = query_as(
            "INSERT INTO users (username) VALUES ($1) \
             ON CONFLICT (username) DO UPDATE SET username = EXCLUDED.username \
             RETURNING id, username",
        )
        .bind(username)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.into())
    }
}
