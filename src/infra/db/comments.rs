use async_trait::async_trait;
use sqlx::query_as;
use time::OffsetDateTime;

use crate::application::repos::{CommentsRepo, CreateCommentParams, RepoError};
use crate::domain::entities::CommentRecord;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: i64,
    post_id: i64,
    author_username: String,
    text: String,
    created: OffsetDateTime,
}

impl From<CommentRow> for CommentRecord {
    fn from(row: CommentRow) -> Self {
        CommentRecord {
            id: row.id,
            post_id: row.post_id,
            author_username: row.author_username,
            text: row.text,
            created: row.created,
        }
    }
}

#[async_trait]
impl CommentsRepo for PostgresRepositories {
    async fn list_for_post(&self, post_id: i64) -> Result<Vec<CommentRecord>, RepoError> {
        let rows: Vec<CommentRow> = query_as(
            "SELECT c.id, c.post_id, u.username AS author_username, c.text, c.created \
             FROM comments c \
             JOIN users u ON u.id = c.author_id \
             WHERE c.post_id = $1 \
             ORDER BY c.created ASC, c.id ASC",
        )
        .bind(post_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create_comment(&self, params: CreateCommentParams) -> Result<CommentRecord, RepoError> {
        let row: CommentRow = query_as(
            "WITH inserted AS ( \
                INSERT INTO comments (post_id, author_id, text) \
                SELECT $1, u.id, $3 FROM users u WHERE u.username = $2 \
                RETURNING id, post_id, author_id, text, created) \
             SELECT c.id, c.post_id, u.username AS author_username, c.text, c.created \
             FROM inserted c \
             JOIN users u ON u.id = c.author_id",
        )
        .bind(params.post_id)
        .bind(&params.author)
        .bind(&params.text)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.into())
    }
}
