use async_trait::async_trait;
use sqlx::query_as;
use time::OffsetDateTime;

use crate::application::repos::{CreatePostParams, PostsRepo, RepoError, UpdatePostParams};
use crate::domain::entities::PostRecord;

use super::{PostgresRepositories, map_sqlx_error};

/// Shared projection: a post joined with its author and optional group.
const POST_SELECT: &str = "SELECT p.id, p.text, p.pub_date, p.image, \
        p.author_id, u.username AS author_username, \
        p.group_id, g.slug AS group_slug, g.title AS group_title \
     FROM posts p \
     JOIN users u ON u.id = p.author_id \
     LEFT JOIN groups g ON g.id = p.group_id";

const TIMELINE_ORDER: &str = " ORDER BY p.pub_date DESC, p.id ASC";

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    text: String,
    pub_date: OffsetDateTime,
    image: Option<String>,
    author_id: i64,
    author_username: String,
    group_id: Option<i64>,
    group_slug: Option<String>,
    group_title: Option<String>,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        PostRecord {
            id: row.id,
            text: row.text,
            pub_date: row.pub_date,
            author_id: row.author_id,
            author_username: row.author_username,
            group_id: row.group_id,
            group_slug: row.group_slug,
            group_title: row.group_title,
            image: row.image,
        }
    }
}

fn collect(rows: Vec<PostRow>) -> Vec<PostRecord> {
    rows.into_iter().map(Into::into).collect()
}

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn list_all(&self) -> Result<Vec<PostRecord>, RepoError> {
        let rows: Vec<PostRow> = query_as(&format!("{POST_SELECT}{TIMELINE_ORDER}"))
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(collect(rows))
    }

    async fn list_for_group(&self, group_id: i64) -> Result<Vec<PostRecord>, RepoError> {
        let rows: Vec<PostRow> =
            query_as(&format!("{POST_SELECT} WHERE p.group_id = $1{TIMELINE_ORDER}"))
                .bind(group_id)
                .fetch_all(self.pool())
                .await
                .map_err(map_sqlx_error)?;
        Ok(collect(rows))
    }

    async fn list_for_author(&self, username: &str) -> Result<Vec<PostRecord>, RepoError> {
        let rows: Vec<PostRow> =
            query_as(&format!("{POST_SELECT} WHERE u.username = $1{TIMELINE_ORDER}"))
                .bind(username)
                .fetch_all(self.pool())
                .await
                .map_err(map_sqlx_error)?;
        Ok(collect(rows))
    }

    async fn list_for_followed(&self, username: &str) -> Result<Vec<PostRecord>, RepoError> {
        // One membership predicate over the follow relation; the merge into
        // the global ordering falls out of the shared ORDER BY.
        let rows: Vec<PostRow> = query_as(&format!(
            "{POST_SELECT} WHERE p.author_id IN ( \
                SELECT f.author_id FROM follows f \
                JOIN users fu ON fu.id = f.user_id \
                WHERE fu.username = $1){TIMELINE_ORDER}"
        ))
        .bind(username)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(collect(rows))
    }

    async fn find_by_author_and_id(
        &self,
        username: &str,
        post_id: i64,
    ) -> Result<Option<PostRecord>, RepoError> {
        let row: Option<PostRow> =
            query_as(&format!("{POST_SELECT} WHERE u.username = $1 AND p.id = $2"))
                .bind(username)
                .bind(post_id)
                .fetch_optional(self.pool())
                .await
                .map_err(map_sqlx_error)?;
        Ok(row.map(Into::into))
    }

    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let row: PostRow = query_as(
            "WITH inserted AS ( \
                INSERT INTO posts (text, author_id, group_id, image) \
                SELECT $2, u.id, $3, $4 FROM users u WHERE u.username = $1 \
                RETURNING id, text, pub_date, image, author_id, group_id) \
             SELECT p.id, p.text, p.pub_date, p.image, \
                    p.author_id, u.username AS author_username, \
                    p.group_id, g.slug AS group_slug, g.title AS group_title \
             FROM inserted p \
             JOIN users u ON u.id = p.author_id \
             LEFT JOIN groups g ON g.id = p.group_id",
        )
        .bind(&params.author)
        .bind(&params.text)
        .bind(params.group_id)
        .bind(&params.image)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let row: PostRow = query_as(
            "WITH updated AS ( \
                UPDATE posts SET text = $2, group_id = $3, image = $4 \
                WHERE id = $1 \
                RETURNING id, text, pub_date, image, author_id, group_id) \
             SELECT p.id, p.text, p.pub_date, p.image, \
                    p.author_id, u.username AS author_username, \
                    p.group_id, g.slug AS group_slug, g.title AS group_title \
             FROM updated p \
             JOIN users u ON u.id = p.author_id \
             LEFT JOIN groups g ON g.id = p.group_id",
        )
        .bind(params.id)
        .bind(&params.text)
        .bind(params.group_id)
        .bind(&params.image)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.into())
    }
}
