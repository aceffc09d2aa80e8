use async_trait::async_trait;
use sqlx::query_as;

use crate::application::repos::{CreateGroupParams, GroupsRepo, RepoError};
use crate::domain::entities::GroupRecord;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct GroupRow {
    id: i64,
    title: String,
    slug: String,
    description: String,
}

impl From<GroupRow> for GroupRecord {
    fn from(row: GroupRow) -> Self {
        GroupRecord {
            id: row.id,
            title: row.title,
            slug: row.slug,
            description: row.description,
        }
    }
}

#[async_trait]
impl GroupsRepo for PostgresRepositories {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<GroupRecord>, RepoError> {
        let row: Option<GroupRow> =
            query_as("SELECT id, title, slug, description FROM groups WHERE slug = $1")
                .bind(slug)
                .fetch_optional(self.pool())
                .await
                .map_err(map_sqlx_error)?;
        Ok(row.map(Into::into))
    }

    async fn list_all(&self) -> Result<Vec<GroupRecord>, RepoError> {
        let rows: Vec<GroupRow> =
            query_as("SELECT id, title, slug, description FROM groups ORDER BY title ASC")
                .fetch_all(self.pool())
                .await
                .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create_group(&self, params: CreateGroupParams) -> Result<GroupRecord, RepoError> {
        let row: GroupRow = query_as(
            "INSERT INTO groups (title, slug, description) VALUES ($1, $2, $3) \
             RETURNING id, title, slug, description",
        )
        .bind(&params.title)
        .bind(&params.slug)
        .bind(&params.description)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.into())
    }
}
