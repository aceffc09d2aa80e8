//! Network-restricted operational endpoints.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::info;

use crate::application::{error::HttpError, feed::FeedError};

use super::public::HttpState;

#[derive(Debug, Deserialize)]
pub struct CreateGroupBody {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
}

pub async fn create_group(
    State(state): State<HttpState>,
    Json(body): Json<CreateGroupBody>,
) -> Response {
    match state
        .feed
        .create_group(&body.title, body.slug.as_deref(), &body.description)
        .await
    {
        Ok(group) => {
            info!(slug = %group.slug, "group created");
            (StatusCode::CREATED, Json(group)).into_response()
        }
        Err(FeedError::Validation(message)) => HttpError::new(
            "infra::http::ops::create_group",
            StatusCode::UNPROCESSABLE_ENTITY,
            "Invalid group",
            message,
        )
        .into_response(),
        Err(err) => HttpError::from(err).into_response(),
    }
}

pub async fn clear_cache(State(state): State<HttpState>) -> Response {
    if let Some(cache) = state.feed.cache() {
        cache.clear();
        info!("timeline cache cleared");
    }
    StatusCode::NO_CONTENT.into_response()
}
