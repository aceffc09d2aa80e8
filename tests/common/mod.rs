#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, Response, StatusCode, header::CONTENT_TYPE},
};
use http_body_util::BodyExt;
use rookery::application::feed::FeedService;
use rookery::cache::{TimelineCache, TimelineCacheConfig};
use rookery::config::AuthSettings;
use rookery::infra::http::{HttpState, build_router};
use rookery::infra::memory::InMemoryRepositories;
use tower::ServiceExt;

pub const USER_HEADER: &str = "x-rookery-user";
pub const PAGE_SIZE: u32 = 10;

pub fn timeline_cache(ttl_seconds: u64) -> Arc<TimelineCache> {
    Arc::new(TimelineCache::new(&TimelineCacheConfig {
        enabled: true,
        ttl_seconds,
        page_limit: 64,
    }))
}

pub fn feed_service(cache: Option<Arc<TimelineCache>>) -> Arc<FeedService> {
    let repos = Arc::new(InMemoryRepositories::new());
    Arc::new(FeedService::new(
        repos.clone(),
        repos.clone(),
        repos.clone(),
        repos.clone(),
        repos,
        cache,
        PAGE_SIZE,
    ))
}

pub fn router(feed: Arc<FeedService>) -> Router {
    build_router(HttpState {
        feed,
        db: None,
        auth: AuthSettings {
            header_name: USER_HEADER.to_string(),
            login_url: "/auth/login/".to_string(),
        },
    })
}

pub async fn get(app: &Router, path: &str) -> Response<axum::body::Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(path)
        .body(Body::empty())
        .expect("request");
    app.clone().oneshot(request).await.expect("response")
}

pub async fn get_as(app: &Router, path: &str, user: &str) -> Response<axum::body::Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(path)
        .header(USER_HEADER, user)
        .body(Body::empty())
        .expect("request");
    app.clone().oneshot(request).await.expect("response")
}

pub async fn post_form(
    app: &Router,
    path: &str,
    user: Option<&str>,
    body: &str,
) -> Response<axum::body::Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(user) = user {
        builder = builder.header(USER_HEADER, user);
    }
    let request = builder.body(Body::from(body.to_string())).expect("request");
    app.clone().oneshot(request).await.expect("response")
}

pub async fn post_json(app: &Router, path: &str, body: &str) -> Response<axum::body::Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request");
    app.clone().oneshot(request).await.expect("response")
}

pub async fn body_text(response: Response<axum::body::Body>) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

pub fn location_of(response: &Response<axum::body::Body>) -> String {
    assert_eq!(response.status(), StatusCode::FOUND);
    response
        .headers()
        .get("location")
        .expect("location header")
        .to_str()
        .expect("ascii location")
        .to_string()
}
