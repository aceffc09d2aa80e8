use std::sync::Arc;

use axum::{
    Form, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, Uri},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;

use crate::{
    application::{
        error::HttpError,
        feed::{FeedError, FeedService, PostDraft},
        pagination::{paginate, parse_page_param},
    },
    config::AuthSettings,
    domain::entities::PostRecord,
    infra::db::PostgresRepositories,
    presentation::views::{
        FollowTemplate, GroupOption, GroupTemplate, IndexTemplate, PostDetailTemplate,
        PostFormTemplate, ProfileTemplate, render_not_found_response, render_server_error_response,
        render_template_response, timeline_view,
    },
};

use super::{
    auth::{current_user, require_user},
    db_health_response,
    middleware::{log_responses, set_request_context},
    ops, redirect_found,
};

#[derive(Clone)]
pub struct HttpState {
    pub feed: Arc<FeedService>,
    pub db: Option<Arc<PostgresRepositories>>,
    pub auth: AuthSettings,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/new/", get(post_create_form).post(post_create))
        .route("/follow/", get(follow_index))
        .route("/group/{slug}/", get(group_index))
        .route("/_health/db", get(db_health))
        .route("/_ops/groups/", post(ops::create_group))
        .route("/_ops/cache/clear/", post(ops::clear_cache))
        .route("/{username}/", get(profile))
        .route("/{username}/follow/", get(profile_follow))
        .route("/{username}/unfollow/", get(profile_unfollow))
        .route("/{username}/{post_id}/", get(post_detail))
        .route(
            "/{username}/{post_id}/edit/",
            get(post_edit_form).post(post_edit),
        )
        .route("/{username}/{post_id}/comment/", post(add_comment))
        .fallback(fallback)
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PageQuery {
    page: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PostForm {
    text: String,
    #[serde(default)]
    group: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommentForm {
    text: String,
}

impl PostForm {
    fn group_slug(&self) -> Option<&str> {
        self.group.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    fn draft(&self) -> PostDraft {
        PostDraft {
            text: self.text.clone(),
            group_slug: self.group_slug().map(str::to_string),
            image: None,
        }
    }
}

fn feed_error_to_response(err: FeedError) -> Response {
    match err {
        FeedError::NotFound { .. } => render_not_found_response(),
        FeedError::Repo(repo_err) => render_server_error_response(repo_err.to_string()),
        other => HttpError::from(other).into_response(),
    }
}

fn post_url(username: &str, post_id: i64) -> String {
    format!("/{username}/{post_id}/")
}

fn profile_url(username: &str) -> String {
    format!("/{username}/")
}

/// Path post ids are parsed by hand so that non-numeric ids render the 404
/// page instead of an extractor rejection.
fn parse_post_id(raw: &str) -> Option<i64> {
    raw.parse::<i64>().ok().filter(|id| *id > 0)
}

async fn index(State(state): State<HttpState>, Query(query): Query<PageQuery>) -> Response {
    let number = parse_page_param(query.page.as_deref());
    match state.feed.global_timeline_page(number).await {
        Ok(page) => {
            let (posts, pagination) = timeline_view(page);
            render_template_response(IndexTemplate { posts, pagination }, StatusCode::OK)
        }
        Err(err) => feed_error_to_response(err),
    }
}

async fn group_index(
    State(state): State<HttpState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Response {
    match state.feed.group_timeline(&slug).await {
        Ok((group, posts)) => {
            let page = page_of(posts, &state, &query);
            let (posts, pagination) = timeline_view(page);
            render_template_response(
                GroupTemplate {
                    group: group.into(),
                    posts,
                    pagination,
                },
                StatusCode::OK,
            )
        }
        Err(err) => feed_error_to_response(err),
    }
}

async fn profile(
    State(state): State<HttpState>,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
    headers: HeaderMap,
) -> Response {
    let (author, posts) = match state.feed.author_timeline(&username).await {
        Ok(found) => found,
        Err(err) => return feed_error_to_response(err),
    };

    let viewer = current_user(&headers, &state.auth);
    let viewer_is_author = viewer.as_deref() == Some(author.username.as_str());
    let show_follow_controls = viewer.is_some() && !viewer_is_author;
    let is_following = match viewer.as_deref() {
        Some(viewer) if show_follow_controls => {
            match state.feed.relations().is_following(viewer, &username).await {
                Ok(following) => following,
                Err(err) => return render_server_error_response(err.to_string()),
            }
        }
        _ => false,
    };

    let post_count = posts.len();
    let page = page_of(posts, &state, &query);
    let (posts, pagination) = timeline_view(page);
    render_template_response(
        ProfileTemplate {
            username: author.username,
            post_count,
            viewer_is_author,
            show_follow_controls,
            is_following,
            posts,
            pagination,
        },
        StatusCode::OK,
    )
}

async fn follow_index(
    State(state): State<HttpState>,
    Query(query): Query<PageQuery>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    let viewer = match require_user(&headers, &state.auth, &uri) {
        Ok(viewer) => viewer,
        Err(redirect) => return redirect,
    };

    match state.feed.followed_timeline(&viewer).await {
        Ok(posts) => {
            let page = page_of(posts, &state, &query);
            let (posts, pagination) = timeline_view(page);
            render_template_response(FollowTemplate { posts, pagination }, StatusCode::OK)
        }
        Err(err) => feed_error_to_response(err),
    }
}

async fn post_detail(
    State(state): State<HttpState>,
    Path((username, post_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    let Some(post_id) = parse_post_id(&post_id) else {
        return render_not_found_response();
    };

    match state.feed.post_detail(&username, post_id).await {
        Ok((post, comments)) => {
            let viewer = current_user(&headers, &state.auth);
            let can_edit = viewer.as_deref() == Some(post.author_username.as_str());
            render_template_response(
                PostDetailTemplate {
                    post: post.into(),
                    comments: comments.into_iter().map(Into::into).collect(),
                    can_edit,
                    can_comment: viewer.is_some(),
                },
                StatusCode::OK,
            )
        }
        Err(err) => feed_error_to_response(err),
    }
}

async fn post_create_form(
    State(state): State<HttpState>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    if let Err(redirect) = require_user(&headers, &state.auth, &uri) {
        return redirect;
    }

    match group_options(&state.feed, None).await {
        Ok(groups) => render_template_response(
            PostFormTemplate {
                heading: "New post",
                action: "/new/".to_string(),
                text: String::new(),
                groups,
                error: None,
            },
            StatusCode::OK,
        ),
        Err(err) => feed_error_to_response(err),
    }
}

async fn post_create(
    State(state): State<HttpState>,
    headers: HeaderMap,
    uri: Uri,
    Form(form): Form<PostForm>,
) -> Response {
    let viewer = match require_user(&headers, &state.auth, &uri) {
        Ok(viewer) => viewer,
        Err(redirect) => return redirect,
    };

    match state.feed.create_post(&viewer, form.draft()).await {
        Ok(_) => redirect_found("/"),
        Err(FeedError::Validation(message)) => {
            rerender_post_form(&state, "New post", "/new/".to_string(), &form, message).await
        }
        Err(err) => feed_error_to_response(err),
    }
}

async fn post_edit_form(
    State(state): State<HttpState>,
    Path((username, post_id)): Path<(String, String)>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    let viewer = match require_user(&headers, &state.auth, &uri) {
        Ok(viewer) => viewer,
        Err(redirect) => return redirect,
    };
    let Some(post_id) = parse_post_id(&post_id) else {
        return render_not_found_response();
    };

    let (post, _) = match state.feed.post_detail(&username, post_id).await {
        Ok(found) => found,
        Err(err) => return feed_error_to_response(err),
    };

    // Non-authors are bounced to the post instead of seeing the form.
    if post.author_username != viewer {
        return redirect_found(&post_url(&username, post_id));
    }

    match group_options(&state.feed, post.group_slug.as_deref()).await {
        Ok(groups) => render_template_response(
            PostFormTemplate {
                heading: "Edit post",
                action: format!("/{username}/{post_id}/edit/"),
                text: post.text,
                groups,
                error: None,
            },
            StatusCode::OK,
        ),
        Err(err) => feed_error_to_response(err),
    }
}

async fn post_edit(
    State(state): State<HttpState>,
    Path((username, post_id)): Path<(String, String)>,
    headers: HeaderMap,
    uri: Uri,
    Form(form): Form<PostForm>,
) -> Response {
    let viewer = match require_user(&headers, &state.auth, &uri) {
        Ok(viewer) => viewer,
        Err(redirect) => return redirect,
    };
    let Some(post_id) = parse_post_id(&post_id) else {
        return render_not_found_response();
    };

    match state
        .feed
        .edit_post(&viewer, &username, post_id, form.draft())
        .await
    {
        Ok(post) => redirect_found(&post_url(&post.author_username, post.id)),
        Err(FeedError::Forbidden) => redirect_found(&post_url(&username, post_id)),
        Err(FeedError::Validation(message)) => {
            rerender_post_form(
                &state,
                "Edit post",
                format!("/{username}/{post_id}/edit/"),
                &form,
                message,
            )
            .await
        }
        Err(err) => feed_error_to_response(err),
    }
}

async fn add_comment(
    State(state): State<HttpState>,
    Path((username, post_id)): Path<(String, String)>,
    headers: HeaderMap,
    uri: Uri,
    Form(form): Form<CommentForm>,
) -> Response {
    let viewer = match require_user(&headers, &state.auth, &uri) {
        Ok(viewer) => viewer,
        Err(redirect) => return redirect,
    };
    let Some(post_id) = parse_post_id(&post_id) else {
        return render_not_found_response();
    };

    match state
        .feed
        .add_comment(&viewer, &username, post_id, &form.text)
        .await
    {
        // An empty comment is dropped silently; either way the caller lands
        // back on the post.
        Ok(_) | Err(FeedError::Validation(_)) => {
            redirect_found(&post_url(&username, post_id))
        }
        Err(err) => feed_error_to_response(err),
    }
}

async fn profile_follow(
    State(state): State<HttpState>,
    Path(username): Path<String>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    let viewer = match require_user(&headers, &state.auth, &uri) {
        Ok(viewer) => viewer,
        Err(redirect) => return redirect,
    };

    match state.feed.follow(&viewer, &username).await {
        // A self-follow is silently ignored.
        Ok(()) | Err(FeedError::SelfFollow) => redirect_found(&profile_url(&username)),
        Err(err) => feed_error_to_response(err),
    }
}

async fn profile_unfollow(
    State(state): State<HttpState>,
    Path(username): Path<String>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    let viewer = match require_user(&headers, &state.auth, &uri) {
        Ok(viewer) => viewer,
        Err(redirect) => return redirect,
    };

    match state.feed.unfollow(&viewer, &username).await {
        // Unfollowing an absent edge is not user-visible.
        Ok(()) | Err(FeedError::NotFound { .. }) => redirect_found(&profile_url(&username)),
        Err(err) => feed_error_to_response(err),
    }
}

async fn db_health(State(state): State<HttpState>) -> Response {
    match &state.db {
        Some(db) => db_health_response(db.health_check().await),
        None => StatusCode::OK.into_response(),
    }
}

async fn fallback() -> Response {
    render_not_found_response()
}

fn page_of(posts: Vec<PostRecord>, state: &HttpState, query: &PageQuery) -> crate::application::pagination::Page<PostRecord> {
    paginate(
        posts,
        state.feed.page_size(),
        parse_page_param(query.page.as_deref()),
    )
}

async fn group_options(
    feed: &FeedService,
    selected: Option<&str>,
) -> Result<Vec<GroupOption>, FeedError> {
    Ok(feed
        .list_groups()
        .await?
        .into_iter()
        .map(|group| GroupOption {
            selected: selected == Some(group.slug.as_str()),
            slug: group.slug,
            title: group.title,
        })
        .collect())
}

async fn rerender_post_form(
    state: &HttpState,
    heading: &'static str,
    action: String,
    form: &PostForm,
    error: String,
) -> Response {
    match group_options(&state.feed, form.group_slug()).await {
        Ok(groups) => render_template_response(
            PostFormTemplate {
                heading,
                action,
                text: form.text.clone(),
                groups,
                error: Some(error),
            },
            StatusCode::OK,
        ),
        Err(err) => feed_error_to_response(err),
    }
}
