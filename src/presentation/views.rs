use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::application::error::{ErrorReport, HttpError};
use crate::application::pagination::Page;
use crate::domain::entities::{CommentRecord, GroupRecord, PostRecord};
use crate::domain::posts::format_human_date;

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn render_not_found_response() -> Response {
    let mut response = render_template_response(NotFoundTemplate {}, StatusCode::NOT_FOUND);
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        "Resource not found",
    )
    .attach(&mut response);
    response
}

pub fn render_server_error_response(detail: impl Into<String>) -> Response {
    let mut response =
        render_template_response(ServerErrorTemplate {}, StatusCode::INTERNAL_SERVER_ERROR);
    ErrorReport::from_message(
        "presentation::views::render_server_error_response",
        StatusCode::INTERNAL_SERVER_ERROR,
        detail,
    )
    .attach(&mut response);
    response
}

#[derive(Clone)]
pub struct PostCard {
    pub id: i64,
    pub author_username: String,
    pub text: String,
    pub published: String,
    pub group_slug: Option<String>,
    pub group_title: Option<String>,
    pub image: Option<String>,
}

impl From<PostRecord> for PostCard {
    fn from(post: PostRecord) -> Self {
        PostCard {
            id: post.id,
            author_username: post.author_username,
            text: post.text,
            published: format_human_date(post.pub_date),
            group_slug: post.group_slug,
            group_title: post.group_title,
            image: post.image,
        }
    }
}

impl PostCard {
    pub fn detail_url(&self) -> String {
        format!("/{}/{}/", self.author_username, self.id)
    }

    pub fn author_url(&self) -> String {
        format!("/{}/", self.author_username)
    }
}

#[derive(Clone)]
pub struct CommentView {
    pub author_username: String,
    pub text: String,
    pub created: String,
}

impl From<CommentRecord> for CommentView {
    fn from(comment: CommentRecord) -> Self {
        CommentView {
            author_username: comment.author_username,
            text: comment.text,
            created: format_human_date(comment.created),
        }
    }
}

/// Page-navigation strip shared by every timeline template.
#[derive(Clone)]
pub struct PaginationView {
    pub number: u32,
    pub total_pages: u32,
    pub has_previous: bool,
    pub has_next: bool,
}

impl PaginationView {
    pub fn previous_number(&self) -> u32 {
        self.number.saturating_sub(1).max(1)
    }

    pub fn next_number(&self) -> u32 {
        (self.number + 1).min(self.total_pages)
    }
}

/// Splits a timeline page into cards plus the navigation strip.
pub fn timeline_view(page: Page<PostRecord>) -> (Vec<PostCard>, PaginationView) {
    let pagination = PaginationView {
        number: page.number,
        total_pages: page.total_pages,
        has_previous: page.has_previous,
        has_next: page.has_next,
    };
    let cards = page.items.into_iter().map(Into::into).collect();
    (cards, pagination)
}

pub struct GroupView {
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl From<GroupRecord> for GroupView {
    fn from(group: GroupRecord) -> Self {
        GroupView {
            title: group.title,
            slug: group.slug,
            description: group.description,
        }
    }
}

#[derive(Clone)]
pub struct GroupOption {
    pub slug: String,
    pub title: String,
    pub selected: bool,
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub posts: Vec<PostCard>,
    pub pagination: PaginationView,
}

#[derive(Template)]
#[template(path = "group.html")]
pub struct GroupTemplate {
    pub group: GroupView,
    pub posts: Vec<PostCard>,
    pub pagination: PaginationView,
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub username: String,
    pub post_count: usize,
    pub viewer_is_author: bool,
    pub show_follow_controls: bool,
    pub is_following: bool,
    pub posts: Vec<PostCard>,
    pub pagination: PaginationView,
}

#[derive(Template)]
#[template(path = "post.html")]
pub struct PostDetailTemplate {
    pub post: PostCard,
    pub comments: Vec<CommentView>,
    pub can_edit: bool,
    pub can_comment: bool,
}

#[derive(Template)]
#[template(path = "follow.html")]
pub struct FollowTemplate {
    pub posts: Vec<PostCard>,
    pub pagination: PaginationView,
}

#[derive(Template)]
#[template(path = "post_form.html")]
pub struct PostFormTemplate {
    pub heading: &'static str,
    pub action: String,
    pub text: String,
    pub groups: Vec<GroupOption>,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {}

#[derive(Template)]
#[template(path = "server_error.html")]
pub struct ServerErrorTemplate {}
