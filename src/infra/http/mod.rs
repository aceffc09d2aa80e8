mod auth;
mod middleware;
mod ops;
mod public;

pub use auth::current_user;
pub use public::{HttpState, build_router};

use axum::http::{StatusCode, header::LOCATION};
use axum::response::{IntoResponse, Response};
use sqlx::Error as SqlxError;

use crate::application::error::ErrorReport;

/// 302 redirect. Form posts deliberately get FOUND rather than SEE OTHER so
/// the navigation behaves like a classic server-rendered app.
pub(crate) fn redirect_found(location: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location.to_string())]).into_response()
}

fn db_health_response(result: Result<(), SqlxError>) -> Response {
    match result {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}
