//! Trusted-header authentication.
//!
//! Session handling is external: an upstream proxy authenticates the caller
//! and forwards the username in a configured header. An absent header means
//! an anonymous request; auth-required routes redirect to the login URL
//! before performing any writes.

use axum::{
    http::{HeaderMap, Uri},
    response::Response,
};

use crate::config::AuthSettings;

use super::redirect_found;

/// The authenticated username, if the trusted header names one.
pub fn current_user(headers: &HeaderMap, auth: &AuthSettings) -> Option<String> {
    headers
        .get(auth.header_name.as_str())
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// The authenticated username, or a login redirect carrying the original
/// path in `?next=`.
pub fn require_user(
    headers: &HeaderMap,
    auth: &AuthSettings,
    uri: &Uri,
) -> Result<String, Response> {
    current_user(headers, auth)
        .ok_or_else(|| redirect_found(&format!("{}?next={}", auth.login_url, uri.path())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth_settings() -> AuthSettings {
        AuthSettings {
            header_name: "x-rookery-user".to_string(),
            login_url: "/auth/login/".to_string(),
        }
    }

    #[test]
    fn header_value_names_the_user() {
        let mut headers = HeaderMap::new();
        headers.insert("x-rookery-user", "leo".parse().unwrap());
        assert_eq!(
            current_user(&headers, &auth_settings()),
            Some("leo".to_string())
        );
    }

    #[test]
    fn blank_header_is_anonymous() {
        let mut headers = HeaderMap::new();
        headers.insert("x-rookery-user", "   ".parse().unwrap());
        assert_eq!(current_user(&headers, &auth_settings()), None);
        assert_eq!(current_user(&HeaderMap::new(), &auth_settings()), None);
    }
}
