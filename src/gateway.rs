use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::{auth::verify_token, config::AppConfig};

/// Where anonymous page visits are sent.
pub const LOGIN_PATH: &str = "/login";

/// True when `path` is one of the prefixes or lies beneath one (`/dashboard`,
/// `/dashboard/merchants`), but not a mere string prefix (`/dashboards`).
pub fn is_protected(path: &str, prefixes: &[String]) -> bool {
    prefixes.iter().any(|prefix| {
        path == prefix
            || path
                .strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    })
}

/// page_guard
///
/// Gateway filter for browser navigations. A request for a protected page without
/// a genuine session cookie is answered with 303 See Other to the login page.
/// Only the cookie counts here: a browser navigation never carries a Bearer header.
///
/// API routes are not matched by the page prefixes and keep answering 401 through
/// the `AuthUser` extractor.
pub async fn page_guard(
    State(config): State<AppConfig>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path();

    if is_protected(path, &config.protected_paths) {
        let has_session = CookieJar::from_headers(request.headers())
            .get(&config.auth_cookie_name)
            .and_then(|cookie| verify_token(&config.jwt_secret, cookie.value()))
            .is_some();

        if !has_session {
            tracing::debug!(%path, "redirecting anonymous page visit to login");
            return Redirect::to(LOGIN_PATH).into_response();
        }
    }

    next.run(request).await
}
