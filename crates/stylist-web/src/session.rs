//! Session cookie handling.
//!
//! A request with a known `stylist_session` cookie is bound to that session
//! before it reaches a handler. Without one, only the page and the form posts
//! start a new session (and the response carries the cookie); report
//! downloads stay unbound.

use axum::{
    extract::{Request, State},
    http::{
        header::{COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue, Method,
    },
    middleware::Next,
    response::Response,
};
use stylist_core::SessionId;

use crate::state::AppState;

pub const SESSION_COOKIE: &str = "stylist_session";

/// The session the current request belongs to.
#[derive(Debug, Clone, Copy)]
pub struct CurrentSession(pub SessionId);

/// Middleware: resolve or start the session and expose it as an extension.
pub async fn ensure_session(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let presented = cookie_value(request.headers(), SESSION_COOKIE)
        .and_then(|value| value.parse::<SessionId>().ok());
    let known = state.sessions.touch(presented).await;
    let created = match known {
        None if starts_session(request.method(), request.uri().path()) => {
            Some(state.sessions.create().await)
        }
        _ => None,
    };
    if let Some(id) = known.or(created) {
        request.extensions_mut().insert(CurrentSession(id));
    }

    let mut response = next.run(request).await;

    // Handlers that manage the cookie themselves win.
    if let Some(id) = created {
        if !response.headers().contains_key(SET_COOKIE) {
            if let Ok(value) = HeaderValue::from_str(&session_cookie(id)) {
                response.headers_mut().append(SET_COOKIE, value);
            }
        }
    }
    response
}

/// Whether a request without a known session may start one.
pub fn starts_session(method: &Method, path: &str) -> bool {
    match *method {
        Method::POST => true,
        Method::GET | Method::HEAD => path == "/",
        _ => false,
    }
}

/// Find a cookie by name across all `Cookie` headers.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

pub fn session_cookie(id: SessionId) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id)
}

/// A cookie that makes the browser forget the session.
pub fn expired_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_value_finds_named_cookie() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark; stylist_session=abc"));
        headers.append(COOKIE, HeaderValue::from_static("other=1"));

        assert_eq!(cookie_value(&headers, SESSION_COOKIE), Some("abc"));
        assert_eq!(cookie_value(&headers, "other"), Some("1"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn test_session_cookie_is_http_only() {
        let id = SessionId::new();
        let cookie = session_cookie(id);
        assert!(cookie.starts_with(&format!("stylist_session={}", id)));
        assert!(cookie.contains("HttpOnly"));
        assert!(expired_session_cookie().contains("Max-Age=0"));
    }

    #[test]
    fn test_only_page_and_posts_start_sessions() {
        assert!(starts_session(&Method::GET, "/"));
        assert!(starts_session(&Method::HEAD, "/"));
        assert!(starts_session(&Method::POST, "/generate"));
        assert!(starts_session(&Method::POST, "/credentials"));
        assert!(!starts_session(&Method::GET, "/report/image"));
        assert!(!starts_session(&Method::GET, "/report/download"));
        assert!(!starts_session(&Method::GET, "/favicon.ico"));
    }
}
