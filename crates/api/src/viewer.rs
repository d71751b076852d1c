use axum::http::HeaderMap;
use axum_extra::extract::cookie::CookieJar;

use sitesmith_core::access::ViewerContext;

/// Cookie carrying the anonymous draft session id.
pub const ANON_SESSION_COOKIE: &str = "ss_anon_session";

/// Header the session gateway forwards the authenticated user id in.
const USER_ID_HEADER: &str = "x-user-id";

fn parse_user_id(value: &str) -> Option<i64> {
    let parsed: i64 = value.trim().parse().ok()?;
    (parsed > 0).then_some(parsed)
}

/// Resolve the viewer identity for this request: the forwarded user id when
/// present, otherwise the anonymous session cookie.
pub fn resolve_viewer(headers: &HeaderMap, jar: &CookieJar) -> ViewerContext {
    let user_id = headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_user_id);

    let anon_session_id = jar
        .get(ANON_SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.trim().is_empty());

    ViewerContext {
        user_id,
        anon_session_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn forwarded_user_id_is_parsed() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("42"));
        let viewer = resolve_viewer(&headers, &CookieJar::new());
        assert_eq!(viewer.user_id, Some(42));
        assert_eq!(viewer.anon_session_id, None);
    }

    #[test]
    fn junk_user_ids_are_ignored() {
        for junk in ["0", "-3", "4.5", "abc", ""] {
            let mut headers = HeaderMap::new();
            headers.insert(USER_ID_HEADER, HeaderValue::from_str(junk).unwrap());
            let viewer = resolve_viewer(&headers, &CookieJar::new());
            assert_eq!(viewer.user_id, None, "expected {junk:?} to be rejected");
        }
    }

    #[test]
    fn anon_session_comes_from_the_cookie() {
        let jar = CookieJar::new().add(axum_extra::extract::cookie::Cookie::new(
            ANON_SESSION_COOKIE,
            "anon-123",
        ));
        let viewer = resolve_viewer(&HeaderMap::new(), &jar);
        assert_eq!(viewer.anon_session_id.as_deref(), Some("anon-123"));
    }
}
