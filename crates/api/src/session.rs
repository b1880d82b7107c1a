//! Cookie-backed browser sessions and back-office identity.

use axum::extract::{FromRequestParts, Request};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use domain::{Principal, Role};
use store::SessionId;
use uuid::Uuid;

use crate::error::ApiError;

/// Name of the cookie carrying the session id.
pub const SESSION_COOKIE: &str = "session_id";

/// Header set by the identity provider with the signed-in user's email.
pub const USER_EMAIL_HEADER: &str = "x-user-email";

/// Header with the user's comma-separated roles.
pub const USER_ROLES_HEADER: &str = "x-user-roles";

/// Attaches a [`SessionId`] to every request, issuing a cookie for new visitors.
pub async fn ensure_session(mut request: Request, next: Next) -> Response {
    let (session, issued) = match session_from_headers(request.headers()) {
        Some(session) => (session, false),
        None => (SessionId::new(), true),
    };
    request.extensions_mut().insert(session.clone());

    let mut response = next.run(request).await;

    if issued {
        let cookie = format!("{SESSION_COOKIE}={session}; Path=/; HttpOnly; SameSite=Lax");
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => tracing::warn!(error = %e, "could not encode session cookie"),
        }
    }
    response
}

/// Reads the session cookie. Values that are not UUIDs are ignored.
fn session_from_headers(headers: &HeaderMap) -> Option<SessionId> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, token)| Uuid::parse_str(token.trim()).ok())
        .map(|uuid| SessionId::from_token(uuid.to_string()))
}

/// The signed-in back-office user, as asserted by the identity provider.
#[derive(Debug, Clone)]
pub struct Staff(pub Principal);

impl<S: Send + Sync> FromRequestParts<S> for Staff {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let email = parts
            .headers
            .get(USER_EMAIL_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or(ApiError::Unauthenticated)?;

        let roles = parts
            .headers
            .get(USER_ROLES_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .split(',')
            .filter(|r| !r.trim().is_empty())
            .filter_map(|r| match r.parse::<Role>() {
                Ok(role) => Some(role),
                Err(e) => {
                    tracing::debug!(error = %e, "ignoring role");
                    None
                }
            })
            .collect();

        Ok(Staff(Principal::new(email, roles)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn reads_session_cookie_among_others() {
        let id = Uuid::new_v4();
        let headers = headers(&format!("theme=dark; {SESSION_COOKIE}={id}; lang=es"));

        let session = session_from_headers(&headers).unwrap();

        assert_eq!(session.as_str(), id.to_string());
    }

    #[test]
    fn ignores_malformed_session_cookie() {
        assert!(session_from_headers(&headers("session_id=not-a-uuid")).is_none());
        assert!(session_from_headers(&HeaderMap::new()).is_none());
    }

    #[tokio::test]
    async fn staff_requires_email() {
        let (mut parts, _) = axum::http::Request::builder()
            .header(USER_ROLES_HEADER, "Admin")
            .body(())
            .unwrap()
            .into_parts();

        let result = Staff::from_request_parts(&mut parts, &()).await;

        assert!(matches!(result, Err(ApiError::Unauthenticated)));
    }

    #[tokio::test]
    async fn staff_parses_roles() {
        let (mut parts, _) = axum::http::Request::builder()
            .header(USER_EMAIL_HEADER, "ops@example.com")
            .header(USER_ROLES_HEADER, "ordermanager, Unknown ,Admin")
            .body(())
            .unwrap()
            .into_parts();

        let Staff(principal) = Staff::from_request_parts(&mut parts, &()).await.unwrap();

        assert_eq!(principal.email, "ops@example.com");
        assert_eq!(principal.roles, vec![Role::OrderManager, Role::Admin]);
    }
}
