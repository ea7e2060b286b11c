//! Route guards, expressed as extractors.
//!
//! Screens take `CurrentUser` or `AdminUser` as an argument; a request that
//! does not satisfy the guard is redirected before the handler runs.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    response::Redirect,
};
use axum_extra::extract::cookie::CookieJar;

use super::{AuthError, SessionState};
use crate::db::models::User;
use crate::error::AppError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "session_token";

/// Session token from the cookie, or from an `Authorization: Bearer` header.
pub fn session_token(parts: &Parts) -> Option<String> {
    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }

    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
}

async fn session_state(parts: &Parts, state: &AppState) -> SessionState {
    let token = session_token(parts);
    state.sessions.resolve(token.as_deref()).await
}

/// Any signed-in user. Anonymous requests go to `/login`.
pub struct CurrentUser(pub User);

/// A signed-in admin. Anonymous requests go to `/login`, others to `/`.
pub struct AdminUser(pub User);

/// The signed-in user, if there is one. Never rejects.
pub struct MaybeUser(pub Option<User>);

/// Signed-in user for JSON endpoints; rejects with 401 instead of redirecting.
pub struct ApiUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        session_state(parts, state)
            .await
            .into_user()
            .map(CurrentUser)
            .ok_or_else(|| Redirect::to("/login"))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match session_state(parts, state).await.into_user() {
            Some(user) if user.is_admin() => Ok(AdminUser(user)),
            Some(user) => {
                tracing::debug!("User {} is not an admin", user.id);
                Err(Redirect::to("/"))
            }
            None => Err(Redirect::to("/login")),
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(session_state(parts, state).await.into_user()))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for ApiUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        session_state(parts, state)
            .await
            .into_user()
            .map(ApiUser)
            .ok_or(AppError::Auth(AuthError::NotSignedIn))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(header: (&str, &str)) -> Parts {
        let (parts, _) = Request::builder()
            .header(header.0, header.1)
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    #[test]
    fn test_token_from_cookie() {
        let parts = parts_with(("cookie", "theme=dark; session_token=abc123"));
        assert_eq!(session_token(&parts).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_token_from_bearer_header() {
        let parts = parts_with(("authorization", "Bearer xyz"));
        assert_eq!(session_token(&parts).as_deref(), Some("xyz"));
    }

    #[test]
    fn test_no_token() {
        let parts = parts_with(("accept", "text/html"));
        assert_eq!(session_token(&parts), None);
    }
}
