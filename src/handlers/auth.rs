use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;

use crate::{
    auth::{client::MIN_PASSWORD_LEN, AuthError, MaybeUser, SESSION_COOKIE},
    error::AppError,
    state::AppState,
    templates::{login_page, register_page},
};

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

impl RegisterForm {
    /// Checks done before the auth client is called.
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.display_name.trim().is_empty()
            || self.email.trim().is_empty()
            || self.password.is_empty()
            || self.confirm_password.is_empty()
        {
            return Err(AuthError::MissingFields);
        }
        if self.password != self.confirm_password {
            return Err(AuthError::PasswordMismatch);
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword {
                min: MIN_PASSWORD_LEN,
            });
        }
        Ok(())
    }
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

fn auth_failure_status(error: &AuthError) -> StatusCode {
    match error {
        AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        AuthError::SessionStore(_)
        | AuthError::Database(_)
        | AuthError::Hashing(_)
        | AuthError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn auth_failure_message(error: AuthError) -> String {
    let status = auth_failure_status(&error);
    if status.is_server_error() {
        tracing::error!("Authentication backend error: {}", error);
        return AppError::from(error).user_message();
    }
    error.to_string()
}

pub async fn login_form(MaybeUser(user): MaybeUser) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }
    Html(login_page(None, "").into_string()).into_response()
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    if form.email.trim().is_empty() || form.password.is_empty() {
        let page = login_page(Some(&AuthError::MissingFields.to_string()), &form.email);
        return (StatusCode::UNPROCESSABLE_ENTITY, Html(page.into_string())).into_response();
    }

    match state.sessions.login(&form.email, &form.password).await {
        Ok((token, user)) => {
            tracing::info!("User {} logged in", user.id);
            (jar.add(session_cookie(token)), Redirect::to("/")).into_response()
        }
        Err(e) => {
            let status = auth_failure_status(&e);
            let page = login_page(Some(&auth_failure_message(e)), &form.email);
            (status, Html(page.into_string())).into_response()
        }
    }
}

pub async fn register_form(MaybeUser(user): MaybeUser) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }
    Html(register_page(None, "", "").into_string()).into_response()
}

pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Response {
    let result = match form.validate() {
        Ok(()) => {
            state
                .sessions
                .register(&form.email, &form.password, form.display_name.trim())
                .await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok((token, user)) => {
            tracing::info!("Registered user {}", user.id);
            (jar.add(session_cookie(token)), Redirect::to("/")).into_response()
        }
        Err(e) => {
            let status = auth_failure_status(&e);
            let page = register_page(
                Some(&auth_failure_message(e)),
                &form.display_name,
                &form.email,
            );
            (status, Html(page.into_string())).into_response()
        }
    }
}

pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if let Err(e) = state.sessions.logout(cookie.value()).await {
            tracing::warn!("Error closing session: {}", e);
        }
    }

    let removal = Cookie::build(SESSION_COOKIE).path("/").build();
    (jar.remove(removal), Redirect::to("/login"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(display_name: &str, password: &str, confirm: &str) -> RegisterForm {
        RegisterForm {
            display_name: display_name.to_string(),
            email: "x@example.com".to_string(),
            password: password.to_string(),
            confirm_password: confirm.to_string(),
        }
    }

    #[test]
    fn test_register_form_validation() {
        assert!(form("X", "secret1", "secret1").validate().is_ok());
        assert!(matches!(
            form("", "secret1", "secret1").validate(),
            Err(AuthError::MissingFields)
        ));
        assert!(matches!(
            form("X", "secret1", "secret2").validate(),
            Err(AuthError::PasswordMismatch)
        ));
        assert!(matches!(
            form("X", "12345", "12345").validate(),
            Err(AuthError::WeakPassword { min: 6 })
        ));
    }

    #[test]
    fn test_failure_statuses() {
        assert_eq!(
            auth_failure_status(&AuthError::InvalidCredentials),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            auth_failure_status(&AuthError::EmailInUse),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            auth_failure_status(&AuthError::Hashing("x".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
