use std::sync::Arc;

use super::{AuthClient, AuthError, AuthSubject, SessionStore};
use crate::db::models::{NewUser, Role, User};
use crate::db::repositories::UserRepository;
use crate::db::store::StoreResult;

/// Where the current session stands.
///
/// Starts as `Resolving` and settles on `Authenticated` or `Anonymous` once
/// the session-change notification for it has been handled.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SessionState {
    #[default]
    Resolving,
    Authenticated(User),
    Anonymous,
}

impl SessionState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Resolving)
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn into_user(self) -> Option<User> {
        match self {
            Self::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

/// Owns the authenticated-identity lifecycle: login, registration, logout
/// and turning an auth subject into a catalog user record.
#[derive(Clone)]
pub struct SessionProvider {
    auth: Arc<dyn AuthClient>,
    sessions: Arc<dyn SessionStore>,
    users: UserRepository,
}

impl SessionProvider {
    pub fn new(
        auth: Arc<dyn AuthClient>,
        sessions: Arc<dyn SessionStore>,
        users: UserRepository,
    ) -> Self {
        Self {
            auth,
            sessions,
            users,
        }
    }

    /// Handle a session-change notification.
    ///
    /// A subject seen for the first time gets a default user record (role
    /// `user`). The lookup and the write are separate calls, so two first
    /// logins racing each other may both write the record.
    pub async fn on_session_change(&self, subject: Option<&AuthSubject>) -> SessionState {
        let Some(subject) = subject else {
            return SessionState::Anonymous;
        };

        match self.ensure_user(subject).await {
            Ok(user) => SessionState::Authenticated(user),
            Err(e) => {
                tracing::error!("Error fetching user data for {}: {}", subject.uid, e);
                SessionState::Anonymous
            }
        }
    }

    /// Resolve the session behind `token`, if any.
    pub async fn resolve(&self, token: Option<&str>) -> SessionState {
        let Some(token) = token else {
            return SessionState::Anonymous;
        };

        let subject = match self.sessions.lookup(token).await {
            Ok(subject) => subject,
            Err(e) => {
                tracing::error!("Error looking up session: {}", e);
                None
            }
        };
        tracing::debug!("Session lookup resolved subject: {}", subject.is_some());

        self.on_session_change(subject.as_ref()).await
    }

    /// Sign in and open a session. Returns the session token and the user.
    pub async fn login(&self, email: &str, password: &str) -> Result<(String, User), AuthError> {
        let subject = self.auth.sign_in(email, password).await?;
        let user = self.ensure_user(&subject).await?;
        let token = self.sessions.open(&subject).await?;
        Ok((token, user))
    }

    /// Create an account, write its user record and open a session.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<(String, User), AuthError> {
        let subject = self
            .auth
            .sign_up(email, password, Some(display_name))
            .await?;

        let data = NewUser {
            email: subject.email.clone().unwrap_or_default(),
            display_name: display_name.to_string(),
            role: Role::User,
        };
        let user = self.write_user(&subject.uid, data).await?;
        let token = self.sessions.open(&subject).await?;
        Ok((token, user))
    }

    /// End the session behind `token`. Unknown tokens are ignored.
    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        if let Some(subject) = self.sessions.lookup(token).await? {
            self.auth.sign_out(&subject).await?;
        }
        self.sessions.close(token).await
    }

    async fn ensure_user(&self, subject: &AuthSubject) -> StoreResult<User> {
        if let Some(user) = self.users.get_by_id(&subject.uid).await? {
            return Ok(user);
        }

        let data = NewUser {
            email: subject.email.clone().unwrap_or_default(),
            display_name: subject
                .display_name
                .clone()
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| User::DEFAULT_DISPLAY_NAME.to_string()),
            role: Role::User,
        };
        self.write_user(&subject.uid, data).await
    }

    /// Keyed write of a user record, read back for its store timestamp.
    async fn write_user(&self, uid: &str, data: NewUser) -> StoreResult<User> {
        let written_at = crate::db::store::now();
        self.users.create_user(uid, &data).await?;

        Ok(self.users.get_by_id(uid).await?.unwrap_or(User {
            id: uid.to_string(),
            email: data.email,
            display_name: data.display_name,
            role: data.role,
            created_at: written_at,
        }))
    }
}
