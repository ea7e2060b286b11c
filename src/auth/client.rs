use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use super::{AuthError, AuthSubject};
use crate::db::entities::auth_account;

pub const MIN_PASSWORD_LEN: usize = 6;

/// Email/password identity provider.
#[async_trait]
pub trait AuthClient: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSubject, AuthError>;

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<AuthSubject, AuthError>;

    async fn sign_out(&self, subject: &AuthSubject) -> Result<(), AuthError>;
}

/// Auth client keeping accounts in the `auth_accounts` table with argon2
/// password hashes.
#[derive(Clone)]
pub struct LocalAuthClient {
    db: DatabaseConnection,
    params: Params,
}

impl LocalAuthClient {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            params: Params::default(),
        }
    }

    /// Use custom argon2 cost parameters (tests use the cheapest ones).
    pub fn with_params(db: DatabaseConnection, params: Params) -> Self {
        Self { db, params }
    }

    fn hasher(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    fn hash_password(&self, plain: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        self.hasher()
            .hash_password(plain.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Hashing(e.to_string()))
    }

    fn verify_password(plain: &str, stored: &str) -> Result<bool, AuthError> {
        let hash = PasswordHash::new(stored).map_err(|e| AuthError::Hashing(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(plain.as_bytes(), &hash)
            .is_ok())
    }

    async fn find_account(&self, email: &str) -> Result<Option<auth_account::Model>, AuthError> {
        Ok(auth_account::Entity::find()
            .filter(auth_account::Column::Email.eq(email))
            .one(&self.db)
            .await?)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn subject_of(account: auth_account::Model) -> AuthSubject {
    AuthSubject {
        uid: account.uid,
        email: Some(account.email),
        display_name: account.display_name,
    }
}

#[async_trait]
impl AuthClient for LocalAuthClient {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSubject, AuthError> {
        let email = normalize_email(email);
        let Some(account) = self.find_account(&email).await? else {
            return Err(AuthError::InvalidCredentials);
        };

        if !Self::verify_password(password, &account.password_hash)? {
            tracing::debug!("Rejected password for {}", email);
            return Err(AuthError::InvalidCredentials);
        }

        tracing::info!("Signed in {}", account.uid);
        Ok(subject_of(account))
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<AuthSubject, AuthError> {
        let email = normalize_email(email);
        if email.len() < 3 || !email.contains('@') {
            return Err(AuthError::InvalidEmail);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword {
                min: MIN_PASSWORD_LEN,
            });
        }
        if self.find_account(&email).await?.is_some() {
            return Err(AuthError::EmailInUse);
        }

        let account = auth_account::ActiveModel {
            uid: Set(uuid::Uuid::new_v4().simple().to_string()),
            email: Set(email),
            password_hash: Set(self.hash_password(password)?),
            display_name: Set(display_name
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string)),
            created_at: Set(Utc::now().into()),
        };
        let account = account.insert(&self.db).await?;

        tracing::info!("Registered account {}", account.uid);
        Ok(subject_of(account))
    }

    async fn sign_out(&self, subject: &AuthSubject) -> Result<(), AuthError> {
        tracing::info!("Signed out {}", subject.uid);
        Ok(())
    }
}
