use std::sync::Arc;

use anyhow::Context;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use super::{
    claims::{Claims, Identity},
    dto::UserProfile,
    jwt::{JwtKeys, TokenError},
    password::{hash_password, verify_dummy, verify_password},
    repo::{StoreError, UserStore},
};
use crate::error::{AppError, FieldError};

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),
    #[error("User already exists with this email")]
    DuplicateEmail,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("invalid token: {0}")]
    InvalidToken(#[from] TokenError),
    #[error("User not found")]
    UserNotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateEmail => AuthError::DuplicateEmail,
            StoreError::Other(e) => AuthError::Internal(e),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Validation(errors) => AppError::Validation(errors),
            AuthError::DuplicateEmail => AppError::Conflict(e.to_string()),
            AuthError::InvalidCredentials => AppError::Unauthenticated(e.to_string()),
            AuthError::InvalidToken(_) => AppError::Unauthenticated("Invalid token".into()),
            AuthError::UserNotFound => AppError::NotFound(e.to_string()),
            AuthError::Internal(e) => AppError::Internal(e),
        }
    }
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_registration(email: &str, password: &str) -> Result<(), AuthError> {
    let mut errors = Vec::new();
    if !is_valid_email(email) {
        errors.push(FieldError::new("user_email", "Please provide a valid email"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(FieldError::new(
            "user_password",
            "Password must be at least 6 characters long",
        ));
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AuthError::Validation(errors))
    }
}

fn validate_login(email: &str, password: &str) -> Result<(), AuthError> {
    let mut errors = Vec::new();
    if !is_valid_email(email) {
        errors.push(FieldError::new("user_email", "Please provide a valid email"));
    }
    if password.is_empty() {
        errors.push(FieldError::new("user_password", "Password is required"));
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AuthError::Validation(errors))
    }
}

/// Argon2 work is moved off the async workers.
async fn blocking<T, F>(f: F) -> anyhow::Result<T>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .context("password task panicked")?
}

/// Registration, login, profile lookup and token verification over a
/// credential store.
pub struct AuthService {
    users: Arc<dyn UserStore>,
    keys: JwtKeys,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, keys: JwtKeys) -> Self {
        Self { users, keys }
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<UserProfile, AuthError> {
        let email = normalize_email(email);
        validate_registration(&email, password)?;

        // Fast path; the unique constraint on insert is what actually guarantees it.
        if self.users.find_by_email(&email).await?.is_some() {
            warn!(email = %email, "email already registered");
            return Err(AuthError::DuplicateEmail);
        }

        let plain = password.to_owned();
        let hash = blocking(move || hash_password(&plain)).await?;
        let user = self.users.insert(&email, &hash).await?;

        info!(user_id = user.id, user_uuid = %user.uuid, "user registered");
        Ok(user.into())
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(UserProfile, String), AuthError> {
        let email = normalize_email(email);
        validate_login(&email, password)?;

        let plain = password.to_owned();
        let Some(user) = self.users.find_by_email(&email).await? else {
            blocking(move || {
                verify_dummy(&plain);
                Ok(())
            })
            .await?;
            warn!(email = %email, "login unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        let hash = user.password_hash.clone();
        let ok = blocking(move || verify_password(&plain, &hash)).await?;
        if !ok {
            warn!(email = %email, user_id = user.id, "login invalid password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.keys.issue(&Identity {
            user_id: user.id,
            user_uuid: user.uuid,
            user_email: user.user_email.clone(),
        })?;

        info!(user_id = user.id, "user logged in");
        Ok((user.into(), token))
    }

    pub async fn get_profile(&self, user_id: i32) -> Result<Option<UserProfile>, AuthError> {
        Ok(self.users.find_by_id(user_id).await?.map(UserProfile::from))
    }

    /// Checks the signature and then confirms the user still exists with the
    /// uuid the token asserts.
    pub async fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = self.keys.verify(token)?;
        let exists = self
            .users
            .find_by_id(claims.user_id)
            .await?
            .is_some_and(|u| u.uuid == claims.user_uuid);
        if !exists {
            warn!(user_id = claims.user_id, "token references missing user");
            return Err(AuthError::UserNotFound);
        }
        Ok(claims)
    }
}
