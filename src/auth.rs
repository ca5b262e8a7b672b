//! Account registration, login, token authentication and external
//! session exchange.
//!
//! All functions are synchronous and take a borrowed connection; callers
//! on the async side run them inside `spawn_blocking` because password
//! hashing is deliberately slow.

use chrono::{Duration, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::config::MAX_TOKEN_TTL_DAYS;
use crate::crypto::{hash_password, verify_password, CryptoError, TokenError, TokenSigner};
use crate::db::{self, DatabaseError};
use crate::identity::{IdentityError, IdentityProvider};
use crate::models::{new_id, Role, User, USER_ID_PREFIX};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Email already registered")]
    EmailTaken,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error(transparent)]
    Token(#[from] TokenError),

    /// Token was valid but its account no longer exists.
    #[error("User not found")]
    UnknownUser,

    #[error("Invalid session")]
    SessionRejected,

    #[error("Identity provider failure: {0}")]
    IdentityUnavailable(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Token response shared by register, login and session exchange.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub access_token: String,
    pub token_type: &'static str,
    pub user: User,
}

/// Token signer plus the hashing cost for new passwords.
#[derive(Debug, Clone)]
pub struct AuthService {
    signer: TokenSigner,
    password_iterations: u32,
}

impl AuthService {
    /// `token_ttl_days` is clamped to `1..=MAX_TOKEN_TTL_DAYS`.
    pub fn new(jwt_secret: &str, token_ttl_days: i64, password_iterations: u32) -> Self {
        let days = token_ttl_days.clamp(1, MAX_TOKEN_TTL_DAYS);
        Self {
            signer: TokenSigner::new(jwt_secret, Duration::days(days)),
            password_iterations,
        }
    }

    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    fn session_for(&self, user: User) -> Result<AuthSession, AuthError> {
        let access_token = self.signer.issue(&user.user_id, user.role)?;
        Ok(AuthSession {
            access_token,
            token_type: "bearer",
            user,
        })
    }

    /// Hash a password at the configured cost.
    pub fn hash(&self, password: &str) -> String {
        hash_password(password, self.password_iterations)
    }

    pub fn register(
        &self,
        conn: &Connection,
        input: RegisterInput,
    ) -> Result<AuthSession, AuthError> {
        let email = normalize_email(&input.email);
        validate_email(&email)?;
        if input.password.is_empty() {
            return Err(AuthError::InvalidInput("Password must not be empty".into()));
        }
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(AuthError::InvalidInput("Name must not be empty".into()));
        }

        if db::get_user_by_email(conn, &email)?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let user = User {
            user_id: new_id(USER_ID_PREFIX),
            email,
            password_hash: Some(self.hash(&input.password)),
            name,
            role: input.role.unwrap_or_default(),
            phone: input.phone,
            picture: None,
            patient_id: None,
            created_at: Utc::now(),
        };

        // The unique index settles concurrent registrations.
        db::insert_user(conn, &user).map_err(|e| match e {
            DatabaseError::Duplicate(_) => AuthError::EmailTaken,
            other => AuthError::Database(other),
        })?;

        tracing::info!(user_id = %user.user_id, role = %user.role, "User registered");
        self.session_for(user)
    }

    pub fn login(&self, conn: &Connection, input: LoginInput) -> Result<AuthSession, AuthError> {
        let user = db::get_user_by_email(conn, &normalize_email(&input.email))?
            .ok_or(AuthError::InvalidCredentials)?;

        let Some(stored) = user.password_hash.as_deref() else {
            // External-session accounts have no local password.
            return Err(AuthError::InvalidCredentials);
        };

        match verify_password(&input.password, stored) {
            Ok(true) => {}
            Ok(false) => return Err(AuthError::InvalidCredentials),
            Err(e) => {
                tracing::error!(user_id = %user.user_id, error = %e, "Stored password hash unreadable");
                return Err(AuthError::InvalidCredentials);
            }
        }

        tracing::info!(user_id = %user.user_id, "User logged in");
        self.session_for(user)
    }

    /// Verify a bearer token and load its account.
    pub fn authenticate(&self, conn: &Connection, token: &str) -> Result<User, AuthError> {
        let claims = self.signer.verify(token)?;
        db::get_user(conn, &claims.user_id)?.ok_or(AuthError::UnknownUser)
    }

    /// Trade an external session id for a local token, creating or
    /// refreshing the matching account.
    pub fn exchange_session(
        &self,
        conn: &Connection,
        provider: &dyn IdentityProvider,
        session_id: &str,
    ) -> Result<AuthSession, AuthError> {
        if session_id.trim().is_empty() {
            return Err(AuthError::InvalidInput("session_id is required".into()));
        }

        let identity = provider.fetch_session(session_id).map_err(|e| match e {
            IdentityError::Rejected(status) => {
                tracing::info!(status, "External session rejected");
                AuthError::SessionRejected
            }
            other => {
                tracing::warn!(error = %other, "Identity provider call failed");
                AuthError::IdentityUnavailable(other.to_string())
            }
        })?;

        let email = normalize_email(&identity.email);
        let user = match db::get_user_by_email(conn, &email)? {
            Some(existing) => {
                db::update_user_profile(
                    conn,
                    &existing.user_id,
                    &identity.name,
                    identity.picture.as_deref(),
                )?;
                User {
                    name: identity.name,
                    picture: identity.picture,
                    ..existing
                }
            }
            None => {
                let user = User {
                    user_id: new_id(USER_ID_PREFIX),
                    email,
                    password_hash: None,
                    name: identity.name,
                    role: Role::Staff,
                    phone: None,
                    picture: identity.picture,
                    patient_id: None,
                    created_at: Utc::now(),
                };
                match db::insert_user(conn, &user) {
                    Ok(()) => {
                        tracing::info!(user_id = %user.user_id, "User created from external session");
                        user
                    }
                    // Lost a race with a concurrent first login for the same email.
                    Err(DatabaseError::Duplicate(_)) => db::get_user_by_email(conn, &user.email)?
                        .ok_or_else(|| AuthError::IdentityUnavailable("user vanished".into()))?,
                    Err(e) => return Err(e.into()),
                }
            }
        };

        self.session_for(user)
    }
}

/// Canonical stored form of an email address: trimmed, lowercase.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Minimal address check: one `@`, non-empty local part and domain, no spaces.
pub fn validate_email(email: &str) -> Result<(), AuthError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(AuthError::InvalidInput(format!("Invalid email address: {email}")))
    }
}
