use rand::Rng;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::{generate_jwt, Claims, JwtError};
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::user::User;

const ANONYMOUS_EMAIL_DOMAIN: &str = "anonymous.local";
const ANONYMOUS_PASSWORD_LEN: usize = 32;
const ANONYMOUS_PASSWORD_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

const SELECT_USER_BY_EMAIL: &str = "SELECT id, email, password_hash, is_anonymous, created_at, updated_at \
     FROM users WHERE email = $1";

const INSERT_USER: &str = "INSERT INTO users (email, password_hash, is_anonymous) VALUES ($1, $2, $3) \
     RETURNING id, email, password_hash, is_anonymous, created_at, updated_at";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Email already registered: {0}")]
    EmailTaken(String),
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("User not found: {0}")]
    UserNotFound(String),
    #[error("{message}")]
    Validation {
        message: String,
        field: Option<(String, String)>,
    },
    #[error("Token error: {0}")]
    Token(#[from] JwtError),
    #[error("Password hash error: {0}")]
    Hash(String),
    #[error("Database manager error: {0}")]
    DatabaseManager(#[from] DatabaseError),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Token + identity payload returned by every signup/signin variant
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub email: String,
    pub user_id: Uuid,
    pub is_anonymous: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub user_id: Uuid,
    pub email: String,
    pub is_anonymous: bool,
}

pub struct AuthService {
    pool: PgPool,
}

impl AuthService {
    pub async fn new() -> Result<Self, AuthError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    /// Register a new account and issue a token bound to its email
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        let email = normalize_email(email).ok_or_else(|| AuthError::Validation {
            message: "Invalid email address".to_string(),
            field: Some(("email".to_string(), "A valid email is required".to_string())),
        })?;
        if password.is_empty() {
            return Err(AuthError::Validation {
                message: "Password is required".to_string(),
                field: Some(("password".to_string(), "Password must not be empty".to_string())),
            });
        }

        let password_hash = hash_password(password).map_err(AuthError::Hash)?;

        self.create_user(&email, &password_hash, false).await
    }

    /// Verify credentials and issue a fresh token.
    ///
    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        let email = normalize_email(email).ok_or(AuthError::InvalidCredentials)?;

        let user = sqlx::query_as::<_, User>(SELECT_USER_BY_EMAIL)
            .bind(&email)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let matches = verify_password(password, &user.password_hash).map_err(AuthError::Hash)?;
        if !matches {
            return Err(AuthError::InvalidCredentials);
        }

        let token = generate_jwt(Claims::new(user.email.clone(), user.id))?;

        Ok(AuthResponse {
            token,
            email: user.email,
            user_id: user.id,
            is_anonymous: user.is_anonymous,
        })
    }

    /// Create an ephemeral account with synthetic credentials.
    ///
    /// The random source makes collisions negligible, but the unique
    /// constraint on users.email stays authoritative - a collision surfaces
    /// as EmailTaken rather than corrupting an existing account.
    pub async fn sign_in_anonymously(&self) -> Result<AuthResponse, AuthError> {
        let email = generate_anonymous_email();
        let password = generate_anonymous_password();
        let password_hash = hash_password(&password).map_err(AuthError::Hash)?;

        self.create_user(&email, &password_hash, true).await
    }

    /// Resolve the authenticated principal back to its account
    pub async fn current_user(&self, principal_email: &str) -> Result<UserResponse, AuthError> {
        let user = sqlx::query_as::<_, User>(SELECT_USER_BY_EMAIL)
            .bind(principal_email)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AuthError::UserNotFound(principal_email.to_string()))?;

        Ok(UserResponse {
            user_id: user.id,
            email: user.email,
            is_anonymous: user.is_anonymous,
        })
    }

    async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        is_anonymous: bool,
    ) -> Result<AuthResponse, AuthError> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(INSERT_USER)
            .bind(email)
            .bind(password_hash)
            .bind(is_anonymous)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    AuthError::EmailTaken(email.to_string())
                }
                _ => AuthError::Database(e),
            })?;

        // Mint before commit so a signing failure rolls the insert back
        let token = generate_jwt(Claims::new(user.email.clone(), user.id))?;

        tx.commit().await?;

        Ok(AuthResponse {
            token,
            email: user.email,
            user_id: user.id,
            is_anonymous: user.is_anonymous,
        })
    }
}

fn normalize_email(email: &str) -> Option<String> {
    let normalized = email.trim().to_ascii_lowercase();
    if normalized.is_empty() || !normalized.contains('@') {
        return None;
    }
    let parts = normalized.split('@').collect::<Vec<_>>();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return None;
    }
    Some(normalized)
}

fn generate_anonymous_email() -> String {
    format!("anon_{}@{}", Uuid::new_v4(), ANONYMOUS_EMAIL_DOMAIN)
}

fn generate_anonymous_password() -> String {
    let mut rng = rand::thread_rng();
    (0..ANONYMOUS_PASSWORD_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..ANONYMOUS_PASSWORD_ALPHABET.len());
            ANONYMOUS_PASSWORD_ALPHABET[idx] as char
        })
        .collect()
}
