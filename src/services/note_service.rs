use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::note::Note;
use crate::database::models::user::User;
use crate::middleware::auth::AuthUser;

const SELECT_USER_BY_EMAIL: &str = "SELECT id, email, password_hash, is_anonymous, created_at, updated_at \
     FROM users WHERE email = $1";

const SELECT_NOTES_BY_OWNER: &str = "SELECT id, title, content, user_id, created_at, updated_at \
     FROM notes WHERE user_id = $1 ORDER BY created_at DESC";

const SELECT_NOTE_BY_ID_AND_OWNER: &str = "SELECT id, title, content, user_id, created_at, updated_at \
     FROM notes WHERE id = $1 AND user_id = $2";

const INSERT_NOTE: &str = "INSERT INTO notes (title, content, user_id) VALUES ($1, $2, $3) \
     RETURNING id, title, content, user_id, created_at, updated_at";

const UPDATE_NOTE_BY_ID_AND_OWNER: &str = "UPDATE notes SET title = $1, content = $2, updated_at = now() \
     WHERE id = $3 AND user_id = $4 \
     RETURNING id, title, content, user_id, created_at, updated_at";

const DELETE_NOTE_BY_ID_AND_OWNER: &str = "DELETE FROM notes WHERE id = $1 AND user_id = $2";

#[derive(Debug, thiserror::Error)]
pub enum NoteError {
    /// Covers both "no such note" and "someone else's note" - the caller
    /// cannot distinguish them, so existence never leaks.
    #[error("Note not found or access denied")]
    NotFound,
    #[error("User not found: {0}")]
    UserNotFound(String),
    #[error("{message}")]
    Validation {
        message: String,
        field: Option<(String, String)>,
    },
    #[error("Database manager error: {0}")]
    DatabaseManager(#[from] DatabaseError),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteResponse {
    pub id: Uuid,
    pub title: String,
    pub content: Option<String>,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Note> for NoteResponse {
    fn from(note: Note) -> Self {
        Self {
            id: note.id,
            title: note.title,
            content: note.content,
            user_id: note.user_id,
            created_at: note.created_at,
            updated_at: note.updated_at,
        }
    }
}

/// Ownership-scoped CRUD over notes.
///
/// Every operation resolves the caller's account inside its own transaction
/// and filters by the owner id in the same statement that touches the note,
/// so one request never observes another request's partial writes.
pub struct NoteService {
    pool: PgPool,
}

impl NoteService {
    pub async fn new() -> Result<Self, NoteError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    /// All notes owned by the caller, newest first
    pub async fn list_notes(&self, principal: &AuthUser) -> Result<Vec<NoteResponse>, NoteError> {
        let mut tx = self.pool.begin().await?;

        let user = Self::require_user(&mut tx, &principal.email).await?;
        let notes = sqlx::query_as::<_, Note>(SELECT_NOTES_BY_OWNER)
            .bind(user.id)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(notes.into_iter().map(NoteResponse::from).collect())
    }

    pub async fn get_note(&self, principal: &AuthUser, id: Uuid) -> Result<NoteResponse, NoteError> {
        let mut tx = self.pool.begin().await?;

        let user = Self::require_user(&mut tx, &principal.email).await?;
        let note = sqlx::query_as::<_, Note>(SELECT_NOTE_BY_ID_AND_OWNER)
            .bind(id)
            .bind(user.id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(NoteError::NotFound)?;

        tx.commit().await?;

        Ok(note.into())
    }

    pub async fn create_note(
        &self,
        principal: &AuthUser,
        title: &str,
        content: Option<String>,
    ) -> Result<NoteResponse, NoteError> {
        let title = validate_title(title)?;

        let mut tx = self.pool.begin().await?;

        let user = Self::require_user(&mut tx, &principal.email).await?;
        let note = sqlx::query_as::<_, Note>(INSERT_NOTE)
            .bind(title)
            .bind(content)
            .bind(user.id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(note.into())
    }

    /// Overwrite title/content and refresh updated_at. Owner and id are
    /// immutable - the WHERE clause is the ownership check.
    pub async fn update_note(
        &self,
        principal: &AuthUser,
        id: Uuid,
        title: &str,
        content: Option<String>,
    ) -> Result<NoteResponse, NoteError> {
        let title = validate_title(title)?;

        let mut tx = self.pool.begin().await?;

        let user = Self::require_user(&mut tx, &principal.email).await?;
        let note = sqlx::query_as::<_, Note>(UPDATE_NOTE_BY_ID_AND_OWNER)
            .bind(title)
            .bind(content)
            .bind(id)
            .bind(user.id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(NoteError::NotFound)?;

        tx.commit().await?;

        Ok(note.into())
    }

    pub async fn delete_note(&self, principal: &AuthUser, id: Uuid) -> Result<(), NoteError> {
        let mut tx = self.pool.begin().await?;

        let user = Self::require_user(&mut tx, &principal.email).await?;
        let result = sqlx::query(DELETE_NOTE_BY_ID_AND_OWNER)
            .bind(id)
            .bind(user.id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(NoteError::NotFound);
        }

        tx.commit().await?;

        Ok(())
    }

    /// Resolve the principal's account row within the operation's transaction.
    /// Should not fail for a validly authenticated token, but the account may
    /// have been removed since the token was minted.
    async fn require_user(
        tx: &mut Transaction<'_, Postgres>,
        email: &str,
    ) -> Result<User, NoteError> {
        sqlx::query_as::<_, User>(SELECT_USER_BY_EMAIL)
            .bind(email)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| NoteError::UserNotFound(email.to_string()))
    }
}

fn validate_title(title: &str) -> Result<&str, NoteError> {
    if title.trim().is_empty() {
        return Err(NoteError::Validation {
            message: "Title is required".to_string(),
            field: Some(("title".to_string(), "Title must not be blank".to_string())),
        });
    }
    Ok(title)
}
