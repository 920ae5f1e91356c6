use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    pub content: Option<String>,
    /// Owner reference, assigned at creation and never reassigned
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
