use axum::{extract::Path, http::StatusCode, response::Json, Extension};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::services::note_service::{NoteResponse, NoteService};

/// Shared body for create and update; content is optional
#[derive(Debug, Deserialize)]
pub struct NoteRequest {
    pub title: String,
    pub content: Option<String>,
}

/// GET /api/notes - All of the caller's notes, newest first
pub async fn list_get(
    Extension(principal): Extension<AuthUser>,
) -> Result<Json<Vec<NoteResponse>>, ApiError> {
    let service = NoteService::new().await?;
    let notes = service.list_notes(&principal).await?;
    Ok(Json(notes))
}

/// GET /api/notes/:id - A single note owned by the caller
pub async fn record_get(
    Extension(principal): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<NoteResponse>, ApiError> {
    let service = NoteService::new().await?;
    let note = service.get_note(&principal, id).await?;
    Ok(Json(note))
}

/// POST /api/notes - Create a note owned by the caller
pub async fn create_post(
    Extension(principal): Extension<AuthUser>,
    Json(payload): Json<NoteRequest>,
) -> Result<(StatusCode, Json<NoteResponse>), ApiError> {
    let service = NoteService::new().await?;
    let note = service
        .create_note(&principal, &payload.title, payload.content)
        .await?;
    Ok((StatusCode::CREATED, Json(note)))
}

/// PUT /api/notes/:id - Overwrite title/content of the caller's note
pub async fn record_put(
    Extension(principal): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<NoteRequest>,
) -> Result<Json<NoteResponse>, ApiError> {
    let service = NoteService::new().await?;
    let note = service
        .update_note(&principal, id, &payload.title, payload.content)
        .await?;
    Ok(Json(note))
}

/// DELETE /api/notes/:id - Permanently remove the caller's note
pub async fn record_delete(
    Extension(principal): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let service = NoteService::new().await?;
    service.delete_note(&principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
