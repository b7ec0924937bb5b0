use axum::{extract::State, http::StatusCode, Json};
use rusqlite::OptionalExtension;
use serde::Serialize;

use crate::auth::middleware::Claims;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: String,
    pub display_name: String,
    pub is_blocked: bool,
    pub blocked_reason: Option<String>,
    pub blocked_at: Option<String>,
    pub created_at: String,
}

/// GET /api/profile/me — The authenticated user's own profile, including
/// the blocked flags so a restricted seller sees why uploads are rejected.
pub async fn get_me(
    State(state): State<AppState>,
    claims: Claims,
) -> Result<Json<ProfileResponse>, (StatusCode, String)> {
    let db = state.db.clone();
    let profile_id = claims.sub.clone();

    let profile = tokio::task::spawn_blocking(move || {
        let conn = db
            .lock()
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB lock: {}", e)))?;

        conn.query_row(
            "SELECT id, display_name, is_blocked, blocked_reason, blocked_at, created_at
             FROM profiles WHERE id = ?1",
            [&profile_id],
            |row| {
                Ok(ProfileResponse {
                    id: row.get(0)?,
                    display_name: row.get(1)?,
                    is_blocked: row.get(2)?,
                    blocked_reason: row.get(3)?,
                    blocked_at: row.get(4)?,
                    created_at: row.get(5)?,
                })
            },
        )
        .optional()
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Profile lookup failed: {}", e),
            )
        })
    })
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Task join: {}", e)))??;

    match profile {
        Some(p) => Ok(Json(p)),
        None => Err((StatusCode::NOT_FOUND, "Profile not found".to_string())),
    }
}
