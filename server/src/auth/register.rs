use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::jwt;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterApiRequest {
    /// Public display name (unique per server)
    pub display_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterApiResponse {
    pub profile_id: String,
    pub access_token: String,
}

/// POST /api/auth/register
/// Create a new profile and issue an access token. Identity is deliberately
/// thin here: the marketplace's real authentication lives in a hosted
/// identity provider and is consumed as an external collaborator.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterApiRequest>,
) -> Result<(StatusCode, Json<RegisterApiResponse>), (StatusCode, String)> {
    let display_name = req.display_name.trim().to_string();
    if display_name.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Display name cannot be empty".to_string(),
        ));
    }
    if display_name.len() > 64 {
        return Err((
            StatusCode::BAD_REQUEST,
            "Display name must be at most 64 characters".to_string(),
        ));
    }

    let db = state.db.clone();
    let name_for_insert = display_name.clone();

    let profile_id = tokio::task::spawn_blocking(move || {
        let conn = db
            .lock()
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("DB lock: {}", e)))?;

        let id = Uuid::now_v7().to_string();
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO profiles (id, display_name, is_blocked, created_at, updated_at)
             VALUES (?1, ?2, 0, ?3, ?3)",
            rusqlite::params![id, name_for_insert, now],
        )
        .map_err(|e| match e {
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                (
                    StatusCode::CONFLICT,
                    "Display name already taken".to_string(),
                )
            }
            other => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to create profile: {}", other),
            ),
        })?;

        Ok::<_, (StatusCode, String)>(id)
    })
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("Task join: {}", e)))??;

    let access_token = jwt::issue_access_token(&state.jwt_secret, &profile_id, &display_name)
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to issue token: {}", e),
            )
        })?;

    tracing::info!(profile_id, display_name, "New profile registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterApiResponse {
            profile_id,
            access_token,
        }),
    ))
}
