//! REST endpoints for pack upload, download, and the public catalog.
//!
//! POST /api/packs — Upload a pack archive (raw binary body, X-Pack-Title header)
//! GET /api/packs — Public catalog listing
//! GET /api/packs/:id/download — Download a pack archive (returns raw binary)

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;

use crate::auth::middleware::Claims;
use crate::guard::{self, ReasonCode};
use crate::packs::{fingerprint, store};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PackUploadResponse {
    pub pack_id: String,
    pub hash: String,
    pub size: u64,
    /// True when the uploader re-submitted a byte-identical archive they
    /// already own; the existing catalog entry is returned unchanged.
    pub reused: bool,
}

#[derive(Debug, Serialize)]
pub struct PackInfo {
    pub id: String,
    pub title: String,
    pub owner_id: String,
    pub owner_name: String,
    pub hash: String,
    pub size: i64,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub packs: Vec<PackInfo>,
}

/// POST /api/packs
///
/// Upload a sample pack. The raw binary body is the pack archive.
/// Required header: `X-Pack-Title`.
/// Optional header: `X-Pack-Hash` (hex-encoded SHA-256); if present it must
/// match the server-computed fingerprint.
///
/// The server fingerprints the body, checks the catalog for a pack with the
/// same hash, and consults the reupload guard before storing anything.
pub async fn upload_pack(
    State(state): State<AppState>,
    claims: Claims,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<PackUploadResponse>), (StatusCode, String)> {
    let title = headers
        .get("x-pack-title")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or((
            StatusCode::BAD_REQUEST,
            "Missing X-Pack-Title header".to_string(),
        ))?
        .to_string();

    let client_hash = headers
        .get("x-pack-hash")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_lowercase());
    if let Some(ref h) = client_hash {
        if !fingerprint::is_valid_fingerprint(h) {
            return Err((
                StatusCode::BAD_REQUEST,
                "X-Pack-Hash must be a 64-character hex string (SHA-256)".to_string(),
            ));
        }
    }

    if body.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Empty pack archive".to_string()));
    }

    let size = body.len() as u64;
    let max_upload_bytes = state.max_upload_size_mb as u64 * 1024 * 1024;
    if size > max_upload_bytes {
        return Err((
            StatusCode::PAYLOAD_TOO_LARGE,
            format!(
                "Pack size {} bytes exceeds maximum upload size of {} MB",
                size, state.max_upload_size_mb
            ),
        ));
    }

    let db = state.db.clone();
    let data_dir = state.data_dir.clone();
    let uploader_id = claims.sub.clone();
    let data = body.to_vec();

    let (status, response) = tokio::task::spawn_blocking(move || {
        let hash_hex = fingerprint::fingerprint_bytes(&data);

        // Client-supplied hash is advisory; a mismatch means the upload was
        // corrupted in transit or the client hashed the wrong file.
        if let Some(ref h) = client_hash {
            if *h != hash_hex {
                return Err((
                    StatusCode::BAD_REQUEST,
                    format!("Hash mismatch: expected {}, computed {}", h, hash_hex),
                ));
            }
        }

        let existing = store::find_by_hash(&db, &hash_hex)
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e))?;

        let decision = guard::evaluate(
            &db,
            &uploader_id,
            &hash_hex,
            existing.as_ref().map(|p| p.owner_id.as_str()),
        );

        if !decision.allowed {
            return Err((reason_status(decision.reason), decision.message));
        }

        // Self re-upload of an archive already in the catalog: the catalog
        // is unique per hash, so return the existing entry instead of
        // inserting a second row.
        if let Some(pack) = existing {
            return Ok((
                StatusCode::OK,
                PackUploadResponse {
                    pack_id: pack.id,
                    hash: hash_hex,
                    size,
                    reused: true,
                },
            ));
        }

        let pack = store::put_pack(&db, &data_dir, &uploader_id, &title, &hash_hex, &data)
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e))?;

        Ok((
            StatusCode::CREATED,
            PackUploadResponse {
                pack_id: pack.id,
                hash: hash_hex,
                size,
                reused: false,
            },
        ))
    })
    .await
    .map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Task join error: {}", e),
        )
    })??;

    Ok((status, Json(response)))
}

/// Map a guard rejection onto an HTTP status.
fn reason_status(reason: ReasonCode) -> StatusCode {
    match reason {
        ReasonCode::DuplicateFile => StatusCode::CONFLICT,
        ReasonCode::AccountBlocked | ReasonCode::AlreadyBlocked => StatusCode::FORBIDDEN,
        ReasonCode::LookupFailed => StatusCode::SERVICE_UNAVAILABLE,
        // Allowed decisions never reach this mapping.
        ReasonCode::None => StatusCode::OK,
    }
}

/// GET /api/packs — Public catalog listing, newest first.
pub async fn list_packs(
    State(state): State<AppState>,
) -> Result<Json<CatalogResponse>, (StatusCode, String)> {
    let db = state.db.clone();

    let rows = tokio::task::spawn_blocking(move || store::list_packs(&db))
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Task join error: {}", e),
            )
        })?
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e))?;

    let packs = rows
        .into_iter()
        .map(|row| PackInfo {
            id: row.pack.id,
            title: row.pack.title,
            owner_id: row.pack.owner_id,
            owner_name: row.owner_name,
            hash: row.pack.file_hash,
            size: row.pack.size,
            created_at: row.pack.created_at,
        })
        .collect();

    Ok(Json(CatalogResponse { packs }))
}

/// GET /api/packs/:id/download
///
/// Download a pack archive by id. Returns the raw binary data with
/// `Content-Type: application/octet-stream`. Returns 404 if not found.
pub async fn download_pack(
    State(state): State<AppState>,
    _claims: Claims,
    Path(pack_id): Path<String>,
) -> Result<(StatusCode, HeaderMap, Vec<u8>), (StatusCode, String)> {
    let db = state.db.clone();
    let data_dir = state.data_dir.clone();

    let result = tokio::task::spawn_blocking(move || {
        let pack = store::get_pack(&db, &pack_id)?;
        match pack {
            Some(p) => Ok(Some(store::read_pack_file(&data_dir, &p.file_hash)?)),
            None => Ok::<_, String>(None),
        }
    })
    .await
    .map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Task join error: {}", e),
        )
    })?
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e))?;

    match result {
        Some(data) => {
            let mut headers = HeaderMap::new();
            headers.insert(
                axum::http::header::CONTENT_TYPE,
                "application/octet-stream".parse().unwrap(),
            );
            Ok((StatusCode::OK, headers, data))
        }
        None => Err((StatusCode::NOT_FOUND, "Pack not found".to_string())),
    }
}
