//! Pack metadata storage (SQLite) and archive file I/O.

use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::db::models::Pack;
use crate::db::DbPool;

/// Compute the pack storage directory path.
fn packs_dir(data_dir: &str) -> PathBuf {
    Path::new(data_dir).join("packs")
}

/// Compute the archive file path for a pack given its hex hash.
fn pack_file_path(data_dir: &str, hash_hex: &str) -> PathBuf {
    packs_dir(data_dir).join(hash_hex)
}

/// Look up the catalog owner of a pack with the given content hash.
/// Returns `Ok(None)` if no pack with this hash exists.
pub fn find_by_hash(db: &DbPool, hash_hex: &str) -> Result<Option<Pack>, String> {
    let conn = db.lock().map_err(|e| format!("DB lock error: {}", e))?;
    conn.query_row(
        "SELECT id, owner_id, title, file_hash, size, created_at
         FROM packs WHERE file_hash = ?1",
        [hash_hex],
        pack_from_row,
    )
    .optional()
    .map_err(|e| format!("Failed to query pack by hash: {}", e))
}

/// Fetch a pack by its id.
pub fn get_pack(db: &DbPool, pack_id: &str) -> Result<Option<Pack>, String> {
    let conn = db.lock().map_err(|e| format!("DB lock error: {}", e))?;
    conn.query_row(
        "SELECT id, owner_id, title, file_hash, size, created_at
         FROM packs WHERE id = ?1",
        [pack_id],
        pack_from_row,
    )
    .optional()
    .map_err(|e| format!("Failed to query pack: {}", e))
}

/// Store a pack: write the archive file, then insert the metadata row.
/// The caller has already verified the hash and consulted the reupload guard.
pub fn put_pack(
    db: &DbPool,
    data_dir: &str,
    owner_id: &str,
    title: &str,
    hash_hex: &str,
    data: &[u8],
) -> Result<Pack, String> {
    let dir = packs_dir(data_dir);
    std::fs::create_dir_all(&dir)
        .map_err(|e| format!("Failed to create packs directory: {}", e))?;

    let file_path = pack_file_path(data_dir, hash_hex);
    std::fs::write(&file_path, data)
        .map_err(|e| format!("Failed to write pack file: {}", e))?;

    let pack = Pack {
        id: Uuid::now_v7().to_string(),
        owner_id: owner_id.to_string(),
        title: title.to_string(),
        file_hash: hash_hex.to_string(),
        size: data.len() as i64,
        created_at: Utc::now().to_rfc3339(),
    };

    let conn = db.lock().map_err(|e| format!("DB lock error: {}", e))?;
    conn.execute(
        "INSERT INTO packs (id, owner_id, title, file_hash, size, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            pack.id,
            pack.owner_id,
            pack.title,
            pack.file_hash,
            pack.size,
            pack.created_at,
        ],
    )
    .map_err(|e| format!("Failed to insert pack metadata: {}", e))?;

    tracing::debug!("Stored pack {} ({} bytes)", pack.id, pack.size);

    Ok(pack)
}

/// Read a pack's archive bytes from disk.
pub fn read_pack_file(data_dir: &str, hash_hex: &str) -> Result<Vec<u8>, String> {
    let file_path = pack_file_path(data_dir, hash_hex);
    std::fs::read(&file_path).map_err(|e| {
        format!("Failed to read pack file {}: {}", file_path.display(), e)
    })
}

/// One catalog listing row (pack joined with its owner's display name).
#[derive(Debug, Clone)]
pub struct CatalogRow {
    pub pack: Pack,
    pub owner_name: String,
}

/// List the whole catalog, newest first.
pub fn list_packs(db: &DbPool) -> Result<Vec<CatalogRow>, String> {
    let conn = db.lock().map_err(|e| format!("DB lock error: {}", e))?;
    let mut stmt = conn
        .prepare(
            "SELECT p.id, p.owner_id, p.title, p.file_hash, p.size, p.created_at,
                    pr.display_name
             FROM packs p
             JOIN profiles pr ON pr.id = p.owner_id
             ORDER BY p.created_at DESC",
        )
        .map_err(|e| format!("Failed to prepare catalog query: {}", e))?;

    let rows = stmt
        .query_map([], |row| {
            Ok(CatalogRow {
                pack: pack_from_row(row)?,
                owner_name: row.get(6)?,
            })
        })
        .map_err(|e| format!("Failed to query catalog: {}", e))?
        .filter_map(|r| r.ok())
        .collect();

    Ok(rows)
}

fn pack_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Pack> {
    Ok(Pack {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        title: row.get(2)?,
        file_hash: row.get(3)?,
        size: row.get(4)?,
        created_at: row.get(5)?,
    })
}
