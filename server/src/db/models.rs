/// Database row types for all tables.
/// These correspond 1:1 to the SQLite schema defined in migrations.rs.

/// Seller/buyer profile in the profiles table
#[derive(Debug, Clone)]
pub struct Profile {
    pub id: String,
    pub display_name: String,
    pub is_blocked: bool,
    pub blocked_reason: Option<String>,
    pub blocked_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Sample pack record in the packs table.
/// `file_hash` is the hex SHA-256 fingerprint of the archive bytes and is
/// unique across the whole catalog.
#[derive(Debug, Clone)]
pub struct Pack {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub file_hash: String,
    pub size: i64,
    pub created_at: String,
}

/// Reupload violation ledger row, keyed by (user_id, file_hash).
/// Created on the first detected cross-account duplicate, never deleted.
#[derive(Debug, Clone)]
pub struct UploadAttempt {
    pub user_id: String,
    pub file_hash: String,
    pub attempt_count: i64,
    pub blocked_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}
