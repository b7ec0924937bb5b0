use crate::db::DbPool;

/// Shared application state passed to all handlers via axum State extractor.
/// The DB handle is injected here rather than held in a global so tests can
/// spin up isolated servers side by side.
#[derive(Clone)]
pub struct AppState {
    /// SQLite connection wrapped in Arc<Mutex>
    pub db: DbPool,
    /// JWT signing secret (256-bit random key)
    pub jwt_secret: Vec<u8>,
    /// Data directory for pack archive files
    pub data_dir: String,
    /// Maximum pack upload size in megabytes
    pub max_upload_size_mb: u32,
}
