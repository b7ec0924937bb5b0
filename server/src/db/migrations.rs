use rusqlite_migration::{Migrations, M};

/// Define all schema migrations.
/// Uses SQLite user_version pragma for tracking — no migration table needed.
pub fn migrations() -> Migrations<'static> {
    Migrations::new(vec![
        M::up(
            "-- Migration 1: profiles and pack catalog

CREATE TABLE profiles (
    id TEXT PRIMARY KEY,
    display_name TEXT NOT NULL UNIQUE,
    is_blocked INTEGER NOT NULL DEFAULT 0,
    blocked_reason TEXT,
    blocked_at TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE packs (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL,
    title TEXT NOT NULL,
    file_hash TEXT NOT NULL UNIQUE,
    size INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    FOREIGN KEY (owner_id) REFERENCES profiles(id)
);

CREATE INDEX idx_packs_owner ON packs(owner_id);
",
        ),
        M::up(
            "-- Migration 2: reupload attempt ledger
-- One row per (uploader, content hash) with at least one violation.
-- The composite primary key is the only concurrency safeguard against
-- two simultaneous duplicate uploads racing to create the row.

CREATE TABLE upload_attempts (
    user_id TEXT NOT NULL,
    file_hash TEXT NOT NULL,
    attempt_count INTEGER NOT NULL DEFAULT 1,
    blocked_at TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (user_id, file_hash),
    FOREIGN KEY (user_id) REFERENCES profiles(id)
);
",
        ),
    ])
}
