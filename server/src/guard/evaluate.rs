//! The reupload decision state machine.
//!
//! One evaluation per upload attempt, single-threaded, no retries. The only
//! concurrency safeguard is the ledger's (user_id, file_hash) primary key:
//! a racing insert lands in the existing-row branch instead of erroring.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DbPool;
use crate::guard::decision::Decision;

/// Evaluate one upload attempt against the reupload policy.
///
/// `existing_owner_id` is the catalog owner of a pack with this exact hash,
/// if one exists. The caller computes `file_hash` over the full file bytes.
///
/// Never returns an error: any store failure is mapped to a fail-closed
/// `LOOKUP_FAILED` decision.
pub fn evaluate(
    db: &DbPool,
    uploader_id: &str,
    file_hash: &str,
    existing_owner_id: Option<&str>,
) -> Decision {
    match evaluate_inner(db, uploader_id, file_hash, existing_owner_id) {
        Ok(decision) => decision,
        Err(e) => {
            tracing::error!(
                uploader_id,
                file_hash,
                "Reupload guard store error, denying upload: {}",
                e
            );
            Decision::lookup_failed()
        }
    }
}

fn evaluate_inner(
    db: &DbPool,
    uploader_id: &str,
    file_hash: &str,
    existing_owner_id: Option<&str>,
) -> Result<Decision, String> {
    let mut conn = db.lock().map_err(|e| format!("DB lock error: {}", e))?;

    // Step 1: fetch the uploader's profile. A missing row is a failure,
    // not an allow — the caller should always hold a registered profile.
    let profile = conn
        .query_row(
            "SELECT is_blocked, blocked_reason FROM profiles WHERE id = ?1",
            [uploader_id],
            |row| {
                Ok((
                    row.get::<_, bool>(0)?,
                    row.get::<_, Option<String>>(1)?,
                ))
            },
        )
        .optional()
        .map_err(|e| format!("Profile lookup failed: {}", e))?;

    let (is_blocked, blocked_reason) = match profile {
        Some(p) => p,
        None => return Err(format!("No profile for uploader {}", uploader_id)),
    };

    // Step 2: a globally blocked account is rejected before the ledger is
    // ever inspected, regardless of what it is uploading.
    if is_blocked {
        return Ok(Decision::account_blocked(0, blocked_reason));
    }

    // Step 3: novel hash, or the uploader owns the pre-existing copy.
    // This is the only success path.
    match existing_owner_id {
        None => return Ok(Decision::allow()),
        Some(owner) if owner == uploader_id => return Ok(Decision::allow()),
        Some(_) => {}
    }

    // Step 4: genuine cross-account duplicate. Record the violation and
    // escalate inside a single transaction so the profile and ledger can
    // never disagree about a block.
    let tx = conn
        .transaction()
        .map_err(|e| format!("Failed to open transaction: {}", e))?;
    let decision = record_violation(&tx, uploader_id, file_hash)?;
    tx.commit()
        .map_err(|e| format!("Failed to commit violation: {}", e))?;

    Ok(decision)
}

/// Ledger branch of the state machine. Runs inside an open transaction.
fn record_violation(
    tx: &Connection,
    uploader_id: &str,
    file_hash: &str,
) -> Result<Decision, String> {
    let now = Utc::now().to_rfc3339();

    // First violation for this hash: create the ledger row and warn.
    // ON CONFLICT DO NOTHING absorbs a racing insert from a concurrent
    // request — zero rows changed means the row already exists.
    let inserted = tx
        .execute(
            "INSERT INTO upload_attempts
                 (user_id, file_hash, attempt_count, blocked_at, created_at, updated_at)
             VALUES (?1, ?2, 1, NULL, ?3, ?3)
             ON CONFLICT(user_id, file_hash) DO NOTHING",
            params![uploader_id, file_hash, now],
        )
        .map_err(|e| format!("Failed to insert attempt row: {}", e))?;

    if inserted == 1 {
        tracing::warn!(
            uploader_id,
            file_hash,
            "Duplicate upload detected, first violation — warning issued"
        );
        return Ok(Decision::duplicate_file());
    }

    let (attempt_count, blocked_at): (i64, Option<String>) = tx
        .query_row(
            "SELECT attempt_count, blocked_at FROM upload_attempts
             WHERE user_id = ?1 AND file_hash = ?2",
            params![uploader_id, file_hash],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .map_err(|e| format!("Failed to read attempt row: {}", e))?;

    if blocked_at.is_some() {
        // The ledger says this hash already triggered a block, but the
        // profile read said unblocked — a leftover from an interrupted
        // transition. Re-apply the profile block so the state converges.
        // No increment: re-reading an already-blocked row is not a new
        // violation.
        tracing::warn!(
            uploader_id,
            file_hash,
            "Ledger blocked but profile unblocked — converging block state"
        );
        let reason = block_reason(file_hash);
        apply_profile_block(tx, uploader_id, &reason, &now)?;
        return Ok(Decision::account_blocked(attempt_count, Some(reason)));
    }

    // Second or later violation for this hash: the one-strike allowance is
    // spent. Block the account and stamp the ledger.
    let reason = block_reason(file_hash);
    apply_profile_block(tx, uploader_id, &reason, &now)?;
    tx.execute(
        "UPDATE upload_attempts
         SET attempt_count = attempt_count + 1, blocked_at = ?3, updated_at = ?3
         WHERE user_id = ?1 AND file_hash = ?2",
        params![uploader_id, file_hash, now],
    )
    .map_err(|e| format!("Failed to stamp attempt row: {}", e))?;

    tracing::warn!(
        uploader_id,
        file_hash,
        attempt_count = attempt_count + 1,
        "Repeated duplicate upload — account permanently blocked"
    );

    Ok(Decision::account_blocked(attempt_count + 1, Some(reason)))
}

/// Idempotent: blocking an already-blocked profile is a no-op that keeps
/// the original reason and timestamp.
fn apply_profile_block(
    tx: &Connection,
    uploader_id: &str,
    reason: &str,
    now: &str,
) -> Result<(), String> {
    tx.execute(
        "UPDATE profiles
         SET is_blocked = 1, blocked_reason = ?2, blocked_at = ?3, updated_at = ?3
         WHERE id = ?1 AND is_blocked = 0",
        params![uploader_id, reason, now],
    )
    .map_err(|e| format!("Failed to block profile: {}", e))?;
    Ok(())
}

fn block_reason(file_hash: &str) -> String {
    format!(
        "Repeated attempts to upload content owned by another user (file {})",
        file_hash
    )
}
