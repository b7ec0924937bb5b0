use serde::Serialize;

/// Outcome classification for a guard evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    /// No prior art for this hash (or the uploader owns it) — upload proceeds.
    None,
    /// Reserved: account restricted before this upload was ever evaluated.
    /// Every blocked outcome currently reports `AccountBlocked`; this
    /// variant exists so clients can distinguish the cases if the taxonomy
    /// is ever split.
    AlreadyBlocked,
    /// First detected cross-account duplicate for this hash. Rejection only.
    DuplicateFile,
    /// This violation triggered (or re-confirmed) a permanent account block.
    AccountBlocked,
    /// Profile or ledger was unreachable. The guard fails closed.
    LookupFailed,
}

/// Result of evaluating one upload attempt against the reupload policy.
#[derive(Debug, Clone, Serialize)]
pub struct Decision {
    /// Whether the upload may proceed. The only `true` path is `None`.
    pub allowed: bool,
    /// Whether the uploader's account is (now) permanently blocked.
    pub blocked: bool,
    /// Violation count recorded in the ledger for this (user, hash) pair.
    /// Zero when no ledger row is involved.
    pub attempt_count: i64,
    pub reason: ReasonCode,
    /// User-facing explanation, surfaced verbatim by the upload handler.
    pub message: String,
}

impl Decision {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            blocked: false,
            attempt_count: 0,
            reason: ReasonCode::None,
            message: String::new(),
        }
    }

    pub fn duplicate_file() -> Self {
        Self {
            allowed: false,
            blocked: false,
            attempt_count: 1,
            reason: ReasonCode::DuplicateFile,
            message: "This file already exists in the catalog under another \
                      account. Uploading content you do not own is not \
                      allowed. A second attempt with this file will \
                      permanently block your account."
                .to_string(),
        }
    }

    pub fn account_blocked(attempt_count: i64, reason: Option<String>) -> Self {
        Self {
            allowed: false,
            blocked: true,
            attempt_count,
            reason: ReasonCode::AccountBlocked,
            message: reason.unwrap_or_else(|| {
                "Your account has been permanently blocked for repeatedly \
                 uploading content owned by another user."
                    .to_string()
            }),
        }
    }

    pub fn lookup_failed() -> Self {
        Self {
            allowed: false,
            blocked: false,
            attempt_count: 0,
            reason: ReasonCode::LookupFailed,
            message: "Could not verify account status. Please try again later."
                .to_string(),
        }
    }
}
