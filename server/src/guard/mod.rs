//! Reupload protection for the pack catalog.
//!
//! Every pack archive is fingerprinted by its SHA-256 content hash. When an
//! upload arrives whose hash already exists in the catalog under a different
//! account, the guard rejects it and records the violation in the
//! `upload_attempts` ledger. The first violation for a given hash is a
//! warning-only rejection; a second violation for the same hash permanently
//! blocks the uploader's account.
//!
//! The guard fails closed: any store error denies the upload rather than
//! letting it through unverified.

pub mod decision;
pub mod evaluate;

pub use decision::{Decision, ReasonCode};
pub use evaluate::evaluate;
