//! Sample pack catalog: content fingerprinting, file storage, and the
//! upload/download/list endpoints.
//!
//! Pack archives are content-addressed by their SHA-256 hash. Each pack is
//! stored as:
//! - Metadata row in the `packs` table (id, owner, title, hash, size)
//! - Archive file at `{data_dir}/packs/{hex_hash}`

pub mod fingerprint;
pub mod routes;
pub mod store;
