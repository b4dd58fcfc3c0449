//! Cheap rolling fingerprints for cache invalidation.
//!
//! These are FNV-1a hashes, not cryptographic digests. They only need to
//! change when the schema or configuration drifts enough to invalidate a
//! cached detection result.

use crate::snapshot::SchemaSnapshot;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(state: u64, bytes: &[u8]) -> u64 {
    let mut hash = state;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Fingerprint a schema snapshot: sorted table names plus relationship and
/// integrity-rule counts.
pub fn schema_fingerprint(snapshot: &SchemaSnapshot) -> String {
    let mut hash = FNV_OFFSET;
    for name in snapshot.table_names() {
        hash = fnv1a(hash, name.as_bytes());
        hash = fnv1a(hash, b"\x1f");
    }
    hash = fnv1a(hash, snapshot.relationships.len().to_string().as_bytes());
    hash = fnv1a(hash, b"\x1f");
    hash = fnv1a(hash, snapshot.integrity_rules.len().to_string().as_bytes());
    format!("{hash:016x}")
}

/// Fingerprint arbitrary configuration fields, joined in caller order.
pub fn config_fingerprint(fields: &[&str]) -> String {
    let mut hash = FNV_OFFSET;
    for field in fields {
        hash = fnv1a(hash, field.as_bytes());
        hash = fnv1a(hash, b"\x1f");
    }
    format!("{hash:016x}")
}
