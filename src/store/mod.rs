//! Disk-backed persistence under the user-data root.
//!
//! - `cache`: one JSON snapshot record per repository identity
//! - `settings`: the app-settings envelope, same file format, no expiry

pub mod cache;
pub mod settings;

pub use cache::SnapshotCache;
pub use settings::SettingsStore;

/// Sanitized-plus-hashed file stem for one store key. The sanitized half
/// keeps filenames debuggable; the hash half keeps distinct keys from
/// colliding after sanitization.
pub fn cache_key(identity: &str) -> String {
    format!("{}_{}", safe_component(identity), fold_hash(identity))
}

fn safe_component(identity: &str) -> String {
    identity
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// 32-bit rolling multiply-add over the raw bytes, folded to unsigned hex.
fn fold_hash(identity: &str) -> String {
    let mut h: u32 = 0;
    for byte in identity.bytes() {
        h = h.wrapping_mul(31).wrapping_add(u32::from(byte));
    }
    format!("{:08x}", h)
}
