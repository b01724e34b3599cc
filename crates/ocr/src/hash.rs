use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of the submitted image, so callers can spot
/// re-scans of the same photo.
pub fn image_digest(data: &[u8]) -> String {
    Sha256::digest(data).iter().map(|b| format!("{b:02x}")).collect()
}
