use sha2::{Digest, Sha256};

/// 128-bit session hash: the first 16 bytes of SHA-256, big-endian.
pub fn session_hash(session_id: &str) -> u128 {
    let digest = Sha256::digest(session_id.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    u128::from_be_bytes(bytes)
}
