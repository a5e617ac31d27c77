//! World Fingerprints
//!
//! SHA-256 digests over generated terrain and match state. Used to check
//! that a seed always rebuilds the same world and to tag matches in logs.

use sha2::{Sha256, Digest};
use super::vec3::Vec3;

/// Hash output type (256 bits / 32 bytes)
pub type StateHash = [u8; 32];

/// Deterministic hasher for world state.
///
/// Wraps SHA-256 with helpers for the numeric types used by the simulation.
/// Order of updates is critical for determinism.
pub struct StateHasher {
    hasher: Sha256,
}

impl StateHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Create hasher for terrain.
    pub fn for_terrain() -> Self {
        Self::new(b"ROYALE_TERRAIN_V1")
    }

    /// Create hasher for match state.
    pub fn for_match_state() -> Self {
        Self::new(b"ROYALE_MATCH_V1")
    }

    /// Update with raw bytes.
    #[inline]
    pub fn update_bytes(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    /// Update with a u8 value.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.hasher.update([value]);
    }

    /// Update with a u32 value (little-endian).
    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a u64 value (little-endian).
    #[inline]
    pub fn update_u64(&mut self, value: u64) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with an i32 value (little-endian).
    #[inline]
    pub fn update_i32(&mut self, value: i32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with the bit pattern of an f64.
    #[inline]
    pub fn update_f64(&mut self, value: f64) {
        self.hasher.update(value.to_bits().to_le_bytes());
    }

    /// Update with a Vec3.
    #[inline]
    pub fn update_vec3(&mut self, value: Vec3) {
        self.update_f64(value.x);
        self.update_f64(value.y);
        self.update_f64(value.z);
    }

    /// Update with an optional value, tagging presence first.
    #[inline]
    pub fn update_option<T>(&mut self, value: Option<T>, update: impl FnOnce(&mut Self, T)) {
        match value {
            Some(v) => {
                self.update_u8(1);
                update(self, v);
            }
            None => self.update_u8(0),
        }
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> StateHash {
        self.hasher.finalize().into()
    }
}

/// Compute a simple hash of arbitrary data.
pub fn hash_bytes(data: &[u8]) -> StateHash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Short hex tag for logs (first 8 bytes).
pub fn short_hex(hash: &StateHash) -> String {
    hex::encode(&hash[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hasher_determinism() {
        let mut h1 = StateHasher::for_terrain();
        h1.update_f64(1.5);
        h1.update_vec3(Vec3::new(1.0, 2.0, 3.0));

        let mut h2 = StateHasher::for_terrain();
        h2.update_f64(1.5);
        h2.update_vec3(Vec3::new(1.0, 2.0, 3.0));

        assert_eq!(h1.finalize(), h2.finalize());
    }

    #[test]
    fn test_domain_separation() {
        let mut h1 = StateHasher::for_terrain();
        h1.update_u32(7);
        let mut h2 = StateHasher::for_match_state();
        h2.update_u32(7);

        assert_ne!(h1.finalize(), h2.finalize());
    }

    #[test]
    fn test_option_presence_matters() {
        let mut h1 = StateHasher::for_match_state();
        h1.update_option(Some(0u32), |h, v| h.update_u32(v));
        let mut h2 = StateHasher::for_match_state();
        h2.update_option(None::<u32>, |h, v| h.update_u32(v));

        assert_ne!(h1.finalize(), h2.finalize());
    }

    #[test]
    fn test_short_hex() {
        let hash = hash_bytes(b"royale");
        assert_eq!(short_hex(&hash).len(), 16);
    }
}
