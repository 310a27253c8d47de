//! Content-addressed hashing primitives
//!
//! Provides [`ContentHash`], a strongly-typed 32-byte hash used to detect
//! whether a file changed between the moment it was read and the moment a
//! rewrite is committed over it.

use std::fmt::{self, Display, Formatter};

/// A 32-byte content hash (Blake3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Compute Blake3 hash of arbitrary data
    #[inline]
    #[must_use]
    pub fn compute(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Short string representation (first 16 hex chars)
    #[inline]
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl Display for ContentHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compute_is_deterministic() {
        let a = ContentHash::compute(b"package config\n");
        let b = ContentHash::compute(b"package config\n");
        assert_eq!(a, b);
        assert_ne!(a, ContentHash::compute(b"package main\n"));
    }

    #[test]
    fn display_is_hex() {
        let hash = ContentHash::compute(b"retrydelay: 0\n");
        let full = hash.to_string();
        assert_eq!(full.len(), 64);
        assert!(full.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(full.starts_with(&hash.short()));
        assert_eq!(hash.short().len(), 16);
    }
}
