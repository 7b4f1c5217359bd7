//! SHA-384 content hashes.

use crate::error::{StorageError, StorageResult};
use sha2::{Digest, Sha384};
use std::fmt;
use std::str::FromStr;

/// Size of a SHA-384 digest in bytes.
pub const HASH_SIZE: usize = 48;

/// A SHA-384 digest of a blob's content.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; HASH_SIZE]);

impl ContentHash {
    /// Creates a hash from raw digest bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }

    /// Returns the raw digest bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    /// Hashes a complete buffer.
    #[must_use]
    pub fn compute(data: &[u8]) -> Self {
        let mut hasher = ContentHasher::new();
        hasher.update(data);
        hasher.finalize()
    }

    /// Parses a lowercase or uppercase hex digest.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidHash`] if the string is not exactly
    /// 96 hex characters.
    pub fn from_hex(s: &str) -> StorageResult<Self> {
        if s.len() != HASH_SIZE * 2 {
            return Err(StorageError::InvalidHash(format!(
                "expected {} hex chars, got {}",
                HASH_SIZE * 2,
                s.len()
            )));
        }
        let mut bytes = [0u8; HASH_SIZE];
        for (i, pair) in s.as_bytes().chunks(2).enumerate() {
            if !pair.iter().all(u8::is_ascii_hexdigit) {
                return Err(StorageError::InvalidHash(format!(
                    "non-hex character at offset {}",
                    i * 2
                )));
            }
            let text = std::str::from_utf8(pair)
                .map_err(|e| StorageError::InvalidHash(e.to_string()))?;
            bytes[i] = u8::from_str_radix(text, 16)
                .map_err(|e| StorageError::InvalidHash(format!("{text:?}: {e}")))?;
        }
        Ok(Self(bytes))
    }

    /// Encodes the digest as lowercase hex.
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.to_hex())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ContentHash {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

/// Incremental SHA-384 hasher that also counts the bytes it has seen.
#[derive(Clone, Default)]
pub struct ContentHasher {
    digest: Sha384,
    len: u64,
}

impl ContentHasher {
    /// Creates an empty hasher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds more content.
    pub fn update(&mut self, data: &[u8]) {
        self.digest.update(data);
        self.len += data.len() as u64;
    }

    /// Number of bytes hashed so far.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Returns true if no bytes have been hashed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Finishes hashing.
    #[must_use]
    pub fn finalize(self) -> ContentHash {
        let digest = self.digest.finalize();
        let mut bytes = [0u8; HASH_SIZE];
        bytes.copy_from_slice(&digest);
        ContentHash(bytes)
    }
}

impl fmt::Debug for ContentHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentHasher")
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABC_SHA384: &str = concat!(
        "cb00753f45a35e8bb5a03d699ac65007272c32ab0eded163",
        "1a8b605a43ff5bed8086072ba1e7cc2358baeca134c825a7"
    );

    #[test]
    fn compute_matches_known_vector() {
        assert_eq!(ContentHash::compute(b"abc").to_hex(), ABC_SHA384);
    }

    #[test]
    fn incremental_matches_one_shot() {
        let mut hasher = ContentHasher::new();
        hasher.update(b"a");
        hasher.update(b"bc");
        assert_eq!(hasher.len(), 3);
        assert_eq!(hasher.finalize(), ContentHash::compute(b"abc"));
    }

    #[test]
    fn hex_parse_accepts_uppercase() {
        let parsed = ContentHash::from_hex(&ABC_SHA384.to_uppercase()).unwrap();
        assert_eq!(parsed, ContentHash::compute(b"abc"));
    }

    #[test]
    fn hex_parse_rejects_wrong_length() {
        let result = ContentHash::from_hex("abcd");
        assert!(matches!(result, Err(StorageError::InvalidHash(_))));
    }

    #[test]
    fn hex_parse_rejects_non_hex() {
        let bad = "zz".repeat(HASH_SIZE);
        assert!(ContentHash::from_hex(&bad).is_err());

        let signed = format!("+{}", "a".repeat(HASH_SIZE * 2 - 1));
        assert!(matches!(
            ContentHash::from_hex(&signed),
            Err(StorageError::InvalidHash(_))
        ));
    }

    #[test]
    fn display_is_hex() {
        let hash = ContentHash::compute(b"abc");
        assert_eq!(hash.to_string(), ABC_SHA384);
        assert_eq!(ABC_SHA384.parse::<ContentHash>().unwrap(), hash);
    }

    proptest::proptest! {
        #[test]
        fn split_updates_match_one_shot(
            data in proptest::collection::vec(proptest::num::u8::ANY, 0..512),
            split in 0usize..512,
        ) {
            let split = split.min(data.len());
            let mut hasher = ContentHasher::new();
            hasher.update(&data[..split]);
            hasher.update(&data[split..]);
            proptest::prop_assert_eq!(hasher.finalize(), ContentHash::compute(&data));
        }
    }
}
