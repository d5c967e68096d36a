//! Digest primitives for filesync.
//!
//! Wraps SHA-512 with strong types. File contents and the inventory
//! aggregate travel as base64 text; password digests are handed to the
//! credential store as raw bytes.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha512};

use crate::error::CoreError;

/// Raw length of a SHA-512 digest.
pub const DIGEST_LEN: usize = 64;

/// Length of a SHA-512 digest in padded base64.
pub const DIGEST_BASE64_LEN: usize = 88;

/// A 64-byte SHA-512 digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sha512Digest(pub [u8; DIGEST_LEN]);

impl Sha512Digest {
    /// Compute the SHA-512 digest of the given data.
    pub fn hash(data: &[u8]) -> Self {
        let mut hasher = ContentHasher::new();
        hasher.update(data);
        hasher.finalize()
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Encode as padded base64, the form used on the wire.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// Parse from padded base64.
    pub fn from_base64(s: &str) -> Result<Self, CoreError> {
        let bytes = STANDARD
            .decode(s)
            .map_err(|e| CoreError::InvalidDigest(e.to_string()))?;
        let arr: [u8; DIGEST_LEN] = bytes
            .try_into()
            .map_err(|v: Vec<u8>| CoreError::InvalidDigest(format!("expected 64 bytes, got {}", v.len())))?;
        Ok(Self(arr))
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Sha512Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sha512({})", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for Sha512Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; DIGEST_LEN]> for Sha512Digest {
    fn from(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }
}

/// Incremental SHA-512 over content fed in blocks.
#[derive(Clone, Default)]
pub struct ContentHasher {
    inner: Sha512,
}

impl ContentHasher {
    pub fn new() -> Self {
        Self { inner: Sha512::new() }
    }

    pub fn update(&mut self, block: &[u8]) {
        self.inner.update(block);
    }

    pub fn finalize(self) -> Sha512Digest {
        let mut out = [0u8; DIGEST_LEN];
        out.copy_from_slice(&self.inner.finalize());
        Sha512Digest(out)
    }
}

/// Aggregate digest over per-file digests.
///
/// Hashes the concatenation of the base64 digest texts in the order
/// given, then base64-encodes the result. Callers pass digests in
/// inventory order (ascending file name).
pub fn aggregate_digest<'a, I>(file_digests: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut hasher = ContentHasher::new();
    for digest in file_digests {
        hasher.update(digest.as_bytes());
    }
    hasher.finalize().to_base64()
}

/// A password digest as passed to the credential store.
///
/// SHA-512 of the password with byte `j` shifted by `3 * j`. The shift
/// is constant across users and therefore no salt at all; it is kept
/// bit-exact so existing credential rows keep verifying. Do not rely on
/// it for resistance against precomputed tables.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PasswordDigest(pub [u8; DIGEST_LEN]);

impl PasswordDigest {
    /// Digest a plaintext password.
    pub fn derive(password: &str) -> Self {
        let mut bytes = Sha512Digest::hash(password.as_bytes()).0;
        for (j, byte) in bytes.iter_mut().enumerate() {
            *byte = byte.wrapping_add((j * 3) as u8);
        }
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Encode as padded base64, the form credential stores persist.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }
}

impl fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordDigest(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha512_known_answer() {
        assert_eq!(
            Sha512Digest::hash(b"hello world").to_base64(),
            "MJ7MSJwS1utMxA9QyQLytNDtd+5RGnx6m808qG1M2G+YndNbxf9JlnDaNCVbRbDP2DDoH2Bdz33FVC6TrpzXbw=="
        );
    }

    #[test]
    fn test_incremental_matches_one_shot() {
        let data = vec![0x5Au8; 3000];
        let mut hasher = ContentHasher::new();
        for block in data.chunks(1024) {
            hasher.update(block);
        }
        assert_eq!(hasher.finalize(), Sha512Digest::hash(&data));
    }

    #[test]
    fn test_base64_is_fixed_length() {
        let encoded = Sha512Digest::hash(b"").to_base64();
        assert_eq!(encoded.len(), DIGEST_BASE64_LEN);
        assert_eq!(Sha512Digest::from_base64(&encoded).unwrap(), Sha512Digest::hash(b""));
    }

    #[test]
    fn test_from_base64_rejects_short_input() {
        assert!(Sha512Digest::from_base64("AAAA").is_err());
        assert!(Sha512Digest::from_base64("not base64!").is_err());
    }

    #[test]
    fn test_aggregate_of_nothing_is_hash_of_empty() {
        assert_eq!(
            aggregate_digest(std::iter::empty()),
            "z4PhNX7vuL3xVChQ1m2AB9Yg5AULVxXcg/SpIdNs6c5H0NE8XYXysP+DGNKHfuwvY7kxvUdBeoGlODJ6+SfaPg=="
        );
    }

    #[test]
    fn test_aggregate_depends_on_order() {
        let a = Sha512Digest::hash(b"alpha").to_base64();
        let b = Sha512Digest::hash(b"beta").to_base64();
        assert_eq!(
            aggregate_digest([a.as_str(), b.as_str()]),
            "wZGV8bYu6JC5GrV5rhn1v68AHgMJV/R2VKOpwEjMNINNmMKH4DAJI68LoL+uFPosctqeOo7zFraTrJjw96RK7w=="
        );
        assert_ne!(
            aggregate_digest([a.as_str(), b.as_str()]),
            aggregate_digest([b.as_str(), a.as_str()])
        );
    }

    #[test]
    fn test_password_digest_transform() {
        assert_eq!(
            PasswordDigest::derive("Secret_1").to_base64(),
            "U07h72k1XzQ6EFAq9CTtDwQCu2RPjYBQTcUTJ9XCYUP7dghdTLjmIjf93zpbq2jvVcMRb6uDaCq9JxCAekobcQ=="
        );
        // First byte is unshifted.
        assert_eq!(
            PasswordDigest::derive("x").0[0],
            Sha512Digest::hash(b"x").0[0]
        );
    }

    #[test]
    fn test_password_digest_debug_hides_bytes() {
        let digest = PasswordDigest::derive("Secret_1");
        assert_eq!(format!("{:?}", digest), "PasswordDigest(..)");
    }
}
