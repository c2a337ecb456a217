//! SHA-256 digests and the canonical block hash contract.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A named alias for a 32-byte(u8) array, used to represent a 256-bit digest.
pub type H256 = [u8; 32];

/// Number of hex characters in a rendered digest.
pub const DIGEST_HEX_LEN: usize = 64;

/// Errors produced when parsing a hex-encoded 256-bit value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HashParseError {
    #[error("expected {DIGEST_HEX_LEN} hex characters, got {0}")]
    InvalidLength(usize),

    #[error("hex must be lowercase")]
    NotLowercase,

    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

/// Decode a 64-character lowercase hex string into 32 bytes.
pub(crate) fn decode_h256(s: &str) -> Result<H256, HashParseError> {
    if s.len() != DIGEST_HEX_LEN {
        return Err(HashParseError::InvalidLength(s.len()));
    }
    if s.bytes().any(|b| b.is_ascii_uppercase()) {
        return Err(HashParseError::NotLowercase);
    }
    let mut arr = [0u8; 32];
    hex::decode_to_slice(s, &mut arr)?;
    Ok(arr)
}

/// A SHA-256 digest, rendered as 64 lowercase hex characters.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Hash(pub H256);

impl Hash {
    /// The zero hash (all zeros). Used as the genesis block's previous hash.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Create a new Hash from raw bytes.
    pub fn from_bytes(bytes: H256) -> Self {
        Self(bytes)
    }

    /// Get the underlying bytes.
    pub fn as_bytes(&self) -> &H256 {
        &self.0
    }

    /// Convert to a lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a lowercase hex string.
    pub fn from_hex(s: &str) -> Result<Self, HashParseError> {
        decode_h256(s).map(Self)
    }

    /// Count the leading `'0'` characters of the hex rendering.
    pub fn leading_zero_digits(&self) -> usize {
        let mut count = 0;
        for byte in self.0 {
            if byte == 0 {
                count += 2;
                continue;
            }
            if byte >> 4 == 0 {
                count += 1;
            }
            break;
        }
        count
    }

    /// Check whether the hex rendering starts with `difficulty` zeros.
    ///
    /// A difficulty of zero is always met.
    pub fn meets_difficulty(&self, difficulty: usize) -> bool {
        self.leading_zero_digits() >= difficulty
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({}..)", &self.to_hex()[..12])
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Hash {
    type Err = HashParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<H256> for Hash {
    fn from(bytes: H256) -> Self {
        Self(bytes)
    }
}

impl From<Hash> for H256 {
    fn from(hash: Hash) -> Self {
        hash.0
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Hash::from_hex(&s).map_err(de::Error::custom)
    }
}

/// Hash arbitrary data using SHA-256.
pub fn hash(data: &[u8]) -> Hash {
    Hash(Sha256::digest(data).into())
}

/// Hash multiple pieces of data by concatenating them.
pub fn hash_concat(parts: &[&[u8]]) -> Hash {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    Hash(hasher.finalize().into())
}

/// Render a float the way the canonical serialization does.
///
/// This is the shortest decimal that round-trips, always with a fractional
/// part or exponent (`10.0`, `1700000000.25`).
pub fn canonical_number(value: f64) -> String {
    serde_json::to_string(&value).expect("f64 serialization should not fail")
}

/// Compute the canonical block digest.
///
/// The preimage is `previous_hash ‖ timestamp ‖ nonce ‖ transactions`, where
/// `transactions` is the compact JSON produced by
/// [`crate::transaction::canonical_payload`].
pub fn block_digest(previous_hash: &Hash, timestamp: f64, nonce: u64, payload: &[u8]) -> Hash {
    let prefix = format!("{}{}", previous_hash.to_hex(), canonical_number(timestamp));
    hash_concat(&[prefix.as_bytes(), nonce.to_string().as_bytes(), payload])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        let data = b"hello world";
        assert_eq!(hash(data), hash(data));
    }

    #[test]
    fn test_hash_known_vector() {
        assert_eq!(
            hash(b"abc").to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_hash_hex_roundtrip() {
        let h = hash(b"test data");
        let parsed = Hash::from_hex(&h.to_hex()).unwrap();
        assert_eq!(h, parsed);
    }

    #[test]
    fn test_from_hex_rejects_bad_input() {
        assert_eq!(
            Hash::from_hex("abcd"),
            Err(HashParseError::InvalidLength(4))
        );
        assert_eq!(
            Hash::from_hex(&"A".repeat(64)),
            Err(HashParseError::NotLowercase)
        );
        assert!(matches!(
            Hash::from_hex(&"g".repeat(64)),
            Err(HashParseError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_zero_hash_display() {
        assert_eq!(Hash::ZERO.to_string(), "0".repeat(64));
        assert_eq!(Hash::ZERO.leading_zero_digits(), 64);
    }

    #[test]
    fn test_leading_zero_digits() {
        let mut bytes = [0xffu8; 32];
        assert_eq!(Hash(bytes).leading_zero_digits(), 0);

        bytes[0] = 0x0f;
        assert_eq!(Hash(bytes).leading_zero_digits(), 1);

        bytes[0] = 0x00;
        bytes[1] = 0x0f;
        assert_eq!(Hash(bytes).leading_zero_digits(), 3);
        assert!(Hash(bytes).meets_difficulty(3));
        assert!(!Hash(bytes).meets_difficulty(4));
        assert!(Hash(bytes).meets_difficulty(0));
    }

    #[test]
    fn test_leading_zero_digits_whole_bytes() {
        let mut bytes = [0xffu8; 32];
        bytes[0] = 0x00;
        bytes[1] = 0x1f;
        assert!(Hash(bytes).to_hex().starts_with("001f"));
        assert_eq!(Hash(bytes).leading_zero_digits(), 2);
        assert!(Hash(bytes).meets_difficulty(2));
        assert!(!Hash(bytes).meets_difficulty(3));

        bytes[1] = 0x00;
        bytes[2] = 0xa0;
        assert_eq!(Hash(bytes).leading_zero_digits(), 4);
    }

    #[test]
    fn test_hash_concat() {
        assert_eq!(hash_concat(&[b"hello", b"world"]), hash(b"helloworld"));
    }

    #[test]
    fn test_canonical_number() {
        assert_eq!(canonical_number(10.0), "10.0");
        assert_eq!(canonical_number(0.0), "0.0");
        assert_eq!(canonical_number(1700000000.25), "1700000000.25");
        assert_eq!(canonical_number(42.42), "42.42");
    }

    #[test]
    fn test_block_digest_preimage_order() {
        let prev = Hash::ZERO;
        let expected = hash(format!("{}1.5{}[]", "0".repeat(64), 7).as_bytes());
        assert_eq!(block_digest(&prev, 1.5, 7, b"[]"), expected);
    }

    #[test]
    fn test_serde_as_hex_string() {
        let h = hash(b"serde");
        let json = serde_json::to_string(&h).unwrap();
        assert_eq!(json, format!("\"{}\"", h.to_hex()));
        let back: Hash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, h);
    }
}
