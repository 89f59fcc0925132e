use std::fmt;
use std::str::FromStr;

use crate::hex::{hex_decode, hex_to_string};
use crate::HashError;

/// The number of bytes in a SHA-1 digest.
pub const OID_RAW_LEN: usize = 20;

/// The number of hex characters in an object id.
pub const OID_HEX_LEN: usize = 40;

/// An object identifier — the SHA-1 of an object's canonical framing.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; OID_RAW_LEN]);

/// True iff `s` is a well-formed object id: exactly 40 lowercase hex digits.
pub fn is_hex_oid(s: &str) -> bool {
    s.len() == OID_HEX_LEN
        && s.bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

impl ObjectId {
    /// The null OID (all zeros).
    pub const NULL: Self = Self([0u8; OID_RAW_LEN]);

    /// Create an ObjectId from raw digest bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, HashError> {
        if bytes.len() != OID_RAW_LEN {
            return Err(HashError::InvalidHashLength {
                expected: OID_RAW_LEN,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; OID_RAW_LEN];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }

    /// Create an ObjectId from a 40-character lowercase hex string.
    pub fn from_hex(hex: &str) -> Result<Self, HashError> {
        let mut bytes = [0u8; OID_RAW_LEN];
        hex_decode(hex, &mut bytes)?;
        Ok(Self(bytes))
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Lowercase hex representation.
    pub fn to_hex(&self) -> String {
        hex_to_string(&self.0)
    }

    /// Whether this is the all-zeros OID.
    pub fn is_null(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    /// First byte of the digest, used for fan-out indexing.
    pub fn first_byte(&self) -> u8 {
        self.0[0]
    }

    /// Whether the hex form starts with the given lowercase prefix.
    pub fn starts_with_hex(&self, prefix: &str) -> bool {
        self.to_hex().starts_with(prefix)
    }

    /// The loose-object path component: `"xx/remaining-38-chars"`.
    pub fn loose_path(&self) -> String {
        let hex = self.to_hex();
        format!("{}/{}", &hex[..2], &hex[2..])
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", &self.to_hex()[..8])
    }
}

impl FromStr for ObjectId {
    type Err = HashError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}
