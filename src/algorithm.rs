use core::fmt;
use core::str::FromStr;

use crate::{Error, Result};

/// Hash algorithms supported by OTP
///
/// RFC 4226 requires HMAC-SHA-1, RFC 6238 extends support to the SHA-2 family.
/// Authenticator apps that accept the `algorithm` URI parameter also
/// understand SHA-224, SHA-384 and the SHA-3 family.
///
/// Use SHA1 by default to ensure maximum compatibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HashAlgorithm {
    /// HMAC-SHA-1 is the default algorithm for most OTP implementations
    #[default]
    Sha1,
    /// HMAC-SHA-224
    Sha224,
    /// HMAC-SHA-256
    Sha256,
    /// HMAC-SHA-384
    Sha384,
    /// HMAC-SHA-512
    Sha512,
    /// HMAC-SHA3-224
    Sha3_224,
    /// HMAC-SHA3-256
    Sha3_256,
    /// HMAC-SHA3-384
    Sha3_384,
    /// HMAC-SHA3-512
    Sha3_512,
}

impl HashAlgorithm {
    /// Every supported algorithm, in canonical order
    pub const ALL: [Self; 9] = [
        Self::Sha1,
        Self::Sha224,
        Self::Sha256,
        Self::Sha384,
        Self::Sha512,
        Self::Sha3_224,
        Self::Sha3_256,
        Self::Sha3_384,
        Self::Sha3_512,
    ];

    /// Canonical name, as written in the `algorithm` URI parameter
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sha1 => "SHA1",
            Self::Sha224 => "SHA224",
            Self::Sha256 => "SHA256",
            Self::Sha384 => "SHA384",
            Self::Sha512 => "SHA512",
            Self::Sha3_224 => "SHA3-224",
            Self::Sha3_256 => "SHA3-256",
            Self::Sha3_384 => "SHA3-384",
            Self::Sha3_512 => "SHA3-512",
        }
    }

    /// HMAC block size in bytes (the hash's input block, or the SHA-3 rate)
    #[must_use]
    pub const fn block_size(self) -> usize {
        match self {
            Self::Sha1 | Self::Sha224 | Self::Sha256 => 64,
            Self::Sha384 | Self::Sha512 => 128,
            Self::Sha3_224 => 144,
            Self::Sha3_256 => 136,
            Self::Sha3_384 => 104,
            Self::Sha3_512 => 72,
        }
    }

    /// Digest length in bytes
    #[must_use]
    pub const fn output_size(self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha224 | Self::Sha3_224 => 28,
            Self::Sha256 | Self::Sha3_256 => 32,
            Self::Sha384 | Self::Sha3_384 => 48,
            Self::Sha512 | Self::Sha3_512 => 64,
        }
    }
}

/// Maps an algorithm name onto exactly one [`HashAlgorithm`]
///
/// Matching ignores case. Names starting with `SHA3-` must name one of the
/// 224/256/384/512 variants; any other name has its hyphens removed and must
/// then be one of `SHA1`, `SHA224`, `SHA256`, `SHA384` or `SHA512`.
///
/// # Errors
///
/// Returns [`Error::UnsupportedAlgorithm`] carrying the original name.
pub fn canonicalize(name: &str) -> Result<HashAlgorithm> {
    let upper = name.to_uppercase();

    let algorithm = if let Some(bits) = upper.strip_prefix("SHA3-") {
        match bits {
            "224" => Some(HashAlgorithm::Sha3_224),
            "256" => Some(HashAlgorithm::Sha3_256),
            "384" => Some(HashAlgorithm::Sha3_384),
            "512" => Some(HashAlgorithm::Sha3_512),
            _ => None,
        }
    } else {
        match upper.replace('-', "").as_str() {
            "SHA1" => Some(HashAlgorithm::Sha1),
            "SHA224" => Some(HashAlgorithm::Sha224),
            "SHA256" => Some(HashAlgorithm::Sha256),
            "SHA384" => Some(HashAlgorithm::Sha384),
            "SHA512" => Some(HashAlgorithm::Sha512),
            _ => None,
        }
    };

    algorithm.ok_or_else(|| Error::UnsupportedAlgorithm(name.to_owned()))
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        canonicalize(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_names_round_trip() {
        for algorithm in HashAlgorithm::ALL {
            assert_eq!(canonicalize(algorithm.as_str()).unwrap(), algorithm);
            assert_eq!(algorithm.to_string().parse::<HashAlgorithm>().unwrap(), algorithm);
        }
    }

    #[test]
    fn accepts_case_and_hyphen_variants() {
        assert_eq!(canonicalize("sha1").unwrap(), HashAlgorithm::Sha1);
        assert_eq!(canonicalize("SHA-256").unwrap(), HashAlgorithm::Sha256);
        assert_eq!(canonicalize("sha-5-12").unwrap(), HashAlgorithm::Sha512);
        assert_eq!(canonicalize("Sha3-384").unwrap(), HashAlgorithm::Sha3_384);
    }

    #[test]
    fn rejects_unknown_names() {
        for name in ["MD5", "SHA3256", "SHA3-1", "SHA-3-256", "", "SHA", "SHA1 "] {
            match canonicalize(name) {
                Err(Error::UnsupportedAlgorithm(reported)) => assert_eq!(reported, name),
                other => panic!("{name:?} should be rejected, got {other:?}"),
            }
        }
    }

    #[test]
    fn block_sizes_follow_hmac_definitions() {
        assert_eq!(HashAlgorithm::Sha1.block_size(), 64);
        assert_eq!(HashAlgorithm::Sha512.block_size(), 128);
        assert_eq!(HashAlgorithm::Sha3_256.block_size(), 136);
        assert_eq!(HashAlgorithm::Sha3_512.block_size(), 72);
    }

    #[test]
    fn default_is_sha1() {
        assert_eq!(HashAlgorithm::default(), HashAlgorithm::Sha1);
    }
}
