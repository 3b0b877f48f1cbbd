//! Hash engine seam
//!
//! The OTP algorithms only need a plain digest primitive; HMAC is composed on
//! top of it in [`crate::hmac`]. Hosts that must route hashing through a
//! hardware module or a platform API implement [`HashEngine`] once and pass it
//! to the `*_with` operations. Everything else uses [`RustCrypto`].

use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};

use crate::{Error, HashAlgorithm, Result};

/// A digest capability selected once by the host application
pub trait HashEngine {
    /// Hashes `message` with `algorithm`
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedAlgorithm`] or [`Error::HashBackendUnavailable`]
    /// when the backend lacks the primitive.
    fn digest(&self, algorithm: HashAlgorithm, message: &[u8]) -> Result<Vec<u8>>;
}

impl<E: HashEngine + ?Sized> HashEngine for &E {
    fn digest(&self, algorithm: HashAlgorithm, message: &[u8]) -> Result<Vec<u8>> {
        (**self).digest(algorithm, message)
    }
}

/// Default engine backed by the RustCrypto `sha1`, `sha2` and `sha3` crates
///
/// SHA-3 digests need the `sha3` feature (enabled by default); without it
/// they fail with [`Error::HashBackendUnavailable`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RustCrypto;

impl HashEngine for RustCrypto {
    fn digest(&self, algorithm: HashAlgorithm, message: &[u8]) -> Result<Vec<u8>> {
        let digest = match algorithm {
            HashAlgorithm::Sha1 => Sha1::digest(message).to_vec(),
            HashAlgorithm::Sha224 => Sha224::digest(message).to_vec(),
            HashAlgorithm::Sha256 => Sha256::digest(message).to_vec(),
            HashAlgorithm::Sha384 => Sha384::digest(message).to_vec(),
            HashAlgorithm::Sha512 => Sha512::digest(message).to_vec(),
            HashAlgorithm::Sha3_224
            | HashAlgorithm::Sha3_256
            | HashAlgorithm::Sha3_384
            | HashAlgorithm::Sha3_512 => sha3_digest(algorithm, message)?,
        };
        Ok(digest)
    }
}

#[cfg(feature = "sha3")]
fn sha3_digest(algorithm: HashAlgorithm, message: &[u8]) -> Result<Vec<u8>> {
    use sha3::{Sha3_224, Sha3_256, Sha3_384, Sha3_512};

    match algorithm {
        HashAlgorithm::Sha3_224 => Ok(Sha3_224::digest(message).to_vec()),
        HashAlgorithm::Sha3_256 => Ok(Sha3_256::digest(message).to_vec()),
        HashAlgorithm::Sha3_384 => Ok(Sha3_384::digest(message).to_vec()),
        HashAlgorithm::Sha3_512 => Ok(Sha3_512::digest(message).to_vec()),
        other => Err(Error::UnsupportedAlgorithm(other.to_string())),
    }
}

#[cfg(not(feature = "sha3"))]
fn sha3_digest(algorithm: HashAlgorithm, _message: &[u8]) -> Result<Vec<u8>> {
    Err(Error::HashBackendUnavailable(algorithm))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha1_of_abc() {
        let digest = RustCrypto.digest(HashAlgorithm::Sha1, b"abc").unwrap();
        assert_eq!(
            data_encoding::HEXLOWER.encode(&digest),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
    }

    #[test]
    fn digest_lengths_match_algorithm() {
        for algorithm in HashAlgorithm::ALL {
            match RustCrypto.digest(algorithm, b"otp") {
                Ok(digest) => assert_eq!(digest.len(), algorithm.output_size(), "{algorithm}"),
                Err(Error::HashBackendUnavailable(missing)) => {
                    assert!(!cfg!(feature = "sha3"));
                    assert_eq!(missing, algorithm);
                }
                Err(e) => panic!("{algorithm}: {e}"),
            }
        }
    }

    #[cfg(feature = "sha3")]
    #[test]
    fn sha3_256_of_abc() {
        let digest = RustCrypto.digest(HashAlgorithm::Sha3_256, b"abc").unwrap();
        assert_eq!(
            data_encoding::HEXLOWER.encode(&digest),
            "3a985da74fe225b2045c172d6bd390bd855f086e3e9d525b46bfe24511431532"
        );
    }
}
