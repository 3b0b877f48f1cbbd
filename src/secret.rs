//! Shared secret container

use core::fmt;
use std::sync::OnceLock;

use data_encoding::{DecodeKind, HEXLOWER, HEXLOWER_PERMISSIVE};
use log::warn;
use rand::rngs::OsRng;
use rand::TryRngCore;

use crate::{base32, Error, Result};

/// Random secret size in bytes, 160 bits as recommended by RFC 4226
pub const DEFAULT_SECRET_SIZE: usize = 20;

/// Keys below this many bytes are accepted but logged as weak
const RECOMMENDED_SECRET_SIZE: usize = 16;

/// Shared secret container
///
/// The key bytes never change after construction. The base32 and hex views are
/// computed on first access and pinned for the lifetime of the value, so a
/// `Secret` can be shared read-only between threads and engine instances.
///
/// With the `zeroize` feature the key bytes and cached views are wiped on drop.
#[derive(Clone)]
pub struct Secret {
    bytes: Box<[u8]>,
    base32: OnceLock<String>,
    hex: OnceLock<String>,
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secret")
            .field("len", &self.bytes.len())
            .finish_non_exhaustive()
    }
}

impl PartialEq for Secret {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for Secret {}

#[cfg(feature = "zeroize")]
impl Drop for Secret {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        self.bytes.zeroize();
        if let Some(view) = self.base32.get_mut() {
            view.zeroize();
        }
        if let Some(view) = self.hex.get_mut() {
            view.zeroize();
        }
    }
}

impl Secret {
    /// Byte array key
    ///
    /// Wraps the bytes as-is. No length validation is performed; the caller
    /// must ensure key security.
    pub fn from_bytes<S: AsRef<[u8]>>(secret: S) -> Self {
        Self {
            bytes: secret.as_ref().to_vec().into_boxed_slice(),
            base32: OnceLock::new(),
            hex: OnceLock::new(),
        }
    }

    /// Draws `size` bytes from the operating system's secure random source
    ///
    /// # Errors
    ///
    /// Returns [`Error::CryptoUnavailable`] when the random source cannot be read.
    pub fn generate(size: usize) -> Result<Self> {
        let mut bytes = vec![0u8; size];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|_| Error::CryptoUnavailable)?;
        Ok(Self::from_bytes(bytes))
    }

    /// Random secret of [`DEFAULT_SECRET_SIZE`] bytes
    ///
    /// # Errors
    ///
    /// Returns [`Error::CryptoUnavailable`] when the random source cannot be read.
    pub fn random() -> Result<Self> {
        Self::generate(DEFAULT_SECRET_SIZE)
    }

    /// Decodes a base32 encoded shared secret
    ///
    /// Case-insensitive, spaces and trailing `=` padding are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The input contains invalid base32 characters
    /// - The input decodes to zero bytes
    pub fn from_base32<S: AsRef<str>>(secret: S) -> Result<Self> {
        let decoded = base32::decode(secret.as_ref())?;
        Self::from_decoded(decoded)
    }

    /// Decodes a hex encoded shared secret, in either case
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHexLength`] for an odd number of digits,
    /// [`Error::InvalidCharacter`] for a non-hex symbol and
    /// [`Error::EmptySecret`] for an empty input.
    pub fn from_hex<S: AsRef<str>>(secret: S) -> Result<Self> {
        let input = secret.as_ref();
        let decoded = HEXLOWER_PERMISSIVE
            .decode(input.as_bytes())
            .map_err(|e| match e.kind {
                DecodeKind::Symbol => input
                    .get(e.position..)
                    .and_then(|rest| rest.chars().next())
                    .map_or(Error::InvalidHexLength(input.len()), Error::InvalidCharacter),
                _ => Error::InvalidHexLength(input.len()),
            })?;
        Self::from_decoded(decoded)
    }

    /// Uses the UTF-8 bytes of a passphrase as the key
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptySecret`] for an empty string.
    pub fn from_utf8<S: AsRef<str>>(secret: S) -> Result<Self> {
        Self::from_decoded(secret.as_ref().as_bytes().to_vec())
    }

    fn from_decoded(decoded: Vec<u8>) -> Result<Self> {
        if decoded.is_empty() {
            return Err(Error::EmptySecret);
        }
        if decoded.len() < RECOMMENDED_SECRET_SIZE {
            warn!(
                "Key length is {} bits, below the RFC 4226 recommended 128 bits",
                decoded.len() * 8
            );
        }
        Ok(Self::from_bytes(decoded))
    }

    /// Reference to the shared secret byte array
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Unpadded uppercase base32 view, computed once
    #[must_use]
    pub fn base32(&self) -> &str {
        self.base32.get_or_init(|| base32::encode(&self.bytes))
    }

    /// Lowercase hex view, computed once
    #[must_use]
    pub fn hex(&self) -> &str {
        self.hex.get_or_init(|| HEXLOWER.encode(&self.bytes))
    }

    /// Key length in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if the key has no bytes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
