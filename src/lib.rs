//! RFC 4226 & RFC 6238 compatible OTP (One-Time Password) implementation
//!
//! - **HOTP**: counter-based codes with windowed validation
//! - **TOTP**: time-based codes derived from the Unix clock and a period
//! - **Hash Algorithms**: SHA1, SHA224, SHA256, SHA384, SHA512 and the SHA3 family
//! - **Key URIs**: `otpauth://` parsing and generation for authenticator apps
//! - **Pluggable hashing**: HMAC is composed over a [`HashEngine`], the
//!   RustCrypto-backed [`RustCrypto`] engine is used unless one is supplied
//!
//! # Examples
//!
//! ```
//! use otpauth::{HashAlgorithm, Otp, Secret, Totp};
//!
//! let secret = Secret::from_base32("GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ").unwrap();
//! let totp = Totp::new(secret)
//!     .with_issuer("ACME Co")
//!     .with_label("alice@example.com")
//!     .with_algorithm(HashAlgorithm::Sha1)
//!     .with_digits(8);
//!
//! // RFC 6238 test vector at T = 59s
//! assert_eq!(totp.generate_at(59_000).unwrap(), "94287082");
//! assert_eq!(totp.validate_at("94287082", 59_000, 1).unwrap(), Some(0));
//!
//! // provisioning URI, typically rendered as a QR code
//! let uri = totp.to_string();
//! let parsed: Otp = uri.parse().unwrap();
//! assert_eq!(parsed, Otp::Totp(totp));
//! ```
//!
//! HOTP instances own their counter; generating advances it:
//!
//! ```
//! use otpauth::{Hotp, Secret};
//!
//! let mut hotp = Hotp::new(Secret::from_bytes(b"12345678901234567890"));
//! assert_eq!(hotp.generate().unwrap(), "755224");
//! assert_eq!(hotp.generate().unwrap(), "287082");
//! assert_eq!(hotp.counter(), 2);
//! ```
//!

mod error;
pub use error::{Error, Result};

mod algorithm;
pub mod base32;
pub mod engine;
pub mod hmac;
pub mod hotp;
mod secret;
pub mod totp;
pub mod uri;

use core::fmt;
use core::str::FromStr;

pub use algorithm::{canonicalize, HashAlgorithm};
pub use engine::{HashEngine, RustCrypto};
pub use hotp::Hotp;
pub use secret::{Secret, DEFAULT_SECRET_SIZE};
pub use totp::Totp;

/// A provisioned one-time password configuration
///
/// This is what an `otpauth://` URI describes; see [`uri::parse`] and
/// [`uri::stringify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Otp {
    /// Counter-based, `otpauth://hotp/...`
    Hotp(Hotp),
    /// Time-based, `otpauth://totp/...`
    Totp(Totp),
}

impl Otp {
    /// URI type segment, `hotp` or `totp`
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Hotp(_) => "hotp",
            Self::Totp(_) => "totp",
        }
    }

    /// Provider name, see [`Hotp::issuer`]
    #[must_use]
    pub fn issuer(&self) -> &str {
        match self {
            Self::Hotp(hotp) => hotp.issuer(),
            Self::Totp(totp) => totp.issuer(),
        }
    }

    /// Account label
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Hotp(hotp) => hotp.label(),
            Self::Totp(totp) => totp.label(),
        }
    }

    /// Shared secret of either variant
    #[must_use]
    pub const fn secret(&self) -> &Secret {
        match self {
            Self::Hotp(hotp) => hotp.secret(),
            Self::Totp(totp) => totp.secret(),
        }
    }

    /// Hash algorithm of either variant
    #[must_use]
    pub const fn algorithm(&self) -> HashAlgorithm {
        match self {
            Self::Hotp(hotp) => hotp.algorithm(),
            Self::Totp(totp) => totp.algorithm(),
        }
    }

    /// Code length of either variant
    #[must_use]
    pub const fn digits(&self) -> u32 {
        match self {
            Self::Hotp(hotp) => hotp.digits(),
            Self::Totp(totp) => totp.digits(),
        }
    }
}

impl From<Hotp> for Otp {
    fn from(hotp: Hotp) -> Self {
        Self::Hotp(hotp)
    }
}

impl From<Totp> for Otp {
    fn from(totp: Totp) -> Self {
        Self::Totp(totp)
    }
}

impl fmt::Display for Otp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&uri::stringify(self))
    }
}

impl FromStr for Otp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        uri::parse(s)
    }
}
