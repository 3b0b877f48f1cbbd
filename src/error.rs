use core::fmt;
use std::time::SystemTimeError;

use crate::HashAlgorithm;

/// Error type
#[derive(Debug)]
pub enum Error {
    /// The input does not have the `otpauth://{type}/{label}?{params}` shape
    InvalidUriFormat,
    /// The URI type segment is neither `hotp` nor `totp`
    UnknownOtpType(String),
    /// A URI parameter is required but absent, or present with an invalid value
    MissingOrInvalidParameter(&'static str),
    /// A symbol outside the accepted alphabet was found while decoding a secret
    InvalidCharacter(char),
    /// The algorithm name does not canonicalize to a supported hash
    UnsupportedAlgorithm(String),
    /// No secure random source is available to generate a secret
    CryptoUnavailable,
    /// The hash engine cannot compute the requested digest
    HashBackendUnavailable(HashAlgorithm),
    /// A hex secret does not have an even number of digits
    InvalidHexLength(usize),
    /// A secret string decoded to zero bytes
    EmptySecret,
    /// System time is set to before the Unix epoch
    SystemTime(SystemTimeError),
}

/// Result alias used across the crate
pub type Result<T> = core::result::Result<T, Error>;

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::SystemTime(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUriFormat => write!(f, "Invalid otpauth URI format"),
            Self::UnknownOtpType(kind) => write!(f, "Unknown OTP type: {kind}"),
            Self::MissingOrInvalidParameter(name) => {
                write!(f, "Missing or invalid '{name}' parameter")
            }
            Self::InvalidCharacter(ch) => write!(f, "Invalid character in secret: {ch:?}"),
            Self::UnsupportedAlgorithm(name) => write!(f, "Unsupported hash algorithm: {name}"),
            Self::CryptoUnavailable => {
                write!(f, "No secure random source is available to generate a secret")
            }
            Self::HashBackendUnavailable(algorithm) => {
                write!(f, "Hash backend does not provide {algorithm}")
            }
            Self::InvalidHexLength(len) => {
                write!(f, "Hex secret must have an even number of digits, got {len}")
            }
            Self::EmptySecret => write!(f, "Secret key must not be empty"),
            Self::SystemTime(e) => write!(
                f,
                "System time error: {e}. The system time is set before the Unix epoch (1970-01-01 00:00:00 UTC)"
            ),
        }
    }
}

impl From<SystemTimeError> for Error {
    fn from(e: SystemTimeError) -> Self {
        Self::SystemTime(e)
    }
}
