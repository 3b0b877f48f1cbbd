//! RFC 6238: Time-Based One-Time Password
//!
//! TOTP = HOTP(K, T) where T = floor(Unix time / X). Timestamps are Unix
//! milliseconds; X is the period in seconds.

use core::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::engine::{HashEngine, RustCrypto};
use crate::hotp::{self, clamp_digits, DEFAULT_DIGITS, DEFAULT_LABEL, DEFAULT_WINDOW};
use crate::{uri, Error, HashAlgorithm, Result, Secret};

/// RFC 6238: X represents the time step in seconds (default value X = 30 seconds)
pub const DEFAULT_PERIOD: u32 = 30;

/// Time step counter for a timestamp
///
/// A zero period is treated as one second.
#[must_use]
pub const fn counter(period: u32, timestamp_ms: u64) -> u64 {
    timestamp_ms / 1000 / period_secs(period)
}

/// Milliseconds until the step containing `timestamp_ms` ends
#[must_use]
pub const fn remaining(period: u32, timestamp_ms: u64) -> u64 {
    let period_ms = period_secs(period) * 1000;
    period_ms - timestamp_ms % period_ms
}

const fn period_secs(period: u32) -> u64 {
    if period == 0 {
        1
    } else {
        period as u64
    }
}

/// Generates the code for the step containing `timestamp_ms`
///
/// # Errors
///
/// Propagates the engine's failure for an algorithm it cannot hash.
pub fn generate<E>(
    engine: &E,
    secret: &Secret,
    algorithm: HashAlgorithm,
    digits: u32,
    period: u32,
    timestamp_ms: u64,
) -> Result<String>
where
    E: HashEngine + ?Sized,
{
    hotp::generate(engine, secret, algorithm, digits, counter(period, timestamp_ms))
}

/// Checks `token` against the steps around `timestamp_ms`
///
/// The returned offset counts whole periods, negative for past steps.
///
/// # Errors
///
/// Propagates the engine's failure for an algorithm it cannot hash.
#[allow(clippy::too_many_arguments)]
pub fn validate<E>(
    engine: &E,
    token: &str,
    secret: &Secret,
    algorithm: HashAlgorithm,
    digits: u32,
    period: u32,
    timestamp_ms: u64,
    window: u32,
) -> Result<Option<i64>>
where
    E: HashEngine + ?Sized,
{
    hotp::validate(
        engine,
        token,
        secret,
        algorithm,
        digits,
        counter(period, timestamp_ms),
        window,
    )
}

/// Get the current system time as Unix milliseconds
///
/// # Errors
///
/// Returns an error when system time is earlier than Unix epoch (1970-01-01 00:00:00 UTC).
#[inline]
fn system_time_ms() -> Result<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() * 1000 + u64::from(d.subsec_millis()))
        .map_err(Error::SystemTime)
}

/// RFC 6238 time-based one-time password, with T0 fixed at the Unix epoch
///
/// Holds no mutable state, so a shared instance can serve concurrent callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Totp {
    issuer: String,
    label: String,
    issuer_in_label: bool,
    secret: Secret,
    algorithm: HashAlgorithm,
    digits: u32,
    period: u32,
}

impl Totp {
    /// Create TOTP instance with default config
    ///
    /// Default config: SHA1 algorithm, 6 digits, 30-second period, no issuer
    #[must_use]
    pub fn new(secret: Secret) -> Self {
        Self {
            issuer: String::new(),
            label: DEFAULT_LABEL.to_owned(),
            issuer_in_label: true,
            secret,
            algorithm: HashAlgorithm::default(),
            digits: DEFAULT_DIGITS,
            period: DEFAULT_PERIOD,
        }
    }

    /// Configure the provider name shown by authenticator apps
    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// Configure the account label
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Configure whether the issuer is prefixed to the label in key URIs
    #[must_use]
    pub const fn with_issuer_in_label(mut self, issuer_in_label: bool) -> Self {
        self.issuer_in_label = issuer_in_label;
        self
    }

    /// Configure hash algorithm
    #[must_use]
    pub const fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Configure the number of verification code digits, clamped to `1..=10`
    #[must_use]
    pub const fn with_digits(mut self, digits: u32) -> Self {
        self.digits = clamp_digits(digits);
        self
    }

    /// Configure time step
    ///
    /// A zero period is raised to 1 second
    #[must_use]
    pub const fn with_period(mut self, period: u32) -> Self {
        self.period = if period == 0 { 1 } else { period };
        self
    }

    /// Provider name, empty when none is configured
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Account label
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether key URIs prefix the label with the issuer
    #[must_use]
    pub const fn issuer_in_label(&self) -> bool {
        self.issuer_in_label
    }

    /// Shared secret
    #[must_use]
    pub const fn secret(&self) -> &Secret {
        &self.secret
    }

    /// Hash algorithm used for the HMAC
    #[must_use]
    pub const fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Code length, always within `1..=10`
    #[must_use]
    pub const fn digits(&self) -> u32 {
        self.digits
    }

    /// Time step in seconds
    #[must_use]
    pub const fn period(&self) -> u32 {
        self.period
    }

    /// Generate current verification code
    ///
    /// # Errors
    ///
    /// Returns an error when system time retrieval fails.
    pub fn generate(&self) -> Result<String> {
        self.generate_at(system_time_ms()?)
    }

    /// Generate verification code at a Unix timestamp in milliseconds
    ///
    /// # Errors
    ///
    /// Propagates the hash engine's failure.
    pub fn generate_at(&self, timestamp_ms: u64) -> Result<String> {
        self.generate_with(&RustCrypto, timestamp_ms)
    }

    /// [`Totp::generate_at`] with an explicit hash engine
    ///
    /// # Errors
    ///
    /// Propagates the hash engine's failure.
    pub fn generate_with<E: HashEngine + ?Sized>(
        &self,
        engine: &E,
        timestamp_ms: u64,
    ) -> Result<String> {
        generate(
            engine,
            &self.secret,
            self.algorithm,
            self.digits,
            self.period,
            timestamp_ms,
        )
    }

    /// Validates `token` against the current time with [`DEFAULT_WINDOW`]
    ///
    /// # Errors
    ///
    /// Returns an error when system time retrieval fails.
    pub fn validate(&self, token: &str) -> Result<Option<i64>> {
        self.validate_at(token, system_time_ms()?, DEFAULT_WINDOW)
    }

    /// Validates `token` around a Unix timestamp in milliseconds
    ///
    /// # Errors
    ///
    /// Propagates the hash engine's failure.
    pub fn validate_at(&self, token: &str, timestamp_ms: u64, window: u32) -> Result<Option<i64>> {
        self.validate_with(&RustCrypto, token, timestamp_ms, window)
    }

    /// [`Totp::validate_at`] with an explicit hash engine
    ///
    /// # Errors
    ///
    /// Propagates the hash engine's failure.
    pub fn validate_with<E: HashEngine + ?Sized>(
        &self,
        engine: &E,
        token: &str,
        timestamp_ms: u64,
        window: u32,
    ) -> Result<Option<i64>> {
        validate(
            engine,
            token,
            &self.secret,
            self.algorithm,
            self.digits,
            self.period,
            timestamp_ms,
            window,
        )
    }

    /// Get the current time counter T value
    ///
    /// # Errors
    ///
    /// Returns an error when system time retrieval fails.
    pub fn counter(&self) -> Result<u64> {
        Ok(self.counter_at(system_time_ms()?))
    }

    /// Time counter T for a Unix timestamp in milliseconds
    #[must_use]
    pub const fn counter_at(&self, timestamp_ms: u64) -> u64 {
        counter(self.period, timestamp_ms)
    }

    /// Get the remaining valid time (TTL) of the current code, in milliseconds
    ///
    /// # Errors
    ///
    /// Returns an error when system time retrieval fails.
    pub fn remaining(&self) -> Result<u64> {
        Ok(self.remaining_at(system_time_ms()?))
    }

    /// Milliseconds left in the step containing `timestamp_ms`
    #[must_use]
    pub const fn remaining_at(&self, timestamp_ms: u64) -> u64 {
        remaining(self.period, timestamp_ms)
    }
}

impl fmt::Display for Totp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&uri::stringify_totp(self))
    }
}
