//! RFC 4226: HMAC-Based One-Time Password
//!
//! HOTP(K, C) = Truncate(HMAC(K, C)) mod 10^Digit
//!
//! The free functions are stateless and take the counter explicitly. [`Hotp`]
//! binds a secret and its provisioning metadata together with a counter that
//! [`Hotp::generate`] advances; advancing needs `&mut Hotp`, so an instance
//! shared between threads must sit behind the caller's own `Mutex`.

use core::fmt;

use log::trace;

use crate::engine::{HashEngine, RustCrypto};
use crate::hmac::hmac;
use crate::{uri, HashAlgorithm, Result, Secret};

/// Code length used when none is configured
pub const DEFAULT_DIGITS: u32 = 6;
/// Steps scanned on each side of the reference counter during validation
pub const DEFAULT_WINDOW: u32 = 1;
/// Account label used when none is configured
pub const DEFAULT_LABEL: &str = "OTPAuth";
/// Longest code; `10^10` is the first modulus above every 31-bit value
pub const MAX_DIGITS: u32 = 10;

/// Keeps a code length within `1..=MAX_DIGITS`
#[must_use]
pub const fn clamp_digits(digits: u32) -> u32 {
    if digits == 0 {
        1
    } else if digits > MAX_DIGITS {
        MAX_DIGITS
    } else {
        digits
    }
}

/// Generates the code for `counter`
///
/// # Errors
///
/// Propagates the engine's failure for an algorithm it cannot hash.
pub fn generate<E>(
    engine: &E,
    secret: &Secret,
    algorithm: HashAlgorithm,
    digits: u32,
    counter: u64,
) -> Result<String>
where
    E: HashEngine + ?Sized,
{
    let digest = hmac(engine, algorithm, secret.as_bytes(), &counter.to_be_bytes())?;
    Ok(format_code(truncation_rfc4226(&digest), digits))
}

/// Checks `token` against every counter in `[counter - window, counter + window]`
///
/// Returns the offset of the matching counter relative to `counter`. The scan
/// always covers the whole window in ascending order and the last match wins.
/// A token whose length differs from `digits` (after [`clamp_digits`]) is
/// rejected without scanning. The window is clamped at `0` and `u64::MAX`.
///
/// # Errors
///
/// Propagates the engine's failure for an algorithm it cannot hash.
pub fn validate<E>(
    engine: &E,
    token: &str,
    secret: &Secret,
    algorithm: HashAlgorithm,
    digits: u32,
    counter: u64,
    window: u32,
) -> Result<Option<i64>>
where
    E: HashEngine + ?Sized,
{
    let digits = clamp_digits(digits);
    if token.len() != digits as usize {
        return Ok(None);
    }

    let start = counter.saturating_sub(u64::from(window));
    let end = counter.saturating_add(u64::from(window));

    let mut delta = None;
    for candidate_counter in start..=end {
        let candidate = generate(engine, secret, algorithm, digits, candidate_counter)?;
        if constant_time_eq(token.as_bytes(), candidate.as_bytes()) {
            // |offset| <= u32::MAX, so the two's complement difference is exact
            let offset = candidate_counter.wrapping_sub(counter) as i64;
            trace!("token matched counter {candidate_counter} (offset {offset})");
            delta = Some(offset);
        }
    }

    Ok(delta)
}

/// RFC 4226: Dynamic truncation
///
/// Extract 4-byte dynamic binary code from HMAC result, masking the most
/// significant bit so the result is a positive 31-bit integer.
///
/// Every supported digest is at least 20 bytes, so `offset + 4` stays in range.
#[must_use]
#[inline]
pub fn truncation_rfc4226(hmac: &[u8]) -> u32 {
    let offset = usize::from(hmac[hmac.len() - 1] & 0x0f);

    debug_assert!(
        offset + 4 <= hmac.len(),
        "Cannot extract 4 bytes at offset {offset} from a {}-byte digest",
        hmac.len()
    );

    let p = u32::from_be_bytes([
        hmac[offset],
        hmac[offset + 1],
        hmac[offset + 2],
        hmac[offset + 3],
    ]);

    p & 0x7FFF_FFFF
}

/// Standard formatting
///
/// `value mod 10^digits`, left-padded with zeros to exactly `digits` characters.
/// `digits` goes through [`clamp_digits`] first.
#[must_use]
#[inline]
pub fn format_code(value: u32, digits: u32) -> String {
    let digits = clamp_digits(digits);
    let code = u64::from(value) % 10u64.pow(digits);
    format!("{code:0>width$}", width = digits as usize)
}

/// Fixed-time comparison of two equal-length byte strings
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    debug_assert_eq!(a.len(), b.len(), "token length is checked before comparing");
    if a.len() != b.len() {
        return false;
    }

    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// RFC 4226 counter-based one-time password
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hotp {
    issuer: String,
    label: String,
    issuer_in_label: bool,
    secret: Secret,
    algorithm: HashAlgorithm,
    /// The number of digits composing the auth code. [Datatracker](https://datatracker.ietf.org/doc/html/rfc4226#section-5.3)
    digits: u32,
    counter: u64,
}

impl Hotp {
    /// Create HOTP instance with default config
    ///
    /// Default config: SHA1 algorithm, 6 digits, counter 0, no issuer
    #[must_use]
    pub fn new(secret: Secret) -> Self {
        Self {
            issuer: String::new(),
            label: DEFAULT_LABEL.to_owned(),
            issuer_in_label: true,
            secret,
            algorithm: HashAlgorithm::default(),
            digits: DEFAULT_DIGITS,
            counter: 0,
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

    /// Configure the number of verification code digits
    ///
    /// Clamped to `1..=MAX_DIGITS`
    #[must_use]
    pub const fn with_digits(mut self, digits: u32) -> Self {
        self.digits = clamp_digits(digits);
        self
    }

    /// Configure the initial counter
    #[must_use]
    pub const fn with_counter(mut self, counter: u64) -> Self {
        self.counter = counter;
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

    /// Counter the next [`Hotp::generate`] will use
    #[must_use]
    pub const fn counter(&self) -> u64 {
        self.counter
    }

    /// Generates the code for the bound counter, then advances the counter
    ///
    /// # Errors
    ///
    /// Propagates the hash engine's failure; the counter is left unchanged.
    pub fn generate(&mut self) -> Result<String> {
        self.generate_with(&RustCrypto)
    }

    /// [`Hotp::generate`] with an explicit hash engine
    ///
    /// # Errors
    ///
    /// Propagates the hash engine's failure; the counter is left unchanged.
    pub fn generate_with<E: HashEngine + ?Sized>(&mut self, engine: &E) -> Result<String> {
        let code = generate(engine, &self.secret, self.algorithm, self.digits, self.counter)?;
        self.counter = self.counter.wrapping_add(1);
        Ok(code)
    }

    /// Generates the code for an arbitrary counter without touching the bound one
    ///
    /// # Errors
    ///
    /// Propagates the hash engine's failure.
    pub fn generate_at(&self, counter: u64) -> Result<String> {
        generate(&RustCrypto, &self.secret, self.algorithm, self.digits, counter)
    }

    /// Validates `token` around the bound counter with [`DEFAULT_WINDOW`]
    ///
    /// Does not advance the counter; on success the caller typically stores
    /// `counter + delta + 1` with [`Hotp::with_counter`].
    ///
    /// # Errors
    ///
    /// Propagates the hash engine's failure.
    pub fn validate(&self, token: &str) -> Result<Option<i64>> {
        self.validate_at(token, self.counter, DEFAULT_WINDOW)
    }

    /// Validates `token` around `counter` with the given `window`
    ///
    /// # Errors
    ///
    /// Propagates the hash engine's failure.
    pub fn validate_at(&self, token: &str, counter: u64, window: u32) -> Result<Option<i64>> {
        self.validate_with(&RustCrypto, token, counter, window)
    }

    /// [`Hotp::validate_at`] with an explicit hash engine
    ///
    /// # Errors
    ///
    /// Propagates the hash engine's failure.
    pub fn validate_with<E: HashEngine + ?Sized>(
        &self,
        engine: &E,
        token: &str,
        counter: u64,
        window: u32,
    ) -> Result<Option<i64>> {
        validate(
            engine,
            token,
            &self.secret,
            self.algorithm,
            self.digits,
            counter,
            window,
        )
    }
}

impl fmt::Display for Hotp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&uri::stringify_hotp(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::cell::Cell;

    const RFC4226_KEY: &[u8] = b"12345678901234567890";

    fn rfc_secret() -> Secret {
        Secret::from_bytes(RFC4226_KEY)
    }

    struct CountingEngine {
        calls: Cell<usize>,
    }

    impl HashEngine for CountingEngine {
        fn digest(&self, algorithm: HashAlgorithm, message: &[u8]) -> Result<Vec<u8>> {
            self.calls.set(self.calls.get() + 1);
            RustCrypto.digest(algorithm, message)
        }
    }

    struct NoBackend;

    impl HashEngine for NoBackend {
        fn digest(&self, algorithm: HashAlgorithm, _message: &[u8]) -> Result<Vec<u8>> {
            Err(Error::HashBackendUnavailable(algorithm))
        }
    }

    #[test]
    fn rfc4226_appendix_d() {
        let expected = [
            "755224", "287082", "359152", "969429", "338314", "254676", "287922", "162583",
            "399871", "520489",
        ];
        let secret = rfc_secret();
        for (counter, code) in (0u64..).zip(expected) {
            let generated = generate(&RustCrypto, &secret, HashAlgorithm::Sha1, 6, counter).unwrap();
            assert_eq!(generated, code, "HOTP mismatch at counter {counter}");
        }
    }

    #[test]
    fn codes_have_exact_length() {
        let secret = rfc_secret();
        for digits in [6, 7, 8] {
            for counter in [0, 1, 7, 1 << 40, u64::MAX] {
                let code = generate(&RustCrypto, &secret, HashAlgorithm::Sha256, digits, counter)
                    .unwrap();
                assert_eq!(code.len(), digits as usize);
                assert!(code.bytes().all(|b| b.is_ascii_digit()));
            }
        }
    }

    #[test]
    fn format_code_pads_and_reduces() {
        assert_eq!(format_code(1_284_755_224, 6), "755224");
        assert_eq!(format_code(42, 6), "000042");
        assert_eq!(format_code(1_284_755_224, 10), "1284755224");
        assert_eq!(format_code(7, 12), "0000000007");
        assert_eq!(format_code(u32::MAX >> 1, 4_000_000_000).len(), 10);
        assert_eq!(format_code(1_284_755_224, 0), "4");
    }

    #[test]
    fn truncation_uses_low_nibble_of_last_byte() {
        // RFC 4226 section 5.4 example digest
        let digest = [
            0x1f, 0x86, 0x98, 0x69, 0x0e, 0x02, 0xca, 0x16, 0x61, 0x85, 0x50, 0xef, 0x7f, 0x19,
            0xda, 0x8e, 0x94, 0x5b, 0x55, 0x5a,
        ];
        assert_eq!(truncation_rfc4226(&digest), 0x50ef_7f19);
    }

    #[test]
    fn validate_accepts_own_code() {
        let secret = rfc_secret();
        for counter in [0, 1, 5, 1_000_000] {
            for window in [0, 1, 3] {
                let token = generate(&RustCrypto, &secret, HashAlgorithm::Sha1, 6, counter).unwrap();
                let delta = validate(
                    &RustCrypto,
                    &token,
                    &secret,
                    HashAlgorithm::Sha1,
                    6,
                    counter,
                    window,
                )
                .unwrap();
                assert_eq!(delta, Some(0), "counter {counter} window {window}");
            }
        }
    }

    #[test]
    fn validate_reports_signed_offset() {
        let secret = rfc_secret();
        // counter 9 -> 520489, counter 1 -> 287082
        let ahead = validate(&RustCrypto, "520489", &secret, HashAlgorithm::Sha1, 6, 7, 2).unwrap();
        assert_eq!(ahead, Some(2));
        let behind = validate(&RustCrypto, "287082", &secret, HashAlgorithm::Sha1, 6, 3, 2).unwrap();
        assert_eq!(behind, Some(-2));
    }

    #[test]
    fn validate_rejects_outside_window() {
        let secret = rfc_secret();
        let token = generate(&RustCrypto, &secret, HashAlgorithm::Sha1, 6, 9).unwrap();
        let delta = validate(&RustCrypto, &token, &secret, HashAlgorithm::Sha1, 6, 5, 3).unwrap();
        assert_eq!(delta, None);
    }

    #[test]
    fn validate_clamps_window_at_zero() {
        let secret = rfc_secret();
        let delta = validate(&RustCrypto, "755224", &secret, HashAlgorithm::Sha1, 6, 1, 5).unwrap();
        assert_eq!(delta, Some(-1));
    }

    #[test]
    fn validate_wrong_length_skips_scan() {
        let engine = CountingEngine { calls: Cell::new(0) };
        let secret = rfc_secret();
        for token in ["75522", "7552240", ""] {
            let delta = validate(&engine, token, &secret, HashAlgorithm::Sha1, 6, 0, 10).unwrap();
            assert_eq!(delta, None);
        }
        assert_eq!(engine.calls.get(), 0);
    }

    #[test]
    fn digits_are_clamped_to_supported_range() {
        assert_eq!(clamp_digits(0), 1);
        assert_eq!(clamp_digits(8), 8);
        assert_eq!(clamp_digits(u32::MAX), MAX_DIGITS);

        let hotp = Hotp::new(rfc_secret()).with_digits(0);
        assert_eq!(hotp.digits(), 1);
        assert_eq!(hotp.generate_at(0).unwrap(), "4");
        assert_eq!(Hotp::new(rfc_secret()).with_digits(4_000_000_000).digits(), MAX_DIGITS);
    }

    #[test]
    fn zero_digits_validate_as_one_digit() {
        let hotp = Hotp::new(rfc_secret()).with_digits(0);
        assert_eq!(hotp.validate("").unwrap(), None);
        assert_eq!(hotp.validate("4").unwrap(), Some(0));

        let engine = CountingEngine { calls: Cell::new(0) };
        let delta = validate(&engine, "", &rfc_secret(), HashAlgorithm::Sha1, 0, 0, 3).unwrap();
        assert_eq!(delta, None);
        assert_eq!(engine.calls.get(), 0);
        let delta = validate(&RustCrypto, "4", &rfc_secret(), HashAlgorithm::Sha1, 0, 0, 0).unwrap();
        assert_eq!(delta, Some(0));
    }

    #[test]
    fn validate_scans_the_whole_window() {
        let engine = CountingEngine { calls: Cell::new(0) };
        let secret = rfc_secret();
        validate(&engine, "755224", &secret, HashAlgorithm::Sha1, 6, 10, 2).unwrap();
        // five candidates, two digests each
        assert_eq!(engine.calls.get(), 10);
    }

    #[test]
    fn validate_last_match_wins() {
        // single-digit codes collide often inside a wide window
        let secret = rfc_secret();
        let (reference, window) = (50u64, 40u32);
        let codes: Vec<String> = (reference - 40..=reference + 40)
            .map(|c| generate(&RustCrypto, &secret, HashAlgorithm::Sha1, 1, c).unwrap())
            .collect();
        let token = codes[0].clone();
        let last = codes.iter().rposition(|c| *c == token).unwrap() as i64 - 40;
        assert!(codes.iter().filter(|c| **c == token).count() > 1);

        let delta = validate(
            &RustCrypto,
            &token,
            &secret,
            HashAlgorithm::Sha1,
            1,
            reference,
            window,
        )
        .unwrap();
        assert_eq!(delta, Some(last));
    }

    #[test]
    fn instance_generate_advances_counter() {
        let mut hotp = Hotp::new(rfc_secret());
        assert_eq!(hotp.generate().unwrap(), "755224");
        assert_eq!(hotp.generate().unwrap(), "287082");
        assert_eq!(hotp.counter(), 2);
        assert_eq!(hotp.generate_at(9).unwrap(), "520489");
        assert_eq!(hotp.counter(), 2);
    }

    #[test]
    fn instance_validate_uses_bound_counter() {
        let hotp = Hotp::new(rfc_secret()).with_counter(2);
        assert_eq!(hotp.validate("287082").unwrap(), Some(-1));
        assert_eq!(hotp.validate("755224").unwrap(), None);
        assert_eq!(hotp.validate_at("520489", 0, 9).unwrap(), Some(9));
        assert_eq!(hotp.counter(), 2);
    }

    #[test]
    fn engine_failure_leaves_counter_untouched() {
        let mut hotp = Hotp::new(rfc_secret()).with_counter(4);
        assert!(matches!(
            hotp.generate_with(&NoBackend),
            Err(Error::HashBackendUnavailable(HashAlgorithm::Sha1))
        ));
        assert_eq!(hotp.counter(), 4);
    }

    #[test]
    fn defaults() {
        let hotp = Hotp::new(rfc_secret());
        assert_eq!(hotp.issuer(), "");
        assert_eq!(hotp.label(), DEFAULT_LABEL);
        assert!(hotp.issuer_in_label());
        assert_eq!(hotp.algorithm(), HashAlgorithm::Sha1);
        assert_eq!(hotp.digits(), DEFAULT_DIGITS);
        assert_eq!(hotp.counter(), 0);
    }
}
