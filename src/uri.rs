//! `otpauth://` key URI parsing and generation per the Google Authenticator
//! key-URI format:
//! <https://github.com/google/google-authenticator/wiki/Key-Uri-Format>
//!
//! Format: `otpauth://totp/ISSUER:LABEL?secret=BASE32&algorithm=SHA1&digits=6&period=30&issuer=ISSUER`

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::LazyLock;

use log::debug;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;

use crate::algorithm::canonicalize;
use crate::hotp::{Hotp, MAX_DIGITS};
use crate::totp::Totp;
use crate::{Error, HashAlgorithm, Otp, Result, Secret};

static URI_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^otpauth://([^/?]+)/(.+)\?([A-Z0-9.~_-]+=[^?&]*(?:&[A-Z0-9.~_-]+=[^?&]*)*)$",
    )
    .expect("otpauth URI pattern is valid")
});

static LABEL_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(.*?)(?::|%3A) *(.+)$").expect("label separator pattern is valid")
});

static SECRET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[2-7A-Z]+=*$").expect("secret pattern is valid"));

static INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?[0-9]+$").expect("integer pattern is valid"));

static POSITIVE_INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[1-9][0-9]*$").expect("positive integer pattern is valid"));

/// Characters `encodeURIComponent` leaves untouched
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Parse
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Parses an `otpauth://` URI into an [`Otp`]
///
/// # Errors
///
/// - [`Error::InvalidUriFormat`] when the scheme, type, label or parameter
///   block is malformed
/// - [`Error::UnknownOtpType`] for a type other than `hotp` or `totp`
/// - [`Error::MissingOrInvalidParameter`] for a bad `counter`, `period`,
///   `secret` or `digits`
/// - [`Error::UnsupportedAlgorithm`] for an `algorithm` outside the supported set
pub fn parse(uri: &str) -> Result<Otp> {
    let captures = URI_FORMAT.captures(uri).ok_or(Error::InvalidUriFormat)?;
    let (kind, raw_label, raw_params) = (&captures[1], &captures[2], &captures[3]);

    let params = parse_params(raw_params)?;
    let param = |name: &str| params.get(name).map(String::as_str);

    enum Kind {
        Hotp(u64),
        Totp(Option<u32>),
    }

    let kind = match kind.to_ascii_lowercase().as_str() {
        "hotp" => {
            let counter = param("counter")
                .filter(|v| INTEGER.is_match(v))
                .and_then(|v| v.parse::<i128>().ok())
                .and_then(|v| u64::try_from(v).ok())
                .ok_or(Error::MissingOrInvalidParameter("counter"))?;
            Kind::Hotp(counter)
        }
        "totp" => {
            let period = param("period")
                .map(|v| parse_positive(v).ok_or(Error::MissingOrInvalidParameter("period")))
                .transpose()?;
            Kind::Totp(period)
        }
        _ => return Err(Error::UnknownOtpType(kind.to_owned())),
    };

    // a present `issuer` parameter wins over the label prefix, even when empty
    let (label_issuer, label) = split_label(raw_label)?;
    let (issuer, issuer_in_label) = match (param("issuer"), label_issuer) {
        (Some(issuer), Some(prefix)) => (issuer.to_owned(), !prefix.is_empty()),
        (Some(issuer), None) => (issuer.to_owned(), false),
        (None, Some(prefix)) => (prefix, true),
        (None, None) => (String::new(), true),
    };

    let secret = param("secret")
        .filter(|v| SECRET.is_match(v))
        .and_then(|v| Secret::from_base32(v).ok())
        .ok_or(Error::MissingOrInvalidParameter("secret"))?;

    let algorithm = param("algorithm")
        .map(canonicalize)
        .transpose()?
        .unwrap_or_default();

    let digits = param("digits")
        .map(|v| {
            parse_positive(v)
                .filter(|&digits| digits <= MAX_DIGITS)
                .ok_or(Error::MissingOrInvalidParameter("digits"))
        })
        .transpose()?;

    let otp = match kind {
        Kind::Hotp(counter) => {
            let mut hotp = Hotp::new(secret)
                .with_issuer(issuer)
                .with_label(label)
                .with_issuer_in_label(issuer_in_label)
                .with_algorithm(algorithm)
                .with_counter(counter);
            if let Some(digits) = digits {
                hotp = hotp.with_digits(digits);
            }
            Otp::Hotp(hotp)
        }
        Kind::Totp(period) => {
            let mut totp = Totp::new(secret)
                .with_issuer(issuer)
                .with_label(label)
                .with_issuer_in_label(issuer_in_label)
                .with_algorithm(algorithm);
            if let Some(digits) = digits {
                totp = totp.with_digits(digits);
            }
            if let Some(period) = period {
                totp = totp.with_period(period);
            }
            Otp::Totp(totp)
        }
    };

    debug!(
        "parsed otpauth URI: type={}, issuer={:?}, label={:?}",
        otp.kind(),
        otp.issuer(),
        otp.label()
    );
    Ok(otp)
}

/// Keys are lowercased, keys and values are percent-decoded, the last
/// occurrence of a repeated key wins.
fn parse_params(raw: &str) -> Result<HashMap<String, String>> {
    raw.split('&')
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            Ok((decode(key)?.to_lowercase(), decode(value)?.into_owned()))
        })
        .collect()
}

/// Splits `ISSUER:ACCOUNT` at the first `:` (raw or `%3A`), decoding and
/// trimming both parts.
fn split_label(raw: &str) -> Result<(Option<String>, String)> {
    match LABEL_SEPARATOR.captures(raw) {
        Some(parts) => Ok((
            Some(decode(&parts[1])?.trim().to_owned()),
            decode(&parts[2])?.trim().to_owned(),
        )),
        None => Ok((None, decode(raw)?.trim().to_owned())),
    }
}

fn parse_positive(value: &str) -> Option<u32> {
    if POSITIVE_INTEGER.is_match(value) {
        value.parse().ok()
    } else {
        None
    }
}

/// Every `%` must start a two hex digit escape
fn decode(component: &str) -> Result<Cow<'_, str>> {
    let bytes = component.as_bytes();
    let well_formed = bytes
        .iter()
        .enumerate()
        .filter(|&(_, &b)| b == b'%')
        .all(|(i, _)| {
            bytes
                .get(i + 1..i + 3)
                .is_some_and(|escape| escape.iter().all(u8::is_ascii_hexdigit))
        });
    if !well_formed {
        return Err(Error::InvalidUriFormat);
    }

    percent_decode_str(component)
        .decode_utf8()
        .map_err(|_| Error::InvalidUriFormat)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Generate
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Serializes an [`Otp`] as an `otpauth://` URI
///
/// Parameters always appear in the order `secret`, `algorithm`, `digits`,
/// `counter` or `period`, then `issuer` when it is not empty.
#[must_use]
pub fn stringify(otp: &Otp) -> String {
    match otp {
        Otp::Hotp(hotp) => stringify_hotp(hotp),
        Otp::Totp(totp) => stringify_totp(totp),
    }
}

pub(crate) fn stringify_hotp(hotp: &Hotp) -> String {
    build(
        &Fields {
            kind: "hotp",
            issuer: hotp.issuer(),
            label: hotp.label(),
            issuer_in_label: hotp.issuer_in_label(),
            secret: hotp.secret(),
            algorithm: hotp.algorithm(),
            digits: hotp.digits(),
        },
        ("counter", hotp.counter()),
    )
}

pub(crate) fn stringify_totp(totp: &Totp) -> String {
    build(
        &Fields {
            kind: "totp",
            issuer: totp.issuer(),
            label: totp.label(),
            issuer_in_label: totp.issuer_in_label(),
            secret: totp.secret(),
            algorithm: totp.algorithm(),
            digits: totp.digits(),
        },
        ("period", u64::from(totp.period())),
    )
}

struct Fields<'a> {
    kind: &'static str,
    issuer: &'a str,
    label: &'a str,
    issuer_in_label: bool,
    secret: &'a Secret,
    algorithm: HashAlgorithm,
    digits: u32,
}

fn build(fields: &Fields<'_>, (step_name, step): (&str, u64)) -> String {
    let label = if !fields.issuer.is_empty() && fields.issuer_in_label {
        format!("{}:{}", encode(fields.issuer), encode(fields.label))
    } else {
        encode(fields.label).to_string()
    };

    let mut uri = format!(
        "otpauth://{}/{}?secret={}&algorithm={}&digits={}&{}={}",
        fields.kind,
        label,
        encode(fields.secret.base32()),
        encode(fields.algorithm.as_str()),
        fields.digits,
        step_name,
        step,
    );
    if !fields.issuer.is_empty() {
        uri.push_str("&issuer=");
        uri.push_str(&encode(fields.issuer).to_string());
    }
    uri
}

fn encode(component: &str) -> percent_encoding::PercentEncode<'_> {
    utf8_percent_encode(component, COMPONENT)
}
