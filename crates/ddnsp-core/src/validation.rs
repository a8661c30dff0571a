//! Input validation rules
//!
//! Stateless checks applied before any store write: hostnames, literal
//! addresses, TTLs and TXT values. Every check returns the typed value on
//! success so callers never re-parse.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use crate::error::{Error, Result};

/// Literal that asks the engine to use the caller's observed address
pub const AUTO: &str = "auto";

/// Lowest accepted TTL (seconds)
pub const MIN_TTL: u32 = 60;

/// Highest accepted TTL (seconds)
pub const MAX_TTL: u32 = 86_400;

/// TTL applied to A/AAAA updates that omit one
pub const DEFAULT_TTL: u32 = 300;

/// Maximum TXT value length in characters
pub const MAX_TXT_VALUE_LEN: usize = 255;

/// Maximum number of items admitted in one bulk update
pub const BULK_LIMIT: usize = 100;

/// A TTL known to lie within [`MIN_TTL`, `MAX_TTL`]
///
/// The only way to build one is through [`Ttl::new`] (or `TryFrom`), so a
/// stored record can never carry an out-of-range TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct Ttl(u32);

impl Ttl {
    /// Validate a raw TTL
    pub fn new(seconds: i64) -> Result<Self> {
        if seconds < i64::from(MIN_TTL) || seconds > i64::from(MAX_TTL) {
            return Err(Error::InvalidTtl(seconds));
        }
        // Bounds checked above, the cast cannot truncate.
        Ok(Self(seconds as u32))
    }

    /// TTL in seconds
    pub fn seconds(self) -> u32 {
        self.0
    }
}

impl Default for Ttl {
    fn default() -> Self {
        Self(DEFAULT_TTL)
    }
}

impl TryFrom<i64> for Ttl {
    type Error = Error;

    fn try_from(seconds: i64) -> Result<Self> {
        Self::new(seconds)
    }
}

impl From<Ttl> for u32 {
    fn from(ttl: Ttl) -> Self {
        ttl.0
    }
}

impl fmt::Display for Ttl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An address field as supplied by a client: either `"auto"` or a literal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressInput<A> {
    /// Use the caller's observed address
    Auto,
    /// Use this address
    Literal(A),
}

/// Check a hostname
///
/// Rejects the empty string, any `..` sequence, and any character outside
/// `[A-Za-z0-9._-]`.
pub fn hostname(s: &str) -> Result<&str> {
    if s.is_empty() {
        return Err(Error::invalid_hostname("hostname cannot be empty"));
    }

    if s.contains("..") {
        return Err(Error::invalid_hostname(format!(
            "hostname has an empty label: '{}'",
            s
        )));
    }

    if !s
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-')
    {
        return Err(Error::invalid_hostname(format!(
            "hostname contains invalid characters: '{}'",
            s
        )));
    }

    Ok(s)
}

/// Check an IPv4 field
///
/// `"auto"` is always accepted. Anything else must be exactly four
/// dot-separated decimal octets, each in `0..=255`.
pub fn ipv4(s: &str) -> Result<AddressInput<Ipv4Addr>> {
    if s == AUTO {
        return Ok(AddressInput::Auto);
    }

    let mut octets = [0u8; 4];
    let mut parts = s.split('.');

    for octet in &mut octets {
        let part = parts
            .next()
            .ok_or_else(|| Error::invalid_ip(format!("'{}' is not a dotted quad", s)))?;
        *octet = parse_octet(part)
            .ok_or_else(|| Error::invalid_ip(format!("'{}' has an invalid octet '{}'", s, part)))?;
    }

    if parts.next().is_some() {
        return Err(Error::invalid_ip(format!("'{}' is not a dotted quad", s)));
    }

    Ok(AddressInput::Literal(Ipv4Addr::from(octets)))
}

fn parse_octet(part: &str) -> Option<u8> {
    if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse::<u16>().ok().and_then(|n| u8::try_from(n).ok())
}

/// Check an IPv6 field
///
/// `"auto"` is accepted (and later resolves to no value); anything else
/// must parse as an IPv6 address.
pub fn ipv6(s: &str) -> Result<AddressInput<Ipv6Addr>> {
    if s == AUTO {
        return Ok(AddressInput::Auto);
    }

    s.parse::<Ipv6Addr>()
        .map(AddressInput::Literal)
        .map_err(|_| Error::invalid_ip(format!("'{}' is not an IPv6 address", s)))
}

/// Whether an IPv4 address lies in private or loopback space
///
/// Covers 10.0.0.0/8, 172.16.0.0/12, 192.168.0.0/16 and 127.0.0.0/8.
pub fn is_private(ip: Ipv4Addr) -> bool {
    let [a, b, ..] = ip.octets();
    a == 10 || (a == 172 && (16..=31).contains(&b)) || (a == 192 && b == 168) || a == 127
}

/// Check an IPv4 field and reject private literals
///
/// `"auto"` is never considered private.
pub fn public_ipv4(s: &str) -> Result<AddressInput<Ipv4Addr>> {
    match ipv4(s)? {
        AddressInput::Literal(ip) if is_private(ip) => Err(Error::invalid_ip(format!(
            "private IP address {} is not allowed",
            ip
        ))),
        input => Ok(input),
    }
}

/// Check an optional TTL, applying `default` when it is omitted
pub fn ttl(n: Option<i64>, default: Ttl) -> Result<Ttl> {
    match n {
        Some(seconds) => Ttl::new(seconds),
        None => Ok(default),
    }
}

/// Check a TXT value: present, non-empty, at most 255 characters
pub fn txt_value(value: Option<&str>) -> Result<&str> {
    let value = match value {
        Some(v) if !v.is_empty() => v,
        _ => return Err(Error::TxtValueRequired),
    };

    let len = value.chars().count();
    if len > MAX_TXT_VALUE_LEN {
        return Err(Error::TxtValueTooLong(len));
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn hostname_rules() {
        assert_ok!(hostname("a-b.example.com"));
        assert_ok!(hostname("_acme-challenge.example.com"));
        assert_err!(hostname(""));
        assert_err!(hostname("a..b"));
        assert_err!(hostname("bad host.example.com"));
        assert_err!(hostname("ümlaut.example.com"));
    }

    #[test]
    fn ipv4_accepts_auto_and_dotted_quads() {
        assert_eq!(ipv4("auto").unwrap(), AddressInput::Auto);
        assert_eq!(
            ipv4("93.184.216.34").unwrap(),
            AddressInput::Literal(Ipv4Addr::new(93, 184, 216, 34))
        );
        assert_eq!(
            ipv4("0.0.0.0").unwrap(),
            AddressInput::Literal(Ipv4Addr::UNSPECIFIED)
        );
    }

    #[test]
    fn ipv4_rejects_malformed() {
        for bad in ["", "1.2.3", "1.2.3.4.5", "256.1.1.1", "1.2.3.x", "1..3.4", "-1.2.3.4", "1.2.3.4 "] {
            let err = ipv4(bad).unwrap_err();
            assert_eq!(err.code(), "invalid_ip", "input {:?}", bad);
        }
    }

    #[test]
    fn private_ranges() {
        assert!(is_private(Ipv4Addr::new(10, 0, 0, 1)));
        assert!(is_private(Ipv4Addr::new(172, 16, 0, 1)));
        assert!(is_private(Ipv4Addr::new(172, 31, 255, 255)));
        assert!(!is_private(Ipv4Addr::new(172, 32, 0, 1)));
        assert!(!is_private(Ipv4Addr::new(172, 15, 0, 1)));
        assert!(is_private(Ipv4Addr::new(192, 168, 1, 1)));
        assert!(is_private(Ipv4Addr::new(127, 0, 0, 1)));
        assert!(!is_private(Ipv4Addr::new(93, 184, 216, 34)));
    }

    #[test]
    fn public_ipv4_rejects_private_literals_only() {
        assert_eq!(public_ipv4("192.168.1.1").unwrap_err().code(), "invalid_ip");
        assert_ok!(public_ipv4("93.184.216.34"));
        assert_eq!(public_ipv4("auto").unwrap(), AddressInput::Auto);
    }

    #[test]
    fn ttl_boundaries() {
        assert_err!(Ttl::new(59));
        assert_eq!(Ttl::new(60).unwrap().seconds(), 60);
        assert_eq!(Ttl::new(86_400).unwrap().seconds(), 86_400);
        assert_err!(Ttl::new(86_401));
        assert_err!(Ttl::new(-1));
        assert_eq!(ttl(None, Ttl::default()).unwrap().seconds(), DEFAULT_TTL);
    }

    #[test]
    fn ttl_deserialization_is_checked() {
        let ttl: Ttl = serde_json::from_str("120").unwrap();
        assert_eq!(ttl.seconds(), 120);
        assert!(serde_json::from_str::<Ttl>("30").is_err());
        assert_eq!(serde_json::to_string(&ttl).unwrap(), "120");
    }

    #[test]
    fn ipv6_field() {
        assert_eq!(ipv6("auto").unwrap(), AddressInput::Auto);
        assert_ok!(ipv6("2001:db8::1"));
        assert_eq!(ipv6("not-an-address").unwrap_err().code(), "invalid_ip");
    }

    #[test]
    fn txt_value_rules() {
        assert_eq!(txt_value(None).unwrap_err().code(), "txt_value_required");
        assert_eq!(txt_value(Some("")).unwrap_err().code(), "txt_value_required");
        assert_ok!(txt_value(Some(&"x".repeat(255))));
        assert_eq!(
            txt_value(Some(&"x".repeat(256))).unwrap_err().code(),
            "txt_value_too_long"
        );
    }
}
