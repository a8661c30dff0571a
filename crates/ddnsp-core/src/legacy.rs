//! DynDNS2 response vocabulary
//!
//! Legacy clients only understand a fixed set of bare text tokens and
//! expect HTTP 200 for every one of them, failures included. Each token
//! is one variant of [`LegacyResponse`].

use std::fmt;
use std::net::IpAddr;

/// One DynDNS2 response token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyResponse {
    /// `good {ip}`: the address was set (or the hostname is new)
    Good(IpAddr),
    /// `nochg {ip}`: the address was already set to this value
    NoChange(IpAddr),
    /// `nohost`: the hostname does not exist or is not owned by the caller
    NoHost,
    /// `badauth`: missing or rejected credentials
    BadAuth,
    /// `notfqdn`: no hostname, or not a valid hostname
    NotFqdn,
    /// `abuse`: the request was refused as abusive
    Abuse,
    /// `dnserr`: the DNS backend reported an error
    DnsErr,
    /// `911`: internal fault
    Emergency,
}

impl LegacyResponse {
    /// Whether the token reports a successful update
    pub fn is_success(&self) -> bool {
        matches!(self, LegacyResponse::Good(_) | LegacyResponse::NoChange(_))
    }
}

impl fmt::Display for LegacyResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LegacyResponse::Good(ip) => write!(f, "good {}", ip),
            LegacyResponse::NoChange(ip) => write!(f, "nochg {}", ip),
            LegacyResponse::NoHost => f.write_str("nohost"),
            LegacyResponse::BadAuth => f.write_str("badauth"),
            LegacyResponse::NotFqdn => f.write_str("notfqdn"),
            LegacyResponse::Abuse => f.write_str("abuse"),
            LegacyResponse::DnsErr => f.write_str("dnserr"),
            LegacyResponse::Emergency => f.write_str("911"),
        }
    }
}

/// Full reply to one legacy request
///
/// A request naming several comma-separated hostnames gets one token per
/// hostname, in request order, joined by `\n`. Request-wide failures
/// (`badauth`, `abuse`) are a single token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyReply {
    responses: Vec<LegacyResponse>,
}

impl LegacyReply {
    /// Content type of the rendered body
    pub const CONTENT_TYPE: &'static str = "text/plain";

    /// Reply made of a single token
    pub fn single(response: LegacyResponse) -> Self {
        Self {
            responses: vec![response],
        }
    }

    /// Reply with one token per hostname
    pub fn per_host(responses: Vec<LegacyResponse>) -> Self {
        Self { responses }
    }

    /// Tokens in request order
    pub fn responses(&self) -> &[LegacyResponse] {
        &self.responses
    }

    /// Transport status: always success-class
    pub fn http_status(&self) -> u16 {
        200
    }

    /// Rendered text body
    pub fn body(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for LegacyReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, response) in self.responses.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{}", response)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_render_verbatim() {
        let ip = IpAddr::from([93, 184, 216, 34]);
        assert_eq!(LegacyResponse::Good(ip).to_string(), "good 93.184.216.34");
        assert_eq!(LegacyResponse::NoChange(ip).to_string(), "nochg 93.184.216.34");
        assert_eq!(LegacyResponse::NoHost.to_string(), "nohost");
        assert_eq!(LegacyResponse::BadAuth.to_string(), "badauth");
        assert_eq!(LegacyResponse::NotFqdn.to_string(), "notfqdn");
        assert_eq!(LegacyResponse::Abuse.to_string(), "abuse");
        assert_eq!(LegacyResponse::DnsErr.to_string(), "dnserr");
        assert_eq!(LegacyResponse::Emergency.to_string(), "911");
    }

    #[test]
    fn multi_host_reply_is_newline_joined() {
        let ip = IpAddr::from([93, 184, 216, 34]);
        let reply = LegacyReply::per_host(vec![LegacyResponse::Good(ip), LegacyResponse::NotFqdn]);
        assert_eq!(reply.body(), "good 93.184.216.34\nnotfqdn");
        assert_eq!(reply.http_status(), 200);
    }

    #[test]
    fn success_classification() {
        let ip = IpAddr::from([1, 1, 1, 1]);
        assert!(LegacyResponse::Good(ip).is_success());
        assert!(LegacyResponse::NoChange(ip).is_success());
        assert!(!LegacyResponse::BadAuth.is_success());
        assert!(!LegacyResponse::Emergency.is_success());
    }
}
