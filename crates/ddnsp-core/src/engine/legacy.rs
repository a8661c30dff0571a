// # Legacy Updates
//
// DynDNS2 request handling. Every path ends in a `LegacyReply`; nothing
// here returns an error, and the reply always goes out with status 200.
//
// Evaluation order:
// 1. Basic credentials → `badauth`
// 2. `hostname` query parameter present → else `notfqdn`
// 3. Hostname count within the cap → else `abuse`
// 4. Per hostname: format check (`notfqdn`), upsert (`911` on fault),
//    then `good`/`nochg` against the previously stored address

use std::net::IpAddr;
use tracing::{debug, error, warn};

use super::{EngineEvent, UpdateEngine};
use crate::legacy::{LegacyReply, LegacyResponse};
use crate::traits::RecordPatch;
use crate::transport::RequestContext;
use crate::validation::{self, AddressInput, AUTO};

impl UpdateEngine {
    /// Handle a DynDNS2 update
    ///
    /// Reads `hostname` (comma-separated for several hosts) and the
    /// optional `myip` from the query. Stored TTLs are left as they are.
    pub async fn legacy_update(&self, ctx: &RequestContext) -> LegacyReply {
        if self.auth.resolve_basic(ctx).is_none() {
            warn!("Rejected credentials on legacy update");
            self.emit_event(EngineEvent::AuthRejected { endpoint: "legacy" });
            return LegacyReply::single(LegacyResponse::BadAuth);
        }

        let Some(param) = ctx.query("hostname").filter(|h| !h.trim().is_empty()) else {
            return LegacyReply::single(LegacyResponse::NotFqdn);
        };

        let hostnames: Vec<&str> = param.split(',').map(str::trim).collect();
        if hostnames.len() > self.legacy_max_hostnames {
            warn!(
                "Legacy update named {} hostnames (limit {})",
                hostnames.len(),
                self.legacy_max_hostnames
            );
            return LegacyReply::single(LegacyResponse::Abuse);
        }

        let ip = self.legacy_address(ctx);
        let mut responses = Vec::with_capacity(hostnames.len());
        for hostname in hostnames {
            responses.push(self.legacy_update_host(hostname, ip).await);
        }
        LegacyReply::per_host(responses)
    }

    /// Address to publish: a usable `myip`, else the caller's address
    fn legacy_address(&self, ctx: &RequestContext) -> IpAddr {
        if let Some(myip) = ctx.query("myip").filter(|v| !v.is_empty() && *v != AUTO) {
            match parse_myip(myip) {
                Some(ip) => return ip,
                None => debug!("Ignoring unusable myip '{}'", myip),
            }
        }
        self.ip_resolver.resolve_client_address(ctx)
    }

    async fn legacy_update_host(&self, hostname: &str, ip: IpAddr) -> LegacyResponse {
        if validation::hostname(hostname).is_err() {
            return LegacyResponse::NotFqdn;
        }

        let patch = match ip {
            IpAddr::V4(v4) => RecordPatch::ipv4(v4),
            IpAddr::V6(v6) => RecordPatch::ipv6(v6),
        };

        let outcome = match self.records.upsert(hostname, patch).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Legacy update of {} failed: {}", hostname, e);
                return LegacyResponse::Emergency;
            }
        };
        self.emit_upsert_event(hostname, &outcome);

        let changed = match (outcome.previous(), ip) {
            (None, _) => true,
            (Some(previous), IpAddr::V4(v4)) => previous.ipv4 != Some(v4),
            (Some(previous), IpAddr::V6(v6)) => previous.ipv6 != Some(v6),
        };

        if changed {
            LegacyResponse::Good(ip)
        } else {
            LegacyResponse::NoChange(ip)
        }
    }
}

/// Public IPv4 or any IPv6 literal; anything else is ignored
fn parse_myip(myip: &str) -> Option<IpAddr> {
    if let Ok(AddressInput::Literal(v4)) = validation::public_ipv4(myip) {
        return Some(IpAddr::V4(v4));
    }
    match validation::ipv6(myip) {
        Ok(AddressInput::Literal(v6)) => Some(IpAddr::V6(v6)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn myip_parsing() {
        assert_eq!(parse_myip("93.184.216.34"), Some(IpAddr::from([93, 184, 216, 34])));
        assert_eq!(parse_myip("2001:db8::1"), "2001:db8::1".parse().ok());
        assert_eq!(parse_myip("192.168.1.1"), None);
        assert_eq!(parse_myip("not-an-ip"), None);
        assert_eq!(parse_myip("1.2.3"), None);
    }
}
