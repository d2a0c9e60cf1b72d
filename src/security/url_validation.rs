//! URL validation for SSRF protection.
//!
//! Rejects targets that point at the local machine or internal networks:
//! loopback, private, link-local, unspecified, multicast, and reserved
//! addresses, plus `localhost` names. Only the literal host is inspected here;
//! see [`SafeResolver`](super::SafeResolver) for post-resolution filtering.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use url::{Host, Url};

use crate::error_handling::NormalizeError;

/// Validates that a parsed URL is safe to fetch.
///
/// Only `http` and `https` are accepted, the URL must carry a host, and the
/// host must not be internal.
///
/// # Errors
///
/// Returns [`NormalizeError::UnsupportedScheme`], [`NormalizeError::MissingHost`],
/// or [`NormalizeError::UnsafeTarget`].
pub fn validate_url_safe(url: &Url) -> Result<(), NormalizeError> {
    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(NormalizeError::UnsupportedScheme(scheme.to_string())),
    }

    let host = url.host().ok_or(NormalizeError::MissingHost)?;
    check_host_safe(&host)
}

/// Validates a single host against the internal-target rules.
pub fn check_host_safe(host: &Host<&str>) -> Result<(), NormalizeError> {
    match host {
        Host::Domain(domain) => {
            if is_localhost_domain(domain) {
                return Err(NormalizeError::UnsafeTarget(format!(
                    "localhost domain '{domain}'"
                )));
            }
        }
        Host::Ipv4(ip) => {
            if is_private_ipv4(*ip) {
                return Err(NormalizeError::UnsafeTarget(format!(
                    "private IPv4 address '{ip}'"
                )));
            }
        }
        Host::Ipv6(ip) => {
            if is_private_ipv6(*ip) {
                return Err(NormalizeError::UnsafeTarget(format!(
                    "private IPv6 address '{ip}'"
                )));
            }
        }
    }
    Ok(())
}

/// Returns true for any address a check must never connect to.
pub fn is_blocked_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_private_ipv4(v4),
        IpAddr::V6(v6) => is_private_ipv6(v6),
    }
}

fn is_private_ipv4(ip: Ipv4Addr) -> bool {
    let octets = ip.octets();

    ip.is_loopback() // 127.0.0.0/8
        || ip.is_private() // 10/8, 172.16/12, 192.168/16
        || ip.is_link_local() // 169.254/16
        || octets[0] == 0 // this network
        || (octets[0] == 100 && (64..=127).contains(&octets[1])) // shared address space
        || ip.is_multicast() // 224/4
        || octets[0] >= 240 // reserved and broadcast
}

fn is_private_ipv6(ip: Ipv6Addr) -> bool {
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_private_ipv4(v4);
    }

    let segments = ip.segments();

    ip.is_loopback()
        || ip.is_unspecified()
        || (segments[0] & 0xfe00) == 0xfc00 // unique local
        || (segments[0] & 0xffc0) == 0xfe80 // link-local
        || ip.is_multicast()
}

fn is_localhost_domain(domain: &str) -> bool {
    let domain_lower = domain.to_lowercase();
    let domain_lower = domain_lower.trim_end_matches('.');
    matches!(domain_lower, "localhost" | "localhost.localdomain")
        || domain_lower.ends_with(".localhost")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(url: &str) -> Result<(), NormalizeError> {
        validate_url_safe(&Url::parse(url).unwrap())
    }

    #[test]
    fn test_validate_url_safe_public_urls() {
        assert!(check("https://example.com").is_ok());
        assert!(check("http://example.com").is_ok());
        assert!(check("https://subdomain.example.com").is_ok());
        assert!(check("https://example.com:8080").is_ok());
        assert!(check("https://example.com/path?query=value").is_ok());
    }

    #[test]
    fn test_validate_url_safe_public_ips() {
        assert!(check("http://192.0.2.1").is_ok());
        assert!(check("http://8.8.8.8").is_ok());
        assert!(check("http://1.1.1.1").is_ok());
        assert!(check("http://[2001:db8::1]").is_ok());
    }

    #[test]
    fn test_validate_url_safe_private_ipv4() {
        for url in [
            "http://127.0.0.1",
            "http://127.0.0.1:8080",
            "http://127.255.0.3",
            "http://192.168.1.1",
            "http://10.0.0.1",
            "http://172.16.0.1",
            "http://172.31.255.255",
            "http://169.254.169.254",
            "http://0.0.0.0",
            "http://100.64.0.1",
            "http://224.0.0.1",
            "http://255.255.255.255",
        ] {
            assert!(
                matches!(check(url), Err(NormalizeError::UnsafeTarget(_))),
                "{url} should be rejected"
            );
        }
    }

    #[test]
    fn test_validate_url_safe_boundary_ipv4() {
        assert!(check("http://172.15.255.255").is_ok());
        assert!(check("http://172.32.0.1").is_ok());
        assert!(check("http://100.128.0.1").is_ok());
    }

    #[test]
    fn test_validate_url_safe_private_ipv6() {
        assert!(check("http://[::1]").is_err());
        assert!(check("http://[::]").is_err());
        assert!(check("http://[fc00::1]").is_err());
        assert!(check("http://[fd12:3456::1]").is_err());
        assert!(check("http://[fe80::1]").is_err());
        assert!(check("http://[ff02::1]").is_err());
        assert!(check("http://[::ffff:10.0.0.1]").is_err());
    }

    #[test]
    fn test_validate_url_safe_localhost_domains() {
        assert!(check("http://localhost").is_err());
        assert!(check("http://LOCALHOST:8080").is_err());
        assert!(check("http://localhost.localdomain").is_err());
        assert!(check("http://subdomain.localhost").is_err());
        assert!(check("http://localhost.").is_err());
    }

    #[test]
    fn test_validate_url_safe_unsafe_schemes() {
        assert!(matches!(
            check("file:///etc/passwd"),
            Err(NormalizeError::UnsupportedScheme(_))
        ));
        assert!(check("ftp://example.com").is_err());
        assert!(check("gopher://example.com").is_err());
    }

    #[test]
    fn test_is_blocked_ip() {
        assert!(is_blocked_ip("10.1.2.3".parse().unwrap()));
        assert!(is_blocked_ip("::1".parse().unwrap()));
        assert!(!is_blocked_ip("93.184.216.34".parse().unwrap()));
        assert!(!is_blocked_ip("2606:2800:220:1::1".parse().unwrap()));
    }
}
