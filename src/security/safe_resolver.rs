//! SSRF-safe DNS resolver for reqwest.
//!
//! Implements `reqwest::dns::Resolve` by delegating to the system resolver and
//! then dropping every returned address that is private or reserved. When no
//! address survives, the lookup fails before reqwest opens a TCP socket, which
//! closes the DNS-rebinding gap left by literal host filtering.

use std::net::SocketAddr;
use std::sync::Arc;

use once_cell::sync::Lazy;
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use tokio::sync::Semaphore;

use super::url_validation::is_blocked_ip;
use crate::error_handling::BLOCKED_ADDRESS_MARKER;

/// Caps concurrent `getaddrinfo` calls, which run on tokio's blocking pool.
static DNS_SEMAPHORE: Lazy<Arc<Semaphore>> = Lazy::new(|| Arc::new(Semaphore::new(64)));

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Resolver that refuses to hand private addresses to the connector.
///
/// Installed on the client when `block_private_resolution` is enabled.
#[derive(Debug, Clone, Default)]
pub struct SafeResolver;

impl Resolve for SafeResolver {
    fn resolve(&self, name: Name) -> Resolving {
        Box::pin(async move {
            let _permit = DNS_SEMAPHORE
                .acquire()
                .await
                .map_err(|e| -> BoxError { Box::new(e) })?;

            let host = format!("{}:0", name.as_str());
            let addrs: Vec<SocketAddr> = tokio::net::lookup_host(&host)
                .await
                .map_err(|e| -> BoxError { Box::new(e) })?
                .collect();

            let safe_addrs = filter_public(addrs);
            if safe_addrs.is_empty() {
                log::warn!("Blocked resolution of '{}' to a private address", name.as_str());
                return Err(Box::new(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    format!("'{}' {BLOCKED_ADDRESS_MARKER}", name.as_str()),
                )) as BoxError);
            }

            let addrs: Addrs = Box::new(safe_addrs.into_iter());
            Ok(addrs)
        })
    }
}

fn filter_public(addrs: Vec<SocketAddr>) -> Vec<SocketAddr> {
    addrs
        .into_iter()
        .filter(|addr| !is_blocked_ip(addr.ip()))
        .collect()
}
