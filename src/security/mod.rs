//! SSRF protection.
//!
//! Two layers keep checks away from internal targets:
//! - literal host validation during URL normalization
//! - an optional resolver that filters private addresses after DNS lookup

mod safe_resolver;
mod url_validation;

pub use safe_resolver::SafeResolver;
pub use url_validation::{check_host_safe, is_blocked_ip, validate_url_safe};
