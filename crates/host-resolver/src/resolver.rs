use std::collections::HashMap;
use std::fmt;
use std::net::{IpAddr, ToSocketAddrs};

use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised while validating a configured address.
#[derive(Debug, Error)]
pub enum AddressError {
    /// The address field was present but blank.
    #[error("address must not be empty")]
    Empty,

    /// The value is neither an IP literal nor a syntactically valid hostname.
    #[error("'{host}' is not a valid IP address or hostname")]
    InvalidHostname { host: String },

    /// The hostname is well-formed but did not resolve to any address.
    #[error("'{host}' is not resolvable")]
    Unresolvable { host: String },
}

/// A validated device address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceAddress {
    /// An IPv4 or IPv6 literal.
    Ip(IpAddr),
    /// A hostname together with the addresses it resolved to at load time.
    Hostname { host: String, resolved: Vec<IpAddr> },
}

impl DeviceAddress {
    /// The address as it should be handed to an execution driver.
    pub fn target(&self) -> String {
        match self {
            Self::Ip(ip) => ip.to_string(),
            Self::Hostname { host, .. } => host.clone(),
        }
    }

    /// The first known IP address, if any.
    pub fn ip(&self) -> Option<IpAddr> {
        match self {
            Self::Ip(ip) => Some(*ip),
            Self::Hostname { resolved, .. } => resolved.first().copied(),
        }
    }

    pub fn is_hostname(&self) -> bool {
        matches!(self, Self::Hostname { .. })
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ip(ip) => write!(f, "{ip}"),
            Self::Hostname { host, .. } => write!(f, "{host}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Resolvers
// ---------------------------------------------------------------------------

/// Name resolution used while loading configuration.
///
/// Loading is synchronous and happens off the request path, so lookups are
/// allowed to block.
pub trait Resolver: Send + Sync {
    fn lookup(&self, host: &str) -> std::io::Result<Vec<IpAddr>>;
}

/// Resolves through the operating system (`getaddrinfo`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl Resolver for SystemResolver {
    fn lookup(&self, host: &str) -> std::io::Result<Vec<IpAddr>> {
        let addrs = (host, 0u16).to_socket_addrs()?;
        Ok(addrs.map(|a| a.ip()).collect())
    }
}

/// A fixed host table. Unknown hosts resolve to nothing.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    entries: HashMap<String, Vec<IpAddr>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) an entry, builder style.
    pub fn with_host(mut self, host: impl Into<String>, addrs: &[IpAddr]) -> Self {
        self.entries
            .insert(host.into().to_ascii_lowercase(), addrs.to_vec());
        self
    }
}

impl Resolver for StaticResolver {
    fn lookup(&self, host: &str) -> std::io::Result<Vec<IpAddr>> {
        Ok(self
            .entries
            .get(&host.to_ascii_lowercase())
            .cloned()
            .unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a raw address field.
///
/// IP literals are accepted as-is. Anything else must look like a hostname
/// and resolve to at least one address through `resolver`.
pub fn resolve_address(raw: &str, resolver: &dyn Resolver) -> Result<DeviceAddress, AddressError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AddressError::Empty);
    }

    if let Ok(ip) = raw.parse::<IpAddr>() {
        return Ok(DeviceAddress::Ip(ip));
    }

    if !is_valid_hostname(raw) {
        return Err(AddressError::InvalidHostname {
            host: raw.to_string(),
        });
    }

    let resolved = match resolver.lookup(raw) {
        Ok(addrs) => addrs,
        Err(e) => {
            warn!(host = raw, error = %e, "hostname lookup failed");
            Vec::new()
        }
    };

    if resolved.is_empty() {
        return Err(AddressError::Unresolvable {
            host: raw.to_string(),
        });
    }

    debug!(host = raw, addrs = ?resolved, "resolved hostname");

    Ok(DeviceAddress::Hostname {
        host: raw.to_string(),
        resolved,
    })
}

/// RFC 1123 hostname syntax: dot-separated labels of letters, digits and
/// hyphens, no label starting or ending with a hyphen.
fn is_valid_hostname(host: &str) -> bool {
    let host = host.strip_suffix('.').unwrap_or(host);
    if host.is_empty() || host.len() > 253 {
        return false;
    }
    host.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}
