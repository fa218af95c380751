//! Resolver records and configuration snapshots.

use std::net::IpAddr;
use std::time::Duration;

use crate::address::{AddressRecord, SortRule};

/// Standard DNS port.
pub const DEFAULT_PORT: u16 = 53;

/// Per-query timeout in seconds.
pub const DEFAULT_TIMEOUT: u32 = 5;

/// Search order assigned to new records.
pub const DEFAULT_SEARCH_ORDER: u32 = 1;

/// Configuration for a single resolver.
///
/// List counts are the list lengths ([`n_nameservers`](Self::n_nameservers)
/// and friends), so a count can never disagree with its list.
///
/// # Example
///
/// ```
/// use dnsinfo::ResolverRecord;
/// use std::net::SocketAddr;
///
/// let ns: SocketAddr = "8.8.8.8:53".parse().unwrap();
/// let record = ResolverRecord::new()
///     .with_nameserver(ns)
///     .with_search_domain("corp.example")
///     .with_timeout(2);
///
/// assert_eq!(record.n_nameservers(), 1);
/// assert_eq!(record.port, 53);
/// assert_eq!(record.timeout, 2);
/// ```
#[derive(Debug, PartialEq, Eq)]
pub struct ResolverRecord {
    /// Domain this resolver is scoped to, if any.
    pub domain: Option<String>,

    /// Nameservers in preference order.
    pub nameservers: Vec<AddressRecord>,

    /// DNS port.
    pub port: u16,

    /// Search list. Individual entries may be absent.
    pub search_domains: Vec<Option<String>>,

    /// Destination address sort rules (`sortlist`).
    pub sort_rules: Vec<SortRule>,

    /// Resolver options string (e.g. `"ndots:2 rotate"`).
    pub options: Option<String>,

    /// Query timeout in seconds.
    pub timeout: u32,

    /// Search order. Lower values are tried first.
    pub search_order: u32,
}

impl ResolverRecord {
    /// Creates an empty record with port 53, a 5 second timeout and
    /// `search_order = 1`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            domain: None,
            nameservers: Vec::new(),
            port: DEFAULT_PORT,
            search_domains: Vec::new(),
            sort_rules: Vec::new(),
            options: None,
            timeout: DEFAULT_TIMEOUT,
            search_order: DEFAULT_SEARCH_ORDER,
        }
    }

    /// Scopes the resolver to `domain`.
    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Appends a nameserver.
    #[must_use]
    pub fn with_nameserver(mut self, nameserver: impl Into<AddressRecord>) -> Self {
        self.nameservers.push(nameserver.into());
        self
    }

    /// Overrides the DNS port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Appends a search domain.
    #[must_use]
    pub fn with_search_domain(mut self, domain: impl Into<String>) -> Self {
        self.search_domains.push(Some(domain.into()));
        self
    }

    /// Appends a destination sort rule.
    #[must_use]
    pub fn with_sort_rule(mut self, rule: SortRule) -> Self {
        self.sort_rules.push(rule);
        self
    }

    /// Sets the resolver options string.
    #[must_use]
    pub fn with_options(mut self, options: impl Into<String>) -> Self {
        self.options = Some(options.into());
        self
    }

    /// Overrides the query timeout, in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: u32) -> Self {
        self.timeout = timeout;
        self
    }

    /// Overrides the search order.
    #[must_use]
    pub const fn with_search_order(mut self, order: u32) -> Self {
        self.search_order = order;
        self
    }

    /// Number of nameservers.
    #[must_use]
    pub fn n_nameservers(&self) -> usize {
        self.nameservers.len()
    }

    /// Number of search list entries, absent ones included.
    #[must_use]
    pub fn n_search(&self) -> usize {
        self.search_domains.len()
    }

    /// Number of sort rules.
    #[must_use]
    pub fn n_sort_rules(&self) -> usize {
        self.sort_rules.len()
    }

    /// Query timeout as a [`Duration`].
    #[must_use]
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.timeout))
    }

    /// Orders `destinations` by the first sort rule each one matches.
    ///
    /// The sort is stable; addresses matching no rule keep their relative
    /// order after all matching ones.
    pub fn sort_destinations(&self, destinations: &mut [IpAddr]) {
        destinations.sort_by_key(|ip| {
            self.sort_rules
                .iter()
                .position(|rule| rule.matches(ip))
                .unwrap_or(usize::MAX)
        });
    }
}

impl Default for ResolverRecord {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time DNS configuration: resolvers in order.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DnsConfiguration {
    /// Resolvers in order; the first is the default resolver.
    pub resolvers: Vec<ResolverRecord>,
}

impl DnsConfiguration {
    /// Wraps an ordered list of resolvers.
    #[must_use]
    pub const fn new(resolvers: Vec<ResolverRecord>) -> Self {
        Self { resolvers }
    }

    /// Number of resolvers.
    #[must_use]
    pub fn n_resolvers(&self) -> usize {
        self.resolvers.len()
    }

    /// Returns `true` if the snapshot holds no resolvers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    /// The first resolver, if any.
    #[must_use]
    pub fn primary(&self) -> Option<&ResolverRecord> {
        self.resolvers.first()
    }
}
