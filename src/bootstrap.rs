//! One-time population of the store from raw nameserver values.
//!
//! The platform hands over up to `max_nameservers` raw strings
//! (`net.dns1`, `net.dns2`, ...). Each is parsed as IPv4, then IPv6; values
//! matching neither are dropped with a warning. The result is always exactly
//! one resolver record.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::address::AddressRecord;
use crate::config::{
    DEFAULT_PORT, DEFAULT_SEARCH_ORDER, DEFAULT_TIMEOUT, DnsConfiguration, ResolverRecord,
};
use crate::error::Result;
use crate::properties::PropertySource;
use crate::store;

/// Property key prefix; keys are numbered from 1.
pub const NAMESERVER_KEY_PREFIX: &str = "net.dns";

/// Nameserver slots read by default.
pub const MAX_NAMESERVERS: usize = 5;

/// Upper bound on `max_nameservers`; larger settings are clamped.
pub const NAMESERVER_SLOT_LIMIT: usize = 32;

/// Bootstrap settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapConfig {
    /// Prefix of the numbered nameserver keys.
    pub key_prefix: String,
    /// Highest key index read, and the most nameservers accepted.
    /// Clamped to [`NAMESERVER_SLOT_LIMIT`].
    pub max_nameservers: usize,
    /// Port for the resolver and each nameserver address.
    pub port: u16,
    /// Query timeout in seconds.
    pub timeout: u32,
    /// Search order of the bootstrapped resolver.
    pub search_order: u32,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            key_prefix: NAMESERVER_KEY_PREFIX.to_string(),
            max_nameservers: MAX_NAMESERVERS,
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT,
            search_order: DEFAULT_SEARCH_ORDER,
        }
    }
}

impl BootstrapConfig {
    /// Overrides the nameserver key prefix.
    #[must_use]
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Overrides the number of nameserver slots.
    #[must_use]
    pub const fn with_max_nameservers(mut self, max: usize) -> Self {
        self.max_nameservers = max;
        self
    }

    /// Overrides the resolver and nameserver port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
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

    /// Nameserver slots actually used: `max_nameservers`, clamped.
    #[must_use]
    pub const fn slots(&self) -> usize {
        if self.max_nameservers < NAMESERVER_SLOT_LIMIT {
            self.max_nameservers
        } else {
            NAMESERVER_SLOT_LIMIT
        }
    }

    /// Keys read from a property source, in order.
    #[must_use]
    pub fn nameserver_keys(&self) -> Vec<String> {
        (1..=self.slots())
            .map(|idx| format!("{}{idx}", self.key_prefix))
            .collect()
    }
}

/// Parses one raw nameserver value: IPv4 first, then IPv6.
///
/// Surrounding whitespace is ignored. Returns `None` for empty or
/// unparsable input.
#[must_use]
pub fn parse_nameserver(value: &str, port: u16) -> Option<AddressRecord> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(v4) = value.parse::<Ipv4Addr>() {
        return Some(AddressRecord::new(IpAddr::V4(v4), port));
    }
    if let Ok(v6) = value.parse::<Ipv6Addr>() {
        return Some(AddressRecord::new(IpAddr::V6(v6), port));
    }
    None
}

/// Builds the resolver record from raw values in order.
///
/// At most [`BootstrapConfig::slots`] addresses are kept.
#[must_use]
pub fn resolver_from_values<'a>(
    values: impl IntoIterator<Item = &'a str>,
    config: &BootstrapConfig,
) -> ResolverRecord {
    let mut resolver = ResolverRecord::new()
        .with_port(config.port)
        .with_timeout(config.timeout)
        .with_search_order(config.search_order);
    let slots = config.slots();
    resolver.nameservers.reserve_exact(slots);

    for value in values {
        if resolver.n_nameservers() == slots {
            tracing::warn!(max = slots, "Nameserver limit reached, ignoring the rest");
            break;
        }
        if value.trim().is_empty() {
            continue;
        }
        match parse_nameserver(value, config.port) {
            Some(ns) => {
                tracing::debug!(nameserver = %ns, "Accepted nameserver");
                resolver.nameservers.push(ns);
            }
            None => tracing::warn!(value = %value, "Failed to convert nameserver address, dropping"),
        }
    }
    resolver
}

/// Reads numbered nameserver keys from `source` into a one-resolver
/// snapshot.
#[must_use]
pub fn configuration_from_source<S>(source: &S, config: &BootstrapConfig) -> DnsConfiguration
where
    S: PropertySource + ?Sized,
{
    let keys = config.nameserver_keys();
    let values = keys.iter().filter_map(|key| source.property(key));
    DnsConfiguration::new(vec![resolver_from_values(values, config)])
}

/// Builds the snapshot from `source` and installs it as the process-wide
/// configuration.
///
/// # Errors
///
/// Returns [`DnsInfoError::AlreadyInitialized`](crate::DnsInfoError::AlreadyInitialized)
/// if the store was already populated.
pub fn bootstrap<S>(source: &S, config: &BootstrapConfig) -> Result<()>
where
    S: PropertySource + ?Sized,
{
    let configuration = configuration_from_source(source, config);
    if let Some(resolver) = configuration.primary() {
        tracing::info!(
            nameservers = resolver.n_nameservers(),
            port = resolver.port,
            "Bootstrapped DNS configuration"
        );
    }
    store::install(configuration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::AddressFamily;
    use crate::properties::Properties;

    #[test]
    fn ipv4_is_tried_before_ipv6() {
        let ns = parse_nameserver("8.8.8.8", 53).unwrap();
        assert_eq!(ns.family(), AddressFamily::Inet);

        let ns = parse_nameserver(" 2001:4860:4860::8888 ", 53).unwrap();
        assert_eq!(ns.family(), AddressFamily::Inet6);
        assert_eq!(ns.ip(), "2001:4860:4860::8888".parse::<IpAddr>().unwrap());

        // IPv4-mapped IPv6 text is still IPv6 text.
        let ns = parse_nameserver("::ffff:1.2.3.4", 53).unwrap();
        assert_eq!(ns.family(), AddressFamily::Inet6);
    }

    #[test]
    fn unparsable_values_are_dropped() {
        assert!(parse_nameserver("", 53).is_none());
        assert!(parse_nameserver("dns.google", 53).is_none());
        assert!(parse_nameserver("256.1.1.1", 53).is_none());

        let r = resolver_from_values(["1.1.1.1", "bogus", "", "9.9.9.9"], &BootstrapConfig::default());
        let ips: Vec<String> = r.nameservers.iter().map(|n| n.ip().to_string()).collect();
        assert_eq!(ips, ["1.1.1.1", "9.9.9.9"]);
    }

    #[test]
    fn nameserver_addresses_use_configured_port() {
        let config = BootstrapConfig::default().with_port(5353);
        let r = resolver_from_values(["127.0.0.1"], &config);
        assert_eq!(r.port, 5353);
        assert_eq!(r.nameservers[0].port(), 5353);
    }

    #[test]
    fn limit_caps_accepted_nameservers() {
        let config = BootstrapConfig::default().with_max_nameservers(2);
        let r = resolver_from_values(["bad", "10.0.0.1", "10.0.0.2", "10.0.0.3"], &config);
        assert_eq!(r.n_nameservers(), 2);
    }

    #[test]
    fn oversized_slot_count_is_clamped() {
        let config = BootstrapConfig::default().with_max_nameservers(usize::MAX);
        assert_eq!(config.slots(), NAMESERVER_SLOT_LIMIT);
        assert_eq!(config.nameserver_keys().len(), NAMESERVER_SLOT_LIMIT);

        let values: Vec<String> = (0..40).map(|i| format!("10.0.1.{i}")).collect();
        let r = resolver_from_values(values.iter().map(String::as_str), &config);
        assert_eq!(r.n_nameservers(), NAMESERVER_SLOT_LIMIT);

        let props: Properties = [("net.dns1", "8.8.8.8")].into_iter().collect();
        let snapshot = configuration_from_source(&props, &config);
        assert_eq!(snapshot.resolvers[0].n_nameservers(), 1);
    }

    #[test]
    fn keys_are_numbered_from_one() {
        let keys = BootstrapConfig::default().with_max_nameservers(3).nameserver_keys();
        assert_eq!(keys, ["net.dns1", "net.dns2", "net.dns3"]);

        let keys = BootstrapConfig::default()
            .with_key_prefix("dhcp.eth0.dns")
            .with_max_nameservers(1)
            .nameserver_keys();
        assert_eq!(keys, ["dhcp.eth0.dns1"]);
    }

    #[test]
    fn source_yields_one_full_resolver() {
        let props: Properties = [
            ("net.dns1", "8.8.8.8"),
            ("net.dns2", "2001:4860:4860::8888"),
            ("net.dns3", "not-an-address"),
        ]
        .into_iter()
        .collect();

        let config = configuration_from_source(&props, &BootstrapConfig::default());
        assert_eq!(config.n_resolvers(), 1);

        let r = config.primary().unwrap();
        assert_eq!(r.n_nameservers(), 2);
        assert_eq!(r.port, 53);
        assert_eq!(r.timeout, 5);
        assert_eq!(r.search_order, 1);
        assert_eq!(r.n_search(), 0);
        assert_eq!(r.domain, None);
    }

    // The resolver list must hold whole records, and the nameserver list
    // must have room for every slot.
    #[test]
    fn containers_are_sized_by_element_count() {
        let props: Properties = (1..=MAX_NAMESERVERS)
            .map(|i| (format!("net.dns{i}"), format!("10.0.0.{i}")))
            .collect();

        let config = configuration_from_source(&props, &BootstrapConfig::default());
        assert_eq!(config.resolvers.len(), 1);
        let r = &config.resolvers[0];
        assert_eq!(r.n_nameservers(), MAX_NAMESERVERS);
        assert!(r.nameservers.capacity() >= MAX_NAMESERVERS);
        for (i, ns) in r.nameservers.iter().enumerate() {
            assert_eq!(ns.ip().to_string(), format!("10.0.0.{}", i + 1));
        }
    }

    #[test]
    fn empty_source_yields_empty_resolver() {
        let config = configuration_from_source(&Properties::new(), &BootstrapConfig::default());
        assert_eq!(config.n_resolvers(), 1);
        assert_eq!(config.resolvers[0].n_nameservers(), 0);
    }
}
