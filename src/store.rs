//! Process-wide configuration store.
//!
//! The canonical snapshot is installed once and never mutated afterwards.
//! Readers get private deep copies; the lock is held only while copying.

use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use crate::config::DnsConfiguration;
use crate::copy::duplicate_configuration;
use crate::error::{DnsInfoError, Result};

/// Key an external change-notification mechanism can publish under.
pub const NOTIFY_KEY: &str = "dns.config.notify";

static GLOBAL: OnceLock<ConfigurationStore> = OnceLock::new();

/// Holds the authoritative snapshot and hands out independent copies.
///
/// # Example
///
/// ```
/// use dnsinfo::{ConfigurationStore, DnsConfiguration, ResolverRecord};
///
/// let store = ConfigurationStore::new(DnsConfiguration::new(vec![ResolverRecord::new()]));
/// let copy = store.copy().unwrap();
/// assert_eq!(copy.n_resolvers(), 1);
/// ```
#[derive(Debug)]
pub struct ConfigurationStore {
    canonical: Mutex<DnsConfiguration>,
}

impl ConfigurationStore {
    /// Wraps `canonical` as the authoritative snapshot.
    #[must_use]
    pub const fn new(canonical: DnsConfiguration) -> Self {
        Self {
            canonical: Mutex::new(canonical),
        }
    }

    /// Returns an independent deep copy of the canonical snapshot.
    ///
    /// On failure everything allocated for the copy has already been
    /// released and the store is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`DnsInfoError::Allocation`] or [`DnsInfoError::Structural`].
    pub fn copy(&self) -> Result<DnsConfiguration> {
        let result = duplicate_configuration(&self.lock());
        match &result {
            Ok(copy) => tracing::debug!(resolvers = copy.n_resolvers(), "Copied DNS configuration"),
            Err(e) => tracing::warn!(error = %e, "Failed to copy DNS configuration"),
        }
        result
    }

    /// Number of resolvers in the canonical snapshot.
    #[must_use]
    pub fn canonical_len(&self) -> usize {
        self.lock().n_resolvers()
    }

    // The canonical tree is never written after construction, so a reader
    // that panicked while holding the lock cannot have left it inconsistent.
    fn lock(&self) -> MutexGuard<'_, DnsConfiguration> {
        self.canonical.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Installs the process-wide snapshot.
///
/// # Errors
///
/// Returns [`DnsInfoError::AlreadyInitialized`] if a snapshot was already
/// installed; the existing one is kept.
pub fn install(config: DnsConfiguration) -> Result<()> {
    let resolvers = config.n_resolvers();
    GLOBAL
        .set(ConfigurationStore::new(config))
        .map_err(|_| DnsInfoError::AlreadyInitialized)?;
    tracing::info!(resolvers, "Installed DNS configuration");
    Ok(())
}

/// The process-wide store, once installed.
#[must_use]
pub fn global() -> Option<&'static ConfigurationStore> {
    GLOBAL.get()
}

/// Copies the process-wide snapshot.
///
/// Before [`install`] has run this returns an empty snapshot.
///
/// # Errors
///
/// Same as [`ConfigurationStore::copy`].
pub fn copy_configuration() -> Result<DnsConfiguration> {
    match GLOBAL.get() {
        Some(store) => store.copy(),
        None => {
            tracing::debug!("DNS configuration not installed yet, returning empty snapshot");
            Ok(DnsConfiguration::default())
        }
    }
}

/// Returns [`NOTIFY_KEY`].
#[must_use]
pub const fn configuration_notify_key() -> &'static str {
    NOTIFY_KEY
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::Arc;

    use super::*;
    use crate::config::ResolverRecord;
    use crate::release::free_configuration;

    fn store() -> ConfigurationStore {
        let ns: SocketAddr = "192.0.2.53:53".parse().unwrap();
        ConfigurationStore::new(DnsConfiguration::new(vec![
            ResolverRecord::new()
                .with_nameserver(ns)
                .with_search_domain("lan"),
        ]))
    }

    #[test]
    fn copies_are_independent() {
        let store = store();
        let mut first = store.copy().unwrap();
        let second = store.copy().unwrap();

        first.resolvers[0].port = 1;
        first.resolvers[0].search_domains[0] = Some("changed".into());
        first.resolvers[0].nameservers.clear();

        assert_eq!(second.resolvers[0].port, 53);
        assert_eq!(store.copy().unwrap(), second);
    }

    #[test]
    fn free_then_copy_round_trips() {
        let store = store();
        let before = store.copy().unwrap();
        let mut copy = Some(store.copy().unwrap());
        free_configuration(&mut copy);
        assert_eq!(store.copy().unwrap(), before);
    }

    #[test]
    fn concurrent_readers_see_whole_snapshots() {
        let store = Arc::new(store());
        let expected = store.copy().unwrap();

        std::thread::scope(|s| {
            for _ in 0..8 {
                let store = Arc::clone(&store);
                let expected = &expected;
                s.spawn(move || {
                    for _ in 0..100 {
                        assert_eq!(&store.copy().unwrap(), expected);
                    }
                });
            }
        });
        assert_eq!(store.canonical_len(), 1);
    }

    #[test]
    fn poisoned_lock_still_copies() {
        let store = Arc::new(store());
        let poisoner = Arc::clone(&store);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.canonical.lock().unwrap();
            panic!("poison the store lock");
        })
        .join();

        assert!(store.canonical.is_poisoned());
        assert_eq!(store.copy().unwrap().n_resolvers(), 1);
    }

    #[test]
    fn notify_key_is_stable() {
        assert_eq!(configuration_notify_key(), "dns.config.notify");
        assert_eq!(configuration_notify_key(), NOTIFY_KEY);
    }
}
