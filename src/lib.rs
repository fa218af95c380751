//! # dnsinfo
//!
//! Consistent point-in-time snapshots of the host DNS resolver
//! configuration.
//!
//! A process-wide store holds the authoritative configuration (nameservers,
//! search domains, sort rules, timeouts). It is populated once at startup
//! and read-only afterwards. Readers receive deep copies that they own
//! outright: a copy is either complete or not returned at all, and no
//! storage is shared with the store or with other copies.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use dnsinfo::{BootstrapConfig, Properties};
//!
//! // Once, at startup.
//! let props = Properties::parse("[net.dns1]: [8.8.8.8]\n[net.dns2]: [2001:4860:4860::8888]\n");
//! dnsinfo::bootstrap(&props, &BootstrapConfig::default())?;
//!
//! // Any thread, any time.
//! let mut snapshot = Some(dnsinfo::copy_configuration()?);
//! if let Some(resolver) = snapshot.as_ref().and_then(|s| s.primary()) {
//!     for ns in &resolver.nameservers {
//!         println!("nameserver {ns}");
//!     }
//! }
//! dnsinfo::free_configuration(&mut snapshot);
//! # Ok::<(), dnsinfo::DnsInfoError>(())
//! ```
//!
//! ## Failure model
//!
//! Copies reserve memory fallibly. Running out of memory yields
//! [`DnsInfoError::Allocation`]; a corrupt nameserver record yields
//! [`DnsInfoError::Structural`]. Either way whatever was copied so far has
//! already been released and the store is untouched.
//!
//! ## Change notification
//!
//! [`configuration_notify_key`] returns a stable key an external pub/sub
//! mechanism can use. This crate does not deliver notifications.

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod address;
pub mod bootstrap;
pub mod config;
pub mod copy;
pub mod error;
pub mod properties;
pub mod release;
pub mod store;

#[cfg(test)]
mod testing;

pub use address::{AddressFamily, AddressRecord, SortRule};
pub use bootstrap::{BootstrapConfig, bootstrap};
pub use config::{DnsConfiguration, ResolverRecord};
pub use error::{DnsInfoError, Result};
pub use properties::{Properties, PropertySource};
pub use release::{Release, free_configuration};
pub use store::{
    ConfigurationStore, NOTIFY_KEY, configuration_notify_key, copy_configuration, install,
};
