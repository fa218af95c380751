//! Release engine.
//!
//! Releasing frees every owned allocation and leaves each reference at its
//! empty sentinel: `None` for optional strings, an unallocated `Vec` for
//! lists. Release never fails and is idempotent, so it serves both readers
//! done with a snapshot and the copy engine unwinding a partial one.

use crate::config::{DnsConfiguration, ResolverRecord};

/// Recursively frees owned structure in place.
pub trait Release {
    /// Frees everything `self` owns. Calling it again is a no-op.
    fn release(&mut self);
}

impl Release for ResolverRecord {
    fn release(&mut self) {
        self.domain = None;
        release_list(&mut self.nameservers);
        release_list(&mut self.search_domains);
        release_list(&mut self.sort_rules);
        self.options = None;
    }
}

impl Release for DnsConfiguration {
    fn release(&mut self) {
        for resolver in &mut self.resolvers {
            resolver.release();
        }
        release_list(&mut self.resolvers);
    }
}

impl<T: Release> Release for Option<T> {
    fn release(&mut self) {
        if let Some(mut value) = self.take() {
            value.release();
        }
    }
}

/// Drops every element and the backing storage.
fn release_list<T>(list: &mut Vec<T>) {
    if list.capacity() != 0 {
        *list = Vec::new();
    }
}

/// Releases a snapshot returned by a copy and leaves `None` behind.
///
/// Safe to call on `None` or on an already freed snapshot.
pub fn free_configuration(config: &mut Option<DnsConfiguration>) {
    if config.is_some() {
        tracing::trace!("Releasing DNS configuration snapshot");
    }
    config.release();
}
