//! Deep-copy engine.
//!
//! Every allocation goes through `try_reserve_exact`, sized by element
//! count. Partial results live inside a [`Rollback`] guard; an early return
//! drops the guard, which releases whatever was copied so far. A caller
//! either gets a complete, independent tree or an error.

use std::mem;

use crate::config::{DnsConfiguration, ResolverRecord};
use crate::error::Result;
use crate::release::Release;

/// Owns a partially built copy until it is committed.
struct Rollback<T: Release + Default> {
    partial: T,
    committed: bool,
}

impl<T: Release + Default> Rollback<T> {
    fn new(partial: T) -> Self {
        Self {
            partial,
            committed: false,
        }
    }

    fn commit(mut self) -> T {
        self.committed = true;
        mem::take(&mut self.partial)
    }
}

impl<T: Release + Default> Drop for Rollback<T> {
    fn drop(&mut self) {
        if !self.committed {
            self.partial.release();
        }
    }
}

/// Duplicates a snapshot and everything it owns.
///
/// # Errors
///
/// [`DnsInfoError::Allocation`](crate::DnsInfoError::Allocation) if memory
/// runs out, [`DnsInfoError::Structural`](crate::DnsInfoError::Structural)
/// if a nameserver record is corrupt. Nothing is leaked in either case.
pub fn duplicate_configuration(source: &DnsConfiguration) -> Result<DnsConfiguration> {
    let mut copy = Rollback::new(DnsConfiguration::default());
    copy.partial.resolvers.try_reserve_exact(source.resolvers.len())?;
    for resolver in &source.resolvers {
        let resolver = duplicate_resolver(resolver)?;
        copy.partial.resolvers.push(resolver);
    }
    Ok(copy.commit())
}

/// Duplicates one resolver record.
///
/// Fields are copied in declaration order.
///
/// # Errors
///
/// Same as [`duplicate_configuration`].
pub fn duplicate_resolver(source: &ResolverRecord) -> Result<ResolverRecord> {
    let mut copy = Rollback::new(ResolverRecord::default());
    let record = &mut copy.partial;

    record.domain = duplicate_optional(source.domain.as_deref())?;

    record.nameservers.try_reserve_exact(source.nameservers.len())?;
    for nameserver in &source.nameservers {
        record.nameservers.push(nameserver.duplicate()?);
    }

    record.port = source.port;

    record.search_domains.try_reserve_exact(source.search_domains.len())?;
    for domain in &source.search_domains {
        let domain = duplicate_optional(domain.as_deref())?;
        record.search_domains.push(domain);
    }

    record.sort_rules.try_reserve_exact(source.sort_rules.len())?;
    record.sort_rules.extend(source.sort_rules.iter().copied());

    record.options = duplicate_optional(source.options.as_deref())?;
    record.timeout = source.timeout;
    record.search_order = source.search_order;

    Ok(copy.commit())
}

/// Byte-for-byte string copy into exactly sized storage.
fn duplicate_string(source: &str) -> Result<String> {
    let mut copy = String::new();
    copy.try_reserve_exact(source.len())?;
    copy.push_str(source);
    Ok(copy)
}

/// Absent stays absent.
fn duplicate_optional(source: Option<&str>) -> Result<Option<String>> {
    source.map(duplicate_string).transpose()
}
