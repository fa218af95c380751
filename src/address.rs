//! Nameserver address records and sort rules.
//!
//! An [`AddressRecord`] owns the platform socket address image
//! (`sockaddr_in` or `sockaddr_in6`) of one nameserver. The family tag and
//! the payload size live in the same enum variant, so the two cannot drift
//! apart through the public API.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6};
use std::ptr;

use crate::error::{DnsInfoError, Result};

const SOCKADDR_LEN: usize = size_of::<libc::sockaddr>();
const SOCKADDR_IN_LEN: usize = size_of::<libc::sockaddr_in>();
const SOCKADDR_IN6_LEN: usize = size_of::<libc::sockaddr_in6>();

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
const AF_INET: libc::sa_family_t = libc::AF_INET as libc::sa_family_t;
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
const AF_INET6: libc::sa_family_t = libc::AF_INET6 as libc::sa_family_t;
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
const AF_UNSPEC: libc::sa_family_t = libc::AF_UNSPEC as libc::sa_family_t;

/// Address family of a nameserver or sort rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    /// IPv4 (`AF_INET`).
    Inet,
    /// IPv6 (`AF_INET6`).
    Inet6,
}

impl AddressFamily {
    /// Returns the platform `sa_family` value.
    #[must_use]
    pub const fn raw(self) -> libc::sa_family_t {
        match self {
            Self::Inet => AF_INET,
            Self::Inet6 => AF_INET6,
        }
    }

    /// Size in bytes of the socket address image for this family.
    #[must_use]
    pub const fn payload_len(self) -> usize {
        match self {
            Self::Inet => SOCKADDR_IN_LEN,
            Self::Inet6 => SOCKADDR_IN6_LEN,
        }
    }

    /// Maps a raw `sa_family` value onto a supported family.
    ///
    /// # Errors
    ///
    /// Returns [`DnsInfoError::Structural`] for anything other than
    /// `AF_INET` or `AF_INET6`.
    pub fn from_raw(family: libc::sa_family_t) -> Result<Self> {
        match family {
            AF_INET => Ok(Self::Inet),
            AF_INET6 => Ok(Self::Inet6),
            other => Err(structural(other)),
        }
    }

    /// Family of an IP address.
    #[must_use]
    pub const fn of(ip: &IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => Self::Inet,
            IpAddr::V6(_) => Self::Inet6,
        }
    }
}

/// A nameserver socket address, tagged by family.
///
/// # Example
///
/// ```
/// use dnsinfo::{AddressFamily, AddressRecord};
/// use std::net::SocketAddr;
///
/// let addr: SocketAddr = "8.8.8.8:53".parse().unwrap();
/// let record = AddressRecord::from(addr);
///
/// assert_eq!(record.family(), AddressFamily::Inet);
/// assert_eq!(record.socket_addr(), addr);
/// ```
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct AddressRecord(Payload);

#[derive(Debug, PartialEq, Eq, Hash)]
enum Payload {
    Inet([u8; SOCKADDR_IN_LEN]),
    Inet6([u8; SOCKADDR_IN6_LEN]),
}

impl AddressRecord {
    /// Creates a record for `ip` on `port`.
    #[must_use]
    pub fn new(ip: IpAddr, port: u16) -> Self {
        Self::from(SocketAddr::new(ip, port))
    }

    /// Detects the family of a raw socket address image and copies exactly
    /// the bytes that family occupies.
    ///
    /// `bytes` may be longer than the payload (e.g. a `sockaddr_storage`);
    /// the remainder is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`DnsInfoError::Structural`] if the embedded family is not
    /// `AF_INET`/`AF_INET6`, or if `bytes` is too short for it.
    pub fn from_raw(bytes: &[u8]) -> Result<Self> {
        let raw = embedded_family(bytes).ok_or_else(|| structural(AF_UNSPEC))?;
        let payload = match AddressFamily::from_raw(raw)? {
            AddressFamily::Inet => Payload::Inet(take_payload(bytes, raw)?),
            AddressFamily::Inet6 => Payload::Inet6(take_payload(bytes, raw)?),
        };
        Ok(Self(payload))
    }

    /// Family carried by the record's tag.
    #[must_use]
    pub const fn family(&self) -> AddressFamily {
        match self.0 {
            Payload::Inet(_) => AddressFamily::Inet,
            Payload::Inet6(_) => AddressFamily::Inet6,
        }
    }

    /// The raw socket address image.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8] {
        match &self.0 {
            Payload::Inet(bytes) => bytes.as_slice(),
            Payload::Inet6(bytes) => bytes.as_slice(),
        }
    }

    /// Payload length in bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.family().payload_len()
    }

    /// Always `false`; present for API symmetry with [`len`](Self::len).
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Payload length as a `socklen_t`, for passing [`as_bytes`](Self::as_bytes)
    /// to socket calls.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn socklen(&self) -> libc::socklen_t {
        self.len() as libc::socklen_t
    }

    /// Decodes the payload back into a standard socket address.
    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        match &self.0 {
            Payload::Inet(bytes) => {
                let sin: libc::sockaddr_in = read_struct(bytes);
                SocketAddr::V4(SocketAddrV4::new(
                    Ipv4Addr::from(sin.sin_addr.s_addr.to_ne_bytes()),
                    u16::from_be(sin.sin_port),
                ))
            }
            Payload::Inet6(bytes) => {
                let sin6: libc::sockaddr_in6 = read_struct(bytes);
                SocketAddr::V6(SocketAddrV6::new(
                    Ipv6Addr::from(sin6.sin6_addr.s6_addr),
                    u16::from_be(sin6.sin6_port),
                    sin6.sin6_flowinfo,
                    sin6.sin6_scope_id,
                ))
            }
        }
    }

    /// Nameserver IP address.
    #[must_use]
    pub fn ip(&self) -> IpAddr {
        self.socket_addr().ip()
    }

    /// Nameserver port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.socket_addr().port()
    }

    /// Copies the record after re-reading its embedded family tag.
    ///
    /// A record whose embedded family is unknown, or disagrees with the
    /// variant it is stored in, is corrupt.
    pub(crate) fn duplicate(&self) -> Result<Self> {
        let copy = Self::from_raw(self.as_bytes())?;
        if copy.family() == self.family() {
            Ok(copy)
        } else {
            Err(structural(copy.family().raw()))
        }
    }
}

impl From<SocketAddrV4> for AddressRecord {
    fn from(addr: SocketAddrV4) -> Self {
        // SAFETY: `sockaddr_in` is plain old data; all-zero is a valid value.
        let mut sin: libc::sockaddr_in = unsafe { std::mem::zeroed() };
        stamp_len_v4(&mut sin);
        sin.sin_family = AF_INET;
        sin.sin_port = addr.port().to_be();
        sin.sin_addr = libc::in_addr {
            s_addr: u32::from_ne_bytes(addr.ip().octets()),
        };
        Self(Payload::Inet(to_bytes(&sin)))
    }
}

impl From<SocketAddrV6> for AddressRecord {
    fn from(addr: SocketAddrV6) -> Self {
        // SAFETY: `sockaddr_in6` is plain old data; all-zero is a valid value.
        let mut sin6: libc::sockaddr_in6 = unsafe { std::mem::zeroed() };
        stamp_len_v6(&mut sin6);
        sin6.sin6_family = AF_INET6;
        sin6.sin6_port = addr.port().to_be();
        sin6.sin6_flowinfo = addr.flowinfo();
        sin6.sin6_addr = libc::in6_addr {
            s6_addr: addr.ip().octets(),
        };
        sin6.sin6_scope_id = addr.scope_id();
        Self(Payload::Inet6(to_bytes(&sin6)))
    }
}

impl From<SocketAddr> for AddressRecord {
    fn from(addr: SocketAddr) -> Self {
        match addr {
            SocketAddr::V4(v4) => Self::from(v4),
            SocketAddr::V6(v6) => Self::from(v6),
        }
    }
}

impl fmt::Display for AddressRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.socket_addr(), f)
    }
}

/// Destination-address ordering preference: an address and a mask of the
/// same family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortRule {
    address: IpAddr,
    mask: IpAddr,
}

impl SortRule {
    /// Creates a rule from an address and a mask.
    ///
    /// # Errors
    ///
    /// Returns [`DnsInfoError::InvalidConfig`] if the two differ in family.
    pub fn new(address: IpAddr, mask: IpAddr) -> Result<Self> {
        if AddressFamily::of(&address) != AddressFamily::of(&mask) {
            return Err(DnsInfoError::InvalidConfig(format!(
                "sort rule mixes address families: {address}/{mask}"
            )));
        }
        Ok(Self { address, mask })
    }

    /// IPv4 rule.
    #[must_use]
    pub const fn v4(address: Ipv4Addr, mask: Ipv4Addr) -> Self {
        Self {
            address: IpAddr::V4(address),
            mask: IpAddr::V4(mask),
        }
    }

    /// IPv6 rule.
    #[must_use]
    pub const fn v6(address: Ipv6Addr, mask: Ipv6Addr) -> Self {
        Self {
            address: IpAddr::V6(address),
            mask: IpAddr::V6(mask),
        }
    }

    /// Network address.
    #[must_use]
    pub const fn address(&self) -> IpAddr {
        self.address
    }

    /// Network mask.
    #[must_use]
    pub const fn mask(&self) -> IpAddr {
        self.mask
    }

    /// Family shared by the address and the mask.
    #[must_use]
    pub const fn family(&self) -> AddressFamily {
        AddressFamily::of(&self.address)
    }

    /// Returns `true` if `ip` falls inside the masked network.
    #[must_use]
    pub fn matches(&self, ip: &IpAddr) -> bool {
        match (self.address, self.mask, ip) {
            (IpAddr::V4(net), IpAddr::V4(mask), IpAddr::V4(ip)) => {
                net.to_bits() & mask.to_bits() == ip.to_bits() & mask.to_bits()
            }
            (IpAddr::V6(net), IpAddr::V6(mask), IpAddr::V6(ip)) => {
                net.to_bits() & mask.to_bits() == ip.to_bits() & mask.to_bits()
            }
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Raw image helpers
// ---------------------------------------------------------------------------

fn structural(family: libc::sa_family_t) -> DnsInfoError {
    DnsInfoError::Structural {
        family: u16::from(family),
    }
}

/// Reads `sa_family` from the `sockaddr` header at the start of `bytes`.
fn embedded_family(bytes: &[u8]) -> Option<libc::sa_family_t> {
    if bytes.len() < SOCKADDR_LEN {
        return None;
    }
    // SAFETY: the buffer holds at least one `sockaddr` header and
    // `read_unaligned` has no alignment requirement.
    let header: libc::sockaddr = unsafe { ptr::read_unaligned(bytes.as_ptr().cast()) };
    Some(header.sa_family)
}

fn take_payload<const N: usize>(bytes: &[u8], family: libc::sa_family_t) -> Result<[u8; N]> {
    bytes
        .get(..N)
        .and_then(|head| head.try_into().ok())
        .ok_or_else(|| structural(family))
}

fn read_struct<T: Copy, const N: usize>(bytes: &[u8; N]) -> T {
    debug_assert!(size_of::<T>() <= N);
    // SAFETY: every caller pairs `T` with an array of exactly its size, and
    // `read_unaligned` has no alignment requirement.
    unsafe { ptr::read_unaligned(bytes.as_ptr().cast()) }
}

fn to_bytes<T: Copy, const N: usize>(value: &T) -> [u8; N] {
    debug_assert_eq!(size_of::<T>(), N);
    let mut out = [0u8; N];
    // SAFETY: `T` is a padding-free C socket address struct of `N` bytes.
    unsafe { ptr::copy_nonoverlapping(ptr::from_ref(value).cast::<u8>(), out.as_mut_ptr(), N) };
    out
}

#[cfg(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "dragonfly"
))]
#[allow(clippy::cast_possible_truncation)]
fn stamp_len_v4(sin: &mut libc::sockaddr_in) {
    sin.sin_len = SOCKADDR_IN_LEN as u8;
}

#[cfg(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "dragonfly"
))]
#[allow(clippy::cast_possible_truncation)]
fn stamp_len_v6(sin6: &mut libc::sockaddr_in6) {
    sin6.sin6_len = SOCKADDR_IN6_LEN as u8;
}

#[cfg(not(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "dragonfly"
)))]
fn stamp_len_v4(_sin: &mut libc::sockaddr_in) {}

#[cfg(not(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "dragonfly"
)))]
fn stamp_len_v6(_sin6: &mut libc::sockaddr_in6) {}

#[cfg(test)]
impl AddressRecord {
    /// An IPv4-shaped record whose embedded `sa_family` is `family`.
    pub(crate) fn corrupted(family: libc::sa_family_t) -> Self {
        let mut record = Self::from(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 53));
        if let Payload::Inet(bytes) = &mut record.0 {
            let mut header: libc::sockaddr = read_struct(&*bytes);
            header.sa_family = family;
            bytes[..SOCKADDR_LEN].copy_from_slice(&to_bytes::<_, SOCKADDR_LEN>(&header));
        }
        record
    }
}
