//! Address ranges parsed from text and decomposed into CIDR networks.

use ip_network::{IpNetwork, Ipv4Network, Ipv6Network};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// Inclusive range of addresses within a single family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddrRange {
    first: IpAddr,
    last: IpAddr,
}

impl AddrRange {
    /// Creates a range from its endpoints.
    ///
    /// Returns an error if the endpoints are of different families or out of order.
    pub fn new(first: IpAddr, last: IpAddr) -> Result<Self, String> {
        match (first, last) {
            (IpAddr::V4(_), IpAddr::V4(_)) | (IpAddr::V6(_), IpAddr::V6(_)) => {}
            _ => return Err(format!("Mixed address families: {first}-{last}")),
        }
        if bits(first) > bits(last) {
            return Err(format!("Range start is after range end: {first}-{last}"));
        }
        Ok(Self { first, last })
    }

    /// Range covering a single address.
    pub fn single(addr: IpAddr) -> Self {
        Self {
            first: addr,
            last: addr,
        }
    }

    /// Range covering all addresses of `network`.
    pub fn from_network(network: IpNetwork) -> Self {
        let (first, last) = network_bounds(network);
        Self { first, last }
    }

    /// Parses a range, returning None for empty or malformed text.
    ///
    /// Supports:
    /// - Single addresses: "10.1.1.56", "2001:db8::1"
    /// - CIDR notation: "10.1.1.0/24", "2001:db8::/32"
    /// - Explicit ranges: "10.1.1.10-10.1.1.20"
    pub fn from_text(text: &str) -> Option<Self> {
        text.parse().ok()
    }

    /// First address in the range.
    pub fn first(&self) -> IpAddr {
        self.first
    }

    /// Last address in the range.
    pub fn last(&self) -> IpAddr {
        self.last
    }

    /// Range of `family` between two numeric addresses.
    pub(crate) fn from_bits(family: IpAddr, first: u128, last: u128) -> Self {
        Self {
            first: addr_from_bits(family, first),
            last: addr_from_bits(family, last),
        }
    }

    /// Numeric bounds of the range.
    pub(crate) fn bounds(&self) -> (u128, u128) {
        (bits(self.first), bits(self.last))
    }

    /// Returns true if `addr` lies in the range.
    pub fn contains(&self, addr: IpAddr) -> bool {
        same_family(self.first, addr)
            && bits(self.first) <= bits(addr)
            && bits(addr) <= bits(self.last)
    }

    /// Returns true if every address of `other` lies in this range.
    pub fn covers(&self, other: &AddrRange) -> bool {
        self.contains(other.first) && self.contains(other.last)
    }

    /// Decomposes the range into the minimal list of CIDR networks.
    pub fn networks(&self) -> Vec<IpNetwork> {
        let width = family_width(self.first);
        let last = bits(self.last);
        let mut start = bits(self.first);
        let mut networks = Vec::new();

        loop {
            let align = start.trailing_zeros().min(width);
            let remaining = last - start;
            let fit = if remaining == u128::MAX {
                128
            } else {
                127 - (remaining + 1).leading_zeros()
            };
            let host_bits = align.min(fit);
            networks.push(make_network(self.first, start, (width - host_bits) as u8));

            let block_end = start + low_mask(host_bits);
            if block_end >= last {
                break;
            }
            start = block_end + 1;
        }

        networks
    }
}

impl FromStr for AddrRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("Empty range".to_string());
        }

        if let Some((lo, hi)) = s.split_once('-') {
            let first = parse_addr(lo.trim())?;
            let last = parse_addr(hi.trim())?;
            return Self::new(first, last);
        }

        if let Some((addr, prefix)) = s.split_once('/') {
            return parse_cidr(addr.trim(), prefix.trim());
        }

        parse_addr(s).map(Self::single)
    }
}

impl fmt::Display for AddrRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.first == self.last {
            write!(f, "{}", self.first)
        } else {
            write!(f, "{}-{}", self.first, self.last)
        }
    }
}

/// Host bits below the prefix are cleared, so `10.1.1.5/24` is `10.1.1.0/24`.
fn parse_cidr(addr: &str, prefix: &str) -> Result<AddrRange, String> {
    let base = parse_addr(addr)?;
    let width = family_width(base);
    let prefix = prefix
        .parse::<u32>()
        .ok()
        .filter(|p| *p <= width)
        .ok_or_else(|| format!("Invalid prefix length '/{prefix}' for {base}"))?;

    let host = low_mask(width - prefix);
    let first = bits(base) & !host;
    Ok(AddrRange::from_bits(base, first, first | host))
}

fn parse_addr(text: &str) -> Result<IpAddr, String> {
    text.parse::<IpAddr>()
        .map_err(|_| format!("Invalid IP address '{text}'"))
}

fn same_family(a: IpAddr, b: IpAddr) -> bool {
    a.is_ipv4() == b.is_ipv4()
}

fn family_width(addr: IpAddr) -> u32 {
    match addr {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    }
}

pub(crate) fn bits(addr: IpAddr) -> u128 {
    match addr {
        IpAddr::V4(v4) => u32::from(v4) as u128,
        IpAddr::V6(v6) => u128::from(v6),
    }
}

fn addr_from_bits(family: IpAddr, value: u128) -> IpAddr {
    match family {
        IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::from(value as u32)),
        IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::from(value)),
    }
}

fn low_mask(host_bits: u32) -> u128 {
    if host_bits >= 128 {
        u128::MAX
    } else {
        (1u128 << host_bits) - 1
    }
}

/// Inclusive address bounds of a network.
pub(crate) fn network_bounds(network: IpNetwork) -> (IpAddr, IpAddr) {
    match network {
        IpNetwork::V4(net) => {
            let base = u32::from(net.network_address());
            let last = base | (low_mask(32 - net.netmask() as u32) as u32);
            (IpAddr::V4(base.into()), IpAddr::V4(Ipv4Addr::from(last)))
        }
        IpNetwork::V6(net) => {
            let base = u128::from(net.network_address());
            let last = base | low_mask(128 - net.netmask() as u32);
            (IpAddr::V6(base.into()), IpAddr::V6(Ipv6Addr::from(last)))
        }
    }
}

fn make_network(family: IpAddr, start: u128, netmask: u8) -> IpNetwork {
    // start is aligned to netmask by construction.
    match family {
        IpAddr::V4(_) => match Ipv4Network::new(Ipv4Addr::from(start as u32), netmask) {
            Ok(network) => IpNetwork::V4(network),
            Err(e) => unreachable!("unaligned IPv4 block /{netmask}: {e:?}"),
        },
        IpAddr::V6(_) => match Ipv6Network::new(Ipv6Addr::from(start), netmask) {
            Ok(network) => IpNetwork::V6(network),
            Err(e) => unreachable!("unaligned IPv6 block /{netmask}: {e:?}"),
        },
    }
}
