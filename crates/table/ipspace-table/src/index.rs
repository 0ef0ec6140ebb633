//! Range index - maps address ranges to values with point lookup.

use crate::range::AddrRange;
use ip_network::IpNetwork;
use ip_network_table::IpNetworkTable;
use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use tracing::trace;

const IPV4_FAMILY: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
const IPV6_FAMILY: IpAddr = IpAddr::V6(Ipv6Addr::UNSPECIFIED);

/// Container mapping address ranges to values.
///
/// The most recent `mark` controls every address it covers.
pub trait RangeIndex<V> {
    /// Associates every address in `range` with `value`.
    fn mark(&mut self, range: &AddrRange, value: V);

    /// Returns the value for `addr`, or None if no range covers it.
    fn find(&self, addr: IpAddr) -> Option<&V>;

    /// Returns the number of distinct ranges stored.
    fn count(&self) -> usize;
}

/// A stored range and the value it maps to.
#[derive(Debug, Clone)]
struct Interval<V> {
    last: u128,
    value: V,
}

/// O(log n) range index over a CIDR trie.
///
/// Stored ranges are kept disjoint in a per-family interval map keyed by
/// first address. Marking splits or drops whatever the new range overlaps,
/// so the latest mark controls every address it covers. The trie holds the
/// CIDR decomposition of each stored range and answers point lookups.
pub struct NetworkIndex<V> {
    table: IpNetworkTable<V>,
    ipv4: BTreeMap<u128, Interval<V>>,
    ipv6: BTreeMap<u128, Interval<V>>,
    networks: usize,
}

impl<V> std::fmt::Debug for NetworkIndex<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkIndex")
            .field("ipv4_count", &self.ipv4.len())
            .field("ipv6_count", &self.ipv6.len())
            .field("networks", &self.networks)
            .finish_non_exhaustive()
    }
}

impl<V> Default for NetworkIndex<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> NetworkIndex<V> {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self {
            table: IpNetworkTable::new(),
            ipv4: BTreeMap::new(),
            ipv6: BTreeMap::new(),
            networks: 0,
        }
    }

    /// Returns the number of IPv4 ranges stored.
    pub fn ipv4_count(&self) -> usize {
        self.ipv4.len()
    }

    /// Returns the number of IPv6 ranges stored.
    pub fn ipv6_count(&self) -> usize {
        self.ipv6.len()
    }

    /// Returns the number of CIDR networks in the lookup trie.
    pub fn network_count(&self) -> usize {
        self.networks
    }

    /// Returns the stored network that answers lookups for `addr`.
    pub fn network_for(&self, addr: IpAddr) -> Option<IpNetwork> {
        self.table.longest_match(addr).map(|(network, _)| network)
    }

    /// Stored ranges in address order, IPv4 first.
    pub fn ranges(&self) -> impl Iterator<Item = (AddrRange, &V)> + '_ {
        let v4 = self
            .ipv4
            .iter()
            .map(|(first, i)| (AddrRange::from_bits(IPV4_FAMILY, *first, i.last), &i.value));
        let v6 = self
            .ipv6
            .iter()
            .map(|(first, i)| (AddrRange::from_bits(IPV6_FAMILY, *first, i.last), &i.value));
        v4.chain(v6)
    }
}

impl<V: Clone> NetworkIndex<V> {
    fn intervals_mut(&mut self, family: IpAddr) -> &mut BTreeMap<u128, Interval<V>> {
        match family {
            IpAddr::V4(_) => &mut self.ipv4,
            IpAddr::V6(_) => &mut self.ipv6,
        }
    }

    /// Takes every stored range overlapping `[first, last]` out of the
    /// interval map.
    fn take_overlapping(
        &mut self,
        family: IpAddr,
        first: u128,
        last: u128,
    ) -> Vec<(u128, Interval<V>)> {
        let intervals = self.intervals_mut(family);

        // Ranges are disjoint, so only the closest range starting before
        // `first` can reach into the new one.
        let mut starts: Vec<u128> = intervals
            .range(..first)
            .next_back()
            .filter(|(_, i)| i.last >= first)
            .map(|(start, _)| *start)
            .into_iter()
            .collect();
        starts.extend(intervals.range(first..=last).map(|(start, _)| *start));

        starts
            .into_iter()
            .filter_map(|start| intervals.remove(&start).map(|i| (start, i)))
            .collect()
    }

    fn store(&mut self, range: AddrRange, value: V) {
        for network in range.networks() {
            if self.table.insert(network, value.clone()).is_none() {
                self.networks += 1;
            }
        }
        let (first, last) = range.bounds();
        self.intervals_mut(range.first())
            .insert(first, Interval { last, value });
    }

    fn unstore(&mut self, range: AddrRange) {
        for network in range.networks() {
            if self.table.remove(network).is_some() {
                self.networks -= 1;
            }
        }
    }
}

impl<V: Clone> RangeIndex<V> for NetworkIndex<V> {
    fn mark(&mut self, range: &AddrRange, value: V) {
        let family = range.first();
        let (first, last) = range.bounds();

        for (start, old) in self.take_overlapping(family, first, last) {
            let stored = AddrRange::from_bits(family, start, old.last);
            trace!(stored = %stored, range = %range, "Splitting shadowed range");
            self.unstore(stored);

            if start < first {
                self.store(
                    AddrRange::from_bits(family, start, first - 1),
                    old.value.clone(),
                );
            }
            if old.last > last {
                self.store(AddrRange::from_bits(family, last + 1, old.last), old.value);
            }
        }

        self.store(*range, value);
    }

    fn find(&self, addr: IpAddr) -> Option<&V> {
        self.table.longest_match(addr).map(|(_, value)| value)
    }

    fn count(&self) -> usize {
        self.ipv4.len() + self.ipv6.len()
    }
}
