use std::collections::BTreeMap;
use std::fmt;
use std::net::Ipv4Addr;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::extend::addr::{ipv4_to_u32, parse_ipv4, u32_to_ipv4};
use crate::range::parse_spec;

struct RangeEntry<V> {
    end: u32,
    value: V,
}

/// A set of disjoint, inclusive IPv4 ranges keyed by their start address.
///
/// Overlapping or adjacent ranges are coalesced on insert, so every address
/// is covered by at most one entry. Clones share the same table.
pub struct IpRangeTable<V> {
    inner: Arc<RwLock<BTreeMap<u32, RangeEntry<V>>>>,
}

impl<V> Clone for IpRangeTable<V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<V> Default for IpRangeTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> IpRangeTable<V> {
    pub fn new() -> IpRangeTable<V> {
        Self {
            inner: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }
    /// Insert `[start, end]` tagged with `value`.
    ///
    /// Returns `false` only when `start > end`. A range already covered by an
    /// existing entry is a no-op and keeps that entry's value. Otherwise every
    /// entry overlapping or touching the range is absorbed, and the merged
    /// range carries `value`.
    pub fn insert(&self, start: u32, end: u32, value: V) -> bool {
        if start > end {
            return false;
        }
        let mut table = self.inner.write();
        if let Some((_, entry)) = table.range(..=start).next_back() {
            if entry.end >= end {
                return true;
            }
        }
        let (mut start, mut end) = (start, end);
        // The highest entry starting at or before end+1 is the only candidate
        // that can touch [start, end]; lower entries end before its start.
        loop {
            let Some((cur_start, cur_end)) = table
                .range(..=end.saturating_add(1))
                .next_back()
                .map(|(k, v)| (*k, v.end))
            else {
                break;
            };
            if cur_end.saturating_add(1) < start {
                break;
            }
            table.remove(&cur_start);
            start = start.min(cur_start);
            end = end.max(cur_end);
        }
        table.insert(start, RangeEntry { end, value });
        true
    }
    pub fn insert_addr(&self, start: Ipv4Addr, end: Ipv4Addr, value: V) -> bool {
        self.insert(ipv4_to_u32(start), ipv4_to_u32(end), value)
    }
    /// Remove the entry whose start is exactly `start`.
    ///
    /// `end` is not consulted and partially covered entries are never split,
    /// so callers must pass the bounds of a stored range.
    pub fn remove(&self, start: u32, _end: u32) -> Option<V> {
        self.inner.write().remove(&start).map(|entry| entry.value)
    }
    pub fn remove_addr(&self, start: Ipv4Addr, end: Ipv4Addr) -> Option<V> {
        self.remove(ipv4_to_u32(start), ipv4_to_u32(end))
    }
    pub fn contains(&self, addr: u32) -> bool {
        self.range_of(addr).is_some()
    }
    /// Unparseable input is treated as not contained.
    pub fn contains_str(&self, addr: &str) -> bool {
        match parse_ipv4(addr) {
            Ok(addr) => self.contains(addr),
            Err(_) => false,
        }
    }
    /// Bounds of the entry covering `addr`.
    pub fn range_of(&self, addr: u32) -> Option<(u32, u32)> {
        let table = self.inner.read();
        match table.range(..=addr).next_back() {
            Some((&start, entry)) if addr <= entry.end => Some((start, entry.end)),
            _ => None,
        }
    }
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
    pub fn clear(&self) {
        self.inner.write().clear()
    }
    /// Snapshot of all stored ranges in ascending order.
    pub fn ranges(&self) -> Vec<(u32, u32)> {
        self.inner
            .read()
            .iter()
            .map(|(start, entry)| (*start, entry.end))
            .collect()
    }
}

impl<V: Clone> IpRangeTable<V> {
    pub fn lookup(&self, addr: u32) -> Option<V> {
        let table = self.inner.read();
        match table.range(..=addr).next_back() {
            Some((_, entry)) if addr <= entry.end => Some(entry.value.clone()),
            _ => None,
        }
    }
    pub fn lookup_addr(&self, addr: Ipv4Addr) -> Option<V> {
        self.lookup(ipv4_to_u32(addr))
    }
    /// Build a table from a comma-separated access list, tagging every range
    /// with `value`.
    pub fn from_spec_with(spec: &str, value: V) -> IpRangeTable<V> {
        let table = IpRangeTable::new();
        table.extend_from_spec(spec, value);
        table
    }
    /// Insert every valid token of `spec`, returning how many were accepted.
    /// Invalid tokens are logged and skipped.
    pub fn extend_from_spec(&self, spec: &str, value: V) -> usize {
        let mut count = 0;
        for (token, rs) in parse_spec(spec) {
            match rs {
                Ok((start, end)) => {
                    if self.insert(start, end, value.clone()) {
                        count += 1;
                    } else {
                        log::warn!("skip access list entry {token:?}: inverted range");
                    }
                }
                Err(e) => {
                    log::warn!("skip access list entry {token:?}: {e}");
                }
            }
        }
        count
    }
}

impl IpRangeTable<()> {
    pub fn from_spec(spec: &str) -> IpRangeTable<()> {
        IpRangeTable::from_spec_with(spec, ())
    }
}

impl<V> fmt::Debug for IpRangeTable<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.inner.read();
        f.debug_list()
            .entries(table.iter().map(|(start, entry)| {
                format!("{}-{}", u32_to_ipv4(*start), u32_to_ipv4(entry.end))
            }))
            .finish()
    }
}
