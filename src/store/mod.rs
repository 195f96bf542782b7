//! Registry of known peers.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_utils::atomic::AtomicCell;
use dashmap::DashMap;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeInfo {
    pub name: String,
    pub addr: SocketAddr,
    /// Access class the address resolved to at registration.
    pub class: Option<String>,
    pub last_seen: Instant,
}

struct NodeEntry {
    addr: SocketAddr,
    class: Option<String>,
    last_seen: AtomicCell<Instant>,
}

/// Shared handle over the peer table. Clones see the same records.
#[derive(Clone, Default)]
pub struct NodeStore {
    nodes: Arc<DashMap<String, NodeEntry>>,
    addr_index: Arc<DashMap<SocketAddr, String>>,
}

impl NodeStore {
    pub fn new() -> Self {
        Self::default()
    }
    /// Insert or replace the record for `name`.
    pub fn register(&self, name: impl Into<String>, addr: SocketAddr, class: Option<String>) {
        let name = name.into();
        let entry = NodeEntry {
            addr,
            class,
            last_seen: AtomicCell::new(Instant::now()),
        };
        if let Some(old) = self.nodes.insert(name.clone(), entry) {
            if old.addr != addr {
                self.addr_index.remove_if(&old.addr, |_, v| *v == name);
            }
        }
        if let Some(previous) = self.addr_index.insert(addr, name.clone()) {
            if previous != name {
                log::debug!("addr {addr} moved from {previous} to {name}");
                self.nodes.remove_if(&previous, |_, v| v.addr == addr);
            }
        }
    }
    /// Refresh the record owning `addr`. Returns false for unknown addresses.
    pub fn touch(&self, addr: &SocketAddr) -> bool {
        let Some(name) = self.addr_index.get(addr).map(|v| v.value().clone()) else {
            return false;
        };
        match self.nodes.get(&name) {
            Some(entry) => {
                entry.last_seen.store(Instant::now());
                true
            }
            None => false,
        }
    }
    pub fn get(&self, name: &str) -> Option<NodeInfo> {
        self.nodes.get(name).map(|entry| NodeInfo {
            name: name.to_string(),
            addr: entry.addr,
            class: entry.class.clone(),
            last_seen: entry.last_seen.load(),
        })
    }
    pub fn get_by_addr(&self, addr: &SocketAddr) -> Option<NodeInfo> {
        let name = self.addr_index.get(addr).map(|v| v.value().clone())?;
        self.get(&name)
    }
    pub fn remove(&self, name: &str) -> Option<NodeInfo> {
        let (name, entry) = self.nodes.remove(name)?;
        self.addr_index.remove_if(&entry.addr, |_, v| *v == name);
        Some(NodeInfo {
            name,
            addr: entry.addr,
            class: entry.class,
            last_seen: entry.last_seen.load(),
        })
    }
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
    /// Names of nodes not seen within `idle`.
    pub fn expired(&self, idle: Duration) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|entry| entry.last_seen.load().elapsed() > idle)
            .map(|entry| entry.key().clone())
            .collect()
    }
    pub fn remove_expired(&self, idle: Duration) -> Vec<NodeInfo> {
        let mut removed = Vec::new();
        for name in self.expired(idle) {
            // re-check: the node may have been touched since the scan
            let Some((name, entry)) = self
                .nodes
                .remove_if(&name, |_, v| v.last_seen.load().elapsed() > idle)
            else {
                continue;
            };
            self.addr_index.remove_if(&entry.addr, |_, v| *v == name);
            removed.push(NodeInfo {
                name,
                addr: entry.addr,
                class: entry.class,
                last_seen: entry.last_seen.load(),
            });
        }
        removed
    }
}
