use std::net::SocketAddr;
use std::time::Duration;

use p2p_overlay_core::range::IpRangeTable;
use p2p_overlay_core::socket::LocalInterface;
use serde::{Deserialize, Serialize};

use crate::cipher::Cipher;
use crate::error::{Error, Result};
use crate::transport::DEFAULT_RECV_BUFFER_SIZE;

pub(crate) const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(10);
pub(crate) const NODE_IDLE_TIME: Duration = Duration::from_secs(60);
pub(crate) const DEFAULT_ACCESS_CLASS: &str = "default";

/// Endpoint settings. Durations (de)serialize as milliseconds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub bind_addr: SocketAddr,
    /// Coordination server the heartbeat is sent to.
    pub server_addr: Option<SocketAddr>,
    /// Shared AES key as raw UTF-8 bytes: 16 or 32 bytes, or absent for
    /// plaintext.
    pub key: Option<String>,
    /// Comma separated addresses, CIDR blocks and `a-b` ranges admitted by
    /// the endpoint. Absent admits every IPv4 source.
    pub access_list: Option<String>,
    /// Value attached to every range parsed from `access_list`.
    pub access_class: String,
    pub recv_buffer_size: usize,
    /// Zero waits forever.
    #[serde(with = "duration_serde")]
    pub recv_timeout: Duration,
    #[serde(with = "duration_serde")]
    pub heartbeat_interval: Duration,
    #[serde(with = "duration_serde")]
    pub node_idle_time: Duration,
    pub default_interface: Option<String>,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 0)),
            server_addr: None,
            key: None,
            access_list: None,
            access_class: DEFAULT_ACCESS_CLASS.to_string(),
            recv_buffer_size: DEFAULT_RECV_BUFFER_SIZE,
            recv_timeout: Duration::ZERO,
            heartbeat_interval: HEARTBEAT_INTERVAL,
            node_idle_time: NODE_IDLE_TIME,
            default_interface: None,
        }
    }
}

impl EndpointConfig {
    pub fn empty() -> Self {
        Self::default()
    }
    pub fn set_bind_addr(mut self, bind_addr: SocketAddr) -> Self {
        self.bind_addr = bind_addr;
        self
    }
    pub fn set_server_addr(mut self, server_addr: SocketAddr) -> Self {
        self.server_addr.replace(server_addr);
        self
    }
    pub fn set_key(mut self, key: impl Into<String>) -> Self {
        self.key.replace(key.into());
        self
    }
    pub fn set_access_list(mut self, access_list: impl Into<String>) -> Self {
        self.access_list.replace(access_list.into());
        self
    }
    pub fn set_access_class(mut self, access_class: impl Into<String>) -> Self {
        self.access_class = access_class.into();
        self
    }
    pub fn set_recv_buffer_size(mut self, recv_buffer_size: usize) -> Self {
        self.recv_buffer_size = recv_buffer_size;
        self
    }
    pub fn set_recv_timeout(mut self, recv_timeout: Duration) -> Self {
        self.recv_timeout = recv_timeout;
        self
    }
    pub fn set_heartbeat_interval(mut self, heartbeat_interval: Duration) -> Self {
        self.heartbeat_interval = heartbeat_interval;
        self
    }
    pub fn set_node_idle_time(mut self, node_idle_time: Duration) -> Self {
        self.node_idle_time = node_idle_time;
        self
    }
    pub fn set_default_interface(mut self, default_interface: impl Into<String>) -> Self {
        self.default_interface.replace(default_interface.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.heartbeat_interval.is_zero() {
            return Err(Error::InvalidArgument(
                "heartbeat_interval must be non-zero".to_string(),
            ));
        }
        if self.node_idle_time.is_zero() {
            return Err(Error::InvalidArgument(
                "node_idle_time must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
    pub fn cipher(&self) -> Result<Cipher> {
        match &self.key {
            Some(key) => Cipher::new(key.as_bytes()),
            None => Ok(Cipher::None),
        }
    }
    /// `None` when no access list is configured.
    pub fn access_table(&self) -> Option<IpRangeTable<String>> {
        self.access_list
            .as_deref()
            .map(|spec| IpRangeTable::from_spec_with(spec, self.access_class.clone()))
    }
    pub fn local_interface(&self) -> Option<LocalInterface> {
        self.default_interface.as_deref().map(LocalInterface::new)
    }
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
