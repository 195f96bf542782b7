//! UDP overlay transport for peer-to-peer nodes.
//!
//! Every datagram carries an 8-byte header followed by a payload that is
//! PKCS#7 padded and AES-CBC encrypted when a key is configured. Sources are
//! admitted through an [`IpRangeTable`] built from an access list, and the
//! endpoint answers heartbeats on its own.
//!
//! ```no_run
//! # async fn run() -> p2p_overlay::error::Result<()> {
//! let endpoint = p2p_overlay::Builder::new()
//!     .udp_port(27183)
//!     .key("0123456789abcdef")
//!     .access_list("10.0.0.0/8,192.168.1.10-192.168.1.20")
//!     .build()
//!     .await?;
//! let datagram = endpoint.recv_from().await?;
//! endpoint
//!     .send_to(datagram.addr(), datagram.main_type(), 0, datagram.payload())
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod cipher;
pub mod config;
pub mod error;
pub mod extend;
pub mod maintain;
pub mod protocol;
pub mod store;
pub mod transport;

pub use p2p_overlay_core::range::IpRangeTable;
pub use p2p_overlay_core::socket::LocalInterface;

use std::io;
use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};

use async_shutdown::ShutdownManager;
use p2p_overlay_core::extend::addr::peer_ipv4;

use config::EndpointConfig;
use error::{Error, Result};
use protocol::protocol_type::{HeartbeatType, MainType};
use store::{NodeInfo, NodeStore};
use transport::{RecvDatagram, UdpTransport};

pub struct Endpoint {
    transport: UdpTransport,
    access_table: Option<IpRangeTable<String>>,
    node_store: NodeStore,
    recv_timeout: Duration,
    shutdown_manager: ShutdownManager<()>,
}

impl Endpoint {
    pub async fn new(config: EndpointConfig) -> Result<Self> {
        config.validate()?;
        let cipher = config.cipher()?;
        let transport = match config.local_interface() {
            Some(interface) => UdpTransport::bind_with(config.bind_addr, Some(&interface), cipher)?,
            None => UdpTransport::bind(config.bind_addr, cipher).await?,
        }
        .set_recv_buffer_size(config.recv_buffer_size);
        let access_table = config.access_table();
        if let Some(table) = &access_table {
            log::info!("access table {table:?}");
        }
        let node_store = NodeStore::new();
        let shutdown_manager = ShutdownManager::<()>::new();
        let mut join_set = maintain::start_task(
            &transport,
            &node_store,
            config.server_addr,
            config.heartbeat_interval,
            config.node_idle_time,
        );
        let fut = shutdown_manager
            .wrap_cancel(async move { while join_set.join_next().await.is_some() {} });
        tokio::spawn(async move {
            if fut.await.is_err() {
                log::debug!("recv shutdown signal: built-in maintain tasks are shutdown");
            }
        });
        Ok(Self {
            transport,
            access_table,
            node_store,
            recv_timeout: config.recv_timeout,
            shutdown_manager,
        })
    }

    /// Next datagram for the application.
    ///
    /// Malformed datagrams and sources outside the access table are dropped,
    /// heartbeats are answered here. The receive timeout bounds the whole call,
    /// dropped datagrams included.
    pub async fn recv_from(&self) -> Result<RecvDatagram> {
        let deadline =
            (!self.recv_timeout.is_zero()).then(|| tokio::time::Instant::now() + self.recv_timeout);
        loop {
            if self.shutdown_manager.is_shutdown_triggered() {
                return Err(shutdown_error());
            }
            let timeout = match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
                    if remaining.is_zero() {
                        return Err(io::Error::new(io::ErrorKind::TimedOut, "recv timeout").into());
                    }
                    remaining
                }
                None => Duration::ZERO,
            };
            let Ok(rs) = self
                .shutdown_manager
                .wrap_cancel(self.transport.recv(timeout))
                .await
            else {
                return Err(shutdown_error());
            };
            let datagram = match rs {
                Ok(datagram) => datagram,
                Err(e) if e.is_packet_error() => {
                    log::debug!("drop datagram e={e:?}");
                    continue;
                }
                Err(e) => return Err(e),
            };
            let addr = datagram.addr();
            if !self.is_admitted(addr.ip()) {
                log::debug!("reject {addr}: not in access table");
                continue;
            }
            self.node_store.touch(&addr);
            if MainType::from(datagram.main_type()) == MainType::Heartbeat {
                match HeartbeatType::from(datagram.sub_type()) {
                    HeartbeatType::Ping => {
                        if let Err(e) = self
                            .transport
                            .send(
                                Some(addr),
                                MainType::Heartbeat.into(),
                                HeartbeatType::Pong.into(),
                                datagram.payload(),
                            )
                            .await
                        {
                            log::warn!("heartbeat_response {addr} e={e:?}");
                        }
                        continue;
                    }
                    HeartbeatType::Pong => continue,
                    HeartbeatType::Unknown => {}
                }
            }
            return Ok(datagram);
        }
    }

    pub async fn send_to(
        &self,
        dest: SocketAddr,
        main_type: u16,
        sub_type: u16,
        payload: &[u8],
    ) -> Result<usize> {
        if self.shutdown_manager.is_shutdown_triggered() {
            return Err(shutdown_error());
        }
        self.transport
            .send(Some(dest), main_type, sub_type, payload)
            .await
    }

    /// Access class of `ip`, `None` when no access table is configured or
    /// `ip` is outside it.
    pub fn lookup_class(&self, ip: IpAddr) -> Option<String> {
        let table = self.access_table.as_ref()?;
        table.lookup_addr(peer_ipv4(ip)?)
    }

    pub fn is_admitted(&self, ip: IpAddr) -> bool {
        match &self.access_table {
            None => true,
            Some(table) => peer_ipv4(ip).is_some_and(|ip| table.lookup_addr(ip).is_some()),
        }
    }

    /// Record `name` at `addr`, tagged with the access class of its address.
    pub fn register_node(&self, name: impl Into<String>, addr: SocketAddr) -> NodeInfo {
        let info = NodeInfo {
            name: name.into(),
            addr,
            class: self.lookup_class(addr.ip()),
            last_seen: Instant::now(),
        };
        self.node_store
            .register(info.name.clone(), addr, info.class.clone());
        info
    }

    pub fn node_store(&self) -> &NodeStore {
        &self.node_store
    }

    pub fn access_table(&self) -> Option<&IpRangeTable<String>> {
        self.access_table.as_ref()
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.transport.local_addr()
    }

    pub fn shutdown(&self) -> Result<()> {
        self.shutdown_manager
            .trigger_shutdown(())
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "already shutdown"))?;
        Ok(())
    }
}

impl Drop for Endpoint {
    fn drop(&mut self) {
        _ = self.shutdown_manager.trigger_shutdown(());
    }
}

fn shutdown_error() -> Error {
    io::Error::new(io::ErrorKind::Other, "shutdown").into()
}

#[derive(Default)]
pub struct Builder {
    udp_port: Option<u16>,
    bind_addr: Option<SocketAddr>,
    server_addr: Option<SocketAddr>,
    key: Option<String>,
    access_list: Option<String>,
    recv_timeout: Option<Duration>,
    default_interface: Option<String>,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }
    /// Listen on `0.0.0.0:port`. Ignored when `bind_addr` is set.
    pub fn udp_port(mut self, port: u16) -> Self {
        self.udp_port = Some(port);
        self
    }
    pub fn bind_addr(mut self, bind_addr: SocketAddr) -> Self {
        self.bind_addr = Some(bind_addr);
        self
    }
    pub fn server_addr(mut self, server_addr: SocketAddr) -> Self {
        self.server_addr = Some(server_addr);
        self
    }
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }
    pub fn access_list(mut self, access_list: impl Into<String>) -> Self {
        self.access_list = Some(access_list.into());
        self
    }
    pub fn recv_timeout(mut self, recv_timeout: Duration) -> Self {
        self.recv_timeout = Some(recv_timeout);
        self
    }
    pub fn default_interface(mut self, name: impl Into<String>) -> Self {
        self.default_interface = Some(name.into());
        self
    }
    pub async fn build(self) -> Result<Endpoint> {
        let bind_addr = self
            .bind_addr
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], self.udp_port.unwrap_or(0))));
        let mut config = EndpointConfig::empty().set_bind_addr(bind_addr);
        if let Some(server_addr) = self.server_addr {
            config = config.set_server_addr(server_addr);
        }
        if let Some(key) = self.key {
            config = config.set_key(key);
        }
        if let Some(access_list) = self.access_list {
            config = config.set_access_list(access_list);
        }
        if let Some(recv_timeout) = self.recv_timeout {
            config = config.set_recv_timeout(recv_timeout);
        }
        if let Some(name) = self.default_interface {
            config = config.set_default_interface(name);
        }
        Endpoint::new(config).await
    }
}
