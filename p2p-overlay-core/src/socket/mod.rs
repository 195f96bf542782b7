use anyhow::Context;
use socket2::Protocol;
use std::net::SocketAddr;

#[cfg(any(target_os = "linux", target_os = "android"))]
mod unix;

pub(crate) trait SocketTrait {
    fn set_ip_unicast_if(&self, _interface: &LocalInterface) -> std::io::Result<()> {
        Ok(())
    }
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
impl SocketTrait for socket2::Socket {}

/// Network device an overlay socket is pinned to.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LocalInterface {
    pub name: String,
}

impl LocalInterface {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

pub(crate) fn bind_udp_ops(
    addr: SocketAddr,
    only_v6: bool,
    default_interface: Option<&LocalInterface>,
) -> anyhow::Result<socket2::Socket> {
    let socket = if addr.is_ipv4() {
        let socket = socket2::Socket::new(
            socket2::Domain::IPV4,
            socket2::Type::DGRAM,
            Some(Protocol::UDP),
        )?;
        if let Some(default_interface) = default_interface {
            socket.set_ip_unicast_if(default_interface)?;
        }
        socket
    } else {
        let socket = socket2::Socket::new(
            socket2::Domain::IPV6,
            socket2::Type::DGRAM,
            Some(Protocol::UDP),
        )?;
        socket
            .set_only_v6(only_v6)
            .with_context(|| format!("set_only_v6 failed: {}", &addr))?;
        socket
    };
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    Ok(socket)
}

/// Create a non-blocking UDP socket bound to `addr`.
///
/// IPv6 wildcard binds accept v4-mapped traffic too, so a single `[::]`
/// socket serves both families.
pub fn bind_udp(
    addr: SocketAddr,
    default_interface: Option<&LocalInterface>,
) -> anyhow::Result<socket2::Socket> {
    bind_udp_ops(addr, false, default_interface).with_context(|| format!("bind_udp {}", addr))
}

/// Same as [`bind_udp`], handing the socket to tokio.
pub fn bind_tokio_udp(
    addr: SocketAddr,
    default_interface: Option<&LocalInterface>,
) -> crate::error::Result<tokio::net::UdpSocket> {
    let socket = bind_udp(addr, default_interface)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::AddrNotAvailable, format!("{e:#}")))?;
    let udp: std::net::UdpSocket = socket.into();
    Ok(tokio::net::UdpSocket::from_std(udp)?)
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn test_bind_udp() {
        let udp = bind_tokio_udp("127.0.0.1:0".parse().unwrap(), None).unwrap();
        let addr = udp.local_addr().unwrap();
        assert!(addr.ip().is_loopback());
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn test_bind_in_use() {
        let udp = bind_tokio_udp("127.0.0.1:0".parse().unwrap(), None).unwrap();
        let addr = udp.local_addr().unwrap();
        assert!(bind_udp(addr, None).is_err());
    }
}
