//! Datagram I/O over a UDP socket.
//!
//! Every datagram is `HEADER || payload`, where the payload is encrypted
//! when the transport carries a [`Cipher`].

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use p2p_overlay_core::socket::{bind_tokio_udp, LocalInterface};
use tokio::net::UdpSocket;

use crate::cipher::Cipher;
use crate::error::{Error, Result};
use crate::extend::byte_pool::{Block, BufferPool};
use crate::protocol::{Header, NetPacket, HEADER_LEN};

pub const DEFAULT_RECV_BUFFER_SIZE: usize = 1024;
const RECV_POOL_CAP: usize = 16;

/// Build `HEADER || payload'`, `payload'` being `payload` encrypted under
/// `cipher`.
pub fn encode_datagram(
    cipher: &Cipher,
    main_type: u16,
    sub_type: u16,
    payload: &[u8],
) -> Result<BytesMut> {
    let plain_len = payload.len();
    let mut buf = BytesMut::zeroed(HEADER_LEN + plain_len + cipher.reserved_len());
    buf[HEADER_LEN..HEADER_LEN + plain_len].copy_from_slice(payload);
    let data_len = cipher.encrypt(&mut buf[HEADER_LEN..], plain_len)?;
    let wire_len = u32::try_from(data_len)
        .map_err(|_| Error::InvalidArgument(format!("payload too large: {data_len}")))?;
    buf[..HEADER_LEN].copy_from_slice(&Header::new(main_type, sub_type, wire_len).to_bytes());
    buf.truncate(HEADER_LEN + data_len);
    Ok(buf)
}

/// Split a received datagram into its header and declared payload.
pub fn parse_datagram(buf: &[u8]) -> Result<(Header, &[u8])> {
    let packet = NetPacket::new(buf)?;
    let header = packet.header();
    let end = HEADER_LEN + header.data_len as usize;
    Ok((header, &buf[HEADER_LEN..end]))
}

/// A received, validated and (if configured) decrypted datagram.
pub struct RecvDatagram {
    addr: SocketAddr,
    header: Header,
    block: Block,
    payload_len: usize,
}

impl RecvDatagram {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
    /// The header as it arrived; `data_len` is the wire (ciphertext) length.
    pub fn header(&self) -> Header {
        self.header
    }
    pub fn main_type(&self) -> u16 {
        self.header.main_type
    }
    pub fn sub_type(&self) -> u16 {
        self.header.sub_type
    }
    pub fn payload(&self) -> &[u8] {
        &self.block[HEADER_LEN..HEADER_LEN + self.payload_len]
    }
    pub fn payload_len(&self) -> usize {
        self.payload_len
    }
}

impl std::fmt::Debug for RecvDatagram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecvDatagram")
            .field("addr", &self.addr)
            .field("header", &self.header)
            .field("payload_len", &self.payload_len)
            .finish()
    }
}

#[derive(Clone)]
pub struct UdpTransport {
    socket: Arc<UdpSocket>,
    cipher: Cipher,
    pool: BufferPool,
}

impl UdpTransport {
    pub fn new(socket: UdpSocket, cipher: Cipher) -> Self {
        Self {
            socket: Arc::new(socket),
            cipher,
            pool: BufferPool::new(RECV_POOL_CAP, DEFAULT_RECV_BUFFER_SIZE),
        }
    }
    pub async fn bind(addr: SocketAddr, cipher: Cipher) -> Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        Ok(Self::new(socket, cipher))
    }
    pub fn from_std(socket: std::net::UdpSocket, cipher: Cipher) -> Result<Self> {
        socket.set_nonblocking(true)?;
        Ok(Self::new(UdpSocket::from_std(socket)?, cipher))
    }
    /// Bind through `socket2`, optionally pinning the socket to a device.
    pub fn bind_with(
        addr: SocketAddr,
        default_interface: Option<&LocalInterface>,
        cipher: Cipher,
    ) -> Result<Self> {
        let socket = bind_tokio_udp(addr, default_interface)
            .map_err(|e| io::Error::new(io::ErrorKind::AddrNotAvailable, e.to_string()))?;
        Ok(Self::new(socket, cipher))
    }
    pub fn set_recv_buffer_size(mut self, recv_buffer_size: usize) -> Self {
        self.pool = BufferPool::new(RECV_POOL_CAP, recv_buffer_size.max(HEADER_LEN));
        self
    }
    pub async fn connect(&self, addr: SocketAddr) -> Result<()> {
        Ok(self.socket.connect(addr).await?)
    }
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }
    pub fn cipher(&self) -> &Cipher {
        &self.cipher
    }
    /// Frame and send `payload`, to `dest` or to the connected peer.
    /// Returns the number of bytes written to the socket.
    pub async fn send(
        &self,
        dest: Option<SocketAddr>,
        main_type: u16,
        sub_type: u16,
        payload: &[u8],
    ) -> Result<usize> {
        let buf = encode_datagram(&self.cipher, main_type, sub_type, payload)?;
        let len = match dest {
            Some(addr) => self.socket.send_to(&buf, addr).await?,
            None => self.socket.send(&buf).await?,
        };
        Ok(len)
    }
    /// Receive one datagram, waiting at most `timeout` (zero waits forever).
    ///
    /// Framing and decode failures reject only this datagram; the socket
    /// stays usable.
    pub async fn recv(&self, timeout: Duration) -> Result<RecvDatagram> {
        let mut block = self.pool.alloc();
        let (len, addr) = if timeout.is_zero() {
            self.socket.recv_from(&mut block).await?
        } else {
            match tokio::time::timeout(timeout, self.socket.recv_from(&mut block)).await {
                Ok(rs) => rs?,
                Err(_) => {
                    return Err(io::Error::new(io::ErrorKind::TimedOut, "recv timeout").into())
                }
            }
        };
        let (header, _) = parse_datagram(&block[..len])?;
        let end = HEADER_LEN + header.data_len as usize;
        let payload_len = self.cipher.decrypt(&mut block[HEADER_LEN..end])?;
        Ok(RecvDatagram {
            addr,
            header,
            block,
            payload_len,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::protocol::protocol_type::MainType;

    async fn pair(key: &[u8]) -> (UdpTransport, UdpTransport) {
        let a = UdpTransport::bind("127.0.0.1:0".parse().unwrap(), Cipher::new(key).unwrap())
            .await
            .unwrap();
        let b = UdpTransport::bind("127.0.0.1:0".parse().unwrap(), Cipher::new(key).unwrap())
            .await
            .unwrap();
        (a, b)
    }

    #[test]
    fn test_parse_datagram() {
        let buf = encode_datagram(&Cipher::None, 4, 1, b"payload").unwrap();
        let (header, payload) = parse_datagram(&buf).unwrap();
        assert_eq!(header, Header::new(4, 1, 7));
        assert_eq!(payload, b"payload");

        let mut extra = buf.to_vec();
        extra.extend_from_slice(b"trailing");
        let (_, payload) = parse_datagram(&extra).unwrap();
        assert_eq!(payload, b"payload");

        assert!(matches!(
            parse_datagram(&buf[..buf.len() - 1]),
            Err(Error::Framing {
                declared: 7,
                available: 6
            })
        ));
        assert!(parse_datagram(&buf[..3]).is_err());
    }

    #[tokio::test]
    async fn test_send_recv_plain() {
        let (a, b) = pair(&[]).await;
        let addr = b.local_addr().unwrap();
        let n = a
            .send(Some(addr), MainType::P2P.into(), 3, b"hello overlay")
            .await
            .unwrap();
        assert_eq!(n, HEADER_LEN + 13);
        let datagram = b.recv(Duration::from_secs(3)).await.unwrap();
        assert_eq!(datagram.addr(), a.local_addr().unwrap());
        assert_eq!(datagram.main_type(), u16::from(MainType::P2P));
        assert_eq!(datagram.sub_type(), 3);
        assert_eq!(datagram.payload(), b"hello overlay");
    }

    #[cfg(any(feature = "aes-cbc", feature = "openssl-aes-cbc"))]
    #[tokio::test]
    async fn test_send_recv_encrypted() {
        for key in [[3u8; 16].to_vec(), [4u8; 32].to_vec()] {
            let (a, b) = pair(&key).await;
            let addr = b.local_addr().unwrap();
            let n = a.send(Some(addr), 1, 0, b"secret").await.unwrap();
            assert_eq!(n, HEADER_LEN + 16);
            let datagram = b.recv(Duration::from_secs(3)).await.unwrap();
            assert_eq!(datagram.header().data_len, 16);
            assert_eq!(datagram.payload(), b"secret");
        }
    }

    #[tokio::test]
    async fn test_connected_send() {
        let (a, b) = pair(&[]).await;
        a.connect(b.local_addr().unwrap()).await.unwrap();
        a.send(None, 0, 0, b"").await.unwrap();
        let datagram = b.recv(Duration::from_secs(3)).await.unwrap();
        assert_eq!(datagram.payload_len(), 0);
    }

    #[tokio::test]
    async fn test_recv_timeout() {
        let (_a, b) = pair(&[]).await;
        match b.recv(Duration::from_millis(50)).await {
            Err(Error::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::TimedOut),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_datagrams_are_rejected() {
        let (a, b) = pair(&[]).await;
        let raw = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = b.local_addr().unwrap();

        let mut oversized = Header::new(4, 0, 500).to_bytes().to_vec();
        oversized.extend_from_slice(&[0; 10]);
        raw.send_to(&oversized, addr).await.unwrap();
        raw.send_to(&[1, 2, 3], addr).await.unwrap();
        let mut huge = Header::new(4, 0, u32::MAX).to_bytes().to_vec();
        huge.extend_from_slice(&[0; 2000]);
        raw.send_to(&huge, addr).await.unwrap();
        a.send(Some(addr), 4, 0, b"still alive").await.unwrap();

        for _ in 0..3 {
            let err = b.recv(Duration::from_secs(3)).await.unwrap_err();
            assert!(matches!(err, Error::Framing { .. }), "{err:?}");
            assert!(err.is_packet_error());
        }
        let datagram = b.recv(Duration::from_secs(3)).await.unwrap();
        assert_eq!(datagram.payload(), b"still alive");
    }

    #[tokio::test]
    async fn test_truncated_by_buffer() {
        let (a, b) = pair(&[]).await;
        let b = b.set_recv_buffer_size(64);
        a.send(Some(b.local_addr().unwrap()), 4, 0, &[7u8; 100])
            .await
            .unwrap();
        let err = b.recv(Duration::from_secs(3)).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Framing {
                declared: 100,
                available: 56
            }
        ));
    }
}
