/*
   0                                            15                                              31
   0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5  6  7  8  9  0  1
  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
  |                                      data len (32, LE)                                      |
  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
  |             main type (16, LE)              |               sub type (16, LE)               |
  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
  |                                         payload(n)                                          |
  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
*/

use crate::error::{Error, Result};

pub mod checksum;
pub mod protocol_type;

pub const HEADER_LEN: usize = 8;

/// Fixed prefix of every overlay datagram.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct Header {
    pub data_len: u32,
    pub main_type: u16,
    pub sub_type: u16,
}

impl Header {
    pub fn new(main_type: u16, sub_type: u16, data_len: u32) -> Self {
        Self {
            data_len,
            main_type,
            sub_type,
        }
    }
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0; HEADER_LEN];
        buf[..4].copy_from_slice(&self.data_len.to_le_bytes());
        buf[4..6].copy_from_slice(&self.main_type.to_le_bytes());
        buf[6..8].copy_from_slice(&self.sub_type.to_le_bytes());
        buf
    }
    /// Reads the header prefix; the declared length is not checked here.
    pub fn parse(buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_LEN {
            return Err(Error::Framing {
                declared: HEADER_LEN,
                available: buf.len(),
            });
        }
        Ok(Self {
            data_len: u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]),
            main_type: u16::from_le_bytes([buf[4], buf[5]]),
            sub_type: u16::from_le_bytes([buf[6], buf[7]]),
        })
    }
}

/// Header plus payload view over a received or outgoing buffer.
pub struct NetPacket<B> {
    buffer: B,
}

impl<B: AsRef<[u8]>> NetPacket<B> {
    /// Validates that the buffer holds a complete header and that the
    /// declared payload fits in what follows it.
    pub fn new(buffer: B) -> Result<NetPacket<B>> {
        let header = Header::parse(buffer.as_ref())?;
        let available = buffer.as_ref().len() - HEADER_LEN;
        let declared = header.data_len as usize;
        if declared > available {
            return Err(Error::Framing {
                declared,
                available,
            });
        }
        Ok(Self { buffer })
    }
    pub fn header(&self) -> Header {
        let buf = self.buffer.as_ref();
        Header {
            data_len: self.data_len(),
            main_type: u16::from_le_bytes([buf[4], buf[5]]),
            sub_type: u16::from_le_bytes([buf[6], buf[7]]),
        }
    }
    pub fn data_len(&self) -> u32 {
        let buf = self.buffer.as_ref();
        u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]])
    }
    pub fn main_type(&self) -> u16 {
        let buf = self.buffer.as_ref();
        u16::from_le_bytes([buf[4], buf[5]])
    }
    pub fn sub_type(&self) -> u16 {
        let buf = self.buffer.as_ref();
        u16::from_le_bytes([buf[6], buf[7]])
    }
    pub fn payload(&self) -> &[u8] {
        let end = HEADER_LEN + self.data_len() as usize;
        &self.buffer.as_ref()[HEADER_LEN..end]
    }
    pub fn buffer(&self) -> &[u8] {
        let end = HEADER_LEN + self.data_len() as usize;
        &self.buffer.as_ref()[..end]
    }
    pub fn into_inner(self) -> B {
        self.buffer
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> NetPacket<B> {
    /// The declared payload length is kept in bounds of the buffer.
    pub fn set_data_len(&mut self, data_len: usize) -> Result<()> {
        let available = self.buffer.as_ref().len() - HEADER_LEN;
        if data_len > available {
            return Err(Error::Overflow {
                cap: available,
                required: data_len,
            });
        }
        self.buffer.as_mut()[..4].copy_from_slice(&(data_len as u32).to_le_bytes());
        Ok(())
    }
    pub fn set_main_type(&mut self, main_type: u16) {
        self.buffer.as_mut()[4..6].copy_from_slice(&main_type.to_le_bytes());
    }
    pub fn set_sub_type(&mut self, sub_type: u16) {
        self.buffer.as_mut()[6..8].copy_from_slice(&sub_type.to_le_bytes());
    }
    pub fn payload_mut(&mut self) -> &mut [u8] {
        let end = HEADER_LEN + self.data_len() as usize;
        &mut self.buffer.as_mut()[HEADER_LEN..end]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_header_layout() {
        let header = Header::new(1, 2, 0x0102_0304);
        assert_eq!(header.to_bytes(), [4, 3, 2, 1, 1, 0, 2, 0]);
        assert_eq!(Header::parse(&header.to_bytes()).unwrap(), header);
    }

    #[test]
    fn test_short_header() {
        assert!(matches!(
            Header::parse(&[0; 7]),
            Err(Error::Framing {
                declared: HEADER_LEN,
                available: 7
            })
        ));
        assert!(NetPacket::new(&[][..]).is_err());
    }

    #[test]
    fn test_oversized_data_len() {
        let mut buf = [0u8; 20];
        buf[..HEADER_LEN].copy_from_slice(&Header::new(4, 0, 13).to_bytes());
        match NetPacket::new(&buf[..]) {
            Err(Error::Framing {
                declared,
                available,
            }) => {
                assert_eq!(declared, 13);
                assert_eq!(available, 12);
            }
            _ => panic!("expected framing error"),
        }
        buf[..4].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(NetPacket::new(&buf[..]).is_err());
    }

    #[test]
    fn test_packet_view() {
        let mut buf = vec![0u8; 32];
        buf[..HEADER_LEN].copy_from_slice(&Header::new(0, 0, 0).to_bytes());
        let mut packet = NetPacket::new(&mut buf[..]).unwrap();
        packet.set_main_type(5);
        packet.set_sub_type(9);
        packet.set_data_len(3).unwrap();
        packet.payload_mut().copy_from_slice(b"abc");
        assert!(packet.set_data_len(25).is_err());
        assert_eq!(packet.header(), Header::new(5, 9, 3));
        assert_eq!(packet.payload(), b"abc");
        assert_eq!(packet.buffer().len(), HEADER_LEN + 3);
    }
}
