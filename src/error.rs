use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("out of the storage: capacity is {cap} required is at least {required}")]
    Overflow { cap: usize, required: usize },
    #[error("invalid argument:{0}")]
    InvalidArgument(String),
    #[error("invalid key length {0}, expected 16 or 32 bytes")]
    InvalidKeyLength(usize),
    #[error("wrong pkcs7 padding size:{0}")]
    Padding(u8),
    #[error("decode error:{0}")]
    Decode(String),
    #[error("malformed packet: declared payload {declared} bytes but only {available} available")]
    Framing { declared: usize, available: usize },
    #[error("cipher error:{0}")]
    Cipher(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// Errors that only condemn the current datagram, not the socket.
    pub fn is_packet_error(&self) -> bool {
        matches!(
            self,
            Error::Padding(_) | Error::Decode(_) | Error::Framing { .. } | Error::Cipher(_)
        )
    }
}

impl From<Error> for io::Error {
    fn from(value: Error) -> Self {
        match value {
            Error::Io(e) => e,
            e => io::Error::new(io::ErrorKind::InvalidData, e),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
