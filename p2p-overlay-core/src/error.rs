use std::io;
use std::net::AddrParseError;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("io")]
    Io(#[from] io::Error),
    #[error("invalid argument:{0}")]
    InvalidArgument(String),
    #[error("invalid range: start {start} is greater than end {end}")]
    InvalidRange { start: u32, end: u32 },
    #[error("address parse: {0}")]
    AddrParse(#[from] AddrParseError),
    #[error("Not support IPV6")]
    NotSupportIPV6,
}

pub type Result<T, E = Error> = ::std::result::Result<T, E>;
