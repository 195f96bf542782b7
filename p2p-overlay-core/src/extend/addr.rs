use std::net::{IpAddr, Ipv4Addr};

use crate::error::{Error, Result};

/// Converts an IPv4 address to its big-endian integer form.
pub const fn ipv4_to_u32(ip: Ipv4Addr) -> u32 {
    u32::from_be_bytes(ip.octets())
}

pub const fn u32_to_ipv4(value: u32) -> Ipv4Addr {
    Ipv4Addr::new(
        (value >> 24) as u8,
        (value >> 16) as u8,
        (value >> 8) as u8,
        value as u8,
    )
}

/// Parses either a bare address or the address part of a CIDR block
/// ("10.0.0.7/24" yields 10.0.0.7).
pub fn parse_ipv4(s: &str) -> Result<u32> {
    let s = s.trim();
    let host = match s.split_once('/') {
        Some((host, _)) => host,
        None => s,
    };
    match host.parse::<IpAddr>()? {
        IpAddr::V4(ip) => Ok(ipv4_to_u32(ip)),
        IpAddr::V6(ip) => match ip.to_ipv4_mapped() {
            Some(ip) => Ok(ipv4_to_u32(ip)),
            None => Err(Error::NotSupportIPV6),
        },
    }
}

/// Extracts the IPv4 form of a socket peer address, unwrapping v4-mapped v6.
pub fn peer_ipv4(ip: IpAddr) -> Option<Ipv4Addr> {
    match ip {
        IpAddr::V4(ip) => Some(ip),
        IpAddr::V6(ip) => ip.to_ipv4_mapped(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_u32_conversion() {
        let ip = Ipv4Addr::new(10, 0, 1, 255);
        assert_eq!(ipv4_to_u32(ip), 0x0A00_01FF);
        assert_eq!(u32_to_ipv4(0x0A00_01FF), ip);
    }

    #[test]
    fn test_parse_ipv4() {
        assert_eq!(parse_ipv4("192.168.1.1").unwrap(), 0xC0A8_0101);
        assert_eq!(parse_ipv4(" 10.0.0.7/24 ").unwrap(), 0x0A00_0007);
        assert_eq!(parse_ipv4("::ffff:10.0.0.1").unwrap(), 0x0A00_0001);
        assert!(matches!(parse_ipv4("fe80::1"), Err(Error::NotSupportIPV6)));
        assert!(parse_ipv4("10.0.0.256").is_err());
        assert!(parse_ipv4("").is_err());
    }
}
