//! Address range classification.
//!
//! An [`IpRangeTable`] holds a set of disjoint IPv4 ranges, each tagged with an
//! opaque value (typically a peer or ACL class identifier), and answers
//! "which range contains this address" in `O(log n)`.
//!
//! Tables are usually built from an access-control list string:
//!
//! ```rust
//! use p2p_overlay_core::range::IpRangeTable;
//!
//! let table = IpRangeTable::from_spec("10.0.0.1,10.0.1.0/24,10.0.2.1-10.0.2.10");
//! assert_eq!(table.len(), 3);
//! assert!(table.contains_str("10.0.1.255"));
//! assert!(!table.contains_str("10.0.3.1"));
//! ```

use std::str::FromStr;

use ipnet::Ipv4Net;

use crate::error::{Error, Result};
use crate::extend::addr::{ipv4_to_u32, parse_ipv4};

pub mod range_table;

pub use range_table::IpRangeTable;

/// Parses a single access-list token into an inclusive `(start, end)` pair.
///
/// Accepted forms are a bare address (`10.0.0.1`), a CIDR block
/// (`10.0.1.0/24`, network through broadcast address) and a dash-separated
/// pair (`10.0.2.1-10.0.2.10`).
pub fn parse_spec_token(token: &str) -> Result<(u32, u32)> {
    let token = token.trim();
    if token.contains('/') {
        let net = Ipv4Net::from_str(token)
            .map_err(|e| Error::InvalidArgument(format!("{token}: {e}")))?;
        return Ok((ipv4_to_u32(net.network()), ipv4_to_u32(net.broadcast())));
    }
    if let Some((min, max)) = token.split_once('-') {
        let start = parse_ipv4(min)?;
        let end = parse_ipv4(max)?;
        if start > end {
            return Err(Error::InvalidRange { start, end });
        }
        return Ok((start, end));
    }
    let ip = parse_ipv4(token)?;
    Ok((ip, ip))
}

/// Splits a comma-separated access list, skipping empty tokens.
pub fn parse_spec(spec: &str) -> impl Iterator<Item = (&str, Result<(u32, u32)>)> {
    spec.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| (token, parse_spec_token(token)))
}
