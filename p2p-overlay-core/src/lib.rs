//! # p2p-overlay-core
//!
//! Low-level building blocks for the `p2p-overlay` tunnel:
//!
//! - [`range`] - interval-indexed IPv4 address classification used for
//!   admission control of peers
//! - [`socket`] - UDP socket creation with optional device binding
//! - [`extend`] - address helpers
//!
//! ## Address classification
//!
//! ```rust
//! use p2p_overlay_core::range::IpRangeTable;
//! use std::net::Ipv4Addr;
//!
//! let table = IpRangeTable::new();
//! table.insert_addr(Ipv4Addr::new(10, 0, 0, 0), Ipv4Addr::new(10, 0, 0, 127), "office");
//! table.insert_addr(Ipv4Addr::new(10, 0, 0, 128), Ipv4Addr::new(10, 0, 0, 255), "lab");
//!
//! // adjacent ranges coalesce, the latest value wins
//! assert_eq!(table.len(), 1);
//! assert_eq!(table.lookup_addr(Ipv4Addr::new(10, 0, 0, 1)), Some("lab"));
//! ```
//!
//! ## Thread Safety
//!
//! [`range::IpRangeTable`] is guarded by a reader-writer lock; clones share
//! the same table and may be used from any thread.

pub mod error;
pub mod extend;
pub mod range;
pub mod socket;
