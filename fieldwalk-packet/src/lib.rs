//! Named, typed field access over raw Ethernet frames
//!
//! This crate treats a frame as a stack of recognized protocol headers over a
//! single byte buffer and lets callers read, write and copy header fields by
//! name, without knowing offsets, bit shifts or byte order.
//!
//! - [`catalog`] - Static field metadata and typed field handles
//! - [`header`] - Header identifiers and the presence mask
//! - [`packet`] - Packets, buffer ownership and field accessors
//! - [`access`] - The same accessors against a raw header buffer
//! - [`parse`] - The protocol walker that finds the headers of a frame
//! - [`format`] - Ethernet II / 802.1Q conversion
//! - [`dfk`] - Dynamic field keys for classification
//! - [`checksum`] - Internet checksum and packet checksum updates
//! - [`dump`] - Text rendering of every present field
//! - [`proto`] - Protocol numbers the walker dispatches on
//!
//! # Quick Start
//!
//! ```rust
//! use fieldwalk_packet::catalog::fields;
//! use fieldwalk_packet::{HeaderId, Packet, PacketFormat};
//!
//! let mut frame = vec![
//!     0x00, 0x00, 0x00, 0x00, 0x00, 0x01, // destination
//!     0x00, 0x00, 0x00, 0x00, 0x00, 0x02, // source
//!     0x81, 0x00, 0x13, 0xFE,             // 802.1Q, VLAN 0x3FE
//!     0x08, 0x06,                         // ARP
//! ];
//!
//! let mut packet = Packet::parsed(&mut frame).unwrap();
//! assert!(packet.header_exists(HeaderId::Dot1q));
//! assert_eq!(packet.get(fields::DOT1Q_VLAN).unwrap(), 0x3FE);
//! assert_eq!(packet.get(fields::ETHER_TYPE).unwrap(), 0x0806);
//!
//! packet.set(fields::DOT1Q_VLAN, 0x100).unwrap();
//! packet.set_format(PacketFormat::EtherII).unwrap();
//! assert!(!packet.header_exists(HeaderId::Dot1q));
//! ```

pub mod access;
pub mod catalog;
pub mod checksum;
pub mod dfk;
pub mod dump;
pub mod format;
pub mod header;
pub mod packet;
pub mod parse;
pub mod proto;


// Re-export commonly used types
pub use catalog::{fields, FieldId, FieldInfo, NarrowField, WideField};
pub use dfk::{DynamicFieldKey, KeyDumper};
pub use format::FormatChange;
pub use header::{HeaderId, HeaderMask};
pub use packet::{Packet, PacketBuffer, PacketFormat};
