//! Header identifiers and the per-packet presence mask
//!
//! Every protocol header the engine can recognize has a stable identifier.
//! The identifier's ordinal doubles as its bit index in [`HeaderMask`].

use fieldwalk_core::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Recognized protocol headers, in stable order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum HeaderId {
    /// Synthetic metadata (ingress port, length, format)
    Meta,
    /// Destination and source MAC addresses
    Ethernet,
    /// EtherII type field
    Ether,
    /// Single 802.1Q tag
    Dot1q,
    /// Outer tag of a double-tagged frame
    OuterDot1q,
    /// Inner tag of a double-tagged frame
    InnerDot1q,
    /// 802.3 length plus LLC
    Llc,
    /// EtherII framing marker (format only, never walked)
    EtherII,
    Snap,
    Arp,
    Lldp,
    Ip4,
    Ip6,
    /// Either TCP or UDP, for port fields common to both
    L4,
    Tcp,
    Udp,
    Icmp,
    SlowProtocols,
    Lacp,
    Dhcp,
    /// LLC framing whose ethertype could not be recovered
    EthertypeMissing,
    /// OpenFlow 1.0 compatibility match header
    Of10,
}

impl HeaderId {
    /// Number of header identifiers
    pub const COUNT: usize = 22;

    /// All headers in identifier order
    pub const ALL: [HeaderId; Self::COUNT] = [
        HeaderId::Meta,
        HeaderId::Ethernet,
        HeaderId::Ether,
        HeaderId::Dot1q,
        HeaderId::OuterDot1q,
        HeaderId::InnerDot1q,
        HeaderId::Llc,
        HeaderId::EtherII,
        HeaderId::Snap,
        HeaderId::Arp,
        HeaderId::Lldp,
        HeaderId::Ip4,
        HeaderId::Ip6,
        HeaderId::L4,
        HeaderId::Tcp,
        HeaderId::Udp,
        HeaderId::Icmp,
        HeaderId::SlowProtocols,
        HeaderId::Lacp,
        HeaderId::Dhcp,
        HeaderId::EthertypeMissing,
        HeaderId::Of10,
    ];

    /// Index into registry tables and bit position in the mask
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Look up a header by its ordinal
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Canonical upper-case name
    pub const fn name(self) -> &'static str {
        match self {
            HeaderId::Meta => "META",
            HeaderId::Ethernet => "ETHERNET",
            HeaderId::Ether => "ETHER",
            HeaderId::Dot1q => "8021Q",
            HeaderId::OuterDot1q => "OUTER_8021Q",
            HeaderId::InnerDot1q => "INNER_8021Q",
            HeaderId::Llc => "LLC",
            HeaderId::EtherII => "ETHERII",
            HeaderId::Snap => "SNAP",
            HeaderId::Arp => "ARP",
            HeaderId::Lldp => "LLDP",
            HeaderId::Ip4 => "IP4",
            HeaderId::Ip6 => "IP6",
            HeaderId::L4 => "L4",
            HeaderId::Tcp => "TCP",
            HeaderId::Udp => "UDP",
            HeaderId::Icmp => "ICMP",
            HeaderId::SlowProtocols => "SLOW_PROTOCOLS",
            HeaderId::Lacp => "LACP",
            HeaderId::Dhcp => "DHCP",
            HeaderId::EthertypeMissing => "ETHERTYPE_MISSING",
            HeaderId::Of10 => "OF10",
        }
    }
}

impl fmt::Display for HeaderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HeaderId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        HeaderId::ALL
            .iter()
            .copied()
            .find(|h| h.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::unknown_name("header", s))
    }
}

/// Bitmask of present headers, one bit per [`HeaderId`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HeaderMask(u32);

impl HeaderMask {
    pub const fn empty() -> Self {
        HeaderMask(0)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, header: HeaderId) -> bool {
        self.0 & (1 << header as u32) != 0
    }

    pub fn insert(&mut self, header: HeaderId) {
        self.0 |= 1 << header as u32;
    }

    pub fn remove(&mut self, header: HeaderId) {
        self.0 &= !(1 << header as u32);
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Present headers in identifier order
    pub fn iter(self) -> impl Iterator<Item = HeaderId> {
        HeaderId::ALL.into_iter().filter(move |h| self.contains(*h))
    }
}

impl fmt::Display for HeaderMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for header in self.iter() {
            if !first {
                f.write_str(" ")?;
            }
            f.write_str(header.name())?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_order() {
        for (i, header) in HeaderId::ALL.iter().enumerate() {
            assert_eq!(header.index(), i);
            assert_eq!(HeaderId::from_index(i), Some(*header));
        }
        assert_eq!(HeaderId::from_index(HeaderId::COUNT), None);
        assert_eq!(HeaderId::Of10.index(), HeaderId::COUNT - 1);
    }

    #[test]
    fn test_header_names() {
        assert_eq!(HeaderId::Dot1q.to_string(), "8021Q");
        assert_eq!("8021q".parse::<HeaderId>().unwrap(), HeaderId::Dot1q);
        assert_eq!(
            "ETHERTYPE_MISSING".parse::<HeaderId>().unwrap(),
            HeaderId::EthertypeMissing
        );
        assert!("MPLS".parse::<HeaderId>().is_err());
    }

    #[test]
    fn test_mask() {
        let mut mask = HeaderMask::empty();
        assert!(mask.is_empty());

        mask.insert(HeaderId::Ethernet);
        mask.insert(HeaderId::Ip4);
        assert!(mask.contains(HeaderId::Ip4));
        assert!(!mask.contains(HeaderId::Ip6));
        assert_eq!(mask.bits(), (1 << 1) | (1 << 11));
        assert_eq!(mask.to_string(), "ETHERNET IP4");

        mask.remove(HeaderId::Ip4);
        assert_eq!(mask.iter().collect::<Vec<_>>(), vec![HeaderId::Ethernet]);

        mask.clear();
        assert!(mask.is_empty());
    }
}
