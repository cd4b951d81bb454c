//! Common types used throughout fieldwalk

use std::fmt;
use std::str::FromStr;

/// MAC Address (6 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    /// Create a new MAC address
    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    /// Create a MAC address from a slice of exactly six bytes
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        <[u8; 6]>::try_from(slice).ok().map(Self)
    }

    /// Get bytes as slice
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Convert to array
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl FromStr for MacAddr {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(|c| c == ':' || c == '-').collect();
        if parts.len() != 6 {
            return Err(crate::Error::unknown_name("MAC address", s));
        }

        let mut bytes = [0u8; 6];
        for (i, part) in parts.iter().enumerate() {
            bytes[i] = u8::from_str_radix(part, 16)
                .map_err(|_| crate::Error::unknown_name("MAC address", s))?;
        }

        Ok(MacAddr(bytes))
    }
}

/// Well-known link and network layer constants
pub mod constants {
    /// Minimum Ethernet header: two addresses and the type/length field
    pub const ETHERNET_HEADER_LEN: usize = 14;
    /// Offset of the type/length field in an untagged frame
    pub const ETHERTYPE_OFFSET: usize = 12;
    /// Size of an 802.1Q tag (TPID + TCI)
    pub const DOT1Q_TAG_LEN: usize = 4;
    /// Type/length values below this are 802.3 lengths
    pub const ETHERTYPE_MIN: u16 = 0x0600;
    /// LLC SAP values announcing a SNAP header
    pub const SNAP_SAPS: [u8; 2] = [0xAA, 0xAB];
    /// DHCP magic cookie
    pub const DHCP_MAGIC_COOKIE: u32 = 0x6382_5363;
    /// Slow protocols subtype carrying LACP
    pub const SLOW_SUBTYPE_LACP: u8 = 0x01;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mac_parse_and_display() {
        let mac: MacAddr = "00:11:22:33:44:55".parse().unwrap();
        assert_eq!(mac.octets(), [0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
        assert_eq!(mac.to_string(), "00:11:22:33:44:55");

        let dashed: MacAddr = "00-11-22-33-44-55".parse().unwrap();
        assert_eq!(dashed, mac);
    }

    #[test]
    fn test_mac_parse_rejects_garbage() {
        assert!("00:11:22".parse::<MacAddr>().is_err());
        assert!("zz:11:22:33:44:55".parse::<MacAddr>().is_err());
    }

    #[test]
    fn test_mac_from_slice() {
        assert_eq!(
            MacAddr::from_slice(&[0, 0x11, 0x22, 0x33, 0x44, 0x55]),
            Some(MacAddr::new([0, 0x11, 0x22, 0x33, 0x44, 0x55]))
        );
        assert_eq!(MacAddr::from_slice(&[1, 2, 3]), None);
    }
}
