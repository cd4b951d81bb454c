//! Protocol numbers driving the header walk

use std::fmt;

/// EtherType values the walker dispatches on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EtherType {
    /// IPv4 (0x0800)
    IPv4,
    /// ARP (0x0806)
    ARP,
    /// VLAN-tagged frame (0x8100)
    VLAN,
    /// IPv6 (0x86DD)
    IPv6,
    /// Slow Protocols (0x8809) - LACP, marker
    SlowProtocols,
    /// LLDP (0x88CC)
    LLDP,
    /// Any other value
    Custom(u16),
}

impl EtherType {
    /// Convert EtherType to u16 value
    pub fn to_u16(self) -> u16 {
        match self {
            EtherType::IPv4 => 0x0800,
            EtherType::ARP => 0x0806,
            EtherType::VLAN => 0x8100,
            EtherType::IPv6 => 0x86DD,
            EtherType::SlowProtocols => 0x8809,
            EtherType::LLDP => 0x88CC,
            EtherType::Custom(val) => val,
        }
    }

    /// Create EtherType from u16 value
    pub fn from_u16(value: u16) -> Self {
        match value {
            0x0800 => EtherType::IPv4,
            0x0806 => EtherType::ARP,
            0x8100 => EtherType::VLAN,
            0x86DD => EtherType::IPv6,
            0x8809 => EtherType::SlowProtocols,
            0x88CC => EtherType::LLDP,
            val => EtherType::Custom(val),
        }
    }
}

impl fmt::Display for EtherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EtherType::IPv4 => write!(f, "IPv4"),
            EtherType::ARP => write!(f, "ARP"),
            EtherType::VLAN => write!(f, "VLAN"),
            EtherType::IPv6 => write!(f, "IPv6"),
            EtherType::SlowProtocols => write!(f, "Slow Protocols"),
            EtherType::LLDP => write!(f, "LLDP"),
            EtherType::Custom(val) => write!(f, "0x{:04X}", val),
        }
    }
}

/// IP protocol / IPv6 next-header numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpProtocol {
    ICMP,
    TCP,
    UDP,
    Other(u8),
}

impl IpProtocol {
    pub fn to_u8(self) -> u8 {
        match self {
            IpProtocol::ICMP => 1,
            IpProtocol::TCP => 6,
            IpProtocol::UDP => 17,
            IpProtocol::Other(val) => val,
        }
    }

    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => IpProtocol::ICMP,
            6 => IpProtocol::TCP,
            17 => IpProtocol::UDP,
            val => IpProtocol::Other(val),
        }
    }
}

impl fmt::Display for IpProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpProtocol::ICMP => write!(f, "ICMP"),
            IpProtocol::TCP => write!(f, "TCP"),
            IpProtocol::UDP => write!(f, "UDP"),
            IpProtocol::Other(val) => write!(f, "{}", val),
        }
    }
}

/// Slow protocols subtypes (IEEE 802.3 Annex 43B)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlowProtocol {
    /// Link Aggregation Control Protocol
    LACP,
    /// LACP marker protocol
    Marker,
    Other(u8),
}

impl SlowProtocol {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0x01 => SlowProtocol::LACP,
            0x02 => SlowProtocol::Marker,
            val => SlowProtocol::Other(val),
        }
    }
}

/// Well-known UDP service ports recognized by the walker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServicePort {
    /// BOOTP/DHCP server (67)
    DhcpServer,
    /// BOOTP/DHCP client (68)
    DhcpClient,
}

impl ServicePort {
    pub fn from_u16(port: u16) -> Option<Self> {
        match port {
            67 => Some(ServicePort::DhcpServer),
            68 => Some(ServicePort::DhcpClient),
            _ => None,
        }
    }

    pub fn to_u16(self) -> u16 {
        match self {
            ServicePort::DhcpServer => 67,
            ServicePort::DhcpClient => 68,
        }
    }
}

/// BOOTP message flavour, told apart by the DHCP magic cookie
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DhcpKind {
    Dhcp,
    Bootp,
}

impl fmt::Display for DhcpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DhcpKind::Dhcp => write!(f, "DHCP"),
            DhcpKind::Bootp => write!(f, "BOOTP"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ethertype_conversion() {
        assert_eq!(EtherType::from_u16(0x0800), EtherType::IPv4);
        assert_eq!(EtherType::from_u16(0x8922), EtherType::Custom(0x8922));
        assert_eq!(EtherType::SlowProtocols.to_u16(), 0x8809);
        assert_eq!(EtherType::Custom(0x8922).to_string(), "0x8922");
    }

    #[test]
    fn test_ip_protocol_conversion() {
        assert_eq!(IpProtocol::from_u8(6), IpProtocol::TCP);
        assert_eq!(IpProtocol::from_u8(0x99), IpProtocol::Other(0x99));
        assert_eq!(IpProtocol::UDP.to_u8(), 17);
    }

    #[test]
    fn test_service_ports() {
        assert_eq!(ServicePort::from_u16(67), Some(ServicePort::DhcpServer));
        assert_eq!(ServicePort::from_u16(68), Some(ServicePort::DhcpClient));
        assert_eq!(ServicePort::from_u16(53), None);
        assert_eq!(ServicePort::DhcpClient.to_u16(), 68);
    }

    #[test]
    fn test_slow_protocol() {
        assert_eq!(SlowProtocol::from_u8(1), SlowProtocol::LACP);
        assert_eq!(SlowProtocol::from_u8(9), SlowProtocol::Other(9));
    }
}
