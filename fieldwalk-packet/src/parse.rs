//! Protocol walker
//!
//! Discovers the headers of a frame, starting from Ethernet, and records each
//! one in the packet's header registry. Reads go through a bounds-checked
//! [`Cursor`]; running out of data ends the walk at the deepest header that
//! was recognized and is never an error. Only frames shorter than an Ethernet
//! header are rejected.

use crate::access;
use crate::catalog::{fields, NarrowField};
use crate::header::HeaderId;
use crate::packet::{HeaderRegistry, HeaderSlot, Packet, PacketFormat, META_LEN};
use crate::proto::{DhcpKind, EtherType, IpProtocol, ServicePort, SlowProtocol};
use fieldwalk_core::constants::{
    DHCP_MAGIC_COOKIE, DOT1Q_TAG_LEN, ETHERNET_HEADER_LEN, ETHERTYPE_MIN, ETHERTYPE_OFFSET,
    SNAP_SAPS,
};
use fieldwalk_core::{Error, Result};
use tracing::{debug, trace, warn};

const LLC_LEN: usize = 5;
const SNAP_LEN: usize = 5;
const IP6_HEADER_LEN: usize = 40;
const UDP_HEADER_LEN: usize = 8;
const DHCP_MAGIC_OFFSET: usize = 236;

/// Read position over a borrowed frame
///
/// Every read is checked against the frame length and fails with an error
/// instead of reading past the end.
#[derive(Debug, Clone)]
pub struct Cursor<'b> {
    data: &'b [u8],
    pos: usize,
}

impl<'b> Cursor<'b> {
    pub fn new(data: &'b [u8]) -> Self {
        Cursor { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left from the current position
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Whether a header starting at the current position has any data
    pub fn has_data(&self) -> bool {
        self.pos < self.data.len()
    }

    fn bytes(&self, skip: usize, n: usize) -> Result<&'b [u8]> {
        let start = self.pos + skip;
        self.data.get(start..start + n).ok_or_else(|| {
            Error::parse(format!(
                "need {} bytes at offset {}, frame is {} bytes",
                n,
                start,
                self.data.len()
            ))
        })
    }

    /// Byte `skip` bytes past the current position
    pub fn peek_u8(&self, skip: usize) -> Result<u8> {
        Ok(self.bytes(skip, 1)?[0])
    }

    /// Big-endian 16-bit value `skip` bytes past the current position
    pub fn peek_u16(&self, skip: usize) -> Result<u16> {
        let b = self.bytes(skip, 2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    /// Big-endian 24-bit value `skip` bytes past the current position
    pub fn peek_u24(&self, skip: usize) -> Result<u32> {
        let b = self.bytes(skip, 3)?;
        Ok(u32::from_be_bytes([0, b[0], b[1], b[2]]))
    }

    /// Big-endian 32-bit value `skip` bytes past the current position
    pub fn peek_u32(&self, skip: usize) -> Result<u32> {
        let b = self.bytes(skip, 4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Move forward; the position may land exactly on the end of the frame
    pub fn advance(&mut self, n: usize) -> Result<()> {
        if n > self.remaining() {
            return Err(Error::parse(format!(
                "cannot advance {} bytes at offset {}, {} remain",
                n,
                self.pos,
                self.remaining()
            )));
        }
        self.pos += n;
        Ok(())
    }
}

/// Walk state: the cursor and the registry being filled in
struct Walker<'b, 'r> {
    cursor: Cursor<'b>,
    headers: &'r mut HeaderRegistry,
}

impl Walker<'_, '_> {
    /// Record `header` at the cursor, unless the frame ends there
    fn mark(&mut self, header: HeaderId) -> bool {
        if !self.cursor.has_data() {
            debug!(target: "fieldwalk::parse", "{} would start at end of frame", header);
            return false;
        }
        trace!(target: "fieldwalk::parse", "{} at offset {}", header, self.cursor.position());
        self.headers
            .mark(header, HeaderSlot::Data(self.cursor.position()));
        true
    }

    fn ethertype_missing(&mut self) {
        debug!(target: "fieldwalk::parse", "LLC frame carries no ethertype");
        self.headers.mark(HeaderId::EthertypeMissing, HeaderSlot::Marker);
    }

    /// Type/length field at the cursor, after any 802.1Q tag
    fn type_or_length(&mut self, value: u16) -> Result<()> {
        if value >= ETHERTYPE_MIN {
            if self.mark(HeaderId::Ether) {
                self.cursor.advance(2)?;
                self.ethertype(value)?;
            }
            Ok(())
        } else {
            self.llc()
        }
    }

    fn llc(&mut self) -> Result<()> {
        // The LLC header starts at the 802.3 length field.
        if !self.mark(HeaderId::Llc) {
            return Ok(());
        }
        let dsap = self.cursor.peek_u8(2).ok();
        let ssap = self.cursor.peek_u8(3).ok();
        let is_snap = |sap: Option<u8>| sap.is_some_and(|sap| SNAP_SAPS.contains(&sap));

        if (is_snap(dsap) || is_snap(ssap)) && self.cursor.advance(LLC_LEN).is_ok() {
            self.snap()
        } else {
            self.ethertype_missing();
            Ok(())
        }
    }

    fn snap(&mut self) -> Result<()> {
        if !self.mark(HeaderId::Snap) {
            self.ethertype_missing();
            return Ok(());
        }
        let (oui, protocol) = match (self.cursor.peek_u24(0), self.cursor.peek_u16(3)) {
            (Ok(oui), Ok(protocol)) => (oui, protocol),
            _ => {
                self.ethertype_missing();
                return Ok(());
            }
        };
        if oui != 0 {
            debug!(target: "fieldwalk::parse", "SNAP OUI {:06X}, protocol is not an ethertype", oui);
            self.ethertype_missing();
            return Ok(());
        }

        self.cursor.advance(3)?;
        self.mark(HeaderId::Ether);
        self.cursor.advance(SNAP_LEN - 3)?;
        self.ethertype(protocol)
    }

    fn ethertype(&mut self, value: u16) -> Result<()> {
        match EtherType::from_u16(value) {
            EtherType::ARP => {
                self.mark(HeaderId::Arp);
                Ok(())
            }
            EtherType::LLDP => {
                self.mark(HeaderId::Lldp);
                Ok(())
            }
            EtherType::IPv4 => self.ip4(),
            EtherType::IPv6 => self.ip6(),
            EtherType::SlowProtocols => self.slow_protocols(),
            other => {
                debug!(target: "fieldwalk::parse", "unrecognized ethertype {}", other);
                Ok(())
            }
        }
    }

    fn ip4(&mut self) -> Result<()> {
        if !self.mark(HeaderId::Ip4) {
            return Ok(());
        }
        let header_size = usize::from(self.cursor.peek_u8(0)? & 0x0F);
        if header_size < 5 {
            debug!(target: "fieldwalk::parse", "IPv4 header size {} is invalid", header_size);
            return Ok(());
        }
        let protocol = self.cursor.peek_u8(9)?;
        self.cursor.advance(header_size * 4)?;
        self.ip_protocol(protocol)
    }

    fn ip6(&mut self) -> Result<()> {
        if !self.mark(HeaderId::Ip6) {
            return Ok(());
        }
        let next_header = self.cursor.peek_u8(6)?;
        self.cursor.advance(IP6_HEADER_LEN)?;
        self.ip_protocol(next_header)
    }

    fn ip_protocol(&mut self, protocol: u8) -> Result<()> {
        match IpProtocol::from_u8(protocol) {
            IpProtocol::TCP => {
                if self.mark(HeaderId::Tcp) {
                    self.mark(HeaderId::L4);
                }
                Ok(())
            }
            IpProtocol::UDP => {
                if self.mark(HeaderId::Udp) {
                    self.mark(HeaderId::L4);
                    self.udp()?;
                }
                Ok(())
            }
            IpProtocol::ICMP => {
                self.mark(HeaderId::Icmp);
                Ok(())
            }
            other => {
                debug!(target: "fieldwalk::parse", "unrecognized IP protocol {}", other);
                Ok(())
            }
        }
    }

    fn udp(&mut self) -> Result<()> {
        let sport = self.cursor.peek_u16(0)?;
        let dport = self.cursor.peek_u16(2)?;
        let service = ServicePort::from_u16(sport).or_else(|| ServicePort::from_u16(dport));

        match service {
            Some(ServicePort::DhcpServer | ServicePort::DhcpClient) => {
                self.cursor.advance(UDP_HEADER_LEN)?;
                self.dhcp();
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn dhcp(&mut self) {
        if !self.mark(HeaderId::Dhcp) {
            return;
        }
        let kind = match self.cursor.peek_u32(DHCP_MAGIC_OFFSET) {
            Ok(DHCP_MAGIC_COOKIE) => DhcpKind::Dhcp,
            _ => DhcpKind::Bootp,
        };
        debug!(target: "fieldwalk::parse", "{} message", kind);
    }

    fn slow_protocols(&mut self) -> Result<()> {
        if !self.mark(HeaderId::SlowProtocols) {
            return Ok(());
        }
        let subtype = self.cursor.peek_u8(0)?;
        match SlowProtocol::from_u8(subtype) {
            SlowProtocol::LACP => {
                self.cursor.advance(1)?;
                self.mark(HeaderId::Lacp);
            }
            _ => {
                warn!(target: "fieldwalk::parse", "Slow protocol subtype 0x{:x} is not recognized", subtype);
            }
        }
        Ok(())
    }
}

fn set_meta(meta: &mut [u8; META_LEN], field: NarrowField, value: u32) -> Result<()> {
    access::field_set_header(meta, field, value)
}

impl Packet<'_> {
    /// Discover the headers present in the frame
    ///
    /// The registry is cleared first. A frame shorter than an Ethernet header
    /// fails with [`Error::Parse`] and leaves no header marked. Otherwise META
    /// and ETHERNET are always present and the walk descends as far as the
    /// frame's protocol values are recognized.
    pub fn parse(&mut self) -> Result<()> {
        let (data, meta, headers) = self.parts_mut();
        headers.reset();

        if data.len() < ETHERNET_HEADER_LEN {
            return Err(Error::parse(format!(
                "frame of {} bytes is shorter than an Ethernet header",
                data.len()
            )));
        }

        let length = u32::try_from(data.len())
            .map_err(|_| Error::parse(format!("frame of {} bytes is too long", data.len())))?;
        set_meta(meta, fields::META_PACKET_LENGTH, length)?;
        headers.mark(HeaderId::Meta, HeaderSlot::Meta);
        headers.mark(HeaderId::Ethernet, HeaderSlot::Data(0));

        let mut walker = Walker {
            cursor: Cursor::new(data),
            headers,
        };
        walker.cursor.advance(ETHERTYPE_OFFSET)?;
        let mut value = walker.cursor.peek_u16(0)?;

        let format = if EtherType::from_u16(value) == EtherType::VLAN {
            walker.mark(HeaderId::Dot1q);
            PacketFormat::Dot1q
        } else {
            PacketFormat::EtherII
        };
        set_meta(meta, fields::META_PACKET_FORMAT, u32::from(format.header() as u8))?;

        if format == PacketFormat::Dot1q {
            let resolved = walker
                .cursor
                .advance(DOT1Q_TAG_LEN)
                .and_then(|_| walker.cursor.peek_u16(0));
            match resolved {
                Ok(inner) => value = inner,
                Err(e) => {
                    debug!(target: "fieldwalk::parse", "tagged frame ends after the tag: {}", e);
                    return Ok(());
                }
            }
        }

        if let Err(e) = walker.type_or_length(value) {
            debug!(target: "fieldwalk::parse", "walk stopped early: {}", e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_reads_are_bounded() {
        let data = [0x81, 0x00, 0x13, 0xFE, 0x08];
        let mut cursor = Cursor::new(&data);
        assert_eq!(cursor.peek_u16(0).unwrap(), 0x8100);
        assert_eq!(cursor.peek_u24(1).unwrap(), 0x0013FE);
        assert_eq!(cursor.peek_u32(1).unwrap(), 0x0013FE08);
        assert!(cursor.peek_u32(2).is_err());

        cursor.advance(4).unwrap();
        assert_eq!(cursor.remaining(), 1);
        assert_eq!(cursor.peek_u8(0).unwrap(), 0x08);
        assert!(cursor.peek_u16(0).is_err());

        cursor.advance(1).unwrap();
        assert!(!cursor.has_data());
        assert!(cursor.advance(1).is_err());
        assert_eq!(cursor.position(), 5);
    }

    #[test]
    fn test_short_frame_rejected() {
        let mut data = [0u8; 13];
        let mut packet = Packet::new(&mut data);
        assert!(matches!(packet.parse(), Err(Error::Parse(_))));
        assert!(packet.headers().is_empty());
    }

    #[test]
    fn test_reparse_resets_registry() {
        let mut data = [0u8; 14];
        let mut packet = Packet::new(&mut data);
        packet.set_header(HeaderId::Tcp, Some(4)).unwrap();
        packet.parse().unwrap();
        assert!(!packet.header_exists(HeaderId::Tcp));
        assert!(packet.header_exists(HeaderId::Ethernet));
    }

    #[test]
    fn test_tag_at_end_of_frame() {
        let mut data = [0u8; 16];
        data[12] = 0x81;
        let mut packet = Packet::new(&mut data);
        packet.parse().unwrap();
        assert!(packet.header_exists(HeaderId::Dot1q));
        assert!(!packet.header_exists(HeaderId::Ether));
        assert!(!packet.header_exists(HeaderId::Llc));
    }

    #[test]
    fn test_ethertype_at_end_of_frame() {
        let mut data = [0u8; 14];
        data[12] = 0x08;
        let mut packet = Packet::new(&mut data);
        packet.parse().unwrap();
        assert!(packet.header_exists(HeaderId::Ether));
        // IPv4 would start past the end of the frame.
        assert!(!packet.header_exists(HeaderId::Ip4));
    }

    #[test]
    fn test_truncated_ip_options() {
        let mut data = hex_frame("000000000001000000000002 0800 4F000000000000000006");
        let mut packet = Packet::new(&mut data);
        packet.parse().unwrap();
        assert!(packet.header_exists(HeaderId::Ip4));
        assert!(!packet.header_exists(HeaderId::Tcp));
    }

    #[test]
    fn test_invalid_ip_header_size() {
        let mut data = hex_frame("000000000001000000000002 0800 44000000000000000006 0000000000000000000000000000");
        let mut packet = Packet::new(&mut data);
        packet.parse().unwrap();
        assert!(packet.header_exists(HeaderId::Ip4));
        assert!(!packet.header_exists(HeaderId::Tcp));
        assert!(!packet.header_exists(HeaderId::L4));
    }

    #[test]
    fn test_unknown_slow_protocol() {
        let mut data = hex_frame("0180C2000002 000000000002 8809 0A 0102");
        let mut packet = Packet::new(&mut data);
        packet.parse().unwrap();
        assert!(packet.header_exists(HeaderId::SlowProtocols));
        assert!(!packet.header_exists(HeaderId::Lacp));
    }

    #[test]
    fn test_llc_without_saps() {
        let mut data = hex_frame("000000000001000000000002 0003");
        let mut packet = Packet::new(&mut data);
        packet.parse().unwrap();
        assert!(packet.header_exists(HeaderId::Llc));
        assert!(packet.header_exists(HeaderId::EthertypeMissing));
        assert!(packet.header_bytes(HeaderId::EthertypeMissing).unwrap().is_empty());
    }

    #[test]
    fn test_set_meta_writes_storage() {
        let mut meta = [0u8; META_LEN];
        set_meta(&mut meta, fields::META_PACKET_LENGTH, 0x0102_0304).unwrap();
        set_meta(&mut meta, fields::META_PACKET_FORMAT, 0x0A).unwrap();
        assert_eq!(meta, [0, 0, 0, 0, 1, 2, 3, 4, 0, 0, 0, 0x0A]);
    }

    fn hex_frame(text: &str) -> Vec<u8> {
        let digits: String = text.split_whitespace().collect();
        hex::decode(digits).unwrap()
    }
}
