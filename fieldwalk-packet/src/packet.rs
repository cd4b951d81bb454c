//! Packets and their header registry
//!
//! A [`Packet`] wraps one frame buffer together with a registry of the headers
//! found in it. The buffer is either borrowed from the caller (the common,
//! zero-copy case) or owned by the packet after a duplicate or a format change
//! that needed more room.

use crate::access;
use crate::catalog::{FieldId, FieldInfo, NarrowField, WideField};
use crate::header::{HeaderId, HeaderMask};
use bytes::BytesMut;
use fieldwalk_core::{Error, MacAddr, Result};
use std::fmt;
use std::ops::{Deref, DerefMut};

/// Size of the synthetic META header storage
pub const META_LEN: usize = 12;

/// Frame storage of a packet
#[derive(Debug)]
pub enum PacketBuffer<'a> {
    /// Caller memory, never freed by the engine
    Borrowed(&'a mut [u8]),
    /// Engine allocation, freed with the packet
    Owned(BytesMut),
}

impl PacketBuffer<'_> {
    pub fn is_owned(&self) -> bool {
        matches!(self, PacketBuffer::Owned(_))
    }

    /// Copy into a buffer that does not borrow from the caller
    pub fn to_owned_buffer(&self) -> PacketBuffer<'static> {
        PacketBuffer::Owned(BytesMut::from(&self[..]))
    }
}

impl Deref for PacketBuffer<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            PacketBuffer::Borrowed(data) => data,
            PacketBuffer::Owned(data) => data,
        }
    }
}

impl DerefMut for PacketBuffer<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        match self {
            PacketBuffer::Borrowed(data) => data,
            PacketBuffer::Owned(data) => data,
        }
    }
}

/// Outer framing of a packet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketFormat {
    /// Untagged Ethernet II
    EtherII,
    /// Single 802.1Q tag
    Dot1q,
}

impl PacketFormat {
    /// Header identifier naming this format
    pub const fn header(self) -> HeaderId {
        match self {
            PacketFormat::EtherII => HeaderId::EtherII,
            PacketFormat::Dot1q => HeaderId::Dot1q,
        }
    }
}

impl TryFrom<HeaderId> for PacketFormat {
    type Error = Error;

    fn try_from(header: HeaderId) -> Result<Self> {
        match header {
            HeaderId::EtherII => Ok(PacketFormat::EtherII),
            HeaderId::Dot1q => Ok(PacketFormat::Dot1q),
            other => Err(Error::UnsupportedFormat(other.name().to_string())),
        }
    }
}

impl fmt::Display for PacketFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header().name())
    }
}

/// Where a present header's bytes live
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum HeaderSlot {
    /// Offset into the frame buffer
    Data(usize),
    /// The packet's META storage
    Meta,
    /// Caller-supplied bytes outside the frame
    Detached(BytesMut),
    /// Presence only, no storage
    Marker,
}

/// Present headers and where each one starts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderRegistry {
    slots: [Option<HeaderSlot>; HeaderId::COUNT],
    mask: HeaderMask,
}

impl HeaderRegistry {
    pub fn mask(&self) -> HeaderMask {
        self.mask
    }

    pub fn contains(&self, header: HeaderId) -> bool {
        self.mask.contains(header)
    }

    /// Offset of a header inside the frame buffer
    pub fn offset(&self, header: HeaderId) -> Option<usize> {
        match self.slots[header.index()] {
            Some(HeaderSlot::Data(offset)) => Some(offset),
            _ => None,
        }
    }

    pub fn reset(&mut self) {
        self.slots = Default::default();
        self.mask.clear();
    }

    pub(crate) fn slot(&self, header: HeaderId) -> Option<&HeaderSlot> {
        self.slots[header.index()].as_ref()
    }

    pub(crate) fn mark(&mut self, header: HeaderId, slot: HeaderSlot) {
        self.slots[header.index()] = Some(slot);
        self.mask.insert(header);
    }

    pub(crate) fn unmark(&mut self, header: HeaderId) {
        self.slots[header.index()] = None;
        self.mask.remove(header);
    }
}

/// A frame and the headers recognized in it
pub struct Packet<'a> {
    buffer: PacketBuffer<'a>,
    meta: [u8; META_LEN],
    headers: HeaderRegistry,
}

impl<'a> Packet<'a> {
    /// Wrap caller memory without parsing it
    pub fn new(data: &'a mut [u8]) -> Self {
        Self::with_buffer(PacketBuffer::Borrowed(data))
    }

    pub fn with_buffer(buffer: PacketBuffer<'a>) -> Self {
        Packet {
            buffer,
            meta: [0; META_LEN],
            headers: HeaderRegistry::default(),
        }
    }

    /// Wrap and parse caller memory
    pub fn parsed(data: &'a mut [u8]) -> Result<Self> {
        let mut packet = Self::new(data);
        packet.parse()?;
        Ok(packet)
    }

    /// Frame bytes
    pub fn data(&self) -> &[u8] {
        &self.buffer
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Whether the engine allocated the current buffer
    pub fn is_owned(&self) -> bool {
        self.buffer.is_owned()
    }

    pub fn buffer(&self) -> &PacketBuffer<'a> {
        &self.buffer
    }

    /// Release the packet, handing back its frame storage
    pub fn into_buffer(self) -> PacketBuffer<'a> {
        self.buffer
    }

    pub(crate) fn buffer_mut(&mut self) -> &mut PacketBuffer<'a> {
        &mut self.buffer
    }

    pub(crate) fn replace_buffer(&mut self, buffer: PacketBuffer<'a>) -> PacketBuffer<'a> {
        std::mem::replace(&mut self.buffer, buffer)
    }

    pub fn registry(&self) -> &HeaderRegistry {
        &self.headers
    }

    /// Split borrow used by the protocol walker
    pub(crate) fn parts_mut(&mut self) -> (&[u8], &mut [u8; META_LEN], &mut HeaderRegistry) {
        (&*self.buffer, &mut self.meta, &mut self.headers)
    }

    /// Present headers
    pub fn headers(&self) -> HeaderMask {
        self.headers.mask()
    }

    pub fn header_exists(&self, header: HeaderId) -> bool {
        self.headers.contains(header)
    }

    /// Whether the field's header is present and holds every byte of the field
    ///
    /// A header cut short by the end of the frame only reports the fields it
    /// fully contains. Always false for reserved fields.
    pub fn field_exists(&self, field: impl Into<FieldId>) -> bool {
        let info = match field.into().info() {
            Ok(info) => info,
            Err(_) => return false,
        };
        match self.header_bytes(info.header) {
            Ok(bytes) => info.offset + info.span() <= bytes.len(),
            Err(_) => false,
        }
    }

    /// Mark `header` present at `start`, or absent when `start` is `None`
    ///
    /// META is always backed by the packet's own META storage, so its start
    /// offset is ignored.
    pub fn set_header(&mut self, header: HeaderId, start: Option<usize>) -> Result<()> {
        match (header, start) {
            (_, None) => self.headers.unmark(header),
            (HeaderId::Meta, Some(_)) => self.headers.mark(header, HeaderSlot::Meta),
            (_, Some(offset)) if offset >= self.len() => {
                return Err(Error::InvalidHeaderOffset {
                    offset,
                    len: self.len(),
                });
            }
            (_, Some(offset)) => self.headers.mark(header, HeaderSlot::Data(offset)),
        }
        Ok(())
    }

    /// Mark `header` present with storage outside the frame
    ///
    /// Used to address a header in isolation, for example an OF10 match
    /// structure built by the caller.
    pub fn set_detached_header(&mut self, header: HeaderId, data: impl Into<BytesMut>) {
        self.headers
            .mark(header, HeaderSlot::Detached(data.into()));
    }

    /// Bytes from the start of a present header to the end of its storage
    pub fn header_bytes(&self, header: HeaderId) -> Result<&[u8]> {
        match self.headers.slot(header) {
            Some(HeaderSlot::Data(offset)) => Ok(self.buffer.get(*offset..).unwrap_or_default()),
            Some(HeaderSlot::Meta) => Ok(&self.meta[..]),
            Some(HeaderSlot::Detached(data)) => Ok(&data[..]),
            Some(HeaderSlot::Marker) => Ok(&[]),
            None => Err(Error::HeaderAbsent {
                header: header.name(),
            }),
        }
    }

    pub fn header_bytes_mut(&mut self, header: HeaderId) -> Result<&mut [u8]> {
        match self.headers.slots[header.index()].as_mut() {
            Some(HeaderSlot::Data(offset)) => {
                Ok(self.buffer.get_mut(*offset..).unwrap_or_default())
            }
            Some(HeaderSlot::Meta) => Ok(&mut self.meta[..]),
            Some(HeaderSlot::Detached(data)) => Ok(&mut data[..]),
            Some(HeaderSlot::Marker) => Ok(&mut []),
            None => Err(Error::HeaderAbsent {
                header: header.name(),
            }),
        }
    }

    /// Read a narrow field
    pub fn get(&self, field: NarrowField) -> Result<u32> {
        let info = field.info();
        access::read_narrow(self.header_bytes(info.header)?, info)
    }

    /// Write a narrow field, leaving neighbouring bits untouched
    pub fn set(&mut self, field: NarrowField, value: u32) -> Result<()> {
        let info = field.info();
        access::write_narrow(self.header_bytes_mut(info.header)?, info, value)
    }

    /// Copy a wide field into `dst`
    pub fn get_wide(&self, field: WideField, dst: &mut [u8]) -> Result<()> {
        let info = field.info();
        access::read_wide(self.header_bytes(info.header)?, info, dst)
    }

    /// Overwrite a wide field from `src`, or zero it when `src` is `None`
    pub fn set_wide(&mut self, field: WideField, src: Option<&[u8]>) -> Result<()> {
        let info = field.info();
        access::write_wide(self.header_bytes_mut(info.header)?, info, src)
    }

    /// Read a narrow field by identifier
    pub fn field_get(&self, field: FieldId) -> Result<u32> {
        self.get(field.narrow()?)
    }

    /// Write a narrow field by identifier
    pub fn field_set(&mut self, field: FieldId, value: u32) -> Result<()> {
        self.set(field.narrow()?, value)
    }

    /// Copy a narrow field's value into another narrow field
    pub fn field_copy(&mut self, dst: FieldId, src: FieldId) -> Result<()> {
        let dst = dst.narrow()?;
        let value = self.field_get(src)?;
        self.set(dst, value)
    }

    /// Read a wide field by identifier
    pub fn wide_field_get(&self, field: FieldId, dst: &mut [u8]) -> Result<()> {
        self.get_wide(field.wide()?, dst)
    }

    /// Write a wide field by identifier
    pub fn wide_field_set(&mut self, field: FieldId, src: Option<&[u8]>) -> Result<()> {
        self.set_wide(field.wide()?, src)
    }

    /// Copy a wide field into another wide field of the same size
    pub fn wide_field_copy(&mut self, dst: FieldId, src: FieldId) -> Result<()> {
        let dst = dst.wide()?;
        let src = src.wide()?;
        if dst.len() != src.len() {
            return Err(Error::BufferTooSmall {
                needed: dst.len(),
                actual: src.len(),
            });
        }
        let mut value = vec![0u8; src.len()];
        self.get_wide(src, &mut value)?;
        self.set_wide(dst, Some(&value[..]))
    }

    /// Packet bytes starting at the field's first covering byte
    pub fn field_bytes(&self, field: FieldId) -> Result<&[u8]> {
        let info = field.info()?;
        let header = self.header_bytes(info.header)?;
        header.get(info.offset..).ok_or(Error::FieldOutOfBounds {
            field: field.name(),
            end: info.offset,
            len: header.len(),
        })
    }

    /// Read a 48-bit field as a MAC address
    pub fn mac(&self, field: WideField) -> Result<MacAddr> {
        let mut bytes = vec![0u8; field.len()];
        self.get_wide(field, &mut bytes)?;
        MacAddr::from_slice(&bytes).ok_or(Error::BufferTooSmall {
            needed: bytes.len(),
            actual: 6,
        })
    }

    /// Descriptor and value of every readable field of a present header
    pub(crate) fn present_fields(&self) -> impl Iterator<Item = &'static FieldInfo> + '_ {
        crate::catalog::iter().filter(move |info| self.header_exists(info.header))
    }

    /// Current framing, from the 802.1Q presence bit
    pub fn format(&self) -> PacketFormat {
        if self.header_exists(HeaderId::Dot1q) {
            PacketFormat::Dot1q
        } else {
            PacketFormat::EtherII
        }
    }

    /// Deep copy into an owned packet and parse the copy
    ///
    /// The META storage travels with the copy, so an ingress port set on the
    /// source is preserved.
    pub fn duplicate(&self) -> Result<Packet<'static>> {
        let mut dup = Packet::with_buffer(self.buffer.to_owned_buffer());
        dup.meta = self.meta;
        dup.headers.mask = self.headers.mask;
        dup.parse()?;
        Ok(dup)
    }
}

impl fmt::Debug for Packet<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Packet")
            .field("len", &self.len())
            .field("owned", &self.is_owned())
            .field("headers", &self.headers.mask())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fields;

    #[test]
    fn test_new_packet_has_no_headers() {
        let mut data = [0u8; 20];
        let packet = Packet::new(&mut data);
        assert!(packet.headers().is_empty());
        assert!(!packet.is_owned());
        assert_eq!(packet.len(), 20);
        assert!(!packet.field_exists(FieldId::EtherType));
        assert_eq!(
            packet.field_get(FieldId::EtherType),
            Err(Error::HeaderAbsent { header: "ETHER" })
        );
    }

    #[test]
    fn test_set_header_and_access() {
        let mut data = [0u8; 8];
        let mut packet = Packet::new(&mut data);
        packet.set_header(HeaderId::Udp, Some(0)).unwrap();
        assert!(packet.header_exists(HeaderId::Udp));
        assert_eq!(packet.registry().offset(HeaderId::Udp), Some(0));

        packet.set(fields::UDP_DST_PORT, 53).unwrap();
        assert_eq!(packet.get(fields::UDP_DST_PORT).unwrap(), 53);
        assert_eq!(packet.data()[2..4], [0x00, 0x35]);

        packet.set_header(HeaderId::Udp, None).unwrap();
        assert!(!packet.header_exists(HeaderId::Udp));
        assert!(packet.get(fields::UDP_DST_PORT).is_err());
    }

    #[test]
    fn test_set_header_out_of_range() {
        let mut data = [0u8; 8];
        let mut packet = Packet::new(&mut data);
        assert_eq!(
            packet.set_header(HeaderId::Tcp, Some(8)),
            Err(Error::InvalidHeaderOffset { offset: 8, len: 8 })
        );
        assert!(!packet.header_exists(HeaderId::Tcp));
    }

    #[test]
    fn test_width_class_checked_at_runtime() {
        let mut data = [0u8; 14];
        let mut packet = Packet::new(&mut data);
        packet.set_header(HeaderId::Ethernet, Some(0)).unwrap();
        assert_eq!(
            packet.field_get(FieldId::EthernetDstMac),
            Err(Error::FieldTooWide("ETHERNET_DST_MAC"))
        );
        assert_eq!(
            packet.field_get(FieldId::MetaFieldCount),
            Err(Error::UnknownField(FieldId::MetaFieldCount.id()))
        );
        let mut out = [0u8; 6];
        assert!(packet.wide_field_get(FieldId::EtherType, &mut out).is_err());
    }

    #[test]
    fn test_meta_storage_is_separate() {
        let mut data = [0u8; 4];
        let mut packet = Packet::new(&mut data);
        packet.set_header(HeaderId::Meta, Some(0)).unwrap();
        packet.set(fields::META_INGRESS_PORT, 7).unwrap();
        assert_eq!(packet.get(fields::META_INGRESS_PORT).unwrap(), 7);
        assert_eq!(packet.data(), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_detached_header() {
        let mut data = [0u8; 1];
        let mut packet = Packet::new(&mut data);
        packet.set_detached_header(HeaderId::Of10, &[0u8; 54][..]);
        packet.set(fields::OF10_VLAN, 0x11).unwrap();
        assert_eq!(packet.get(fields::OF10_VLAN).unwrap(), 0x11);
        assert_eq!(packet.header_bytes(HeaderId::Of10).unwrap()[15], 0x11);
    }

    #[test]
    fn test_field_copy_across_headers() {
        let mut data = [0u8; 28];
        let mut packet = Packet::new(&mut data);
        packet.set_header(HeaderId::Tcp, Some(0)).unwrap();
        packet.set_header(HeaderId::Udp, Some(20)).unwrap();
        packet.set(fields::TCP_SRC_PORT, 0xDEAD).unwrap();

        packet.field_copy(FieldId::UdpDstPort, FieldId::TcpSrcPort).unwrap();
        assert_eq!(packet.get(fields::UDP_DST_PORT).unwrap(), 0xDEAD);

        packet.set_header(HeaderId::Tcp, None).unwrap();
        assert!(packet
            .field_copy(FieldId::UdpDstPort, FieldId::TcpSrcPort)
            .unwrap_err()
            .is_absent());
    }

    #[test]
    fn test_wide_field_copy() {
        let mut data = [0u8; 28];
        data[8..14].copy_from_slice(&[1, 2, 3, 4, 5, 6]);
        let mut packet = Packet::new(&mut data);
        packet.set_header(HeaderId::Arp, Some(0)).unwrap();

        packet.wide_field_copy(FieldId::ArpTha, FieldId::ArpSha).unwrap();
        assert_eq!(
            packet.mac(fields::ARP_THA).unwrap(),
            MacAddr::new([1, 2, 3, 4, 5, 6])
        );
        assert!(packet
            .wide_field_copy(FieldId::Ip6SrcAddr, FieldId::ArpSha)
            .is_err());
    }

    #[test]
    fn test_mac_needs_six_byte_field() {
        let mut data = [0u8; 40];
        data[8] = 0xFE;
        let mut packet = Packet::new(&mut data);
        packet.set_header(HeaderId::Ip6, Some(0)).unwrap();
        assert_eq!(
            packet.mac(fields::IP6_SRC_ADDR),
            Err(Error::BufferTooSmall {
                needed: 16,
                actual: 6
            })
        );

        packet.set_header(HeaderId::Ethernet, Some(0)).unwrap();
        assert_eq!(
            packet.mac(fields::ETHERNET_SRC_MAC).unwrap(),
            MacAddr::new([0, 0, 0xFE, 0, 0, 0])
        );
    }

    #[test]
    fn test_field_bytes() {
        let mut data = [0u8; 20];
        data[12..16].copy_from_slice(&[10, 0, 0, 1]);
        let mut packet = Packet::new(&mut data);
        packet.set_header(HeaderId::Ip4, Some(0)).unwrap();
        assert_eq!(
            &packet.field_bytes(FieldId::Ip4SrcAddr).unwrap()[..4],
            &[10, 0, 0, 1]
        );
    }

    #[test]
    fn test_format_from_header() {
        assert_eq!(
            PacketFormat::try_from(HeaderId::Dot1q).unwrap(),
            PacketFormat::Dot1q
        );
        assert_eq!(
            PacketFormat::try_from(HeaderId::InnerDot1q),
            Err(Error::UnsupportedFormat("INNER_8021Q".to_string()))
        );
        assert_eq!(PacketFormat::EtherII.to_string(), "ETHERII");
    }
}
