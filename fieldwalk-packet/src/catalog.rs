//! Field catalog
//!
//! Static metadata for every addressable field: the header it lives in, the
//! byte offset of its first covering byte from the header start, its width in
//! bits and the shift of its least significant bit inside the covering bytes.
//!
//! Fields of 32 bits or less are *narrow* and are read and written as integers.
//! Wider fields are *wide*, always byte aligned, and are copied as raw bytes.
//! A width of zero marks a reserved identifier that addresses nothing.
//!
//! Statically known fields are also exported as typed handles in [`fields`], so
//! the accessor class is checked by the compiler:
//!
//! ```
//! use fieldwalk_packet::catalog::{fields, FieldId};
//!
//! let vlan = fields::DOT1Q_VLAN;
//! assert_eq!(vlan.info().width, 12);
//! assert_eq!(FieldId::from(fields::ETHERNET_DST_MAC).name(), "ETHERNET_DST_MAC");
//! ```

use crate::header::HeaderId;
use fieldwalk_core::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Largest narrow field, in bits
pub const NARROW_MAX_BITS: u32 = 32;

/// Descriptor of one catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldInfo {
    pub field: FieldId,
    /// Header this field resides in
    pub header: HeaderId,
    /// Offset of the first byte holding field data, from the header start
    pub offset: usize,
    /// Size in bits, zero for reserved identifiers
    pub width: u32,
    /// Position of the field's LSB inside its covering bytes
    pub shift: u32,
}

/// Access class of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldLayout {
    Narrow,
    Wide,
}

impl FieldInfo {
    pub const fn is_reserved(&self) -> bool {
        self.width == 0
    }

    pub const fn is_wide(&self) -> bool {
        self.width > NARROW_MAX_BITS
    }

    /// Access class, `None` for reserved identifiers
    pub const fn layout(&self) -> Option<FieldLayout> {
        if self.is_reserved() {
            None
        } else if self.is_wide() {
            Some(FieldLayout::Wide)
        } else {
            Some(FieldLayout::Narrow)
        }
    }

    /// Offset in bits from the header start to the first covering byte
    pub const fn bit_offset(&self) -> usize {
        self.offset * 8
    }

    /// Whole bytes needed to hold the value, `ceil(width / 8)`
    pub const fn byte_width(&self) -> usize {
        (self.width as usize + 7) / 8
    }

    /// Bytes of packet data the field touches
    pub const fn span(&self) -> usize {
        (self.width as usize + self.shift as usize + 7) / 8
    }

    /// Value mask for a narrow field
    pub const fn mask(&self) -> u32 {
        if self.width >= 32 {
            u32::MAX
        } else {
            (1u32 << self.width) - 1
        }
    }
}

/// Narrow field handle, usable only with integer accessors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NarrowField(FieldId);

/// Wide field handle, usable only with byte accessors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WideField(FieldId);

impl NarrowField {
    pub const fn id(self) -> FieldId {
        self.0
    }

    pub fn info(self) -> &'static FieldInfo {
        self.0.entry()
    }
}

impl WideField {
    pub const fn id(self) -> FieldId {
        self.0
    }

    pub fn info(self) -> &'static FieldInfo {
        self.0.entry()
    }

    /// Size of the field in bytes
    pub fn len(self) -> usize {
        self.info().byte_width()
    }
}

impl From<NarrowField> for FieldId {
    fn from(field: NarrowField) -> Self {
        field.0
    }
}

impl From<WideField> for FieldId {
    fn from(field: WideField) -> Self {
        field.0
    }
}

macro_rules! field_handle {
    (narrow $konst:ident $variant:ident $width:expr) => {
        pub const $konst: NarrowField = NarrowField(FieldId::$variant);
        const _: () = assert!($width > 0 && $width <= NARROW_MAX_BITS);
    };
    (wide $konst:ident $variant:ident $width:expr) => {
        pub const $konst: WideField = WideField(FieldId::$variant);
        const _: () = assert!($width > NARROW_MAX_BITS && $width % 8 == 0);
    };
    (reserved $konst:ident $variant:ident $width:expr) => {
        const _: () = assert!($width == 0);
    };
}

macro_rules! field_catalog {
    ($(
        $variant:ident, $konst:ident, $text:literal =>
            $kind:ident($header:ident, $offset:expr, $width:expr, $shift:expr);
    )*) => {
        /// Field identifiers, in stable order
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u16)]
        pub enum FieldId {
            $( $variant, )*
        }

        impl FieldId {
            /// Every identifier, reserved ones included
            pub const ALL: &'static [FieldId] = &[ $( FieldId::$variant, )* ];

            /// Canonical upper-case name
            pub const fn name(self) -> &'static str {
                match self {
                    $( FieldId::$variant => $text, )*
                }
            }
        }

        static CATALOG: &[FieldInfo] = &[
            $(
                FieldInfo {
                    field: FieldId::$variant,
                    header: HeaderId::$header,
                    offset: $offset,
                    width: $width,
                    shift: $shift,
                },
            )*
        ];

        /// Typed handles for every non-reserved field
        pub mod fields {
            use super::{FieldId, NarrowField, WideField, NARROW_MAX_BITS};

            $( field_handle!($kind $konst $variant $width); )*
        }
    };
}

field_catalog! {
    MetaIngressPort, META_INGRESS_PORT, "META_INGRESS_PORT" => narrow(Meta, 0, 32, 0);
    MetaPacketLength, META_PACKET_LENGTH, "META_PACKET_LENGTH" => narrow(Meta, 4, 32, 0);
    MetaPacketFormat, META_PACKET_FORMAT, "META_PACKET_FORMAT" => narrow(Meta, 8, 32, 0);
    MetaFieldCount, META_FIELD_COUNT, "META_FIELD_COUNT" => reserved(Meta, 0, 0, 0);

    EthernetDstMac, ETHERNET_DST_MAC, "ETHERNET_DST_MAC" => wide(Ethernet, 0, 48, 0);
    EthernetSrcMac, ETHERNET_SRC_MAC, "ETHERNET_SRC_MAC" => wide(Ethernet, 6, 48, 0);
    EtherType, ETHER_TYPE, "ETHER_TYPE" => narrow(Ether, 0, 16, 0);

    Dot1qTpid, DOT1Q_TPID, "8021Q_TPID" => narrow(Dot1q, 0, 16, 0);
    Dot1qPri, DOT1Q_PRI, "8021Q_PRI" => narrow(Dot1q, 2, 3, 5);
    Dot1qCfi, DOT1Q_CFI, "8021Q_CFI" => narrow(Dot1q, 2, 1, 4);
    Dot1qVlan, DOT1Q_VLAN, "8021Q_VLAN" => narrow(Dot1q, 2, 12, 0);
    OuterDot1qTpid, OUTER_DOT1Q_TPID, "OUTER_8021Q_TPID" => narrow(OuterDot1q, 0, 16, 0);
    OuterDot1qPri, OUTER_DOT1Q_PRI, "OUTER_8021Q_PRI" => narrow(OuterDot1q, 2, 3, 5);
    OuterDot1qCfi, OUTER_DOT1Q_CFI, "OUTER_8021Q_CFI" => narrow(OuterDot1q, 2, 1, 4);
    OuterDot1qVlan, OUTER_DOT1Q_VLAN, "OUTER_8021Q_VLAN" => narrow(OuterDot1q, 2, 12, 0);
    InnerDot1qTpid, INNER_DOT1Q_TPID, "INNER_8021Q_TPID" => narrow(InnerDot1q, 0, 16, 0);
    InnerDot1qPri, INNER_DOT1Q_PRI, "INNER_8021Q_PRI" => narrow(InnerDot1q, 2, 3, 5);
    InnerDot1qCfi, INNER_DOT1Q_CFI, "INNER_8021Q_CFI" => narrow(InnerDot1q, 2, 1, 4);
    InnerDot1qVlan, INNER_DOT1Q_VLAN, "INNER_8021Q_VLAN" => narrow(InnerDot1q, 2, 12, 0);

    LlcLength, LLC_LENGTH, "LLC_LENGTH" => narrow(Llc, 0, 16, 0);
    LlcDsap, LLC_DSAP, "LLC_DSAP" => narrow(Llc, 2, 8, 0);
    LlcSsap, LLC_SSAP, "LLC_SSAP" => narrow(Llc, 3, 8, 0);
    LlcControl, LLC_CONTROL, "LLC_CONTROL" => narrow(Llc, 4, 8, 0);
    SnapOui, SNAP_OUI, "SNAP_OUI" => narrow(Snap, 0, 24, 0);
    SnapProtocol, SNAP_PROTOCOL, "SNAP_PROTOCOL" => narrow(Snap, 3, 16, 0);

    ArpHtype, ARP_HTYPE, "ARP_HTYPE" => narrow(Arp, 0, 16, 0);
    ArpPtype, ARP_PTYPE, "ARP_PTYPE" => narrow(Arp, 2, 16, 0);
    ArpHlen, ARP_HLEN, "ARP_HLEN" => narrow(Arp, 4, 8, 0);
    ArpPlen, ARP_PLEN, "ARP_PLEN" => narrow(Arp, 5, 8, 0);
    ArpOperation, ARP_OPERATION, "ARP_OPERATION" => narrow(Arp, 6, 16, 0);
    ArpSha, ARP_SHA, "ARP_SHA" => wide(Arp, 8, 48, 0);
    ArpSpa, ARP_SPA, "ARP_SPA" => narrow(Arp, 14, 32, 0);
    ArpTha, ARP_THA, "ARP_THA" => wide(Arp, 18, 48, 0);
    ArpTpa, ARP_TPA, "ARP_TPA" => narrow(Arp, 24, 32, 0);

    DhcpOpcode, DHCP_OPCODE, "DHCP_OPCODE" => narrow(Dhcp, 0, 8, 0);
    DhcpHtype, DHCP_HTYPE, "DHCP_HTYPE" => narrow(Dhcp, 1, 8, 0);
    DhcpHlen, DHCP_HLEN, "DHCP_HLEN" => narrow(Dhcp, 2, 8, 0);
    DhcpHops, DHCP_HOPS, "DHCP_HOPS" => narrow(Dhcp, 3, 8, 0);
    DhcpXid, DHCP_XID, "DHCP_XID" => narrow(Dhcp, 4, 32, 0);
    DhcpSeconds, DHCP_SECONDS, "DHCP_SECONDS" => narrow(Dhcp, 8, 16, 0);
    DhcpFlags, DHCP_FLAGS, "DHCP_FLAGS" => narrow(Dhcp, 10, 16, 0);
    DhcpCiaddr, DHCP_CIADDR, "DHCP_CIADDR" => narrow(Dhcp, 12, 32, 0);
    DhcpYiaddr, DHCP_YIADDR, "DHCP_YIADDR" => narrow(Dhcp, 16, 32, 0);
    DhcpSiaddr, DHCP_SIADDR, "DHCP_SIADDR" => narrow(Dhcp, 20, 32, 0);
    DhcpGiaddr, DHCP_GIADDR, "DHCP_GIADDR" => narrow(Dhcp, 24, 32, 0);
    DhcpChaddr, DHCP_CHADDR, "DHCP_CHADDR" => wide(Dhcp, 28, 128, 0);
    DhcpSname, DHCP_SNAME, "DHCP_SNAME" => wide(Dhcp, 44, 512, 0);
    DhcpBootf, DHCP_BOOTF, "DHCP_BOOTF" => wide(Dhcp, 108, 1024, 0);
    DhcpMagic, DHCP_MAGIC, "DHCP_MAGIC" => narrow(Dhcp, 236, 32, 0);
    DhcpOptions, DHCP_OPTIONS, "DHCP_OPTIONS" => narrow(Dhcp, 240, 8, 0);

    IcmpType, ICMP_TYPE, "ICMP_TYPE" => narrow(Icmp, 0, 8, 0);
    IcmpCode, ICMP_CODE, "ICMP_CODE" => narrow(Icmp, 1, 8, 0);
    IcmpChecksum, ICMP_CHECKSUM, "ICMP_CHECKSUM" => narrow(Icmp, 2, 16, 0);
    IcmpHeaderData, ICMP_HEADER_DATA, "ICMP_HEADER_DATA" => narrow(Icmp, 4, 32, 0);
    IcmpPayload, ICMP_PAYLOAD, "ICMP_PAYLOAD" => narrow(Icmp, 8, 8, 0);

    Ip4Version, IP4_VERSION, "IP4_VERSION" => narrow(Ip4, 0, 4, 4);
    Ip4HeaderSize, IP4_HEADER_SIZE, "IP4_HEADER_SIZE" => narrow(Ip4, 0, 4, 0);
    Ip4Tos, IP4_TOS, "IP4_TOS" => narrow(Ip4, 1, 8, 0);
    Ip4TotalLength, IP4_TOTAL_LENGTH, "IP4_TOTAL_LENGTH" => narrow(Ip4, 2, 16, 0);
    Ip4Ttl, IP4_TTL, "IP4_TTL" => narrow(Ip4, 8, 8, 0);
    Ip4Protocol, IP4_PROTOCOL, "IP4_PROTOCOL" => narrow(Ip4, 9, 8, 0);
    Ip4Checksum, IP4_CHECKSUM, "IP4_CHECKSUM" => narrow(Ip4, 10, 16, 0);
    Ip4SrcAddr, IP4_SRC_ADDR, "IP4_SRC_ADDR" => narrow(Ip4, 12, 32, 0);
    Ip4DstAddr, IP4_DST_ADDR, "IP4_DST_ADDR" => narrow(Ip4, 16, 32, 0);

    Ip6Version, IP6_VERSION, "IP6_VERSION" => narrow(Ip6, 0, 4, 4);
    Ip6TrafficClassU, IP6_TRAFFIC_CLASS_U, "IP6_TRAFFIC_CLASS_U" => narrow(Ip6, 0, 4, 0);
    Ip6TrafficClassL, IP6_TRAFFIC_CLASS_L, "IP6_TRAFFIC_CLASS_L" => narrow(Ip6, 1, 4, 4);
    Ip6FlowLabelU, IP6_FLOW_LABEL_U, "IP6_FLOW_LABEL_U" => narrow(Ip6, 1, 4, 0);
    Ip6FlowLabelL, IP6_FLOW_LABEL_L, "IP6_FLOW_LABEL_L" => narrow(Ip6, 2, 16, 0);
    Ip6PayloadLength, IP6_PAYLOAD_LENGTH, "IP6_PAYLOAD_LENGTH" => narrow(Ip6, 4, 16, 0);
    Ip6NextHeader, IP6_NEXT_HEADER, "IP6_NEXT_HEADER" => narrow(Ip6, 6, 8, 0);
    Ip6HopLimit, IP6_HOP_LIMIT, "IP6_HOP_LIMIT" => narrow(Ip6, 7, 8, 0);
    Ip6SrcAddr, IP6_SRC_ADDR, "IP6_SRC_ADDR" => wide(Ip6, 8, 128, 0);
    Ip6DstAddr, IP6_DST_ADDR, "IP6_DST_ADDR" => wide(Ip6, 24, 128, 0);

    TcpSrcPort, TCP_SRC_PORT, "TCP_SRC_PORT" => narrow(Tcp, 0, 16, 0);
    TcpDstPort, TCP_DST_PORT, "TCP_DST_PORT" => narrow(Tcp, 2, 16, 0);
    TcpSequenceNum, TCP_SEQUENCE_NUM, "TCP_SEQUENCE_NUM" => narrow(Tcp, 4, 32, 0);
    TcpAcknum, TCP_ACKNUM, "TCP_ACKNUM" => narrow(Tcp, 8, 32, 0);
    TcpFlags, TCP_FLAGS, "TCP_FLAGS" => narrow(Tcp, 12, 12, 0);
    TcpWindow, TCP_WINDOW, "TCP_WINDOW" => narrow(Tcp, 14, 16, 0);
    TcpChecksum, TCP_CHECKSUM, "TCP_CHECKSUM" => narrow(Tcp, 16, 16, 0);
    TcpUrgent, TCP_URGENT, "TCP_URGENT" => narrow(Tcp, 18, 16, 0);
    TcpOptions, TCP_OPTIONS, "TCP_OPTIONS" => narrow(Tcp, 20, 32, 0);

    UdpSrcPort, UDP_SRC_PORT, "UDP_SRC_PORT" => narrow(Udp, 0, 16, 0);
    UdpDstPort, UDP_DST_PORT, "UDP_DST_PORT" => narrow(Udp, 2, 16, 0);
    UdpLength, UDP_LENGTH, "UDP_LENGTH" => narrow(Udp, 4, 16, 0);
    UdpChecksum, UDP_CHECKSUM, "UDP_CHECKSUM" => narrow(Udp, 6, 16, 0);

    L4SrcPort, L4_SRC_PORT, "L4_SRC_PORT" => narrow(L4, 0, 16, 0);
    L4DstPort, L4_DST_PORT, "L4_DST_PORT" => narrow(L4, 2, 16, 0);

    SlowProtocolsSubtype, SLOW_PROTOCOLS_SUBTYPE, "SLOW_PROTOCOLS_SUBTYPE" => narrow(SlowProtocols, 0, 8, 0);
    LacpVersion, LACP_VERSION, "LACP_VERSION" => narrow(Lacp, 0, 8, 0);
    LacpActorInfo, LACP_ACTOR_INFO, "LACP_ACTOR_INFO" => narrow(Lacp, 1, 8, 0);
    LacpActorInfoLen, LACP_ACTOR_INFO_LEN, "LACP_ACTOR_INFO_LEN" => narrow(Lacp, 2, 8, 0);
    LacpActorSysPri, LACP_ACTOR_SYS_PRI, "LACP_ACTOR_SYS_PRI" => narrow(Lacp, 3, 16, 0);
    LacpActorSys, LACP_ACTOR_SYS, "LACP_ACTOR_SYS" => wide(Lacp, 5, 48, 0);
    LacpActorKey, LACP_ACTOR_KEY, "LACP_ACTOR_KEY" => narrow(Lacp, 11, 16, 0);
    LacpActorPortPri, LACP_ACTOR_PORT_PRI, "LACP_ACTOR_PORT_PRI" => narrow(Lacp, 13, 16, 0);
    LacpActorPort, LACP_ACTOR_PORT, "LACP_ACTOR_PORT" => narrow(Lacp, 15, 16, 0);
    LacpActorState, LACP_ACTOR_STATE, "LACP_ACTOR_STATE" => narrow(Lacp, 17, 8, 0);
    LacpRsv0, LACP_RSV0, "LACP_RSV0" => narrow(Lacp, 18, 24, 0);
    LacpPartnerInfo, LACP_PARTNER_INFO, "LACP_PARTNER_INFO" => narrow(Lacp, 21, 8, 0);
    LacpPartnerInfoLen, LACP_PARTNER_INFO_LEN, "LACP_PARTNER_INFO_LEN" => narrow(Lacp, 22, 8, 0);
    LacpPartnerSysPri, LACP_PARTNER_SYS_PRI, "LACP_PARTNER_SYS_PRI" => narrow(Lacp, 23, 16, 0);
    LacpPartnerSys, LACP_PARTNER_SYS, "LACP_PARTNER_SYS" => wide(Lacp, 25, 48, 0);
    LacpPartnerKey, LACP_PARTNER_KEY, "LACP_PARTNER_KEY" => narrow(Lacp, 31, 16, 0);
    LacpPartnerPortPri, LACP_PARTNER_PORT_PRI, "LACP_PARTNER_PORT_PRI" => narrow(Lacp, 33, 16, 0);
    LacpPartnerPort, LACP_PARTNER_PORT, "LACP_PARTNER_PORT" => narrow(Lacp, 35, 16, 0);
    LacpPartnerState, LACP_PARTNER_STATE, "LACP_PARTNER_STATE" => narrow(Lacp, 37, 8, 0);
    LacpRsv1, LACP_RSV1, "LACP_RSV1" => narrow(Lacp, 38, 24, 0);
    LacpCollectorInfo, LACP_COLLECTOR_INFO, "LACP_COLLECTOR_INFO" => narrow(Lacp, 41, 8, 0);
    LacpCollectorInfoLen, LACP_COLLECTOR_INFO_LEN, "LACP_COLLECTOR_INFO_LEN" => narrow(Lacp, 42, 8, 0);
    LacpCollectorMaxDelay, LACP_COLLECTOR_MAX_DELAY, "LACP_COLLECTOR_MAX_DELAY" => narrow(Lacp, 43, 16, 0);
    LacpRsv2, LACP_RSV2, "LACP_RSV2" => wide(Lacp, 45, 96, 0);
    LacpTerminatorInfo, LACP_TERMINATOR_INFO, "LACP_TERMINATOR_INFO" => narrow(Lacp, 57, 8, 0);
    LacpTerminatorLength, LACP_TERMINATOR_LENGTH, "LACP_TERMINATOR_LENGTH" => narrow(Lacp, 58, 8, 0);
    LacpRsv4, LACP_RSV4, "LACP_RSV4" => wide(Lacp, 59, 400, 0);

    Of10First, OF10_FIRST, "OF10_FIRST" => reserved(Of10, 0, 0, 0);
    Of10EtherDstMac, OF10_ETHER_DST_MAC, "OF10_ETHER_DST_MAC" => wide(Of10, 0, 48, 0);
    Of10EtherSrcMac, OF10_ETHER_SRC_MAC, "OF10_ETHER_SRC_MAC" => wide(Of10, 6, 48, 0);
    Of10Tpid, OF10_TPID, "OF10_TPID" => narrow(Of10, 12, 16, 0);
    Of10Pri, OF10_PRI, "OF10_PRI" => narrow(Of10, 14, 3, 5);
    Of10Cfi, OF10_CFI, "OF10_CFI" => narrow(Of10, 14, 1, 4);
    Of10Vlan, OF10_VLAN, "OF10_VLAN" => narrow(Of10, 14, 12, 0);
    Of10Ip4DstAddr, OF10_IP4_DST_ADDR, "OF10_IP4_DST_ADDR" => narrow(Of10, 16, 32, 0);
    Of10Ip4SrcAddr, OF10_IP4_SRC_ADDR, "OF10_IP4_SRC_ADDR" => narrow(Of10, 20, 32, 0);
    Of10L4DstPort, OF10_L4_DST_PORT, "OF10_L4_DST_PORT" => narrow(Of10, 24, 16, 0);
    Of10L4SrcPort, OF10_L4_SRC_PORT, "OF10_L4_SRC_PORT" => narrow(Of10, 26, 16, 0);
    Of10Ip4Proto, OF10_IP4_PROTO, "OF10_IP4_PROTO" => narrow(Of10, 28, 8, 0);
    Of10Ip4Tos, OF10_IP4_TOS, "OF10_IP4_TOS" => narrow(Of10, 29, 8, 0);
    Of10IcmpType, OF10_ICMP_TYPE, "OF10_ICMP_TYPE" => narrow(Of10, 30, 8, 0);
    Of10IcmpCode, OF10_ICMP_CODE, "OF10_ICMP_CODE" => narrow(Of10, 31, 8, 0);
    Of10IngressPort, OF10_INGRESS_PORT, "OF10_INGRESS_PORT" => narrow(Of10, 32, 32, 0);
    Of10PacketFormat, OF10_PACKET_FORMAT, "OF10_PACKET_FORMAT" => narrow(Of10, 36, 32, 0);
    Of10EtherType, OF10_ETHER_TYPE, "OF10_ETHER_TYPE" => narrow(Of10, 40, 16, 0);
    Of10ArpSpa, OF10_ARP_SPA, "OF10_ARP_SPA" => narrow(Of10, 42, 32, 0);
    Of10ArpTpa, OF10_ARP_TPA, "OF10_ARP_TPA" => narrow(Of10, 46, 32, 0);
    Of10ArpPtype, OF10_ARP_PTYPE, "OF10_ARP_PTYPE" => narrow(Of10, 50, 16, 0);
    Of10ArpOperation, OF10_ARP_OPERATION, "OF10_ARP_OPERATION" => narrow(Of10, 52, 16, 0);
    Of10Last, OF10_LAST, "OF10_LAST" => reserved(Of10, 0, 0, 0);
}

impl FieldId {
    /// Number of field identifiers, reserved ones included
    pub fn count() -> usize {
        Self::ALL.len()
    }

    /// Numeric identifier
    pub const fn id(self) -> u16 {
        self as u16
    }

    /// Look up a field by numeric identifier
    pub fn from_id(id: u16) -> Result<Self> {
        Self::ALL
            .get(usize::from(id))
            .copied()
            .ok_or(Error::UnknownField(id))
    }

    /// Raw catalog entry, reserved identifiers included
    pub fn entry(self) -> &'static FieldInfo {
        &CATALOG[self as usize]
    }

    /// Descriptor of an addressable field
    pub fn info(self) -> Result<&'static FieldInfo> {
        let info = self.entry();
        if info.is_reserved() {
            return Err(Error::UnknownField(self.id()));
        }
        Ok(info)
    }

    pub fn header(self) -> HeaderId {
        self.entry().header
    }

    pub fn is_reserved(self) -> bool {
        self.entry().is_reserved()
    }

    /// Narrow handle for this field, checked once at run time
    pub fn narrow(self) -> Result<NarrowField> {
        match self.info()?.layout() {
            Some(FieldLayout::Narrow) => Ok(NarrowField(self)),
            _ => Err(Error::FieldTooWide(self.name())),
        }
    }

    /// Wide handle for this field, checked once at run time
    pub fn wide(self) -> Result<WideField> {
        match self.info()?.layout() {
            Some(FieldLayout::Wide) => Ok(WideField(self)),
            _ => Err(Error::FieldTooNarrow(self.name())),
        }
    }

    /// All addressable fields of one header
    pub fn of_header(header: HeaderId) -> impl Iterator<Item = &'static FieldInfo> {
        iter().filter(move |info| info.header == header)
    }
}

/// Every addressable field, reserved identifiers skipped
pub fn iter() -> impl Iterator<Item = &'static FieldInfo> {
    CATALOG.iter().filter(|info| !info.is_reserved())
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FieldId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        FieldId::ALL
            .iter()
            .copied()
            .find(|field| field.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::unknown_name("field", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_matches_identifiers() {
        assert_eq!(CATALOG.len(), FieldId::count());
        for (i, info) in CATALOG.iter().enumerate() {
            assert_eq!(info.field as usize, i, "{} out of order", info.field);
            assert_eq!(FieldId::from_id(i as u16).unwrap(), info.field);
        }
    }

    #[test]
    fn test_reserved_fields() {
        for field in [FieldId::MetaFieldCount, FieldId::Of10First, FieldId::Of10Last] {
            assert!(field.is_reserved());
            assert_eq!(field.info(), Err(Error::UnknownField(field.id())));
        }
        assert!(iter().all(|info| info.width > 0));
        assert_eq!(
            FieldId::from_id(FieldId::count() as u16),
            Err(Error::UnknownField(FieldId::count() as u16))
        );
    }

    #[test]
    fn test_wide_fields_are_byte_aligned() {
        for info in iter().filter(|info| info.is_wide()) {
            assert_eq!(info.shift, 0, "{}", info.field);
            assert_eq!(info.width % 8, 0, "{}", info.field);
        }
    }

    #[test]
    fn test_narrow_fields_fit_assembly_window() {
        for info in iter().filter(|info| !info.is_wide()) {
            assert!(info.span() <= 5, "{}", info.field);
            assert!(info.shift < 8, "{}", info.field);
        }
    }

    #[test]
    fn test_vlan_tag_layout() {
        let pri = fields::DOT1Q_PRI.info();
        let cfi = fields::DOT1Q_CFI.info();
        let vlan = fields::DOT1Q_VLAN.info();
        assert_eq!((pri.offset, pri.width, pri.shift, pri.span()), (2, 3, 5, 1));
        assert_eq!((cfi.offset, cfi.width, cfi.shift, cfi.span()), (2, 1, 4, 1));
        assert_eq!((vlan.offset, vlan.width, vlan.shift, vlan.span()), (2, 12, 0, 2));
        assert_eq!(vlan.mask(), 0x0FFF);
        assert_eq!(vlan.bit_offset(), 16);
    }

    #[test]
    fn test_typed_handles() {
        assert_eq!(fields::IP4_SRC_ADDR.id(), FieldId::Ip4SrcAddr);
        assert_eq!(fields::DHCP_CHADDR.len(), 16);
        assert_eq!(FieldId::Ip4SrcAddr.narrow().unwrap(), fields::IP4_SRC_ADDR);
        assert_eq!(FieldId::Ip6SrcAddr.wide().unwrap(), fields::IP6_SRC_ADDR);
        assert_eq!(
            FieldId::EthernetDstMac.narrow(),
            Err(Error::FieldTooWide("ETHERNET_DST_MAC"))
        );
        assert_eq!(
            FieldId::EtherType.wide(),
            Err(Error::FieldTooNarrow("ETHER_TYPE"))
        );
    }

    #[test]
    fn test_field_names() {
        assert_eq!(FieldId::Dot1qVlan.to_string(), "8021Q_VLAN");
        assert_eq!("8021q_vlan".parse::<FieldId>().unwrap(), FieldId::Dot1qVlan);
        assert_eq!("L4_DST_PORT".parse::<FieldId>().unwrap(), FieldId::L4DstPort);
        assert!("IP4_FLAGS".parse::<FieldId>().is_err());
    }

    #[test]
    fn test_fields_of_header() {
        let udp: Vec<_> = FieldId::of_header(HeaderId::Udp).map(|i| i.field).collect();
        assert_eq!(
            udp,
            vec![
                FieldId::UdpSrcPort,
                FieldId::UdpDstPort,
                FieldId::UdpLength,
                FieldId::UdpChecksum
            ]
        );
        assert_eq!(FieldId::of_header(HeaderId::EthertypeMissing).count(), 0);
    }
}
