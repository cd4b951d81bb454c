//! Checksum calculations for network packets
//!
//! This module provides the Internet Checksum (RFC 1071) and the updaters that
//! recompute the IPv4, TCP, UDP and ICMP checksums of a parsed [`Packet`].
//! Checksums are written back through the ordinary field accessors.

use crate::catalog::fields;
use crate::header::HeaderId;
use crate::packet::Packet;
use crate::proto::IpProtocol;
use fieldwalk_core::Result;
use tracing::{debug, trace};

/// Calculates the Internet Checksum as defined in RFC 1071.
///
/// The data is summed as big-endian 16-bit words, an odd trailing byte
/// padded with zero, and the one's complement of the folded sum returned.
///
/// # Examples
///
/// ```
/// use fieldwalk_packet::checksum::internet_checksum;
///
/// let header = [0x45, 0x00, 0x00, 0x3c, 0x1c, 0x46, 0x40, 0x00, 0x40, 0x06,
///               0x00, 0x00, 0xac, 0x10, 0x0a, 0x63, 0xac, 0x10, 0x0a, 0x0c];
/// assert_eq!(internet_checksum(&header), 0xB1E6);
/// ```
pub fn internet_checksum(data: &[u8]) -> u16 {
    !checksum_accumulate(data) as u16
}

/// Calculates a TCP or UDP checksum including the IPv4 pseudo-header.
///
/// # Arguments
///
/// * `src_ip` - Source IP address (4 bytes)
/// * `dst_ip` - Destination IP address (4 bytes)
/// * `protocol` - IP protocol number (6 for TCP, 17 for UDP)
/// * `length` - Segment length announced in the pseudo-header
/// * `data` - The TCP/UDP header and payload, checksum field zeroed
pub fn transport_checksum(
    src_ip: &[u8; 4],
    dst_ip: &[u8; 4],
    protocol: u8,
    length: u16,
    data: &[u8],
) -> u16 {
    let mut pseudo_header = [0u8; 12];
    pseudo_header[..4].copy_from_slice(src_ip);
    pseudo_header[4..8].copy_from_slice(dst_ip);
    pseudo_header[9] = protocol;
    pseudo_header[10..].copy_from_slice(&length.to_be_bytes());

    let sum = checksum_accumulate(&pseudo_header) + checksum_accumulate(data);
    !fold(sum) as u16
}

/// Validates an Internet checksum.
///
/// Summing data that includes a correct checksum yields 0 (or 0xFFFF).
pub fn validate_checksum(data: &[u8]) -> bool {
    let result = internet_checksum(data);
    result == 0 || result == 0xFFFF
}

/// One's complement sum of `data`, folded to 16 bits but not complemented.
pub fn checksum_accumulate(data: &[u8]) -> u32 {
    let mut sum: u64 = 0;

    let mut chunks = data.chunks_exact(2);
    for chunk in &mut chunks {
        sum += u64::from(u16::from_be_bytes([chunk[0], chunk[1]]));
    }

    if let Some(&byte) = chunks.remainder().first() {
        sum += u64::from(byte) << 8;
    }

    while (sum >> 16) != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }

    sum as u32
}

fn fold(mut sum: u32) -> u32 {
    while (sum >> 16) != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    sum
}

impl Packet<'_> {
    /// Recompute every checksum the packet carries
    ///
    /// Each updater is skipped when its header is absent, and one that fails
    /// on a truncated header does not stop the others. IPv6 transport
    /// checksums are not computed. Returns the number of checksums written.
    pub fn update_checksums(&mut self) -> usize {
        let updaters: [(&str, fn(&mut Self) -> Result<Option<u16>>); 4] = [
            ("IP4", Self::update_ip4_checksum),
            ("TCP", Self::update_tcp_checksum),
            ("UDP", Self::update_udp_checksum),
            ("ICMP", Self::update_icmp_checksum),
        ];

        let mut updated = 0;
        for (name, update) in updaters {
            match update(self) {
                Ok(Some(_)) => updated += 1,
                Ok(None) => {}
                Err(e) => {
                    debug!(target: "fieldwalk::checksum", "{} checksum not updated: {}", name, e);
                }
            }
        }
        updated
    }

    /// IPv4 header checksum, `None` without an IPv4 header
    pub fn update_ip4_checksum(&mut self) -> Result<Option<u16>> {
        if !self.header_exists(HeaderId::Ip4) {
            return Ok(None);
        }
        let header_len = self.get(fields::IP4_HEADER_SIZE)? as usize * 4;
        self.set(fields::IP4_CHECKSUM, 0)?;

        let header = self.header_bytes(HeaderId::Ip4)?;
        let sum = internet_checksum(&header[..header_len.min(header.len())]);
        self.set(fields::IP4_CHECKSUM, u32::from(sum))?;
        trace!(target: "fieldwalk::checksum", "IP4 checksum 0x{:04x}", sum);
        Ok(Some(sum))
    }

    /// TCP checksum over the rest of the frame, `None` unless TCP over IPv4
    pub fn update_tcp_checksum(&mut self) -> Result<Option<u16>> {
        if !self.header_exists(HeaderId::Tcp) || !self.header_exists(HeaderId::Ip4) {
            return Ok(None);
        }
        self.set(fields::TCP_CHECKSUM, 0)?;

        let (src, dst) = self.ip4_addresses()?;
        let segment = self.header_bytes(HeaderId::Tcp)?;
        let sum = transport_checksum(
            &src,
            &dst,
            IpProtocol::TCP.to_u8(),
            segment.len() as u16,
            segment,
        );
        self.set(fields::TCP_CHECKSUM, u32::from(sum))?;
        trace!(target: "fieldwalk::checksum", "TCP checksum 0x{:04x}", sum);
        Ok(Some(sum))
    }

    /// UDP checksum over `UDP_LENGTH` bytes, `None` unless UDP over IPv4
    pub fn update_udp_checksum(&mut self) -> Result<Option<u16>> {
        if !self.header_exists(HeaderId::Udp) || !self.header_exists(HeaderId::Ip4) {
            return Ok(None);
        }
        let length = self.get(fields::UDP_LENGTH)?;
        self.set(fields::UDP_CHECKSUM, 0)?;

        let (src, dst) = self.ip4_addresses()?;
        let datagram = self.header_bytes(HeaderId::Udp)?;
        let covered = &datagram[..(length as usize).min(datagram.len())];
        let sum = transport_checksum(&src, &dst, IpProtocol::UDP.to_u8(), length as u16, covered);
        self.set(fields::UDP_CHECKSUM, u32::from(sum))?;
        trace!(target: "fieldwalk::checksum", "UDP checksum 0x{:04x}", sum);
        Ok(Some(sum))
    }

    /// ICMP checksum over the rest of the frame, `None` without ICMP
    pub fn update_icmp_checksum(&mut self) -> Result<Option<u16>> {
        if !self.header_exists(HeaderId::Icmp) {
            return Ok(None);
        }
        self.set(fields::ICMP_CHECKSUM, 0)?;

        let sum = internet_checksum(self.header_bytes(HeaderId::Icmp)?);
        self.set(fields::ICMP_CHECKSUM, u32::from(sum))?;
        trace!(target: "fieldwalk::checksum", "ICMP checksum 0x{:04x}", sum);
        Ok(Some(sum))
    }

    fn ip4_addresses(&self) -> Result<([u8; 4], [u8; 4])> {
        let src = self.get(fields::IP4_SRC_ADDR)?.to_be_bytes();
        let dst = self.get(fields::IP4_DST_ADDR)?.to_be_bytes();
        Ok((src, dst))
    }
}
