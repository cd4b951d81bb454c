//! Text rendering of a packet's fields

use crate::catalog::FieldLayout;
use crate::header::HeaderId;
use crate::packet::Packet;
use std::fmt::{self, Write};

/// Displays every field of every present header, one header per line
pub struct PacketDump<'p, 'a> {
    packet: &'p Packet<'a>,
}

impl Packet<'_> {
    /// Field-by-field view of the packet
    ///
    /// ```
    /// use fieldwalk_packet::Packet;
    ///
    /// let mut frame = [0u8; 14];
    /// frame[12] = 0x88;
    /// frame[13] = 0xB5;
    /// let packet = Packet::parsed(&mut frame).unwrap();
    /// let text = packet.dump().to_string();
    /// assert!(text.contains("ETHER: ETHER_TYPE=0x88b5"));
    /// ```
    pub fn dump(&self) -> PacketDump<'_, '_> {
        PacketDump { packet: self }
    }
}

impl PacketDump<'_, '_> {
    fn header(&self, f: &mut fmt::Formatter<'_>, header: HeaderId) -> fmt::Result {
        write!(f, "{}:", header)?;
        for info in self.packet.present_fields().filter(|i| i.header == header) {
            write!(f, " {}=", info.field)?;
            match info.layout() {
                Some(FieldLayout::Narrow) => match self.packet.field_get(info.field) {
                    Ok(value) => write!(f, "0x{:0width$x}", value, width = info.byte_width() * 2)?,
                    Err(_) => f.write_str("-")?,
                },
                Some(FieldLayout::Wide) => {
                    let mut value = vec![0u8; info.byte_width()];
                    match self.packet.wide_field_get(info.field, &mut value) {
                        Ok(()) => f.write_str(&hex::encode(&value))?,
                        Err(_) => f.write_str("-")?,
                    }
                }
                None => {}
            }
        }
        f.write_char('\n')
    }
}

impl fmt::Display for PacketDump<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for header in self.packet.headers().iter() {
            self.header(f, header)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::packet::Packet;

    #[test]
    fn test_dump_truncated_header() {
        let mut frame = [0u8; 20];
        frame[12] = 0x08;
        frame[14] = 0x45;
        let packet = Packet::parsed(&mut frame).unwrap();
        let text = packet.dump().to_string();

        assert!(text.contains("META: META_INGRESS_PORT=0x00000000 META_PACKET_LENGTH=0x00000014"));
        assert!(text.contains("ETHERNET: ETHERNET_DST_MAC=000000000000"));
        assert!(text.contains("IP4: IP4_VERSION=0x04 IP4_HEADER_SIZE=0x05"));
        assert!(text.contains("IP4_SRC_ADDR=-"));
        assert_eq!(text.lines().count(), 4);
    }
}
