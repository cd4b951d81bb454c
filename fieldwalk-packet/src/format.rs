//! Conversion between Ethernet II and 802.1Q framing
//!
//! Removing a tag shifts the frame tail over it in place. Adding one needs four
//! more bytes, so the packet moves to a new owned buffer and hands the previous
//! one back to the caller through [`FormatChange::Reallocated`]. Either way the
//! headers are walked again before returning.

use crate::header::HeaderId;
use crate::packet::{Packet, PacketBuffer, PacketFormat};
use crate::proto::EtherType;
use bytes::{BufMut, BytesMut};
use fieldwalk_core::constants::{DOT1Q_TAG_LEN, ETHERNET_HEADER_LEN, ETHERTYPE_OFFSET};
use fieldwalk_core::{Error, Result};
use tracing::debug;

/// Outcome of [`Packet::set_format`]
#[derive(Debug)]
pub enum FormatChange<'a> {
    /// Already in the requested format
    Unchanged,
    /// Rewritten inside the current buffer
    InPlace,
    /// Moved to a new owned buffer; the previous buffer is returned
    Reallocated(PacketBuffer<'a>),
}

impl FormatChange<'_> {
    pub fn is_reallocated(&self) -> bool {
        matches!(self, FormatChange::Reallocated(_))
    }
}

impl<'a> Packet<'a> {
    /// Rewrite the frame into `target` framing and walk it again
    ///
    /// A newly inserted tag is all zero apart from its TPID, so VLAN,
    /// priority and CFI read back as 0.
    pub fn set_format(&mut self, target: PacketFormat) -> Result<FormatChange<'a>> {
        let current = self.format();
        if current == target {
            return Ok(FormatChange::Unchanged);
        }
        debug!(target: "fieldwalk::format", "converting {} to {}", current, target);

        let change = match target {
            PacketFormat::EtherII => self.remove_tag()?,
            PacketFormat::Dot1q => self.insert_tag()?,
        };
        self.parse()?;
        Ok(change)
    }

    /// [`set_format`](Self::set_format) with the target named by a header
    pub fn set_format_header(&mut self, target: HeaderId) -> Result<FormatChange<'a>> {
        self.set_format(PacketFormat::try_from(target)?)
    }

    fn remove_tag(&mut self) -> Result<FormatChange<'a>> {
        let tagged_len = ETHERTYPE_OFFSET + DOT1Q_TAG_LEN;
        let len = self.len();
        // The untagged frame must still hold a whole Ethernet header.
        if len < ETHERNET_HEADER_LEN + DOT1Q_TAG_LEN {
            return Err(Error::parse(format!(
                "tagged frame of {} bytes is too short to untag",
                len
            )));
        }

        let untagged_len = len - DOT1Q_TAG_LEN;
        match self.buffer_mut() {
            PacketBuffer::Borrowed(data) => {
                let frame = std::mem::take(data);
                frame.copy_within(tagged_len.., ETHERTYPE_OFFSET);
                *data = &mut frame[..untagged_len];
            }
            PacketBuffer::Owned(data) => {
                data.copy_within(tagged_len.., ETHERTYPE_OFFSET);
                data.truncate(untagged_len);
            }
        }
        Ok(FormatChange::InPlace)
    }

    fn insert_tag(&mut self) -> Result<FormatChange<'a>> {
        let data = self.data();
        if data.len() < ETHERNET_HEADER_LEN {
            return Err(Error::parse(format!(
                "frame of {} bytes is shorter than an Ethernet header",
                data.len()
            )));
        }

        let mut tagged = BytesMut::with_capacity(data.len() + DOT1Q_TAG_LEN);
        tagged.put_slice(&data[..ETHERTYPE_OFFSET]);
        tagged.put_u16(EtherType::VLAN.to_u16());
        tagged.put_u16(0);
        tagged.put_slice(&data[ETHERTYPE_OFFSET..]);

        debug!(target: "fieldwalk::format", "reallocated frame to {} bytes", tagged.len());
        let previous = self.replace_buffer(PacketBuffer::Owned(tagged));
        Ok(FormatChange::Reallocated(previous))
    }
}
