//! Dynamic field keys
//!
//! A key packs the values of a fixed, ordered list of fields into a byte
//! string, together with a presence mask holding one bit per listed field.
//! Only fields present in the source packet contribute bytes, each one
//! big-endian in `ceil(width / 8)` bytes, so the key length depends on the
//! packet even though the field list does not.
//!
//! ```
//! use fieldwalk_packet::catalog::FieldId;
//! use fieldwalk_packet::{DynamicFieldKey, Packet};
//!
//! let mut frame = [
//!     0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 2, // addresses
//!     0x81, 0x00, 0x13, 0xFE, // tag
//!     0x08, 0x06, // ARP
//! ];
//! let packet = Packet::parsed(&mut frame).unwrap();
//!
//! let list = [FieldId::Dot1qVlan, FieldId::Ip4Version, FieldId::EtherType];
//! let mut key = DynamicFieldKey::new(&list).unwrap();
//! key.build(&packet).unwrap();
//!
//! assert_eq!(key.mask(), 0b101);
//! assert_eq!(key.data(), &[0x03, 0xFE, 0x08, 0x06]);
//! assert_eq!(key.field_get(FieldId::EtherType).unwrap(), 0x0806);
//! ```

use crate::catalog::{FieldId, FieldInfo, FieldLayout};
use crate::packet::Packet;
use bytes::{BufMut, BytesMut};
use fieldwalk_core::{Error, Result};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Range;

/// Most fields a key can list, one per presence-mask bit
pub const MAX_KEY_FIELDS: usize = 32;

/// Formatter for a key's text form
pub type KeyDumpFn = fn(&DynamicFieldKey<'_>, &mut fmt::Formatter<'_>) -> fmt::Result;

/// How a key renders itself through [`fmt::Display`]
#[derive(Clone, Copy, Default)]
pub enum KeyDumper {
    /// `mask=0x........ data=..` followed by one `NAME=value` per present field
    #[default]
    Default,
    /// Caller-supplied formatter
    Custom(KeyDumpFn),
}

impl fmt::Debug for KeyDumper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyDumper::Default => f.write_str("Default"),
            KeyDumper::Custom(_) => f.write_str("Custom"),
        }
    }
}

/// Presence-masked packing of an ordered field list
#[derive(Debug, Clone)]
pub struct DynamicFieldKey<'f> {
    fields: &'f [FieldId],
    mask: u32,
    data: BytesMut,
    dumper: KeyDumper,
}

impl<'f> DynamicFieldKey<'f> {
    /// Create an empty key over `fields`
    ///
    /// Every listed identifier must address a real field, and at most
    /// [`MAX_KEY_FIELDS`] may be listed.
    pub fn new(fields: &'f [FieldId]) -> Result<Self> {
        if fields.len() > MAX_KEY_FIELDS {
            return Err(Error::TooManyKeyFields {
                count: fields.len(),
                max: MAX_KEY_FIELDS,
            });
        }
        for field in fields {
            field.info()?;
        }
        Ok(DynamicFieldKey {
            fields,
            mask: 0,
            data: BytesMut::new(),
            dumper: KeyDumper::Default,
        })
    }

    pub fn with_dumper(mut self, dumper: KeyDumper) -> Self {
        self.dumper = dumper;
        self
    }

    pub fn fields(&self) -> &'f [FieldId] {
        self.fields
    }

    /// Presence mask; bit `i` is set when `fields()[i]` was present
    pub fn mask(&self) -> u32 {
        self.mask
    }

    /// Packed values of the present fields
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether the field at `index` of the list was present
    pub fn is_present(&self, index: usize) -> bool {
        index < self.fields.len() && self.mask & (1 << index) != 0
    }

    /// Encode the listed fields of `packet`
    ///
    /// On error the key is left empty.
    pub fn build(&mut self, packet: &Packet<'_>) -> Result<()> {
        self.reset();

        let mut mask = 0u32;
        let mut data = BytesMut::new();
        for (index, field) in self.fields.iter().enumerate() {
            if !packet.field_exists(*field) {
                continue;
            }
            let info = field.info()?;
            match info.layout() {
                Some(FieldLayout::Narrow) => {
                    let value = packet.field_get(*field)?;
                    data.put_uint(u64::from(value), info.byte_width());
                }
                Some(FieldLayout::Wide) => {
                    let start = data.len();
                    data.resize(start + info.byte_width(), 0);
                    packet.wide_field_get(*field, &mut data[start..])?;
                }
                None => return Err(Error::UnknownField(field.id())),
            }
            mask |= 1 << index;
        }

        self.mask = mask;
        self.data = data;
        Ok(())
    }

    /// Clear the presence mask and packed data, keeping the field list
    pub fn reset(&mut self) {
        self.mask = 0;
        self.data.clear();
    }

    /// Descriptor and byte range of a present field
    fn locate(&self, field: FieldId) -> Result<(&'static FieldInfo, Range<usize>)> {
        let mut offset = 0;
        for (index, listed) in self.fields.iter().enumerate() {
            if !self.is_present(index) {
                if *listed == field {
                    break;
                }
                continue;
            }
            let info = listed.info()?;
            if *listed == field {
                return Ok((info, offset..offset + info.byte_width()));
            }
            offset += info.byte_width();
        }
        Err(Error::FieldAbsentInKey(field.name()))
    }

    /// Decode a narrow field from the key
    pub fn field_get(&self, field: FieldId) -> Result<u32> {
        field.narrow()?;
        let (_, range) = self.locate(field)?;
        Ok(self.data[range]
            .iter()
            .fold(0u32, |acc, byte| (acc << 8) | u32::from(*byte)))
    }

    /// Copy a wide field out of the key
    pub fn wide_field_get(&self, field: FieldId, dst: &mut [u8]) -> Result<()> {
        field.wide()?;
        let (_, range) = self.locate(field)?;
        let len = range.len();
        if dst.len() < len {
            return Err(Error::BufferTooSmall {
                needed: len,
                actual: dst.len(),
            });
        }
        dst[..len].copy_from_slice(&self.data[range]);
        Ok(())
    }

    /// Overwrite a narrow field already present in the key
    pub fn field_set(&mut self, field: FieldId, value: u32) -> Result<()> {
        field.narrow()?;
        let (info, range) = self.locate(field)?;
        let value = value & info.mask();
        let bytes = &mut self.data[range];
        let width = bytes.len();
        bytes.copy_from_slice(&value.to_be_bytes()[4 - width..]);
        Ok(())
    }

    /// Overwrite a wide field already present in the key, or zero it
    pub fn wide_field_set(&mut self, field: FieldId, src: Option<&[u8]>) -> Result<()> {
        field.wide()?;
        let (_, range) = self.locate(field)?;
        let len = range.len();
        match src {
            Some(src) if src.len() < len => Err(Error::BufferTooSmall {
                needed: len,
                actual: src.len(),
            }),
            Some(src) => {
                self.data[range].copy_from_slice(&src[..len]);
                Ok(())
            }
            None => {
                self.data[range].fill(0);
                Ok(())
            }
        }
    }

    fn dump_default(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mask=0x{:08x} data={}", self.mask, hex::encode(&self.data))?;
        for field in self.fields {
            if let Ok((_, range)) = self.locate(*field) {
                write!(f, " {}={}", field, hex::encode(&self.data[range]))?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for DynamicFieldKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.dumper {
            KeyDumper::Default => self.dump_default(f),
            KeyDumper::Custom(dump) => dump(self, f),
        }
    }
}

impl PartialEq for DynamicFieldKey<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.mask == other.mask && self.data == other.data
    }
}

impl Eq for DynamicFieldKey<'_> {}

impl Hash for DynamicFieldKey<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.mask.hash(state);
        self.data.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::HeaderId;

    fn arp_frame() -> Vec<u8> {
        let mut frame = vec![0u8; 12];
        frame.extend_from_slice(&[0x81, 0x00, 0x33, 0xFE, 0x08, 0x06]);
        frame.extend_from_slice(&[0x00, 0x01, 0x08, 0x00, 0x06, 0x04, 0x00, 0x01]);
        frame.extend_from_slice(&[0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF, 10, 0, 0, 1]);
        frame.extend_from_slice(&[0u8; 6]);
        frame.extend_from_slice(&[10, 0, 0, 2]);
        frame
    }

    #[test]
    fn test_too_many_fields() {
        let list = vec![FieldId::EtherType; MAX_KEY_FIELDS + 1];
        assert_eq!(
            DynamicFieldKey::new(&list).unwrap_err(),
            Error::TooManyKeyFields { count: 33, max: 32 }
        );
    }

    #[test]
    fn test_reserved_field_rejected() {
        let list = [FieldId::EtherType, FieldId::MetaFieldCount];
        assert!(DynamicFieldKey::new(&list).is_err());
    }

    #[test]
    fn test_sub_byte_fields_take_one_byte() {
        let mut frame = arp_frame();
        let packet = Packet::parsed(&mut frame).unwrap();
        let list = [FieldId::Dot1qPri, FieldId::Dot1qCfi, FieldId::ArpHlen];
        let mut key = DynamicFieldKey::new(&list).unwrap();
        key.build(&packet).unwrap();

        assert_eq!(key.data(), &[0x01, 0x01, 0x06]);
        assert_eq!(key.field_get(FieldId::Dot1qCfi).unwrap(), 1);
    }

    #[test]
    fn test_wide_fields() {
        let mut frame = arp_frame();
        let packet = Packet::parsed(&mut frame).unwrap();
        let list = [FieldId::ArpSha, FieldId::Ip6SrcAddr, FieldId::ArpSpa];
        let mut key = DynamicFieldKey::new(&list).unwrap();
        key.build(&packet).unwrap();

        assert_eq!(key.mask(), 0b101);
        assert_eq!(key.len(), 10);

        let mut sha = [0u8; 6];
        key.wide_field_get(FieldId::ArpSha, &mut sha).unwrap();
        assert_eq!(sha, [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
        assert_eq!(key.field_get(FieldId::ArpSpa).unwrap(), 0x0A000001);

        let mut ip6 = [0u8; 16];
        assert_eq!(
            key.wide_field_get(FieldId::Ip6SrcAddr, &mut ip6),
            Err(Error::FieldAbsentInKey("IP6_SRC_ADDR"))
        );
        assert_eq!(
            key.field_get(FieldId::ArpSha),
            Err(Error::FieldTooWide("ARP_SHA"))
        );
    }

    #[test]
    fn test_field_not_listed() {
        let mut frame = arp_frame();
        let packet = Packet::parsed(&mut frame).unwrap();
        let list = [FieldId::EtherType];
        let mut key = DynamicFieldKey::new(&list).unwrap();
        key.build(&packet).unwrap();
        assert!(key.field_get(FieldId::ArpOperation).unwrap_err().is_absent());
    }

    #[test]
    fn test_set_values_in_key() {
        let mut frame = arp_frame();
        let packet = Packet::parsed(&mut frame).unwrap();
        let list = [FieldId::Dot1qVlan, FieldId::ArpTha, FieldId::ArpTpa];
        let mut key = DynamicFieldKey::new(&list).unwrap();
        key.build(&packet).unwrap();

        key.field_set(FieldId::Dot1qVlan, 0xF123).unwrap();
        assert_eq!(key.field_get(FieldId::Dot1qVlan).unwrap(), 0x123);

        key.wide_field_set(FieldId::ArpTha, Some(&[1u8, 2, 3, 4, 5, 6][..]))
            .unwrap();
        assert_eq!(&key.data()[2..8], &[1, 2, 3, 4, 5, 6]);
        key.wide_field_set(FieldId::ArpTha, None).unwrap();
        assert_eq!(&key.data()[2..8], &[0; 6]);
        assert_eq!(key.field_get(FieldId::ArpTpa).unwrap(), 0x0A000002);
    }

    #[test]
    fn test_rebuild_and_reset() {
        let mut frame = arp_frame();
        let mut packet = Packet::parsed(&mut frame).unwrap();
        let list = [FieldId::Dot1qVlan, FieldId::EtherType];
        let mut key = DynamicFieldKey::new(&list).unwrap();
        key.build(&packet).unwrap();
        assert_eq!(key.len(), 4);

        packet.set_header(HeaderId::Dot1q, None).unwrap();
        key.build(&packet).unwrap();
        assert_eq!(key.mask(), 0b10);
        assert_eq!(key.data(), &[0x08, 0x06]);

        key.reset();
        assert!(key.is_empty());
        assert_eq!(key.mask(), 0);
        assert_eq!(key.fields().len(), 2);
    }

    #[test]
    fn test_keys_compare_on_content() {
        let mut a = arp_frame();
        let mut b = arp_frame();
        b[5] = 0x77;
        let pa = Packet::parsed(&mut a).unwrap();
        let pb = Packet::parsed(&mut b).unwrap();

        let list_a = [FieldId::Dot1qVlan, FieldId::EtherType];
        let list_b = list_a;
        let mut ka = DynamicFieldKey::new(&list_a).unwrap();
        let mut kb = DynamicFieldKey::new(&list_b).unwrap();
        ka.build(&pa).unwrap();
        kb.build(&pb).unwrap();
        assert_eq!(ka, kb);

        let mut set = std::collections::HashSet::new();
        set.insert(ka.clone());
        assert!(set.contains(&kb));
    }

    #[test]
    fn test_display() {
        let mut frame = arp_frame();
        let packet = Packet::parsed(&mut frame).unwrap();
        let list = [FieldId::Dot1qVlan, FieldId::Ip4Version, FieldId::EtherType];
        let mut key = DynamicFieldKey::new(&list).unwrap();
        key.build(&packet).unwrap();
        assert_eq!(
            key.to_string(),
            "mask=0x00000005 data=03fe0806 8021Q_VLAN=03fe ETHER_TYPE=0806"
        );

        fn mask_only(key: &DynamicFieldKey<'_>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{:b}", key.mask())
        }
        let key = key.with_dumper(KeyDumper::Custom(mask_only));
        assert_eq!(key.to_string(), "101");
    }
}
