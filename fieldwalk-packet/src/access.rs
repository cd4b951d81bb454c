//! Field access against a raw header buffer
//!
//! These primitives perform the bit arithmetic shared by every accessor. They
//! take the bytes of one header, starting at the header's first byte, and never
//! consult a header registry. [`Packet`](crate::Packet) resolves the header and
//! then delegates here.
//!
//! Narrow fields are assembled big-endian from the bytes covering
//! `width + shift` bits, shifted down by `shift` and masked to `width` bits.
//! Writes clear exactly that bit range, so neighbours sharing a byte survive:
//!
//! ```
//! use fieldwalk_packet::access::{field_get_header, field_set_header};
//! use fieldwalk_packet::catalog::fields;
//!
//! // 802.1Q tag: TPID 0x8100, PRI 1, CFI 1, VLAN 0x3FE
//! let mut tag = [0x81, 0x00, 0x33, 0xFE];
//! assert_eq!(field_get_header(&tag, fields::DOT1Q_VLAN).unwrap(), 0x3FE);
//!
//! field_set_header(&mut tag, fields::DOT1Q_VLAN, 0x123).unwrap();
//! assert_eq!(tag, [0x81, 0x00, 0x31, 0x23]);
//! assert_eq!(field_get_header(&tag, fields::DOT1Q_PRI).unwrap(), 1);
//! ```

use crate::catalog::{FieldInfo, NarrowField, WideField};
use fieldwalk_core::{Error, Result};
use std::ops::Range;

/// Bytes of `header` touched by the field
fn covering(header_len: usize, info: &FieldInfo, span: usize) -> Result<Range<usize>> {
    let end = info.offset + span;
    if end > header_len {
        return Err(Error::FieldOutOfBounds {
            field: info.field.name(),
            end,
            len: header_len,
        });
    }
    Ok(info.offset..end)
}

pub(crate) fn read_narrow(header: &[u8], info: &FieldInfo) -> Result<u32> {
    let range = covering(header.len(), info, info.span())?;
    let raw = header[range]
        .iter()
        .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte));
    Ok((raw >> info.shift) as u32 & info.mask())
}

pub(crate) fn write_narrow(header: &mut [u8], info: &FieldInfo, value: u32) -> Result<()> {
    let range = covering(header.len(), info, info.span())?;
    let bytes = &mut header[range];

    let mut raw = bytes
        .iter()
        .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte));
    let mask = u64::from(info.mask()) << info.shift;
    raw = (raw & !mask) | ((u64::from(value) << info.shift) & mask);

    for byte in bytes.iter_mut().rev() {
        *byte = raw as u8;
        raw >>= 8;
    }
    Ok(())
}

pub(crate) fn read_wide(header: &[u8], info: &FieldInfo, dst: &mut [u8]) -> Result<()> {
    let len = info.byte_width();
    if dst.len() < len {
        return Err(Error::BufferTooSmall {
            needed: len,
            actual: dst.len(),
        });
    }
    let range = covering(header.len(), info, len)?;
    dst[..len].copy_from_slice(&header[range]);
    Ok(())
}

pub(crate) fn write_wide(header: &mut [u8], info: &FieldInfo, src: Option<&[u8]>) -> Result<()> {
    let len = info.byte_width();
    let range = covering(header.len(), info, len)?;
    match src {
        Some(src) if src.len() < len => Err(Error::BufferTooSmall {
            needed: len,
            actual: src.len(),
        }),
        Some(src) => {
            header[range].copy_from_slice(&src[..len]);
            Ok(())
        }
        None => {
            header[range].fill(0);
            Ok(())
        }
    }
}

/// Read a narrow field from a header buffer
pub fn field_get_header(header: &[u8], field: NarrowField) -> Result<u32> {
    read_narrow(header, field.info())
}

/// Write a narrow field into a header buffer
///
/// Bits of `value` above the field width are discarded.
pub fn field_set_header(header: &mut [u8], field: NarrowField, value: u32) -> Result<()> {
    write_narrow(header, field.info(), value)
}

/// Copy a wide field out of a header buffer
///
/// `dst` must hold at least `ceil(width / 8)` bytes; only that prefix is written.
pub fn wide_field_get_header(header: &[u8], field: WideField, dst: &mut [u8]) -> Result<()> {
    read_wide(header, field.info(), dst)
}

/// Copy a wide field into a header buffer, or zero it when `src` is `None`
pub fn wide_field_set_header(header: &mut [u8], field: WideField, src: Option<&[u8]>) -> Result<()> {
    write_wide(header, field.info(), src)
}
