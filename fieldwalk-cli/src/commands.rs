//! Command implementations
//!
//! Each command takes its parsed arguments and returns the text to print, so
//! the binary only has to write it out.

use crate::args::Commands;
use fieldwalk_core::{Error, Result};
use fieldwalk_packet::catalog::{self, FieldLayout};
use fieldwalk_packet::{DynamicFieldKey, FieldId, HeaderId, Packet, PacketFormat};
use std::fmt::Write;
use tracing::{debug, info};

/// Decode a frame written as hex, ignoring `{`, `}`, `.` and whitespace
pub fn parse_frame(text: &str) -> Result<Vec<u8>> {
    let digits: String = text
        .chars()
        .filter(|c| !matches!(c, '{' | '}' | '.') && !c.is_whitespace())
        .collect();
    hex::decode(&digits).map_err(|e| Error::parse(format!("invalid frame hex: {}", e)))
}

/// Parse a narrow field value, decimal or `0x` prefixed hex
pub fn parse_value(text: &str) -> Result<u32> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(digits) => u32::from_str_radix(digits, 16),
        None => text.parse(),
    };
    parsed.map_err(|e| Error::parse(format!("invalid value '{}': {}", text, e)))
}

/// Run a command and return its output
pub fn run(command: &Commands) -> Result<String> {
    match command {
        Commands::Fields { header } => fields(header.as_deref()),
        Commands::Dump { frame } => dump(frame),
        Commands::Get { frame, field } => get(frame, field),
        Commands::Set {
            frame,
            field,
            value,
            update,
        } => set(frame, field, value, *update),
        Commands::Format { frame, format } => convert(frame, format),
        Commands::Key { frame, fields } => key(frame, fields),
    }
}

fn fields(header: Option<&str>) -> Result<String> {
    let header = header.map(str::parse::<HeaderId>).transpose()?;
    let mut out = String::new();
    for info in catalog::iter().filter(|i| header.map_or(true, |h| i.header == h)) {
        let _ = writeln!(
            out,
            "{:<28} {:<18} offset={:<3} width={:<4} shift={}",
            info.field, info.header, info.offset, info.width, info.shift
        );
    }
    Ok(out)
}

fn dump(frame: &str) -> Result<String> {
    let mut data = parse_frame(frame)?;
    let packet = Packet::parsed(&mut data)?;
    Ok(format!(
        "format={} length={}\n{}",
        packet.format(),
        packet.len(),
        packet.dump()
    ))
}

fn get(frame: &str, field: &str) -> Result<String> {
    let mut data = parse_frame(frame)?;
    let packet = Packet::parsed(&mut data)?;
    let field: FieldId = field.parse()?;
    let info = field.info()?;

    match info.layout() {
        Some(FieldLayout::Wide) => {
            let mut value = vec![0u8; info.byte_width()];
            packet.wide_field_get(field, &mut value)?;
            Ok(format!("{}={}", field, hex::encode(value)))
        }
        _ => {
            let value = packet.field_get(field)?;
            Ok(format!("{}=0x{:x} ({})", field, value, value))
        }
    }
}

fn set(frame: &str, field: &str, value: &str, update: bool) -> Result<String> {
    let mut data = parse_frame(frame)?;
    let mut packet = Packet::parsed(&mut data)?;
    let field: FieldId = field.parse()?;

    match field.info()?.layout() {
        Some(FieldLayout::Wide) => packet.wide_field_set(field, Some(&parse_frame(value)?[..]))?,
        _ => packet.field_set(field, parse_value(value)?)?,
    }
    if update {
        let updated = packet.update_checksums();
        info!("updated {} checksums", updated);
    }
    Ok(hex::encode(packet.data()))
}

fn convert(frame: &str, format: &str) -> Result<String> {
    let mut data = parse_frame(frame)?;
    let mut packet = Packet::parsed(&mut data)?;
    let target = PacketFormat::try_from(format.parse::<HeaderId>()?)?;

    let change = packet.set_format(target)?;
    debug!("format change to {}: reallocated={}", target, change.is_reallocated());
    Ok(hex::encode(packet.data()))
}

fn key(frame: &str, names: &[String]) -> Result<String> {
    let mut data = parse_frame(frame)?;
    let packet = Packet::parsed(&mut data)?;
    let list = names
        .iter()
        .map(|name| name.parse())
        .collect::<Result<Vec<FieldId>>>()?;

    let mut key = DynamicFieldKey::new(&list)?;
    key.build(&packet)?;
    Ok(key.to_string())
}
