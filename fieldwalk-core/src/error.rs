//! Error types for fieldwalk

use thiserror::Error;

/// Result type alias for fieldwalk operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for fieldwalk
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Frame too short to hold an Ethernet header
    #[error("Packet parsing error: {0}")]
    Parse(String),

    /// The header owning a field is not present in the packet
    #[error("Header {header} not present")]
    HeaderAbsent { header: &'static str },

    /// Field identifier out of range or reserved
    #[error("Unknown field identifier {0}")]
    UnknownField(u16),

    /// Narrow accessor used on a field wider than 32 bits
    #[error("Field {0} is wider than 32 bits")]
    FieldTooWide(&'static str),

    /// Wide accessor used on a field of 32 bits or less
    #[error("Field {0} is 32 bits or narrower")]
    FieldTooNarrow(&'static str),

    /// Caller buffer cannot hold the field value
    #[error("Buffer too small: need {needed} bytes, have {actual}")]
    BufferTooSmall { needed: usize, actual: usize },

    /// The header is present but too short to contain the field
    #[error("Field {field} runs past the end of the packet ({end} > {len})")]
    FieldOutOfBounds {
        field: &'static str,
        end: usize,
        len: usize,
    },

    /// Synthetic header start outside the packet buffer
    #[error("Header offset {offset} outside packet of {len} bytes")]
    InvalidHeaderOffset { offset: usize, len: usize },

    /// Format conversion between anything but EtherII and 802.1Q
    #[error("Unsupported packet format: {0}")]
    UnsupportedFormat(String),

    /// Field was not present when the key was built
    #[error("Field {0} not present in key")]
    FieldAbsentInKey(&'static str),

    /// Key field list longer than its presence mask
    #[error("Too many key fields: {count} (max {max})")]
    TooManyKeyFields { count: usize, max: usize },

    /// Name lookup failed
    #[error("Unknown {kind} name '{name}'")]
    UnknownName { kind: &'static str, name: String },
}

impl Error {
    /// Create a parse error with a custom message
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        Error::Parse(msg.into())
    }

    /// Create a name lookup error
    pub fn unknown_name<S: Into<String>>(kind: &'static str, name: S) -> Self {
        Error::UnknownName {
            kind,
            name: name.into(),
        }
    }

    /// Whether the error only reports a missing header, which callers
    /// usually treat as "field not in this packet" rather than a fault
    pub fn is_absent(&self) -> bool {
        matches!(
            self,
            Error::HeaderAbsent { .. } | Error::FieldAbsentInKey(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::HeaderAbsent { header: "IP4" };
        assert_eq!(err.to_string(), "Header IP4 not present");

        let err = Error::BufferTooSmall {
            needed: 6,
            actual: 4,
        };
        assert_eq!(err.to_string(), "Buffer too small: need 6 bytes, have 4");
    }

    #[test]
    fn test_is_absent() {
        assert!(Error::HeaderAbsent { header: "TCP" }.is_absent());
        assert!(Error::FieldAbsentInKey("ICMP_TYPE").is_absent());
        assert!(!Error::UnknownField(3).is_absent());
        assert!(!Error::parse("short").is_absent());
    }
}
