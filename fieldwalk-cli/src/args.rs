//! CLI argument parsing
//!
//! Frames are given as hex text. Digits may be grouped with `{...}`, `.` or
//! whitespace, so `{000000000001}{000000000002}{0800}` and
//! `00.00.00.00.00.01 ...` are both accepted.

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "fieldwalk")]
#[command(version, about = "Inspect and rewrite frame fields by name", long_about = None)]
pub struct Cli {
    /// Verbose output (-v, -vv, -vvv for increasing verbosity)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List every addressable field
    Fields {
        /// Only list fields of this header (e.g. IP4, 8021Q)
        #[arg(short = 'H', long, value_name = "HEADER")]
        header: Option<String>,
    },

    /// Parse a frame and print every present field
    Dump {
        /// Frame bytes in hex
        frame: String,
    },

    /// Print one field of a frame
    Get {
        /// Frame bytes in hex
        frame: String,

        /// Field name (e.g. IP4_SRC_ADDR)
        field: String,
    },

    /// Write one field and print the resulting frame
    Set {
        /// Frame bytes in hex
        frame: String,

        /// Field name (e.g. 8021Q_VLAN)
        field: String,

        /// Integer (decimal or 0x-prefixed) for narrow fields, hex bytes for wide ones
        value: String,

        /// Recompute IPv4, TCP, UDP and ICMP checksums after the write
        #[arg(short, long)]
        update: bool,
    },

    /// Convert a frame between untagged and 802.1Q framing
    Format {
        /// Frame bytes in hex
        frame: String,

        /// Target format (ETHERII or 8021Q)
        #[arg(value_name = "FORMAT")]
        format: String,
    },

    /// Build a dynamic field key from a frame
    Key {
        /// Frame bytes in hex
        frame: String,

        /// Fields to pack, in order
        #[arg(required = true, value_name = "FIELD")]
        fields: Vec<String>,
    },
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Default log filter for the requested verbosity
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
