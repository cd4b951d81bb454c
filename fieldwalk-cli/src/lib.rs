//! CLI interface for fieldwalk
//!
//! This crate provides the command-line driver over `fieldwalk-packet`:
//! argument parsing and the commands that parse, dump and rewrite frames.

pub mod args;
pub mod commands;

pub use args::{Cli, Commands};
pub use commands::{parse_frame, parse_value, run};
