//! fieldwalk core library
//!
//! This crate provides the error taxonomy and the small value types shared
//! by the fieldwalk packet engine and its command-line driver.

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
