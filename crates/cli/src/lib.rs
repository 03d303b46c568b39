//! CLI tool for inspecting consistent hash rings.
//!
//! Builds a ring from addresses given on the command line and answers:
//! - Which server owns a key
//! - Which N distinct servers own a key
//! - The ring checksum and membership

pub mod commands;
pub mod config;

pub use commands::{Command, CommandResult};
pub use config::CliConfig;
