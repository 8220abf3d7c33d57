//! Configuration module.
//!
//! This module defines the command-line interface (CLI) for the loader using `clap`.

use clap::Parser;
use std::num::ParseIntError;
use std::path::PathBuf;

/// Inspect a 32-bit ELF executable and stage it into emulated RAM.
///
/// Loads every PT_LOAD segment into a flat RAM image, extracts the symbol
/// table, and reports whether the binary looks like a Wii or GameCube build.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Input ELF executable
    pub input: PathBuf,

    /// Only load segments below the low memory bound
    #[arg(long)]
    pub low_memory_only: bool,

    /// Guest address where RAM starts
    #[arg(long, default_value = "0x80000000", value_parser = parse_address)]
    pub ram_base: u32,

    /// Size of RAM in bytes
    #[arg(long, default_value = "0x01800000", value_parser = parse_address)]
    pub ram_size: u32,

    /// First address outside low memory
    #[arg(long, default_value = "0x81800000", value_parser = parse_address)]
    pub low_memory_bound: u32,

    /// Print every extracted symbol
    #[arg(long)]
    pub symbols: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", help = "Set the logging level")]
    pub log_level: String,
}

/// Parses a decimal or `0x`-prefixed hexadecimal number.
pub fn parse_address(s: &str) -> Result<u32, ParseIntError> {
    let s = s.replace('_', "");
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    }
}
