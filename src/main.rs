//! Entry point for the elfboot tool.
//!
//! This file handles high-level application flow:
//! 1. Parse command-line arguments using `clap` and set up `tracing`.
//! 2. Map and parse the ELF executable.
//! 3. Load its segments into a flat RAM image.
//! 4. Extract the symbol table.
//! 5. Report the detected platform.
//!
//! A failed load is reported but does not stop steps 4 and 5; the process
//! still exits with the load error afterwards.
//!
//! Error handling is done via `anyhow`.

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use elfboot::config::Config;
use elfboot::memory::flat::FlatMemory;
use elfboot::platform::Platform;
use elfboot::reader::ElfReader;
use elfboot::symbol::{SymbolDb, SymbolKind};

fn main() -> Result<()> {
    let config = Config::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let reader = ElfReader::open(&config.input)?;
    println!(
        "{}: machine {}, entry {:#010x}, {} segments, {} sections",
        config.input.display(),
        reader.machine(),
        reader.entry_point(),
        reader.segment_count(),
        reader.section_count()
    );

    // A refused load still leaves the symbol table and code readable.
    let mut memory = FlatMemory::new(config.ram_base, config.ram_size, config.low_memory_bound);
    let loaded = reader.load_into_memory(&mut memory, config.low_memory_only);
    if let Err(err) = &loaded {
        eprintln!("Load failed: {:#}", err);
    }

    let mut symbols = SymbolDb::new();
    if reader.load_symbols(&mut symbols) {
        println!("{} symbols", symbols.len());
        if config.symbols {
            for symbol in symbols.iter() {
                let kind = match symbol.kind {
                    SymbolKind::Function => "func",
                    SymbolKind::Data => "data",
                };
                println!("{:08x} {:8x} {} {}", symbol.address, symbol.size, kind, symbol.name);
            }
        }
    } else {
        println!("No symbols");
    }

    let platform = match reader.platform() {
        Platform::Wii => "Wii",
        Platform::GameCube => "GameCube",
    };
    println!("Platform: {}", platform);

    loaded.with_context(|| format!("failed to load {}", config.input.display()))
}
