//! Boot-time ELF loader.
//!
//! This library reads 32-bit ELF executables (big-endian PowerPC images in
//! practice) and stages them for execution. It is organized into several
//! modules:
//! - `config`: CLI configuration.
//! - `header`: ELF file header decoding.
//! - `table`: Program and section header tables.
//! - `reader`: The `ElfReader` aggregate and its section/segment accessors.
//! - `loader`: Copying loadable segments into a memory space.
//! - `symbol`: Symbol table extraction and the symbol registry.
//! - `platform`: GameCube/Wii detection heuristic.
//! - `memory`: Destination memory abstraction and a flat RAM backend.
//! - `writer`: ELF32 image builder for fixtures.

pub mod config;
pub mod header;
pub mod loader;
pub mod memory;
pub mod platform;
pub mod reader;
pub mod symbol;
pub mod table;
pub mod utils;
pub mod writer;
