#![allow(dead_code)]

use elfboot::memory::MemorySpace;
use elfboot::symbol::{SymbolKind, SymbolRegistry};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryOp {
    Copy { address: u32, data: Vec<u8> },
    Zero { address: u32, len: u32 },
}

/// Records every write instead of performing it.
pub struct RecordingMemory {
    pub bound: u32,
    pub ops: Vec<MemoryOp>,
}

impl RecordingMemory {
    pub fn new(bound: u32) -> Self {
        Self { bound, ops: Vec::new() }
    }

    pub fn copied_addresses(&self) -> Vec<u32> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                MemoryOp::Copy { address, .. } => Some(*address),
                MemoryOp::Zero { .. } => None,
            })
            .collect()
    }
}

impl MemorySpace for RecordingMemory {
    fn low_memory_bound(&self) -> u32 {
        self.bound
    }

    fn copy_bytes(&mut self, address: u32, data: &[u8]) {
        self.ops.push(MemoryOp::Copy { address, data: data.to_vec() });
    }

    fn zero_fill(&mut self, address: u32, len: u32) {
        self.ops.push(MemoryOp::Zero { address, len });
    }
}

/// Records forwarded symbols and index builds.
#[derive(Default)]
pub struct RecordingRegistry {
    pub symbols: Vec<(u32, u32, String, SymbolKind)>,
    pub index_builds: usize,
}

impl SymbolRegistry for RecordingRegistry {
    fn add_symbol(&mut self, address: u32, size: u32, name: &str, kind: SymbolKind) {
        self.symbols.push((address, size, name.to_string(), kind));
    }

    fn build_index(&mut self) {
        self.index_builds += 1;
    }
}
