//! Flat RAM backend.
//!
//! A single contiguous byte array mapped at a base address. Writes that fall
//! partly or entirely outside the array are clipped and logged.

use std::ops::Range;

use super::MemorySpace;

/// Guest RAM backed by one `Vec<u8>`.
pub struct FlatMemory {
    base: u32,
    ram: Vec<u8>,
    low_memory_bound: u32,
}

impl FlatMemory {
    /// Creates `size` bytes of zeroed RAM visible at `base`.
    pub fn new(base: u32, size: u32, low_memory_bound: u32) -> Self {
        Self {
            base,
            ram: vec![0; size as usize],
            low_memory_bound,
        }
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn size(&self) -> usize {
        self.ram.len()
    }

    /// Reads `len` bytes at `address`, or `None` if any of them are unmapped.
    pub fn read(&self, address: u32, len: usize) -> Option<&[u8]> {
        let start = address.checked_sub(self.base)? as usize;
        self.ram.get(start..start.checked_add(len)?)
    }

    /// Translates a guest range into the backing array, clipping at the end.
    fn backing_range(&self, address: u32, len: usize) -> Option<Range<usize>> {
        let start = address.checked_sub(self.base)? as usize;
        if start >= self.ram.len() {
            return None;
        }
        let end = start.saturating_add(len).min(self.ram.len());
        Some(start..end)
    }

    fn mapped(&self, address: u32, len: usize) -> Option<Range<usize>> {
        let range = self.backing_range(address, len);
        match &range {
            None => {
                tracing::warn!(
                    "Write of {:#x} bytes at {:#010x} is outside RAM ({:#010x}..{:#010x})",
                    len,
                    address,
                    self.base,
                    self.base as u64 + self.ram.len() as u64
                );
            }
            Some(r) if r.len() < len => {
                tracing::warn!(
                    "Write of {:#x} bytes at {:#010x} clipped to {:#x} bytes",
                    len,
                    address,
                    r.len()
                );
            }
            Some(_) => {}
        }
        range
    }
}

impl MemorySpace for FlatMemory {
    fn low_memory_bound(&self) -> u32 {
        self.low_memory_bound
    }

    fn copy_bytes(&mut self, address: u32, data: &[u8]) {
        if let Some(range) = self.mapped(address, data.len()) {
            let len = range.len();
            self.ram[range].copy_from_slice(&data[..len]);
        }
    }

    fn zero_fill(&mut self, address: u32, len: u32) {
        if let Some(range) = self.mapped(address, len as usize) {
            self.ram[range].fill(0);
        }
    }
}
