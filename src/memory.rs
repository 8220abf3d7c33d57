//! Destination memory abstraction.
//!
//! The loader never writes guest memory directly. It goes through a
//! [`MemorySpace`], so the same reader can stage an image into emulated RAM,
//! a test double, or anything else that can take bytes at an address.

pub mod flat;

/// An address space that loadable segments are copied into.
pub trait MemorySpace {
    /// Addresses at or above this bound lie outside low memory. A load
    /// restricted to low memory skips any segment starting there.
    fn low_memory_bound(&self) -> u32;

    /// Copies `data` to `address`.
    fn copy_bytes(&mut self, address: u32, data: &[u8]);

    /// Writes `len` zero bytes starting at `address`.
    fn zero_fill(&mut self, address: u32, len: u32);
}
