//! Segment loading.
//!
//! Copies every `PT_LOAD` segment to its virtual address and zero-fills the
//! bss tail where the memory size exceeds the file size.

use anyhow::{bail, Result};

use crate::memory::MemorySpace;
use crate::reader::ElfReader;

impl ElfReader {
    /// Copies the loadable segments into `memory`.
    ///
    /// With `only_low_memory`, segments whose virtual address is at or above
    /// [`MemorySpace::low_memory_bound`] are skipped entirely.
    ///
    /// Relocatable images are refused before anything is written.
    pub fn load_into_memory<M: MemorySpace + ?Sized>(
        &self,
        memory: &mut M,
        only_low_memory: bool,
    ) -> Result<()> {
        tracing::info!("String section: {}", self.header().shstrndx);

        if self.requires_relocation() {
            tracing::error!(
                "Cannot load a relocatable ELF (type {}); relocation is not supported",
                self.header().kind
            );
            bail!(
                "relocatable ELF images are not supported (e_type {})",
                self.header().kind
            );
        }

        tracing::info!("{} segments:", self.segment_count());

        let bound = memory.low_memory_bound();
        for (i, segment) in self.segments().iter().enumerate() {
            tracing::info!(
                "Type: {} Vaddr: {:08x} Filesz: {} Memsz: {}",
                segment.kind,
                segment.vaddr,
                segment.file_size,
                segment.mem_size
            );

            if !segment.is_loadable() {
                continue;
            }
            if only_low_memory && segment.vaddr >= bound {
                tracing::debug!(
                    "Skipping segment {} at {:08x}: outside low memory (bound {:08x})",
                    i,
                    segment.vaddr,
                    bound
                );
                continue;
            }

            let Some(data) = self.segment_data(i) else {
                continue;
            };
            memory.copy_bytes(segment.vaddr, data);
            let bss = segment.bss_size();
            if bss > 0 {
                memory.zero_fill(segment.vaddr.wrapping_add(segment.file_size), bss);
            }

            tracing::info!(
                "Loadable segment copied to {:08x}, size {:08x}",
                segment.vaddr,
                segment.mem_size
            );
        }

        tracing::info!("Done loading.");
        Ok(())
    }
}
