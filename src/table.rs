//! Program and section header tables.
//!
//! Each table entry is decoded from its on-disk record into a host-order
//! descriptor. Tables are located through the offsets, counts, and entry sizes
//! declared in the [`FileHeader`], and both tables must lie inside the image.

use anyhow::{anyhow, bail, Result};
use object::elf;
use object::pod::{self, Pod};
use object::Endianness;

use crate::header::FileHeader;

const PHDR_SIZE: usize = core::mem::size_of::<elf::ProgramHeader32<Endianness>>();
const SHDR_SIZE: usize = core::mem::size_of::<elf::SectionHeader32<Endianness>>();

/// A program header entry in host byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentDescriptor {
    pub kind: u32,
    pub flags: u32,
    /// File offset of the segment's bytes.
    pub offset: u32,
    pub vaddr: u32,
    pub paddr: u32,
    pub file_size: u32,
    /// Size in memory. Anything past `file_size` is bss.
    pub mem_size: u32,
    pub align: u32,
}

impl SegmentDescriptor {
    fn decode(raw: &elf::ProgramHeader32<Endianness>, endian: Endianness) -> Self {
        Self {
            kind: raw.p_type.get(endian),
            flags: raw.p_flags.get(endian),
            offset: raw.p_offset.get(endian),
            vaddr: raw.p_vaddr.get(endian),
            paddr: raw.p_paddr.get(endian),
            file_size: raw.p_filesz.get(endian),
            mem_size: raw.p_memsz.get(endian),
            align: raw.p_align.get(endian),
        }
    }

    pub fn is_loadable(&self) -> bool {
        self.kind == elf::PT_LOAD
    }

    /// Loadable and marked executable.
    pub fn is_code(&self) -> bool {
        self.is_loadable() && self.flags & elf::PF_X != 0
    }

    /// Number of zero-filled bytes following the file-backed part.
    pub fn bss_size(&self) -> u32 {
        self.mem_size.saturating_sub(self.file_size)
    }
}

/// A section header entry in host byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionDescriptor {
    /// Offset of the name in the section name string table.
    pub name: u32,
    pub kind: u32,
    pub flags: u32,
    pub addr: u32,
    pub offset: u32,
    pub size: u32,
    /// Associated section; for a symbol table this is its string table.
    pub link: u32,
    pub info: u32,
    pub addralign: u32,
    pub entsize: u32,
}

impl SectionDescriptor {
    fn decode(raw: &elf::SectionHeader32<Endianness>, endian: Endianness) -> Self {
        Self {
            name: raw.sh_name.get(endian),
            kind: raw.sh_type.get(endian),
            flags: raw.sh_flags.get(endian),
            addr: raw.sh_addr.get(endian),
            offset: raw.sh_offset.get(endian),
            size: raw.sh_size.get(endian),
            link: raw.sh_link.get(endian),
            info: raw.sh_info.get(endian),
            addralign: raw.sh_addralign.get(endian),
            entsize: raw.sh_entsize.get(endian),
        }
    }

    /// Null sections have no name and no data.
    pub fn is_null(&self) -> bool {
        self.kind == elf::SHT_NULL
    }

    /// Whether the section occupies bytes in the file.
    pub fn has_file_data(&self) -> bool {
        !self.is_null() && self.kind != elf::SHT_NOBITS
    }
}

/// Decodes the program header table declared by `header`.
pub fn read_segments(data: &[u8], header: &FileHeader) -> Result<Vec<SegmentDescriptor>> {
    let segments = read_table(
        data,
        "program header",
        header.phoff,
        header.phnum,
        header.phentsize,
        PHDR_SIZE,
        |raw: &elf::ProgramHeader32<Endianness>| SegmentDescriptor::decode(raw, header.endian),
    )?;

    // Only loadable segments are ever read, so only their ranges matter.
    for (i, segment) in segments.iter().enumerate() {
        if segment.is_loadable() {
            check_range(data, segment.offset, segment.file_size)
                .map_err(|e| anyhow!("segment {}: {}", i, e))?;
        }
    }
    Ok(segments)
}

/// Decodes the section header table declared by `header`.
pub fn read_sections(data: &[u8], header: &FileHeader) -> Result<Vec<SectionDescriptor>> {
    let sections = read_table(
        data,
        "section header",
        header.shoff,
        header.shnum,
        header.shentsize,
        SHDR_SIZE,
        |raw: &elf::SectionHeader32<Endianness>| SectionDescriptor::decode(raw, header.endian),
    )?;

    for (i, section) in sections.iter().enumerate() {
        if section.has_file_data() {
            check_range(data, section.offset, section.size)
                .map_err(|e| anyhow!("section {}: {}", i, e))?;
        }
    }
    Ok(sections)
}

fn read_table<T: Pod, D, F: Fn(&T) -> D>(
    data: &[u8],
    what: &str,
    offset: u32,
    count: u16,
    entry_size: u16,
    record_size: usize,
    decode: F,
) -> Result<Vec<D>> {
    if count == 0 {
        return Ok(Vec::new());
    }
    let entry_size = entry_size as usize;
    if entry_size < record_size {
        bail!(
            "{} entry size {} is smaller than the ELF32 record ({} bytes)",
            what,
            entry_size,
            record_size
        );
    }

    let start = offset as usize;
    let end = (count as usize)
        .checked_mul(entry_size)
        .and_then(|len| start.checked_add(len))
        .filter(|&end| end <= data.len())
        .ok_or_else(|| {
            anyhow!(
                "{} table at {:#x} ({} entries of {} bytes) runs past the end of the image ({} bytes)",
                what,
                offset,
                count,
                entry_size,
                data.len()
            )
        })?;

    data[start..end]
        .chunks_exact(entry_size)
        .map(|entry| {
            pod::from_bytes::<T>(entry)
                .map(|(raw, _)| decode(raw))
                .map_err(|()| anyhow!("malformed {} entry", what))
        })
        .collect()
}

fn check_range(data: &[u8], offset: u32, size: u32) -> Result<()> {
    let end = (offset as usize).checked_add(size as usize);
    match end {
        Some(end) if end <= data.len() => Ok(()),
        _ => bail!(
            "file range {:#x}+{:#x} lies outside the image ({} bytes)",
            offset,
            size,
            data.len()
        ),
    }
}
