//! The ELF reader.
//!
//! [`ElfReader`] owns the executable image and everything derived from it:
//! the decoded file header and both descriptor tables. All of it is computed
//! once in the constructor. Loading, symbol extraction, and the platform scan
//! live in their own modules as further `impl ElfReader` blocks.

use anyhow::{Context, Result};
use memmap2::Mmap;
use object::elf;
use object::read::SectionIndex;
use std::fs::File;
use std::ops::Deref;
use std::path::Path;

use crate::header::FileHeader;
use crate::table::{self, SectionDescriptor, SegmentDescriptor};
use crate::utils::c_str_at;

/// Storage for the executable bytes.
pub enum Image {
    Owned(Vec<u8>),
    Mapped(Mmap),
}

impl Deref for Image {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Image::Owned(bytes) => &bytes[..],
            Image::Mapped(mmap) => &mmap[..],
        }
    }
}

/// A parsed 32-bit ELF executable.
pub struct ElfReader {
    image: Image,
    header: FileHeader,
    segments: Vec<SegmentDescriptor>,
    sections: Vec<SectionDescriptor>,
    entry_point: u32,
    relocate: bool,
}

impl ElfReader {
    /// Parses an image held in memory.
    pub fn new(bytes: Vec<u8>) -> Result<Self> {
        Self::from_image(Image::Owned(bytes))
    }

    /// Maps `path` into memory and parses it.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        let mmap = unsafe { Mmap::map(&file) }
            .with_context(|| format!("failed to map {}", path.display()))?;
        Self::from_image(Image::Mapped(mmap))
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    fn from_image(image: Image) -> Result<Self> {
        let header = FileHeader::parse(&image).context("invalid ELF header")?;
        let segments = table::read_segments(&image, &header)?;
        let sections = table::read_sections(&image, &header)?;

        tracing::debug!(
            "ELF image: {} bytes, {} segments, {} sections, entry {:#010x}",
            image.len(),
            segments.len(),
            sections.len(),
            header.entry
        );

        Ok(Self {
            entry_point: header.entry,
            relocate: header.requires_relocation(),
            image,
            header,
            segments,
            sections,
        })
    }

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// The raw image, exactly as it was read.
    pub fn image(&self) -> &[u8] {
        &self.image
    }

    pub fn entry_point(&self) -> u32 {
        self.entry_point
    }

    pub fn flags(&self) -> u32 {
        self.header.flags
    }

    pub fn machine(&self) -> u16 {
        self.header.machine
    }

    /// True when the image is not a plain executable. Such images are refused
    /// by [`ElfReader::load_into_memory`].
    pub fn requires_relocation(&self) -> bool {
        self.relocate
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn segments(&self) -> &[SegmentDescriptor] {
        &self.segments
    }

    /// # Panics
    ///
    /// Panics if `index >= self.segment_count()`.
    pub fn segment(&self, index: usize) -> &SegmentDescriptor {
        &self.segments[index]
    }

    /// The file-backed bytes of segment `index`, or `None` for out-of-range
    /// indices and segments whose file range lies outside the image.
    ///
    /// Loadable segments were bounds-checked at construction and always have
    /// data.
    pub fn segment_data(&self, index: usize) -> Option<&[u8]> {
        let segment = self.segments.get(index)?;
        let start = segment.offset as usize;
        self.image.get(start..start.checked_add(segment.file_size as usize)?)
    }

    pub fn segment_size(&self, index: usize) -> u32 {
        self.segments[index].file_size
    }

    pub fn segment_vaddr(&self, index: usize) -> u32 {
        self.segments[index].vaddr
    }

    pub fn segment_flags(&self, index: usize) -> u32 {
        self.segments[index].flags
    }

    pub fn is_code_segment(&self, index: usize) -> bool {
        self.segments[index].is_code()
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn sections(&self) -> &[SectionDescriptor] {
        &self.sections
    }

    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn section(&self, index: SectionIndex) -> &SectionDescriptor {
        &self.sections[index.0]
    }

    /// The file bytes of a section, or `None` for out-of-range indices and
    /// sections that occupy no file space (null, NOBITS).
    pub fn section_data(&self, index: SectionIndex) -> Option<&[u8]> {
        let section = self.sections.get(index.0)?;
        if !section.has_file_data() {
            return None;
        }
        let start = section.offset as usize;
        self.image.get(start..start + section.size as usize)
    }

    pub fn section_size(&self, index: SectionIndex) -> u32 {
        self.sections[index.0].size
    }

    pub fn section_addr(&self, index: SectionIndex) -> u32 {
        self.sections[index.0].addr
    }

    pub fn is_code_section(&self, index: SectionIndex) -> bool {
        self.sections[index.0].kind == elf::SHT_PROGBITS
    }

    /// Resolves a section's name through the section name string table.
    ///
    /// Returns `None` for null sections, when the name table is missing or
    /// null, or when the name is out of bounds or not UTF-8.
    pub fn section_name(&self, index: SectionIndex) -> Option<&str> {
        self.section_name_bytes(index)
            .and_then(|name| std::str::from_utf8(name).ok())
    }

    fn section_name_bytes(&self, index: SectionIndex) -> Option<&[u8]> {
        let section = self.sections.get(index.0)?;
        if section.is_null() {
            return None;
        }
        let names = self.section_data(SectionIndex(self.header.shstrndx as usize))?;
        c_str_at(names, section.name as usize)
    }

    /// Finds the first section at or after `first` whose name is exactly
    /// `name`. Null sections never match.
    pub fn section_by_name(&self, name: &str, first: usize) -> Option<SectionIndex> {
        (first..self.sections.len())
            .map(SectionIndex)
            .find(|&index| self.section_name_bytes(index) == Some(name.as_bytes()))
    }

    /// Same as [`ElfReader::section_by_name`] starting from the first section.
    pub fn find_section(&self, name: &str) -> Option<SectionIndex> {
        self.section_by_name(name, 0)
    }
}
