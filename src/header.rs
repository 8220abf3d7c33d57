//! ELF32 file header decoding.
//!
//! The on-disk header is read through `object`'s pod record and every
//! multi-byte field is converted to host order exactly once, into a plain
//! [`FileHeader`]. The image bytes themselves are never rewritten, so there is
//! no way to normalize the same data twice.

use anyhow::{anyhow, bail, Result};
use object::elf;
use object::pod;
use object::Endianness;

/// Size of the on-disk ELF32 file header.
pub const HEADER_SIZE: usize = core::mem::size_of::<elf::FileHeader32<Endianness>>();

/// The ELF32 file header in host byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    /// Byte order of every multi-byte field in the image.
    pub endian: Endianness,
    /// Object file type (`ET_EXEC`, `ET_REL`, ...).
    pub kind: u16,
    /// Target machine (`EM_PPC` for the images this crate is aimed at).
    pub machine: u16,
    pub version: u32,
    /// Virtual address of the entry point.
    pub entry: u32,
    /// File offset of the program header table.
    pub phoff: u32,
    /// File offset of the section header table.
    pub shoff: u32,
    pub flags: u32,
    pub ehsize: u16,
    pub phentsize: u16,
    pub phnum: u16,
    pub shentsize: u16,
    pub shnum: u16,
    /// Index of the section holding section names.
    pub shstrndx: u16,
}

impl FileHeader {
    /// Decodes the header at the start of `data`.
    ///
    /// Fails if the buffer is too short, the magic is wrong, the class is not
    /// 32-bit, or the data encoding is unknown.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let (raw, _) = pod::from_bytes::<elf::FileHeader32<Endianness>>(data).map_err(|()| {
            anyhow!(
                "image too small for an ELF header ({} bytes, need {})",
                data.len(),
                HEADER_SIZE
            )
        })?;

        let ident = &raw.e_ident;
        if ident.magic != elf::ELFMAG {
            bail!("bad ELF magic {:02x?}", ident.magic);
        }
        if ident.class != elf::ELFCLASS32 {
            bail!("unsupported ELF class {} (only 32-bit images are supported)", ident.class);
        }
        let endian = match ident.data {
            elf::ELFDATA2MSB => Endianness::Big,
            elf::ELFDATA2LSB => Endianness::Little,
            other => bail!("unknown ELF data encoding {}", other),
        };

        Ok(Self {
            endian,
            kind: raw.e_type.get(endian),
            machine: raw.e_machine.get(endian),
            version: raw.e_version.get(endian),
            entry: raw.e_entry.get(endian),
            phoff: raw.e_phoff.get(endian),
            shoff: raw.e_shoff.get(endian),
            flags: raw.e_flags.get(endian),
            ehsize: raw.e_ehsize.get(endian),
            phentsize: raw.e_phentsize.get(endian),
            phnum: raw.e_phnum.get(endian),
            shentsize: raw.e_shentsize.get(endian),
            shnum: raw.e_shnum.get(endian),
            shstrndx: raw.e_shstrndx.get(endian),
        })
    }

    /// Anything other than a plain executable would need relocating before it
    /// could run at its linked addresses.
    pub fn requires_relocation(&self) -> bool {
        self.kind != elf::ET_EXEC
    }
}
