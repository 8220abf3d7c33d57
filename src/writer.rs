//! ELF32 image writer.
//!
//! Builds small but well-formed executables in memory: file header, program
//! headers, segment data, section data, a section name table, and the
//! section header table. Used to produce fixtures for the reader.

use object::elf;
use object::endian::{U16, U32};
use object::pod::bytes_of;
use object::Endianness;

use crate::utils::align_up;

const EHDR_SIZE: usize = core::mem::size_of::<elf::FileHeader32<Endianness>>();
const PHDR_SIZE: usize = core::mem::size_of::<elf::ProgramHeader32<Endianness>>();
const SHDR_SIZE: usize = core::mem::size_of::<elf::SectionHeader32<Endianness>>();

struct SegmentSpec {
    kind: u32,
    flags: u32,
    vaddr: u32,
    data: Vec<u8>,
    mem_size: u32,
}

struct SectionSpec {
    name: String,
    kind: u32,
    addr: u32,
    data: Vec<u8>,
    /// Only differs from `data.len()` for NOBITS sections.
    size: u32,
    link: u32,
    entsize: u32,
}

/// One `.symtab` entry to emit.
#[derive(Debug, Clone)]
pub struct SymbolSpec {
    pub name: String,
    pub value: u32,
    pub size: u32,
    /// Raw `st_info`: binding in the high nibble, type in the low nibble.
    pub info: u8,
    pub shndx: u16,
}

impl SymbolSpec {
    pub fn function(name: &str, value: u32, size: u32) -> Self {
        Self::with_type(name, value, size, elf::STT_FUNC)
    }

    pub fn object(name: &str, value: u32, size: u32) -> Self {
        Self::with_type(name, value, size, elf::STT_OBJECT)
    }

    /// A global symbol of the given `STT_*` type.
    pub fn with_type(name: &str, value: u32, size: u32, st_type: u8) -> Self {
        Self {
            name: name.to_string(),
            value,
            size,
            info: (elf::STB_GLOBAL << 4) | (st_type & 0xf),
            shndx: 1,
        }
    }
}

/// Builder for an ELF32 executable image.
pub struct ImageBuilder {
    endian: Endianness,
    kind: u16,
    machine: u16,
    entry: u32,
    flags: u32,
    segments: Vec<SegmentSpec>,
    sections: Vec<SectionSpec>,
}

impl ImageBuilder {
    /// An empty PowerPC executable in the given byte order.
    pub fn new(endian: Endianness) -> Self {
        Self {
            endian,
            kind: elf::ET_EXEC,
            machine: elf::EM_PPC,
            entry: 0,
            flags: 0,
            segments: Vec::new(),
            sections: Vec::new(),
        }
    }

    pub fn kind(mut self, kind: u16) -> Self {
        self.kind = kind;
        self
    }

    pub fn machine(mut self, machine: u16) -> Self {
        self.machine = machine;
        self
    }

    pub fn entry(mut self, entry: u32) -> Self {
        self.entry = entry;
        self
    }

    pub fn flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    /// Adds a program header whose file bytes are `data`.
    pub fn segment(mut self, kind: u32, flags: u32, vaddr: u32, data: &[u8], mem_size: u32) -> Self {
        self.segments.push(SegmentSpec {
            kind,
            flags,
            vaddr,
            data: data.to_vec(),
            mem_size,
        });
        self
    }

    /// Adds a section with file contents. Section 0 is always the null
    /// section, so the first call creates section 1.
    pub fn section(mut self, name: &str, kind: u32, data: &[u8]) -> Self {
        self.sections.push(SectionSpec {
            name: name.to_string(),
            kind,
            addr: 0,
            data: data.to_vec(),
            size: data.len() as u32,
            link: 0,
            entsize: 0,
        });
        self
    }

    /// Adds a section that occupies memory but no file space.
    pub fn nobits_section(mut self, name: &str, addr: u32, size: u32) -> Self {
        self.sections.push(SectionSpec {
            name: name.to_string(),
            kind: elf::SHT_NOBITS,
            addr,
            data: Vec::new(),
            size,
            link: 0,
            entsize: 0,
        });
        self
    }

    /// Adds `.symtab` and its `.strtab`, linked together. A null symbol is
    /// emitted first, as toolchains do.
    pub fn symbol_table(mut self, symbols: &[SymbolSpec]) -> Self {
        let e = self.endian;
        let mut strtab = vec![0u8];
        let mut symtab = Vec::with_capacity((symbols.len() + 1) * 16);

        let null = elf::Sym32::<Endianness> {
            st_name: u32(e, 0),
            st_value: u32(e, 0),
            st_size: u32(e, 0),
            st_info: 0,
            st_other: 0,
            st_shndx: u16(e, 0),
        };
        symtab.extend_from_slice(bytes_of(&null));

        for symbol in symbols {
            let name = strtab.len() as u32;
            strtab.extend_from_slice(symbol.name.as_bytes());
            strtab.push(0);

            let sym = elf::Sym32::<Endianness> {
                st_name: u32(e, name),
                st_value: u32(e, symbol.value),
                st_size: u32(e, symbol.size),
                st_info: symbol.info,
                st_other: 0,
                st_shndx: u16(e, symbol.shndx),
            };
            symtab.extend_from_slice(bytes_of(&sym));
        }

        // Header indices are offset by the null section.
        let strtab_index = self.sections.len() as u32 + 2;
        self.sections.push(SectionSpec {
            name: ".symtab".to_string(),
            kind: elf::SHT_SYMTAB,
            addr: 0,
            size: symtab.len() as u32,
            data: symtab,
            link: strtab_index,
            entsize: core::mem::size_of::<elf::Sym32<Endianness>>() as u32,
        });
        self.section(".strtab", elf::SHT_STRTAB, &strtab)
    }

    /// Serializes the image.
    pub fn build(self) -> Vec<u8> {
        let e = self.endian;

        // Section name table, with `.shstrtab` itself as the last section.
        let mut shstrtab = vec![0u8];
        let mut name_offsets = Vec::with_capacity(self.sections.len() + 1);
        for section in &self.sections {
            name_offsets.push(shstrtab.len() as u32);
            shstrtab.extend_from_slice(section.name.as_bytes());
            shstrtab.push(0);
        }
        let shstrtab_name = shstrtab.len() as u32;
        shstrtab.extend_from_slice(b".shstrtab\0");

        let num_sections = self.sections.len() + 2;
        let phoff = if self.segments.is_empty() { 0 } else { EHDR_SIZE };
        let mut offset = EHDR_SIZE + PHDR_SIZE * self.segments.len();

        let mut segment_offsets = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            segment_offsets.push(offset);
            offset += segment.data.len();
        }
        let mut section_offsets = Vec::with_capacity(self.sections.len());
        for section in &self.sections {
            section_offsets.push(offset);
            offset += section.data.len();
        }
        let shstrtab_offset = offset;
        offset += shstrtab.len();
        let shoff = align_up(offset, 4);

        let file_header = elf::FileHeader32::<Endianness> {
            e_ident: elf::Ident {
                magic: elf::ELFMAG,
                class: elf::ELFCLASS32,
                data: match e {
                    Endianness::Big => elf::ELFDATA2MSB,
                    Endianness::Little => elf::ELFDATA2LSB,
                },
                version: elf::EV_CURRENT,
                os_abi: elf::ELFOSABI_SYSV,
                abi_version: 0,
                padding: [0; 7],
            },
            e_type: u16(e, self.kind),
            e_machine: u16(e, self.machine),
            e_version: u32(e, elf::EV_CURRENT as u32),
            e_entry: u32(e, self.entry),
            e_phoff: u32(e, phoff as u32),
            e_shoff: u32(e, shoff as u32),
            e_flags: u32(e, self.flags),
            e_ehsize: u16(e, EHDR_SIZE as u16),
            e_phentsize: u16(e, PHDR_SIZE as u16),
            e_phnum: u16(e, self.segments.len() as u16),
            e_shentsize: u16(e, SHDR_SIZE as u16),
            e_shnum: u16(e, num_sections as u16),
            e_shstrndx: u16(e, num_sections as u16 - 1),
        };

        let mut buffer = Vec::with_capacity(shoff + SHDR_SIZE * num_sections);
        buffer.extend_from_slice(bytes_of(&file_header));

        for (segment, &file_offset) in self.segments.iter().zip(&segment_offsets) {
            let prog_header = elf::ProgramHeader32::<Endianness> {
                p_type: u32(e, segment.kind),
                p_offset: u32(e, file_offset as u32),
                p_vaddr: u32(e, segment.vaddr),
                p_paddr: u32(e, segment.vaddr),
                p_filesz: u32(e, segment.data.len() as u32),
                p_memsz: u32(e, segment.mem_size),
                p_flags: u32(e, segment.flags),
                p_align: u32(e, 4),
            };
            buffer.extend_from_slice(bytes_of(&prog_header));
        }

        for segment in &self.segments {
            buffer.extend_from_slice(&segment.data);
        }
        for section in &self.sections {
            buffer.extend_from_slice(&section.data);
        }
        buffer.extend_from_slice(&shstrtab);
        buffer.resize(shoff, 0);

        let null_section = elf::SectionHeader32::<Endianness> {
            sh_name: u32(e, 0),
            sh_type: u32(e, elf::SHT_NULL),
            sh_flags: u32(e, 0),
            sh_addr: u32(e, 0),
            sh_offset: u32(e, 0),
            sh_size: u32(e, 0),
            sh_link: u32(e, 0),
            sh_info: u32(e, 0),
            sh_addralign: u32(e, 0),
            sh_entsize: u32(e, 0),
        };
        buffer.extend_from_slice(bytes_of(&null_section));

        for ((section, &name), &file_offset) in
            self.sections.iter().zip(&name_offsets).zip(&section_offsets)
        {
            let flags = match section.kind {
                elf::SHT_PROGBITS => elf::SHF_ALLOC | elf::SHF_EXECINSTR,
                elf::SHT_NOBITS => elf::SHF_ALLOC | elf::SHF_WRITE,
                _ => 0,
            };
            let sec_header = elf::SectionHeader32::<Endianness> {
                sh_name: u32(e, name),
                sh_type: u32(e, section.kind),
                sh_flags: u32(e, flags),
                sh_addr: u32(e, section.addr),
                sh_offset: u32(e, file_offset as u32),
                sh_size: u32(e, section.size),
                sh_link: u32(e, section.link),
                sh_info: u32(e, 0),
                sh_addralign: u32(e, 1),
                sh_entsize: u32(e, section.entsize),
            };
            buffer.extend_from_slice(bytes_of(&sec_header));
        }

        let shstrtab_header = elf::SectionHeader32::<Endianness> {
            sh_name: u32(e, shstrtab_name),
            sh_type: u32(e, elf::SHT_STRTAB),
            sh_flags: u32(e, 0),
            sh_addr: u32(e, 0),
            sh_offset: u32(e, shstrtab_offset as u32),
            sh_size: u32(e, shstrtab.len() as u32),
            sh_link: u32(e, 0),
            sh_info: u32(e, 0),
            sh_addralign: u32(e, 1),
            sh_entsize: u32(e, 0),
        };
        buffer.extend_from_slice(bytes_of(&shstrtab_header));

        buffer
    }
}

fn u16(e: Endianness, v: u16) -> U16<Endianness> {
    U16::new(e, v)
}

fn u32(e: Endianness, v: u32) -> U32<Endianness> {
    U32::new(e, v)
}
