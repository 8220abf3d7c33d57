//! Symbol table extraction.
//!
//! Walks `.symtab`, keeps sized data and function symbols, and hands them to a
//! [`SymbolRegistry`]. [`SymbolDb`] is the in-crate registry: it keeps symbols
//! by address and answers address and name queries once indexed.

use object::elf;
use object::pod;
use object::read::SectionIndex;
use object::Endianness;
use std::collections::{BTreeMap, HashMap};

use crate::reader::ElfReader;
use crate::utils::c_str_at;

const SYMBOL_SIZE: usize = core::mem::size_of::<elf::Sym32<Endianness>>();

/// What a symbol names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Data,
    Function,
}

/// Receives symbols extracted from an executable.
pub trait SymbolRegistry {
    fn add_symbol(&mut self, address: u32, size: u32, name: &str, kind: SymbolKind);

    /// Called once after the last [`SymbolRegistry::add_symbol`].
    fn build_index(&mut self);
}

/// A known symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub address: u32,
    pub size: u32,
    pub name: String,
    pub kind: SymbolKind,
}

impl Symbol {
    /// Whether `address` falls inside this symbol's range.
    pub fn contains(&self, address: u32) -> bool {
        address >= self.address && (address - self.address) < self.size
    }
}

/// Address-ordered symbol store.
///
/// Adding a symbol at an address that is already known replaces it. Name
/// lookups reflect the state at the last [`SymbolRegistry::build_index`].
#[derive(Debug, Default)]
pub struct SymbolDb {
    by_address: BTreeMap<u32, Symbol>,
    by_name: HashMap<String, u32>,
}

impl SymbolDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_address.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_address.is_empty()
    }

    /// Symbols in ascending address order.
    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.by_address.values()
    }

    /// The symbol whose range contains `address`.
    pub fn lookup(&self, address: u32) -> Option<&Symbol> {
        self.by_address
            .range(..=address)
            .next_back()
            .map(|(_, symbol)| symbol)
            .filter(|symbol| symbol.contains(address))
    }

    pub fn by_name(&self, name: &str) -> Option<&Symbol> {
        let address = self.by_name.get(name)?;
        self.by_address.get(address)
    }
}

impl SymbolRegistry for SymbolDb {
    fn add_symbol(&mut self, address: u32, size: u32, name: &str, kind: SymbolKind) {
        self.by_address.insert(
            address,
            Symbol {
                address,
                size,
                name: name.to_string(),
                kind,
            },
        );
    }

    fn build_index(&mut self) {
        self.by_name = self
            .by_address
            .values()
            .map(|symbol| (symbol.name.clone(), symbol.address))
            .collect();
        tracing::debug!("Indexed {} symbols", self.by_address.len());
    }
}

impl ElfReader {
    /// Forwards the data and function symbols of `.symtab` to `registry`,
    /// then asks it to build its index. The index build happens even when the
    /// image has no symbol table.
    ///
    /// Returns whether at least one symbol was forwarded.
    pub fn load_symbols<R: SymbolRegistry + ?Sized>(&self, registry: &mut R) -> bool {
        let has_symbols = self.forward_symbols(registry);
        registry.build_index();
        has_symbols
    }

    fn forward_symbols<R: SymbolRegistry + ?Sized>(&self, registry: &mut R) -> bool {
        let Some(symtab) = self.find_section(".symtab") else {
            tracing::debug!("No .symtab section");
            return false;
        };
        let Some(data) = self.section_data(symtab) else {
            return false;
        };
        let strings = self.section_data(SectionIndex(self.section(symtab).link as usize));

        let count = data.len() / SYMBOL_SIZE;
        let Ok((symbols, _)) = pod::slice_from_bytes::<elf::Sym32<Endianness>>(data, count) else {
            return false;
        };

        if self.requires_relocation() {
            // Section base addresses are only known after relocation, which
            // this loader does not do.
            tracing::warn!("Relocatable image: symbol values are forwarded unadjusted");
        }

        let endian = self.header().endian;
        let mut has_symbols = false;
        for sym in symbols {
            let size = sym.st_size.get(endian);
            if size == 0 {
                continue;
            }
            let kind = match sym.st_info & 0xf {
                elf::STT_OBJECT => SymbolKind::Data,
                elf::STT_FUNC => SymbolKind::Function,
                _ => continue,
            };

            let name = strings
                .and_then(|table| c_str_at(table, sym.st_name.get(endian) as usize))
                .unwrap_or_default();
            let name = String::from_utf8_lossy(name);

            registry.add_symbol(sym.st_value.get(endian), size, &name, kind);
            has_symbols = true;
        }

        tracing::info!("Loaded symbols from {} symbol table entries", count);
        has_symbols
    }
}
