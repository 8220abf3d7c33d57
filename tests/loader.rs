mod common;

use common::{MemoryOp, RecordingMemory};
use elfboot::memory::flat::FlatMemory;
use elfboot::memory::MemorySpace;
use elfboot::reader::ElfReader;
use elfboot::writer::ImageBuilder;
use object::{elf, Endianness};

const LOW_BOUND: u32 = 0x8180_0000;

fn two_region_image() -> ElfReader {
    let image = ImageBuilder::new(Endianness::Big)
        .entry(0x8000_3100)
        .segment(elf::PT_LOAD, elf::PF_R | elf::PF_X, 0x8000_3100, &[0x11; 0x20], 0x20)
        .segment(elf::PT_LOAD, elf::PF_R | elf::PF_W, 0x8000_8000, &[0x22; 0x10], 0x80)
        .segment(elf::PT_LOAD, elf::PF_R | elf::PF_W, 0x9000_0000, &[0x33; 0x10], 0x10)
        .build();
    ElfReader::new(image).unwrap()
}

#[test]
fn test_copy_then_zero_fill_bss() {
    let reader = two_region_image();
    let mut memory = RecordingMemory::new(LOW_BOUND);
    reader.load_into_memory(&mut memory, false).unwrap();

    assert_eq!(
        memory.ops,
        vec![
            MemoryOp::Copy { address: 0x8000_3100, data: vec![0x11; 0x20] },
            MemoryOp::Copy { address: 0x8000_8000, data: vec![0x22; 0x10] },
            MemoryOp::Zero { address: 0x8000_8010, len: 0x70 },
            MemoryOp::Copy { address: 0x9000_0000, data: vec![0x33; 0x10] },
        ]
    );
}

#[test]
fn test_bss_reads_as_zero_in_flat_memory() {
    let image = ImageBuilder::new(Endianness::Big)
        .segment(elf::PT_LOAD, elf::PF_R | elf::PF_W, 0x8000_1000, &[5, 6, 7], 0x103)
        .build();
    let reader = ElfReader::new(image).unwrap();

    let mut memory = FlatMemory::new(0x8000_0000, 0x4000, LOW_BOUND);
    memory.copy_bytes(0x8000_1000, &[0xee; 0x200]);
    reader.load_into_memory(&mut memory, false).unwrap();

    assert_eq!(memory.read(0x8000_1000, 3), Some(&[5, 6, 7][..]));
    assert!(memory.read(0x8000_1003, 0x100).unwrap().iter().all(|&b| b == 0));
    assert_eq!(memory.read(0x8000_1103, 1), Some(&[0xee][..]));
}

#[test]
fn test_low_memory_restriction() {
    let reader = two_region_image();

    let mut full = RecordingMemory::new(LOW_BOUND);
    reader.load_into_memory(&mut full, false).unwrap();
    let mut low = RecordingMemory::new(LOW_BOUND);
    reader.load_into_memory(&mut low, true).unwrap();

    assert_eq!(low.copied_addresses(), vec![0x8000_3100, 0x8000_8000]);
    let below_bound: Vec<_> = full
        .ops
        .iter()
        .filter(|op| match op {
            MemoryOp::Copy { address, .. } | MemoryOp::Zero { address, .. } => *address < LOW_BOUND,
        })
        .cloned()
        .collect();
    assert_eq!(low.ops, below_bound);
}

#[test]
fn test_segment_exactly_at_bound_is_skipped() {
    let image = ImageBuilder::new(Endianness::Big)
        .segment(elf::PT_LOAD, elf::PF_R, LOW_BOUND, &[1; 4], 4)
        .segment(elf::PT_LOAD, elf::PF_R, LOW_BOUND - 4, &[2; 4], 4)
        .build();
    let reader = ElfReader::new(image).unwrap();
    let mut memory = RecordingMemory::new(LOW_BOUND);
    reader.load_into_memory(&mut memory, true).unwrap();
    assert_eq!(memory.copied_addresses(), vec![LOW_BOUND - 4]);
}

#[test]
fn test_non_loadable_segments_skipped() {
    let image = ImageBuilder::new(Endianness::Big)
        .segment(elf::PT_NOTE, elf::PF_R, 0x8000_0000, &[1; 8], 8)
        .segment(elf::PT_LOAD, elf::PF_R, 0x8000_1000, &[2; 8], 8)
        .build();
    let reader = ElfReader::new(image).unwrap();
    let mut memory = RecordingMemory::new(LOW_BOUND);
    reader.load_into_memory(&mut memory, false).unwrap();
    assert_eq!(memory.ops, vec![MemoryOp::Copy { address: 0x8000_1000, data: vec![2; 8] }]);
}

#[test]
fn test_relocatable_image_writes_nothing() {
    for kind in [elf::ET_REL, elf::ET_DYN] {
        let image = ImageBuilder::new(Endianness::Big)
            .kind(kind)
            .segment(elf::PT_LOAD, elf::PF_R | elf::PF_X, 0x100, &[0xaa; 16], 64)
            .build();
        let reader = ElfReader::new(image).unwrap();
        assert!(reader.requires_relocation());

        let mut memory = RecordingMemory::new(LOW_BOUND);
        assert!(reader.load_into_memory(&mut memory, false).is_err());
        assert!(reader.load_into_memory(&mut memory, true).is_err());
        assert!(memory.ops.is_empty());
    }
}

#[test]
fn test_repeated_loads_are_identical() {
    let reader = two_region_image();
    let mut first = RecordingMemory::new(LOW_BOUND);
    let mut second = RecordingMemory::new(LOW_BOUND);
    reader.load_into_memory(&mut first, false).unwrap();
    reader.load_into_memory(&mut second, false).unwrap();
    assert_eq!(first.ops, second.ops);
}

#[test]
fn test_bad_note_offset_still_loads() {
    let image = ImageBuilder::new(Endianness::Big)
        .segment(elf::PT_NOTE, elf::PF_R, 0, &[0xcc; 4], 4)
        .segment(elf::PT_LOAD, elf::PF_R | elf::PF_X, 0x8000_3100, &[0x60; 8], 8)
        .build();
    let phdr = u32::from_be_bytes([image[0x1c], image[0x1d], image[0x1e], image[0x1f]]) as usize;

    let mut patched = image;
    patched[phdr + 4..phdr + 8].copy_from_slice(&0x00ff_0000u32.to_be_bytes());
    let reader = ElfReader::new(patched).unwrap();
    assert_eq!(reader.segment_data(0), None);
    assert_eq!(reader.segment_data(1), Some(&[0x60; 8][..]));

    let mut memory = RecordingMemory::new(LOW_BOUND);
    reader.load_into_memory(&mut memory, false).unwrap();
    assert_eq!(memory.ops, vec![MemoryOp::Copy { address: 0x8000_3100, data: vec![0x60; 8] }]);
}
