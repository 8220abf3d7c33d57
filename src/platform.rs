//! Platform detection.
//!
//! Wii executables touch HID4, which does not exist on the GameCube's
//! Gekko. Finding `mfspr rX, HID4` in a code segment is taken as a sign the
//! image targets the Wii. False positives and negatives are possible.

use object::Endianness;

use crate::reader::ElfReader;

/// `mfspr r0, HID4`; the mask ignores the destination register.
const HID4_PATTERN: u32 = 0x7c13_fba6;
const HID4_MASK: u32 = 0xfc1f_ffff;

/// Console family an executable was built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    GameCube,
    Wii,
}

impl ElfReader {
    /// Scans every executable `PT_LOAD` segment for an HID4 access.
    pub fn is_wii(&self) -> bool {
        // Convert the pattern to file order once so each word can be compared
        // as stored.
        let (pattern, mask) = match self.header().endian {
            Endianness::Big => (HID4_PATTERN.to_be(), HID4_MASK.to_be()),
            Endianness::Little => (HID4_PATTERN.to_le(), HID4_MASK.to_le()),
        };

        (0..self.segment_count())
            .filter(|&i| self.is_code_segment(i))
            .filter_map(|i| self.segment_data(i))
            .any(|code| {
                code.chunks_exact(4)
                    .map(|w| u32::from_ne_bytes([w[0], w[1], w[2], w[3]]))
                    .any(|word| word & mask == pattern)
            })
    }

    pub fn platform(&self) -> Platform {
        if self.is_wii() {
            Platform::Wii
        } else {
            Platform::GameCube
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::ImageBuilder;
    use object::elf;

    fn words(words: &[u32]) -> Vec<u8> {
        words.iter().flat_map(|w| w.to_be_bytes()).collect()
    }

    #[test]
    fn test_hid4_access_detected() {
        // mfspr r3, HID4 in the middle of some nops.
        let code = words(&[0x6000_0000, 0x7c73_fba6, 0x6000_0000]);
        let image = ImageBuilder::new(Endianness::Big)
            .segment(elf::PT_LOAD, elf::PF_R | elf::PF_X, 0x8000_3100, &code, code.len() as u32)
            .build();
        let reader = ElfReader::new(image).unwrap();
        assert!(reader.is_wii());
        assert_eq!(reader.platform(), Platform::Wii);
    }

    #[test]
    fn test_plain_code_is_gamecube() {
        let image = ImageBuilder::new(Endianness::Big)
            .segment(elf::PT_LOAD, elf::PF_R | elf::PF_X, 0x8000_3100, &[0; 64], 64)
            .build();
        let reader = ElfReader::new(image).unwrap();
        assert!(!reader.is_wii());
        assert_eq!(reader.platform(), Platform::GameCube);
    }

    #[test]
    fn test_pattern_in_data_segment_ignored() {
        let data = words(&[0x7c13_fba6]);
        let image = ImageBuilder::new(Endianness::Big)
            .segment(elf::PT_LOAD, elf::PF_R | elf::PF_X, 0x8000_3100, &[0; 16], 16)
            .segment(elf::PT_LOAD, elf::PF_R | elf::PF_W, 0x8000_4000, &data, 4)
            .build();
        let reader = ElfReader::new(image).unwrap();
        assert!(!reader.is_wii());
    }

    #[test]
    fn test_executable_non_load_segment_ignored() {
        let code = words(&[0x7c13_fba6]);
        let image = ImageBuilder::new(Endianness::Big)
            .segment(elf::PT_NOTE, elf::PF_R | elf::PF_X, 0, &code, 4)
            .segment(elf::PT_LOAD, elf::PF_R | elf::PF_X, 0x8000_3100, &[0; 16], 16)
            .build();
        let reader = ElfReader::new(image).unwrap();
        assert!(!reader.is_code_segment(0));
        assert!(!reader.is_wii());
    }

    #[test]
    fn test_little_endian_image() {
        let code: Vec<u8> = 0x7c13_fba6u32.to_le_bytes().to_vec();
        let image = ImageBuilder::new(Endianness::Little)
            .segment(elf::PT_LOAD, elf::PF_X, 0x1000, &code, 4)
            .build();
        let reader = ElfReader::new(image).unwrap();
        assert!(reader.is_wii());
    }
}
