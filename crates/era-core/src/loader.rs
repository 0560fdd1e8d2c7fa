//! Binary image header parsing and segment placement.
//!
//! Image layout:
//!
//! ```text
//! offset  0: 2 bytes reserved
//! offset  2: u32 BE static-data address (in the image)
//! offset  6: u32 BE static-data length  (halfwords)
//! offset 10: u32 BE program address     (in the image)
//! offset 14: u32 BE program length      (halfwords)
//! ```
//!
//! Static data is copied to memory offset 0 and code immediately after it.

use std::fmt;

use thiserror::Error;

use crate::memory::Memory;
use crate::state::{RegisterFile, SB, SP};

/// Size of the fixed image header in bytes.
pub const HEADER_BYTES: usize = 18;

/// The two payload segments of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Segment {
    /// Static data, placed at memory offset 0.
    Static,
    /// Program code, placed right after static data.
    Program,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static => f.write_str("static"),
            Self::Program => f.write_str("program"),
        }
    }
}

/// Failure to place an image into memory. Fatal for the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum LoadError {
    /// Image is shorter than the fixed header.
    #[error("image of {len} bytes is shorter than the {HEADER_BYTES}-byte header")]
    TruncatedHeader {
        /// Actual image length.
        len: usize,
    },
    /// A declared segment extends past the end of the image.
    #[error("{segment} segment at {addr} ({len} bytes) extends past image end ({image_len} bytes)")]
    SegmentOutsideImage {
        /// Offending segment.
        segment: Segment,
        /// Declared image address.
        addr: u32,
        /// Declared length in bytes.
        len: u64,
        /// Actual image length.
        image_len: usize,
    },
    /// A segment does not fit into simulated memory.
    #[error("{segment} segment at memory {offset} ({len} bytes) exceeds memory of {capacity} bytes")]
    SegmentExceedsMemory {
        /// Offending segment.
        segment: Segment,
        /// Destination memory offset.
        offset: u64,
        /// Length in bytes.
        len: u64,
        /// Memory capacity in bytes.
        capacity: u32,
    },
}

/// Decoded image header. Lengths are kept in halfwords as declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ImageHeader {
    /// Image offset of the static-data payload.
    pub static_addr: u32,
    /// Static-data length in halfwords.
    pub static_halfwords: u32,
    /// Image offset of the program payload.
    pub program_addr: u32,
    /// Program length in halfwords.
    pub program_halfwords: u32,
}

fn read_u32_be(image: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        image[offset],
        image[offset + 1],
        image[offset + 2],
        image[offset + 3],
    ])
}

impl ImageHeader {
    /// Parses the fixed header at the start of `image`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::TruncatedHeader`] for images shorter than
    /// [`HEADER_BYTES`].
    pub fn parse(image: &[u8]) -> Result<Self, LoadError> {
        if image.len() < HEADER_BYTES {
            return Err(LoadError::TruncatedHeader { len: image.len() });
        }

        Ok(Self {
            static_addr: read_u32_be(image, 2),
            static_halfwords: read_u32_be(image, 6),
            program_addr: read_u32_be(image, 10),
            program_halfwords: read_u32_be(image, 14),
        })
    }

    /// Static-data length in bytes.
    #[must_use]
    pub const fn static_bytes(&self) -> u64 {
        self.static_halfwords as u64 * 2
    }

    /// Program length in bytes.
    #[must_use]
    pub const fn program_bytes(&self) -> u64 {
        self.program_halfwords as u64 * 2
    }
}

fn copy_segment(
    image: &[u8],
    memory: &mut Memory,
    segment: Segment,
    addr: u32,
    len: u64,
    offset: u64,
) -> Result<(), LoadError> {
    let outside_image = LoadError::SegmentOutsideImage {
        segment,
        addr,
        len,
        image_len: image.len(),
    };
    let exceeds_memory = LoadError::SegmentExceedsMemory {
        segment,
        offset,
        len,
        capacity: memory.capacity(),
    };

    let start = addr as usize;
    let end = usize::try_from(len)
        .ok()
        .and_then(|len| start.checked_add(len))
        .ok_or(outside_image)?;
    let payload = image.get(start..end).ok_or(outside_image)?;

    let offset = u32::try_from(offset).map_err(|_| exceeds_memory)?;
    memory
        .write_bytes(offset, payload)
        .map_err(|_| exceeds_memory)
}

/// Places `image` into fresh machine state.
///
/// Sets `SB = 0`, `PC` to the first code byte and `SP` to the first free byte
/// after the loaded image. `FP` is left untouched.
///
/// # Errors
///
/// Returns a [`LoadError`] when the header is truncated, a segment lies
/// outside the image, or a segment does not fit into memory.
pub fn load_image(
    image: &[u8],
    regs: &mut RegisterFile,
    memory: &mut Memory,
) -> Result<ImageHeader, LoadError> {
    let header = ImageHeader::parse(image)?;
    let static_bytes = header.static_bytes();
    let program_bytes = header.program_bytes();

    tracing::debug!(
        static_addr = header.static_addr,
        static_bytes,
        program_addr = header.program_addr,
        program_bytes,
        "loading image"
    );

    copy_segment(
        image,
        memory,
        Segment::Static,
        header.static_addr,
        static_bytes,
        0,
    )?;
    copy_segment(
        image,
        memory,
        Segment::Program,
        header.program_addr,
        program_bytes,
        static_bytes,
    )?;

    // Both segments fit in memory, so these offsets fit in u32.
    regs.set(SB, 0);
    regs.set_pc(static_bytes as u32);
    regs.set(SP, (static_bytes + program_bytes) as u32);

    Ok(header)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{load_image, ImageHeader, LoadError, Segment, HEADER_BYTES};
    use crate::memory::Memory;
    use crate::state::RegisterFile;

    fn image(static_data: &[u8], program: &[u8]) -> Vec<u8> {
        let static_addr = HEADER_BYTES as u32;
        let program_addr = static_addr + static_data.len() as u32;
        let mut bytes = vec![0xEE, 0xEE];
        bytes.extend_from_slice(&static_addr.to_be_bytes());
        bytes.extend_from_slice(&(static_data.len() as u32 / 2).to_be_bytes());
        bytes.extend_from_slice(&program_addr.to_be_bytes());
        bytes.extend_from_slice(&(program.len() as u32 / 2).to_be_bytes());
        bytes.extend_from_slice(static_data);
        bytes.extend_from_slice(program);
        bytes
    }

    #[test]
    fn header_fields_are_big_endian_at_fixed_offsets() {
        let bytes = [
            0xAA, 0xBB, 0, 0, 0, 18, 0, 0, 0, 2, 0, 0, 1, 0, 0x01, 0x02, 0x03, 0x04,
        ];
        let header = ImageHeader::parse(&bytes).expect("full header");

        assert_eq!(header.static_addr, 18);
        assert_eq!(header.static_halfwords, 2);
        assert_eq!(header.static_bytes(), 4);
        assert_eq!(header.program_addr, 256);
        assert_eq!(header.program_halfwords, 0x0102_0304);
    }

    #[test]
    fn short_image_is_rejected() {
        assert_eq!(
            ImageHeader::parse(&[0; 17]),
            Err(LoadError::TruncatedHeader { len: 17 })
        );
    }

    #[test]
    fn segments_are_placed_back_to_back() {
        let bytes = image(&[1, 2, 3, 4], &[0x10, 0x20, 0x00, 0x00]);
        let mut regs = RegisterFile::default();
        let mut memory = Memory::new(64);

        load_image(&bytes, &mut regs, &mut memory).expect("image fits");

        assert_eq!(&memory.as_bytes()[..8], &[1, 2, 3, 4, 0x10, 0x20, 0, 0]);
        assert_eq!(regs.sb(), 0);
        assert_eq!(regs.pc(), 4);
        assert_eq!(regs.sp(), 8);
        assert_eq!(regs.fp(), 0);
    }

    #[test]
    fn segments_may_appear_in_any_image_order() {
        // program payload first, static payload second
        let mut bytes = vec![0, 0];
        bytes.extend_from_slice(&20_u32.to_be_bytes());
        bytes.extend_from_slice(&1_u32.to_be_bytes());
        bytes.extend_from_slice(&18_u32.to_be_bytes());
        bytes.extend_from_slice(&1_u32.to_be_bytes());
        bytes.extend_from_slice(&[0xC0, 0xDE, 0x5A, 0x5A]);

        let mut regs = RegisterFile::default();
        let mut memory = Memory::new(16);
        load_image(&bytes, &mut regs, &mut memory).expect("image fits");

        assert_eq!(&memory.as_bytes()[..4], &[0x5A, 0x5A, 0xC0, 0xDE]);
        assert_eq!(regs.pc(), 2);
    }

    #[test]
    fn segment_past_image_end_is_rejected() {
        let mut bytes = image(&[], &[0, 0]);
        bytes.pop();

        let mut regs = RegisterFile::default();
        let mut memory = Memory::new(16);
        let error = load_image(&bytes, &mut regs, &mut memory).expect_err("truncated payload");

        assert!(matches!(
            error,
            LoadError::SegmentOutsideImage {
                segment: Segment::Program,
                len: 2,
                ..
            }
        ));
    }

    #[test]
    fn image_larger_than_memory_is_rejected() {
        let bytes = image(&[0; 8], &[0; 10]);
        let mut regs = RegisterFile::default();
        let mut memory = Memory::new(16);

        let error = load_image(&bytes, &mut regs, &mut memory).expect_err("does not fit");
        assert_eq!(
            error,
            LoadError::SegmentExceedsMemory {
                segment: Segment::Program,
                offset: 8,
                len: 10,
                capacity: 16,
            }
        );
    }

    proptest! {
        #[test]
        fn loaded_memory_mirrors_declared_segments(
            static_halves in 0_usize..16,
            program_halves in 0_usize..16,
            seed: u8,
        ) {
            let static_data: Vec<u8> =
                (0..static_halves * 2).map(|i| seed.wrapping_add(i as u8)).collect();
            let program: Vec<u8> =
                (0..program_halves * 2).map(|i| seed ^ (i as u8)).collect();
            let bytes = image(&static_data, &program);

            let mut regs = RegisterFile::default();
            let mut memory = Memory::new(128);
            load_image(&bytes, &mut regs, &mut memory).expect("fits");

            let l1 = static_data.len();
            let l2 = program.len();
            prop_assert_eq!(&memory.as_bytes()[..l1], static_data.as_slice());
            prop_assert_eq!(&memory.as_bytes()[l1..l1 + l2], program.as_slice());
            prop_assert!(memory.as_bytes()[l1 + l2..].iter().all(|b| *b == 0));
            prop_assert_eq!(regs.pc() as usize, l1);
            prop_assert_eq!(regs.sp() as usize, l1 + l2);
        }
    }
}
