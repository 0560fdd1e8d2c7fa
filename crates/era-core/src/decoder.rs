//! Instruction decoder for the ERA instruction word.
//!
//! Every instruction is one 16-bit word stored high byte first:
//!
//! ```text
//! byte0: [format:2][opcode:4][regi(4..3):2]
//! byte1: [regi(2..0):3][regj:5]
//! ```
//!
//! Decoding is total: any two bytes produce a valid field tuple.

use crate::encoding::Opcode;

/// Instruction with all four fields extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DecodedInstruction {
    /// 2-bit format field (operand width or sub-operation).
    pub format: u8,
    /// 4-bit opcode field.
    pub opcode: Opcode,
    /// First 5-bit register field (source, or small immediate for `LDC`).
    pub regi: u8,
    /// Second 5-bit register field (destination).
    pub regj: u8,
}

impl DecodedInstruction {
    /// Builds an instruction from raw field values, truncating each to its
    /// encoded width.
    #[must_use]
    pub const fn new(format: u8, opcode: Opcode, regi: u8, regj: u8) -> Self {
        Self {
            format: format & 0x03,
            opcode,
            regi: regi & 0x1F,
            regj: regj & 0x1F,
        }
    }

    /// Re-encodes this instruction into its two instruction bytes.
    #[must_use]
    pub const fn encode(self) -> [u8; 2] {
        let byte0 =
            ((self.format & 0x03) << 6) | (self.opcode.as_u8() << 2) | ((self.regi >> 3) & 0x03);
        let byte1 = ((self.regi & 0x07) << 5) | (self.regj & 0x1F);
        [byte0, byte1]
    }
}

/// Instruction decoder for the ERA word format.
#[derive(Debug, Clone, Copy, Default)]
pub struct Decoder;

impl Decoder {
    /// Decodes the two bytes of an instruction word.
    #[must_use]
    pub const fn decode(bytes: [u8; 2]) -> DecodedInstruction {
        let [byte0, byte1] = bytes;
        DecodedInstruction {
            format: byte0 >> 6,
            opcode: Opcode::from_u4((byte0 & 0x3C) >> 2),
            regi: ((byte0 & 0x03) << 3) | (byte1 >> 5),
            regj: byte1 & 0x1F,
        }
    }

    /// Decodes a big-endian 16-bit instruction word.
    #[must_use]
    pub const fn decode_word(word: u16) -> DecodedInstruction {
        Self::decode(word.to_be_bytes())
    }
}
