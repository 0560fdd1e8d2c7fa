/// Primary opcodes (`OP` field, bits 5..2 of the first instruction byte).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum Opcode {
    /// `STOP` (format 0), `PRINT` (format 2), otherwise `SKIP`.
    Control = 0x0,
    /// Load word from memory.
    Ld = 0x1,
    /// `LDA` (format 0) adds a trailing 32-bit constant; `LDC` loads the
    /// `regi` field as a small immediate.
    LdaLdc = 0x2,
    /// Store word to memory.
    St = 0x3,
    /// Width-restricted move.
    Mov = 0x4,
    /// Width-restricted addition.
    Add = 0x5,
    /// Width-restricted subtraction.
    Sub = 0x6,
    /// Arithmetic shift right by one.
    Asr = 0x7,
    /// Arithmetic shift left by one.
    Asl = 0x8,
    /// Width-restricted bitwise OR.
    Or = 0x9,
    /// Width-restricted bitwise AND.
    And = 0xA,
    /// Width-restricted bitwise XOR.
    Xor = 0xB,
    /// Logical shift left by one.
    Lsl = 0xC,
    /// Logical shift right by one.
    Lsr = 0xD,
    /// Signed compare into the low flag nibble of `regj`.
    Cnd = 0xE,
    /// Conditional branch with link into `regi`.
    Cbr = 0xF,
}

/// All opcodes in numeric order.
pub const OPCODE_TABLE: [Opcode; 16] = [
    Opcode::Control,
    Opcode::Ld,
    Opcode::LdaLdc,
    Opcode::St,
    Opcode::Mov,
    Opcode::Add,
    Opcode::Sub,
    Opcode::Asr,
    Opcode::Asl,
    Opcode::Or,
    Opcode::And,
    Opcode::Xor,
    Opcode::Lsl,
    Opcode::Lsr,
    Opcode::Cnd,
    Opcode::Cbr,
];

impl Opcode {
    /// Converts the low four bits of `op` into an opcode. Every value is
    /// assigned, so this is total.
    #[must_use]
    pub const fn from_u4(op: u8) -> Self {
        OPCODE_TABLE[(op & 0x0F) as usize]
    }

    /// Numeric opcode value.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Mnemonic used in execution traces.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Control => "STOP/SKIP/PRINT",
            Self::Ld => "LD",
            Self::LdaLdc => "LDA/LDC",
            Self::St => "ST",
            Self::Mov => "MOV",
            Self::Add => "ADD",
            Self::Sub => "SUB",
            Self::Asr => "ASR",
            Self::Asl => "ASL",
            Self::Or => "OR",
            Self::And => "AND",
            Self::Xor => "XOR",
            Self::Lsl => "LSL",
            Self::Lsr => "LSR",
            Self::Cnd => "CND",
            Self::Cbr => "CBR",
        }
    }
}

/// Format value selecting `STOP` for opcode 0 and `LDA` for opcode 2.
pub const FORMAT_STOP_OR_LDA: u8 = 0;
/// Format value selecting halfword width.
pub const FORMAT_HALF: u8 = 1;
/// Format value selecting `PRINT` for opcode 0.
pub const FORMAT_PRINT: u8 = 2;
/// Format value selecting word width.
pub const FORMAT_WORD: u8 = 3;

/// Operand width selected by the format field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Width {
    /// Low 8 bits (formats 0 and 2).
    Byte,
    /// Low 16 bits (format 1).
    Half,
    /// All 32 bits (format 3).
    Word,
}

impl Width {
    /// Maps a 2-bit format field to an operand width.
    #[must_use]
    pub const fn from_format(format: u8) -> Self {
        match format & 0x3 {
            FORMAT_WORD => Self::Word,
            FORMAT_HALF => Self::Half,
            _ => Self::Byte,
        }
    }

    /// Number of bits in the selected width.
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::Byte => 8,
            Self::Half => 16,
            Self::Word => 32,
        }
    }

    /// Mask of the bits an operation may modify.
    #[must_use]
    pub const fn mask(self) -> u32 {
        match self {
            Self::Byte => 0x0000_00FF,
            Self::Half => 0x0000_FFFF,
            Self::Word => 0xFFFF_FFFF,
        }
    }

    /// Top bit of the selected width.
    #[must_use]
    pub const fn sign_bit(self) -> u32 {
        1 << (self.bits() - 1)
    }
}
