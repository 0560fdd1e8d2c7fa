/// Number of architecturally visible registers (`R0..R31`).
pub const REGISTER_COUNT: usize = 32;
/// Frame pointer alias.
pub const FP: u8 = 28;
/// Stack pointer alias.
pub const SP: u8 = 29;
/// Static-segment base alias.
pub const SB: u8 = 30;
/// Program counter alias.
pub const PC: u8 = 31;

const REGISTER_NAMES: [&str; REGISTER_COUNT] = [
    "0", "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12", "13", "14", "15", "16",
    "17", "18", "19", "20", "21", "22", "23", "24", "25", "26", "27", "FP", "SP", "SB", "PC",
];

/// Trace name of a register: its decimal index, or the alias for 28..=31.
///
/// Indices are taken modulo 32, matching the 5-bit register fields.
#[must_use]
pub const fn register_name(index: u8) -> &'static str {
    REGISTER_NAMES[(index & 0x1F) as usize]
}

/// Architectural register file: 32 unsigned 32-bit slots.
///
/// Slots are addressed by the 5-bit instruction fields; out-of-range indices
/// wrap to the low five bits.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RegisterFile {
    regs: [u32; REGISTER_COUNT],
}

impl RegisterFile {
    /// Reads a register.
    #[must_use]
    pub const fn get(&self, index: u8) -> u32 {
        self.regs[(index & 0x1F) as usize]
    }

    /// Writes a register.
    pub const fn set(&mut self, index: u8, value: u32) {
        self.regs[(index & 0x1F) as usize] = value;
    }

    /// Reads the `PC` register.
    #[must_use]
    pub const fn pc(&self) -> u32 {
        self.get(PC)
    }

    /// Writes the `PC` register.
    pub const fn set_pc(&mut self, value: u32) {
        self.set(PC, value);
    }

    /// Reads the `SP` register.
    #[must_use]
    pub const fn sp(&self) -> u32 {
        self.get(SP)
    }

    /// Reads the `SB` register.
    #[must_use]
    pub const fn sb(&self) -> u32 {
        self.get(SB)
    }

    /// Reads the `FP` register.
    #[must_use]
    pub const fn fp(&self) -> u32 {
        self.get(FP)
    }

    /// All registers in index order.
    #[must_use]
    pub const fn as_array(&self) -> &[u32; REGISTER_COUNT] {
        &self.regs
    }
}
