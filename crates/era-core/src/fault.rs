use thiserror::Error;

/// Stable per-instruction fault statuses reported by the execution engine.
///
/// The numeric values are the stable status codes written into error reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum FaultCode {
    /// `LD`/`ST` address failed the configured bounds check.
    #[error("memory access out of bound")]
    MemoryOutOfBound = 10,
    /// The `regj` field named `PC`, which no instruction may target.
    #[error("register PC used as second operand")]
    WrongRegister = 11,
}

impl FaultCode {
    /// Converts a fault code to its stable numeric status.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Converts a numeric status back into a fault code.
    #[must_use]
    pub const fn from_u8(code: u8) -> Option<Self> {
        match code {
            10 => Some(Self::MemoryOutOfBound),
            11 => Some(Self::WrongRegister),
            _ => None,
        }
    }
}

/// Fatal condition that aborts a simulation run.
///
/// `Fault` carries a checked ISA status. The `*OutOfRange` variants are raw
/// access faults: the machine touched bytes outside its memory without any
/// architectural check catching it first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum SimError {
    /// An instruction returned a fault status.
    #[error("execution stopped abnormally at PC {pc}: {code} (status {})", .code.as_u8())]
    Fault {
        /// Fault status returned by the instruction.
        code: FaultCode,
        /// Value of `PC` when the fault was raised (already advanced past the
        /// faulting instruction).
        pc: u32,
    },
    /// Instruction fetch ran past the end of memory.
    #[error("instruction fetch at {pc} is outside memory of {capacity} bytes")]
    FetchOutOfRange {
        /// Address of the attempted fetch.
        pc: u32,
        /// Memory capacity in bytes.
        capacity: u32,
    },
    /// Unchecked data access ran past the end of memory.
    #[error("memory access at {addr} is outside memory of {capacity} bytes")]
    AccessOutOfRange {
        /// First byte of the attempted access.
        addr: u32,
        /// Memory capacity in bytes.
        capacity: u32,
    },
}

impl SimError {
    /// Numeric ISA status for checked faults; `None` for raw access faults.
    #[must_use]
    pub const fn status_code(self) -> Option<u8> {
        match self {
            Self::Fault { code, .. } => Some(code.as_u8()),
            Self::FetchOutOfRange { .. } | Self::AccessOutOfRange { .. } => None,
        }
    }

    /// Returns the checked fault code, if this error is an ISA fault.
    #[must_use]
    pub const fn fault_code(self) -> Option<FaultCode> {
        match self {
            Self::Fault { code, .. } => Some(code),
            Self::FetchOutOfRange { .. } | Self::AccessOutOfRange { .. } => None,
        }
    }
}
