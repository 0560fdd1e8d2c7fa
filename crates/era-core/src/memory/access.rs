//! Deterministic `LD`/`ST` address legality policy.

use crate::FaultCode;

/// Canonical byte width for architectural word accesses.
pub const WORD_ACCESS_BYTES: u32 = 4;

/// How strictly `LD` and `ST` validate their address operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum BoundsCheck {
    /// Fault only when the start address lies beyond capacity.
    ///
    /// An address equal to capacity, or a word that straddles the end of
    /// memory, passes the check and then fails as a raw access fault.
    #[default]
    Compatible,
    /// Fault whenever any byte of the 4-byte word lies outside memory.
    Strict,
}

/// Validates a data word address against memory capacity.
///
/// # Errors
///
/// Returns [`FaultCode::MemoryOutOfBound`] when `addr` fails the selected
/// policy.
pub const fn validate_word_access(
    addr: u32,
    capacity: u32,
    policy: BoundsCheck,
) -> Result<(), FaultCode> {
    let in_bounds = match policy {
        BoundsCheck::Compatible => addr <= capacity,
        BoundsCheck::Strict => {
            (addr as u64) + (WORD_ACCESS_BYTES as u64) <= capacity as u64
        }
    };

    if in_bounds {
        Ok(())
    } else {
        Err(FaultCode::MemoryOutOfBound)
    }
}
