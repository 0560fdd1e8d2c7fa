//! Architectural CPU state model primitives.

/// Architectural register file types and storage model.
pub mod registers;
/// Run-level execution state machine.
pub mod run_state;

pub use registers::{register_name, RegisterFile, FP, PC, REGISTER_COUNT, SB, SP};
pub use run_state::RunState;
