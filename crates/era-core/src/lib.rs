//! Core simulator crate for the ERA instruction set.

/// Flat byte memory and `LD`/`ST` bounds-check policy.
pub mod memory;
pub use memory::{
    validate_word_access, BoundsCheck, Memory, OutOfRange, DEFAULT_MEMORY_BYTES,
    WORD_ACCESS_BYTES,
};

/// Run-scoped trace and print accumulators.
pub mod diag;
pub use diag::{Diagnostics, PRINT_TARGET};

/// Host-facing run API: configuration, machine, reports.
pub mod api;
pub use api::{
    simulate, ExitStatus, Machine, RunError, SimConfig, SimulationFailure, SimulationReport,
};

/// Architectural register file and run state.
pub mod state;
pub use state::{register_name, RegisterFile, RunState, FP, PC, REGISTER_COUNT, SB, SP};

/// Opcode table and format-driven operand widths.
pub mod encoding;
pub use encoding::{
    Opcode, Width, FORMAT_HALF, FORMAT_PRINT, FORMAT_STOP_OR_LDA, FORMAT_WORD, OPCODE_TABLE,
};

/// Instruction field extraction.
pub mod decoder;
pub use decoder::{DecodedInstruction, Decoder};

/// Fault statuses and fatal run errors.
pub mod fault;
pub use fault::{FaultCode, SimError};

/// Binary image header parsing and segment placement.
pub mod loader;
pub use loader::{load_image, ImageHeader, LoadError, Segment, HEADER_BYTES};

/// Instruction execution pipeline.
pub mod execute;
pub use execute::{
    compare_flags, execute_instruction, step_one, StepOutcome, CND_EQUAL, CND_FLAGS_MASK,
    CND_GREATER, CND_LESS,
};

/// Final-state dump rendering.
pub mod dump;
pub use dump::{render_dump, write_dump, DUMP_ROW_BYTES};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
