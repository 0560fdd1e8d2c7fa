//! Run-scoped diagnostics: the optional execution trace and the print log.
//!
//! Both buffers are owned by a single run and only ever appended to while the
//! engine executes. Hosts read them after the run ends, whether it halted
//! cleanly or failed.

use std::fmt::Write as _;

use crate::decoder::DecodedInstruction;
use crate::encoding::{Opcode, FORMAT_STOP_OR_LDA};
use crate::state::register_name;

/// `tracing` target used to mirror every printed value.
pub const PRINT_TARGET: &str = "era_core::print";

/// Append-only trace and print accumulators for one simulation run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Diagnostics {
    tracing_enabled: bool,
    trace: String,
    prints: Vec<u32>,
}

impl Diagnostics {
    /// Creates empty accumulators; trace entries are recorded only when
    /// `tracing_enabled` is set.
    #[must_use]
    pub const fn new(tracing_enabled: bool) -> Self {
        Self {
            tracing_enabled,
            trace: String::new(),
            prints: Vec::new(),
        }
    }

    /// Returns `true` when per-instruction tracing is active.
    #[must_use]
    pub const fn tracing_enabled(&self) -> bool {
        self.tracing_enabled
    }

    /// Records the pre-execution view of an instruction.
    ///
    /// `pc` is the already-advanced program counter. `LDA` leaves its line
    /// open so the trailing constant lands on the same line.
    pub(crate) fn record_instruction(
        &mut self,
        pc: u32,
        instr: &DecodedInstruction,
        regi_value: u32,
        regj_value: u32,
    ) {
        if !self.tracing_enabled {
            return;
        }

        let _ = write!(
            self.trace,
            "[{pc}] {}: {}, {}  ({regi_value}  {regj_value})",
            instr.opcode.mnemonic(),
            register_name(instr.regi),
            register_name(instr.regj),
        );

        let is_lda = instr.opcode == Opcode::LdaLdc && instr.format == FORMAT_STOP_OR_LDA;
        if !is_lda {
            self.trace.push('\n');
        }
    }

    /// Completes an `LDA` trace line with its 32-bit constant.
    pub(crate) fn record_lda_constant(&mut self, constant: u32) {
        if self.tracing_enabled {
            let _ = writeln!(self.trace, "  const= {constant}");
        }
    }

    /// Separates branch instructions with an empty line.
    pub(crate) fn record_branch(&mut self) {
        if self.tracing_enabled {
            self.trace.push('\n');
        }
    }

    /// Appends a `PRINT` value. Recorded regardless of tracing.
    pub(crate) fn record_print(&mut self, value: u32) {
        tracing::info!(target: PRINT_TARGET, value, "print");
        self.prints.push(value);
    }

    /// Raw trace buffer.
    #[must_use]
    pub fn trace_text(&self) -> &str {
        &self.trace
    }

    /// Trace buffer split into lines.
    pub fn trace_lines(&self) -> std::str::Lines<'_> {
        self.trace.lines()
    }

    /// Printed values in execution order.
    #[must_use]
    pub fn prints(&self) -> &[u32] {
        &self.prints
    }

    /// Print log text: one decimal value per line.
    #[must_use]
    pub fn print_log(&self) -> String {
        let mut log = String::with_capacity(self.prints.len() * 4);
        for value in &self.prints {
            let _ = writeln!(log, "{value}");
        }
        log
    }
}
