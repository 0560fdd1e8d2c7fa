//! Text rendering of a finished run: status line, registers, memory rows.

use std::io::{self, Write};

use crate::state::{register_name, FP, PC, SB, SP};
use crate::SimulationReport;

/// Bytes per memory row in the dump.
pub const DUMP_ROW_BYTES: usize = 32;

/// Writes the dump of `report` to `writer`.
///
/// With `include_trace`, the execution trace follows the memory rows after a
/// blank line.
///
/// # Errors
///
/// Propagates any error from `writer`.
pub fn write_dump<W: Write>(
    writer: &mut W,
    report: &SimulationReport,
    include_trace: bool,
) -> io::Result<()> {
    writeln!(writer, "Exited normally with the code {}.", report.status.code())?;
    writeln!(writer)?;

    let regs = &report.registers;
    for index in 0..FP {
        writeln!(writer, "R{index} = {}", regs.get(index))?;
    }
    for alias in [FP, SP, SB, PC] {
        writeln!(writer, "{} = {}", register_name(alias), regs.get(alias))?;
    }
    writeln!(writer)?;

    for row in report.memory.as_bytes().chunks(DUMP_ROW_BYTES) {
        let mut first = true;
        for byte in row {
            if !first {
                writer.write_all(b" ")?;
            }
            write!(writer, "{byte:02X}")?;
            first = false;
        }
        writeln!(writer)?;
    }

    if include_trace {
        writeln!(writer)?;
        writer.write_all(report.diagnostics.trace_text().as_bytes())?;
    }

    Ok(())
}

/// Renders the dump of `report` into a string.
#[must_use]
pub fn render_dump(report: &SimulationReport, include_trace: bool) -> String {
    let mut buffer = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = write_dump(&mut buffer, report, include_trace);
    String::from_utf8_lossy(&buffer).into_owned()
}
