//! Fetch, decode and dispatch for the ERA instruction set.
//!
//! One step:
//! 1. Fetch the instruction word at `PC` (no bounds check beyond memory size)
//! 2. Advance `PC` by 2
//! 3. Decode and record the trace entry
//! 4. Reject `regj == PC` with `WrongRegister`
//! 5. Dispatch by opcode
//!
//! A fault leaves every register and memory byte as it was before dispatch,
//! except for the already-advanced `PC`.

#![allow(
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::similar_names,
    clippy::many_single_char_names
)]

mod flags;
mod width;

pub use flags::{compare_flags, CND_EQUAL, CND_FLAGS_MASK, CND_GREATER, CND_LESS};
pub use width::{apply_at_width, arithmetic_shift_left, arithmetic_shift_right, to_signed};

use crate::decoder::{DecodedInstruction, Decoder};
use crate::encoding::{Opcode, Width, FORMAT_PRINT, FORMAT_STOP_OR_LDA};
use crate::memory::validate_word_access;
use crate::state::{RunState, PC};
use crate::{FaultCode, Machine, SimError};

/// Result of one successfully retired instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepOutcome {
    /// Execution continues with the next instruction.
    Continue,
    /// `STOP` retired; the run ended cleanly.
    Stop,
}

/// Executes one instruction on `machine`, latching the resulting run state.
///
/// A stopped machine reports [`StepOutcome::Stop`] and a faulted machine
/// returns its latched error; neither executes anything.
///
/// # Errors
///
/// Returns the [`SimError`] that aborted the run.
pub fn step_one(machine: &mut Machine) -> Result<StepOutcome, SimError> {
    match machine.run_state {
        RunState::Stopped => return Ok(StepOutcome::Stop),
        RunState::Faulted(error) => return Err(error),
        RunState::Running => {}
    }

    let result = fetch_and_decode(machine).and_then(|instr| execute_instruction(machine, &instr));

    match result {
        Ok(outcome) => {
            machine.steps += 1;
            if outcome == StepOutcome::Stop {
                machine.run_state = RunState::Stopped;
            }
            Ok(outcome)
        }
        Err(error) => {
            machine.run_state = RunState::Faulted(error);
            Err(error)
        }
    }
}

fn fetch_and_decode(machine: &mut Machine) -> Result<DecodedInstruction, SimError> {
    let pc = machine.regs.pc();
    let word = machine
        .memory
        .read_u16_be(pc)
        .map_err(|_| SimError::FetchOutOfRange {
            pc,
            capacity: machine.memory.capacity(),
        })?;
    machine.regs.set_pc(pc.wrapping_add(2));

    Ok(Decoder::decode_word(word))
}

/// Executes an already-fetched instruction. `PC` must already point past it.
///
/// # Errors
///
/// Returns [`SimError::Fault`] for checked ISA faults and the raw
/// `*OutOfRange` variants for unchecked accesses past the end of memory.
pub fn execute_instruction(
    machine: &mut Machine,
    instr: &DecodedInstruction,
) -> Result<StepOutcome, SimError> {
    let regs = &mut machine.regs;
    let vi = regs.get(instr.regi);
    let vj = regs.get(instr.regj);

    machine
        .diagnostics
        .record_instruction(regs.pc(), instr, vi, vj);

    if instr.regj == PC {
        return Err(SimError::Fault {
            code: FaultCode::WrongRegister,
            pc: regs.pc(),
        });
    }

    let width = Width::from_format(instr.format);
    let j = instr.regj;

    match instr.opcode {
        Opcode::Control => match instr.format {
            FORMAT_STOP_OR_LDA => return Ok(StepOutcome::Stop),
            FORMAT_PRINT => machine.diagnostics.record_print(vi),
            _ => {}
        },
        Opcode::Ld => {
            check_word_access(machine, vi)?;
            let value = machine.memory.read_u32_be(vi)?;
            machine.regs.set(j, value);
        }
        Opcode::LdaLdc => {
            if instr.format == FORMAT_STOP_OR_LDA {
                let pc = regs.pc();
                let constant = machine.memory.read_u32_be(pc)?;
                machine.diagnostics.record_lda_constant(constant);
                machine.regs.set(j, vi.wrapping_add(constant));
                machine.regs.set_pc(pc.wrapping_add(4));
            } else {
                regs.set(j, u32::from(instr.regi));
            }
        }
        Opcode::St => {
            check_word_access(machine, vj)?;
            machine.memory.write_u32_be(vj, vi)?;
        }
        Opcode::Mov => regs.set(j, apply_at_width(vj, vi, width, |_, s| s)),
        Opcode::Add => regs.set(j, apply_at_width(vj, vi, width, u32::wrapping_add)),
        Opcode::Sub => regs.set(j, apply_at_width(vj, vi, width, u32::wrapping_sub)),
        Opcode::Asr => regs.set(j, arithmetic_shift_right(vi, width)),
        Opcode::Asl => regs.set(j, arithmetic_shift_left(vi, width)),
        Opcode::Or => regs.set(j, apply_at_width(vj, vi, width, |d, s| d | s)),
        Opcode::And => regs.set(j, apply_at_width(vj, vi, width, |d, s| d & s)),
        Opcode::Xor => regs.set(j, apply_at_width(vj, vi, width, |d, s| d ^ s)),
        Opcode::Lsl => regs.set(j, apply_at_width(vj, vi, width, |_, s| s << 1)),
        Opcode::Lsr => regs.set(j, apply_at_width(vj, vi, width, |_, s| s >> 1)),
        Opcode::Cnd => {
            let flags = compare_flags(to_signed(vi, width), to_signed(vj, width));
            regs.set(j, (vj & !CND_FLAGS_MASK) | flags);
        }
        Opcode::Cbr => {
            if to_signed(vi, Width::Word) != 0 {
                let link = regs.pc();
                regs.set_pc(vj);
                regs.set(instr.regi, link);
            }
            machine.diagnostics.record_branch();
        }
    }

    Ok(StepOutcome::Continue)
}

fn check_word_access(machine: &Machine, addr: u32) -> Result<(), SimError> {
    validate_word_access(addr, machine.memory.capacity(), machine.config.bounds_check).map_err(
        |code| SimError::Fault {
            code,
            pc: machine.regs.pc(),
        },
    )
}
