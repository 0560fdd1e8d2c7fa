//! Host-facing run API: configuration, the per-image machine, and reports.

use thiserror::Error;

use crate::execute::{step_one, StepOutcome};
use crate::loader::{load_image, ImageHeader, LoadError};
use crate::memory::{BoundsCheck, Memory, DEFAULT_MEMORY_BYTES};
use crate::state::{RegisterFile, RunState};
use crate::{Diagnostics, SimError};

/// Immutable configuration for one simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct SimConfig {
    /// Memory capacity in bytes.
    pub memory_bytes: u32,
    /// Records a per-instruction trace when set.
    pub tracing_enabled: bool,
    /// `LD`/`ST` address check policy.
    pub bounds_check: BoundsCheck,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            memory_bytes: DEFAULT_MEMORY_BYTES,
            tracing_enabled: false,
            bounds_check: BoundsCheck::Compatible,
        }
    }
}

impl SimConfig {
    /// Sets the memory capacity in bytes.
    #[must_use]
    pub const fn with_memory_bytes(mut self, memory_bytes: u32) -> Self {
        self.memory_bytes = memory_bytes;
        self
    }

    /// Enables or disables the execution trace.
    #[must_use]
    pub const fn with_tracing(mut self, tracing_enabled: bool) -> Self {
        self.tracing_enabled = tracing_enabled;
        self
    }

    /// Selects the `LD`/`ST` bounds-check policy.
    #[must_use]
    pub const fn with_bounds_check(mut self, bounds_check: BoundsCheck) -> Self {
        self.bounds_check = bounds_check;
        self
    }
}

/// Final status of a run that ended cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum ExitStatus {
    /// `STOP` retired.
    Stop = 1,
}

impl ExitStatus {
    /// Numeric status reported in dumps.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// One simulation run: exclusive register file, memory and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Machine {
    /// Architectural registers.
    pub regs: RegisterFile,
    /// Flat data and code memory.
    pub memory: Memory,
    /// Trace and print accumulators.
    pub diagnostics: Diagnostics,
    /// Configuration the machine was built with.
    pub config: SimConfig,
    /// Current run state.
    pub run_state: RunState,
    /// Number of retired instructions.
    pub steps: u64,
}

impl Machine {
    /// Allocates fresh zeroed state for `config`.
    #[must_use]
    pub fn new(config: SimConfig) -> Self {
        Self {
            regs: RegisterFile::default(),
            memory: Memory::new(config.memory_bytes),
            diagnostics: Diagnostics::new(config.tracing_enabled),
            config,
            run_state: RunState::Running,
            steps: 0,
        }
    }

    /// Places a binary image into memory and initializes `SB`, `SP` and `PC`.
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] if the image is malformed or does not fit.
    pub fn load(&mut self, image: &[u8]) -> Result<ImageHeader, LoadError> {
        load_image(image, &mut self.regs, &mut self.memory)
    }

    /// Executes a single instruction.
    ///
    /// # Errors
    ///
    /// Returns the [`SimError`] that aborted the run, now or earlier.
    pub fn step(&mut self) -> Result<StepOutcome, SimError> {
        step_one(self)
    }

    /// Runs until `STOP` retires or a fatal error is raised.
    ///
    /// Programs that never stop and never leave memory run forever.
    ///
    /// # Errors
    ///
    /// Returns the [`SimError`] that aborted the run.
    pub fn run(&mut self) -> Result<ExitStatus, SimError> {
        loop {
            match self.step() {
                Ok(StepOutcome::Continue) => {}
                Ok(StepOutcome::Stop) => {
                    tracing::info!(steps = self.steps, pc = self.regs.pc(), "program stopped");
                    return Ok(ExitStatus::Stop);
                }
                Err(error) => {
                    tracing::warn!(steps = self.steps, %error, "simulation aborted");
                    return Err(error);
                }
            }
        }
    }
}

/// Final machine state of a run that ended with `STOP`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct SimulationReport {
    /// Exit status.
    pub status: ExitStatus,
    /// Header of the simulated image.
    pub header: ImageHeader,
    /// Final register file.
    pub registers: RegisterFile,
    /// Final memory contents.
    pub memory: Memory,
    /// Trace and print logs.
    pub diagnostics: Diagnostics,
    /// Number of retired instructions, `STOP` included.
    pub steps: u64,
}

/// Reason a run did not reach `STOP`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RunError {
    /// The image could not be placed into memory.
    #[error(transparent)]
    Load(#[from] LoadError),
    /// Execution aborted.
    #[error(transparent)]
    Execution(#[from] SimError),
}

/// Failed run with the diagnostics gathered up to the failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{error}")]
pub struct SimulationFailure {
    /// What went wrong.
    #[source]
    pub error: RunError,
    /// Partial trace and print logs.
    pub diagnostics: Diagnostics,
    /// Number of instructions retired before the failure.
    pub steps: u64,
}

/// Simulates one image on a fresh machine.
///
/// # Errors
///
/// Returns a [`SimulationFailure`] if loading or execution fails.
pub fn simulate(image: &[u8], config: &SimConfig) -> Result<SimulationReport, SimulationFailure> {
    let mut machine = Machine::new(*config);

    let outcome = machine
        .load(image)
        .map_err(RunError::from)
        .and_then(|header| Ok((header, machine.run()?)));

    match outcome {
        Ok((header, status)) => Ok(SimulationReport {
            status,
            header,
            registers: machine.regs,
            memory: machine.memory,
            diagnostics: machine.diagnostics,
            steps: machine.steps,
        }),
        Err(error) => Err(SimulationFailure {
            error,
            diagnostics: machine.diagnostics,
            steps: machine.steps,
        }),
    }
}
