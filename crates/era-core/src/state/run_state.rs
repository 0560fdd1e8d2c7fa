use crate::SimError;

/// Deterministic execution-state machine for one simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RunState {
    /// Ready to execute the next instruction.
    #[default]
    Running,
    /// A `STOP` instruction retired; the run ended cleanly.
    Stopped,
    /// A fatal error is latched and no further progress is possible.
    Faulted(SimError),
}

impl RunState {
    /// Returns the latched error, if this state is faulted.
    #[must_use]
    pub const fn latched_error(self) -> Option<SimError> {
        match self {
            Self::Faulted(error) => Some(error),
            Self::Running | Self::Stopped => None,
        }
    }

    /// Returns `true` once the run can make no further progress.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}

#[cfg(test)]
mod tests {
    use super::RunState;
    use crate::{FaultCode, SimError};

    #[test]
    fn run_state_default_is_running() {
        assert_eq!(RunState::default(), RunState::Running);
        assert!(!RunState::Running.is_terminal());
    }

    #[test]
    fn latched_error_accessor_reports_only_faulted_variant() {
        let error = SimError::Fault {
            code: FaultCode::WrongRegister,
            pc: 2,
        };

        assert_eq!(RunState::Running.latched_error(), None);
        assert_eq!(RunState::Stopped.latched_error(), None);
        assert_eq!(RunState::Faulted(error).latched_error(), Some(error));
        assert!(RunState::Stopped.is_terminal());
        assert!(RunState::Faulted(error).is_terminal());
    }
}
