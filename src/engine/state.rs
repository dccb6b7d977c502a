use serde::{Deserialize, Serialize};

/// Lifecycle of the channel grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayState {
    /// No grid; frames are refused
    Idle,
    Running {
        generation: u64,
        channels: usize,
    },
    /// Workers are releasing their buffers
    TearingDown { generation: u64 },
}

impl DisplayState {
    /// Check if transition from current state to target state is valid
    pub fn can_transition_to(&self, target: &DisplayState) -> bool {
        use DisplayState::*;

        match (self, target) {
            (Idle, Running { .. }) => true,
            (Running { generation, .. }, TearingDown { generation: next }) => generation == next,
            (TearingDown { .. }, Idle) => true,
            _ => false,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Idle => "Idle",
            Self::Running { .. } => "Running",
            Self::TearingDown { .. } => "TearingDown",
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }
}

impl Default for DisplayState {
    fn default() -> Self {
        Self::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        let idle = DisplayState::Idle;
        let running = DisplayState::Running {
            generation: 1,
            channels: 64,
        };

        assert!(idle.can_transition_to(&running));
        assert!(!running.can_transition_to(&idle));
    }

    #[test]
    fn test_teardown_must_match_generation() {
        let running = DisplayState::Running {
            generation: 2,
            channels: 4,
        };

        assert!(running.can_transition_to(&DisplayState::TearingDown { generation: 2 }));
        assert!(!running.can_transition_to(&DisplayState::TearingDown { generation: 1 }));
    }

    #[test]
    fn test_teardown_returns_to_idle() {
        let tearing = DisplayState::TearingDown { generation: 3 };

        assert!(tearing.can_transition_to(&DisplayState::Idle));
        assert!(!tearing.can_transition_to(&DisplayState::Running {
            generation: 4,
            channels: 1,
        }));
    }
}
