//! Pipeline state machine.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineState {
    #[default]
    Idle,
    Running,
    /// Stop observed; waiting for the sink to drain.
    Stopping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineEvent {
    /// Resume with existing phase, filter and clock state.
    Start,
    /// Start from a clean stream: phase, filter history and clock reset.
    Restart,
    Stop,
    Drained,
    /// Capture or playback device failure.
    Fault,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionResult {
    None,
    StateChanged(PipelineState),
    /// Entered `Running`; stream state must be reset.
    Restarted,
    /// Left `Running` or `Stopping` because of a fault, now `Idle`.
    Faulted,
}

/// `Idle → Running → Stopping → Idle`, with faults short-circuiting to `Idle`.
#[derive(Debug, Default)]
pub struct PipelineFsm {
    state: PipelineState,
}

impl PipelineFsm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == PipelineState::Running
    }

    pub fn transition(&mut self, event: PipelineEvent) -> TransitionResult {
        use PipelineEvent::*;

        match (event, self.state) {
            (Start, PipelineState::Idle) => {
                self.state = PipelineState::Running;
                TransitionResult::StateChanged(PipelineState::Running)
            }
            (Restart, PipelineState::Idle) => {
                self.state = PipelineState::Running;
                TransitionResult::Restarted
            }
            (Stop, PipelineState::Running) => {
                self.state = PipelineState::Stopping;
                TransitionResult::StateChanged(PipelineState::Stopping)
            }
            (Drained, PipelineState::Stopping) => {
                self.state = PipelineState::Idle;
                TransitionResult::StateChanged(PipelineState::Idle)
            }
            (Fault, PipelineState::Running | PipelineState::Stopping) => {
                self.state = PipelineState::Idle;
                TransitionResult::Faulted
            }
            _ => TransitionResult::None,
        }
    }
}
