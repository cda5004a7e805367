use crate::lbfgs::StepStatus;

/// What happened during one animation frame.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(not(feature = "unstable-exhaustive"), non_exhaustive)]
pub struct FrameOutcome {
    /// Optimizer status at the end of the frame.
    pub(crate) status: StepStatus,
    /// How many optimizer steps ran this frame.
    pub(crate) steps: usize,
    /// Energy of the placement at the end of the frame.
    pub(crate) energy: f64,
    /// Gradient norm at the end of the frame.
    pub(crate) gradient_norm: f64,
    /// Was the optimizer state rebuilt this frame?
    pub(crate) reset: bool,
    /// Did the frame end early because a step left the energy unchanged?
    pub(crate) stalled: bool,
}

impl FrameOutcome {
    /// Optimizer status at the end of the frame.
    pub fn status(&self) -> StepStatus {
        self.status
    }

    /// How many optimizer steps ran this frame.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Energy of the placement at the end of the frame.
    pub fn energy(&self) -> f64 {
        self.energy
    }

    /// Gradient norm at the end of the frame, over the shapes that are free to move.
    pub fn gradient_norm(&self) -> f64 {
        self.gradient_norm
    }

    /// Was the optimizer state rebuilt this frame?
    pub fn reset(&self) -> bool {
        self.reset
    }

    /// Did the frame end early because a step left the energy unchanged?
    /// Only happens with [`Controller::with_stop_on_stall`](crate::Controller::with_stop_on_stall).
    pub fn stalled(&self) -> bool {
        self.stalled
    }

    /// Will further frames do anything without a drag first?
    pub fn is_settled(&self) -> bool {
        !matches!(self.status, StepStatus::Stepped)
    }
}
