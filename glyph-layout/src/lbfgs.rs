//! Limited-memory BFGS, driven one step at a time so callers can spread a
//! minimization across animation frames.

use std::{collections::VecDeque, ops::ControlFlow};

use faer::ColRef;

use crate::{error::ConfigError, oracle::GradientOracle};

mod line_search;

use line_search::{Accepted, LineSearch};

/// Tuning for the optimizer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    /// How many curvature pairs to remember.
    pub m: usize,
    /// Sufficient-decrease coefficient.
    pub armijo: f64,
    /// Strong-Wolfe curvature coefficient.
    pub wolfe: f64,
    /// Give up on a line search once its bracket is narrower than this.
    pub min_interval: f64,
    /// Most steps a single [`step_until`] call may take.
    pub max_steps: usize,
    /// Floor for divisions, and threshold for accepting curvature pairs.
    pub epsd: f64,
    /// Converged once the gradient's L2 norm is below this.
    pub convergence_tolerance: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            m: 17,
            armijo: 1e-3,
            wolfe: 0.9,
            min_interval: 1e-9,
            max_steps: 10,
            epsd: 1e-11,
            convergence_tolerance: 1e-6,
        }
    }
}

impl Config {
    /// Remember this many curvature pairs.
    pub fn with_history(mut self, m: usize) -> Self {
        self.m = m;
        self
    }
    /// Cap the steps per [`step_until`] call.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }
    /// Converge at this gradient norm.
    pub fn with_tolerance(mut self, convergence_tolerance: f64) -> Self {
        self.convergence_tolerance = convergence_tolerance;
        self
    }

    /// Check the coefficients make sense together.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.armijo > 0.0 && self.armijo < 1.0) {
            return Err(ConfigError::Armijo(self.armijo));
        }
        if !(self.wolfe > self.armijo && self.wolfe < 1.0) {
            return Err(ConfigError::Wolfe {
                wolfe: self.wolfe,
                armijo: self.armijo,
            });
        }
        if !(self.min_interval > 0.0) {
            return Err(ConfigError::MinInterval(self.min_interval));
        }
        if !(self.epsd > 0.0) {
            return Err(ConfigError::Epsd(self.epsd));
        }
        if !(self.convergence_tolerance > 0.0) {
            return Err(ConfigError::Tolerance(self.convergence_tolerance));
        }
        if self.max_steps == 0 {
            return Err(ConfigError::NoSteps);
        }
        Ok(())
    }
}

/// Why the optimizer stopped making progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(not(feature = "unstable-exhaustive"), non_exhaustive)]
pub enum FailureReason {
    /// No step length satisfied both line-search conditions.
    LineSearchExhausted,
    /// The objective or its gradient was NaN or infinite.
    NonFinite,
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::LineSearchExhausted => write!(f, "line search exhausted"),
            FailureReason::NonFinite => write!(f, "non-finite energy or gradient"),
        }
    }
}

/// Result of one optimizer step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(not(feature = "unstable-exhaustive"), non_exhaustive)]
pub enum StepStatus {
    /// Moved, and there's still work to do.
    Stepped,
    /// Gradient norm is below tolerance. Further steps do nothing.
    Converged,
    /// Stuck. Further steps do nothing until the state is rebuilt.
    Failed(FailureReason),
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepStatus::Stepped => write!(f, "stepped"),
            StepStatus::Converged => write!(f, "converged"),
            StepStatus::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

#[derive(Clone, Debug)]
struct CurvaturePair {
    /// Change in position.
    s: Vec<f64>,
    /// Change in gradient.
    y: Vec<f64>,
    /// 1 / (s·y)
    rho: f64,
}

/// Everything the optimizer carries between steps.
/// Only valid for the position vector it was last evaluated at.
#[derive(Clone, Debug)]
pub struct OptimizerState {
    iteration: usize,
    energy: f64,
    gradient: Vec<f64>,
    history: VecDeque<CurvaturePair>,
    step_scale: f64,
    status: StepStatus,
}

impl OptimizerState {
    /// Steps taken since this state was initialized.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Objective value at the current position.
    pub fn energy(&self) -> f64 {
        self.energy
    }

    /// Objective gradient at the current position.
    pub fn gradient(&self) -> &[f64] {
        &self.gradient
    }

    /// L2 norm of [`Self::gradient`].
    pub fn gradient_norm(&self) -> f64 {
        norm(&self.gradient)
    }

    /// How many curvature pairs are remembered. Never more than `config.m`.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// `Stepped` while the optimizer can still make progress.
    pub fn status(&self) -> StepStatus {
        self.status
    }

    /// True once stepping can no longer change anything.
    pub fn is_finished(&self) -> bool {
        !matches!(self.status, StepStatus::Stepped)
    }

    fn fail(&mut self, reason: FailureReason) -> StepStatus {
        self.status = StepStatus::Failed(reason);
        self.status
    }
}

/// Start a fresh optimization at `x`, with no curvature history.
pub fn initialize<O: GradientOracle + ?Sized>(
    config: &Config,
    oracle: &mut O,
    x: &[f64],
) -> OptimizerState {
    let mut gradient = vec![0.0; x.len()];
    let energy = oracle.evaluate(x, &mut gradient);
    let mut state = OptimizerState {
        iteration: 0,
        energy,
        gradient,
        history: VecDeque::with_capacity(config.m),
        step_scale: 1.0,
        status: StepStatus::Stepped,
    };
    if !all_finite(energy, &state.gradient) {
        tracing::warn!(energy, "non-finite energy at the starting point");
        state.fail(FailureReason::NonFinite);
    }
    state
}

/// Take one step from `x`, updating it in place.
/// `x` must be the position `state` was last evaluated at.
pub fn step<O: GradientOracle + ?Sized>(
    config: &Config,
    oracle: &mut O,
    x: &mut [f64],
    state: &mut OptimizerState,
) -> StepStatus {
    if state.is_finished() {
        return state.status;
    }
    if state.gradient_norm() < config.convergence_tolerance {
        state.status = StepStatus::Converged;
        return state.status;
    }

    let mut direction = two_loop(&state.history, &state.gradient, config.epsd);
    let mut slope = dot(&state.gradient, &direction);
    if !(slope < 0.0) {
        // The curvature model has gone bad; fall back to steepest descent.
        tracing::debug!(slope, "two-loop direction is not a descent direction, clearing history");
        state.history.clear();
        direction = state.gradient.iter().map(|g| -g).collect();
        slope = -dot(&state.gradient, &state.gradient);
    }
    if !slope.is_finite() {
        tracing::warn!(iteration = state.iteration, "non-finite search direction");
        return state.fail(FailureReason::NonFinite);
    }

    let initial_step = if state.history.is_empty() {
        state.step_scale / state.gradient_norm().max(config.epsd)
    } else {
        1.0
    };

    let search = LineSearch {
        config,
        x,
        energy: state.energy,
        direction: &direction,
        slope,
    };
    let Accepted {
        step_length,
        energy,
        position,
        gradient,
    } = match search.run(oracle, initial_step) {
        Ok(accepted) => accepted,
        Err(reason) => {
            tracing::warn!(iteration = state.iteration, %reason, "optimizer step failed");
            return state.fail(reason);
        }
    };

    let s: Vec<f64> = direction.iter().map(|d| step_length * d).collect();
    let y: Vec<f64> = gradient
        .iter()
        .zip(&state.gradient)
        .map(|(new, old)| new - old)
        .collect();
    let sy = dot(&s, &y);
    state.step_scale = norm(&s);
    if sy > config.epsd {
        if state.history.len() == config.m {
            state.history.pop_front();
        }
        if config.m > 0 {
            state.history.push_back(CurvaturePair {
                s,
                y,
                rho: 1.0 / sy,
            });
        }
    } else {
        tracing::debug!(sy, "rejected curvature pair");
    }

    x.copy_from_slice(&position);
    state.energy = energy;
    state.gradient = gradient;
    state.iteration += 1;
    let gradient_norm = state.gradient_norm();
    tracing::debug!(
        iteration = state.iteration,
        energy,
        step_length,
        gradient_norm,
        "lbfgs step"
    );
    if gradient_norm < config.convergence_tolerance {
        state.status = StepStatus::Converged;
    }
    state.status
}

/// What [`step_until`]'s stop callback gets to see after each step.
#[derive(Debug)]
pub struct StepInfo<'a> {
    /// Positions after this step.
    pub x: &'a [f64],
    /// Energy after this step.
    pub energy: f64,
    /// Gradient norm after this step.
    pub gradient_norm: f64,
    /// Steps since the state was initialized.
    pub iteration: usize,
}

/// Result of a [`step_until`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepUntil {
    /// Status after the last step taken (or the state's status if none were).
    pub status: StepStatus,
    /// Steps actually taken by this call.
    pub steps: usize,
}

/// Keep stepping until convergence, failure, `config.max_steps` steps, or
/// `should_stop` breaks. Calling it again carries on where this call stopped.
pub fn step_until<O, F>(
    config: &Config,
    oracle: &mut O,
    x: &mut [f64],
    state: &mut OptimizerState,
    mut should_stop: F,
) -> StepUntil
where
    O: GradientOracle + ?Sized,
    F: FnMut(&StepInfo<'_>) -> ControlFlow<()>,
{
    let start = state.iteration;
    let mut status = state.status;
    while state.iteration - start < config.max_steps {
        status = step(config, &mut *oracle, x, state);
        if status != StepStatus::Stepped {
            break;
        }
        let info = StepInfo {
            x: &*x,
            energy: state.energy,
            gradient_norm: state.gradient_norm(),
            iteration: state.iteration,
        };
        if should_stop(&info).is_break() {
            break;
        }
    }
    StepUntil {
        status,
        steps: state.iteration - start,
    }
}

/// Approximate `-H⁻¹ g` from the remembered curvature pairs.
fn two_loop(history: &VecDeque<CurvaturePair>, gradient: &[f64], epsd: f64) -> Vec<f64> {
    let mut q = gradient.to_vec();
    let mut alphas = Vec::with_capacity(history.len());
    for pair in history.iter().rev() {
        let alpha = pair.rho * dot(&pair.s, &q);
        axpy(-alpha, &pair.y, &mut q);
        alphas.push(alpha);
    }
    if let Some(newest) = history.back() {
        let gamma = dot(&newest.s, &newest.y) / dot(&newest.y, &newest.y).max(epsd);
        q.iter_mut().for_each(|v| *v *= gamma);
    }
    for (pair, alpha) in history.iter().zip(alphas.iter().rev()) {
        let beta = pair.rho * dot(&pair.y, &q);
        axpy(alpha - beta, &pair.s, &mut q);
    }
    q.iter_mut().for_each(|v| *v = -*v);
    q
}

pub(crate) fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(a, b)| a * b).sum()
}

pub(crate) fn norm(v: &[f64]) -> f64 {
    ColRef::from_slice(v).norm_l2()
}

/// y += a * x
fn axpy(a: f64, x: &[f64], y: &mut [f64]) {
    for (yi, xi) in y.iter_mut().zip(x) {
        *yi += a * xi;
    }
}

fn all_finite(value: f64, gradient: &[f64]) -> bool {
    value.is_finite() && gradient.iter().all(|g| g.is_finite())
}
