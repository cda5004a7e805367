//! Value-and-gradient oracles, the only thing the optimizer needs from an objective.

use crate::energy::EnergyModel;

/// Evaluates an objective and its gradient at a point.
pub trait GradientOracle {
    /// Write the gradient at `x` into `grad` (same length as `x`) and return the value.
    fn evaluate(&mut self, x: &[f64], grad: &mut [f64]) -> f64;
}

/// Closed-form gradient of the energy model.
impl GradientOracle for EnergyModel {
    fn evaluate(&mut self, x: &[f64], grad: &mut [f64]) -> f64 {
        self.energy_and_gradient(x, grad)
    }
}

impl GradientOracle for &EnergyModel {
    fn evaluate(&mut self, x: &[f64], grad: &mut [f64]) -> f64 {
        self.energy_and_gradient(x, grad)
    }
}

/// Any `FnMut(x, grad) -> value` closure is an oracle.
impl<F> GradientOracle for F
where
    F: FnMut(&[f64], &mut [f64]) -> f64,
{
    fn evaluate(&mut self, x: &[f64], grad: &mut [f64]) -> f64 {
        self(x, grad)
    }
}

/// Gradient by central differences over a value-only objective.
/// Slow (two evaluations per coordinate), but needs nothing from the objective
/// beyond its value, so it can cross-check the closed-form gradient.
pub struct CentralDifference<F> {
    objective: F,
    step: f64,
    scratch: Vec<f64>,
}

impl<F> CentralDifference<F>
where
    F: FnMut(&[f64]) -> f64,
{
    /// Differentiate `objective` with this step size.
    pub fn new(objective: F, step: f64) -> Self {
        Self {
            objective,
            step,
            scratch: Vec::new(),
        }
    }
}

impl<F> GradientOracle for CentralDifference<F>
where
    F: FnMut(&[f64]) -> f64,
{
    fn evaluate(&mut self, x: &[f64], grad: &mut [f64]) -> f64 {
        self.scratch.clear();
        self.scratch.extend_from_slice(x);
        for (i, g) in grad.iter_mut().enumerate() {
            let original = self.scratch[i];
            self.scratch[i] = original + self.step;
            let plus = (self.objective)(&self.scratch);
            self.scratch[i] = original - self.step;
            let minus = (self.objective)(&self.scratch);
            self.scratch[i] = original;
            *g = (plus - minus) / (2.0 * self.step);
        }
        (self.objective)(x)
    }
}
