use super::{Config, FailureReason, all_finite, dot};
use crate::oracle::GradientOracle;

/// Doubling the trial step more than this many times means the objective is
/// probably unbounded along the search direction.
const MAX_EXPANSIONS: usize = 64;

/// A one-dimensional search along `direction` from `x`.
pub(super) struct LineSearch<'a> {
    pub config: &'a Config,
    pub x: &'a [f64],
    /// Objective value at `x`.
    pub energy: f64,
    pub direction: &'a [f64],
    /// Directional derivative at `x`. Must be negative.
    pub slope: f64,
}

/// A step length satisfying the strong Wolfe conditions, and where it lands.
pub(super) struct Accepted {
    pub step_length: f64,
    pub energy: f64,
    pub position: Vec<f64>,
    pub gradient: Vec<f64>,
}

impl LineSearch<'_> {
    /// Bracket a step length satisfying both strong Wolfe conditions, expanding
    /// while the bracket is open and bisecting once it closes.
    pub fn run<O: GradientOracle + ?Sized>(
        self,
        oracle: &mut O,
        initial_step: f64,
    ) -> Result<Accepted, FailureReason> {
        let Self {
            config,
            x,
            energy,
            direction,
            slope,
        } = self;
        debug_assert!(slope < 0.0, "line search needs a descent direction");

        let mut position = vec![0.0; x.len()];
        let mut gradient = vec![0.0; x.len()];
        let mut lo = 0.0;
        let mut hi = f64::INFINITY;
        let mut t = initial_step;
        let mut expansions = 0;

        loop {
            for ((p, xi), di) in position.iter_mut().zip(x).zip(direction) {
                *p = xi + t * di;
            }
            let trial = oracle.evaluate(&position, &mut gradient);
            if !all_finite(trial, &gradient) {
                return Err(FailureReason::NonFinite);
            }
            let trial_slope = dot(&gradient, direction);

            if trial > energy + config.armijo * t * slope {
                // Overshot: not enough decrease.
                hi = t;
            } else if trial_slope.abs() > config.wolfe * slope.abs() {
                if trial_slope < 0.0 {
                    // Still heading downhill.
                    lo = t;
                } else {
                    hi = t;
                }
            } else {
                return Ok(Accepted {
                    step_length: t,
                    energy: trial,
                    position,
                    gradient,
                });
            }

            if hi.is_finite() {
                if hi - lo < config.min_interval {
                    return Err(FailureReason::LineSearchExhausted);
                }
                t = 0.5 * (lo + hi);
            } else {
                expansions += 1;
                if expansions > MAX_EXPANSIONS {
                    return Err(FailureReason::LineSearchExhausted);
                }
                t *= 2.0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parabola(x: &[f64], g: &mut [f64]) -> f64 {
        g[0] = 2.0 * (x[0] - 3.0);
        (x[0] - 3.0).powi(2)
    }

    fn search<'a>(config: &'a Config, x: &'a [f64], direction: &'a [f64]) -> LineSearch<'a> {
        let mut g = [0.0];
        let energy = parabola(x, &mut g);
        LineSearch {
            config,
            x,
            energy,
            direction,
            slope: dot(&g, direction),
        }
    }

    #[test]
    fn exact_step_is_accepted() {
        let config = Config::default();
        let out = search(&config, &[0.0], &[1.0])
            .run(&mut parabola, 3.0)
            .unwrap_or_else(|e| panic!("{e}"));
        assert!((out.position[0] - 3.0).abs() < 1e-12);
        assert!(out.energy.abs() < 1e-12);
    }

    #[test]
    fn short_steps_expand() {
        let config = Config::default();
        let out = search(&config, &[0.0], &[1.0])
            .run(&mut parabola, 1e-3)
            .unwrap_or_else(|e| panic!("{e}"));
        // Strong Wolfe with 0.9 allows anything where |f'| <= 0.9 * 6.
        assert!(out.step_length > 0.3 && out.step_length < 5.7, "{}", out.step_length);
    }

    #[test]
    fn long_steps_bisect() {
        let config = Config::default();
        let out = search(&config, &[0.0], &[1.0])
            .run(&mut parabola, 1000.0)
            .unwrap_or_else(|e| panic!("{e}"));
        assert!(out.energy < 9.0);
        assert!((out.gradient[0]).abs() <= 0.9 * 6.0);
    }

    #[test]
    fn tiny_interval_gives_up() {
        let config = Config {
            min_interval: 10.0,
            ..Default::default()
        };
        let result = search(&config, &[0.0], &[1.0]).run(&mut parabola, 1000.0);
        assert!(matches!(result, Err(FailureReason::LineSearchExhausted)));
    }
}
