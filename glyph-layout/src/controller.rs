//! Couples the optimizer to a user dragging shapes around.

use std::ops::ControlFlow;

use crate::{
    datatypes::Point,
    energy::EnergyModel,
    error::Error,
    frame_outcome::FrameOutcome,
    id::ShapeId,
    lbfgs::{self, Config, OptimizerState, StepStatus},
    oracle::GradientOracle,
    placement::Placement,
    warnings::{Warning, lint},
};

/// Owns the placement and the optimizer state, and is the only thing that mutates them.
///
/// Driven by an external scheduler: call [`Controller::frame`] once per
/// animation frame, and the pointer methods as input arrives.
#[derive(Debug)]
pub struct Controller {
    model: EnergyModel,
    config: Config,
    placement: Placement,
    selected: Option<ShapeId>,
    /// `None` means the state must be rebuilt before the next step.
    state: Option<OptimizerState>,
    stop_on_stall: bool,
}

/// The energy, with the grabbed shape's gradient zeroed so the optimizer
/// never tries to move it.
struct Pinned<'a> {
    model: &'a EnergyModel,
    pinned: Option<ShapeId>,
}

impl GradientOracle for Pinned<'_> {
    fn evaluate(&mut self, x: &[f64], grad: &mut [f64]) -> f64 {
        let energy = self.model.energy_and_gradient(x, grad);
        if let Some(id) = self.pinned {
            let i = 2 * id as usize;
            grad[i] = 0.0;
            grad[i + 1] = 0.0;
        }
        energy
    }
}

impl Controller {
    /// Lay out the model's shapes, starting from this placement.
    pub fn new(model: EnergyModel, placement: Placement, config: Config) -> Result<Self, Error> {
        config.validate()?;
        if model.num_shapes() != placement.len() {
            return Err(Error::PlacementSize {
                shapes: model.num_shapes(),
                positions: placement.len(),
            });
        }
        Ok(Self {
            model,
            config,
            placement,
            selected: None,
            state: None,
            stop_on_stall: false,
        })
    }

    /// Grab the shape nearest to `point`. Ties go to the lowest shape ID.
    pub fn select(&mut self, point: Point) -> Option<ShapeId> {
        let selected = self.placement.nearest(point);
        self.set_selected(selected);
        self.selected
    }

    /// Move the grabbed shape to `point`. Does nothing if no shape is grabbed.
    pub fn drag(&mut self, point: Point) -> Option<ShapeId> {
        let id = self.selected?;
        self.placement.set_position(id, point);
        self.invalidate();
        Some(id)
    }

    /// Let go of the grabbed shape.
    pub fn release(&mut self) {
        self.set_selected(None);
    }

    /// Pinning changes which coordinates the optimizer sees, so the history
    /// only survives if the pinned shape stays the same.
    fn set_selected(&mut self, selected: Option<ShapeId>) {
        if self.selected != selected {
            self.invalidate();
        }
        self.selected = selected;
    }

    /// Throw away the optimizer's history. The next frame starts afresh from
    /// the current placement.
    pub fn invalidate(&mut self) {
        self.state = None;
    }

    /// End a frame early once a step leaves the energy exactly where it was.
    pub fn with_stop_on_stall(mut self, stop_on_stall: bool) -> Self {
        self.stop_on_stall = stop_on_stall;
        self
    }

    /// Run up to `config.max_steps` optimizer steps, keeping the grabbed shape where it is.
    pub fn frame(&mut self) -> FrameOutcome {
        let mut oracle = Pinned {
            model: &self.model,
            pinned: self.selected,
        };
        let mut reset = false;
        let state = self.state.get_or_insert_with(|| {
            reset = true;
            lbfgs::initialize(&self.config, &mut oracle, self.placement.coords())
        });
        if reset {
            tracing::info!(energy = state.energy(), "optimizer state reset");
        }
        let was_finished = state.is_finished();

        let pinned = self
            .selected
            .map(|id| (id, self.placement.position(id)));
        let stop_on_stall = self.stop_on_stall;
        let mut last_energy = state.energy();
        let mut stalled = false;
        let out = lbfgs::step_until(
            &self.config,
            &mut oracle,
            self.placement.coords_mut(),
            state,
            |info| {
                if stop_on_stall && info.energy == last_energy {
                    stalled = true;
                    return ControlFlow::Break(());
                }
                last_energy = info.energy;
                ControlFlow::Continue(())
            },
        );
        let mut status = out.status;
        let mut energy = state.energy();
        let mut gradient_norm = state.gradient_norm();

        if !was_finished && status != StepStatus::Stepped {
            tracing::info!(status = %status, iteration = state.iteration(), "optimizer stopped");
        }
        if stalled {
            tracing::debug!(energy, "energy stalled, ending frame early");
        }

        // Masking the gradient keeps the pinned shape still. This is the backstop.
        if let Some((id, saved)) = pinned
            && self.placement.position(id) != saved
        {
            self.placement.set_position(id, saved);
            let mut gradient = vec![0.0; self.placement.coords().len()];
            energy = oracle.evaluate(self.placement.coords(), &mut gradient);
            gradient_norm = lbfgs::norm(&gradient);
            // Whatever the optimizer concluded, it concluded about a point we
            // just moved away from.
            self.state = None;
            status = StepStatus::Stepped;
        }

        FrameOutcome {
            status,
            steps: out.steps,
            energy,
            gradient_norm,
            reset,
            stalled,
        }
    }

    /// Current position of every shape.
    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    /// The grabbed shape, if any.
    pub fn selected(&self) -> Option<ShapeId> {
        self.selected
    }

    /// The energy being minimized.
    pub fn model(&self) -> &EnergyModel {
        &self.model
    }

    /// Optimizer tuning.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The optimizer's state, unless it needs rebuilding.
    pub fn state(&self) -> Option<&OptimizerState> {
        self.state.as_ref()
    }

    /// Energy of the current placement.
    pub fn energy(&self) -> f64 {
        self.model.energy(self.placement.coords())
    }

    /// Problems worth telling the user about in the current placement.
    pub fn lint(&self) -> Vec<Warning> {
        lint(&self.model, &self.placement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::three_squares;

    fn controller() -> Controller {
        let (model, placement) = three_squares();
        Controller::new(model, placement, Config::default()).unwrap()
    }

    #[test]
    fn first_frame_resets_then_steps() {
        let mut c = controller();
        let before = c.energy();
        assert!(before > 0.0);
        let out = c.frame();
        assert!(out.reset());
        assert!(out.steps() > 0);
        assert!(out.energy() < before);
        // Nothing is grabbed, so the history carries over.
        let out = c.frame();
        assert!(!out.reset());
    }

    #[test]
    fn select_picks_nearest() {
        let mut c = controller();
        let target = c.placement().position(2);
        assert_eq!(c.select(target), Some(2));
        assert_eq!(c.selected(), Some(2));
        c.release();
        assert_eq!(c.selected(), None);
        assert_eq!(c.drag(Point::new(0.0, 0.0)), None);
    }

    #[test]
    fn dragged_shape_stays_pinned() {
        let mut c = controller();
        c.frame();
        let grab = c.placement().position(1);
        c.select(grab);
        let to = Point::new(-7.0, 2.5);
        assert_eq!(c.drag(to), Some(1));
        assert!(c.state().is_none());
        for _ in 0..5 {
            c.frame();
            assert_eq!(c.placement().position(1), to);
        }
    }

    #[test]
    fn settles_and_then_idles() {
        let mut c = controller();
        let mut settled = None;
        for _ in 0..200 {
            let out = c.frame();
            if out.is_settled() {
                settled = Some(out);
                break;
            }
        }
        let settled = settled.expect("layout never settled");
        assert_eq!(settled.status(), StepStatus::Converged);
        let frozen = c.placement().clone();
        let out = c.frame();
        assert_eq!(out.steps(), 0);
        assert!(!out.reset());
        assert_eq!(c.placement(), &frozen);

        // A drag wakes it up again.
        c.select(frozen.position(0));
        c.drag(Point::new(20.0, 20.0));
        let out = c.frame();
        assert!(out.reset());
        assert!(out.steps() > 0);
    }

    #[test]
    fn rejects_mismatched_placement() {
        let (model, _) = three_squares();
        let err = Controller::new(model, Placement::new([Point::default()]), Config::default())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::PlacementSize {
                shapes: 3,
                positions: 1
            }
        ));
    }

    #[test]
    fn rejects_bad_config() {
        let (model, placement) = three_squares();
        let config = Config::default().with_max_steps(0);
        assert!(matches!(
            Controller::new(model, placement, config),
            Err(Error::Config(_))
        ));
    }
}
