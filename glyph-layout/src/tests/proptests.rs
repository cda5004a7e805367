use std::ops::ControlFlow;

use proptest::prelude::*;

use crate::{
    Config, Controller,
    datatypes::{Point, Polygon},
    distance::{signed_distance, signed_distance_with_gradient},
    lbfgs::{self, StepStatus},
    tests::{assert_nearly_eq, rectangle, three_squares},
};

/// Closed-form signed distance to an axis-aligned box centered on the origin.
fn box_distance(half_x: f64, half_y: f64, p: Point) -> f64 {
    let dx = p.x.abs() - half_x;
    let dy = p.y.abs() - half_y;
    let outside = (dx.max(0.0).powi(2) + dy.max(0.0).powi(2)).sqrt();
    let inside = dx.max(dy).min(0.0);
    outside + inside
}

proptest! {
    #[test]
    fn matches_box_distance(
        half_x in 0.1..50.0f64,
        half_y in 0.1..50.0f64,
        x in -100.0..100.0f64,
        y in -100.0..100.0f64,
    ) {
        let p = Point::new(x, y);
        let actual = signed_distance(&rectangle(half_x, half_y), p);
        assert_nearly_eq(actual, box_distance(half_x, half_y, p));
    }

    #[test]
    fn orientation_does_not_matter(
        half_x in 0.1..50.0f64,
        half_y in 0.1..50.0f64,
        x in -100.0..100.0f64,
        y in -100.0..100.0f64,
    ) {
        let ccw = rectangle(half_x, half_y);
        let mut reversed: Vec<Point> = ccw.vertices().collect();
        reversed.reverse();
        let cw = Polygon::new(reversed).unwrap();
        let p = Point::new(x, y);
        assert_nearly_eq(signed_distance(&ccw, p), signed_distance(&cw, p));
    }

    #[test]
    fn gradient_is_unit_or_zero(
        half_x in 0.1..50.0f64,
        half_y in 0.1..50.0f64,
        x in -100.0..100.0f64,
        y in -100.0..100.0f64,
    ) {
        let sd = signed_distance_with_gradient(&rectangle(half_x, half_y), Point::new(x, y));
        let len = sd.gradient.euclidean_distance(Point::default());
        prop_assert!(sd.value == 0.0 || (len - 1.0).abs() < 1e-9, "gradient length {len}");
    }

    #[test]
    fn history_never_exceeds_m(
        m in 1usize..6,
        weights in prop::collection::vec(0.1..100.0f64, 2..8),
        start in prop::collection::vec(-50.0..50.0f64, 8),
    ) {
        let config = Config::default().with_history(m).with_max_steps(3);
        let mut oracle = |x: &[f64], g: &mut [f64]| {
            let mut f = 0.0;
            for ((xi, gi), w) in x.iter().zip(g.iter_mut()).zip(&weights) {
                f += w * xi * xi;
                *gi = 2.0 * w * xi;
            }
            f
        };
        let mut x = start[..weights.len()].to_vec();
        let mut state = lbfgs::initialize(&config, &mut oracle, &x);
        for _ in 0..20 {
            lbfgs::step_until(&config, &mut oracle, &mut x, &mut state, |_| ControlFlow::Continue(()));
            prop_assert!(state.history_len() <= m);
        }
    }

    #[test]
    fn converges_on_convex_quadratics(
        weights in prop::collection::vec(0.5..20.0f64, 2..6),
        start in prop::collection::vec(-50.0..50.0f64, 6),
    ) {
        let config = Config::default();
        let mut oracle = |x: &[f64], g: &mut [f64]| {
            let mut f = 0.0;
            for ((xi, gi), w) in x.iter().zip(g.iter_mut()).zip(&weights) {
                f += w * (xi - 1.0).powi(2);
                *gi = 2.0 * w * (xi - 1.0);
            }
            f
        };
        let mut x = start[..weights.len()].to_vec();
        let mut state = lbfgs::initialize(&config, &mut oracle, &x);
        let mut calls = 0;
        while !state.is_finished() && calls < 50 {
            lbfgs::step_until(&config, &mut oracle, &mut x, &mut state, |_| ControlFlow::Continue(()));
            calls += 1;
        }
        prop_assert_eq!(state.status(), StepStatus::Converged);
        // Once converged, nothing moves.
        let settled = x.clone();
        let again = lbfgs::step_until(&config, &mut oracle, &mut x, &mut state, |_| ControlFlow::Continue(()));
        prop_assert_eq!(again.steps, 0);
        prop_assert_eq!(x, settled);
    }

    #[test]
    fn dragged_shape_is_never_moved(
        shape in 0u32..3,
        x in -40.0..40.0f64,
        y in -40.0..40.0f64,
        frames in 1usize..20,
    ) {
        let (model, placement) = three_squares();
        let mut controller = Controller::new(model, placement, Config::default()).unwrap();
        let grab = controller.placement().position(shape);
        let selected = controller.select(grab).unwrap();
        let to = Point::new(x, y);
        controller.drag(to);
        for _ in 0..frames {
            controller.frame();
            prop_assert_eq!(controller.placement().position(selected), to);
        }
    }
}

#[test]
fn triangle_inside_and_outside() {
    let triangle = Polygon::new(vec![
        Point::new(0.0, 0.0),
        Point::new(4.0, 0.0),
        Point::new(0.0, 4.0),
    ])
    .unwrap();
    // Nearest edges are the two legs, both 1 away.
    assert_nearly_eq(signed_distance(&triangle, Point::new(1.0, 1.0)), -1.0);
    // Nearest feature is the hypotenuse: (10 + 10 - 4) / sqrt(2).
    assert_nearly_eq(
        signed_distance(&triangle, Point::new(10.0, 10.0)),
        16.0 / 2.0_f64.sqrt(),
    );
}
