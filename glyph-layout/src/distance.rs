//! Signed distance from a point to a closed polygon.
//!
//! Nearest-edge distance is fused with a crossing-parity inside test
//! (<https://iquilezles.org/articles/distfunctions2d/>). The parity test does not
//! depend on vertex order, so points inside are negative for either orientation.

use crate::{
    datatypes::{Point, Polygon},
    vector::V,
};

/// Signed distance and its gradient with respect to the query point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SignedDistance {
    /// Negative inside the polygon, positive outside, zero on the boundary.
    pub value: f64,
    /// Unit vector pointing away from the nearest boundary point (scaled by the sign).
    /// Zero when the query point lies on the boundary.
    pub gradient: Point,
}

/// Signed distance from `point` to `polygon`.
pub fn signed_distance(polygon: &Polygon, point: Point) -> f64 {
    signed_distance_with_gradient(polygon, point).value
}

/// Signed distance from `point` to `polygon`, and its gradient.
///
/// At points equidistant from two edges the gradient follows whichever edge
/// was found first.
pub fn signed_distance_with_gradient(polygon: &Polygon, point: Point) -> SignedDistance {
    let v = polygon.raw();
    let p = V::from(point);
    let n = v.len();

    let mut nearest_sq = (p - v[0]).magnitude_squared();
    // Vector from the nearest boundary point to `p`.
    let mut nearest_offset = p - v[0];
    let mut sign = 1.0;

    let mut j = n - 1;
    for i in 0..n {
        let e = v[j] - v[i];
        let w = p - v[i];
        let ee = e.dot(&e);
        let b = if ee > 0.0 {
            let t = (w.dot(&e) / ee).clamp(0.0, 1.0);
            w - e * t
        } else {
            w
        };
        let bb = b.magnitude_squared();
        if bb < nearest_sq {
            nearest_sq = bb;
            nearest_offset = b;
        }

        let crossing = [p.y >= v[i].y, p.y < v[j].y, e.x * w.y > e.y * w.x];
        if crossing.iter().all(|&c| c) || crossing.iter().all(|&c| !c) {
            sign = -sign;
        }
        j = i;
    }

    let distance = nearest_sq.sqrt();
    let gradient = if distance > 0.0 {
        nearest_offset * (sign / distance)
    } else {
        V::ZERO
    };
    SignedDistance {
        value: sign * distance,
        gradient: gradient.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::assert_nearly_eq;

    fn triangle() -> Polygon {
        Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(0.0, 4.0),
        ])
        .unwrap()
    }

    fn square(half: f64) -> Polygon {
        Polygon::new(vec![
            Point::new(-half, -half),
            Point::new(half, -half),
            Point::new(half, half),
            Point::new(-half, half),
        ])
        .unwrap()
    }

    /// Brute-force distance to the nearest edge, by projecting onto every segment.
    fn nearest_edge_distance(polygon: &Polygon, p: Point) -> f64 {
        let v: Vec<_> = polygon.vertices().collect();
        let n = v.len();
        (0..n)
            .map(|i| {
                let a = v[i];
                let b = v[(i + 1) % n];
                let (ex, ey) = (b.x - a.x, b.y - a.y);
                let t = (((p.x - a.x) * ex + (p.y - a.y) * ey) / (ex * ex + ey * ey)).clamp(0.0, 1.0);
                Point::new(a.x + t * ex, a.y + t * ey).euclidean_distance(p)
            })
            .fold(f64::INFINITY, f64::min)
    }

    #[test]
    fn inside_triangle_is_negative() {
        let t = triangle();
        let p = Point::new(1.0, 1.0);
        let d = signed_distance(&t, p);
        assert!(d < 0.0);
        // The legs x = 0 and y = 0 are nearer than the hypotenuse (sqrt 2 away).
        assert_nearly_eq(d, -nearest_edge_distance(&t, p));
        assert_nearly_eq(d, -1.0);
    }

    #[test]
    fn far_outside_triangle_is_positive() {
        let t = triangle();
        let p = Point::new(10.0, 10.0);
        let d = signed_distance(&t, p);
        assert!(d > 0.0);
        // Projects onto the interior of the hypotenuse at (2, 2).
        assert_nearly_eq(d, nearest_edge_distance(&t, p));
        assert_nearly_eq(d, 8.0 * 2.0f64.sqrt());
        // Which is nearer than either far vertex.
        assert!(d < p.euclidean_distance(Point::new(4.0, 0.0)));
    }

    #[test]
    fn sign_ignores_orientation() {
        let ccw = triangle();
        let cw = Polygon::new(ccw.vertices().rev().collect()).unwrap();
        for p in [Point::new(1.0, 1.0), Point::new(3.0, 3.0), Point::new(-1.0, 0.5)] {
            assert_nearly_eq(signed_distance(&ccw, p), signed_distance(&cw, p));
        }
    }

    #[test]
    fn grows_without_bound_outside() {
        let s = square(1.0);
        let mut last = f64::NEG_INFINITY;
        for k in 1..20 {
            let d = signed_distance(&s, Point::new(3.0 * k as f64, 0.5));
            assert!(d > last);
            last = d;
        }
        assert!(last > 50.0);
    }

    #[test]
    fn inside_convex_matches_nearest_edge() {
        let s = square(2.0);
        for p in [Point::new(0.0, 0.0), Point::new(1.5, 0.2), Point::new(-0.3, -1.9)] {
            let d = signed_distance(&s, p);
            assert!(d < 0.0);
            assert_nearly_eq(-d, nearest_edge_distance(&s, p));
        }
    }

    #[test]
    fn gradient_points_away_from_boundary() {
        let s = square(1.0);
        let out = signed_distance_with_gradient(&s, Point::new(3.0, 0.0));
        assert_nearly_eq(out.value, 2.0);
        assert_nearly_eq(out.gradient.x, 1.0);
        assert_nearly_eq(out.gradient.y, 0.0);

        // Inside, moving towards the nearest edge raises the (negative) distance.
        let inside = signed_distance_with_gradient(&s, Point::new(0.5, 0.0));
        assert_nearly_eq(inside.value, -0.5);
        assert_nearly_eq(inside.gradient.x, 1.0);
        assert_nearly_eq(inside.gradient.y, 0.0);
    }

    #[test]
    fn gradient_matches_finite_difference() {
        let t = triangle();
        let h = 1e-6;
        for p in [Point::new(1.0, 0.5), Point::new(6.0, -1.0), Point::new(-2.0, 7.0)] {
            let g = signed_distance_with_gradient(&t, p).gradient;
            let dx = (signed_distance(&t, Point::new(p.x + h, p.y))
                - signed_distance(&t, Point::new(p.x - h, p.y)))
                / (2.0 * h);
            let dy = (signed_distance(&t, Point::new(p.x, p.y + h))
                - signed_distance(&t, Point::new(p.x, p.y - h)))
                / (2.0 * h);
            assert!((g.x - dx).abs() < 1e-5, "x: {} vs {dx}", g.x);
            assert!((g.y - dy).abs() < 1e-5, "y: {} vs {dy}", g.y);
        }
    }

    #[test]
    fn on_boundary_has_zero_gradient() {
        let s = square(1.0);
        let out = signed_distance_with_gradient(&s, Point::new(1.0, 0.0));
        assert_eq!(out.value.abs(), 0.0);
        assert_eq!(out.gradient, Point::default());
    }

    #[test]
    fn zero_length_edge_is_harmless() {
        let p = Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(0.0, 4.0),
        ])
        .unwrap();
        let d = signed_distance(&p, Point::new(1.0, 1.0));
        assert!(d.is_finite());
        assert_nearly_eq(d, -1.0);
    }
}
