use crate::datatypes::Point;

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub(crate) struct V {
    pub x: f64,
    pub y: f64,
}

impl V {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    #[inline(always)]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline(always)]
    pub fn magnitude(&self) -> f64 {
        self.magnitude_squared().sqrt()
    }

    #[inline(always)]
    pub fn magnitude_squared(&self) -> f64 {
        self.x.powi(2) + self.y.powi(2)
    }

    #[inline(always)]
    pub fn dot(&self, rhs: &Self) -> f64 {
        self.x * rhs.x + self.y * rhs.y
    }

    #[inline(always)]
    pub fn euclidean_distance(self, rhs: Self) -> f64 {
        let d = self - rhs;
        d.magnitude()
    }

    /// <https://stackoverflow.com/questions/243945/calculating-a-2d-vectors-cross-product>
    #[inline(always)]
    pub fn cross_2d(&self, rhs: &Self) -> f64 {
        self.x * rhs.y - self.y * rhs.x
    }
}

impl std::ops::Add<Self> for V {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Sub<Self> for V {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl std::ops::Mul<f64> for V {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        Self {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}

impl From<Point> for V {
    fn from(p: Point) -> Self {
        Self::new(p.x, p.y)
    }
}

impl From<V> for Point {
    fn from(v: V) -> Self {
        Point { x: v.x, y: v.y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cross_sign_follows_turn_direction() {
        let east = V::new(1.0, 0.0);
        let north = V::new(0.0, 1.0);
        assert!(east.cross_2d(&north) > 0.0);
        assert!(north.cross_2d(&east) < 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = V::new(1.0, 2.0);
        let b = V::new(4.0, 6.0);
        assert_eq!(a.euclidean_distance(b), 5.0);
        assert_eq!(b.euclidean_distance(a), 5.0);
    }
}
