//! 2D points in frame pixel space

use std::ops::{Add, Mul, Sub};

/// A point (or displacement) in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Clamp into `[0, width] x [0, height]`
    #[inline]
    pub fn clamp_to(self, width: f32, height: f32) -> Self {
        Self {
            x: self.x.clamp(0.0, width),
            y: self.y.clamp(0.0, height),
        }
    }
}

impl Add for Point2 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point2 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Point2 {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_to_frame() {
        let p = Point2::new(-12.0, 900.0).clamp_to(640.0, 360.0);
        assert_eq!(p, Point2::new(0.0, 360.0));
    }

    #[test]
    fn test_arithmetic() {
        let elbow = Point2::new(100.0, 200.0);
        let wrist = Point2::new(150.0, 150.0);
        assert_eq!(elbow + (wrist - elbow) * 2.0, Point2::new(200.0, 100.0));
    }
}
