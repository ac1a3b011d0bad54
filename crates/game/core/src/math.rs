//! Planar vector math on the (x, z) ground plane.
//!
//! Everything here is pure. Degenerate input (normalizing a zero vector,
//! projecting onto a zero-length segment) is the caller's problem: the
//! functions return finite fallbacks where that is cheap, but never error.

use std::ops::{Add, Mul, Neg, Sub};

/// Position or direction on the ground plane.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vector {
    pub x: f64,
    pub z: f64,
}

impl Vector {
    pub const ZERO: Self = Self { x: 0.0, z: 0.0 };

    pub const fn new(x: f64, z: f64) -> Self {
        Self { x, z }
    }

    #[inline]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.z * other.z
    }

    #[inline]
    pub fn norm(self) -> f64 {
        self.dot(self).sqrt()
    }

    #[inline]
    pub fn distance(self, other: Self) -> f64 {
        (self - other).norm()
    }

    /// Unit vector with the same heading.
    ///
    /// A zero vector yields NaN components, mirroring the plain division.
    pub fn normalize(self) -> Self {
        let n = self.norm();
        Self::new(self.x / n, self.z / n)
    }

    /// Unit vector from `self` towards `to`, or zero when both coincide.
    pub fn direction_to(self, to: Self) -> Self {
        let delta = to - self;
        if delta.norm() == 0.0 {
            return Self::ZERO;
        }
        delta.normalize()
    }

    #[inline]
    pub fn invert(self) -> Self {
        -self
    }

    #[inline]
    pub fn scale(self, factor: f64) -> Self {
        self * factor
    }

    /// Moves from `self` towards `to` by at most `step`, never overshooting.
    pub fn step_towards(self, to: Self, step: f64) -> Self {
        if self.distance(to) <= step {
            return to;
        }
        self + self.direction_to(to) * step
    }

    /// Returns true when both components are within `epsilon`.
    pub fn approx_eq(self, other: Self, epsilon: f64) -> bool {
        (self.x - other.x).abs() <= epsilon && (self.z - other.z).abs() <= epsilon
    }
}

impl Add for Vector {
    type Output = Vector;
    fn add(self, rhs: Vector) -> Vector {
        Vector::new(self.x + rhs.x, self.z + rhs.z)
    }
}

impl Sub for Vector {
    type Output = Vector;
    fn sub(self, rhs: Vector) -> Vector {
        Vector::new(self.x - rhs.x, self.z - rhs.z)
    }
}

impl Mul<f64> for Vector {
    type Output = Vector;
    fn mul(self, rhs: f64) -> Vector {
        Vector::new(self.x * rhs, self.z * rhs)
    }
}

impl Neg for Vector {
    type Output = Vector;
    fn neg(self) -> Vector {
        Vector::new(-self.x, -self.z)
    }
}

/// Parameter `t ∈ [0, 1]` of the point on segment `from → to` closest to `point`.
pub fn closest_param_on_segment(point: Vector, from: Vector, to: Vector) -> f64 {
    let segment = to - from;
    let length_sq = segment.dot(segment);
    if length_sq == 0.0 {
        return 0.0;
    }
    ((point - from).dot(segment) / length_sq).clamp(0.0, 1.0)
}

/// Shortest distance from `point` to the segment `from → to`.
///
/// Used for swept collision: a mover travelling along the segment touches a
/// circle centred at `point` iff this distance is below the combined radius.
pub fn distance_to_segment(point: Vector, from: Vector, to: Vector) -> f64 {
    let t = closest_param_on_segment(point, from, to);
    point.distance(from + (to - from) * t)
}

/// First parameter `t ∈ [0, 1]` at which the segment enters the circle, if any.
///
/// Returns `Some(0.0)` when `from` already lies inside the circle.
pub fn segment_circle_entry(from: Vector, to: Vector, center: Vector, radius: f64) -> Option<f64> {
    let d = to - from;
    let f = from - center;
    let c = f.dot(f) - radius * radius;
    if c <= 0.0 {
        return Some(0.0);
    }
    let a = d.dot(d);
    if a == 0.0 {
        return None;
    }
    let b = 2.0 * f.dot(d);
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }
    let t = (-b - discriminant.sqrt()) / (2.0 * a);
    (0.0..=1.0).contains(&t).then_some(t)
}

/// Angle in radians between two vectors, or 0 when either has no magnitude.
pub fn angle_between(v: Vector, w: Vector) -> f64 {
    let norms = v.norm() * w.norm();
    if norms == 0.0 {
        return 0.0;
    }
    (v.dot(w) / norms).clamp(-1.0, 1.0).acos()
}
