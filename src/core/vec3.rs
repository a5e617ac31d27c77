//! 3D Vector and Geometry Helpers
//!
//! Vector arithmetic, ray-vs-sphere intersection, barycentric weights and
//! angle normalization used by the terrain, collision and bot code.

use std::fmt;
use std::f64::consts::PI;
use std::ops::{Add, Sub, Mul, Neg};

/// Magnitudes below this are treated as "no motion".
pub const EPSILON: f64 = 1e-9;

/// 3D vector in world units. `y` is up.
#[derive(Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    /// X component
    pub x: f64,
    /// Y component (height)
    pub y: f64,
    /// Z component
    pub z: f64,
}

impl Vec3 {
    /// Zero vector
    pub const ZERO: Self = Self { x: 0.0, y: 0.0, z: 0.0 };

    /// Create a new vector.
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Dot product.
    #[inline]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Squared length.
    #[inline]
    pub fn length_squared(self) -> f64 {
        self.dot(self)
    }

    /// Length (magnitude).
    #[inline]
    pub fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Unit vector in the same direction, or `None` for a zero vector.
    #[inline]
    pub fn normalize(self) -> Option<Self> {
        let len = self.length();
        if len < EPSILON {
            None
        } else {
            Some(self * (1.0 / len))
        }
    }

    /// Euclidean distance to another point.
    #[inline]
    pub fn distance(self, other: Self) -> f64 {
        (self - other).length()
    }

    /// Distance to another point ignoring height.
    #[inline]
    pub fn planar_distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.z - other.z)
    }

    /// Linear interpolation: `self + (other - self) * t`.
    #[inline]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        self + (other - self) * t
    }

    /// Check that every component is finite.
    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vec3 {
    type Output = Self;
    #[inline]
    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;
    #[inline]
    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;
    #[inline]
    fn mul(self, scalar: f64) -> Self {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

impl Neg for Vec3 {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl fmt::Debug for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vec3({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
    }
}

// =============================================================================
// RAY / SPHERE
// =============================================================================

/// Intersect a ray with a sphere.
///
/// `direction` is expected to be a unit vector and `offset` is the vector
/// from the sphere center to the ray origin. Returns the smallest root in
/// `[0, max_t]`, or `None` when the ray misses or both roots fall outside
/// that range.
pub fn line_intersect_sphere(direction: Vec3, offset: Vec3, radius: f64, max_t: f64) -> Option<f64> {
    let a = direction.length_squared();
    if a < EPSILON {
        return None;
    }
    let b = 2.0 * direction.dot(offset);
    let c = offset.length_squared() - radius * radius;

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }

    let root = discriminant.sqrt();
    let t1 = (-b + root) / (2.0 * a);
    let t2 = (-b - root) / (2.0 * a);
    let in_range = |t: f64| (0.0..=max_t).contains(&t);

    match (in_range(t1), in_range(t2)) {
        (true, true) => Some(t1.min(t2)),
        (true, false) => Some(t1),
        (false, true) => Some(t2),
        (false, false) => None,
    }
}

// =============================================================================
// BARYCENTRIC
// =============================================================================

/// Barycentric weights of `(x, z)` inside the triangle `p1, p2, p3`.
///
/// Only the x and z components of the corners take part; y is ignored.
/// Returns `None` for a degenerate triangle.
pub fn barycentric_weights(p1: Vec3, p2: Vec3, p3: Vec3, x: f64, z: f64) -> Option<[f64; 3]> {
    let den = (p2.z - p3.z) * (p1.x - p3.x) + (p3.x - p2.x) * (p1.z - p3.z);
    if den.abs() < EPSILON {
        return None;
    }
    let w1 = ((p2.z - p3.z) * (x - p3.x) + (p3.x - p2.x) * (z - p3.z)) / den;
    let w2 = ((p3.z - p1.z) * (x - p3.x) + (p1.x - p3.x) * (z - p3.z)) / den;
    Some([w1, w2, 1.0 - w1 - w2])
}

// =============================================================================
// ANGLES
// =============================================================================

/// Wrap an angle into `[-PI, PI)`.
pub fn normalize_radians(angle: f64) -> f64 {
    (angle + PI).rem_euclid(2.0 * PI) - PI
}

/// Wrap an angle into `[-180, 180)`.
pub fn normalize_degrees(angle: f64) -> f64 {
    (angle + 180.0).rem_euclid(360.0) - 180.0
}

/// Heading of a planar velocity, measured from +z toward +x.
#[inline]
pub fn yaw_of(dx: f64, dz: f64) -> f64 {
    dx.atan2(dz)
}

// =============================================================================
// TESTS
// =============================================================================
