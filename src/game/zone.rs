//! Safe-Zone Schedule
//!
//! Nested circles generated from the match seed, and the time-indexed
//! inner (damaging) and outer (target) circles.
//!
//! ```text
//! phase:   0      1      2      3     ...   9      10+
//! inner:   c0   c0→c1   c1   c1→c2  ...  c4→c5    c5
//! outer:   c1     c1     c2     c2   ...   c5      c5
//! ```

use crate::core::constants::{
    CIRCLE_COUNT, LAST_CIRCLE_INDEX, LAST_CIRCLE_PHASE,
    FULL_PHASE, HALF_PHASE, FIRST_SHRINK_RADIUS, MAX_X,
};
use crate::core::rng::DeterministicRng;
use crate::core::vec3::Vec3;
use crate::game::map::WorldGenError;

/// Attempts allowed when placing one circle center.
pub const MAX_CIRCLE_ATTEMPTS: usize = 10_000;

/// A zone circle on the ground plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circle {
    /// Center x
    pub x: f64,
    /// Center z
    pub z: f64,
    /// Radius
    pub radius: f64,
}

impl Circle {
    /// Create a circle.
    pub const fn new(x: f64, z: f64, radius: f64) -> Self {
        Self { x, z, radius }
    }

    /// Planar distance from the center to `(x, z)`.
    #[inline]
    pub fn distance_to(&self, x: f64, z: f64) -> f64 {
        (x - self.x).hypot(z - self.z)
    }

    /// Strictly outside the circle.
    #[inline]
    pub fn is_outside(&self, x: f64, z: f64) -> bool {
        self.distance_to(x, z) > self.radius
    }

    /// Convenience for a world position.
    #[inline]
    pub fn contains_point(&self, position: Vec3) -> bool {
        !self.is_outside(position.x, position.z)
    }

    /// Interpolate center and radius toward `other`.
    pub fn lerp(&self, other: &Circle, f: f64) -> Circle {
        Circle {
            x: self.x + (other.x - self.x) * f,
            z: self.z + (other.z - self.z) * f,
            radius: self.radius + (other.radius - self.radius) * f,
        }
    }
}

/// `is_outside` as a free function over explicit parameters.
#[inline]
pub fn is_outside(circle: &Circle, position: Vec3) -> bool {
    circle.is_outside(position.x, position.z)
}

/// Half phase for elapsed match time.
pub fn circle_phase(t: f64) -> usize {
    ((t / HALF_PHASE).trunc().max(0.0) as usize).min(LAST_CIRCLE_PHASE)
}

/// Circle index for elapsed match time.
pub fn circle_index(t: f64) -> usize {
    ((t / FULL_PHASE).trunc().max(0.0) as usize).min(LAST_CIRCLE_INDEX)
}

/// The ordered set of nested zone circles for one match.
#[derive(Clone, Debug, PartialEq)]
pub struct SafeZoneSchedule {
    circles: Vec<Circle>,
}

impl SafeZoneSchedule {
    /// Generate the circles, consuming from `rng`.
    ///
    /// The first circle covers the whole island; each later circle halves
    /// the radius and lies fully inside its parent.
    pub fn generate(rng: &mut DeterministicRng) -> Result<Self, WorldGenError> {
        let mut circles = Vec::with_capacity(CIRCLE_COUNT);
        circles.push(Circle::new(0.0, 0.0, MAX_X));

        let mut radius = FIRST_SHRINK_RADIUS;
        while circles.len() < CIRCLE_COUNT {
            let parent = circles[circles.len() - 1];
            circles.push(choose_circle(rng, &parent, radius, circles.len())?);
            radius /= 2.0;
        }

        Ok(Self { circles })
    }

    /// Build from explicit circles.
    pub fn from_circles(circles: Vec<Circle>) -> Self {
        Self { circles }
    }

    /// All circles, outermost first.
    pub fn circles(&self) -> &[Circle] {
        &self.circles
    }

    /// The white circle: where the zone is heading.
    pub fn outer_circle(&self, t: f64) -> Circle {
        if circle_phase(t) == LAST_CIRCLE_PHASE {
            return self.circles[LAST_CIRCLE_INDEX];
        }
        self.circles[circle_index(t) + 1]
    }

    /// The blue circle: the boundary that currently deals damage.
    pub fn inner_circle(&self, t: f64) -> Circle {
        let phase = circle_phase(t);
        if phase == LAST_CIRCLE_PHASE {
            return self.circles[LAST_CIRCLE_INDEX];
        }

        let index = circle_index(t);
        if phase % 2 == 0 {
            return self.circles[index];
        }

        let f = t.rem_euclid(HALF_PHASE) / HALF_PHASE;
        self.circles[index].lerp(&self.circles[index + 1], f)
    }
}

fn choose_circle(
    rng: &mut DeterministicRng,
    parent: &Circle,
    radius: f64,
    index: usize,
) -> Result<Circle, WorldGenError> {
    let rdelta = parent.radius - radius;
    for _ in 0..MAX_CIRCLE_ATTEMPTS {
        let x = rng.next_range(parent.x - rdelta, parent.x + rdelta);
        let z = rng.next_range(parent.z - rdelta, parent.z + rdelta);
        if parent.distance_to(x, z) < rdelta {
            return Ok(Circle::new(x, z, radius));
        }
    }
    Err(WorldGenError::CircleExhausted { index, attempts: MAX_CIRCLE_ATTEMPTS })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule(seed: u32) -> SafeZoneSchedule {
        SafeZoneSchedule::generate(&mut DeterministicRng::new(seed)).unwrap()
    }

    #[test]
    fn test_six_halving_circles() {
        let zones = schedule(1234);
        let radii: Vec<f64> = zones.circles().iter().map(|c| c.radius).collect();
        assert_eq!(radii, vec![500.0, 320.0, 160.0, 80.0, 40.0, 20.0]);
        assert_eq!(zones.circles()[0], Circle::new(0.0, 0.0, 500.0));
    }

    #[test]
    fn test_circle_containment() {
        for seed in [0, 1, 42, 777, 9999] {
            let zones = schedule(seed);
            for pair in zones.circles().windows(2) {
                let (parent, child) = (pair[0], pair[1]);
                let d = parent.distance_to(child.x, child.z);
                assert!(d + child.radius <= parent.radius, "seed {seed}: {child:?} escapes {parent:?}");
            }
        }
    }

    #[test]
    fn test_phases() {
        assert_eq!(circle_phase(-10.0), 0);
        assert_eq!(circle_phase(29.9), 0);
        assert_eq!(circle_phase(30.0), 1);
        assert_eq!(circle_phase(1000.0), LAST_CIRCLE_PHASE);
        assert_eq!(circle_index(59.9), 0);
        assert_eq!(circle_index(60.0), 1);
        assert_eq!(circle_index(1000.0), LAST_CIRCLE_INDEX);
    }

    #[test]
    fn test_inner_and_outer_schedule() {
        let zones = schedule(5);
        let c = zones.circles();

        assert_eq!(zones.inner_circle(10.0), c[0]);
        assert_eq!(zones.outer_circle(10.0), c[1]);
        assert_eq!(zones.inner_circle(70.0), c[1]);
        assert_eq!(zones.outer_circle(70.0), c[2]);

        let mid = zones.inner_circle(45.0);
        assert!((mid.radius - (c[0].radius + c[1].radius) / 2.0).abs() < 1e-9);

        assert_eq!(zones.inner_circle(400.0), c[5]);
        assert_eq!(zones.outer_circle(400.0), c[5]);
    }

    #[test]
    fn test_inner_circle_continuity() {
        let zones = schedule(321);
        let eps = 1e-6;
        let mut boundary = HALF_PHASE;
        while boundary <= HALF_PHASE * LAST_CIRCLE_PHASE as f64 {
            let before = zones.inner_circle(boundary - eps);
            let after = zones.inner_circle(boundary + eps);
            assert!((before.radius - after.radius).abs() < 1e-3, "radius jump at {boundary}");
            assert!(before.distance_to(after.x, after.z) < 1e-3, "center jump at {boundary}");
            boundary += HALF_PHASE;
        }
    }

    #[test]
    fn test_is_outside_is_strict() {
        let circle = Circle::new(0.0, 0.0, 10.0);
        assert!(!circle.is_outside(10.0, 0.0));
        assert!(circle.is_outside(10.01, 0.0));
        assert!(is_outside(&circle, Vec3::new(0.0, 99.0, 11.0)));
    }
}
