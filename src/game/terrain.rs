//! Terrain Generator
//!
//! Seeded height field over the playable square plus tree and rock
//! placement. Heights are computed once per grid corner; queries
//! interpolate inside one of the two triangles of a tile.
//!
//! ```text
//!  (i,j+1) ┌───────┐ (i+1,j+1)
//!          │     ╱ │
//!          │ dz ╱  │     dx > dz: (i,j) (i+1,j)   (i+1,j+1)
//!          │  ╱ dx │     else:    (i,j) (i+1,j+1) (i,j+1)
//!          │╱      │
//!    (i,j) └───────┘ (i+1,j)
//! ```

use crate::core::constants::{
    PLAYABLE_MIN, PLAYABLE_MAX, TILE_SIZE, TILE_COUNT, TREE_SIZE, ROCK_SIZE,
};
use crate::core::hash::{StateHash, StateHasher};
use crate::core::rng::DeterministicRng;
use crate::core::vec3::{Vec3, barycentric_weights};
use crate::game::map::WorldGenError;

/// Number of trees on every island.
pub const TREE_COUNT: usize = 1000;

/// Number of rocks on every island.
pub const ROCK_COUNT: usize = 1000;

/// Placement attempts allowed per requested point.
pub const PLACEMENT_ATTEMPTS_PER_POINT: usize = 1000;

/// Hill peak height.
const HILL_HEIGHT: f64 = 70.0;

/// Height lost per unit of distance from a hill.
const HILL_SLOPE: f64 = 0.3;

/// Lowest generated height before jitter.
const SEA_FLOOR: f64 = 0.1;

/// Amplitude of the per-corner jitter.
const JITTER: f64 = 5.0;

/// Query points closer than this to the playable edge are pulled inward.
const EDGE_MARGIN: f64 = 1.0;

const GRID_SIZE: usize = TILE_COUNT + 1;

/// A hill center on the ground plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hill {
    /// Center x
    pub x: f64,
    /// Center z
    pub z: f64,
}

/// Barycentric lookup result: the three grid corners and their weights.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TerrainSample {
    /// Grid indices `(i, j)` of the triangle corners.
    pub corners: [(usize, usize); 3],
    /// Weights of the corners; they sum to 1.
    pub weights: [f64; 3],
}

/// Seeded terrain: height grid, trees and rocks.
#[derive(Clone, Debug, PartialEq)]
pub struct Terrain {
    hills: Vec<Hill>,
    /// `heights[i][j]` is the corner at `x = min + i*T`, `z = min + j*T`.
    heights: Vec<Vec<f64>>,
    trees: Vec<Vec3>,
    rocks: Vec<Vec3>,
}

impl Terrain {
    /// Generate terrain, consuming from `rng`: hills, heights, trees, rocks.
    pub fn generate(rng: &mut DeterministicRng) -> Result<Self, WorldGenError> {
        let hills = init_hills(rng);

        let mut heights = vec![vec![0.0; GRID_SIZE]; GRID_SIZE];
        for (i, column) in heights.iter_mut().enumerate() {
            for (j, height) in column.iter_mut().enumerate() {
                let x = PLAYABLE_MIN + i as f64 * TILE_SIZE;
                let z = PLAYABLE_MIN + j as f64 * TILE_SIZE;
                *height = corner_height(&hills, rng, x, z);
            }
        }

        let mut terrain = Self {
            hills,
            heights,
            trees: Vec::new(),
            rocks: Vec::new(),
        };
        terrain.trees = terrain.create_random_points(rng, TREE_COUNT, TREE_SIZE)?;
        terrain.rocks = terrain.create_random_points(rng, ROCK_COUNT, ROCK_SIZE)?;

        Ok(terrain)
    }

    /// Level ground with no obstacles.
    pub fn flat(height: f64) -> Self {
        Self {
            hills: Vec::new(),
            heights: vec![vec![height; GRID_SIZE]; GRID_SIZE],
            trees: Vec::new(),
            rocks: Vec::new(),
        }
    }

    /// Replace the obstacle sets.
    pub fn with_obstacles(mut self, trees: Vec<Vec3>, rocks: Vec<Vec3>) -> Self {
        self.trees = trees;
        self.rocks = rocks;
        self
    }

    /// Hill centers.
    pub fn hills(&self) -> &[Hill] {
        &self.hills
    }

    /// Tree positions (top of trunk).
    pub fn trees(&self) -> &[Vec3] {
        &self.trees
    }

    /// Rock positions.
    pub fn rocks(&self) -> &[Vec3] {
        &self.rocks
    }

    /// Height of grid corner `(i, j)`.
    pub fn corner(&self, i: usize, j: usize) -> f64 {
        self.heights[i][j]
    }

    /// Locate the triangle containing `(x, z)` and its barycentric weights.
    pub fn barycentric(&self, x: f64, z: f64) -> TerrainSample {
        let x = clamp_inside(x);
        let z = clamp_inside(z);

        let i = (((x - PLAYABLE_MIN) / TILE_SIZE).trunc() as usize).min(TILE_COUNT - 1);
        let j = (((z - PLAYABLE_MIN) / TILE_SIZE).trunc() as usize).min(TILE_COUNT - 1);
        let x1 = PLAYABLE_MIN + i as f64 * TILE_SIZE;
        let z1 = PLAYABLE_MIN + j as f64 * TILE_SIZE;

        let corners = if x - x1 > z - z1 {
            [(i, j), (i + 1, j), (i + 1, j + 1)]
        } else {
            [(i, j), (i + 1, j + 1), (i, j + 1)]
        };

        let p = corners.map(|(ci, cj)| {
            Vec3::new(
                PLAYABLE_MIN + ci as f64 * TILE_SIZE,
                self.heights[ci][cj],
                PLAYABLE_MIN + cj as f64 * TILE_SIZE,
            )
        });

        // Grid triangles are never degenerate.
        let weights = barycentric_weights(p[0], p[1], p[2], x, z).unwrap_or([1.0, 0.0, 0.0]);

        TerrainSample { corners, weights }
    }

    /// Ground height at `(x, z)`.
    pub fn get_y(&self, x: f64, z: f64) -> f64 {
        let sample = self.barycentric(x, z);
        sample
            .corners
            .iter()
            .zip(sample.weights.iter())
            .map(|(&(i, j), w)| w * self.heights[i][j])
            .sum()
    }

    /// Uniform coordinate inside the playable square.
    pub fn random_playable_xz(rng: &mut DeterministicRng) -> f64 {
        PLAYABLE_MIN + (PLAYABLE_MAX - PLAYABLE_MIN) * rng.next_float()
    }

    /// Sample `count` points above sea level at `y_offset` over the ground.
    ///
    /// Each attempt draws x then z. Fails once the attempt budget is spent.
    pub fn create_random_points(
        &self,
        rng: &mut DeterministicRng,
        count: usize,
        y_offset: f64,
    ) -> Result<Vec<Vec3>, WorldGenError> {
        let budget = count.saturating_mul(PLACEMENT_ATTEMPTS_PER_POINT);
        let mut points = Vec::with_capacity(count);
        let mut attempts = 0;

        while points.len() < count {
            if attempts >= budget {
                return Err(WorldGenError::PlacementExhausted {
                    placed: points.len(),
                    requested: count,
                    y_offset,
                });
            }
            attempts += 1;

            let x = Self::random_playable_xz(rng);
            let z = Self::random_playable_xz(rng);
            let y = self.get_y(x, z) + y_offset;
            if y > 0.0 {
                points.push(Vec3::new(x, y, z));
            }
        }

        Ok(points)
    }

    /// SHA-256 over hills, heights and obstacles.
    pub fn fingerprint(&self) -> StateHash {
        let mut hasher = StateHasher::for_terrain();

        hasher.update_u32(self.hills.len() as u32);
        for hill in &self.hills {
            hasher.update_f64(hill.x);
            hasher.update_f64(hill.z);
        }
        for column in &self.heights {
            for &height in column {
                hasher.update_f64(height);
            }
        }
        hasher.update_u32(self.trees.len() as u32);
        for &tree in &self.trees {
            hasher.update_vec3(tree);
        }
        hasher.update_u32(self.rocks.len() as u32);
        for &rock in &self.rocks {
            hasher.update_vec3(rock);
        }

        hasher.finalize()
    }
}

fn init_hills(rng: &mut DeterministicRng) -> Vec<Hill> {
    let count = rng.next_range(6.0, 20.0) as usize;
    (0..count)
        .map(|_| {
            let angle = rng.next_range(0.0, 1000.0) / 100.0;
            let dist = rng.next_range(0.0, 200.0);
            Hill { x: dist * angle.cos(), z: dist * angle.sin() }
        })
        .collect()
}

fn corner_height(hills: &[Hill], rng: &mut DeterministicRng, x: f64, z: f64) -> f64 {
    let peak = hills
        .iter()
        .map(|h| HILL_HEIGHT - HILL_SLOPE * (x - h.x).hypot(z - h.z))
        .fold(SEA_FLOOR, f64::max);
    peak + JITTER * (rng.next_float() - 0.5)
}

fn clamp_inside(v: f64) -> f64 {
    if v <= PLAYABLE_MIN {
        PLAYABLE_MIN + EDGE_MARGIN
    } else if v >= PLAYABLE_MAX {
        PLAYABLE_MAX - EDGE_MARGIN
    } else {
        v
    }
}

// =============================================================================
// TESTS
// =============================================================================
