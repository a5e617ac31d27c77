//! World Constants
//!
//! Dimensions, speeds and timings shared by terrain generation, the
//! safe zone, collision and the tick.
//!
//! ```text
//! ┌──────────────────────── MIN_X..MAX_X (±500) ────────────────────────┐
//! │   water                                                             │
//! │        ┌────────── PLAYABLE_MIN..PLAYABLE_MAX (±400) ──────────┐    │
//! │        │   height grid: 21 x 21 corners, TILE_SIZE = 40       │    │
//! │        └───────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

// =============================================================================
// WORLD BOUNDS
// =============================================================================

/// Minimum world x coordinate.
pub const MIN_X: f64 = -500.0;

/// Maximum world x coordinate.
pub const MAX_X: f64 = 500.0;

/// Minimum world z coordinate.
pub const MIN_Z: f64 = -500.0;

/// Maximum world z coordinate.
pub const MAX_Z: f64 = 500.0;

/// Fraction of the world that is land.
pub const PLAYABLE_RANGE: f64 = 0.8;

/// Lower edge of the playable square (both axes).
pub const PLAYABLE_MIN: f64 = MIN_X * PLAYABLE_RANGE;

/// Upper edge of the playable square (both axes).
pub const PLAYABLE_MAX: f64 = MAX_X * PLAYABLE_RANGE;

/// Height grid spacing.
pub const TILE_SIZE: f64 = 40.0;

/// Number of tiles along one axis of the height grid.
pub const TILE_COUNT: usize = 20;

// =============================================================================
// ENTITY SIZES
// =============================================================================

/// Player sphere diameter.
pub const PLAYER_HEIGHT: f64 = 2.0;

/// Player sphere radius; also the spawn offset above the ground.
pub const PLAYER_HALF_HEIGHT: f64 = PLAYER_HEIGHT / 2.0;

/// Bullet spawn height above a player's position.
pub const PLAYER_EYELEVEL: f64 = 0.5;

/// Tree y offset above the ground.
pub const TREE_SIZE: f64 = 5.0;

/// Rock y offset above the ground.
pub const ROCK_SIZE: f64 = 1.0;

/// Ammo box y offset above the ground.
pub const AMMO_SIZE: f64 = 0.5;

/// Medkit y offset above the ground.
pub const MEDKIT_SIZE: f64 = 0.5;

/// Rock collision radius.
pub const ROCK_RADIUS: f64 = 0.8;

/// Tree trunk collision radius.
pub const TREE_RADIUS: f64 = 0.8;

/// Distance from a tree's stored y down to its trunk sphere center.
pub const TREE_TRUNK_DROP: f64 = 4.2;

/// Ground march step used by ray-vs-terrain tests.
pub const GROUND_STEP: f64 = 0.1;

// =============================================================================
// GAMEPLAY
// =============================================================================

/// Lobby match id.
pub const LOBBY_ID: u32 = 0;

/// Movement speed in units per second.
pub const RUN_SPEED: f64 = 8.0;

/// Movement per tick for bots.
pub const WALK_STEP: f64 = RUN_SPEED / 30.0;

/// Bullet speed in units per tick.
pub const BULLET_SPEED: f64 = 10.0;

/// Full health.
pub const MAX_HEALTH: i32 = 100;

/// Ammo given to a fresh player.
pub const STARTING_AMMO: i32 = 30;

/// Damage dealt by one bullet.
pub const BULLET_DAMAGE: i32 = 25;

/// Damage dealt by the zone every `ZONE_DAMAGE_INTERVAL` ticks.
pub const ZONE_DAMAGE: i32 = 5;

/// Ticks between zone damage applications.
pub const ZONE_DAMAGE_INTERVAL: u64 = 33;

/// Ammo restored by an ammo box.
pub const AMMO_PICKUP: i32 = 30;

/// Health restored by a medkit.
pub const MEDKIT_HEAL: i32 = 50;

/// Reload ticks after a shot.
pub const SHOT_COOLDOWN: u32 = 10;

/// Lifetime of a gunfire effect in client frames.
pub const GUNFIRE_COOLDOWN: u32 = 8;

/// Lifetime of a blood effect in client frames.
pub const BLOOD_COOLDOWN: u32 = 16;

/// Distance within which a player collects a pickup.
pub const PICKUP_RANGE: f64 = 1.0;

// =============================================================================
// SAFE ZONE TIMING
// =============================================================================

/// Number of safe-zone circles.
pub const CIRCLE_COUNT: usize = 6;

/// Index of the final circle.
pub const LAST_CIRCLE_INDEX: usize = CIRCLE_COUNT - 1;

/// Half phase after which the zone stops moving.
pub const LAST_CIRCLE_PHASE: usize = LAST_CIRCLE_INDEX * 2;

/// Seconds per full phase (one circle).
pub const FULL_PHASE: f64 = 60.0;

/// Seconds per half phase (hold, then shrink).
pub const HALF_PHASE: f64 = FULL_PHASE / 2.0;

/// Radius of the second circle; each later circle halves it.
pub const FIRST_SHRINK_RADIUS: f64 = 320.0;

/// Seconds of pre-game before a new match starts.
pub const PREGAME_TIME: f64 = 30.0;

/// A match stops accepting joins this many seconds before it starts.
pub const JOIN_CUTOFF: f64 = 3.0;
