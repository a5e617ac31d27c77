//! Game Logic Module
//!
//! Everything that happens inside a match. World generation is seeded and
//! reproducible; bot aim and bot names draw from a caller-supplied `rand`
//! generator.
//!
//! ## Module Structure
//!
//! - `zone`: Safe-zone circles and their shrink schedule
//! - `terrain`: Height field, trees and rocks
//! - `map`: Seeded island generation
//! - `entity`: Entity categories and attributes
//! - `events`: Transient effects for broadcast
//! - `state`: Match state, shooting and eliminations
//! - `collision`: Ray casts and bullet impacts
//! - `bot`: Server-driven players
//! - `tick`: Per-match simulation step
//! - `input`: Validated client input

pub mod zone;
pub mod terrain;
pub mod map;
pub mod entity;
pub mod events;
pub mod state;
pub mod collision;
pub mod bot;
pub mod tick;
pub mod input;

// Re-export key types
pub use zone::{Circle, SafeZoneSchedule};
pub use terrain::Terrain;
pub use map::{IslandMap, WorldGenError};
pub use entity::{Entity, EntityId, EntityType};
pub use events::GameEvent;
pub use state::{MatchId, MatchState, MatchSummary};
pub use collision::{Collision, Target};
pub use bot::BotAction;
pub use tick::{tick, MatchConfig, TickResult};
pub use input::{PlayerAction, PlayerInput};
