//! Entities
//!
//! Every object in a match (players, bullets, pickups) and every transient
//! effect (gunfire, blood, death, pickup) is an `Entity` with an explicit
//! category tag and optional attributes.

use serde::{Serialize, Deserialize};

use crate::core::constants::MAX_HEALTH;
use crate::core::vec3::Vec3;

/// Entity identifier, unique within one match.
pub type EntityId = u32;

// =============================================================================
// ENTITY TYPE
// =============================================================================

/// Entity category with its stable wire code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum EntityType {
    /// Terrain (collision marker only)
    Ground = 1,
    /// Human or bot player
    Player = 2,
    /// Bullet in flight
    Bullet = 3,
    /// Tree obstacle
    Tree = 4,
    /// Rock obstacle
    Rock = 5,
    /// Ammo box
    Ammo = 6,
    /// Medkit
    Medkit = 7,
    /// Action: join a match
    Join = 8,
    /// Action: fire
    Shoot = 9,
    /// Lifecycle: match created
    GameCreate = 10,
    /// Lifecycle: match started
    GameStart = 11,
    /// Lifecycle: match ended
    GameEnd = 12,
    /// Effect: muzzle flash
    Gunfire = 13,
    /// Effect: hit marker
    Blood = 14,
    /// Event: a player was eliminated
    Death = 15,
    /// Event: a pickup was collected
    Pickup = 16,
}

impl EntityType {
    /// Wire code.
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Parse a wire code.
    pub fn from_code(code: u8) -> Option<Self> {
        use EntityType::*;
        Some(match code {
            1 => Ground,
            2 => Player,
            3 => Bullet,
            4 => Tree,
            5 => Rock,
            6 => Ammo,
            7 => Medkit,
            8 => Join,
            9 => Shoot,
            10 => GameCreate,
            11 => GameStart,
            12 => GameEnd,
            13 => Gunfire,
            14 => Blood,
            15 => Death,
            16 => Pickup,
            _ => return None,
        })
    }

    /// Collected by walking over it.
    #[inline]
    pub fn is_pickup(self) -> bool {
        matches!(self, EntityType::Ammo | EntityType::Medkit)
    }
}

impl From<EntityType> for u8 {
    fn from(t: EntityType) -> u8 {
        t.code()
    }
}

impl TryFrom<u8> for EntityType {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        EntityType::from_code(code).ok_or_else(|| format!("unknown entity type {code}"))
    }
}

// =============================================================================
// ENTITY
// =============================================================================

/// One entity in a match.
///
/// `cooldown` has two meanings depending on the category: ticks until the
/// next shot for players, frames until the effect expires for transient
/// entities.
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    /// Category tag
    pub entity_type: EntityType,
    /// Match-unique id
    pub entity_id: EntityId,
    /// Position
    pub position: Vec3,
    /// Velocity per tick
    pub velocity: Option<Vec3>,
    /// Health, never negative
    pub health: i32,
    /// Rounds left
    pub ammo: Option<i32>,
    /// Reload or expiry countdown
    pub cooldown: Option<u32>,
    /// Placement, set on elimination
    pub rank: Option<u32>,
    /// Display name
    pub name: Option<String>,
    /// Owner: shooter, killer or collector
    pub player_id: Option<EntityId>,
    /// Heading in radians
    pub yaw: Option<f64>,
    /// Look pitch in radians
    pub pitch: Option<f64>,
    /// Driven by the server AI
    pub bot: bool,
}

impl Entity {
    /// Create an entity with default attributes.
    pub fn new(entity_type: EntityType, entity_id: EntityId, position: Vec3) -> Self {
        Self {
            entity_type,
            entity_id,
            position,
            velocity: None,
            health: MAX_HEALTH,
            ammo: None,
            cooldown: None,
            rank: None,
            name: None,
            player_id: None,
            yaw: None,
            pitch: None,
            bot: false,
        }
    }

    /// Health above zero.
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// A living player.
    #[inline]
    pub fn is_live_player(&self) -> bool {
        self.entity_type == EntityType::Player && self.is_alive()
    }

    /// Apply damage, flooring health at zero.
    pub fn damage(&mut self, amount: i32) {
        self.health = (self.health - amount).max(0);
    }

    /// Reload countdown, treating absent as ready.
    #[inline]
    pub fn cooldown_ticks(&self) -> u32 {
        self.cooldown.unwrap_or(0)
    }

    /// Rounds left, treating absent as empty.
    #[inline]
    pub fn ammo_count(&self) -> i32 {
        self.ammo.unwrap_or(0)
    }
}
