//! Protocol Messages
//!
//! Wire format for client-server communication over WebSocket.
//! Both directions use one event name, `update`, wrapped as
//! `{"event":"update","data":...}` in JSON text frames. Clients may instead
//! send a bare bincode-encoded `ClientInput` in a binary frame.
//!
//! Outbound records omit every field that has no value.

use serde::{Serialize, Deserialize};

use crate::core::constants::MAX_HEALTH;
use crate::core::vec3::Vec3;
use crate::game::entity::{Entity, EntityId, EntityType};
use crate::game::events::GameEvent;
use crate::game::input::{PlayerAction, PlayerInput};
use crate::game::state::{MatchId, MatchState};

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Pose report plus queued actions.
    Update(ClientInput),
}

/// One discrete action as sent by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRecord {
    /// `Join` (8) or `Shoot` (9); other codes are ignored
    pub entity_type: u8,
    /// Direction x
    #[serde(default)]
    pub dx: Option<f64>,
    /// Direction y
    #[serde(default)]
    pub dy: Option<f64>,
    /// Direction z
    #[serde(default)]
    pub dz: Option<f64>,
}

impl ActionRecord {
    /// A join request.
    pub fn join() -> Self {
        Self { entity_type: EntityType::Join.code(), dx: None, dy: None, dz: None }
    }

    /// A shot along `direction`.
    pub fn shoot(direction: Vec3) -> Self {
        Self {
            entity_type: EntityType::Shoot.code(),
            dx: Some(direction.x),
            dy: Some(direction.y),
            dz: Some(direction.z),
        }
    }
}

/// The client's view of its own player.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInput {
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Heading
    #[serde(default)]
    pub yaw: Option<f64>,
    /// Position x
    #[serde(default)]
    pub x: Option<f64>,
    /// Position y
    #[serde(default)]
    pub y: Option<f64>,
    /// Position z
    #[serde(default)]
    pub z: Option<f64>,
    /// Velocity x
    #[serde(default)]
    pub dx: Option<f64>,
    /// Velocity y
    #[serde(default)]
    pub dy: Option<f64>,
    /// Velocity z
    #[serde(default)]
    pub dz: Option<f64>,
    /// Actions in order
    #[serde(default)]
    pub actions: Vec<ActionRecord>,
}

impl ClientInput {
    /// Validate into a game input.
    ///
    /// Returns `None` when any position component is missing. Unknown
    /// action codes are skipped; missing shot components count as zero.
    pub fn to_player_input(&self) -> Option<PlayerInput> {
        let position = Vec3::new(self.x?, self.y?, self.z?);
        let velocity = match (self.dx, self.dy, self.dz) {
            (Some(dx), Some(dy), Some(dz)) => Some(Vec3::new(dx, dy, dz)),
            _ => None,
        };

        let actions = self
            .actions
            .iter()
            .filter_map(|a| match EntityType::from_code(a.entity_type)? {
                EntityType::Join => Some(PlayerAction::Join),
                EntityType::Shoot => Some(PlayerAction::Shoot(Vec3::new(
                    a.dx.unwrap_or(0.0),
                    a.dy.unwrap_or(0.0),
                    a.dz.unwrap_or(0.0),
                ))),
                _ => None,
            })
            .collect();

        Some(PlayerInput {
            name: self.name.clone(),
            yaw: self.yaw,
            position,
            velocity,
            actions,
        })
    }

    /// Serialize to binary.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Deserialize from binary.
    pub fn from_bytes(data: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(data)
    }
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from server to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Full match snapshot.
    Update(GameStateRecord),
}

/// One entity or event on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRecord {
    /// Category code
    pub entity_type: EntityType,
    /// Position x
    pub x: f64,
    /// Position y
    pub y: f64,
    /// Position z
    pub z: f64,
    /// Velocity x
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dx: Option<f64>,
    /// Velocity y
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dy: Option<f64>,
    /// Velocity z
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dz: Option<f64>,
    /// Entity id, or the victim for deaths
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<EntityId>,
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Owner, killer or collector
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<EntityId>,
    /// Reload ticks or effect lifetime
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown: Option<u32>,
    /// Health
    pub health: i32,
    /// Rounds left
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ammo: Option<i32>,
    /// Final placement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
    /// Heading
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yaw: Option<f64>,
    /// Look pitch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f64>,
    /// Queued actions (client records only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<ActionRecord>>,
}

impl EntityRecord {
    fn bare(entity_type: EntityType, position: Vec3, health: i32) -> Self {
        Self {
            entity_type,
            x: position.x,
            y: position.y,
            z: position.z,
            dx: None,
            dy: None,
            dz: None,
            entity_id: None,
            name: None,
            player_id: None,
            cooldown: None,
            health,
            ammo: None,
            rank: None,
            yaw: None,
            pitch: None,
            actions: None,
        }
    }

    /// Position as a vector.
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

impl From<&Entity> for EntityRecord {
    fn from(e: &Entity) -> Self {
        let mut record = Self::bare(e.entity_type, e.position, e.health);
        if let Some(v) = e.velocity {
            record.dx = Some(v.x);
            record.dy = Some(v.y);
            record.dz = Some(v.z);
        }
        record.entity_id = Some(e.entity_id);
        record.name = e.name.clone();
        record.player_id = e.player_id;
        record.cooldown = e.cooldown;
        record.ammo = e.ammo;
        record.rank = e.rank;
        record.yaw = e.yaw;
        record.pitch = e.pitch;
        record
    }
}

impl From<&GameEvent> for EntityRecord {
    fn from(event: &GameEvent) -> Self {
        let mut record = Self::bare(event.entity_type(), event.position(), MAX_HEALTH);
        record.entity_id = event.entity_id();
        record.player_id = event.player_id();
        record.cooldown = event.cooldown();
        if let GameEvent::Death { rank, .. } = event {
            record.rank = Some(*rank);
        }
        record
    }
}

/// A match snapshot addressed to one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStateRecord {
    /// Match id
    pub game_id: MatchId,
    /// Island seed
    pub seed: u32,
    /// Recipient's player entity
    pub current_player_id: EntityId,
    /// Every entity in the match
    pub entities: Vec<EntityRecord>,
    /// Events queued for the recipient since the last snapshot
    pub events: Vec<EntityRecord>,
    /// Wall-clock start second
    pub start_time: f64,
    /// Seconds since start
    pub current_time: f64,
}

impl GameStateRecord {
    /// Build a snapshot of `state` for the user controlling `current_player_id`.
    pub fn snapshot(state: &MatchState, current_player_id: EntityId, events: &[GameEvent]) -> Self {
        Self {
            game_id: state.match_id,
            seed: state.seed(),
            current_player_id,
            entities: state.entities.iter().map(EntityRecord::from).collect(),
            events: events.iter().map(EntityRecord::from).collect(),
            start_time: state.start_time,
            current_time: state.current_time,
        }
    }
}

// =============================================================================
// SERIALIZATION
// =============================================================================

impl ClientMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
