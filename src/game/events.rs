//! Game Events
//!
//! Transient effects produced by the simulation. A match queues them as
//! they happen; the session layer fans them out to every user's outbound
//! queue, and the protocol layer turns them into entity records.

use crate::core::constants::{GUNFIRE_COOLDOWN, BLOOD_COOLDOWN};
use crate::core::vec3::Vec3;
use crate::game::entity::{EntityId, EntityType};

/// Game event data.
#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    /// A shot was fired.
    Gunfire {
        /// Muzzle position
        position: Vec3,
        /// Shooter
        shooter: EntityId,
    },

    /// A bullet hit a player.
    Blood {
        /// Impact point
        position: Vec3,
    },

    /// A player was eliminated.
    Death {
        /// Eliminated player
        victim: EntityId,
        /// Shooter, absent for zone deaths
        killer: Option<EntityId>,
        /// Where it happened
        position: Vec3,
        /// Placement assigned
        rank: u32,
    },

    /// A pickup was collected.
    Pickup {
        /// Where the pickup was
        position: Vec3,
        /// Player that collected it
        collector: EntityId,
        /// Ammo or Medkit
        kind: EntityType,
    },
}

impl GameEvent {
    /// Wire category.
    pub fn entity_type(&self) -> EntityType {
        match self {
            GameEvent::Gunfire { .. } => EntityType::Gunfire,
            GameEvent::Blood { .. } => EntityType::Blood,
            GameEvent::Death { .. } => EntityType::Death,
            GameEvent::Pickup { .. } => EntityType::Pickup,
        }
    }

    /// Where the effect is shown.
    pub fn position(&self) -> Vec3 {
        match self {
            GameEvent::Gunfire { position, .. }
            | GameEvent::Blood { position }
            | GameEvent::Death { position, .. }
            | GameEvent::Pickup { position, .. } => *position,
        }
    }

    /// Player the event is tagged with (shooter, killer or collector).
    pub fn player_id(&self) -> Option<EntityId> {
        match self {
            GameEvent::Gunfire { shooter, .. } => Some(*shooter),
            GameEvent::Blood { .. } => None,
            GameEvent::Death { killer, .. } => *killer,
            GameEvent::Pickup { collector, .. } => Some(*collector),
        }
    }

    /// Entity the event refers to, if any.
    pub fn entity_id(&self) -> Option<EntityId> {
        match self {
            GameEvent::Death { victim, .. } => Some(*victim),
            _ => None,
        }
    }

    /// Frames the client keeps the effect alive.
    pub fn cooldown(&self) -> Option<u32> {
        match self {
            GameEvent::Gunfire { .. } => Some(GUNFIRE_COOLDOWN),
            GameEvent::Blood { .. } => Some(BLOOD_COOLDOWN),
            GameEvent::Death { .. } | GameEvent::Pickup { .. } => None,
        }
    }

    /// Is this an elimination?
    pub fn is_elimination(&self) -> bool {
        matches!(self, GameEvent::Death { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_tags() {
        let gunfire = GameEvent::Gunfire { position: Vec3::ZERO, shooter: 4 };
        assert_eq!(gunfire.entity_type(), EntityType::Gunfire);
        assert_eq!(gunfire.player_id(), Some(4));
        assert_eq!(gunfire.cooldown(), Some(8));

        let death = GameEvent::Death { victim: 9, killer: None, position: Vec3::ZERO, rank: 3 };
        assert_eq!(death.entity_id(), Some(9));
        assert_eq!(death.player_id(), None);
        assert!(death.is_elimination());
        assert_eq!(death.cooldown(), None);
    }
}
