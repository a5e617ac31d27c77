//! Player Input
//!
//! Validated client input. Clients are trusted for their own pose: the
//! reported position, heading and velocity overwrite the server copy, and
//! discrete actions are applied in the order they were sent.

use crate::core::vec3::Vec3;
use crate::game::entity::Entity;

/// A discrete request carried alongside a pose update.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlayerAction {
    /// Leave the current match for the next joinable one.
    Join,
    /// Fire along a direction.
    Shoot(Vec3),
}

/// One validated input message.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerInput {
    /// Display name
    pub name: Option<String>,
    /// Heading in radians
    pub yaw: Option<f64>,
    /// Reported position
    pub position: Vec3,
    /// Reported velocity, if every component was sent
    pub velocity: Option<Vec3>,
    /// Actions in arrival order
    pub actions: Vec<PlayerAction>,
}

impl PlayerInput {
    /// Overwrite the player's pose with the reported one.
    ///
    /// Absent name, heading or velocity clear the server copy.
    pub fn apply_pose(&self, player: &mut Entity) {
        player.name = self.name.clone();
        player.yaw = self.yaw;
        player.position = self.position;
        player.velocity = self.velocity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entity::EntityType;

    #[test]
    fn test_apply_pose() {
        let mut player = Entity::new(EntityType::Player, 1, Vec3::ZERO);
        player.velocity = Some(Vec3::new(1.0, 0.0, 0.0));

        let input = PlayerInput {
            name: Some("alice".into()),
            yaw: Some(1.5),
            position: Vec3::new(3.0, 4.0, 5.0),
            velocity: None,
            actions: Vec::new(),
        };
        input.apply_pose(&mut player);

        assert_eq!(player.name.as_deref(), Some("alice"));
        assert_eq!(player.yaw, Some(1.5));
        assert_eq!(player.position, Vec3::new(3.0, 4.0, 5.0));
        assert_eq!(player.velocity, None);
        assert_eq!(player.health, 100);
    }
}
