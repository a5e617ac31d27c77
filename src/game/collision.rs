//! Collision Detection
//!
//! Ray casts from an entity along its per-tick velocity against living
//! players, rocks, tree trunks and the ground. The earliest hit wins.

use tracing::debug;

use crate::core::constants::{
    PLAYER_HALF_HEIGHT, ROCK_RADIUS, TREE_RADIUS, TREE_TRUNK_DROP, GROUND_STEP, BULLET_DAMAGE,
};
use crate::core::vec3::{Vec3, line_intersect_sphere};
use crate::game::entity::{Entity, EntityId, EntityType};
use crate::game::events::GameEvent;
use crate::game::state::MatchState;
use crate::game::terrain::Terrain;

/// What a ray hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    /// A living player.
    Player(EntityId),
    /// Rock at this index of the terrain's rock list.
    Rock(usize),
    /// Tree at this index of the terrain's tree list.
    Tree(usize),
    /// The terrain surface.
    Ground,
}

impl Target {
    /// Wire category of the target.
    pub fn entity_type(self) -> EntityType {
        match self {
            Target::Player(_) => EntityType::Player,
            Target::Rock(_) => EntityType::Rock,
            Target::Tree(_) => EntityType::Tree,
            Target::Ground => EntityType::Ground,
        }
    }
}

/// Earliest intersection along a ray.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Collision {
    /// What was hit
    pub target: Target,
    /// Distance along the ray
    pub t: f64,
}

/// Cast from `origin` along `velocity`.
///
/// Players other than `origin` itself and its owner are candidates. A zero
/// velocity never collides.
pub fn line_collision(
    state: &MatchState,
    origin: &Entity,
    velocity: Vec3,
) -> Option<Collision> {
    cast_ray(
        &state.entities,
        &state.island.terrain,
        origin.position,
        velocity,
        |other| other.entity_id != origin.entity_id && Some(other.entity_id) != origin.player_id,
    )
}

/// Ray cast over an entity slice and terrain.
///
/// `eligible` filters which living players can be hit.
pub fn cast_ray(
    entities: &[Entity],
    terrain: &Terrain,
    start: Vec3,
    velocity: Vec3,
    eligible: impl Fn(&Entity) -> bool,
) -> Option<Collision> {
    let max_t = velocity.length();
    let direction = velocity.normalize()?;

    let mut best: Option<Collision> = None;
    let mut min_t = max_t;

    let mut consider = |target: Target, center: Vec3, radius: f64| {
        if let Some(t) = line_intersect_sphere(direction, start - center, radius, max_t) {
            if t < min_t {
                min_t = t;
                best = Some(Collision { target, t });
            }
        }
    };

    for other in entities.iter().filter(|e| e.is_live_player() && eligible(e)) {
        consider(Target::Player(other.entity_id), other.position, PLAYER_HALF_HEIGHT);
    }

    for (i, &rock) in terrain.rocks().iter().enumerate() {
        consider(Target::Rock(i), rock, ROCK_RADIUS);
    }

    for (i, &tree) in terrain.trees().iter().enumerate() {
        let trunk = tree - Vec3::new(0.0, TREE_TRUNK_DROP, 0.0);
        consider(Target::Tree(i), trunk, TREE_RADIUS);
    }

    // Coarse march: ground hits are only as precise as one step.
    let mut t = 0.0;
    while t < min_t {
        let p = start + direction * t;
        if p.y < terrain.get_y(p.x, p.z) {
            best = Some(Collision { target: Target::Ground, t });
            break;
        }
        t += GROUND_STEP;
    }

    best
}

/// Resolve a bullet's flight this tick.
///
/// A player hit loses health, may be eliminated, and a blood effect is
/// queued at the impact point. Obstacles and ground only stop the bullet.
/// Returns `true` when the bullet is spent.
pub fn bullet_collision(state: &mut MatchState, bullet_index: usize) -> bool {
    let bullet = &state.entities[bullet_index];
    let Some(velocity) = bullet.velocity else {
        return false;
    };
    let origin = bullet.position;
    let shooter = bullet.player_id;

    let Some(collision) = line_collision(state, bullet, velocity) else {
        return false;
    };

    match collision.target {
        Target::Player(victim) => {
            let impact = match velocity.normalize() {
                Some(u) => origin + u * collision.t,
                None => origin,
            };
            if let Some(index) = state.index_of(victim) {
                state.entities[index].damage(BULLET_DAMAGE);
                debug!(
                    match_id = state.match_id,
                    victim,
                    health = state.entities[index].health,
                    "Bullet hit player"
                );
                state.check_player_death(index, shooter);
            }
            state.push_event(GameEvent::Blood { position: impact });
        }
        Target::Rock(i) => debug!(match_id = state.match_id, rock = i, t = collision.t, "Bullet hit rock"),
        Target::Tree(i) => debug!(match_id = state.match_id, tree = i, t = collision.t, "Bullet hit tree"),
        Target::Ground => debug!(match_id = state.match_id, t = collision.t, "Bullet hit ground"),
    }

    true
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::map::IslandMap;
    use crate::game::state::tests::flat_match;
    use crate::game::zone::{Circle, SafeZoneSchedule};

    fn bullet_at(state: &mut MatchState, position: Vec3, velocity: Vec3, owner: Option<EntityId>) -> usize {
        let id = state.create_entity(EntityType::Bullet, position, Some(velocity));
        let index = state.index_of(id).unwrap();
        state.entities[index].player_id = owner;
        index
    }

    #[test]
    fn test_ray_hits_player_at_expected_distance() {
        let mut state = flat_match();
        let target = state.create_player(5.0, 0.0);
        state.get_mut(target).unwrap().position = Vec3::new(5.0, 5.0, 0.0);
        let index = bullet_at(&mut state, Vec3::new(0.0, 5.0, 0.0), Vec3::new(10.0, 0.0, 0.0), None);

        let bullet = &state.entities[index];
        let hit = line_collision(&state, bullet, bullet.velocity.unwrap()).unwrap();
        assert_eq!(hit.target, Target::Player(target));
        assert!((hit.t - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_owner_and_dead_players_ignored() {
        let mut state = flat_match();
        let owner = state.create_player(5.0, 0.0);
        let dead = state.create_player(8.0, 0.0);
        state.get_mut(dead).unwrap().health = 0;
        let index = bullet_at(&mut state, Vec3::new(0.0, 1.0, 0.0), Vec3::new(10.0, 0.0, 0.0), Some(owner));

        let bullet = &state.entities[index];
        assert!(line_collision(&state, bullet, bullet.velocity.unwrap()).is_none());
    }

    #[test]
    fn test_zero_velocity_never_collides() {
        let mut state = flat_match();
        state.create_player(0.0, 0.0);
        let index = bullet_at(&mut state, Vec3::new(0.0, 1.0, 0.0), Vec3::ZERO, None);
        let bullet = &state.entities[index];
        assert!(line_collision(&state, bullet, Vec3::ZERO).is_none());
    }

    #[test]
    fn test_earliest_obstacle_wins() {
        let zone = SafeZoneSchedule::from_circles(vec![Circle::new(0.0, 0.0, 500.0); 6]);
        let terrain = crate::game::terrain::Terrain::flat(0.0).with_obstacles(
            vec![Vec3::new(6.0, 5.2, 0.0)],
            vec![Vec3::new(3.0, 1.0, 0.0)],
        );
        let mut state = MatchState::with_island(1, IslandMap::from_parts(1, zone, terrain), 0.0);
        let index = bullet_at(&mut state, Vec3::new(0.0, 1.0, 0.0), Vec3::new(10.0, 0.0, 0.0), None);

        let bullet = &state.entities[index];
        let hit = line_collision(&state, bullet, bullet.velocity.unwrap()).unwrap();
        assert_eq!(hit.target, Target::Rock(0));
        assert!((hit.t - 2.2).abs() < 1e-9);
    }

    #[test]
    fn test_tree_trunk_is_below_stored_height() {
        let zone = SafeZoneSchedule::from_circles(vec![Circle::new(0.0, 0.0, 500.0); 6]);
        let terrain = crate::game::terrain::Terrain::flat(0.0)
            .with_obstacles(vec![Vec3::new(5.0, 5.2, 0.0)], Vec::new());
        let mut state = MatchState::with_island(1, IslandMap::from_parts(1, zone, terrain), 0.0);
        let index = bullet_at(&mut state, Vec3::new(0.0, 1.0, 0.0), Vec3::new(10.0, 0.0, 0.0), None);

        let bullet = &state.entities[index];
        let hit = line_collision(&state, bullet, bullet.velocity.unwrap()).unwrap();
        assert_eq!(hit.target, Target::Tree(0));
    }

    #[test]
    fn test_ground_march() {
        let mut state = flat_match();
        // Falling from y=0.55: ground crossed between t=0.5 and t=0.6.
        let index = bullet_at(&mut state, Vec3::new(0.0, 0.55, 0.0), Vec3::new(0.0, -10.0, 0.0), None);

        let bullet = &state.entities[index];
        let hit = line_collision(&state, bullet, bullet.velocity.unwrap()).unwrap();
        assert_eq!(hit.target, Target::Ground);
        assert!(hit.t > 0.55 && hit.t < 0.65, "t = {}", hit.t);
    }

    #[test]
    fn test_bullet_damages_player() {
        let mut state = flat_match();
        let shooter = state.create_player(-20.0, 0.0);
        let victim = state.create_player(5.0, 0.0);
        let index = bullet_at(&mut state, Vec3::new(0.0, 1.0, 0.0), Vec3::new(10.0, 0.0, 0.0), Some(shooter));

        assert!(bullet_collision(&mut state, index));
        assert_eq!(state.get(victim).unwrap().health, 75);

        let events = state.take_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].entity_type(), EntityType::Blood);
        assert!((events[0].position().x - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_lethal_bullet_credits_shooter() {
        let mut state = flat_match();
        let shooter = state.create_player(-20.0, 0.0);
        let victim = state.create_player(5.0, 0.0);
        state.create_player(100.0, 100.0);
        state.get_mut(victim).unwrap().health = 20;
        let index = bullet_at(&mut state, Vec3::new(0.0, 1.0, 0.0), Vec3::new(10.0, 0.0, 0.0), Some(shooter));

        assert!(bullet_collision(&mut state, index));
        let v = state.get(victim).unwrap();
        assert_eq!(v.health, 0);
        assert_eq!(v.rank, Some(3));

        let events = state.take_events();
        let death = events.iter().find(|e| e.is_elimination()).unwrap();
        assert_eq!(death.player_id(), Some(shooter));
        assert_eq!(death.entity_id(), Some(victim));
    }

    #[test]
    fn test_miss_keeps_bullet() {
        let mut state = flat_match();
        let index = bullet_at(&mut state, Vec3::new(0.0, 1.0, 0.0), Vec3::new(10.0, 0.0, 0.0), None);
        assert!(!bullet_collision(&mut state, index));
        assert!(state.pending_events().is_empty());
    }
}
