//! Match Tick
//!
//! One simulation step of a match. Entities are walked from the back of the
//! list to the front so a pickup or bullet can be removed in place. Bullets
//! fired by bots during the walk land at the end of the list and first move
//! on the following tick.

use rand::Rng;
use tracing::debug;
#[cfg(feature = "debug-tracing")]
use tracing::trace;

use crate::core::constants::{
    AMMO_PICKUP, MAX_HEALTH, MAX_X, MAX_Z, MEDKIT_HEAL, MIN_X, MIN_Z, PICKUP_RANGE,
    ZONE_DAMAGE, ZONE_DAMAGE_INTERVAL,
};
use crate::game::bot::{nearest_entity, run_bot};
use crate::game::collision::bullet_collision;
use crate::game::entity::EntityType;
use crate::game::events::GameEvent;
use crate::game::state::MatchState;
use crate::game::zone::Circle;

/// Result of a tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickResult {
    /// Whether the simulation ran (started and not over)
    pub ran: bool,
    /// Bullets and pickups removed this tick
    pub removed: usize,
    /// Players eliminated this tick
    pub eliminations: usize,
}

/// Configuration for match population and simulation.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchConfig {
    /// Bots spawned into every new match
    pub bot_count: usize,
    /// Ammo boxes placed at creation
    pub ammo_count: usize,
    /// Medkits placed at creation
    pub medkit_count: usize,
    /// Health lost outside the inner circle
    pub zone_damage: i32,
    /// Ticks between zone damage applications
    pub zone_damage_interval: u64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            bot_count: 19,
            ammo_count: 40,
            medkit_count: 40,
            zone_damage: ZONE_DAMAGE,
            zone_damage_interval: ZONE_DAMAGE_INTERVAL,
        }
    }
}

/// Run one simulation tick at wall-clock second `now`.
///
/// `rng` feeds bot aim jitter only; world generation has its own stream.
pub fn tick<R: Rng + ?Sized>(
    state: &mut MatchState,
    now: f64,
    config: &MatchConfig,
    rng: &mut R,
) -> TickResult {
    let mut result = TickResult::default();

    state.update_clock(now);
    if !state.is_started() || state.is_game_over() {
        return result;
    }
    result.ran = true;

    let inner = state.island.zone.inner_circle(state.current_time);
    let outer = state.island.zone.outer_circle(state.current_time);
    let now_ms = now * 1000.0;
    let events_before = state.pending_events().len();

    for i in (0..state.entities.len()).rev() {
        let entity = &state.entities[i];
        if !entity.is_alive() {
            continue;
        }

        #[cfg(feature = "debug-tracing")]
        trace!(
            match_id = state.match_id,
            entity_id = entity.entity_id,
            entity_type = ?entity.entity_type,
            position = ?entity.position,
            "Tick entity"
        );

        let kind = entity.entity_type;
        let remove = match kind {
            EntityType::Player => {
                update_player(state, i, &inner, &outer, now_ms, config, rng);
                false
            }
            EntityType::Bullet => update_bullet(state, i),
            kind if kind.is_pickup() => update_pickup(state, i),
            _ => false,
        };

        if remove {
            state.entities.remove(i);
            result.removed += 1;
        }
    }

    result.eliminations = state.pending_events()[events_before..]
        .iter()
        .filter(|e| e.is_elimination())
        .count();
    state.update_count += 1;

    result
}

fn update_player<R: Rng + ?Sized>(
    state: &mut MatchState,
    index: usize,
    inner: &Circle,
    outer: &Circle,
    now_ms: f64,
    config: &MatchConfig,
    rng: &mut R,
) {
    let player = &mut state.entities[index];
    if let Some(cooldown) = player.cooldown.as_mut() {
        *cooldown = cooldown.saturating_sub(1);
    }

    if player.bot {
        run_bot(state, index, inner, outer, now_ms, rng);
    }

    if config.zone_damage_interval > 0 && state.update_count % config.zone_damage_interval == 0 {
        let player = &mut state.entities[index];
        if !inner.contains_point(player.position) {
            player.damage(config.zone_damage);
            debug!(
                match_id = state.match_id,
                player = player.entity_id,
                health = player.health,
                "Player outside the zone"
            );
            state.check_player_death(index, None);
        }
    }
}

/// Returns `true` when the bullet should be removed.
fn update_bullet(state: &mut MatchState, index: usize) -> bool {
    let hit = bullet_collision(state, index);

    let bullet = &mut state.entities[index];
    if let Some(velocity) = bullet.velocity {
        bullet.position = bullet.position + velocity;
    }

    let p = bullet.position;
    let out_of_bounds = p.x < MIN_X || p.x > MAX_X || p.z < MIN_Z || p.z > MAX_Z;
    if out_of_bounds {
        debug!(match_id = state.match_id, bullet = bullet.entity_id, "Bullet out of bounds");
    }

    hit || out_of_bounds
}

/// Returns `true` when the pickup was collected.
fn update_pickup(state: &mut MatchState, index: usize) -> bool {
    let Some(collector_index) = nearest_entity(state, index, EntityType::Player, PICKUP_RANGE, None)
    else {
        return false;
    };

    let pickup = &state.entities[index];
    let (kind, position) = (pickup.entity_type, pickup.position);

    let collector = &mut state.entities[collector_index];
    match kind {
        EntityType::Ammo => collector.ammo = Some(collector.ammo_count() + AMMO_PICKUP),
        _ => collector.health = (collector.health + MEDKIT_HEAL).min(MAX_HEALTH),
    }
    let collector_id = collector.entity_id;

    debug!(match_id = state.match_id, collector = collector_id, kind = ?kind, "Pickup collected");
    state.push_event(GameEvent::Pickup {
        position,
        collector: collector_id,
        kind,
    });
    true
}

// =============================================================================
// TESTS
// =============================================================================
