//! Bot AI
//!
//! Server-driven players. Each tick a bot evaluates a fixed priority list
//! against the current zone circles and its surroundings, then acts on the
//! first rule that applies:
//!
//! ```text
//! outside inner circle     -> walk to outer center
//! reloaded + player in LOS -> walk toward it and fire
//! ammo nearby              -> walk to it
//! outside outer circle     -> walk to outer center
//! tree nearby              -> circle around it
//! otherwise                -> idle
//! ```

use std::f64::consts::PI;

use rand::Rng;
use tracing::trace;

use crate::core::constants::{PLAYER_HALF_HEIGHT, WALK_STEP};
use crate::core::vec3::{Vec3, EPSILON, yaw_of};
use crate::game::collision::{line_collision, Target};
use crate::game::entity::{EntityId, EntityType};
use crate::game::state::MatchState;
use crate::game::zone::Circle;

/// How far a bot looks for players to shoot.
pub const PLAYER_SEARCH_RANGE: f64 = 40.0;

/// How far a bot looks for ammo.
pub const AMMO_SEARCH_RANGE: f64 = 20.0;

/// How far a bot looks for a tree to hide behind.
pub const TREE_SEARCH_RANGE: f64 = 40.0;

/// Radius of the path walked around a tree.
pub const TREE_ORBIT_RADIUS: f64 = 3.0;

/// Milliseconds for one lap around a tree.
pub const TREE_ORBIT_PERIOD_MS: f64 = 3000.0;

/// Largest aim error per axis.
pub const AIM_JITTER: f64 = 0.1;

const NAME_ADJECTIVES: [&str; 6] = ["Blue", "Red", "Green", "Orange", "Mad", "Crazy"];
const NAME_NOUNS: [&str; 7] = ["Cat", "Dog", "Turtle", "Wombat", "Tiger", "Boi", "Killer"];

/// Pick a display name for a bot, e.g. `MadWombat417`.
pub fn random_bot_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let adjective = NAME_ADJECTIVES[rng.gen_range(0..NAME_ADJECTIVES.len())];
    let noun = NAME_NOUNS[rng.gen_range(0..NAME_NOUNS.len())];
    let number: u32 = rng.gen_range(0..1000);
    format!("{adjective}{noun}{number}")
}

/// What a bot does this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BotAction {
    /// Stand still.
    Idle,
    /// Take one step toward `(x, z)`.
    WalkTo {
        /// Destination x
        x: f64,
        /// Destination z
        z: f64,
    },
    /// Step toward a player, then fire at it.
    Attack {
        /// Player being shot at
        target: EntityId,
        /// Aim error added to the shot direction
        jitter: Vec3,
    },
}

// =============================================================================
// SEARCH
// =============================================================================

/// Nearest living entity of `kind` that the entity at `from_index` can see.
///
/// Candidates must be strictly closer than `max_dist` on the ground plane
/// and, when `circle` is given, inside it. A candidate is visible when a ray
/// toward it hits nothing, or hits that candidate first.
pub fn nearest_entity(
    state: &MatchState,
    from_index: usize,
    kind: EntityType,
    max_dist: f64,
    circle: Option<&Circle>,
) -> Option<usize> {
    let from = &state.entities[from_index];
    let mut nearest = None;
    let mut nearest_dist = max_dist;

    for (i, other) in state.entities.iter().enumerate() {
        if i == from_index || other.entity_type != kind || !other.is_alive() {
            continue;
        }
        if circle.is_some_and(|c| !c.contains_point(other.position)) {
            continue;
        }

        let dist = from.position.planar_distance(other.position);
        if dist >= nearest_dist {
            continue;
        }

        let visible = match line_collision(state, from, other.position - from.position) {
            None => true,
            Some(hit) => hit.target == Target::Player(other.entity_id),
        };
        if visible {
            nearest = Some(i);
            nearest_dist = dist;
        }
    }

    nearest
}

/// Nearest visible tree, as an index into the terrain's tree list.
pub fn nearest_tree(
    state: &MatchState,
    from_index: usize,
    max_dist: f64,
    circle: Option<&Circle>,
) -> Option<usize> {
    let from = &state.entities[from_index];
    let mut nearest = None;
    let mut nearest_dist = max_dist;

    for (i, &tree) in state.island.terrain.trees().iter().enumerate() {
        if circle.is_some_and(|c| !c.contains_point(tree)) {
            continue;
        }

        let dist = from.position.planar_distance(tree);
        if dist >= nearest_dist {
            continue;
        }

        let visible = match line_collision(state, from, tree - from.position) {
            None => true,
            Some(hit) => hit.target == Target::Tree(i),
        };
        if visible {
            nearest = Some(i);
            nearest_dist = dist;
        }
    }

    nearest
}

// =============================================================================
// POLICY
// =============================================================================

/// Choose the action for the bot at `bot_index`.
///
/// Only the jitter of an attack draws from `rng`.
pub fn decide<R: Rng + ?Sized>(
    state: &MatchState,
    bot_index: usize,
    inner: &Circle,
    outer: &Circle,
    now_ms: f64,
    rng: &mut R,
) -> BotAction {
    let bot = &state.entities[bot_index];
    let to_outer = BotAction::WalkTo { x: outer.x, z: outer.z };

    if !inner.contains_point(bot.position) {
        return to_outer;
    }

    if bot.cooldown_ticks() == 0 {
        if let Some(i) = nearest_entity(state, bot_index, EntityType::Player, PLAYER_SEARCH_RANGE, None) {
            let mut jitter = || 2.0 * AIM_JITTER * rng.gen::<f64>() - AIM_JITTER;
            return BotAction::Attack {
                target: state.entities[i].entity_id,
                jitter: Vec3::new(jitter(), jitter(), jitter()),
            };
        }
    }

    if let Some(i) = nearest_entity(state, bot_index, EntityType::Ammo, AMMO_SEARCH_RANGE, Some(outer)) {
        let ammo = state.entities[i].position;
        return BotAction::WalkTo { x: ammo.x, z: ammo.z };
    }

    if !outer.contains_point(bot.position) {
        return to_outer;
    }

    if let Some(i) = nearest_tree(state, bot_index, TREE_SEARCH_RANGE, Some(outer)) {
        let tree = state.island.terrain.trees()[i];
        let theta = now_ms / TREE_ORBIT_PERIOD_MS * 2.0 * PI;
        return BotAction::WalkTo {
            x: tree.x + TREE_ORBIT_RADIUS * theta.cos(),
            z: tree.z + TREE_ORBIT_RADIUS * theta.sin(),
        };
    }

    BotAction::Idle
}

/// Carry out a decided action.
pub fn apply(state: &mut MatchState, bot_index: usize, action: BotAction) {
    match action {
        BotAction::Idle => {}
        BotAction::WalkTo { x, z } => walk_to(state, bot_index, x, z),
        BotAction::Attack { target, jitter } => {
            let Some(target_pos) = state.get(target).map(|t| t.position) else {
                return;
            };
            walk_to(state, bot_index, target_pos.x, target_pos.z);

            let bot = &state.entities[bot_index];
            let shooter = bot.entity_id;
            let aim = target_pos - bot.position + jitter;
            trace!(match_id = state.match_id, bot = shooter, victim = target, "Bot shoots");
            state.shoot(shooter, aim);
        }
    }
}

/// Step the entity at `index` one tick toward `(x, z)` at running speed.
///
/// The entity lands on the ground and faces its direction of travel. A
/// destination directly underfoot leaves it where it is.
pub fn walk_to(state: &mut MatchState, index: usize, x: f64, z: f64) {
    let position = state.entities[index].position;
    let (dx, dz) = (x - position.x, z - position.z);
    let dist = dx.hypot(dz);
    if dist < EPSILON {
        return;
    }

    let velocity = Vec3::new(dx / dist * WALK_STEP, 0.0, dz / dist * WALK_STEP);
    let nx = position.x + velocity.x;
    let nz = position.z + velocity.z;
    let ny = state.island.terrain.get_y(nx, nz) + PLAYER_HALF_HEIGHT;

    let entity = &mut state.entities[index];
    entity.velocity = Some(velocity);
    entity.position = Vec3::new(nx, ny, nz);
    entity.yaw = Some(yaw_of(velocity.x, velocity.z));
}

/// Run one tick of AI for the bot at `bot_index`.
pub fn run_bot<R: Rng + ?Sized>(
    state: &mut MatchState,
    bot_index: usize,
    inner: &Circle,
    outer: &Circle,
    now_ms: f64,
    rng: &mut R,
) -> BotAction {
    state.entities[bot_index].velocity = Some(Vec3::ZERO);
    let action = decide(state, bot_index, inner, outer, now_ms, rng);
    apply(state, bot_index, action);
    action
}

// =============================================================================
// TESTS
// =============================================================================
