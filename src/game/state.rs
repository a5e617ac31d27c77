//! Match State
//!
//! The mutable data model of one match: entities, the island they live on,
//! the match clock and the queue of events awaiting broadcast.

use tracing::{debug, info};

use crate::core::constants::{
    LOBBY_ID, PLAYER_HALF_HEIGHT, PLAYER_EYELEVEL, STARTING_AMMO, BULLET_SPEED,
    SHOT_COOLDOWN, AMMO_SIZE, MEDKIT_SIZE, JOIN_CUTOFF,
};
use crate::core::hash::{StateHash, StateHasher};
use crate::core::vec3::Vec3;
use crate::game::bot::random_bot_name;
use crate::game::entity::{Entity, EntityId, EntityType};
use crate::game::events::GameEvent;
use crate::game::map::{IslandMap, WorldGenError};
use crate::game::tick::MatchConfig;

/// Match identifier. The lobby is always `LOBBY_ID`.
pub type MatchId = u32;

/// Offset along the shot direction where the muzzle flash is shown.
const GUNFIRE_OFFSET: f64 = 0.05;

// =============================================================================
// MATCH STATE
// =============================================================================

/// Complete state of one match.
#[derive(Clone, Debug)]
pub struct MatchState {
    /// Match identifier
    pub match_id: MatchId,
    /// Island (seed, generator stream, zone, terrain)
    pub island: IslandMap,
    /// Entities in creation order
    pub entities: Vec<Entity>,
    /// Wall-clock second at which the match starts
    pub start_time: f64,
    /// Seconds since `start_time`; negative before the start
    pub current_time: f64,
    /// Simulated ticks
    pub update_count: u64,
    /// Next id to hand out
    next_entity_id: EntityId,
    /// Events awaiting broadcast
    pending_events: Vec<GameEvent>,
}

/// Summary of a match for logs.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchSummary {
    /// Match identifier
    pub match_id: MatchId,
    /// Seed
    pub seed: u32,
    /// Seconds since start
    pub current_time: f64,
    /// Living players
    pub alive: usize,
    /// All entities
    pub entities: usize,
    /// `compute_hash` at the time of the summary
    pub state_hash: StateHash,
}

impl MatchState {
    /// Create a match and, unless it is the lobby, populate it.
    ///
    /// Bots, then ammo, then medkits are placed from the island's stream;
    /// bot names come from `names`.
    pub fn new<R: rand::Rng + ?Sized>(
        match_id: MatchId,
        seed: u32,
        start_time: f64,
        config: &MatchConfig,
        names: &mut R,
    ) -> Result<Self, WorldGenError> {
        let island = IslandMap::generate(seed)?;
        let mut state = Self::with_island(match_id, island, start_time);

        if !state.is_lobby() {
            state.populate(config, names)?;
            info!(
                match_id,
                seed,
                bots = config.bot_count,
                entities = state.entities.len(),
                "Match created"
            );
        }

        Ok(state)
    }

    /// Create an empty match on a prepared island.
    pub fn with_island(match_id: MatchId, island: IslandMap, start_time: f64) -> Self {
        Self {
            match_id,
            island,
            entities: Vec::new(),
            start_time,
            current_time: 0.0,
            update_count: 0,
            next_entity_id: 1,
            pending_events: Vec::new(),
        }
    }

    fn populate<R: rand::Rng + ?Sized>(
        &mut self,
        config: &MatchConfig,
        names: &mut R,
    ) -> Result<(), WorldGenError> {
        for _ in 0..config.bot_count {
            let (x, z) = self.island.random_playable_xz();
            let id = self.create_player(x, z);
            if let Some(bot) = self.get_mut(id) {
                bot.name = Some(random_bot_name(names));
                bot.bot = true;
            }
        }

        let ammo = self.island.terrain.create_random_points(
            &mut self.island.rng,
            config.ammo_count,
            AMMO_SIZE,
        )?;
        for position in ammo {
            self.create_entity(EntityType::Ammo, position, None);
        }

        let medkits = self.island.terrain.create_random_points(
            &mut self.island.rng,
            config.medkit_count,
            MEDKIT_SIZE,
        )?;
        for position in medkits {
            self.create_entity(EntityType::Medkit, position, None);
        }

        Ok(())
    }

    /// Seed the island was generated from.
    #[inline]
    pub fn seed(&self) -> u32 {
        self.island.seed
    }

    /// Is this the lobby?
    #[inline]
    pub fn is_lobby(&self) -> bool {
        self.match_id == LOBBY_ID
    }

    // =========================================================================
    // ENTITIES
    // =========================================================================

    /// Append a new entity with the next id.
    pub fn create_entity(
        &mut self,
        entity_type: EntityType,
        position: Vec3,
        velocity: Option<Vec3>,
    ) -> EntityId {
        let id = self.next_entity_id;
        self.next_entity_id += 1;

        let mut entity = Entity::new(entity_type, id, position);
        entity.velocity = velocity;
        self.entities.push(entity);
        id
    }

    /// Spawn a fresh player standing on the ground at `(x, z)`.
    pub fn create_player(&mut self, x: f64, z: f64) -> EntityId {
        let y = self.island.terrain.get_y(x, z) + PLAYER_HALF_HEIGHT;
        let id = self.create_entity(EntityType::Player, Vec3::new(x, y, z), None);
        if let Some(player) = self.get_mut(id) {
            player.ammo = Some(STARTING_AMMO);
            player.cooldown = Some(0);
            player.yaw = Some(0.0);
            player.pitch = Some(0.0);
        }
        id
    }

    /// Index of an entity in `entities`.
    pub fn index_of(&self, id: EntityId) -> Option<usize> {
        self.entities.iter().position(|e| e.entity_id == id)
    }

    /// Get an entity.
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.entity_id == id)
    }

    /// Get an entity mutably.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.entity_id == id)
    }

    /// Remove an entity by id.
    pub fn remove_entity(&mut self, id: EntityId) -> Option<Entity> {
        let index = self.index_of(id)?;
        Some(self.entities.remove(index))
    }

    /// Number of living players.
    pub fn alive_count(&self) -> usize {
        self.entities.iter().filter(|e| e.is_live_player()).count()
    }

    /// Count of entities of one category.
    pub fn count_of(&self, entity_type: EntityType) -> usize {
        self.entities.iter().filter(|e| e.entity_type == entity_type).count()
    }

    // =========================================================================
    // CLOCK
    // =========================================================================

    /// Refresh `current_time` from a wall-clock reading.
    pub fn update_clock(&mut self, now: f64) {
        self.current_time = now - self.start_time;
    }

    /// Has the start time passed?
    #[inline]
    pub fn is_started(&self) -> bool {
        self.current_time >= 0.0
    }

    /// At most one player left alive.
    #[inline]
    pub fn is_game_over(&self) -> bool {
        self.alive_count() <= 1
    }

    /// Still far enough from the start to admit players.
    pub fn is_joinable(&mut self, now: f64) -> bool {
        self.update_clock(now);
        self.current_time < -JOIN_CUTOFF
    }

    // =========================================================================
    // ACTIONS
    // =========================================================================

    /// Fire a bullet from `shooter` along `direction`.
    ///
    /// Does nothing when the shooter has no ammo or the direction is zero.
    pub fn shoot(&mut self, shooter: EntityId, direction: Vec3) -> Option<EntityId> {
        let index = self.index_of(shooter)?;
        let player = &self.entities[index];
        if player.ammo_count() <= 0 {
            return None;
        }
        let velocity = direction.normalize()? * BULLET_SPEED;
        let origin = player.position + Vec3::new(0.0, PLAYER_EYELEVEL, 0.0);

        let bullet = self.create_entity(EntityType::Bullet, origin, Some(velocity));
        if let Some(b) = self.get_mut(bullet) {
            b.player_id = Some(shooter);
        }

        let player = &mut self.entities[index];
        player.ammo = Some(player.ammo_count() - 1);
        player.cooldown = Some(SHOT_COOLDOWN);

        self.push_event(GameEvent::Gunfire {
            position: origin + velocity * GUNFIRE_OFFSET,
            shooter,
        });

        debug!(match_id = self.match_id, shooter, bullet, "Shot fired");
        Some(bullet)
    }

    /// Eliminate the player at `index` if its health is gone.
    ///
    /// Clamps health to zero, ranks the player behind everyone still alive
    /// and queues a death event. Returns the rank when an elimination
    /// happened.
    pub fn check_player_death(&mut self, index: usize, killer: Option<EntityId>) -> Option<u32> {
        if self.entities[index].health > 0 {
            return None;
        }
        self.entities[index].health = 0;

        let rank = self.alive_count() as u32 + 1;
        let victim = &mut self.entities[index];
        victim.rank = Some(rank);
        let event = GameEvent::Death {
            victim: victim.entity_id,
            killer,
            position: victim.position,
            rank,
        };

        info!(
            match_id = self.match_id,
            victim = victim.entity_id,
            killer = ?killer,
            rank,
            "Player eliminated"
        );
        self.push_event(event);
        Some(rank)
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    /// Queue an event for every user in the match.
    pub fn push_event(&mut self, event: GameEvent) {
        self.pending_events.push(event);
    }

    /// Take all queued events.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Queued events not yet taken.
    pub fn pending_events(&self) -> &[GameEvent] {
        &self.pending_events
    }

    // =========================================================================
    // HASHING
    // =========================================================================

    /// Hash of the island and every entity attribute.
    pub fn compute_hash(&self) -> StateHash {
        let mut hasher = StateHasher::for_match_state();
        hasher.update_u32(self.match_id);
        hasher.update_bytes(&self.island.fingerprint());
        hasher.update_u64(self.update_count);
        hasher.update_u32(self.entities.len() as u32);

        for e in &self.entities {
            hasher.update_u8(e.entity_type.code());
            hasher.update_u32(e.entity_id);
            hasher.update_vec3(e.position);
            hasher.update_option(e.velocity, |h, v| h.update_vec3(v));
            hasher.update_i32(e.health);
            hasher.update_option(e.ammo, |h, v| h.update_i32(v));
            hasher.update_option(e.cooldown, |h, v| h.update_u32(v));
            hasher.update_option(e.rank, |h, v| h.update_u32(v));
            hasher.update_option(e.player_id, |h, v| h.update_u32(v));
            hasher.update_u8(e.bot as u8);
        }

        hasher.finalize()
    }

    /// Summary for logs.
    pub fn summary(&self) -> MatchSummary {
        MatchSummary {
            match_id: self.match_id,
            seed: self.seed(),
            current_time: self.current_time,
            alive: self.alive_count(),
            entities: self.entities.len(),
            state_hash: self.compute_hash(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
