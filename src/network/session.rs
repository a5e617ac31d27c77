//! Match Sessions
//!
//! Owns every live match and routes each connected user to one of them.
//! Match 0 is the lobby: users land there on connect, it holds no bots and
//! it is never simulated or collected.
//!
//! Lock order is `matches`, then `user_matches`, then a single match. No
//! path takes a directory lock while holding a match lock.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use futures_util::future::join_all;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::clock::Clock;
use crate::core::constants::{LOBBY_ID, PREGAME_TIME};
use crate::core::hash::short_hex;
use crate::core::vec3::Vec3;
use crate::game::entity::EntityId;
use crate::game::events::GameEvent;
use crate::game::input::{PlayerAction, PlayerInput};
use crate::game::map::WorldGenError;
use crate::game::state::{MatchId, MatchState};
use crate::game::tick::{tick, MatchConfig, TickResult};
use crate::network::protocol::{ClientInput, GameStateRecord};

/// Connection identifier.
pub type UserId = Uuid;

/// Where new users appear in a match.
pub const SPAWN_X: f64 = 25.0;
/// Where new users appear in a match.
pub const SPAWN_Z: f64 = 25.0;

/// Largest seed handed to a new match.
pub const MAX_SEED: u32 = 10_000;

/// Directory errors.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// No record for this user.
    #[error("Unknown user {0}")]
    UnknownUser(UserId),

    /// Island generation failed for a new match.
    #[error("Match creation failed: {0}")]
    WorldGen(#[from] WorldGenError),
}

/// Configuration for new matches.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Seconds between creating a match and starting it.
    pub pregame_secs: f64,
    /// Population and simulation settings.
    pub match_config: MatchConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            pregame_secs: PREGAME_TIME,
            match_config: MatchConfig::default(),
        }
    }
}

// =============================================================================
// MATCH SESSION
// =============================================================================

/// A user connected to a match.
#[derive(Debug)]
pub struct SessionUser {
    /// Connection identifier.
    pub user_id: UserId,
    /// The user's player entity.
    pub entity_id: EntityId,
    /// Events not yet delivered.
    pub events: Vec<GameEvent>,
}

/// One match plus the users connected to it.
pub struct MatchSession {
    /// Simulation state.
    pub state: MatchState,
    /// Connected users.
    users: BTreeMap<UserId, SessionUser>,
    /// Aim jitter for bots.
    rng: StdRng,
}

impl MatchSession {
    /// Wrap a match.
    pub fn new(state: MatchState) -> Self {
        Self {
            state,
            users: BTreeMap::new(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Match identifier.
    pub fn match_id(&self) -> MatchId {
        self.state.match_id
    }

    /// Connected user count.
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// No users connected.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Get a user.
    pub fn user(&self, user_id: &UserId) -> Option<&SessionUser> {
        self.users.get(user_id)
    }

    /// Spawn a player for `user_id`, keeping any undelivered `events`.
    pub fn add_user(&mut self, user_id: UserId, events: Vec<GameEvent>) -> EntityId {
        let entity_id = self.state.create_player(SPAWN_X, SPAWN_Z);
        self.users.insert(user_id, SessionUser { user_id, entity_id, events });
        entity_id
    }

    /// Remove a user and their player entity.
    pub fn remove_user(&mut self, user_id: &UserId) -> Option<SessionUser> {
        let user = self.users.remove(user_id)?;
        self.state.remove_entity(user.entity_id);
        Some(user)
    }

    /// Move queued match events into every user's queue.
    pub fn flush_events(&mut self) {
        let events = self.state.take_events();
        if events.is_empty() {
            return;
        }
        for user in self.users.values_mut() {
            user.events.extend(events.iter().cloned());
        }
    }

    /// Overwrite the user's pose from their input.
    pub fn apply_pose(&mut self, user_id: &UserId, input: &PlayerInput) -> bool {
        let Some(user) = self.users.get(user_id) else {
            return false;
        };
        match self.state.get_mut(user.entity_id) {
            Some(player) => {
                input.apply_pose(player);
                true
            }
            None => false,
        }
    }

    /// Fire for the user. Shots are not limited by the reload cooldown.
    pub fn shoot(&mut self, user_id: &UserId, direction: Vec3) -> Option<EntityId> {
        let shooter = self.users.get(user_id)?.entity_id;
        self.state.shoot(shooter, direction)
    }

    /// Run one tick and deliver the resulting events.
    pub fn update(&mut self, now: f64, config: &MatchConfig) -> TickResult {
        let result = tick(&mut self.state, now, config, &mut self.rng);
        self.flush_events();
        result
    }

    /// Snapshot for one user, draining their event queue.
    pub fn snapshot(&mut self, user_id: &UserId, now: f64) -> Option<GameStateRecord> {
        self.flush_events();
        self.state.update_clock(now);

        let user = self.users.get_mut(user_id)?;
        let events = std::mem::take(&mut user.events);
        Some(GameStateRecord::snapshot(&self.state, user.entity_id, &events))
    }
}

// =============================================================================
// MATCH DIRECTORY
// =============================================================================

/// Live matches by id. Ids grow with creation, so the lobby comes first.
type MatchTable = BTreeMap<MatchId, Arc<Mutex<MatchSession>>>;

/// Every live match, and which one each user is in.
pub struct MatchDirectory {
    /// Live matches.
    matches: RwLock<MatchTable>,
    /// User to match mapping.
    user_matches: RwLock<BTreeMap<UserId, MatchId>>,
    /// Next id for a non-lobby match.
    next_match_id: AtomicU32,
    /// New match settings.
    config: SessionConfig,
    /// Wall clock.
    clock: Arc<dyn Clock>,
}

impl MatchDirectory {
    /// Create an empty directory.
    pub fn new(config: SessionConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            matches: RwLock::new(BTreeMap::new()),
            user_matches: RwLock::new(BTreeMap::new()),
            next_match_id: AtomicU32::new(LOBBY_ID + 1),
            config,
            clock,
        }
    }

    /// Current wall-clock second.
    pub fn now(&self) -> f64 {
        self.clock.now_secs()
    }

    /// Settings used for new matches.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn create_match(&self, match_id: MatchId, start_time: f64) -> Result<MatchSession, WorldGenError> {
        let mut names = rand::thread_rng();
        let seed = names.gen_range(0..MAX_SEED);
        let state = MatchState::new(match_id, seed, start_time, &self.config.match_config, &mut names)?;
        Ok(MatchSession::new(state))
    }

    async fn find_or_create(
        &self,
        matches: &mut MatchTable,
        want_lobby: bool,
    ) -> Result<Arc<Mutex<MatchSession>>, DirectoryError> {
        if want_lobby {
            if let Some(lobby) = matches.get(&LOBBY_ID) {
                return Ok(lobby.clone());
            }
            let lobby = self.create_match(LOBBY_ID, 0.0)?;
            info!("Created lobby, seed={}", lobby.state.seed());
            let lobby = Arc::new(Mutex::new(lobby));
            matches.insert(LOBBY_ID, lobby.clone());
            return Ok(lobby);
        }

        let now = self.now();
        for (_, session) in matches.range(LOBBY_ID + 1..) {
            if session.lock().await.state.is_joinable(now) {
                return Ok(session.clone());
            }
        }

        let match_id = self.next_match_id.fetch_add(1, Ordering::Relaxed);
        let session = self.create_match(match_id, now + self.config.pregame_secs)?;
        info!("Creating new game id={}, seed={}", match_id, session.state.seed());

        let session = Arc::new(Mutex::new(session));
        matches.insert(match_id, session.clone());
        Ok(session)
    }

    /// The lobby when `want_lobby`, else the first joinable match or a new one.
    pub async fn match_for_user(&self, want_lobby: bool) -> Result<Arc<Mutex<MatchSession>>, DirectoryError> {
        let mut matches = self.matches.write().await;
        self.find_or_create(&mut matches, want_lobby).await
    }

    /// Look up a match by id.
    pub async fn get_match(&self, match_id: MatchId) -> Option<Arc<Mutex<MatchSession>>> {
        self.matches.read().await.get(&match_id).cloned()
    }

    /// Match the user is currently in.
    pub async fn match_of(&self, user_id: &UserId) -> Result<Arc<Mutex<MatchSession>>, DirectoryError> {
        let match_id = self
            .user_matches
            .read()
            .await
            .get(user_id)
            .copied()
            .ok_or(DirectoryError::UnknownUser(*user_id))?;
        self.get_match(match_id)
            .await
            .ok_or(DirectoryError::UnknownUser(*user_id))
    }

    /// Admit a new user to the lobby and return their first snapshot.
    pub async fn connect(&self, user_id: UserId) -> Result<GameStateRecord, DirectoryError> {
        let lobby = {
            let mut matches = self.matches.write().await;
            let lobby = self.find_or_create(&mut matches, true).await?;
            lobby.lock().await.add_user(user_id, Vec::new());
            self.user_matches.write().await.insert(user_id, LOBBY_ID);
            lobby
        };

        debug!("User {} connected to lobby", user_id);
        let mut session = lobby.lock().await;
        session
            .snapshot(&user_id, self.now())
            .ok_or(DirectoryError::UnknownUser(user_id))
    }

    /// Move a user into the next joinable match.
    ///
    /// The user's undelivered events travel with them.
    pub async fn join(&self, user_id: UserId) -> Result<MatchId, DirectoryError> {
        let mut matches = self.matches.write().await;
        let mut user_matches = self.user_matches.write().await;

        let current = user_matches
            .get(&user_id)
            .copied()
            .ok_or(DirectoryError::UnknownUser(user_id))?;

        let mut events = Vec::new();
        if let Some(session) = matches.get(&current) {
            if let Some(user) = session.lock().await.remove_user(&user_id) {
                events = user.events;
            }
        }

        let target = self.find_or_create(&mut matches, false).await?;
        let mut target = target.lock().await;
        target.add_user(user_id, events);
        let match_id = target.match_id();
        user_matches.insert(user_id, match_id);

        info!("User {} joined game id={}", user_id, match_id);
        Ok(match_id)
    }

    /// Apply one client message and return the user's snapshot.
    ///
    /// Input without a full position is dropped: `Ok(None)`, nothing changes.
    pub async fn handle_input(
        &self,
        user_id: UserId,
        input: &ClientInput,
    ) -> Result<Option<GameStateRecord>, DirectoryError> {
        let Some(input) = input.to_player_input() else {
            debug!("Dropping input without position from {}", user_id);
            return Ok(None);
        };

        self.match_of(&user_id).await?.lock().await.apply_pose(&user_id, &input);

        for action in &input.actions {
            match action {
                PlayerAction::Join => {
                    self.join(user_id).await?;
                }
                PlayerAction::Shoot(direction) => {
                    let session = self.match_of(&user_id).await?;
                    session.lock().await.shoot(&user_id, *direction);
                }
            }
        }

        let session = self.match_of(&user_id).await?;
        let mut session = session.lock().await;
        Ok(session.snapshot(&user_id, self.now()))
    }

    /// Remove the user and their player.
    pub async fn disconnect(&self, user_id: UserId) -> bool {
        let session = match self.match_of(&user_id).await {
            Ok(session) => session,
            Err(_) => return false,
        };
        self.user_matches.write().await.remove(&user_id);
        let removed = session.lock().await.remove_user(&user_id).is_some();
        debug!("User {} disconnected", user_id);
        removed
    }

    /// Drop every non-lobby match without users. Returns how many went.
    pub async fn collect_garbage(&self) -> usize {
        let mut matches = self.matches.write().await;
        Self::collect_locked(&mut matches).await
    }

    async fn collect_locked(matches: &mut MatchTable) -> usize {
        let mut to_remove = Vec::new();
        for (id, session) in matches.range(LOBBY_ID + 1..) {
            if session.lock().await.is_empty() {
                to_remove.push(*id);
            }
        }

        for id in &to_remove {
            info!("Destroying game id={}", id);
            matches.remove(id);
        }
        to_remove.len()
    }

    /// Collect empty matches, then tick every other non-lobby match.
    pub async fn tick_all(&self) -> Vec<(MatchId, TickResult)> {
        let live: Vec<_> = {
            let mut matches = self.matches.write().await;
            Self::collect_locked(&mut matches).await;
            matches.range(LOBBY_ID + 1..).map(|(_, s)| s.clone()).collect()
        };

        let now = self.now();
        let config = &self.config.match_config;
        join_all(live.iter().map(|session| async move {
            let mut s = session.lock().await;
            let result = s.update(now, config);
            if result.eliminations > 0 {
                let summary = s.state.summary();
                debug!(
                    match_id = summary.match_id,
                    tick = s.state.update_count,
                    eliminations = result.eliminations,
                    alive = summary.alive,
                    entities = summary.entities,
                    state_hash = %short_hex(&summary.state_hash),
                    "Tick finished with eliminations"
                );
            }
            (s.match_id(), result)
        }))
        .await
    }

    /// Number of live matches, lobby included.
    pub async fn match_count(&self) -> usize {
        self.matches.read().await.len()
    }

    /// Number of connected users.
    pub async fn user_count(&self) -> usize {
        self.user_matches.read().await.len()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::game::entity::EntityType;
    use crate::network::protocol::ActionRecord;

    fn quiet_config() -> SessionConfig {
        SessionConfig {
            pregame_secs: 30.0,
            match_config: MatchConfig {
                bot_count: 0,
                ammo_count: 0,
                medkit_count: 0,
                ..MatchConfig::default()
            },
        }
    }

    fn directory() -> (MatchDirectory, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1000.0));
        (MatchDirectory::new(quiet_config(), clock.clone()), clock)
    }

    fn pose(x: f64, y: f64, z: f64) -> ClientInput {
        ClientInput {
            x: Some(x),
            y: Some(y),
            z: Some(z),
            ..Default::default()
        }
    }

    fn with_actions(mut input: ClientInput, actions: Vec<ActionRecord>) -> ClientInput {
        input.actions = actions;
        input
    }

    #[tokio::test]
    async fn test_connect_lands_in_lobby() {
        let (dir, _) = directory();
        let user = Uuid::new_v4();

        let snapshot = dir.connect(user).await.unwrap();
        assert_eq!(snapshot.game_id, LOBBY_ID);
        assert_eq!(snapshot.entities.len(), 1);

        let me = &snapshot.entities[0];
        assert_eq!(me.entity_id, Some(snapshot.current_player_id));
        assert_eq!((me.x, me.z), (25.0, 25.0));
        assert_eq!(dir.match_count().await, 1);
    }

    #[tokio::test]
    async fn test_join_creates_match_and_leaves_lobby() {
        let (dir, clock) = directory();
        let user = Uuid::new_v4();
        dir.connect(user).await.unwrap();

        let input = with_actions(pose(1.0, 2.0, 3.0), vec![ActionRecord::join()]);
        let snapshot = dir.handle_input(user, &input).await.unwrap().unwrap();
        assert_eq!(snapshot.game_id, 1);
        assert_eq!(snapshot.start_time, clock.now_secs() + 30.0);
        assert_eq!(snapshot.current_time, -30.0);

        let lobby = dir.get_match(LOBBY_ID).await.unwrap();
        let lobby = lobby.lock().await;
        assert!(lobby.is_empty());
        assert!(lobby.state.entities.is_empty());
    }

    #[tokio::test]
    async fn test_joinable_window_routes_users() {
        let (dir, clock) = directory();
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        for user in [a, b, c] {
            dir.connect(user).await.unwrap();
        }

        assert_eq!(dir.join(a).await.unwrap(), 1);
        clock.advance(20.0);
        assert_eq!(dir.join(b).await.unwrap(), 1);
        clock.advance(8.0);
        assert_eq!(dir.join(c).await.unwrap(), 2);

        assert_eq!(dir.match_count().await, 3);
        let first = dir.get_match(1).await.unwrap();
        assert_eq!(first.lock().await.user_count(), 2);
    }

    #[tokio::test]
    async fn test_malformed_input_is_dropped() {
        let (dir, _) = directory();
        let user = Uuid::new_v4();
        dir.connect(user).await.unwrap();

        let mut input = pose(1.0, 2.0, 3.0);
        input.y = None;
        input.actions = vec![ActionRecord::join()];
        assert!(dir.handle_input(user, &input).await.unwrap().is_none());

        let lobby = dir.get_match(LOBBY_ID).await.unwrap();
        let lobby = lobby.lock().await;
        assert_eq!(lobby.user_count(), 1);
        assert_eq!(lobby.state.entities[0].position.x, 25.0);
    }

    #[tokio::test]
    async fn test_pose_is_applied() {
        let (dir, _) = directory();
        let user = Uuid::new_v4();
        dir.connect(user).await.unwrap();

        let mut input = pose(7.0, 8.0, 9.0);
        input.name = Some("zed".into());
        let snapshot = dir.handle_input(user, &input).await.unwrap().unwrap();

        let me = &snapshot.entities[0];
        assert_eq!(me.position(), Vec3::new(7.0, 8.0, 9.0));
        assert_eq!(me.name.as_deref(), Some("zed"));
    }

    #[tokio::test]
    async fn test_shot_events_are_delivered_once() {
        let (dir, _) = directory();
        let shooter = Uuid::new_v4();
        let watcher = Uuid::new_v4();
        dir.connect(shooter).await.unwrap();
        dir.connect(watcher).await.unwrap();

        let input = with_actions(pose(0.0, 1.0, 0.0), vec![ActionRecord::shoot(Vec3::new(1.0, 0.0, 0.0))]);
        let snapshot = dir.handle_input(shooter, &input).await.unwrap().unwrap();
        assert_eq!(snapshot.events.len(), 1);
        assert_eq!(snapshot.events[0].entity_type, EntityType::Gunfire);
        assert_eq!(snapshot.events[0].player_id, Some(snapshot.current_player_id));

        let again = dir.handle_input(shooter, &pose(0.0, 1.0, 0.0)).await.unwrap().unwrap();
        assert!(again.events.is_empty());

        let other = dir.handle_input(watcher, &pose(5.0, 1.0, 5.0)).await.unwrap().unwrap();
        assert_eq!(other.events.len(), 1);
    }

    #[tokio::test]
    async fn test_disconnect_and_garbage_collection() {
        let (dir, _) = directory();
        let user = Uuid::new_v4();
        dir.connect(user).await.unwrap();
        dir.join(user).await.unwrap();

        assert_eq!(dir.collect_garbage().await, 0);
        assert!(dir.disconnect(user).await);
        assert!(!dir.disconnect(user).await);
        assert_eq!(dir.user_count().await, 0);

        assert_eq!(dir.collect_garbage().await, 1);
        assert_eq!(dir.match_count().await, 1);
        assert!(dir.get_match(LOBBY_ID).await.is_some());
    }

    #[tokio::test]
    async fn test_tick_all_skips_lobby() {
        let (dir, clock) = directory();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        for user in [a, b] {
            dir.connect(user).await.unwrap();
            dir.join(user).await.unwrap();
        }
        let idle = Uuid::new_v4();
        dir.connect(idle).await.unwrap();

        let results = dir.tick_all().await;
        assert_eq!(results.len(), 1);
        assert!(!results[0].1.ran);

        clock.advance(31.0);
        let results = dir.tick_all().await;
        assert_eq!(results, vec![(1, TickResult { ran: true, removed: 0, eliminations: 0 })]);

        let lobby = dir.get_match(LOBBY_ID).await.unwrap();
        assert_eq!(lobby.lock().await.state.update_count, 0);
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let (dir, _) = directory();
        let stranger = Uuid::new_v4();
        let err = dir.handle_input(stranger, &pose(0.0, 0.0, 0.0)).await.unwrap_err();
        assert!(matches!(err, DirectoryError::UnknownUser(id) if id == stranger));
    }

    #[tokio::test]
    async fn test_populated_match_has_bots() {
        let clock = Arc::new(ManualClock::new(0.0));
        let dir = MatchDirectory::new(SessionConfig::default(), clock);
        let user = Uuid::new_v4();
        dir.connect(user).await.unwrap();
        dir.join(user).await.unwrap();

        let session = dir.get_match(1).await.unwrap();
        let session = session.lock().await;
        assert_eq!(session.state.entities.iter().filter(|e| e.bot).count(), 19);
        assert_eq!(session.state.alive_count(), 20);
    }
}
