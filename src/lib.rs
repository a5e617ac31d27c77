//! # Royale Game Server
//!
//! Authoritative server for a browser battle royale: seeded islands,
//! shrinking safe zones, bots, bullets and pickups, simulated at a fixed
//! rate and streamed to each client as a personal snapshot.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      ROYALE SERVER                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Primitives                                │
//! │  ├── constants.rs- World, combat and zone constants          │
//! │  ├── vec3.rs     - 3D vector math                            │
//! │  ├── rng.rs      - Seeded world generator stream             │
//! │  ├── hash.rs     - Terrain and state fingerprints            │
//! │  └── clock.rs    - Wall clock abstraction                    │
//! │                                                              │
//! │  game/           - Match simulation                          │
//! │  ├── zone.rs     - Safe-zone schedule                        │
//! │  ├── terrain.rs  - Height field and obstacles                │
//! │  ├── map.rs      - Island generation                         │
//! │  ├── state.rs    - Entities, shooting, eliminations          │
//! │  ├── collision.rs- Ray casts and bullet impacts              │
//! │  ├── bot.rs      - Bot decisions                             │
//! │  └── tick.rs     - Per-match simulation step                 │
//! │                                                              │
//! │  network/        - Connections                               │
//! │  ├── server.rs   - WebSocket server and tick driver          │
//! │  ├── protocol.rs - Wire records                              │
//! │  └── session.rs  - Match directory                           │
//! │                                                              │
//! │  storage.rs      - Quota-checked key/value store             │
//! │  config.rs       - Environment configuration                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Reproducible Worlds
//!
//! Terrain, obstacles, initial pickups and bot spawn points come from a
//! single seeded stream, so a seed always rebuilds the same island. Bot
//! names, aim jitter and match seeds use `rand` and are not reproducible.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod network;
pub mod storage;
pub mod config;

// Re-export commonly used types
pub use crate::core::rng::DeterministicRng;
pub use crate::core::vec3::Vec3;
pub use game::state::{MatchId, MatchState};
pub use game::tick::{tick, MatchConfig};
pub use network::server::GameServer;
pub use storage::KeyValueStore;
pub use config::ServerConfig;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Nominal simulation rate (Hz)
pub const TICK_RATE: u32 = 30;
