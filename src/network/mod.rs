//! Network Layer
//!
//! WebSocket server, wire records and the match directory that maps
//! connections onto matches. Simulation itself lives in `game/`.

pub mod protocol;
pub mod session;
pub mod server;

pub use protocol::{
    ActionRecord, ClientInput, ClientMessage, EntityRecord, GameStateRecord, ServerMessage,
};
pub use session::{DirectoryError, MatchDirectory, MatchSession, SessionConfig, UserId};
pub use server::{GameServer, GameServerError};
