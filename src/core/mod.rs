//! Core primitives.
//!
//! World constants, vector math, the seeded generator, fingerprints and the
//! clock abstraction. Nothing here knows about matches or connections.

pub mod constants;
pub mod vec3;
pub mod rng;
pub mod hash;
pub mod clock;

// Re-export core types
pub use vec3::Vec3;
pub use rng::DeterministicRng;
pub use hash::{StateHash, StateHasher};
pub use clock::{Clock, SystemClock, ManualClock};
