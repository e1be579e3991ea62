//! Simulation module
//!
//! All gameplay logic lives here. This module has no rendering or platform
//! dependencies:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by slot)
//!
//! The beat window is the one input read from the wall clock, and it is
//! passed in by the caller as an `Instant`.

pub mod collision;
pub mod entity;
pub mod level;
pub mod rect;
pub mod rhythm;
pub mod spawner;
pub mod state;
pub mod tick;
pub mod weapon;
pub mod world;

pub use collision::{
    CollisionResult, aabb_check, reflect_velocity, swept_aabb, swept_broadphase_rect,
};
pub use entity::{Body, Character, Direction, Door, Enemy, EntityKind, Laser, Wall};
pub use level::Level;
pub use rect::Rect;
pub use rhythm::{BeatClock, RhythmError, ScoreKeeper};
pub use spawner::EnemySpawner;
pub use state::{GamePhase, GameState};
pub use tick::{GameEvent, TickInput, tick};
pub use weapon::Weapon;
pub use world::{Collidable, CollisionWorld, Contact, EntityId};
