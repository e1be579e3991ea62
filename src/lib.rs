//! Beat Phaser - a top-down shooter scored on the beat
//!
//! Core modules:
//! - `sim`: Simulation (swept-AABB collisions, entities, beat scoring, game state)
//! - `audio`: Sound effect queue and playback-start notifications
//! - `settings`: JSON settings and rhythm tuning

pub mod audio;
pub mod settings;
pub mod sim;

pub use settings::{Settings, SettingsError};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    use glam::Vec2;

    /// Fixed simulation timestep (60 Hz, the game's frame rate)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Character defaults
    pub const CHARACTER_SIZE: Vec2 = Vec2::new(12.0, 14.0);
    /// Units per second
    pub const CHARACTER_RUN_SPEED: f32 = 64.0;
    pub const CHARACTER_HEALTH: f32 = 100.0;
    /// How far the character must get from a wall before it stops blocking
    pub const BLOCK_RELEASE_LEEWAY: f32 = 20.0;
    pub const HURT_COOLDOWN_FRAMES: u32 = 30;
    /// Where the laser leaves the character, relative to its center
    pub const MUZZLE_OFFSET: Vec2 = Vec2::new(8.0, 2.0);

    /// Enemy defaults
    pub const ENEMY_SIZE: Vec2 = Vec2::new(168.0, 148.0);
    /// Units per frame
    pub const ENEMY_MOVE_SPEED: f32 = 2.0;
    pub const ENEMY_CONTACT_DAMAGE: f32 = 20.0;

    /// Laser defaults
    pub const LASER_THICKNESS: f32 = 10.0;
    /// Thickness lost per frame
    pub const LASER_DECAY: f32 = 0.02;
    /// Bounces survived; one more and the laser is gone
    pub const LASER_MAX_BOUNCES: u32 = 3;
    /// Damage per multiplier step
    pub const LASER_BASE_DAMAGE: f32 = 100.0;
    /// Units per second
    pub const WEAPON_SPEED: f32 = 500.0;

    /// Spawner tuning (seconds)
    pub const SPAWN_STEP_START: f32 = 2.0;
    pub const SPAWN_STEP_MIN: f32 = 2.0;
    pub const SPAWN_STEP_DECAY: f32 = 1.0;
    pub const DIFFICULTY_START: f32 = 100.0;
    /// Difficulty gained per enemy killed
    pub const DIFFICULTY_PER_KILL: f32 = 20.0;
    pub const MAX_ENEMIES: usize = 50;
}

/// Shown when the player dies, picked by seed
pub const DEATH_MESSAGES: [&str; 3] = [
    "Keep Dancing",
    "Never Let the Boogie Die",
    "Take Our Energy - Use It to Dance",
];

/// Unit vector for an aim angle (radians, counter-clockwise from +x)
#[inline]
pub fn aim_direction(angle: f32) -> Vec2 {
    Vec2::from_angle(angle)
}

/// Aim angle from `from` toward `to`
#[inline]
pub fn aim_angle(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}
