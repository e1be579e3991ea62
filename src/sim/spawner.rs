//! Enemy wave pacing
//!
//! Enemies arrive every `step` seconds. Each kill makes the next arrivals
//! tougher.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::entity::Enemy;
use crate::consts::*;

#[derive(Debug, Clone)]
pub struct EnemySpawner {
    /// Seconds since the last spawn
    pub counter: f32,
    /// Seconds between spawns
    pub step: f32,
    pub difficulty: f32,
    pub max_enemies: usize,
    rng: Pcg32,
}

impl EnemySpawner {
    pub fn new(seed: u64, max_enemies: usize) -> Self {
        Self {
            counter: 0.0,
            step: SPAWN_STEP_START,
            difficulty: DIFFICULTY_START,
            max_enemies,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Health for the next enemy, rounded to the nearest ten
    pub fn next_health(&self) -> f32 {
        (self.difficulty / 10.0).round() * 10.0
    }

    pub fn on_enemy_killed(&mut self) {
        self.difficulty += DIFFICULTY_PER_KILL;
    }

    /// Advance the timer and hand back a new enemy when one is due.
    ///
    /// The timer keeps running while the cap is reached, so a spawn happens
    /// as soon as there is room again.
    pub fn update(&mut self, dt: f32, live: usize, spawn_points: &[Vec2]) -> Option<Enemy> {
        self.counter += dt;

        if live >= self.max_enemies || self.counter <= self.step {
            return None;
        }

        let center = match spawn_points.len() {
            0 => Vec2::ZERO,
            n => spawn_points[self.rng.random_range(0..n)],
        };
        let enemy = Enemy::new(center, self.next_health());

        self.step = (self.step - SPAWN_STEP_DECAY).max(SPAWN_STEP_MIN);
        self.counter = 0.0;

        log::debug!(
            "spawned enemy at {:?} with {} health",
            center,
            enemy.health
        );
        Some(enemy)
    }
}
