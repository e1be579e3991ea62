//! Game state
//!
//! Everything a run needs lives here: the collision world and the ids the
//! gameplay code tracks inside it, the score keeper, and the spawner.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::{Body, Character, Enemy};
use super::level::Level;
use super::rhythm::ScoreKeeper;
use super::spawner::EnemySpawner;
use super::weapon::Weapon;
use super::world::{Collidable, CollisionWorld, EntityId};
use crate::DEATH_MESSAGES;
use crate::audio::SfxQueue;
use crate::consts::*;
use crate::settings::{Settings, SettingsError};

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// Character died; waiting for a restart
    Dead,
}

#[derive(Debug)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Runs started with this state, including the first
    pub run: u32,
    pub phase: GamePhase,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub level: Level,
    pub world: CollisionWorld<Body>,
    pub character: EntityId,
    /// Live enemies (registration order)
    pub enemies: Vec<EntityId>,
    /// Live lasers (registration order)
    pub lasers: Vec<EntityId>,
    pub score: ScoreKeeper,
    pub spawner: EnemySpawner,
    pub weapon: Weapon,
    pub sfx: SfxQueue,
    max_enemies: usize,
}

impl GameState {
    pub fn new(seed: u64, level: Level, score: ScoreKeeper, weapon: Weapon, sfx: SfxQueue) -> Self {
        let mut state = Self {
            seed,
            run: 0,
            phase: GamePhase::Playing,
            time_ticks: 0,
            level,
            world: CollisionWorld::new(),
            character: EntityId::default(),
            enemies: Vec::new(),
            lasers: Vec::new(),
            score,
            spawner: EnemySpawner::new(seed, MAX_ENEMIES),
            weapon,
            sfx,
            max_enemies: MAX_ENEMIES,
        };
        state.populate();
        state
    }

    /// Build a run in the house from validated settings
    pub fn from_settings(settings: &Settings, sfx: SfxQueue) -> Result<Self, SettingsError> {
        let score = ScoreKeeper::new(settings.beat_clock()?, settings.latency_offset());
        let mut state = Self::new(
            settings.seed,
            Level::house(),
            score,
            Weapon::new(settings.weapon_speed),
            sfx,
        );
        state.set_max_enemies(settings.max_enemies);
        Ok(state)
    }

    pub fn set_max_enemies(&mut self, max_enemies: usize) {
        self.max_enemies = max_enemies;
        self.spawner.max_enemies = max_enemies;
    }

    /// Throw the run away and start over. The beat grid is kept since the
    /// music does not stop.
    pub fn restart(&mut self) {
        self.world.clear();
        self.enemies.clear();
        self.lasers.clear();
        self.score.reset_run();
        self.phase = GamePhase::Playing;
        self.time_ticks = 0;
        self.populate();
        log::info!("run {} started", self.run);
    }

    fn populate(&mut self) {
        self.run += 1;
        self.spawner = EnemySpawner::new(
            self.seed.wrapping_add(u64::from(self.run)),
            self.max_enemies,
        );

        self.level.populate(&mut self.world);
        self.character = self
            .world
            .register(Body::Character(Character::new(self.level.character_spawn)));

        // One enemy is waiting from the start
        if let Some(&spawn) = self.level.enemy_spawns.first() {
            let enemy = Enemy::new(spawn, self.spawner.next_health());
            self.enemies.push(self.world.register(Body::Enemy(enemy)));
        }
    }

    pub fn character(&self) -> Option<&Character> {
        self.world.get(self.character).and_then(Body::as_character)
    }

    pub fn character_mut(&mut self) -> Option<&mut Character> {
        self.world.get_mut(self.character).and_then(Body::as_character_mut)
    }

    pub fn character_center(&self) -> Vec2 {
        self.character()
            .map(|c| c.rect.center())
            .unwrap_or(self.level.character_spawn)
    }

    pub fn enemy_centers(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.enemies
            .iter()
            .filter_map(|&id| self.world.get(id))
            .map(|body| body.rect().center())
    }

    pub fn death_message(&self) -> &'static str {
        let pick = self.seed.wrapping_add(u64::from(self.run)) % DEATH_MESSAGES.len() as u64;
        DEATH_MESSAGES[pick as usize]
    }
}
