//! Fixed timestep simulation tick
//!
//! One frame of gameplay: score window, weapon, movement, the collision
//! pass, then bookkeeping for whatever the pass killed.

use std::time::Instant;

use glam::Vec2;

use super::entity::Body;
use super::state::{GamePhase, GameState};
use super::world::EntityId;
use crate::audio::SoundEffect;
use crate::consts::*;

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Fire pressed this frame
    pub fire: bool,
    /// Aim angle (radians, counter-clockwise from +x)
    pub aim_angle: f32,
    /// Movement direction; only the signs are used
    pub movement: Vec2,
    /// Start a new run
    pub restart: bool,
}

/// Something that happened during a tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    LaserFired { laser: EntityId, on_beat: bool },
    EnemyHit { enemy: EntityId, damage: f32 },
    EnemyKilled { enemy: EntityId, at: Vec2 },
    PlayerHurt { damage: f32, health: f32 },
    PlayerDied,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, now: Instant, dt: f32) -> Vec<GameEvent> {
    let mut events = Vec::new();

    // The restart frame only rebuilds; play resumes next tick
    if input.restart {
        state.restart();
        return events;
    }

    state.time_ticks += 1;
    state.score.update(now);

    if state.phase == GamePhase::Dead {
        return events;
    }

    // Fire first so the new laser moves this frame
    if input.fire {
        fire(state, input.aim_angle, &mut events);
    }

    // Integrate
    let target = state.character_center();
    if let Some(character) = state.character_mut() {
        character.update(dt, input.movement);
    }
    for &id in &state.enemies {
        if let Some(enemy) = state.world.get_mut(id).and_then(Body::as_enemy_mut) {
            enemy.update(dt, target);
        }
    }
    let mut bounces_before = Vec::with_capacity(state.lasers.len());
    for &id in &state.lasers {
        if let Some(laser) = state.world.get_mut(id).and_then(Body::as_laser_mut) {
            laser.update(dt);
            bounces_before.push(laser.bounces);
        }
    }

    state.world.step();

    // Bounces
    let bounced = state
        .lasers
        .iter()
        .filter_map(|&id| state.world.get(id).and_then(Body::as_laser))
        .zip(&bounces_before)
        .any(|(laser, &before)| laser.bounces > before && !laser.is_expired());
    if bounced {
        state.sfx.play(SoundEffect::LaserBounce);
    }

    // Damage dealt this frame
    for &id in &state.enemies {
        let Some(enemy) = state.world.get_mut(id).and_then(Body::as_enemy_mut) else {
            continue;
        };
        let damage = std::mem::take(&mut enemy.pending_damage);
        if damage > 0.0 {
            state.score.increment_score(f64::from(damage));
            state.sfx.play(SoundEffect::EnemyHit);
            events.push(GameEvent::EnemyHit { enemy: id, damage });
        }
    }

    if let Some(character) = state.character_mut() {
        let hurt = std::mem::take(&mut character.pending_hurt);
        let (health, dead) = (character.health, character.is_dead());
        if hurt > 0.0 {
            state.score.increment_score(-f64::from(hurt));
            events.push(GameEvent::PlayerHurt {
                damage: hurt,
                health,
            });
            if dead {
                state.phase = GamePhase::Dead;
                state.sfx.play(SoundEffect::PlayerDeath);
                events.push(GameEvent::PlayerDied);
                log::info!(
                    "{} (score {})",
                    state.death_message(),
                    state.score.score()
                );
            } else {
                state.sfx.play(SoundEffect::PlayerHurt);
            }
        }
    }

    // Deferred removals
    for (id, body) in state.world.remove_expired() {
        match body {
            Body::Enemy(enemy) => {
                state.spawner.on_enemy_killed();
                state.sfx.play(SoundEffect::EnemyDeath);
                events.push(GameEvent::EnemyKilled {
                    enemy: id,
                    at: enemy.rect.center(),
                });
                log::info!("enemy killed, difficulty now {}", state.spawner.difficulty);
            }
            Body::Laser(_) | Body::Character(_) | Body::Wall(_) | Body::Door(_) => {}
        }
    }
    let world = &state.world;
    state.enemies.retain(|&id| world.contains(id));
    state.lasers.retain(|&id| world.contains(id));

    // Spawn
    if let Some(enemy) = state
        .spawner
        .update(dt, state.enemies.len(), &state.level.enemy_spawns)
    {
        let id = state.world.register(Body::Enemy(enemy));
        state.enemies.push(id);
    }

    events
}

fn fire(state: &mut GameState, aim_angle: f32, events: &mut Vec<GameEvent>) {
    let Some(origin) = state
        .character()
        .filter(|c| !c.is_dead())
        .map(|c| c.rect.center() + MUZZLE_OFFSET)
    else {
        return;
    };

    let on_beat = state.score.register_fire();
    let band = on_beat.then(|| state.score.band());
    let laser = state.weapon.fire(
        &mut state.world,
        origin,
        aim_angle,
        state.score.multiplier(),
        band,
        &state.sfx,
    );
    state.lasers.push(laser);
    events.push(GameEvent::LaserFired { laser, on_beat });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{SfxReceiver, sfx_queue};
    use crate::sim::entity::Direction;
    use crate::sim::level::Level;
    use crate::sim::rect::Rect;
    use crate::sim::rhythm::{BeatClock, ScoreKeeper};
    use crate::sim::weapon::Weapon;
    use std::time::Duration;

    fn keeper() -> ScoreKeeper {
        let clock =
            BeatClock::new(120.0, Duration::from_millis(100), Duration::from_millis(100)).unwrap();
        ScoreKeeper::new(clock, Duration::ZERO)
    }

    /// Open floor with the character at the origin
    fn arena(walls: Vec<Rect>, enemy_spawns: Vec<Vec2>) -> (GameState, SfxReceiver) {
        let level = Level {
            walls,
            doors: Vec::new(),
            character_spawn: Vec2::ZERO,
            enemy_spawns,
        };
        let (sfx, rx) = sfx_queue(256);
        (GameState::new(1, level, keeper(), Weapon::default(), sfx), rx)
    }

    #[test]
    fn test_fire_before_music_is_unscored() {
        let (mut state, rx) = arena(Vec::new(), Vec::new());
        let input = TickInput {
            fire: true,
            ..Default::default()
        };

        let events = tick(&mut state, &input, Instant::now(), SIM_DT);
        assert!(matches!(
            events[..],
            [GameEvent::LaserFired { on_beat: false, .. }]
        ));
        assert_eq!(state.lasers.len(), 1);
        assert_eq!(state.score.increment(), 0);
        assert_eq!(rx.drain()[0].effect, SoundEffect::LaserFire);
    }

    #[test]
    fn test_fire_on_beat_colours_laser() {
        let (mut state, _rx) = arena(Vec::new(), Vec::new());
        let now = Instant::now();
        state.score.set_anchor(now);

        let input = TickInput {
            fire: true,
            ..Default::default()
        };
        let events = tick(&mut state, &input, now, SIM_DT);
        assert!(matches!(
            events[..],
            [GameEvent::LaserFired { on_beat: true, .. }]
        ));
        assert_eq!(state.score.increment(), 1);

        let laser = state
            .world
            .get(state.lasers[0])
            .and_then(Body::as_laser)
            .unwrap();
        assert_eq!(laser.band, Some(0));

        // Quarter beat later is off beat
        let later = now + Duration::from_millis(250);
        let events = tick(&mut state, &input, later, SIM_DT);
        assert!(matches!(
            events[..],
            [GameEvent::LaserFired { on_beat: false, .. }]
        ));
    }

    #[test]
    fn test_laser_kills_enemy_and_scores() {
        let (mut state, rx) = arena(Vec::new(), vec![Vec2::new(300.0, 0.0)]);
        let enemy = state.enemies[0];
        let now = Instant::now();

        let fire = TickInput {
            fire: true,
            ..Default::default()
        };
        let mut events = tick(&mut state, &fire, now, SIM_DT);
        for _ in 0..60 {
            events.extend(tick(&mut state, &TickInput::default(), now, SIM_DT));
        }

        assert!(events.contains(&GameEvent::EnemyHit {
            enemy,
            damage: LASER_BASE_DAMAGE,
        }));
        assert!(
            events
                .iter()
                .any(|e| matches!(e, GameEvent::EnemyKilled { enemy: id, .. } if *id == enemy))
        );
        assert!(!state.world.contains(enemy));
        assert!(state.lasers.is_empty());
        assert_eq!(state.score.score(), f64::from(LASER_BASE_DAMAGE));
        assert_eq!(state.spawner.difficulty, DIFFICULTY_START + DIFFICULTY_PER_KILL);

        let sounds: Vec<_> = rx.drain().into_iter().map(|r| r.effect).collect();
        assert!(sounds.contains(&SoundEffect::EnemyHit));
        assert!(sounds.contains(&SoundEffect::EnemyDeath));
    }

    #[test]
    fn test_laser_bounces_off_wall() {
        let (mut state, rx) = arena(vec![Rect::new(100.0, -50.0, 110.0, 50.0)], Vec::new());
        let fire = TickInput {
            fire: true,
            ..Default::default()
        };
        tick(&mut state, &fire, Instant::now(), SIM_DT);
        for _ in 0..30 {
            tick(&mut state, &TickInput::default(), Instant::now(), SIM_DT);
        }

        let laser = state
            .world
            .get(state.lasers[0])
            .and_then(Body::as_laser)
            .unwrap();
        assert_eq!(laser.bounces, 1);
        assert!(laser.velocity.x < 0.0);
        assert!(laser.pos.x < 100.0);

        let sounds: Vec<_> = rx.drain().into_iter().map(|r| r.effect).collect();
        assert!(sounds.contains(&SoundEffect::LaserBounce));

        let struck = state.world.iter().filter_map(|(_, b)| b.as_wall()).any(|w| w.hit);
        assert!(struck);
    }

    #[test]
    fn test_enemy_contact_kills_weak_player() {
        let (mut state, _rx) = arena(Vec::new(), vec![Vec2::new(50.0, 0.0)]);
        if let Some(c) = state.character_mut() {
            c.health = 10.0;
        }

        let events = tick(&mut state, &TickInput::default(), Instant::now(), SIM_DT);
        assert!(events.contains(&GameEvent::PlayerHurt {
            damage: ENEMY_CONTACT_DAMAGE,
            health: 10.0 - ENEMY_CONTACT_DAMAGE,
        }));
        assert_eq!(events.last(), Some(&GameEvent::PlayerDied));
        assert_eq!(state.phase, GamePhase::Dead);
        assert_eq!(state.score.score(), -f64::from(ENEMY_CONTACT_DAMAGE));

        // Dead characters don't shoot
        let fire = TickInput {
            fire: true,
            ..Default::default()
        };
        assert!(tick(&mut state, &fire, Instant::now(), SIM_DT).is_empty());
        assert!(state.lasers.is_empty());

        // Restart brings everything back
        let restart = TickInput {
            restart: true,
            ..Default::default()
        };
        tick(&mut state, &restart, Instant::now(), SIM_DT);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.character().map(|c| c.health), Some(CHARACTER_HEALTH));
        assert_eq!(state.score.score(), 0.0);
    }

    #[test]
    fn test_walls_stop_the_character() {
        let (mut state, _rx) = arena(vec![Rect::new(10.0, -50.0, 20.0, 50.0)], Vec::new());
        let right = TickInput {
            movement: Vec2::X,
            ..Default::default()
        };
        for _ in 0..120 {
            tick(&mut state, &right, Instant::now(), SIM_DT);
        }
        let c = state.character().unwrap();
        assert!(c.rect.max.x <= 10.0 + 1e-3);
        assert!(c.is_blocked(Direction::Right));
    }

    #[test]
    fn test_spawner_adds_enemies_over_time() {
        let (mut state, _rx) = arena(Vec::new(), vec![Vec2::new(-400.0, 400.0)]);
        assert_eq!(state.enemies.len(), 1);
        for _ in 0..(3.0 / SIM_DT) as usize {
            tick(&mut state, &TickInput::default(), Instant::now(), SIM_DT);
        }
        assert_eq!(state.enemies.len(), 2);
    }

    #[test]
    fn test_determinism() {
        // Two states with same seed should produce identical results
        let spawns = vec![Vec2::new(-300.0, 0.0), Vec2::new(300.0, 200.0)];
        let (mut state1, _rx1) = arena(Vec::new(), spawns.clone());
        let (mut state2, _rx2) = arena(Vec::new(), spawns);
        let now = Instant::now();

        let inputs = [
            TickInput {
                movement: Vec2::new(1.0, 0.0),
                ..Default::default()
            },
            TickInput {
                fire: true,
                aim_angle: 0.5,
                ..Default::default()
            },
            TickInput {
                movement: Vec2::new(0.0, -1.0),
                ..Default::default()
            },
            TickInput::default(),
        ];

        for _ in 0..100 {
            for input in &inputs {
                tick(&mut state1, input, now, SIM_DT);
                tick(&mut state2, input, now, SIM_DT);
            }
        }

        assert_eq!(state1.time_ticks, state2.time_ticks);
        assert_eq!(state1.enemies.len(), state2.enemies.len());
        assert_eq!(state1.character_center(), state2.character_center());
        assert_eq!(state1.score.score(), state2.score.score());
        let centers1: Vec<_> = state1.enemy_centers().collect();
        let centers2: Vec<_> = state2.enemy_centers().collect();
        assert_eq!(centers1, centers2);
    }
}
