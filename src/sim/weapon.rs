//! The character's laser gun

use glam::Vec2;

use super::entity::{Body, Laser};
use super::world::{CollisionWorld, EntityId};
use crate::audio::{SfxQueue, SoundEffect};
use crate::consts::*;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weapon {
    /// Laser speed (units/s)
    pub speed: f32,
}

impl Default for Weapon {
    fn default() -> Self {
        Self {
            speed: WEAPON_SPEED,
        }
    }
}

impl Weapon {
    pub fn new(speed: f32) -> Self {
        Self { speed }
    }

    /// Laser velocity for an aim angle
    pub fn velocity(&self, angle: f32) -> Vec2 {
        crate::aim_direction(angle) * self.speed
    }

    /// Register a new laser in the world.
    ///
    /// Damage scales with `multiplier`. `band` is the palette band to draw the
    /// laser in, given only for on-beat shots.
    pub fn fire(
        &self,
        world: &mut CollisionWorld<Body>,
        origin: Vec2,
        angle: f32,
        multiplier: u8,
        band: Option<usize>,
        sfx: &SfxQueue,
    ) -> EntityId {
        let damage = LASER_BASE_DAMAGE * f32::from(multiplier);
        let laser = Laser::new(origin, self.velocity(angle), damage, band);
        let id = world.register(Body::Laser(laser));

        sfx.play(SoundEffect::LaserFire);
        id
    }
}
