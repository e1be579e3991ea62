//! Gameplay entities and their collision responses
//!
//! Every collidable thing in the house is one variant of [`Body`]. The
//! collision world only sees the [`Collidable`] capability; what each kind
//! does on contact is decided here by matching on the counterpart's
//! [`EntityKind`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{aabb_check, push_back, reflect_velocity};
use super::rect::Rect;
use super::world::{Collidable, Contact};
use crate::consts::*;

/// Closed set of entity kinds the collision responses are written against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Character,
    Enemy,
    Laser,
    Wall,
    Door,
}

/// Side of the character a wall is blocking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ];

    /// Face normal of a wall blocking this side
    pub fn normal(self) -> Vec2 {
        match self {
            Direction::Left => Vec2::new(1.0, 0.0),
            Direction::Right => Vec2::new(-1.0, 0.0),
            Direction::Up => Vec2::new(0.0, -1.0),
            Direction::Down => Vec2::new(0.0, 1.0),
        }
    }

    pub fn from_normal(normal: Vec2) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.normal() == normal)
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// The player
#[derive(Debug, Clone)]
pub struct Character {
    pub rect: Rect,
    /// Displacement applied this frame
    pub vel: Vec2,
    pub run_speed: f32,
    pub health: f32,
    /// Frames left before enemy contact can hurt again
    pub hurt_cooldown: u32,
    /// Damage taken since the tick last drained it
    pub pending_hurt: f32,
    /// Wall rectangles currently blocking each side
    blocked: [Option<Rect>; 4],
}

impl Character {
    pub fn new(spawn: Vec2) -> Self {
        Self {
            rect: Rect::from_center(spawn, CHARACTER_SIZE),
            vel: Vec2::ZERO,
            run_speed: CHARACTER_RUN_SPEED,
            health: CHARACTER_HEALTH,
            hurt_cooldown: 0,
            pending_hurt: 0.0,
            blocked: [None; 4],
        }
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    pub fn is_blocked(&self, dir: Direction) -> bool {
        self.blocked[dir.index()].is_some()
    }

    /// Drop blocks the character has moved clear of, then move.
    ///
    /// `movement` is the raw input direction; only its signs matter.
    pub fn update(&mut self, dt: f32, movement: Vec2) {
        // A wall stays blocking until the character is clear of it by the leeway
        for dir in Direction::ALL {
            if let Some(wall) = self.blocked[dir.index()] {
                let grown = wall.moved(dir.normal() * BLOCK_RELEASE_LEEWAY);
                if !aabb_check(self.rect, grown) {
                    self.blocked[dir.index()] = None;
                }
            }
        }

        self.hurt_cooldown = self.hurt_cooldown.saturating_sub(1);

        if self.is_dead() {
            self.vel = Vec2::ZERO;
            return;
        }

        let mut ctrl = Vec2::ZERO;
        if movement.x < 0.0 && !self.is_blocked(Direction::Left) {
            ctrl.x = -1.0;
        } else if movement.x > 0.0 && !self.is_blocked(Direction::Right) {
            ctrl.x = 1.0;
        }
        if movement.y > 0.0 && !self.is_blocked(Direction::Up) {
            ctrl.y = 1.0;
        } else if movement.y < 0.0 && !self.is_blocked(Direction::Down) {
            ctrl.y = -1.0;
        }

        self.vel = ctrl * self.run_speed * dt;
        self.rect = self.rect.moved(self.vel);
    }

    fn on_collision(&mut self, contact: &Contact) {
        match contact.other_kind {
            EntityKind::Wall => {
                if let Some(dir) = Direction::from_normal(contact.normal) {
                    self.blocked[dir.index()] = Some(contact.other_rect);
                }
                if self.rect.overlaps(&contact.other_rect) {
                    self.rect = self.rect.moved(push_back(self.vel, contact.normal));
                }
            }
            EntityKind::Enemy => {
                if self.hurt_cooldown == 0 && !self.is_dead() {
                    self.health -= contact.other_damage;
                    self.pending_hurt += contact.other_damage;
                    self.hurt_cooldown = HURT_COOLDOWN_FRAMES;
                }
            }
            EntityKind::Laser | EntityKind::Door | EntityKind::Character => {}
        }
    }
}

/// A chasing enemy
#[derive(Debug, Clone)]
pub struct Enemy {
    pub rect: Rect,
    /// Displacement per frame
    pub vel: Vec2,
    pub move_speed: f32,
    pub health: f32,
    pub max_health: f32,
    pub contact_damage: f32,
    /// Damage received from lasers since the tick last drained it
    pub pending_damage: f32,
}

impl Enemy {
    pub fn new(center: Vec2, health: f32) -> Self {
        Self {
            rect: Rect::from_center(center, ENEMY_SIZE),
            vel: Vec2::ZERO,
            move_speed: ENEMY_MOVE_SPEED,
            health,
            max_health: health,
            contact_damage: ENEMY_CONTACT_DAMAGE,
            pending_damage: 0.0,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    /// Accelerate toward `target` on each axis and move
    pub fn update(&mut self, dt: f32, target: Vec2) {
        let center = self.rect.center();

        if center.x < target.x {
            self.vel.x = (self.vel.x + dt).min(self.move_speed);
        }
        if center.x > target.x {
            self.vel.x = (self.vel.x - dt).max(-self.move_speed);
        }
        if center.y < target.y {
            self.vel.y = (self.vel.y + dt).min(self.move_speed);
        }
        if center.y > target.y {
            self.vel.y = (self.vel.y - dt).max(-self.move_speed);
        }

        self.rect = self.rect.moved(self.vel);
    }

    fn on_collision(&mut self, contact: &Contact) {
        match contact.other_kind {
            EntityKind::Laser => {
                self.health -= contact.other_damage;
                self.pending_damage += contact.other_damage;
            }
            EntityKind::Wall | EntityKind::Character | EntityKind::Enemy => {
                self.rect = self.rect.moved(push_back(self.vel, contact.normal));
            }
            EntityKind::Door => {}
        }
    }
}

/// A weapon shot
#[derive(Debug, Clone)]
pub struct Laser {
    pub pos: Vec2,
    /// Units per second
    pub velocity: Vec2,
    /// Displacement applied on the last update
    pub last_velocity: Vec2,
    pub damage: f32,
    pub thickness: f32,
    pub bounces: u32,
    /// Multiplier palette band when fired on beat
    pub band: Option<usize>,
    /// Normal of the enemy face this laser splashed on
    pub splash: Option<Vec2>,
    expired: bool,
}

impl Laser {
    pub fn new(origin: Vec2, velocity: Vec2, damage: f32, band: Option<usize>) -> Self {
        Self {
            pos: origin,
            velocity,
            last_velocity: Vec2::ZERO,
            damage,
            thickness: LASER_THICKNESS,
            bounces: 0,
            band,
            splash: None,
            expired: false,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::from_center(self.pos, Vec2::splat(self.thickness.max(0.0)))
    }

    pub fn update(&mut self, dt: f32) {
        self.last_velocity = self.velocity * dt;
        self.pos += self.last_velocity;

        if self.thickness > 0.0 {
            self.thickness -= LASER_DECAY;
        }
        if self.thickness <= 0.0 || self.bounces > LASER_MAX_BOUNCES {
            self.expired = true;
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    fn on_collision(&mut self, contact: &Contact) {
        match contact.other_kind {
            EntityKind::Laser | EntityKind::Character => {}
            EntityKind::Door => self.expired = true,
            EntityKind::Enemy => {
                self.splash = Some(contact.normal);
                self.expired = true;
            }
            EntityKind::Wall => {
                self.velocity = reflect_velocity(self.velocity, contact.normal);
                self.bounces += 1;
                if self.bounces > LASER_MAX_BOUNCES {
                    self.expired = true;
                }
            }
        }
    }
}

/// Static level geometry
#[derive(Debug, Clone)]
pub struct Wall {
    pub rect: Rect,
    /// Set once anything has run into it
    pub hit: bool,
}

impl Wall {
    pub fn new(rect: Rect) -> Self {
        Self { rect, hit: false }
    }
}

/// Opening to the street; swallows lasers
#[derive(Debug, Clone)]
pub struct Door {
    pub rect: Rect,
}

/// Everything that can be registered in the collision world
#[derive(Debug, Clone)]
pub enum Body {
    Character(Character),
    Enemy(Enemy),
    Laser(Laser),
    Wall(Wall),
    Door(Door),
}

impl Body {
    pub fn as_character(&self) -> Option<&Character> {
        match self {
            Body::Character(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_character_mut(&mut self) -> Option<&mut Character> {
        match self {
            Body::Character(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_enemy_mut(&mut self) -> Option<&mut Enemy> {
        match self {
            Body::Enemy(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_laser(&self) -> Option<&Laser> {
        match self {
            Body::Laser(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_laser_mut(&mut self) -> Option<&mut Laser> {
        match self {
            Body::Laser(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_wall(&self) -> Option<&Wall> {
        match self {
            Body::Wall(w) => Some(w),
            _ => None,
        }
    }
}

impl Collidable for Body {
    fn rect(&self) -> Rect {
        match self {
            Body::Character(c) => c.rect,
            Body::Enemy(e) => e.rect,
            Body::Laser(l) => l.rect(),
            Body::Wall(w) => w.rect,
            Body::Door(d) => d.rect,
        }
    }

    fn velocity(&self) -> Vec2 {
        match self {
            Body::Character(c) => c.vel,
            Body::Enemy(e) => e.vel,
            Body::Laser(l) => l.last_velocity,
            Body::Wall(_) | Body::Door(_) => Vec2::ZERO,
        }
    }

    fn kind(&self) -> EntityKind {
        match self {
            Body::Character(_) => EntityKind::Character,
            Body::Enemy(_) => EntityKind::Enemy,
            Body::Laser(_) => EntityKind::Laser,
            Body::Wall(_) => EntityKind::Wall,
            Body::Door(_) => EntityKind::Door,
        }
    }

    fn damage(&self) -> f32 {
        match self {
            Body::Enemy(e) => e.contact_damage,
            Body::Laser(l) => l.damage,
            _ => 0.0,
        }
    }

    fn on_collision(&mut self, contact: &Contact) {
        match self {
            Body::Character(c) => c.on_collision(contact),
            Body::Enemy(e) => e.on_collision(contact),
            Body::Laser(l) => l.on_collision(contact),
            Body::Wall(w) => {
                log::debug!("wall struck by {:?}", contact.other_kind);
                w.hit = true;
            }
            Body::Door(_) => {}
        }
    }

    fn is_expired(&self) -> bool {
        match self {
            Body::Enemy(e) => e.is_dead(),
            Body::Laser(l) => l.is_expired(),
            Body::Character(_) | Body::Wall(_) | Body::Door(_) => false,
        }
    }
}
