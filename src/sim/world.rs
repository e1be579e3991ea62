//! Collision world: the registry of active collidables
//!
//! Entities live in generational slots and are addressed by [`EntityId`].
//! Gameplay code keeps ids, never references, so an id that outlives its
//! entity just stops resolving instead of dangling.
//!
//! Removal requested from inside a collision callback (a laser that hit
//! something, an enemy that died) is deferred: the entity reports
//! `is_expired()`, is skipped for the rest of the frame, and is taken out by
//! [`CollisionWorld::remove_expired`] once the collision pass is over.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{aabb_check, swept_aabb, swept_broadphase_rect};
use super::entity::EntityKind;
use super::rect::Rect;

/// Capability every registered entity provides
pub trait Collidable {
    /// Current bounds
    fn rect(&self) -> Rect;
    /// Displacement this frame
    fn velocity(&self) -> Vec2;
    fn kind(&self) -> EntityKind;
    /// Damage dealt to whatever this touches
    fn damage(&self) -> f32 {
        0.0
    }
    /// React to a contact. All position and velocity correction happens here.
    fn on_collision(&mut self, contact: &Contact);
    /// The entity wants to leave the world
    fn is_expired(&self) -> bool {
        false
    }
}

/// Handle to a registered entity
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct EntityId {
    index: u32,
    generation: u32,
}

/// What one party of a collision is told about the other
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub other: EntityId,
    pub other_kind: EntityKind,
    pub other_rect: Rect,
    pub other_damage: f32,
    /// Fraction of the frame at which the contact starts
    pub time: f32,
    /// Face of the other party that was touched, pointing at the receiver
    pub normal: Vec2,
}

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Registry of collidables plus the per-entity collision pass
#[derive(Debug, Clone)]
pub struct CollisionWorld<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> Default for CollisionWorld<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CollisionWorld<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Add an entity and get its handle
    pub fn register(&mut self, value: T) -> EntityId {
        self.len += 1;

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return EntityId {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        EntityId {
            index,
            generation: 0,
        }
    }

    /// Remove an entity. Unknown or already removed ids are a no-op.
    pub fn deregister(&mut self, id: EntityId) -> Option<T> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.len -= 1;
        Some(value)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: EntityId) -> Option<&T> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.value.as_ref()
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.value.as_mut()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Live entities in slot order
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.value.as_ref().map(|v| {
                (
                    EntityId {
                        index: i as u32,
                        generation: slot.generation,
                    },
                    v,
                )
            })
        })
    }

    pub fn ids(&self) -> Vec<EntityId> {
        self.iter().map(|(id, _)| id).collect()
    }

    /// Drop every entity (level restart). Old ids stay stale.
    pub fn clear(&mut self) {
        self.free.clear();
        for (index, slot) in self.slots.iter_mut().enumerate().rev() {
            if slot.value.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
            self.free.push(index as u32);
        }
        self.len = 0;
    }
}

/// Snapshot of one side of a pair, taken before any callback runs
struct Party {
    id: EntityId,
    kind: EntityKind,
    rect: Rect,
    damage: f32,
}

impl<T: Collidable> CollisionWorld<T> {
    fn party(&self, id: EntityId) -> Option<Party> {
        let value = self.get(id)?;
        Some(Party {
            id,
            kind: value.kind(),
            rect: value.rect(),
            damage: value.damage(),
        })
    }

    fn is_live(&self, id: EntityId) -> bool {
        self.get(id).is_some_and(|v| !v.is_expired())
    }

    /// Sweep `subject` against every other live entity and notify both
    /// parties of each contact that starts within this frame.
    ///
    /// The subject is told the sweep normal (the face it ran into); the
    /// counterpart gets the negation. Returns the number of contacts.
    pub fn check_collisions(&mut self, subject: EntityId) -> usize {
        if !self.is_live(subject) {
            return 0;
        }

        let mut contacts = 0;

        for index in 0..self.slots.len() {
            let slot = &self.slots[index];
            let other = EntityId {
                index: index as u32,
                generation: slot.generation,
            };
            if other == subject || !self.is_live(other) {
                continue;
            }

            // The subject may have been pushed back by an earlier contact
            let Some(subject_value) = self.get(subject) else {
                break;
            };
            let (rect, vel) = (subject_value.rect(), subject_value.velocity());
            let Some(them) = self.party(other) else {
                continue;
            };

            if !aabb_check(swept_broadphase_rect(rect, vel), them.rect) {
                continue;
            }

            let result = swept_aabb(rect, vel, them.rect);
            if !result.hit || result.time >= 1.0 {
                continue;
            }

            let Some(us) = self.party(subject) else {
                break;
            };
            log::debug!(
                "{:?} -> {:?} collision at t={:.3} n={:?}",
                us.kind,
                them.kind,
                result.time,
                result.normal
            );

            if let Some(value) = self.get_mut(other) {
                value.on_collision(&Contact {
                    other: us.id,
                    other_kind: us.kind,
                    other_rect: us.rect,
                    other_damage: us.damage,
                    time: result.time,
                    normal: -result.normal,
                });
            }
            if let Some(value) = self.get_mut(subject) {
                value.on_collision(&Contact {
                    other: them.id,
                    other_kind: them.kind,
                    other_rect: them.rect,
                    other_damage: them.damage,
                    time: result.time,
                    normal: result.normal,
                });
            }
            contacts += 1;

            if !self.is_live(subject) {
                break;
            }
        }

        contacts
    }

    /// Run the collision pass for every moving entity, in slot order
    pub fn step(&mut self) -> usize {
        let movers: Vec<EntityId> = self
            .iter()
            .filter(|(_, v)| v.velocity() != Vec2::ZERO && !v.is_expired())
            .map(|(id, _)| id)
            .collect();

        movers.into_iter().map(|id| self.check_collisions(id)).sum()
    }

    /// Take out everything that expired during the pass
    pub fn remove_expired(&mut self) -> Vec<(EntityId, T)> {
        let expired: Vec<EntityId> = self
            .iter()
            .filter(|(_, v)| v.is_expired())
            .map(|(id, _)| id)
            .collect();

        expired
            .into_iter()
            .filter_map(|id| self.deregister(id).map(|v| (id, v)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal collidable that records what it was told
    #[derive(Debug)]
    struct Probe {
        kind: EntityKind,
        rect: Rect,
        vel: Vec2,
        contacts: Vec<Contact>,
        expire_on_hit: bool,
        expired: bool,
    }

    impl Probe {
        fn new(kind: EntityKind, rect: Rect, vel: Vec2) -> Self {
            Self {
                kind,
                rect,
                vel,
                contacts: Vec::new(),
                expire_on_hit: false,
                expired: false,
            }
        }

        fn fragile(mut self) -> Self {
            self.expire_on_hit = true;
            self
        }
    }

    impl Collidable for Probe {
        fn rect(&self) -> Rect {
            self.rect
        }

        fn velocity(&self) -> Vec2 {
            self.vel
        }

        fn kind(&self) -> EntityKind {
            self.kind
        }

        fn on_collision(&mut self, contact: &Contact) {
            self.contacts.push(*contact);
            if self.expire_on_hit {
                self.expired = true;
            }
        }

        fn is_expired(&self) -> bool {
            self.expired
        }
    }

    #[test]
    fn test_subject_and_wall_get_opposite_normals() {
        let mut world = CollisionWorld::new();
        let subject = world.register(Probe::new(
            EntityKind::Laser,
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Vec2::new(20.0, 0.0),
        ));
        let wall = world.register(Probe::new(
            EntityKind::Wall,
            Rect::new(15.0, 0.0, 25.0, 10.0),
            Vec2::ZERO,
        ));

        assert_eq!(world.check_collisions(subject), 1);

        let s = &world.get(subject).unwrap().contacts;
        let w = &world.get(wall).unwrap().contacts;
        assert_eq!(s.len(), 1);
        assert_eq!(w.len(), 1);
        assert!((s[0].time - 0.25).abs() < 1e-6);
        assert_eq!(s[0].time, w[0].time);
        assert_eq!(s[0].normal, Vec2::new(-1.0, 0.0));
        assert_eq!(w[0].normal, Vec2::new(1.0, 0.0));
        assert_eq!(s[0].other, wall);
        assert_eq!(w[0].other, subject);
        assert_eq!(w[0].other_kind, EntityKind::Laser);
    }

    #[test]
    fn test_static_separated_pair_is_silent() {
        let mut world = CollisionWorld::new();
        let a = world.register(Probe::new(
            EntityKind::Wall,
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Vec2::ZERO,
        ));
        world.register(Probe::new(
            EntityKind::Wall,
            Rect::new(30.0, 0.0, 40.0, 10.0),
            Vec2::ZERO,
        ));

        assert_eq!(world.check_collisions(a), 0);
        assert_eq!(world.step(), 0);
    }

    #[test]
    fn test_never_pairs_with_itself() {
        let mut world = CollisionWorld::new();
        let a = world.register(Probe::new(
            EntityKind::Enemy,
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Vec2::new(3.0, 3.0),
        ));
        assert_eq!(world.check_collisions(a), 0);
        assert!(world.get(a).unwrap().contacts.is_empty());
    }

    #[test]
    fn test_deregister_is_idempotent_and_ids_go_stale() {
        let mut world = CollisionWorld::new();
        let a = world.register(Probe::new(EntityKind::Wall, Rect::ZERO, Vec2::ZERO));

        assert!(world.deregister(a).is_some());
        assert!(world.deregister(a).is_none());
        assert!(world.is_empty());

        // Slot is reused under a new generation
        let b = world.register(Probe::new(EntityKind::Door, Rect::ZERO, Vec2::ZERO));
        assert_ne!(a, b);
        assert!(world.get(a).is_none());
        assert!(world.get(b).is_some());

        // Stale subject fails open
        assert_eq!(world.check_collisions(a), 0);
    }

    #[test]
    fn test_expiring_subject_stops_its_pass() {
        let mut world = CollisionWorld::new();
        let laser = world.register(
            Probe::new(
                EntityKind::Laser,
                Rect::new(0.0, 0.0, 2.0, 2.0),
                Vec2::new(50.0, 0.0),
            )
            .fragile(),
        );
        let first = world.register(Probe::new(
            EntityKind::Enemy,
            Rect::new(10.0, -5.0, 20.0, 5.0),
            Vec2::ZERO,
        ));
        let second = world.register(Probe::new(
            EntityKind::Enemy,
            Rect::new(30.0, -5.0, 40.0, 5.0),
            Vec2::ZERO,
        ));

        assert_eq!(world.check_collisions(laser), 1);
        assert_eq!(world.get(first).unwrap().contacts.len(), 1);
        assert!(world.get(second).unwrap().contacts.is_empty());

        // Still registered until the pass is flushed
        assert!(world.contains(laser));
        let removed = world.remove_expired();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].0, laser);
        assert!(!world.contains(laser));
    }

    #[test]
    fn test_expired_counterpart_is_skipped_by_later_subjects() {
        let mut world = CollisionWorld::new();
        let target = world.register(
            Probe::new(
                EntityKind::Enemy,
                Rect::new(10.0, 0.0, 20.0, 10.0),
                Vec2::ZERO,
            )
            .fragile(),
        );
        let a = world.register(Probe::new(
            EntityKind::Laser,
            Rect::new(0.0, 0.0, 5.0, 5.0),
            Vec2::new(10.0, 0.0),
        ));
        let b = world.register(Probe::new(
            EntityKind::Laser,
            Rect::new(0.0, 5.0, 5.0, 10.0),
            Vec2::new(10.0, 0.0),
        ));

        assert_eq!(world.step(), 1);
        assert_eq!(world.get(a).unwrap().contacts.len(), 1);
        assert!(world.get(b).unwrap().contacts.is_empty());
        assert_eq!(world.get(target).unwrap().contacts.len(), 1);
    }

    #[test]
    fn test_iteration_is_slot_ordered() {
        let mut world = CollisionWorld::new();
        let a = world.register(Probe::new(EntityKind::Wall, Rect::ZERO, Vec2::ZERO));
        let b = world.register(Probe::new(EntityKind::Wall, Rect::ZERO, Vec2::ZERO));
        let c = world.register(Probe::new(EntityKind::Wall, Rect::ZERO, Vec2::ZERO));
        world.deregister(b);
        assert_eq!(world.ids(), vec![a, c]);
        world.clear();
        assert_eq!(world.len(), 0);
        assert!(world.get(a).is_none());

        // Slots come back lowest first
        let d = world.register(Probe::new(EntityKind::Wall, Rect::ZERO, Vec2::ZERO));
        let e = world.register(Probe::new(EntityKind::Wall, Rect::ZERO, Vec2::ZERO));
        assert!(d < e);
        assert_eq!(world.ids(), vec![d, e]);
    }
}
