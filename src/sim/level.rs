//! Level geometry: walls, doors, and where things start

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::{Body, Door, Wall};
use super::rect::Rect;
use super::world::{CollisionWorld, EntityId};

/// Shift applied to the interior walls so the house sits centered on screen
const WALL_MIDPOINT_OFFSET: Vec2 = Vec2::new(0.0, -50.0);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub walls: Vec<Rect>,
    pub doors: Vec<Rect>,
    pub character_spawn: Vec2,
    /// Enemy spawn centers; the first is used for the opening enemy
    pub enemy_spawns: Vec<Vec2>,
}

impl Level {
    /// The single-storey house: a street on the upper left, a hat room
    /// beside it, two rooms below.
    pub fn house() -> Self {
        let outer = [
            Rect::new(-700.0, -200.0, 700.0, -190.0), // bottom
            Rect::new(-710.0, 700.0, -700.0, -200.0), // left
            Rect::new(700.0, 700.0, 710.0, -200.0),   // right
        ];
        let inner = [
            Rect::new(-700.0, 690.0, 700.0, 700.0), // top
            // top rooms
            Rect::new(-10.0, 685.0, -5.0, 540.0),
            Rect::new(-230.0, 690.0, -165.0, 540.0),
            Rect::new(-230.0, 350.0, -165.0, 200.0),
            Rect::new(-10.0, 350.0, -5.0, 200.0),
            // bottom rooms
            Rect::new(-700.0, 190.0, 0.0, 200.0),
            Rect::new(140.0, 190.0, 315.0, 200.0),
            Rect::new(455.0, 190.0, 700.0, 200.0),
            Rect::new(150.0, 190.0, 160.0, -140.0),
        ];

        let walls = outer
            .into_iter()
            .chain(inner.into_iter().map(|r| r.moved(WALL_MIDPOINT_OFFSET)))
            .map(|r| r.norm())
            .collect();

        // Gap between the street and the house
        let doors = vec![
            Rect::new(-230.0, 350.0, -165.0, 540.0)
                .moved(WALL_MIDPOINT_OFFSET)
                .norm(),
        ];

        Self {
            walls,
            doors,
            character_spawn: Vec2::new(430.0, -20.0),
            enemy_spawns: vec![
                Vec2::ZERO,
                Vec2::new(-465.0, 270.0),
                Vec2::new(-465.0, 520.0),
                Vec2::new(-400.0, -20.0),
            ],
        }
    }

    /// Register the static geometry. Returns the wall ids.
    pub fn populate(&self, world: &mut CollisionWorld<Body>) -> Vec<EntityId> {
        for rect in &self.doors {
            world.register(Body::Door(Door { rect: *rect }));
        }
        self.walls
            .iter()
            .map(|rect| world.register(Body::Wall(Wall::new(*rect))))
            .collect()
    }
}
