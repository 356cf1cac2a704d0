//! Tile ⇄ world conversions and the horizontal wrap rule.
//!
//! World positions are the top-left corner of an entity's tile-sized box. An
//! entity "occupies" the tile containing the centre of that box.

use bevy_ecs::resource::Resource;
use glam::{IVec2, UVec2, Vec2};

use crate::constants::TILE_SIZE;

/// Returns the tile containing the centre of an entity whose top-left corner is `position`.
pub fn tile_of(position: Vec2) -> IVec2 {
    ((position + Vec2::splat(TILE_SIZE / 2.0)) / TILE_SIZE).floor().as_ivec2()
}

/// Returns the world-space corner of a tile.
pub fn tile_to_world(tile: IVec2) -> Vec2 {
    tile.as_vec2() * TILE_SIZE
}

/// Squared straight-line distance between two tiles; only relative ordering matters.
pub fn distance_squared(a: IVec2, b: IVec2) -> i32 {
    (a - b).length_squared()
}

/// The rectangular play field, in tiles.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayField {
    pub size: UVec2,
}

/// The outcome of applying the wrap rule to an x coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Wrap {
    /// The coordinate is inside the field (or inside the one-tile margin either side).
    Inside,
    /// The entity left the field and re-enters at this x coordinate.
    Teleport(f32),
}

impl PlayField {
    pub fn new(size: UVec2) -> Self {
        Self { size }
    }

    /// Width of the field in world units.
    pub fn width_px(&self) -> f32 {
        self.size.x as f32 * TILE_SIZE
    }

    /// Applies the horizontal wrap rule.
    ///
    /// Leaving past the right edge re-enters one tile beyond the left edge and vice versa,
    /// so an entity is always either on the field or on the one-tile margin beside it.
    pub fn wrap_x(&self, x: f32) -> Wrap {
        if x >= self.width_px() {
            Wrap::Teleport(-TILE_SIZE)
        } else if x <= -TILE_SIZE {
            Wrap::Teleport(self.width_px())
        } else {
            Wrap::Inside
        }
    }
}
