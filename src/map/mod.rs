//! This module defines the maze, its geometry, and the obstacle query every mover consults.

use bevy_ecs::resource::Resource;
use glam::{IVec2, UVec2};

pub mod direction;
pub mod geometry;
pub mod maze;
pub mod parser;

/// Answers whether a tile can be entered.
///
/// Supplied once at session start and immutable afterwards.
pub trait ObstacleQuery: Send + Sync {
    /// True if no mobile entity may occupy `tile`.
    fn is_blocked(&self, tile: IVec2) -> bool;

    /// True if pursuers standing on `tile` may not choose to move up.
    fn is_restricted_ascent(&self, _tile: IVec2) -> bool {
        false
    }

    /// Field dimensions in tiles, used for the wrap rule.
    fn size(&self) -> UVec2;
}

/// The session's obstacle query, shared read-only by every system.
#[derive(Resource)]
pub struct Obstacles(Box<dyn ObstacleQuery>);

impl Obstacles {
    pub fn new(query: impl ObstacleQuery + 'static) -> Self {
        Self(Box::new(query))
    }
}

impl std::ops::Deref for Obstacles {
    type Target = dyn ObstacleQuery;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}
