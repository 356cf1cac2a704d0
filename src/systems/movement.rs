use bevy_ecs::component::Component;
use glam::Vec2;

use crate::constants::TILE_SIZE;
use crate::map::direction::{heading_vec, Direction};
use crate::map::geometry::{tile_of, tile_to_world, PlayField, Wrap};

/// Continuous position plus the two tiles an entity is travelling between.
///
/// The position always lies on the segment from `last_tile` to `next_tile`
/// (both in world units), except for the single tick where a wrap teleports it.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    pub position: Vec2,
    pub last_tile: Vec2,
    pub next_tile: Vec2,
    pub heading: Option<Direction>,
    /// Speed in world units per second.
    pub speed: f32,
    /// False exactly when the entity sits on a tile boundary and must decide where to go next.
    pub between_tiles: bool,
}

/// The result of stepping a position towards its next tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub position: Vec2,
    pub between_tiles: bool,
}

/// Moves `position` along `direction` toward `next_tile`, snapping onto it rather than overshooting.
///
/// An entity already on its next tile stays put and is reported aligned.
pub fn advance(position: Vec2, next_tile: Vec2, direction: Vec2, speed: f32, dt: f32) -> Step {
    if position == next_tile {
        return Step {
            position,
            between_tiles: false,
        };
    }

    let remaining = next_tile - position;
    let step = direction * speed * dt;
    if remaining.length() > step.length() {
        Step {
            position: position + step,
            between_tiles: true,
        }
    } else {
        Step {
            position: next_tile,
            between_tiles: false,
        }
    }
}

/// Recomputes the last and next tiles from the occupied tile and a heading.
pub fn neighbour_tiles(position: Vec2, heading: Option<Direction>) -> (Vec2, Vec2) {
    let last = tile_to_world(tile_of(position));
    (last, last + heading_vec(heading) * TILE_SIZE)
}

impl Motion {
    /// A stationary entity sitting exactly on `position`.
    pub fn at_rest(position: Vec2, speed: f32) -> Self {
        Self {
            position,
            last_tile: position,
            next_tile: position,
            heading: None,
            speed,
            between_tiles: false,
        }
    }

    pub fn is_aligned(&self) -> bool {
        self.position == self.next_tile
    }

    /// True when sitting on either end of the segment, i.e. on a tile centre.
    pub fn on_tile(&self) -> bool {
        self.position == self.last_tile || self.position == self.next_tile
    }

    /// Advances along the current heading for `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        let step = advance(self.position, self.next_tile, heading_vec(self.heading), self.speed, dt);
        self.position = step.position;
        self.between_tiles = step.between_tiles;
    }

    /// Sets a new heading and recomputes both tiles around the occupied tile.
    pub fn realign(&mut self, heading: Option<Direction>) {
        self.heading = heading;
        let (last, next) = neighbour_tiles(self.position, heading);
        self.last_tile = last;
        self.next_tile = next;
    }

    /// Swaps the segment ends, leaving the heading to the caller.
    pub fn swap_ends(&mut self) {
        std::mem::swap(&mut self.last_tile, &mut self.next_tile);
        self.between_tiles = self.position != self.next_tile;
    }

    /// Turns around in place by swapping the segment ends.
    pub fn reverse(&mut self) {
        if let Some(heading) = self.heading {
            self.swap_ends();
            self.heading = Some(heading.opposite());
        }
    }

    /// Snaps back to the last tile and stops.
    pub fn halt(&mut self) {
        self.position = self.last_tile;
        self.next_tile = self.last_tile;
        self.heading = None;
        self.between_tiles = false;
    }

    /// Applies the horizontal wrap rule. Returns true if the entity was teleported.
    ///
    /// Only meaningful at alignment: the last tile moves with the entity and the next
    /// tile is one step further along the heading.
    pub fn wrap(&mut self, field: &PlayField) -> bool {
        match field.wrap_x(self.position.x) {
            Wrap::Inside => false,
            Wrap::Teleport(x) => {
                self.position.x = x;
                self.last_tile.x = x;
                self.next_tile.x = x + heading_vec(self.heading).x * TILE_SIZE;
                true
            }
        }
    }

    /// Returns to `position` at rest.
    pub fn reset(&mut self, position: Vec2, speed: f32) {
        *self = Self::at_rest(position, speed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::UVec2;

    #[test]
    fn test_advance_partial_step() {
        let step = advance(Vec2::ZERO, Vec2::new(20.0, 0.0), Vec2::X, 120.0, 0.1);
        assert_eq!(step.position, Vec2::new(12.0, 0.0));
        assert!(step.between_tiles);
    }

    #[test]
    fn test_advance_snaps_instead_of_overshooting() {
        let step = advance(Vec2::new(12.0, 0.0), Vec2::new(20.0, 0.0), Vec2::X, 120.0, 0.1);
        assert_eq!(step.position, Vec2::new(20.0, 0.0));
        assert!(!step.between_tiles);
    }

    #[test]
    fn test_advance_exact_step_snaps() {
        // One full tile in exactly one tick lands on the tile, aligned.
        let step = advance(Vec2::ZERO, Vec2::new(0.0, 20.0), Vec2::Y, 20.0, 1.0);
        assert_eq!(step.position, Vec2::new(0.0, 20.0));
        assert!(!step.between_tiles);
    }

    #[test]
    fn test_advance_when_already_aligned() {
        let step = advance(Vec2::new(40.0, 40.0), Vec2::new(40.0, 40.0), Vec2::X, 120.0, 0.5);
        assert_eq!(step.position, Vec2::new(40.0, 40.0));
        assert!(!step.between_tiles);
    }

    #[test]
    fn test_swap_ends_keeps_heading() {
        let mut motion = Motion::at_rest(Vec2::new(40.0, 20.0), 100.0);
        motion.realign(Some(Direction::Right));
        motion.tick(0.05);
        motion.swap_ends();
        assert_eq!(motion.last_tile, Vec2::new(60.0, 20.0));
        assert_eq!(motion.next_tile, Vec2::new(40.0, 20.0));
        assert_eq!(motion.heading, Some(Direction::Right));
        assert!(motion.between_tiles);
    }

    #[test]
    fn test_realign_uses_centre_tile() {
        let mut motion = Motion::at_rest(Vec2::new(40.0, 20.0), 100.0);
        motion.realign(Some(Direction::Left));
        assert_eq!(motion.last_tile, Vec2::new(40.0, 20.0));
        assert_eq!(motion.next_tile, Vec2::new(20.0, 20.0));
    }

    #[test]
    fn test_reverse_swaps_segment() {
        let mut motion = Motion::at_rest(Vec2::new(40.0, 20.0), 100.0);
        motion.realign(Some(Direction::Right));
        motion.tick(0.05);
        motion.reverse();
        assert_eq!(motion.heading, Some(Direction::Left));
        assert_eq!(motion.next_tile, Vec2::new(40.0, 20.0));
        assert_eq!(motion.last_tile, Vec2::new(60.0, 20.0));
    }

    #[test]
    fn test_wrap_right_edge() {
        let field = PlayField::new(UVec2::new(28, 31));
        let mut motion = Motion::at_rest(Vec2::new(560.0, 280.0), 100.0);
        motion.heading = Some(Direction::Right);
        assert!(motion.wrap(&field));
        assert_eq!(motion.position, Vec2::new(-TILE_SIZE, 280.0));
        assert_eq!(motion.last_tile.x, -TILE_SIZE);
        assert_eq!(motion.next_tile.x, 0.0);
    }

    #[test]
    fn test_wrap_left_edge() {
        let field = PlayField::new(UVec2::new(28, 31));
        let mut motion = Motion::at_rest(Vec2::new(-TILE_SIZE, 280.0), 100.0);
        motion.heading = Some(Direction::Left);
        assert!(motion.wrap(&field));
        assert_eq!(motion.position.x, 560.0);
        assert_eq!(motion.next_tile.x, 540.0);
    }

    #[test]
    fn test_no_wrap_inside() {
        let field = PlayField::new(UVec2::new(28, 31));
        let mut motion = Motion::at_rest(Vec2::new(540.0, 280.0), 100.0);
        assert!(!motion.wrap(&field));
        assert_eq!(motion.position.x, 540.0);
    }
}
