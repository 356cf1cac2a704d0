use glam::{IVec2, Vec2};
use strum_macros::AsRefStr;

/// The four cardinal directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// The four cardinal directions.
    /// This is just a convenience constant for iterating over the directions.
    pub const DIRECTIONS: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    /// The order in which pursuers consider directions; earlier entries win distance ties.
    pub const PRIORITY: [Direction; 4] = [Direction::Up, Direction::Left, Direction::Down, Direction::Right];

    /// Returns the opposite direction. Constant time.
    pub const fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Returns the direction as a tile offset.
    pub fn as_ivec2(self) -> IVec2 {
        self.into()
    }

    /// Returns the direction as a unit vector in world space.
    pub fn as_vec2(self) -> Vec2 {
        self.as_ivec2().as_vec2()
    }
}

impl From<Direction> for IVec2 {
    fn from(dir: Direction) -> Self {
        match dir {
            Direction::Up => -IVec2::Y,
            Direction::Down => IVec2::Y,
            Direction::Left => -IVec2::X,
            Direction::Right => IVec2::X,
        }
    }
}

/// Converts an optional heading into the vector the movement engine multiplies by.
pub fn heading_vec(heading: Option<Direction>) -> Vec2 {
    heading.map_or(Vec2::ZERO, Direction::as_vec2)
}
