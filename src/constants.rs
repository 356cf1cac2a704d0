//! This module contains all the constants used in the simulation.

use std::time::Duration;

use glam::{IVec2, UVec2};

pub const LOOP_TIME: Duration = Duration::from_nanos((1_000_000_000.0 / 60.0) as u64);

/// The size of each tile, in world units.
pub const TILE_SIZE: f32 = 20.0;
/// The size of the built-in board, in tiles.
pub const BOARD_CELL_SIZE: UVec2 = UVec2::new(28, 31);

/// Movement speeds, in tiles per second.
pub mod speed {
    pub const PLAYER: f32 = 6.0;
    pub const PURSUER: f32 = 5.9;
    /// Frightened pursuers move at this fraction of their normal speed.
    pub const FRIGHTENED_FACTOR: f32 = 0.5;
    pub const CAPTURED: f32 = 10.1;
}

/// Durations of the pursuer mode machine, in seconds.
pub mod schedule {
    pub const PATROL: f32 = 7.0;
    pub const PURSUIT: f32 = 20.0;
    /// Patrol is shortened by this much once `SHORTEN_AFTER_PATROLS` patrols have begun.
    pub const PATROL_REDUCTION: f32 = 2.0;
    pub const SHORTEN_AFTER_PATROLS: u32 = 3;
    /// After this many patrols have begun, pursuers never patrol again.
    pub const MAX_PATROLS: u32 = 5;

    pub const FRIGHTENED: f32 = 10.0;
    /// Flashing covers the tail end of the frightened countdown.
    pub const FRIGHTENED_FLASH_LEAD: f32 = 3.0;
    pub const FLASH_INTERVAL: f32 = 0.25;

    /// The proximity-retreat variant flees when the player is within this many tiles.
    pub const RETREAT_RADIUS_TILES: i32 = 8;
    pub const RETREAT_DURATION: f32 = 2.0;

    /// The direct chaser ignores the patrol schedule once fewer items than this remain.
    pub const EXEMPTION_ITEM_THRESHOLD: u32 = 30;
}

/// Points awarded for each collectible or capture.
pub mod score {
    pub const PELLET: u32 = 1;
    pub const POWER_PELLET: u32 = 10;
    pub const BONUS: u32 = 2500;
    pub const PURSUER_CAPTURED: u32 = 200;
}

/// Countdown lengths that freeze gameplay, in seconds.
pub mod pause {
    pub const READY: f32 = 1.5;
    pub const PURSUER_EATEN: f32 = 0.5;
    pub const PLAYER_DYING: f32 = 5.0;
    pub const LEVEL_CLEARING: f32 = 5.0;
}

/// Hitbox edge lengths, in world units.
pub mod collider {
    pub const PLAYER: f32 = 8.0;
    pub const PURSUER: f32 = 8.0;
    pub const ITEM: f32 = 5.0;
}

pub const STARTING_LIVES: i32 = 2;
/// Seconds of unpaused play before the bonus item appears.
pub const BONUS_SPAWN_DELAY: f32 = 60.0;

/// Tiles from which pursuers may never choose to move up.
pub const NO_UP_TILES: [IVec2; 4] = [
    IVec2::new(12, 11),
    IVec2::new(15, 11),
    IVec2::new(12, 23),
    IVec2::new(15, 23),
];

/// An enum representing the different types of tiles on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapTile {
    /// An empty tile.
    Empty,
    /// A wall tile.
    Wall,
    /// A regular pellet.
    Pellet,
    /// A power pellet.
    PowerPellet,
}

/// The raw layout of the game board, as a 2D array of characters.
///
/// `X` marks the player spawn, `B`/`P`/`I`/`C` the four pursuers and `F` the bonus item.
pub const RAW_BOARD: [&str; BOARD_CELL_SIZE.y as usize] = [
    "############################",
    "#............##............#",
    "#.####.#####.##.#####.####.#",
    "#o####.#####.##.#####.####o#",
    "#.####.#####.##.#####.####.#",
    "#..........................#",
    "#.####.##.########.##.####.#",
    "#.####.##.########.##.####.#",
    "#......##....##....##......#",
    "######.##### ## #####.######",
    "     #.##### ## #####.#     ",
    "     #.## I  BP  C ##.#     ",
    "     #.## ###==### ##.#     ",
    "######.## #      # ##.######",
    "      .   #      #   .      ",
    "######.## #      # ##.######",
    "     #.## ######## ##.#     ",
    "     #.##    F     ##.#     ",
    "     #.## ######## ##.#     ",
    "######.## ######## ##.######",
    "#............##............#",
    "#.####.#####.##.#####.####.#",
    "#.####.#####.##.#####.####.#",
    "#o..##.......X .......##..o#",
    "###.##.##.########.##.##.###",
    "###.##.##.########.##.##.###",
    "#......##....##....##......#",
    "#.##########.##.##########.#",
    "#.##########.##.##########.#",
    "#..........................#",
    "############################",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loop_time() {
        // 60 FPS = 16.67ms per frame
        let expected_nanos = (1_000_000_000.0 / 60.0) as u64;
        assert_eq!(LOOP_TIME.as_nanos() as u64, expected_nanos);
    }

    #[test]
    fn test_raw_board_dimensions() {
        assert_eq!(RAW_BOARD.len(), BOARD_CELL_SIZE.y as usize);
        for row in RAW_BOARD {
            assert_eq!(row.chars().count(), BOARD_CELL_SIZE.x as usize, "row {row:?}");
        }
    }

    #[test]
    fn test_frightened_is_slower() {
        assert!(speed::PURSUER * speed::FRIGHTENED_FACTOR < speed::PLAYER);
        assert!(speed::CAPTURED > speed::PLAYER);
    }

    #[test]
    fn test_no_up_tiles_are_open() {
        for tile in NO_UP_TILES {
            let row = RAW_BOARD[tile.y as usize];
            let c = row.chars().nth(tile.x as usize).unwrap();
            assert_ne!(c, '#', "no-up tile {tile} sits in a wall");
        }
    }
}
