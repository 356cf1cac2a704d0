//! The built-in tile maze: walls, restricted-ascent tiles, spawns and item placement.

use bitflags::bitflags;
use glam::{IVec2, UVec2};
use tracing::debug;

use crate::constants::{MapTile, NO_UP_TILES, RAW_BOARD};
use crate::error::{GameResult, MapError};
use crate::map::direction::Direction;
use crate::map::parser::{MapTileParser, SpawnTiles};
use crate::map::ObstacleQuery;

bitflags! {
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TileFlags: u8 {
        const WALL = 1 << 0;
        const NO_UP = 1 << 1;
    }
}

/// A fixed rectangular maze parsed from a character board.
#[derive(Debug, Clone)]
pub struct Maze {
    size: UVec2,
    flags: Vec<TileFlags>,
    spawns: SpawnTiles,
    items: Vec<(IVec2, MapTile)>,
}

impl Maze {
    /// Builds a maze from a raw board and the tiles pursuers may not ascend from.
    ///
    /// # Errors
    ///
    /// Fails if the board does not parse, a spawn marker sits on a wall, a
    /// restricted-ascent tile lies outside the board, or an open tile is a dead end.
    pub fn new(raw_board: &[&str], no_up: &[IVec2]) -> GameResult<Maze> {
        let parsed = MapTileParser::parse_board(raw_board)?;

        let mut flags: Vec<TileFlags> = parsed
            .tiles
            .iter()
            .map(|tile| match tile {
                MapTile::Wall => TileFlags::WALL,
                _ => TileFlags::empty(),
            })
            .collect();

        let mut items = Vec::new();
        for y in 0..parsed.size.y as i32 {
            for x in 0..parsed.size.x as i32 {
                let position = IVec2::new(x, y);
                if let Some(tile @ (MapTile::Pellet | MapTile::PowerPellet)) = parsed.tile(position) {
                    items.push((position, tile));
                }
            }
        }

        for &tile in no_up {
            let index = Self::index(parsed.size, tile)
                .ok_or_else(|| MapError::InvalidConfig(format!("restricted-ascent tile {tile} is outside the board")))?;
            flags[index] |= TileFlags::NO_UP;
        }

        let maze = Maze {
            size: parsed.size,
            flags,
            spawns: parsed.spawns,
            items,
        };

        let spawns = maze.spawns;
        for spawn in [spawns.player, spawns.blinky, spawns.pinky, spawns.inky, spawns.clyde]
            .into_iter()
            .chain(spawns.bonus)
        {
            if maze.is_blocked(spawn) {
                return Err(MapError::BlockedSpawn(spawn).into());
            }
        }
        maze.check_exits()?;

        debug!(width = maze.size.x, height = maze.size.y, items = maze.items.len(), "Maze built");
        Ok(maze)
    }

    /// The built-in arcade layout.
    pub fn classic() -> GameResult<Maze> {
        Self::new(&RAW_BOARD, &NO_UP_TILES)
    }

    pub fn spawns(&self) -> SpawnTiles {
        self.spawns
    }

    /// Every pellet and power pellet placed on the board, in row-major order.
    pub fn items(&self) -> &[(IVec2, MapTile)] {
        &self.items
    }

    fn index(size: UVec2, tile: IVec2) -> Option<usize> {
        if tile.x < 0 || tile.y < 0 || tile.x >= size.x as i32 || tile.y >= size.y as i32 {
            None
        } else {
            Some(tile.y as usize * size.x as usize + tile.x as usize)
        }
    }

    /// Every open tile needs a way out besides the one it was entered by, or a
    /// pursuer that may not reverse has nowhere to go.
    fn check_exits(&self) -> Result<(), MapError> {
        for y in 0..self.size.y as i32 {
            for x in 0..self.size.x as i32 {
                let tile = IVec2::new(x, y);
                if self.is_blocked(tile) {
                    continue;
                }
                let exits = Direction::DIRECTIONS
                    .iter()
                    .filter(|dir| !self.is_blocked(tile + dir.as_ivec2()))
                    .count();
                if exits < 2 {
                    return Err(MapError::DeadEnd(tile));
                }
            }
        }
        Ok(())
    }

    /// Flags for any tile, including the margins beside the board.
    ///
    /// Rows outside the board are solid. Columns outside the board copy the nearest
    /// edge column, so tunnel rows stay open and solid edges stay solid.
    pub fn flags(&self, tile: IVec2) -> TileFlags {
        if tile.y < 0 || tile.y >= self.size.y as i32 {
            return TileFlags::WALL;
        }
        let clamped = IVec2::new(tile.x.clamp(0, self.size.x as i32 - 1), tile.y);
        let flags = Self::index(self.size, clamped).map_or(TileFlags::WALL, |index| self.flags[index]);
        if clamped == tile {
            flags
        } else {
            flags & TileFlags::WALL
        }
    }
}

impl ObstacleQuery for Maze {
    fn is_blocked(&self, tile: IVec2) -> bool {
        self.flags(tile).contains(TileFlags::WALL)
    }

    fn is_restricted_ascent(&self, tile: IVec2) -> bool {
        self.flags(tile).contains(TileFlags::NO_UP)
    }

    fn size(&self) -> UVec2 {
        self.size
    }
}
