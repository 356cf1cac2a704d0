//! Map parsing functionality for converting raw board layouts into structured data.

use glam::{IVec2, UVec2};

use crate::constants::MapTile;
use crate::error::ParseError;

/// The spawn markers found on a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnTiles {
    pub player: IVec2,
    pub blinky: IVec2,
    pub pinky: IVec2,
    pub inky: IVec2,
    pub clyde: IVec2,
    /// Where the bonus item appears; boards without one never spawn it.
    pub bonus: Option<IVec2>,
}

/// Represents the parsed data from a raw board layout.
#[derive(Debug, Clone)]
pub struct ParsedMap {
    /// Board dimensions, in tiles.
    pub size: UVec2,
    /// The parsed tile layout, row-major.
    pub tiles: Vec<MapTile>,
    pub spawns: SpawnTiles,
}

impl ParsedMap {
    pub fn tile(&self, position: IVec2) -> Option<MapTile> {
        if position.x < 0 || position.y < 0 || position.x >= self.size.x as i32 || position.y >= self.size.y as i32 {
            return None;
        }
        self.tiles.get(position.y as usize * self.size.x as usize + position.x as usize).copied()
    }
}

/// Parser for converting raw board layouts into structured map data.
pub struct MapTileParser;

#[derive(Default)]
struct SpawnCollector {
    player: Option<IVec2>,
    blinky: Option<IVec2>,
    pinky: Option<IVec2>,
    inky: Option<IVec2>,
    clyde: Option<IVec2>,
    bonus: Option<IVec2>,
}

impl SpawnCollector {
    fn record(&mut self, marker: char, position: IVec2) -> Result<(), ParseError> {
        let slot = match marker {
            'X' => &mut self.player,
            'B' => &mut self.blinky,
            'P' => &mut self.pinky,
            'I' => &mut self.inky,
            'C' => &mut self.clyde,
            'F' => &mut self.bonus,
            _ => return Ok(()),
        };
        if slot.replace(position).is_some() {
            return Err(ParseError::DuplicateSpawn(marker));
        }
        Ok(())
    }

    fn finish(self) -> Result<SpawnTiles, ParseError> {
        Ok(SpawnTiles {
            player: self.player.ok_or(ParseError::MissingSpawn('X'))?,
            blinky: self.blinky.ok_or(ParseError::MissingSpawn('B'))?,
            pinky: self.pinky.ok_or(ParseError::MissingSpawn('P'))?,
            inky: self.inky.ok_or(ParseError::MissingSpawn('I'))?,
            clyde: self.clyde.ok_or(ParseError::MissingSpawn('C'))?,
            bonus: self.bonus,
        })
    }
}

impl MapTileParser {
    /// Parses a single character into a map tile.
    ///
    /// Spawn markers are empty floor; the house door is a wall.
    pub fn parse_character(c: char, position: IVec2) -> Result<MapTile, ParseError> {
        match c {
            '#' | '=' => Ok(MapTile::Wall),
            '.' => Ok(MapTile::Pellet),
            'o' => Ok(MapTile::PowerPellet),
            ' ' | 'X' | 'B' | 'P' | 'I' | 'C' | 'F' => Ok(MapTile::Empty),
            _ => Err(ParseError::UnknownCharacter(c, position)),
        }
    }

    /// Parses a raw board layout into structured map data.
    ///
    /// # Errors
    ///
    /// Returns an error if the board is empty, its rows differ in length, it contains
    /// unknown characters, or any spawn marker other than the bonus one is missing or duplicated.
    pub fn parse_board(raw_board: &[&str]) -> Result<ParsedMap, ParseError> {
        let width = raw_board.first().map(|row| row.chars().count()).ok_or(ParseError::EmptyBoard)?;
        if width == 0 {
            return Err(ParseError::EmptyBoard);
        }

        let mut tiles = Vec::with_capacity(width * raw_board.len());
        let mut spawns = SpawnCollector::default();

        for (y, line) in raw_board.iter().enumerate() {
            let found = line.chars().count();
            if found != width {
                return Err(ParseError::RaggedRow {
                    row: y,
                    found,
                    expected: width,
                });
            }

            for (x, character) in line.chars().enumerate() {
                let position = IVec2::new(x as i32, y as i32);
                tiles.push(Self::parse_character(character, position)?);
                spawns.record(character, position)?;
            }
        }

        Ok(ParsedMap {
            size: UVec2::new(width as u32, raw_board.len() as u32),
            tiles,
            spawns: spawns.finish()?,
        })
    }
}
