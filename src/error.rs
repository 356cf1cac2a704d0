//! Centralized error types for the simulation core.
//!
//! Gameplay itself has no recoverable errors; these types cover session
//! construction (maze parsing and validation) and invariant violations that
//! systems report through the ECS instead of panicking.

use bevy_ecs::event::Event;
use glam::IVec2;

/// Main error type for the simulation.
#[derive(thiserror::Error, Debug, Event)]
pub enum GameError {
    #[error("Map parsing error: {0}")]
    MapParse(#[from] ParseError),

    #[error("Map error: {0}")]
    Map(#[from] MapError),

    #[error("Entity error: {0}")]
    Entity(#[from] EntityError),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Error type for map parsing operations.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unknown character in board: {0:?} at {1}")]
    UnknownCharacter(char, IVec2),
    #[error("Board row {row} has {found} tiles, expected {expected}")]
    RaggedRow { row: usize, found: usize, expected: usize },
    #[error("Board is empty")]
    EmptyBoard,
    #[error("Spawn marker {0:?} is missing")]
    MissingSpawn(char),
    #[error("Spawn marker {0:?} appears more than once")]
    DuplicateSpawn(char),
}

/// Errors related to obstacle layouts and session configuration.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum MapError {
    #[error("Spawn tile {0} is blocked")]
    BlockedSpawn(IVec2),

    #[error("Tile {0} is a dead end")]
    DeadEnd(IVec2),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Errors related to entity operations.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum EntityError {
    #[error("No legal direction at tile {tile} for {entity}")]
    NoLegalDirection { entity: &'static str, tile: IVec2 },

    #[error("Expected exactly one {0} entity")]
    MissingEntity(&'static str),
}

/// Result type for simulation operations.
pub type GameResult<T> = Result<T, GameError>;
