//! Headless maze-chase simulation core: tile movement, pursuer decisions and collision resolution.

pub mod constants;
pub mod error;
pub mod events;
pub mod formatter;
pub mod game;
pub mod map;
pub mod systems;
