use bevy_ecs::prelude::*;

use crate::map::direction::Direction;
use crate::systems::components::Pursuer;

/// Player input for a single tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerCommand {
    MovePlayer(Direction),
    Stop,
}

/// Observable outcomes of a tick, drained by whoever presents the game.
#[derive(Event, Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameEvent {
    ScoreChanged { score: u32 },
    LifeLost { lives_remaining: i32 },
    LevelCleared,
    GameOver,
    DeathAnimationStart,
    PursuerCaptured { pursuer: Pursuer, points: u32 },
    PowerPelletEaten,
    BonusSpawned,
    BonusEaten { points: u32 },
}

/// An overlap between the player and another entity, found by collision detection.
#[derive(Event, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollisionEvent {
    Item(Entity),
    Pursuer(Entity),
}
