use bevy_ecs::{
    bundle::Bundle,
    component::Component,
    event::EventWriter,
    query::With,
    system::{Query, Res},
};
use tracing::{debug, trace};

use crate::{
    error::GameError,
    events::PlayerCommand,
    map::{direction::Direction, geometry::tile_of, geometry::PlayField, Obstacles},
    systems::{
        components::{Collider, DeltaTime, PacmanCollider, PlayerControlled, PlayerInput, Spawn},
        movement::Motion,
    },
};

/// Player-only state layered on top of [`Motion`].
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Player {
    /// The most recent requested direction, retried at every tile boundary until it is taken.
    pub intended: Option<Direction>,
    /// The last direction actually travelled. Survives stops, cleared on respawn.
    pub facing: Option<Direction>,
    pub dying: bool,
    pub level_cleared: bool,
}

impl Player {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Bundle)]
pub struct PlayerBundle {
    pub player: PlayerControlled,
    pub state: Player,
    pub motion: Motion,
    pub spawn: Spawn,
    pub collider: Collider,
    pub pacman_collider: PacmanCollider,
}

/// Applies the tick's player command.
///
/// Reversals take effect immediately, even mid-tile. Any other turn is taken right away
/// only when the player is sitting on a tile centre and the neighbouring tile is open;
/// otherwise it stays buffered until the movement system reaches the next boundary.
pub fn player_control_system(
    input: Res<PlayerInput>,
    obstacles: Res<Obstacles>,
    field: Res<PlayField>,
    mut players: Query<(&mut Player, &mut Motion), With<PlayerControlled>>,
    mut errors: EventWriter<GameError>,
) {
    let Some(command) = input.0 else {
        return;
    };

    let (mut player, mut motion) = match players.single_mut() {
        Ok(tuple) => tuple,
        Err(e) => {
            errors.write(GameError::InvalidState(format!(
                "No/multiple entities queried for player system: {}",
                e
            )));
            return;
        }
    };

    let direction = match command {
        PlayerCommand::Stop => {
            motion.heading = None;
            player.intended = None;
            trace!("Player stopped");
            return;
        }
        PlayerCommand::MovePlayer(direction) => direction,
    };

    player.intended = Some(direction);

    if motion.on_tile() {
        if motion.is_aligned() {
            motion.wrap(&field);
        }
        let destination = tile_of(motion.position) + direction.as_ivec2();
        if obstacles.is_blocked(destination) {
            trace!(direction = direction.as_ref(), "Turn buffered, tile ahead is blocked");
            return;
        }
        motion.realign(Some(direction));
        player.facing = Some(direction);
        return;
    }

    // Mid-tile: only moves along the current segment are possible.
    let segment = motion.next_tile - motion.last_tile;
    let along = direction.as_vec2().dot(segment);
    if along > 0.0 {
        motion.heading = Some(direction);
        player.facing = Some(direction);
    } else if along < 0.0 {
        motion.swap_ends();
        motion.heading = Some(direction);
        player.facing = Some(direction);
    } else {
        trace!(direction = direction.as_ref(), "Turn buffered until the next tile");
    }
}

/// Moves the player one tick along its heading.
///
/// At each tile boundary the player wraps, takes its buffered direction if that tile is open,
/// and stops if the tile ahead turns out to be a wall.
pub fn player_movement_system(
    delta_time: Res<DeltaTime>,
    obstacles: Res<Obstacles>,
    field: Res<PlayField>,
    mut players: Query<(&mut Player, &mut Motion), With<PlayerControlled>>,
) {
    for (mut player, mut motion) in players.iter_mut() {
        if motion.heading.is_none() {
            continue;
        }

        motion.tick(delta_time.seconds);
        if !motion.is_aligned() {
            continue;
        }

        if motion.wrap(&field) {
            debug!(x = motion.position.x, "Player wrapped");
        }

        let here = tile_of(motion.position);
        let heading = match player.intended {
            Some(intended) if !obstacles.is_blocked(here + intended.as_ivec2()) => Some(intended),
            _ => motion.heading,
        };
        motion.realign(heading);
        if heading.is_some() {
            player.facing = heading;
        }

        if obstacles.is_blocked(tile_of(motion.next_tile)) {
            trace!(tile = %here, "Player stopped against a wall");
            motion.halt();
        }
    }
}
