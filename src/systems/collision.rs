use bevy_ecs::entity::Entity;
use bevy_ecs::event::{EventReader, EventWriter};
use bevy_ecs::query::With;
use bevy_ecs::system::{Query, Res, ResMut};
use glam::Vec2;
use tracing::{debug, info};

use crate::constants::TILE_SIZE;
use crate::events::{CollisionEvent, GameEvent};
use crate::map::geometry::tile_to_world;
use crate::systems::components::{
    CaptureMultiplier, Collider, GhostCollider, ItemCollider, PacmanCollider, PlayerLives, Pursuer, ScoreResource, Tuning,
};
use crate::systems::ghost::{Mode, ModeState};
use crate::systems::item::Collectible;
use crate::systems::movement::Motion;
use crate::systems::player::Player;
use crate::systems::stage::{Countdown, GameStage};

/// Centre of a tile-sized box whose top-left corner is `position`.
fn centre(position: Vec2) -> Vec2 {
    position + Vec2::splat(TILE_SIZE / 2.0)
}

/// Detects what the player is touching this tick.
///
/// Items take priority: if the player overlaps any item, only that item is reported
/// (one per tick, lowest row then column) and pursuers are not checked at all.
/// Otherwise every overlapping pursuer is reported in pursuer order.
pub fn collision_system(
    pacman_query: Query<(&Motion, &Collider), With<PacmanCollider>>,
    item_query: Query<(Entity, &Collectible, &Collider), With<ItemCollider>>,
    ghost_query: Query<(Entity, &Pursuer, &Motion, &Collider), With<GhostCollider>>,
    mut events: EventWriter<CollisionEvent>,
) {
    for (pacman_motion, pacman_collider) in pacman_query.iter() {
        let pacman_centre = centre(pacman_motion.position);

        let item = item_query
            .iter()
            .filter(|(_, item, collider)| {
                pacman_collider.overlaps(collider, centre(tile_to_world(item.tile)) - pacman_centre)
            })
            .min_by_key(|(_, item, _)| (item.tile.y, item.tile.x));
        if let Some((entity, _, _)) = item {
            events.write(CollisionEvent::Item(entity));
            continue;
        }

        let mut touching: Vec<_> = ghost_query
            .iter()
            .filter(|(_, _, motion, collider)| pacman_collider.overlaps(collider, centre(motion.position) - pacman_centre))
            .map(|(entity, pursuer, _, _)| (*pursuer, entity))
            .collect();
        touching.sort();
        for (_, entity) in touching {
            events.write(CollisionEvent::Pursuer(entity));
        }
    }
}

/// Resolves contact with pursuers: frightened ones are captured, any other live one kills the player.
#[allow(clippy::too_many_arguments)]
pub fn pursuer_collision_system(
    mut collisions: EventReader<CollisionEvent>,
    tuning: Res<Tuning>,
    mut stage: ResMut<GameStage>,
    mut score: ResMut<ScoreResource>,
    mut lives: ResMut<PlayerLives>,
    mut multiplier: ResMut<CaptureMultiplier>,
    mut players: Query<&mut Player>,
    mut pursuers: Query<(&Pursuer, &mut Motion, &mut ModeState)>,
    mut events: EventWriter<GameEvent>,
) {
    let touched: Vec<Entity> = collisions
        .read()
        .filter_map(|collision| match *collision {
            CollisionEvent::Pursuer(entity) => Some(entity),
            CollisionEvent::Item(_) => None,
        })
        .collect();

    for entity in touched {
        let Ok((pursuer, mut motion, mut state)) = pursuers.get_mut(entity) else {
            continue;
        };

        match state.mode {
            Mode::Frightened => {
                let points = tuning.capture_points * multiplier.0;
                state.notify_captured(&mut motion, &tuning);
                score.0 += points;
                multiplier.0 += 1;
                *stage = GameStage::Countdown(Countdown::pursuer_eaten(&tuning));

                debug!(pursuer = pursuer.as_ref(), points, multiplier = multiplier.0, "Pursuer captured");
                events.write(GameEvent::PursuerCaptured {
                    pursuer: *pursuer,
                    points,
                });
                events.write(GameEvent::ScoreChanged { score: score.0 });
            }
            Mode::Patrol | Mode::Pursuit => {
                lives.0 -= 1;
                score.0 /= 2;
                for mut player in players.iter_mut() {
                    player.dying = true;
                }
                *stage = GameStage::Countdown(Countdown::player_dying(&tuning));

                info!(pursuer = pursuer.as_ref(), lives = lives.0, score = score.0, "Player caught");
                events.write(GameEvent::LifeLost {
                    lives_remaining: lives.0,
                });
                events.write(GameEvent::DeathAnimationStart);
                events.write(GameEvent::ScoreChanged { score: score.0 });
                // One death per tick
                break;
            }
            Mode::Captured => {}
        }
    }
}
