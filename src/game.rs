//! The simulation session: owns the ECS world and schedule and exposes the per-tick boundary.

use bevy_ecs::entity::Entity;
use bevy_ecs::event::{EventRegistry, Events};
use bevy_ecs::schedule::{ExecutorKind, IntoScheduleConfigs, Schedule, SystemSet};
use bevy_ecs::system::RunSystemOnce;
use bevy_ecs::world::World;
use glam::IVec2;
use tracing::{debug, info, warn};

use crate::error::{GameError, GameResult, MapError};
use crate::events::{CollisionEvent, GameEvent, PlayerCommand};
use crate::formatter;
use crate::map::geometry::{tile_to_world, PlayField};
use crate::map::maze::Maze;
use crate::map::{ObstacleQuery, Obstacles};
use crate::systems::{
    bonus_spawn_system, collision_system, gameplay_active, ghost_mode_system, ghost_steering_system, item_system,
    player_control_system, player_movement_system, pursuer_collision_system, schedule_exemption_system, snapshot_system,
    stage_system, BonusTimer, CaptureMultiplier, Collectible, Collider, Countdown, DeltaTime, GameStage, GhostBundle,
    GhostCollider, ItemBundle, ItemCollider, ItemCount, ItemKind, ItemLayout, ModeState, Motion, PacmanCollider,
    PauseState, Player, PlayerBundle, PlayerControlled, PlayerInput, PlayerLives, Pursuer, RoundEntities, ScoreResource,
    SimRng, Spawn, StagingTile, Targeting, TickSnapshot, Tuning,
};

/// Ordering for the per-tick systems.
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
enum GameplaySet {
    /// Countdowns and round transitions; runs even while gameplay is frozen
    Stage,
    /// Movement, collisions and pursuer decisions; only while playing
    Update,
}

/// Options for a new session.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SessionConfig {
    pub tuning: Tuning,
    /// Seeds the frightened-pursuer randomness. `None` draws a seed from the OS.
    pub seed: Option<u64>,
}

/// A read-only copy of the player's state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerView {
    pub motion: Motion,
    pub player: Player,
}

/// A read-only copy of one pursuer's state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PursuerView {
    pub pursuer: Pursuer,
    pub motion: Motion,
    pub state: ModeState,
    pub target: IVec2,
}

/// A running game: one player, four pursuers and the items on a fixed maze.
///
/// The session starts frozen behind a short ready countdown. Call [`Session::advance`]
/// once per frame; it returns the events the frame produced.
pub struct Session {
    world: World,
    schedule: Schedule,
    player: Entity,
    pursuers: [(Pursuer, Entity); 4],
}

impl Session {
    /// Builds a session on `maze`.
    ///
    /// # Errors
    ///
    /// Fails if the tuning is unusable (non-positive speeds or durations).
    pub fn new(maze: Maze, config: SessionConfig) -> GameResult<Session> {
        let tuning = config.tuning;
        validate(&tuning)?;

        let mut world = World::default();
        let mut schedule = Schedule::default();

        EventRegistry::register_event::<GameError>(&mut world);
        EventRegistry::register_event::<GameEvent>(&mut world);
        EventRegistry::register_event::<CollisionEvent>(&mut world);

        let spawns = maze.spawns();
        let layout = ItemLayout {
            items: maze
                .items()
                .iter()
                .filter_map(|&(tile, kind)| ItemKind::from_tile(kind).map(|kind| (tile, kind)))
                .collect(),
            bonus: spawns.bonus,
        };

        world.insert_resource(PlayField::new(maze.size()));
        world.insert_resource(Obstacles::new(maze));
        world.insert_resource(tuning);
        world.insert_resource(DeltaTime::from_seconds(0.0));
        world.insert_resource(PlayerInput::default());
        world.insert_resource(ScoreResource::default());
        world.insert_resource(PlayerLives(tuning.starting_lives));
        world.insert_resource(CaptureMultiplier::default());
        world.insert_resource(ItemCount {
            remaining: layout.count(),
        });
        world.insert_resource(BonusTimer::default());
        world.insert_resource(StagingTile(spawns.blinky));
        world.insert_resource(TickSnapshot::default());
        world.insert_resource(SimRng::new(config.seed));
        world.insert_resource(PauseState::default());
        world.insert_resource(GameStage::Countdown(Countdown::ready(&tuning)));

        let player_position = tile_to_world(spawns.player);
        let player = world
            .spawn(PlayerBundle {
                player: PlayerControlled,
                state: Player::default(),
                motion: Motion::at_rest(player_position, tuning.player_speed_px()),
                spawn: Spawn {
                    position: player_position,
                },
                collider: Collider {
                    size: tuning.player_hitbox,
                },
                pacman_collider: PacmanCollider,
            })
            .id();

        let field = world.resource::<PlayField>().size;
        let pursuers = [
            (Pursuer::Blinky, spawns.blinky),
            (Pursuer::Pinky, spawns.pinky),
            (Pursuer::Inky, spawns.inky),
            (Pursuer::Clyde, spawns.clyde),
        ]
        .map(|(pursuer, tile)| {
            let position = tile_to_world(tile);
            let entity = world
                .spawn(GhostBundle {
                    pursuer,
                    motion: Motion::at_rest(position, tuning.pursuer_speed_px()),
                    mode: ModeState::new(&tuning),
                    targeting: Targeting {
                        target: pursuer.home_corner(field),
                        retreat: None,
                    },
                    spawn: Spawn { position },
                    collider: Collider {
                        size: tuning.pursuer_hitbox,
                    },
                    ghost_collider: GhostCollider,
                })
                .id();
            debug!(pursuer = pursuer.as_ref(), %tile, ?entity, "Pursuer spawned");
            (pursuer, entity)
        });

        Self::spawn_items(&mut world, &layout, &tuning);
        world.insert_resource(layout);

        Self::configure_schedule(&mut schedule);

        info!(
            width = field.x,
            height = field.y,
            items = world.resource::<ItemCount>().remaining,
            "Session created"
        );

        Ok(Session {
            world,
            schedule,
            player,
            pursuers,
        })
    }

    fn configure_schedule(schedule: &mut Schedule) {
        schedule.set_executor_kind(ExecutorKind::SingleThreaded);
        schedule
            .add_systems((
                stage_system.in_set(GameplaySet::Stage),
                (
                    bonus_spawn_system,
                    snapshot_system,
                    player_control_system,
                    player_movement_system,
                    collision_system,
                    item_system,
                    pursuer_collision_system,
                    schedule_exemption_system,
                    ghost_mode_system,
                    ghost_steering_system,
                )
                    .chain()
                    .in_set(GameplaySet::Update),
            ))
            .configure_sets((GameplaySet::Stage, GameplaySet::Update.run_if(gameplay_active)).chain());
    }

    fn spawn_items(world: &mut World, layout: &ItemLayout, tuning: &Tuning) {
        for &(tile, kind) in &layout.items {
            world.spawn(ItemBundle::new(tile, kind, tuning));
        }
        debug!(count = layout.items.len(), "Items spawned");
    }

    /// Runs one tick of `dt` seconds with the player's input for this tick.
    ///
    /// Returns the presentation events produced during the tick, in order.
    pub fn advance(&mut self, dt: f32, input: Option<PlayerCommand>) -> Vec<GameEvent> {
        self.world.insert_resource(DeltaTime::from_seconds(dt));
        self.world.insert_resource(PlayerInput(input));

        self.schedule.run(&mut self.world);
        formatter::increment_tick();

        self.world.resource_mut::<Events<CollisionEvent>>().clear();
        for error in self.world.resource_mut::<Events<GameError>>().drain() {
            warn!(%error, "Simulation invariant violated");
        }
        self.world.resource_mut::<Events<GameEvent>>().drain().collect()
    }

    /// Respawns the player and pursuers after a death, keeping items, score and lives.
    ///
    /// The stage system does this on its own when the death pause ends; this is for
    /// callers driving round transitions themselves.
    pub fn reset_after_death(&mut self) -> GameResult<()> {
        self.world
            .run_system_once(|mut round: RoundEntities| round.reset())
            .map_err(|e| GameError::InvalidState(format!("Failed to reset entities: {e}")))?;
        let tuning = *self.world.resource::<Tuning>();
        self.world.insert_resource(GameStage::Countdown(Countdown::ready(&tuning)));
        info!("Round restarted after death");
        Ok(())
    }

    /// Starts a fresh round on a refilled board. Score and lives carry over.
    pub fn reset_for_new_round(&mut self) -> GameResult<()> {
        self.world
            .run_system_once(|mut round: RoundEntities| round.restart())
            .map_err(|e| GameError::InvalidState(format!("Failed to restart round: {e}")))?;

        let leftovers: Vec<Entity> = self
            .world
            .query_filtered::<Entity, bevy_ecs::query::With<ItemCollider>>()
            .iter(&self.world)
            .collect();
        for entity in leftovers {
            self.world.despawn(entity);
        }

        let tuning = *self.world.resource::<Tuning>();
        let layout = self.world.resource::<ItemLayout>().clone();
        Self::spawn_items(&mut self.world, &layout, &tuning);

        self.world.insert_resource(ItemCount {
            remaining: layout.count(),
        });
        self.world.insert_resource(BonusTimer::default());
        self.world.insert_resource(PauseState::default());
        self.world.insert_resource(GameStage::Countdown(Countdown::ready(&tuning)));
        info!(items = layout.count(), "New round started");
        Ok(())
    }

    /// Toggles the manual pause. Only possible while playing, though an active pause can always be lifted.
    pub fn toggle_pause(&mut self) {
        let playing = self.world.resource::<GameStage>().is_playing();
        let mut pause = self.world.resource_mut::<PauseState>();
        if playing || pause.active() {
            pause.toggle();
        }
    }

    pub fn is_paused(&self) -> bool {
        self.world.resource::<PauseState>().active()
    }

    pub fn score(&self) -> u32 {
        self.world.resource::<ScoreResource>().0
    }

    pub fn lives(&self) -> i32 {
        self.world.resource::<PlayerLives>().0
    }

    pub fn capture_multiplier(&self) -> u32 {
        self.world.resource::<CaptureMultiplier>().0
    }

    pub fn stage(&self) -> GameStage {
        *self.world.resource::<GameStage>()
    }

    /// Pellets and power pellets left on the board.
    pub fn remaining_items(&self) -> u32 {
        self.world.resource::<ItemCount>().remaining
    }

    pub fn obstacles(&self) -> &dyn ObstacleQuery {
        &**self.world.resource::<Obstacles>()
    }

    pub fn player(&self) -> Option<PlayerView> {
        let entity = self.world.get_entity(self.player).ok()?;
        Some(PlayerView {
            motion: *entity.get::<Motion>()?,
            player: *entity.get::<Player>()?,
        })
    }

    pub fn pursuer(&self, pursuer: Pursuer) -> Option<PursuerView> {
        let (_, entity) = self.pursuers.iter().find(|(p, _)| *p == pursuer)?;
        let entity = self.world.get_entity(*entity).ok()?;
        Some(PursuerView {
            pursuer,
            motion: *entity.get::<Motion>()?,
            state: *entity.get::<ModeState>()?,
            target: entity.get::<Targeting>()?.target,
        })
    }

    /// Every pursuer, in decision order.
    pub fn pursuers(&self) -> Vec<PursuerView> {
        self.pursuers.iter().filter_map(|(p, _)| self.pursuer(*p)).collect()
    }

    /// Items currently on the board, the bonus item included.
    pub fn collectibles(&self) -> Vec<Collectible> {
        self.world
            .iter_entities()
            .filter_map(|entity| entity.get::<Collectible>().copied())
            .collect()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Direct world access, for tests and tooling.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}

fn validate(tuning: &Tuning) -> GameResult<()> {
    let speeds = [
        ("player_speed", tuning.player_speed),
        ("pursuer_speed", tuning.pursuer_speed),
        ("frightened_factor", tuning.frightened_factor),
        ("captured_speed", tuning.captured_speed),
    ];
    for (name, value) in speeds {
        if value.is_nan() || value <= 0.0 {
            return Err(MapError::InvalidConfig(format!("{name} must be positive, got {value}")).into());
        }
    }
    if tuning.frightened_duration < tuning.flash_lead || tuning.patrol_duration <= tuning.patrol_reduction {
        return Err(MapError::InvalidConfig("schedule durations are inconsistent".to_string()).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_stopped_player() {
        let tuning = Tuning {
            player_speed: 0.0,
            ..Tuning::default()
        };
        let result = Session::new(Maze::classic().unwrap(), SessionConfig { tuning, seed: None });
        assert!(matches!(result, Err(GameError::Map(MapError::InvalidConfig(_)))));
    }

    #[test]
    fn test_starts_in_ready_countdown() {
        let session = Session::new(Maze::classic().unwrap(), SessionConfig::default()).unwrap();
        assert!(matches!(session.stage(), GameStage::Countdown(Countdown { reason: crate::systems::PauseReason::Ready, .. })));
        assert_eq!(session.lives(), 2);
        assert_eq!(session.pursuers().len(), 4);
        assert_eq!(session.collectibles().len() as u32, session.remaining_items());
    }
}
