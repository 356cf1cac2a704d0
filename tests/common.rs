#![allow(dead_code)]

use bevy_ecs::{
    entity::Entity,
    event::Events,
    system::{IntoSystem, RunSystemOnce},
    world::World,
};
use glam::{IVec2, Vec2};
use pacman_core::{
    error::GameError,
    events::{CollisionEvent, GameEvent, PlayerCommand},
    map::{
        direction::Direction,
        geometry::{tile_to_world, PlayField},
        maze::Maze,
        ObstacleQuery, Obstacles,
    },
    systems::{
        BonusTimer, CaptureMultiplier, Collider, DeltaTime, GameStage, GhostBundle, GhostCollider, ItemBundle, ItemCount,
        ItemKind, ItemLayout, Mode, ModeState, Motion, PacmanCollider, PauseState, Player, PlayerBundle, PlayerControlled,
        PlayerInput, PlayerLives, Pursuer, ScoreResource, SimRng, Spawn, StagingTile, Targeting, TickSnapshot, Tuning,
    },
};

/// A tick length that keeps every step exactly representable.
pub const DT: f32 = 1.0 / 64.0;

/// Ticks the player needs to cross one tile at the default speed and [`DT`].
pub const TICKS_PER_TILE: usize = 11;

pub const TEST_SEED: u64 = 0x5eed;

/// Two corridors joined by three columns.
///
/// ```text
///   012345678
/// 0 #########
/// 1 #XBPIC  #
/// 2 #.##.##.#
/// 3 #.......#
/// 4 #########
/// ```
pub const CORRIDOR_BOARD: [&str; 5] = ["#########", "#XBPIC  #", "#.##.##.#", "#.......#", "#########"];

/// A single open row running off both edges.
pub const TUNNEL_BOARD: [&str; 4] = ["#########", "#XBPIC  #", "         ", "#########"];

/// A walled rectangle with nothing inside.
pub fn open_board(width: usize, height: usize) -> Vec<String> {
    (0..height)
        .map(|y| {
            if y == 0 || y == height - 1 {
                "#".repeat(width)
            } else if y == 1 {
                format!("#XBPIC{}#", " ".repeat(width - 7))
            } else {
                format!("#{}#", " ".repeat(width - 2))
            }
        })
        .collect()
}

pub fn open_maze(width: usize, height: usize, no_up: &[IVec2]) -> Maze {
    let rows = open_board(width, height);
    let board: Vec<&str> = rows.iter().map(String::as_str).collect();
    Maze::new(&board, no_up).expect("Failed to create open maze")
}

/// Creates a basic test world on the classic board, already playing.
pub fn create_test_world() -> World {
    create_test_world_with(Maze::classic().expect("Failed to create classic maze"))
}

/// Creates a test world on `maze` with every resource the gameplay systems read.
pub fn create_test_world_with(maze: Maze) -> World {
    let mut world = World::new();
    let tuning = Tuning::default();

    world.insert_resource(Events::<GameEvent>::default());
    world.insert_resource(Events::<GameError>::default());
    world.insert_resource(Events::<CollisionEvent>::default());

    world.insert_resource(StagingTile(maze.spawns().blinky));
    world.insert_resource(ItemCount {
        remaining: maze.items().len() as u32,
    });
    world.insert_resource(ItemLayout {
        items: Vec::new(),
        bonus: maze.spawns().bonus,
    });
    world.insert_resource(PlayField::new(maze.size()));
    world.insert_resource(Obstacles::new(maze));

    world.insert_resource(tuning);
    world.insert_resource(DeltaTime::from_seconds(DT));
    world.insert_resource(PlayerInput::default());
    world.insert_resource(ScoreResource(0));
    world.insert_resource(PlayerLives(tuning.starting_lives));
    world.insert_resource(CaptureMultiplier::default());
    world.insert_resource(BonusTimer::default());
    world.insert_resource(TickSnapshot::default());
    world.insert_resource(SimRng::new(Some(TEST_SEED)));
    world.insert_resource(PauseState::default());
    world.insert_resource(GameStage::Playing);

    world
}

/// Spawns a controllable player at rest on `tile`.
pub fn spawn_test_player(world: &mut World, tile: IVec2) -> Entity {
    let tuning = *world.resource::<Tuning>();
    let position = tile_to_world(tile);
    world
        .spawn(PlayerBundle {
            player: PlayerControlled,
            state: Player::default(),
            motion: Motion::at_rest(position, tuning.player_speed_px()),
            spawn: Spawn { position },
            collider: Collider {
                size: tuning.player_hitbox,
            },
            pacman_collider: PacmanCollider,
        })
        .id()
}

/// Spawns a pursuer at rest on `tile`, already in `mode`.
pub fn spawn_test_pursuer(world: &mut World, pursuer: Pursuer, tile: IVec2, mode: Mode) -> Entity {
    let tuning = *world.resource::<Tuning>();
    let position = tile_to_world(tile);
    let mut motion = Motion::at_rest(position, tuning.pursuer_speed_px());
    let mut state = ModeState::new(&tuning);
    match mode {
        Mode::Patrol => {}
        Mode::Pursuit => {
            state.mode = Mode::Pursuit;
            state.scheduled = Mode::Pursuit;
        }
        Mode::Frightened => {
            state.trigger_frightened(&mut motion, &tuning);
        }
        Mode::Captured => {
            state.trigger_frightened(&mut motion, &tuning);
            state.notify_captured(&mut motion, &tuning);
        }
    }

    world
        .spawn(GhostBundle {
            pursuer,
            motion,
            mode: state,
            targeting: Targeting::default(),
            spawn: Spawn { position },
            collider: Collider {
                size: tuning.pursuer_hitbox,
            },
            ghost_collider: GhostCollider,
        })
        .id()
}

/// Spawns a test item entity on `tile`
pub fn spawn_test_item(world: &mut World, tile: IVec2, kind: ItemKind) -> Entity {
    let tuning = *world.resource::<Tuning>();
    world.spawn(ItemBundle::new(tile, kind, &tuning)).id()
}

/// Sets the player's command for the next run of the control system.
pub fn set_input(world: &mut World, command: Option<PlayerCommand>) {
    world.insert_resource(PlayerInput(command));
}

/// Sets a heading as if the entity had just picked it on its current tile.
pub fn start_moving(world: &mut World, entity: Entity, direction: Direction) {
    let mut motion = world.get_mut::<Motion>(entity).expect("Entity should have motion");
    motion.realign(Some(direction));
}

pub fn motion(world: &World, entity: Entity) -> Motion {
    *world.get::<Motion>(entity).expect("Entity should have motion")
}

pub fn mode_state(world: &World, entity: Entity) -> ModeState {
    *world.get::<ModeState>(entity).expect("Entity should have a mode state")
}

pub fn world_pos(tile: IVec2) -> Vec2 {
    tile_to_world(tile)
}

/// Runs `system` `times` times in a row.
pub fn run_repeatedly<S, M>(world: &mut World, system: S, times: usize)
where
    S: IntoSystem<(), (), M> + Copy,
{
    for _ in 0..times {
        world.run_system_once(system).expect("System should run successfully");
    }
}

/// Sends a collision event to the world
pub fn send_collision_event(world: &mut World, event: CollisionEvent) {
    let mut events = world.resource_mut::<Events<CollisionEvent>>();
    events.send(event);
}

/// Removes and returns every game event written so far.
pub fn drain_game_events(world: &mut World) -> Vec<GameEvent> {
    world.resource_mut::<Events<GameEvent>>().drain().collect()
}

/// Removes and returns every error reported so far.
pub fn drain_errors(world: &mut World) -> Vec<GameError> {
    world.resource_mut::<Events<GameError>>().drain().collect()
}

/// An obstacle query where only the listed tiles are open, with no layout checks.
pub struct OpenTiles {
    pub open: Vec<IVec2>,
    pub size: glam::UVec2,
}

impl ObstacleQuery for OpenTiles {
    fn is_blocked(&self, tile: IVec2) -> bool {
        !self.open.contains(&tile)
    }

    fn size(&self) -> glam::UVec2 {
        self.size
    }
}
