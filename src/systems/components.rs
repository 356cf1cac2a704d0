use bevy_ecs::{component::Component, resource::Resource};
use glam::{IVec2, UVec2, Vec2};
use rand::{rngs::SmallRng, SeedableRng};
use strum_macros::{AsRefStr, EnumIter, IntoStaticStr};

use crate::constants::{self, collider, pause, schedule, score, speed, TILE_SIZE};
use crate::events::PlayerCommand;
use crate::map::direction::Direction;

/// A tag component for the entity controlled by the player.
#[derive(Default, Component, Debug, Clone, Copy)]
pub struct PlayerControlled;

/// Marker components for collision filtering
#[derive(Default, Component, Debug, Clone, Copy)]
pub struct PacmanCollider;

#[derive(Default, Component, Debug, Clone, Copy)]
pub struct GhostCollider;

#[derive(Default, Component, Debug, Clone, Copy)]
pub struct ItemCollider;

/// An axis-aligned square hitbox centred on its entity's tile-sized box.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    pub size: f32,
}

impl Collider {
    /// True if the two hitboxes overlap when their centres are `delta` apart.
    ///
    /// Touching edges do not count as an overlap.
    pub fn overlaps(&self, other: &Collider, delta: Vec2) -> bool {
        let reach = (self.size + other.size) / 2.0;
        delta.x.abs() < reach && delta.y.abs() < reach
    }
}

/// The four pursuers, in the order their decisions are made each tick.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Pursuer {
    Blinky,
    Pinky,
    Inky,
    Clyde,
}

/// How a pursuer picks its target tile while in pursuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
pub enum TargetStrategy {
    /// Head straight for the player.
    DirectChase,
    /// Aim four tiles ahead of where the player is facing.
    Ambush,
    /// Reflect a point two tiles ahead of the player through Blinky's position.
    FlankViaPeer,
    /// Chase directly, but retreat home for a while when the player gets close.
    ProximityRetreat,
}

impl Pursuer {
    pub const ALL: [Pursuer; 4] = [Pursuer::Blinky, Pursuer::Pinky, Pursuer::Inky, Pursuer::Clyde];

    pub const fn strategy(self) -> TargetStrategy {
        match self {
            Pursuer::Blinky => TargetStrategy::DirectChase,
            Pursuer::Pinky => TargetStrategy::Ambush,
            Pursuer::Inky => TargetStrategy::FlankViaPeer,
            Pursuer::Clyde => TargetStrategy::ProximityRetreat,
        }
    }

    /// The corner targeted while patrolling. Corners sit just outside the field.
    pub fn home_corner(self, field: UVec2) -> IVec2 {
        let (width, height) = (field.x as i32, field.y as i32);
        match self {
            Pursuer::Blinky => IVec2::new(width - 3, -1),
            Pursuer::Pinky => IVec2::new(3, -1),
            Pursuer::Inky => IVec2::new(width - 1, height),
            Pursuer::Clyde => IVec2::new(1, height),
        }
    }
}

/// Where an entity returns to when a round restarts.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Spawn {
    pub position: Vec2,
}

/// The tile captured pursuers head back to before patrolling again.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagingTile(pub IVec2);

#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreResource(pub u32);

#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerLives(pub i32);

/// Multiplies the points for each pursuer captured; resets to 1 on death or when a captured pursuer gets home.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureMultiplier(pub u32);

impl Default for CaptureMultiplier {
    fn default() -> Self {
        Self(1)
    }
}

/// Pellets and power pellets still on the board. The bonus item is not counted.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ItemCount {
    pub remaining: u32,
}

#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct DeltaTime {
    /// Floating-point delta time in seconds
    pub seconds: f32,
}

impl DeltaTime {
    pub fn from_seconds(seconds: f32) -> Self {
        Self { seconds }
    }
}

/// The player's command for the current tick, if any.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlayerInput(pub Option<PlayerCommand>);

/// Cross-entity state captured at the start of a tick, before anything moves.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Default)]
pub struct TickSnapshot {
    pub player_tile: IVec2,
    pub player_facing: Option<Direction>,
    pub blinky_tile: IVec2,
}

/// Source of randomness for frightened pursuers.
#[derive(Resource, Debug, Clone)]
pub struct SimRng(pub SmallRng);

impl SimRng {
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self(SmallRng::seed_from_u64(seed)),
            None => Self(SmallRng::from_rng(&mut rand::rng())),
        }
    }
}

/// Every gameplay number that can be tuned without touching the rules.
///
/// Speeds are in tiles per second and durations in seconds.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct Tuning {
    pub player_speed: f32,
    pub pursuer_speed: f32,
    pub frightened_factor: f32,
    pub captured_speed: f32,

    pub patrol_duration: f32,
    pub pursuit_duration: f32,
    pub patrol_reduction: f32,
    pub shorten_after_patrols: u32,
    pub max_patrols: u32,

    pub frightened_duration: f32,
    pub flash_lead: f32,
    pub flash_interval: f32,

    pub retreat_radius_tiles: i32,
    pub retreat_duration: f32,
    pub exemption_item_threshold: u32,

    pub pellet_points: u32,
    pub power_pellet_points: u32,
    pub bonus_points: u32,
    pub capture_points: u32,
    pub bonus_delay: f32,

    pub starting_lives: i32,
    pub ready_pause: f32,
    pub capture_pause: f32,
    pub death_pause: f32,
    pub level_clear_pause: f32,

    pub player_hitbox: f32,
    pub pursuer_hitbox: f32,
    pub item_hitbox: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            player_speed: speed::PLAYER,
            pursuer_speed: speed::PURSUER,
            frightened_factor: speed::FRIGHTENED_FACTOR,
            captured_speed: speed::CAPTURED,

            patrol_duration: schedule::PATROL,
            pursuit_duration: schedule::PURSUIT,
            patrol_reduction: schedule::PATROL_REDUCTION,
            shorten_after_patrols: schedule::SHORTEN_AFTER_PATROLS,
            max_patrols: schedule::MAX_PATROLS,

            frightened_duration: schedule::FRIGHTENED,
            flash_lead: schedule::FRIGHTENED_FLASH_LEAD,
            flash_interval: schedule::FLASH_INTERVAL,

            retreat_radius_tiles: schedule::RETREAT_RADIUS_TILES,
            retreat_duration: schedule::RETREAT_DURATION,
            exemption_item_threshold: schedule::EXEMPTION_ITEM_THRESHOLD,

            pellet_points: score::PELLET,
            power_pellet_points: score::POWER_PELLET,
            bonus_points: score::BONUS,
            capture_points: score::PURSUER_CAPTURED,
            bonus_delay: constants::BONUS_SPAWN_DELAY,

            starting_lives: constants::STARTING_LIVES,
            ready_pause: pause::READY,
            capture_pause: pause::PURSUER_EATEN,
            death_pause: pause::PLAYER_DYING,
            level_clear_pause: pause::LEVEL_CLEARING,

            player_hitbox: collider::PLAYER,
            pursuer_hitbox: collider::PURSUER,
            item_hitbox: collider::ITEM,
        }
    }
}

impl Tuning {
    /// Player speed in world units per second.
    pub fn player_speed_px(&self) -> f32 {
        self.player_speed * TILE_SIZE
    }

    /// Normal pursuer speed in world units per second.
    pub fn pursuer_speed_px(&self) -> f32 {
        self.pursuer_speed * TILE_SIZE
    }

    pub fn frightened_speed_px(&self) -> f32 {
        self.pursuer_speed_px() * self.frightened_factor
    }

    pub fn captured_speed_px(&self) -> f32 {
        self.captured_speed * TILE_SIZE
    }
}
