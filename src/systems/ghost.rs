use bevy_ecs::{
    bundle::Bundle,
    component::Component,
    event::EventWriter,
    query::With,
    system::{Query, Res, ResMut},
};
use glam::IVec2;
use rand::{seq::IndexedRandom, Rng};
use smallvec::SmallVec;
use strum_macros::AsRefStr;
use tracing::{debug, trace, warn};

use crate::{
    error::{EntityError, GameError},
    map::{
        direction::Direction,
        geometry::{distance_squared, tile_of, tile_to_world, PlayField},
        ObstacleQuery, Obstacles,
    },
    systems::{
        components::{
            CaptureMultiplier, Collider, DeltaTime, GhostCollider, ItemCount, PlayerControlled, Pursuer, SimRng, Spawn,
            StagingTile, TargetStrategy, TickSnapshot, Tuning,
        },
        movement::Motion,
        player::Player,
    },
};

/// A pursuer's behaviour mode. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
pub enum Mode {
    Patrol,
    Pursuit,
    Frightened,
    Captured,
}

/// Countdown for a frightened spell, with the flashing phase at its tail.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrightTimer {
    pub elapsed: f32,
    pub duration: f32,
    /// Elapsed time at which flashing starts.
    pub flash_at: f32,
    flash_elapsed: f32,
    pub flash_on: bool,
}

impl FrightTimer {
    fn start(tuning: &Tuning) -> Self {
        Self {
            elapsed: 0.0,
            duration: tuning.frightened_duration,
            flash_at: tuning.frightened_duration - tuning.flash_lead,
            // Primed so the first flash toggles as soon as flashing begins
            flash_elapsed: tuning.flash_interval,
            flash_on: false,
        }
    }

    /// Returns true once the spell has run out.
    fn tick(&mut self, dt: f32, flash_interval: f32) -> bool {
        self.elapsed += dt;
        if self.elapsed >= self.duration {
            return true;
        }
        if self.elapsed >= self.flash_at {
            self.flash_elapsed += dt;
            if self.flash_elapsed >= flash_interval {
                self.flash_elapsed = 0.0;
                self.flash_on = !self.flash_on;
            }
        }
        false
    }
}

/// Per-pursuer mode machine and patrol/pursuit schedule.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct ModeState {
    pub mode: Mode,
    /// The schedule's phase, either `Patrol` or `Pursuit`; resumed when a frightened spell ends.
    pub scheduled: Mode,
    /// Time spent in the current schedule phase. Paused while frightened or captured.
    pub state_timer: f32,
    pub patrols_begun: u32,
    pub patrol_duration: f32,
    /// Ignores the schedule and pursues permanently.
    pub schedule_exempt: bool,
    pub fright: FrightTimer,
    /// Set until the first direction choice after a spawn or reset; reversal is allowed then.
    pub first_move: bool,
}

impl ModeState {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            mode: Mode::Patrol,
            scheduled: Mode::Patrol,
            state_timer: 0.0,
            patrols_begun: 1,
            patrol_duration: tuning.patrol_duration,
            schedule_exempt: false,
            fright: FrightTimer::default(),
            first_move: true,
        }
    }

    pub fn is_flashing(&self) -> bool {
        self.mode == Mode::Frightened && self.fright.elapsed >= self.fright.flash_at
    }

    /// Enters (or refreshes) the frightened mode after a power pellet.
    ///
    /// Fresh entry reverses the pursuer and slows it down. A pursuer that is already frightened
    /// only gets its countdown reset to full. Captured pursuers are unaffected.
    /// Returns true on a fresh entry.
    pub fn trigger_frightened(&mut self, motion: &mut Motion, tuning: &Tuning) -> bool {
        match self.mode {
            Mode::Captured => false,
            Mode::Frightened => {
                self.fright = FrightTimer::start(tuning);
                false
            }
            Mode::Patrol | Mode::Pursuit => {
                self.mode = Mode::Frightened;
                self.fright = FrightTimer::start(tuning);
                motion.reverse();
                motion.speed = tuning.frightened_speed_px();
                true
            }
        }
    }

    /// Switches a frightened pursuer to captured so it heads back to the staging tile.
    /// Returns false if the pursuer was not frightened.
    pub fn notify_captured(&mut self, motion: &mut Motion, tuning: &Tuning) -> bool {
        if self.mode != Mode::Frightened {
            return false;
        }
        self.mode = Mode::Captured;
        self.fright = FrightTimer::default();
        motion.speed = tuning.captured_speed_px();
        true
    }

    /// Ends a captured run at the staging tile; the pursuer patrols again from a fresh timer.
    pub fn release(&mut self, motion: &mut Motion, tuning: &Tuning) {
        self.mode = Mode::Patrol;
        self.scheduled = Mode::Patrol;
        self.state_timer = 0.0;
        motion.speed = tuning.pursuer_speed_px();
    }

    /// Advances timers for one tick. Returns the `(from, to)` pair if the mode changed.
    pub fn tick(&mut self, dt: f32, motion: &mut Motion, tuning: &Tuning) -> Option<(Mode, Mode)> {
        let before = self.mode;
        match self.mode {
            Mode::Frightened => {
                if self.fright.tick(dt, tuning.flash_interval) {
                    self.mode = self.scheduled;
                    self.fright = FrightTimer::default();
                    motion.speed = tuning.pursuer_speed_px();
                }
            }
            Mode::Captured => {}
            Mode::Patrol | Mode::Pursuit => {
                self.state_timer += dt;
                self.advance_schedule(tuning);
                self.mode = self.scheduled;
            }
        }
        (before != self.mode).then_some((before, self.mode))
    }

    fn advance_schedule(&mut self, tuning: &Tuning) {
        if self.schedule_exempt || self.patrols_begun >= tuning.max_patrols {
            self.scheduled = Mode::Pursuit;
            return;
        }

        match self.scheduled {
            Mode::Patrol if self.state_timer >= self.patrol_duration => {
                self.scheduled = Mode::Pursuit;
                self.state_timer = 0.0;
            }
            Mode::Pursuit if self.state_timer >= tuning.pursuit_duration => {
                self.state_timer = 0.0;
                self.patrols_begun += 1;
                if self.patrols_begun == tuning.shorten_after_patrols {
                    self.patrol_duration -= tuning.patrol_reduction;
                }
                self.scheduled = if self.patrols_begun >= tuning.max_patrols {
                    Mode::Pursuit
                } else {
                    Mode::Patrol
                };
            }
            _ => {}
        }
    }

    /// Returns to the initial mode after a death or a new round. The patrol count is kept.
    pub fn reset(&mut self) {
        self.mode = Mode::Patrol;
        self.scheduled = Mode::Patrol;
        self.state_timer = 0.0;
        self.fright = FrightTimer::default();
        self.first_move = true;
        self.patrols_begun += 1;
    }
}

/// The current target tile, plus the proximity-retreat sub-mode.
#[derive(Component, Debug, Clone, Copy, PartialEq, Default)]
pub struct Targeting {
    pub target: IVec2,
    /// Seconds spent retreating, if a retreat is under way.
    pub retreat: Option<f32>,
}

#[derive(Bundle)]
pub struct GhostBundle {
    pub pursuer: Pursuer,
    pub motion: Motion,
    pub mode: ModeState,
    pub targeting: Targeting,
    pub spawn: Spawn,
    pub collider: Collider,
    pub ghost_collider: GhostCollider,
}

impl TargetStrategy {
    /// The pursuit target for this strategy, from start-of-tick positions.
    pub fn target(self, snapshot: &TickSnapshot) -> IVec2 {
        let facing = snapshot.player_facing.map_or(IVec2::ZERO, |d| d.as_ivec2());
        match self {
            TargetStrategy::DirectChase | TargetStrategy::ProximityRetreat => snapshot.player_tile,
            TargetStrategy::Ambush => snapshot.player_tile + facing * 4,
            TargetStrategy::FlankViaPeer => {
                let pivot = snapshot.player_tile + facing * 2;
                pivot + (pivot - snapshot.blinky_tile)
            }
        }
    }
}

/// Picks the target while in pursuit, running the retreat sub-mode for proximity-retreat pursuers.
fn pursuit_target(pursuer: Pursuer, here: IVec2, targeting: &mut Targeting, snapshot: &TickSnapshot, field: &PlayField, tuning: &Tuning) -> IVec2 {
    let strategy = pursuer.strategy();
    if strategy != TargetStrategy::ProximityRetreat {
        return strategy.target(snapshot);
    }

    let corner = pursuer.home_corner(field.size);
    match targeting.retreat {
        Some(elapsed) if elapsed >= tuning.retreat_duration => {
            trace!(pursuer = pursuer.as_ref(), "Retreat over");
            targeting.retreat = None;
            strategy.target(snapshot)
        }
        Some(_) => corner,
        None if distance_squared(here, snapshot.player_tile) <= tuning.retreat_radius_tiles.pow(2) => {
            trace!(pursuer = pursuer.as_ref(), "Player too close, retreating");
            targeting.retreat = Some(0.0);
            corner
        }
        None => strategy.target(snapshot),
    }
}

/// Directions a pursuer may take from `tile`, in priority order.
pub fn legal_directions(
    obstacles: &dyn ObstacleQuery,
    tile: IVec2,
    heading: Option<Direction>,
    allow_reversal: bool,
) -> SmallVec<[Direction; 4]> {
    let reversal = heading.map(Direction::opposite);
    Direction::PRIORITY
        .iter()
        .copied()
        .filter(|&d| !(d == Direction::Up && obstacles.is_restricted_ascent(tile)))
        .filter(|&d| allow_reversal || Some(d) != reversal)
        .filter(|&d| !obstacles.is_blocked(tile + d.as_ivec2()))
        .collect()
}

/// Of `options`, the one whose destination is closest to `target`; ties keep the earliest option.
pub fn closest_to(tile: IVec2, options: &[Direction], target: IVec2) -> Option<Direction> {
    let mut best: Option<(Direction, i32)> = None;
    for &direction in options {
        let distance = distance_squared(tile + direction.as_ivec2(), target);
        if best.is_none_or(|(_, shortest)| distance < shortest) {
            best = Some((direction, distance));
        }
    }
    best.map(|(direction, _)| direction)
}

/// Runs the direction choice for a pursuer standing on `tile`.
///
/// Without a target (frightened) the choice is uniformly random among the legal directions.
pub fn choose_direction<R: Rng + ?Sized>(
    obstacles: &dyn ObstacleQuery,
    tile: IVec2,
    heading: Option<Direction>,
    first_move: bool,
    target: Option<IVec2>,
    rng: &mut R,
) -> Option<Direction> {
    let options = legal_directions(obstacles, tile, heading, first_move);
    match target {
        Some(target) => closest_to(tile, &options, target),
        None => options.choose(rng).copied(),
    }
}

/// Records the start-of-tick positions that pursuer targeting reads.
pub fn snapshot_system(
    mut snapshot: ResMut<TickSnapshot>,
    players: Query<(&Motion, &Player), With<PlayerControlled>>,
    pursuers: Query<(&Pursuer, &Motion)>,
    mut errors: EventWriter<GameError>,
) {
    let (motion, player) = match players.single() {
        Ok(tuple) => tuple,
        Err(_) => {
            errors.write(EntityError::MissingEntity("player").into());
            return;
        }
    };

    snapshot.player_tile = tile_of(motion.position);
    snapshot.player_facing = player.facing;
    if let Some((_, blinky)) = pursuers.iter().find(|(p, _)| **p == Pursuer::Blinky) {
        snapshot.blinky_tile = tile_of(blinky.position);
    }
}

/// Exempts the direct chaser from the schedule once few items remain.
pub fn schedule_exemption_system(items: Res<ItemCount>, tuning: Res<Tuning>, mut pursuers: Query<(&Pursuer, &mut ModeState)>) {
    if items.remaining >= tuning.exemption_item_threshold {
        return;
    }
    for (pursuer, mut state) in pursuers.iter_mut() {
        if pursuer.strategy() == TargetStrategy::DirectChase && !state.schedule_exempt {
            debug!(pursuer = pursuer.as_ref(), remaining = items.remaining, "Pursuer now ignores the schedule");
            state.schedule_exempt = true;
        }
    }
}

/// Ticks every pursuer's mode machine and releases captured pursuers that made it home.
pub fn ghost_mode_system(
    delta_time: Res<DeltaTime>,
    tuning: Res<Tuning>,
    staging: Res<StagingTile>,
    mut multiplier: ResMut<CaptureMultiplier>,
    mut pursuers: Query<(&Pursuer, &mut Motion, &mut ModeState)>,
) {
    let home = tile_to_world(staging.0);
    for (pursuer, mut motion, mut state) in pursuers.iter_mut() {
        if state.mode == Mode::Captured && motion.position == home {
            state.release(&mut motion, &tuning);
            multiplier.0 = 1;
            debug!(pursuer = pursuer.as_ref(), "Captured pursuer reached the staging tile");
        }

        if let Some((from, to)) = state.tick(delta_time.seconds, &mut motion, &tuning) {
            debug!(pursuer = pursuer.as_ref(), from = from.as_ref(), to = to.as_ref(), "Mode changed");
        }
    }
}

/// Picks a new direction for every pursuer sitting on a tile boundary, then moves all pursuers.
pub fn ghost_steering_system(
    delta_time: Res<DeltaTime>,
    tuning: Res<Tuning>,
    obstacles: Res<Obstacles>,
    field: Res<PlayField>,
    staging: Res<StagingTile>,
    snapshot: Res<TickSnapshot>,
    mut rng: ResMut<SimRng>,
    mut pursuers: Query<(&Pursuer, &mut Motion, &mut ModeState, &mut Targeting)>,
    mut errors: EventWriter<GameError>,
) {
    let mut pursuers: Vec<_> = pursuers.iter_mut().collect();
    pursuers.sort_by_key(|(pursuer, ..)| **pursuer);

    for (pursuer, mut motion, mut state, mut targeting) in pursuers {
        if !motion.between_tiles {
            motion.wrap(&field);
            let here = tile_of(motion.position);

            targeting.target = match state.mode {
                Mode::Patrol => pursuer.home_corner(field.size),
                Mode::Pursuit => pursuit_target(*pursuer, here, &mut targeting, &snapshot, &field, &tuning),
                Mode::Captured => staging.0,
                Mode::Frightened => targeting.target,
            };
            let target = (state.mode != Mode::Frightened).then_some(targeting.target);

            let choice = choose_direction(&**obstacles, here, motion.heading, state.first_move, target, &mut rng.0)
                .or_else(|| {
                    errors.write(
                        EntityError::NoLegalDirection {
                            entity: (*pursuer).into(),
                            tile: here,
                        }
                        .into(),
                    );
                    let back = motion.heading.map(Direction::opposite);
                    back.filter(|d| !obstacles.is_blocked(here + d.as_ivec2()))
                });
            if choice.is_none() {
                warn!(pursuer = pursuer.as_ref(), tile = %here, "Pursuer has nowhere to go");
            }

            state.first_move = false;
            motion.realign(choice);
        }

        motion.tick(delta_time.seconds);

        if let Some(elapsed) = targeting.retreat.as_mut() {
            *elapsed += delta_time.seconds;
        }
    }
}
