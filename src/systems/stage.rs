use bevy_ecs::{
    event::EventWriter,
    query::{With, Without},
    resource::Resource,
    system::{Query, Res, ResMut, SystemParam},
};
use strum_macros::AsRefStr;
use tracing::{debug, info};

use crate::{
    events::GameEvent,
    systems::{
        components::{CaptureMultiplier, DeltaTime, PlayerControlled, PlayerLives, Pursuer, Spawn, Tuning},
        ghost::{ModeState, Targeting},
        movement::Motion,
        player::Player,
    },
};

/// Why gameplay is frozen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
pub enum PauseReason {
    /// Start of a round or after a respawn.
    Ready,
    PursuerEaten,
    PlayerDying,
    LevelClearing,
}

/// A timed freeze of gameplay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Countdown {
    /// Seconds left
    pub remaining: f32,
    pub reason: PauseReason,
}

impl Countdown {
    pub fn ready(tuning: &Tuning) -> Self {
        Self {
            remaining: tuning.ready_pause,
            reason: PauseReason::Ready,
        }
    }

    pub fn pursuer_eaten(tuning: &Tuning) -> Self {
        Self {
            remaining: tuning.capture_pause,
            reason: PauseReason::PursuerEaten,
        }
    }

    pub fn player_dying(tuning: &Tuning) -> Self {
        Self {
            remaining: tuning.death_pause,
            reason: PauseReason::PlayerDying,
        }
    }

    pub fn level_clearing(tuning: &Tuning) -> Self {
        Self {
            remaining: tuning.level_clear_pause,
            reason: PauseReason::LevelClearing,
        }
    }
}

/// Where the session is in its round lifecycle.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub enum GameStage {
    Countdown(Countdown),
    Playing,
    /// Every counted item is gone; waiting for a new round.
    RoundCleared,
    GameOver,
}

impl GameStage {
    pub fn is_playing(&self) -> bool {
        matches!(self, GameStage::Playing)
    }
}

/// A manual pause, toggled by the player. Freezes countdowns as well as gameplay.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PauseState {
    #[default]
    Inactive,
    Active,
}

impl PauseState {
    pub fn active(&self) -> bool {
        matches!(self, PauseState::Active)
    }

    pub fn toggle(&mut self) {
        *self = match *self {
            PauseState::Active => {
                info!("Game resumed");
                PauseState::Inactive
            }
            PauseState::Inactive => {
                info!("Game paused");
                PauseState::Active
            }
        };
    }
}

/// Run condition for the gameplay systems.
pub fn gameplay_active(stage: Res<GameStage>, pause: Res<PauseState>) -> bool {
    stage.is_playing() && !pause.active()
}

/// Everything that returns to its spawn when the player respawns.
#[derive(SystemParam)]
pub struct RoundEntities<'w, 's> {
    tuning: Res<'w, Tuning>,
    multiplier: ResMut<'w, CaptureMultiplier>,
    players: Query<'w, 's, (&'static mut Player, &'static mut Motion, &'static Spawn), With<PlayerControlled>>,
    pursuers: Query<
        'w,
        's,
        (
            &'static Pursuer,
            &'static mut Motion,
            &'static mut ModeState,
            &'static mut Targeting,
            &'static Spawn,
        ),
        Without<PlayerControlled>,
    >,
}

impl RoundEntities<'_, '_> {
    /// Sends the player and every pursuer back to their spawns with fresh modes and timers.
    ///
    /// Items, score and lives are untouched. The capture multiplier starts over.
    pub fn reset(&mut self) {
        let tuning = *self.tuning;
        for (mut player, mut motion, spawn) in self.players.iter_mut() {
            player.reset();
            motion.reset(spawn.position, tuning.player_speed_px());
        }
        for (pursuer, mut motion, mut state, mut targeting, spawn) in self.pursuers.iter_mut() {
            motion.reset(spawn.position, tuning.pursuer_speed_px());
            state.reset();
            *targeting = Targeting::default();
            debug!(pursuer = pursuer.as_ref(), "Pursuer reset to spawn");
        }
        self.multiplier.0 = 1;
    }

    /// Like [`reset`](Self::reset), but every pursuer's schedule also starts over.
    pub fn restart(&mut self) {
        self.reset();
        let tuning = *self.tuning;
        for (_, _, mut state, _, _) in self.pursuers.iter_mut() {
            *state = ModeState::new(&tuning);
        }
    }
}

/// Runs down the current countdown and decides what follows it.
///
/// A finished death pause either ends the game (no lives left) or respawns everyone
/// behind a fresh ready countdown.
pub fn stage_system(
    delta_time: Res<DeltaTime>,
    pause: Res<PauseState>,
    lives: Res<PlayerLives>,
    mut stage: ResMut<GameStage>,
    mut round: RoundEntities,
    mut events: EventWriter<GameEvent>,
) {
    if pause.active() {
        return;
    }
    let GameStage::Countdown(countdown) = *stage else {
        return;
    };

    let remaining = countdown.remaining - delta_time.seconds;
    if remaining > 0.0 {
        *stage = GameStage::Countdown(Countdown { remaining, ..countdown });
        return;
    }

    let next = match countdown.reason {
        PauseReason::Ready | PauseReason::PursuerEaten => GameStage::Playing,
        PauseReason::PlayerDying if lives.0 < 0 => {
            info!("Game over");
            events.write(GameEvent::GameOver);
            GameStage::GameOver
        }
        PauseReason::PlayerDying => {
            round.reset();
            GameStage::Countdown(Countdown::ready(&round.tuning))
        }
        PauseReason::LevelClearing => GameStage::RoundCleared,
    };
    debug!(reason = countdown.reason.as_ref(), next = ?next, "Countdown finished");
    *stage = next;
}
