//! Runs a session headlessly with a random autopilot and logs what happens.
//!
//! `PACMAN_SEED` fixes the randomness, `PACMAN_TICKS` bounds the run and `RUST_LOG` filters output.

use anyhow::{Context, Result};
use pacman_core::constants::LOOP_TIME;
use pacman_core::events::{GameEvent, PlayerCommand};
use pacman_core::formatter::TickFormatter;
use pacman_core::game::{Session, SessionConfig};
use pacman_core::map::direction::Direction;
use pacman_core::map::maze::Maze;
use pacman_core::systems::GameStage;
use rand::rngs::SmallRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use thousands::Separable;
use tracing::{debug, info};
use tracing_error::ErrorLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Ten minutes of simulated play.
const DEFAULT_TICKS: u64 = 36_000;

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(value) => value.parse().with_context(|| format!("{name} is not valid: {value:?}")),
        Err(_) => Ok(default),
    }
}

fn init_tracing() -> Result<()> {
    let subscriber = tracing_subscriber::registry()
        .with(fmt::layer().event_format(TickFormatter))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(ErrorLayer::default());
    tracing::subscriber::set_global_default(subscriber).context("Could not set global default tracing subscriber")
}

fn main() -> Result<()> {
    init_tracing()?;

    let seed: u64 = env_or("PACMAN_SEED", rand::rng().random())?;
    let max_ticks: u64 = env_or("PACMAN_TICKS", DEFAULT_TICKS)?;
    info!(seed, max_ticks, "Starting headless run");

    let maze = Maze::classic().context("Failed to build the maze")?;
    let mut session = Session::new(maze, SessionConfig { seed: Some(seed), ..Default::default() })
        .context("Failed to create session")?;

    let mut autopilot = SmallRng::seed_from_u64(seed.wrapping_add(1));
    let dt = LOOP_TIME.as_secs_f32();
    let mut rounds = 1;

    for tick in 0..max_ticks {
        // Change course roughly twice a second
        let input = autopilot
            .random_bool(1.0 / 30.0)
            .then(|| Direction::DIRECTIONS.choose(&mut autopilot).copied())
            .flatten()
            .map(PlayerCommand::MovePlayer);

        for event in session.advance(dt, input) {
            match event {
                GameEvent::ScoreChanged { .. } => {}
                other => info!(tick, event = ?other, "Game event"),
            }
        }

        match session.stage() {
            GameStage::GameOver => break,
            GameStage::RoundCleared => {
                rounds += 1;
                session.reset_for_new_round().context("Failed to start a new round")?;
                debug!(rounds, "Next round");
            }
            _ => {}
        }
    }

    info!(
        score = session.score().separate_with_commas(),
        lives = session.lives(),
        rounds,
        items_left = session.remaining_items(),
        "Run finished"
    );
    Ok(())
}
