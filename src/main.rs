//! Fuse Drop headless runner
//!
//! Starts a session on a fixed playfield and lets a bot drop balls at random
//! positions until the game ends. Prints the final frame as JSON.
//!
//! Usage: `fuse-drop [settings.json]`

use std::time::{Duration, Instant};

use glam::Vec2;
use rand::Rng;

use fuse_drop::sim::{EndReason, Tier};
use fuse_drop::{Session, SessionListener, Settings};

const PLAYFIELD_WIDTH: f32 = 480.0;
const PLAYFIELD_HEIGHT: f32 = 720.0;
/// Hard stop for the bot, in wall-clock seconds
const MAX_RUN_SECS: u64 = 600;

/// Logs what a presentation layer would show
struct LogListener;

impl SessionListener for LogListener {
    fn on_score_changed(&mut self, total: u64) {
        log::info!("Score: {}", total);
    }

    fn on_session_ended(&mut self, final_score: u64, reason: EndReason) {
        log::info!("Game over ({:?}), final score {}", reason, final_score);
    }

    fn on_merge(&mut self, tier: Tier, result: Option<Tier>, pos: Vec2) {
        match result {
            Some(next) => log::debug!(
                "Tier {} -> {} at ({:.0}, {:.0})",
                tier.index(),
                next.index(),
                pos.x,
                pos.y
            ),
            None => log::info!("Top tier capped out at ({:.0}, {:.0})", pos.x, pos.y),
        }
    }

    fn on_next_drop(&mut self, tier: Tier) {
        log::debug!("Next drop: tier {}", tier.index());
    }
}

fn main() {
    env_logger::init();
    log::info!("Fuse Drop (headless) starting...");

    let settings = match std::env::args().nth(1) {
        Some(path) => Settings::load_or_default(path),
        None => Settings::default(),
    };

    let mut session = match Session::start(settings, Box::new(LogListener)) {
        Ok(session) => session,
        Err(e) => {
            log::error!("Could not start session: {}", e);
            std::process::exit(1);
        }
    };
    session.set_surface_bounds(PLAYFIELD_WIDTH, PLAYFIELD_HEIGHT);

    let mut rng = rand::rng();
    let started = Instant::now();
    let deadline = Duration::from_secs(MAX_RUN_SECS);
    while session.is_running() && started.elapsed() < deadline {
        if session.snapshot().can_drop {
            let x = rng.random_range(0.0..PLAYFIELD_WIDTH);
            if let Err(e) = session.request_drop(x) {
                log::trace!("Bot drop skipped: {}", e);
            }
        }
        std::thread::sleep(Duration::from_millis(rng.random_range(100..400)));
    }
    session.stop();

    let snapshot = session.snapshot();
    match serde_json::to_string_pretty(snapshot.as_ref()) {
        Ok(json) => println!("{json}"),
        Err(e) => log::error!("Could not serialize final frame: {}", e),
    }
}
