//! Game state and core simulation types
//!
//! One `SimState` per game session. It owns the live bodies exclusively;
//! renderers only ever see a copied [`crate::session::Snapshot`].

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::body::{Body, Bounds};
use super::tier::Tier;
use crate::settings::Settings;

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    Running,
    /// Terminal; the clock never ticks again
    Stopped,
}

/// Why a session stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    /// A settled body stayed above the line for the hold time
    GameOver,
    /// The session time limit ran out
    TimeUp,
    /// Stopped from outside
    Requested,
}

/// Something the presentation layer may want to react to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    ScoreChanged { total: u64 },
    /// Two `tier` bodies fused at `pos` into `result` (`None` for a terminal cap-out)
    Merged {
        tier: Tier,
        result: Option<Tier>,
        pos: Vec2,
    },
    NextDrop { tier: Tier },
    SessionEnded { final_score: u64, reason: EndReason },
}

/// Game-over hysteresis: the condition must hold without a gap for the whole hold time
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameOverMonitor {
    since_ms: Option<f64>,
}

impl GameOverMonitor {
    /// Feed one observation. Returns true once `holding` has been continuously
    /// true for at least `hold_ms`. Any false observation resets the window.
    pub fn observe(&mut self, holding: bool, now_ms: f64, hold_ms: f64) -> bool {
        if !holding {
            self.since_ms = None;
            return false;
        }
        match self.since_ms {
            None => {
                self.since_ms = Some(now_ms);
                hold_ms <= 0.0
            }
            Some(start) => now_ms - start >= hold_ms,
        }
    }

    /// Start of the current window, if one is open
    pub fn since_ms(&self) -> Option<f64> {
        self.since_ms
    }
}

/// Complete simulation state for one session
#[derive(Debug, Clone)]
pub struct SimState {
    pub settings: Settings,
    /// Playfield; `None` until the surface reports a positive size
    pub bounds: Option<Bounds>,
    /// Live bodies in insertion order
    pub bodies: Vec<Body>,
    /// Tier of the upcoming drop
    pub next_drop: Option<Tier>,
    /// Sim time of the last accepted drop
    pub last_drop_ms: Option<f64>,
    pub score: u64,
    pub phase: SessionPhase,
    pub end_reason: Option<EndReason>,
    /// Executed ticks
    pub time_ticks: u64,
    /// Simulated time, advanced by dt on each executed tick
    pub elapsed_ms: f64,
    pub game_over: GameOverMonitor,
    rng: Pcg32,
    events: Vec<GameEvent>,
    next_id: u32,
}

impl SimState {
    /// Create a running session and roll the first drop
    pub fn new(settings: Settings) -> Self {
        let seed = settings.seed.unwrap_or_else(rand::random);
        let mut state = Self {
            settings,
            bounds: None,
            bodies: Vec::new(),
            next_drop: None,
            last_drop_ms: None,
            score: 0,
            phase: SessionPhase::Running,
            end_reason: None,
            time_ticks: 0,
            elapsed_ms: 0.0,
            game_over: GameOverMonitor::default(),
            rng: Pcg32::seed_from_u64(seed),
            events: Vec::new(),
            next_id: 1,
        };
        state.roll_next_drop();
        state
    }

    pub fn is_running(&self) -> bool {
        self.phase == SessionPhase::Running
    }

    /// Update the playfield size. Non-positive sizes pause physics.
    pub fn set_surface(&mut self, width: f32, height: f32) {
        let bounds = Bounds::from_surface(width, height);
        self.bounds = bounds.is_valid().then_some(bounds);
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// The id the next allocation will return
    pub fn peek_next_id(&self) -> u32 {
        self.next_id
    }

    /// Mark every id below `next` as used
    pub fn reserve_ids_until(&mut self, next: u32) {
        self.next_id = self.next_id.max(next);
    }

    /// Add a resting body centered at `pos`
    pub fn spawn_body(&mut self, tier: Tier, pos: Vec2) -> u32 {
        let id = self.next_entity_id();
        self.bodies.push(Body::new(id, tier, pos));
        id
    }

    /// Pick the next drop tier uniformly from the low tiers
    pub fn roll_next_drop(&mut self) -> Tier {
        let range = self.settings.drop_tier_range.max(1);
        let index = self.rng.random_range(0..range);
        let tier = Tier::new(index).unwrap_or(Tier::SMALLEST);
        self.next_drop = Some(tier);
        self.push_event(GameEvent::NextDrop { tier });
        tier
    }

    /// Milliseconds until another drop is allowed (0 when ready)
    pub fn drop_cooldown_remaining_ms(&self) -> f64 {
        match self.last_drop_ms {
            Some(last) => {
                let remaining = self.settings.drop_cooldown_ms as f64 - (self.elapsed_ms - last);
                remaining.max(0.0)
            }
            None => 0.0,
        }
    }

    pub fn can_drop(&self) -> bool {
        self.is_running() && self.next_drop.is_some() && self.drop_cooldown_remaining_ms() <= 0.0
    }

    /// Seconds left before time runs out
    pub fn time_remaining_secs(&self) -> Option<f64> {
        self.settings
            .time_limit_secs
            .map(|limit| (limit as f64 - self.elapsed_ms / 1000.0).max(0.0))
    }

    /// Add points and report the new total
    pub fn add_score(&mut self, points: u64) {
        if points == 0 {
            return;
        }
        self.score += points;
        self.push_event(GameEvent::ScoreChanged { total: self.score });
    }

    /// Transition to `Stopped`. Only the first call has any effect.
    pub fn end(&mut self, reason: EndReason) -> bool {
        if !self.is_running() {
            return false;
        }
        self.phase = SessionPhase::Stopped;
        self.end_reason = Some(reason);
        log::info!("Session ended ({:?}) with score {}", reason, self.score);
        self.push_event(GameEvent::SessionEnded {
            final_score: self.score,
            reason,
        });
        true
    }

    /// True if any body is settled with its top edge above the game-over line
    pub fn settled_above_line(&self) -> bool {
        let line = self.settings.game_over_line_y;
        let settle = self.settings.settle_speed;
        self.bodies.iter().any(|b| {
            b.top() < line && b.vel.x.abs() < settle && b.vel.y.abs() < settle
        })
    }

    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take all events queued since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
