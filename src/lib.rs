//! Fuse Drop - falling-ball merge game core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (integrator, collisions, merges, game state)
//! - `session`: Fixed-rate simulation thread, published snapshots, listener callbacks
//! - `settings`: Data-driven tuning constants
//!
//! Rendering, audio, asset loading and score persistence live outside this
//! crate. They read [`session::Snapshot`]s and implement [`session::SessionListener`].

pub mod session;
pub mod settings;
pub mod sim;

pub use session::{Session, SessionError, SessionListener, Snapshot};
pub use settings::{Settings, SettingsError};

/// Default tuning constants
pub mod consts {
    /// Simulation rate (ticks per second)
    pub const TARGET_FPS: u32 = 75;

    /// Downward acceleration (units/s²)
    pub const GRAVITY: f32 = 300.0;
    /// Restitution on floor and wall hits
    pub const BOUNCE: f32 = 0.10;
    /// Vertical speed above which a floor hit bounces instead of stopping
    pub const BOUNCE_THRESHOLD: f32 = 2.0;
    /// Per-tick angular velocity multiplier
    pub const ANGULAR_DAMPING: f32 = 0.98;
    /// Per-tick multiplier on vx and angular velocity while touching the floor
    pub const FLOOR_FRICTION: f32 = 0.94;
    /// Linear speeds below this snap to zero
    pub const LINEAR_REST: f32 = 0.1;
    /// Angular speeds below this snap to zero
    pub const ANGULAR_REST: f32 = 0.01;

    /// Overlap correction passes per tick (each followed by a merge pass)
    pub const RESOLVER_PASSES: u32 = 3;
    /// Horizontal velocity nudge applied to overlapping pairs
    pub const COLLISION_NUDGE: f32 = 0.2;
    /// Same-tier bodies merge when closer than this multiple of their combined radii
    pub const MERGE_DISTANCE_FACTOR: f32 = 1.02;

    /// Minimum time between two accepted drops
    pub const DROP_COOLDOWN_MS: u32 = 500;
    /// Drops are rolled uniformly from the first N tiers
    pub const DROP_TIER_RANGE: u8 = 3;

    /// Bodies whose top edge is above this line count toward game over
    pub const GAME_OVER_LINE_Y: f32 = 50.0;
    /// Both |vx| and |vy| must be below this for a body to count as settled
    pub const SETTLE_SPEED: f32 = 0.5;
    /// How long the game-over condition must hold continuously
    pub const GAME_OVER_HOLD_MS: u32 = 2000;
    /// Session length before time runs out
    pub const TIME_LIMIT_SECS: u32 = 300;
}
