//! Simulation tuning
//!
//! Every gameplay-feel constant is data, loaded from JSON. Missing fields fall
//! back to the defaults in [`crate::consts`].

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::sim::TIER_COUNT;

/// Errors from loading or validating [`Settings`]
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid setting `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Tunable simulation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Clock ===
    /// Ticks per second; dt is 1 / target_fps
    pub target_fps: u32,

    // === Integrator ===
    pub gravity: f32,
    pub bounce: f32,
    pub bounce_threshold: f32,
    pub angular_damping: f32,
    pub floor_friction: f32,
    pub linear_rest: f32,
    pub angular_rest: f32,

    // === Collisions and merges ===
    /// Resolve + merge rounds per tick
    pub resolver_passes: u32,
    pub collision_nudge: f32,
    pub merge_distance_factor: f32,

    // === Drops ===
    pub drop_cooldown_ms: u32,
    pub drop_tier_range: u8,

    // === Session end ===
    pub game_over_line_y: f32,
    pub settle_speed: f32,
    pub game_over_hold_ms: u32,
    /// `None` plays until game over or an explicit stop
    pub time_limit_secs: Option<u32>,

    /// RNG seed for drop rolls; `None` seeds from the OS
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            target_fps: TARGET_FPS,

            gravity: GRAVITY,
            bounce: BOUNCE,
            bounce_threshold: BOUNCE_THRESHOLD,
            angular_damping: ANGULAR_DAMPING,
            floor_friction: FLOOR_FRICTION,
            linear_rest: LINEAR_REST,
            angular_rest: ANGULAR_REST,

            resolver_passes: RESOLVER_PASSES,
            collision_nudge: COLLISION_NUDGE,
            merge_distance_factor: MERGE_DISTANCE_FACTOR,

            drop_cooldown_ms: DROP_COOLDOWN_MS,
            drop_tier_range: DROP_TIER_RANGE,

            game_over_line_y: GAME_OVER_LINE_Y,
            settle_speed: SETTLE_SPEED,
            game_over_hold_ms: GAME_OVER_HOLD_MS,
            time_limit_secs: Some(TIME_LIMIT_SECS),

            seed: None,
        }
    }
}

impl Settings {
    /// Fixed timestep in seconds
    pub fn dt(&self) -> f32 {
        1.0 / self.target_fps as f32
    }

    /// Frame budget in milliseconds
    pub fn frame_ms(&self) -> f64 {
        1000.0 / self.target_fps as f64
    }

    /// Parse and validate settings from a JSON string
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings ({} Hz)", settings.target_fps);
        Ok(settings)
    }

    /// Load settings, falling back to defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Using default settings ({}): {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Check that every value is in a usable range
    pub fn validate(&self) -> Result<(), SettingsError> {
        fn invalid(field: &'static str, reason: &'static str) -> Result<(), SettingsError> {
            Err(SettingsError::Invalid { field, reason })
        }

        if self.target_fps == 0 {
            return invalid("target_fps", "must be positive");
        }
        if !(self.gravity.is_finite() && self.gravity > 0.0) {
            return invalid("gravity", "must be positive");
        }
        if !(0.0..=1.0).contains(&self.bounce) {
            return invalid("bounce", "must be within 0..=1");
        }
        if !(0.0..=1.0).contains(&self.angular_damping) {
            return invalid("angular_damping", "must be within 0..=1");
        }
        if !(0.0..=1.0).contains(&self.floor_friction) {
            return invalid("floor_friction", "must be within 0..=1");
        }
        let finite = [
            ("bounce_threshold", self.bounce_threshold),
            ("linear_rest", self.linear_rest),
            ("angular_rest", self.angular_rest),
            ("collision_nudge", self.collision_nudge),
            ("game_over_line_y", self.game_over_line_y),
            ("settle_speed", self.settle_speed),
        ];
        for (field, value) in finite {
            if !value.is_finite() {
                return invalid(field, "must be a finite number");
            }
        }
        if self.resolver_passes == 0 {
            return invalid("resolver_passes", "must be at least 1");
        }
        if !(self.merge_distance_factor.is_finite() && self.merge_distance_factor >= 1.0) {
            return invalid("merge_distance_factor", "must be at least 1");
        }
        if self.drop_tier_range == 0 || self.drop_tier_range as usize > TIER_COUNT {
            return invalid("drop_tier_range", "must be within 1..=11");
        }
        if self.time_limit_secs == Some(0) {
            return invalid("time_limit_secs", "must be positive when set");
        }
        Ok(())
    }
}
