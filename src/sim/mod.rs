//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Time measured in executed ticks, never the wall clock
//! - No threading, rendering or platform dependencies

pub mod body;
pub mod collision;
pub mod drop;
pub mod merge;
pub mod state;
pub mod tick;
pub mod tier;

pub use body::{Body, Bounds};
pub use collision::{circle_contact, resolve_all};
pub use drop::{DropError, request_drop};
pub use merge::{Merge, MergeOutcome, merge_pass, merge_points};
pub use state::{EndReason, GameEvent, GameOverMonitor, SessionPhase, SimState};
pub use tick::{TickReport, tick};
pub use tier::{TIER_COUNT, TIERS, Tier, TierInfo};
