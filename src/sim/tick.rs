//! Fixed timestep simulation tick
//!
//! Each tick: integrate every body, then `resolver_passes` rounds of overlap
//! correction each followed by a merge pass, then the session-end checks.

use super::collision::resolve_all;
use super::merge::merge_pass;
use super::state::{EndReason, GameEvent, SimState};

/// What one tick did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// False when the tick was skipped (stopped, no surface, or bad dt)
    pub ran: bool,
    /// Overlapping pairs corrected across all resolver passes
    pub contacts: usize,
    pub merges: usize,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut SimState, dt: f32) -> TickReport {
    let mut report = TickReport::default();

    if !state.is_running() {
        return report;
    }
    let Some(bounds) = state.bounds else {
        return report;
    };
    if !(dt.is_finite() && dt > 0.0) {
        return report;
    }
    report.ran = true;

    state.time_ticks += 1;
    state.elapsed_ms += dt as f64 * 1000.0;

    for body in state.bodies.iter_mut() {
        body.advance(dt, &bounds, &state.settings);
    }

    for _ in 0..state.settings.resolver_passes {
        report.contacts += resolve_all(&mut state.bodies, state.settings.collision_nudge);
        report.merges += run_merge_pass(state);
    }

    // Game over: something settled above the line for long enough
    let holding = state.settled_above_line();
    let hold_ms = state.settings.game_over_hold_ms as f64;
    if state.game_over.observe(holding, state.elapsed_ms, hold_ms) {
        state.end(EndReason::GameOver);
    }

    let elapsed_ms = state.elapsed_ms;
    let time_up = state
        .settings
        .time_limit_secs
        .is_some_and(|limit| elapsed_ms >= limit as f64 * 1000.0);
    if time_up {
        state.end(EndReason::TimeUp);
    }

    report
}

/// One merge pass over the live bodies; returns the number of merges
fn run_merge_pass(state: &mut SimState) -> usize {
    let factor = state.settings.merge_distance_factor;
    let mut next_id = state.peek_next_id();
    let outcome = merge_pass(&state.bodies, factor, || {
        let id = next_id;
        next_id += 1;
        id
    });
    if outcome.is_empty() {
        return 0;
    }
    state.reserve_ids_until(next_id);

    let merges = outcome.merges.clone();
    let score_delta = outcome.score_delta;
    outcome.apply(&mut state.bodies);

    for merge in &merges {
        log::debug!(
            "Merged tier {} at ({:.1}, {:.1}) for {} points",
            merge.tier.index(),
            merge.pos.x,
            merge.pos.y,
            merge.points
        );
        state.push_event(GameEvent::Merged {
            tier: merge.tier,
            result: merge.result,
            pos: merge.pos,
        });
    }
    state.add_score(score_delta);
    merges.len()
}
