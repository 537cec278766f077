//! Player drops
//!
//! A drop spawns the pending tier at the top of the playfield, rolls the
//! next tier, and starts the cooldown. The cooldown is measured against
//! simulated time, so it expires as the clock ticks with no timer of its own.

use glam::Vec2;
use thiserror::Error;

use super::body::Bounds;
use super::state::SimState;
use super::tier::Tier;

/// Why a drop request was ignored
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum DropError {
    #[error("session has stopped")]
    SessionStopped,
    #[error("playfield has no size yet")]
    NoSurface,
    #[error("no drop tier pending")]
    NoPendingTier,
    #[error("drop cooling down ({remaining_ms:.0} ms left)")]
    CoolingDown { remaining_ms: f64 },
}

/// Try to drop the pending tier at `pointer_x`. Returns the new body's id.
pub fn request_drop(state: &mut SimState, pointer_x: f32) -> Result<u32, DropError> {
    let (bounds, tier) = match drop_target(state) {
        Ok(target) => target,
        Err(e) => {
            log::trace!("Drop rejected: {}", e);
            return Err(e);
        }
    };

    let r = tier.radius();
    // A playfield narrower than the ball pins it to the left edge
    let x = pointer_x.min(bounds.right - r).max(bounds.left + r);
    let id = state.spawn_body(tier, Vec2::new(x, r));
    log::debug!("Dropped tier {} at x={:.1}", tier.index(), x);

    state.roll_next_drop();
    state.last_drop_ms = Some(state.elapsed_ms);
    Ok(id)
}

/// Playfield and tier for a drop, or why none is allowed right now
fn drop_target(state: &SimState) -> Result<(Bounds, Tier), DropError> {
    if !state.is_running() {
        return Err(DropError::SessionStopped);
    }
    let bounds = state.bounds.ok_or(DropError::NoSurface)?;
    let tier = state.next_drop.ok_or(DropError::NoPendingTier)?;
    let remaining_ms = state.drop_cooldown_remaining_ms();
    if remaining_ms > 0.0 {
        return Err(DropError::CoolingDown { remaining_ms });
    }
    Ok((bounds, tier))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::{GameEvent, tick};
    use std::cell::RefCell;
    use std::sync::Once;

    thread_local! {
        static CAPTURED: RefCell<Vec<(log::Level, String)>> = const { RefCell::new(Vec::new()) };
    }

    /// Records this thread's log lines so parallel tests do not see each other's
    struct CaptureLogger;

    impl log::Log for CaptureLogger {
        fn enabled(&self, _metadata: &log::Metadata<'_>) -> bool {
            true
        }

        fn log(&self, record: &log::Record<'_>) {
            CAPTURED.with(|c| {
                c.borrow_mut()
                    .push((record.level(), record.args().to_string()))
            });
        }

        fn flush(&self) {}
    }

    fn capture_logs() {
        static INIT: Once = Once::new();
        INIT.call_once(|| {
            if log::set_boxed_logger(Box::new(CaptureLogger)).is_ok() {
                log::set_max_level(log::LevelFilter::Trace);
            }
        });
        CAPTURED.with(|c| c.borrow_mut().clear());
    }

    fn captured_traces() -> Vec<String> {
        CAPTURED.with(|c| {
            c.borrow()
                .iter()
                .filter(|(level, _)| *level == log::Level::Trace)
                .map(|(_, msg)| msg.clone())
                .collect()
        })
    }

    fn ready_state() -> SimState {
        let mut state = SimState::new(Settings {
            seed: Some(7),
            ..Default::default()
        });
        state.set_surface(400.0, 600.0);
        state.drain_events();
        state
    }

    #[test]
    fn test_drop_spawns_pending_tier_at_top() {
        let mut state = ready_state();
        let tier = state.next_drop.unwrap();
        let id = request_drop(&mut state, 200.0).unwrap();

        assert_eq!(state.bodies.len(), 1);
        let body = &state.bodies[0];
        assert_eq!(body.id, id);
        assert_eq!(body.tier, tier);
        assert_eq!(body.pos, Vec2::new(200.0, tier.radius()));
        assert_eq!(body.top(), 0.0);

        // Next tier was rolled and announced
        let next = state.next_drop.unwrap();
        assert_eq!(state.drain_events(), vec![GameEvent::NextDrop { tier: next }]);
    }

    #[test]
    fn test_drop_x_is_clamped() {
        let mut state = ready_state();
        let r = state.next_drop.unwrap().radius();
        request_drop(&mut state, -50.0).unwrap();
        assert_eq!(state.bodies[0].pos.x, r);

        state.last_drop_ms = None;
        let r = state.next_drop.unwrap().radius();
        request_drop(&mut state, 10_000.0).unwrap();
        assert_eq!(state.bodies[1].pos.x, 400.0 - r);
    }

    #[test]
    fn test_cooldown_blocks_second_drop() {
        let mut state = ready_state();
        assert!(request_drop(&mut state, 100.0).is_ok());
        assert!(matches!(
            request_drop(&mut state, 300.0),
            Err(DropError::CoolingDown { .. })
        ));
        assert_eq!(state.bodies.len(), 1);
        assert!(!state.can_drop());

        // ~400 ms of ticks is still inside the window
        let dt = state.settings.dt();
        for _ in 0..30 {
            tick(&mut state, dt);
        }
        assert!(request_drop(&mut state, 300.0).is_err());

        // Past 500 ms it opens again
        for _ in 0..8 {
            tick(&mut state, dt);
        }
        assert!(state.can_drop());
        assert!(request_drop(&mut state, 300.0).is_ok());
        assert_eq!(state.bodies.len(), 2);
    }

    #[test]
    fn test_drop_rejected_without_surface_or_after_stop() {
        let mut state = SimState::new(Settings::default());
        assert_eq!(request_drop(&mut state, 10.0), Err(DropError::NoSurface));

        state.set_surface(400.0, 600.0);
        state.next_drop = None;
        assert_eq!(request_drop(&mut state, 10.0), Err(DropError::NoPendingTier));

        state.roll_next_drop();
        state.end(crate::sim::EndReason::Requested);
        assert_eq!(request_drop(&mut state, 10.0), Err(DropError::SessionStopped));
        assert!(state.bodies.is_empty());
    }

    #[test]
    fn test_every_rejection_is_traced() {
        capture_logs();
        let mut state = SimState::new(Settings::default());
        let _ = request_drop(&mut state, 10.0);

        state.set_surface(400.0, 600.0);
        state.next_drop = None;
        let _ = request_drop(&mut state, 10.0);

        state.roll_next_drop();
        request_drop(&mut state, 10.0).unwrap();
        let _ = request_drop(&mut state, 10.0);

        state.end(crate::sim::EndReason::Requested);
        let _ = request_drop(&mut state, 10.0);

        let traces = captured_traces();
        assert_eq!(traces.len(), 4, "{traces:?}");
        assert!(traces[0].contains("no size"));
        assert!(traces[1].contains("no drop tier"));
        assert!(traces[2].contains("cooling down"));
        assert!(traces[3].contains("stopped"));
    }
}
