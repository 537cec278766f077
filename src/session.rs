//! Live game session
//!
//! A session owns one [`SimState`] behind a mutex and a dedicated clock
//! thread that ticks it at the target rate. The state lock is held for a
//! whole tick, so drops from the input thread land between ticks, never in
//! the middle of a merge pass. After every tick the thread publishes an
//! immutable [`Snapshot`] (front buffer) for renderers and then forwards
//! queued [`GameEvent`]s to the [`SessionListener`] with no lock held.
//!
//! Teardown (explicit [`Session::stop`] or drop) signals the thread, which
//! wakes from its pacing wait, ends the session and exits; the caller joins
//! it before the state is released.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use glam::Vec2;
use serde::Serialize;
use thiserror::Error;

use crate::settings::{Settings, SettingsError};
use crate::sim::{DropError, EndReason, GameEvent, SessionPhase, SimState, Tier, request_drop, tick};

/// Errors starting a session
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("failed to spawn simulation thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Callbacks from the simulation thread. Every method defaults to a no-op.
pub trait SessionListener: Send {
    fn on_score_changed(&mut self, _total: u64) {}

    /// Called exactly once per session
    fn on_session_ended(&mut self, _final_score: u64, _reason: EndReason) {}

    /// Two bodies of `tier` fused at `pos` into `result` (`None` when the top tier caps out)
    fn on_merge(&mut self, _tier: Tier, _result: Option<Tier>, _pos: Vec2) {}

    fn on_next_drop(&mut self, _tier: Tier) {}

    /// Route one event to the matching callback
    fn on_event(&mut self, event: GameEvent) {
        match event {
            GameEvent::ScoreChanged { total } => self.on_score_changed(total),
            GameEvent::Merged { tier, result, pos } => self.on_merge(tier, result, pos),
            GameEvent::NextDrop { tier } => self.on_next_drop(tier),
            GameEvent::SessionEnded {
                final_score,
                reason,
            } => self.on_session_ended(final_score, reason),
        }
    }
}

impl SessionListener for () {}

/// Forward raw events over a channel
impl SessionListener for mpsc::Sender<GameEvent> {
    fn on_event(&mut self, event: GameEvent) {
        // A dropped receiver just means nobody is listening any more
        let _ = self.send(event);
    }
}

/// Drawable state of one body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BodyView {
    pub id: u32,
    pub tier: Tier,
    /// Center
    pub pos: Vec2,
    pub radius: f32,
    pub rotation: f32,
    pub selected: bool,
}

/// Everything a renderer needs for one frame, copied out once per tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub bodies: Vec<BodyView>,
    /// Preview of the pending drop
    pub next_drop: Option<Tier>,
    /// False while the drop cooldown runs (hide the preview)
    pub can_drop: bool,
    pub preview_y: f32,
    pub game_over_line_y: f32,
    pub score: u64,
    pub phase: SessionPhase,
    pub end_reason: Option<EndReason>,
    pub time_remaining_secs: Option<f64>,
    /// Executed ticks
    pub tick: u64,
}

impl Snapshot {
    pub fn capture(state: &SimState) -> Self {
        Self {
            bodies: state
                .bodies
                .iter()
                .map(|b| BodyView {
                    id: b.id,
                    tier: b.tier,
                    pos: b.pos,
                    radius: b.radius(),
                    rotation: b.rotation,
                    selected: b.selected,
                })
                .collect(),
            next_drop: state.next_drop,
            can_drop: state.can_drop(),
            preview_y: state.settings.game_over_line_y / 2.0,
            game_over_line_y: state.settings.game_over_line_y,
            score: state.score,
            phase: state.phase,
            end_reason: state.end_reason,
            time_remaining_secs: state.time_remaining_secs(),
            tick: state.time_ticks,
        }
    }
}

struct Shared {
    state: Mutex<SimState>,
    front: Mutex<Arc<Snapshot>>,
}

impl Shared {
    fn publish(&self, state: &SimState) {
        *lock(&self.front) = Arc::new(Snapshot::capture(state));
    }
}

/// A running game session and its simulation thread
pub struct Session {
    shared: Arc<Shared>,
    stop_tx: Option<mpsc::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl Session {
    /// Validate settings, create the state and start the clock thread
    pub fn start(
        settings: Settings,
        listener: Box<dyn SessionListener>,
    ) -> Result<Self, SessionError> {
        settings.validate()?;
        let frame = Duration::from_secs_f64(settings.frame_ms() / 1000.0);
        let dt = settings.dt();

        let state = SimState::new(settings);
        let snapshot = Arc::new(Snapshot::capture(&state));
        let shared = Arc::new(Shared {
            state: Mutex::new(state),
            front: Mutex::new(snapshot),
        });

        let (stop_tx, stop_rx) = mpsc::channel();
        let thread_shared = shared.clone();
        let thread = thread::Builder::new()
            .name("fuse_drop_sim".to_owned())
            .spawn(move || run_clock(&thread_shared, &stop_rx, listener, dt, frame))?;
        log::info!("Session started ({:.1} ms frames)", frame.as_secs_f64() * 1000.0);

        Ok(Self {
            shared,
            stop_tx: Some(stop_tx),
            thread: Some(thread),
        })
    }

    /// Drop the pending ball at `pointer_x`. Rejections are harmless no-ops.
    pub fn request_drop(&self, pointer_x: f32) -> Result<u32, DropError> {
        request_drop(&mut lock(&self.shared.state), pointer_x)
    }

    /// Report the playfield size. Physics waits until both are positive.
    pub fn set_surface_bounds(&self, width: f32, height: f32) {
        lock(&self.shared.state).set_surface(width, height);
    }

    /// Latest published frame
    pub fn snapshot(&self) -> Arc<Snapshot> {
        lock(&self.shared.front).clone()
    }

    pub fn is_running(&self) -> bool {
        lock(&self.shared.state).is_running()
    }

    pub fn score(&self) -> u64 {
        lock(&self.shared.state).score
    }

    /// Run `f` against the live state between ticks
    pub fn with_state<R>(&self, f: impl FnOnce(&mut SimState) -> R) -> R {
        f(&mut lock(&self.shared.state))
    }

    /// End the session and wait for the simulation thread to exit
    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            // Fails only if the thread already exited on its own
            let _ = tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("Simulation thread panicked");
            }
        }
    }

    /// Tear this session down, then start a fresh one in its place
    pub fn restart(
        &mut self,
        settings: Settings,
        listener: Box<dyn SessionListener>,
    ) -> Result<(), SessionError> {
        self.stop();
        *self = Self::start(settings, listener)?;
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("running", &self.thread.is_some())
            .finish_non_exhaustive()
    }
}

/// Clock thread body: tick, publish, notify, then wait out the rest of the frame
fn run_clock(
    shared: &Shared,
    stop_rx: &mpsc::Receiver<()>,
    mut listener: Box<dyn SessionListener>,
    dt: f32,
    frame: Duration,
) {
    loop {
        let frame_start = Instant::now();

        let (events, running) = {
            let mut state = lock(&shared.state);
            let result = panic::catch_unwind(AssertUnwindSafe(|| tick(&mut state, dt)));
            if let Err(payload) = result {
                log::error!(
                    "Tick {} panicked: {}",
                    state.time_ticks,
                    panic_message(payload.as_ref())
                );
            }
            shared.publish(&state);
            (state.drain_events(), state.is_running())
        };
        notify(listener.as_mut(), events);
        if !running {
            break;
        }

        let work = frame_start.elapsed();
        if work > frame {
            log::warn!(
                "Tick took {:.1} ms (budget {:.1} ms)",
                work.as_secs_f64() * 1000.0,
                frame.as_secs_f64() * 1000.0
            );
        }
        match stop_rx.recv_timeout(frame.saturating_sub(work)) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                let events = {
                    let mut state = lock(&shared.state);
                    state.end(EndReason::Requested);
                    shared.publish(&state);
                    state.drain_events()
                };
                notify(listener.as_mut(), events);
                break;
            }
        }
    }
    log::info!("Simulation thread exiting");
}

fn notify(listener: &mut dyn SessionListener, events: Vec<GameEvent>) {
    for event in events {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| listener.on_event(event))) {
            log::error!(
                "Listener panicked on {:?}: {}",
                event,
                panic_message(payload.as_ref())
            );
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}

/// Lock, recovering from poisoning: a panic mid-tick is already logged
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
