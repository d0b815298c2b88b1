//! Additive animation controller
//!
//! The controller owns the animation stack and the anchor target and drives
//! a self-rescheduling tick:
//!
//! ```text
//!            animate()                 tick: records active
//!   Idle ─────────────────▶ Animating ◀──────────────────┐
//!    ▲                        │  │                        │
//!    │   tick: all decayed    │  └────────────────────────┘
//!    ├────────────────────────┘
//!    │   cancel()
//!    └──────────────────────── Animating
//! ```
//!
//! State lives behind one mutex. Callbacks always run with the lock released,
//! so they may call back into the controller.

use crate::clock::{Clock, MonotonicClock};
use crate::config::{
    AnimationConfig, CancelCallback, FinishCallback, RenderCallback, SchedulingMode,
};
use crate::easing::EasingRef;
use crate::error::{AnimationError, Result};
use crate::scheduler::{FrameId, FrameScheduler, IntervalTimer};
use crate::stack::{AnimationRecord, AnimationStack};
use crate::state::StateVector;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// The tick the controller is waiting for
#[derive(Clone, Copy, Debug)]
struct PendingTick {
    seq: u64,
    /// Unknown until the scheduler returns
    frame: Option<FrameId>,
}

enum Phase {
    Idle,
    Animating {
        /// Anchor target: the most recently requested final state
        target: StateVector,
        /// Last composed and rendered state
        current: Option<StateVector>,
        pending: Option<PendingTick>,
    },
}

struct ControllerState {
    phase: Phase,
    stack: AnimationStack,
    next_seq: u64,
}

impl ControllerState {
    /// Reserve a tick sequence number if none is pending
    fn reserve_tick(&mut self) -> Option<u64> {
        let seq = self.next_seq;
        match &mut self.phase {
            Phase::Animating { pending, .. } if pending.is_none() => {
                *pending = Some(PendingTick { seq, frame: None });
                self.next_seq += 1;
                Some(seq)
            }
            _ => None,
        }
    }

    fn is_pending(&self, seq: u64) -> bool {
        matches!(
            &self.phase,
            Phase::Animating { pending: Some(p), .. } if p.seq == seq
        )
    }
}

struct Shared {
    state: Mutex<ControllerState>,
    on_render: Option<RenderCallback>,
    on_finish: Option<FinishCallback>,
    on_cancel: Option<CancelCallback>,
    scheduler: Arc<dyn FrameScheduler>,
    clock: Arc<dyn Clock>,
    mode: SchedulingMode,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hand a reserved tick to the scheduler
    fn schedule_tick(self: &Arc<Self>, seq: u64) {
        let weak: Weak<Shared> = Arc::downgrade(self);
        let frame = self.scheduler.request_frame(Box::new(move || {
            if let Some(shared) = weak.upgrade() {
                shared.tick(seq);
            }
        }));

        let mut state = self.lock();
        if let Phase::Animating {
            pending: Some(pending),
            ..
        } = &mut state.phase
        {
            if pending.seq == seq {
                pending.frame = Some(frame);
            }
        }
    }

    /// One frame: compose, render, then reschedule or finish
    fn tick(self: &Arc<Self>, seq: u64) {
        let (time, rendered) = {
            let mut state = self.lock();
            // Stale callback after cancel / finish, or superseded by a newer tick
            if !state.is_pending(seq) {
                return;
            }
            let time = self.clock.now_ms();
            let ControllerState { phase, stack, .. } = &mut *state;
            let Phase::Animating {
                target, current, ..
            } = phase
            else {
                return;
            };
            let composed = stack.compose(target, time);
            *current = Some(composed.clone());
            (time, composed)
        };

        tracing::trace!("Animation tick at {:.2}ms", time);
        if let Some(on_render) = &self.on_render {
            on_render(&rendered);
        }

        let mut state = self.lock();
        // The render callback may have cancelled or restarted the animation
        if !state.is_pending(seq) {
            return;
        }

        if state.stack.has_active(time) {
            if let Phase::Animating { pending, .. } = &mut state.phase {
                *pending = None;
            }
            let next = state.reserve_tick();
            drop(state);
            if let Some(next) = next {
                self.schedule_tick(next);
            }
            return;
        }

        let finished = std::mem::replace(&mut state.phase, Phase::Idle);
        drop(state);

        if let Phase::Animating { target, .. } = finished {
            tracing::debug!("Animation finished");
            if let Some(on_finish) = &self.on_finish {
                on_finish(&target);
            }
        }
    }
}

/// Drives additive animations of a [`StateVector`]
///
/// Cloning yields another handle to the same controller.
///
/// # Example
///
/// ```ignore
/// let controller = AnimationController::new(
///     AnimationConfig::new().on_render(|state| window.scroll_to(0.0, state["y"])),
/// );
///
/// controller.animate(
///     StateVector::from([("y", 0.0)]),
///     StateVector::from([("y", 1000.0)]),
///     400.0,
///     "easeInOutQuad",
/// )?;
///
/// // Later, before the first one finished: blends instead of jumping
/// controller.animate(
///     StateVector::from([("y", 1000.0)]),
///     StateVector::from([("y", 2000.0)]),
///     400.0,
///     Easing::Linear,
/// )?;
/// ```
#[derive(Clone)]
pub struct AnimationController {
    shared: Arc<Shared>,
}

impl AnimationController {
    /// Create a controller, resolving clock and scheduler once
    ///
    /// Frame-callback mode without a frame source falls back to a
    /// fixed-interval timer.
    pub fn new(config: AnimationConfig) -> Self {
        let AnimationConfig {
            on_render,
            on_finish,
            on_cancel,
            settings,
            frame_source,
            clock,
        } = config;

        let (mode, scheduler): (SchedulingMode, Arc<dyn FrameScheduler>) =
            match (settings.scheduling_mode, frame_source) {
                (SchedulingMode::FrameCallback, Some(source)) => {
                    (SchedulingMode::FrameCallback, source)
                }
                (SchedulingMode::FrameCallback, None) => {
                    tracing::debug!(
                        "No frame source available, using {} fps interval timer",
                        settings.fps
                    );
                    (
                        SchedulingMode::FixedInterval,
                        Arc::new(IntervalTimer::new(settings.fps)),
                    )
                }
                (SchedulingMode::FixedInterval, _) => (
                    SchedulingMode::FixedInterval,
                    Arc::new(IntervalTimer::new(settings.fps)),
                ),
            };

        let clock: Arc<dyn Clock> = match clock {
            Some(clock) => clock,
            None => Arc::new(MonotonicClock::new()),
        };

        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(ControllerState {
                    phase: Phase::Idle,
                    stack: AnimationStack::new(),
                    next_seq: 0,
                }),
                on_render,
                on_finish,
                on_cancel,
                scheduler,
                clock,
                mode,
            }),
        }
    }

    /// Start an animation, composing with any animation in flight
    ///
    /// While animating, the new record starts from the current anchor target
    /// rather than `from_state`; the outgoing records keep decaying on the
    /// stack so the rendered value stays continuous.
    pub fn animate(
        &self,
        from_state: StateVector,
        to_state: StateVector,
        duration_ms: f64,
        easing: impl Into<EasingRef>,
    ) -> Result<()> {
        if !duration_ms.is_finite() || duration_ms <= 0.0 {
            return Err(AnimationError::InvalidDuration(duration_ms));
        }
        if let Some(key) = from_state.first_key_difference(&to_state) {
            return Err(AnimationError::KeyMismatch {
                key: key.to_string(),
            });
        }
        from_state.ensure_finite()?;
        to_state.ensure_finite()?;

        let easing = easing.into().resolve();

        let mut state = self.shared.lock();
        let time = self.shared.clock.now_ms();

        let from_state = match &state.phase {
            Phase::Animating { target, .. } => {
                if let Some(key) = target.first_key_difference(&to_state) {
                    return Err(AnimationError::TrackedKeysChanged {
                        key: key.to_string(),
                    });
                }
                tracing::debug!("Re-targeting animation over {}ms", duration_ms);
                target.clone()
            }
            Phase::Idle => {
                tracing::debug!("Starting animation over {}ms", duration_ms);
                from_state
            }
        };

        // Records left over from a cancelled run must not bleed into a fresh start
        if matches!(state.phase, Phase::Idle) {
            state.stack.clear();
        }

        let record = AnimationRecord::new(from_state, to_state.clone(), time, duration_ms, easing);
        state.stack.push(time, record);

        let previous = std::mem::replace(&mut state.phase, Phase::Idle);
        state.phase = match previous {
            Phase::Animating {
                current, pending, ..
            } => Phase::Animating {
                target: to_state,
                current,
                pending,
            },
            Phase::Idle => Phase::Animating {
                target: to_state,
                current: None,
                pending: None,
            },
        };

        let seq = state.reserve_tick();
        drop(state);
        if let Some(seq) = seq {
            self.shared.schedule_tick(seq);
        }
        Ok(())
    }

    /// Stop the animation without reaching the target
    ///
    /// Fires the cancel callback once; does nothing when idle.
    pub fn cancel(&self) {
        let mut state = self.shared.lock();
        let cancelled = std::mem::replace(&mut state.phase, Phase::Idle);
        drop(state);

        let Phase::Animating { pending, .. } = cancelled else {
            return;
        };

        if let Some(frame) = pending.and_then(|p| p.frame) {
            if self.shared.scheduler.supports_cancel() {
                self.shared.scheduler.cancel_frame(frame);
            }
        }

        tracing::debug!("Animation cancelled");
        if let Some(on_cancel) = &self.shared.on_cancel {
            on_cancel();
        }
    }

    /// True while a target is set, i.e. between `animate` and finish/cancel
    pub fn is_animating(&self) -> bool {
        matches!(self.shared.lock().phase, Phase::Animating { .. })
    }

    /// Last rendered state, if a tick has run since the animation started
    pub fn current_state(&self) -> Option<StateVector> {
        match &self.shared.lock().phase {
            Phase::Animating { current, .. } => current.clone(),
            Phase::Idle => None,
        }
    }

    /// The anchor target while animating
    pub fn target(&self) -> Option<StateVector> {
        match &self.shared.lock().phase {
            Phase::Animating { target, .. } => Some(target.clone()),
            Phase::Idle => None,
        }
    }

    /// The scheduling mode in effect after fallback
    pub fn scheduling_mode(&self) -> SchedulingMode {
        self.shared.mode
    }

    /// Number of records on the stack, including expired ones not yet pruned
    pub fn stack_len(&self) -> usize {
        self.shared.lock().stack.len()
    }
}

impl std::fmt::Debug for AnimationController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationController")
            .field("mode", &self.shared.mode)
            .field("animating", &self.is_animating())
            .field("stack_len", &self.stack_len())
            .finish()
    }
}
