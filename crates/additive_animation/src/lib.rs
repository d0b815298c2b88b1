//! Additive Animation
//!
//! Animates a keyed numeric state (`{x, y, opacity, ...}`) by summing every
//! in-flight transition instead of letting the newest one overwrite the rest.
//!
//! # Features
//!
//! - **Additive Blending**: Re-targeting mid-flight starts from the rendered
//!   value; older transitions decay along their own easing curve
//! - **Exact Finish**: The finish callback always receives the requested target
//! - **Pluggable Scheduling**: Host frame callbacks or a fixed-interval timer
//! - **Injectable Clock**: Wall-clock by default, manual clock for tests
//! - **Named Easing**: Built-in curves by name with a safe default fallback

pub mod clock;
pub mod config;
pub mod controller;
pub mod easing;
pub mod error;
pub mod scheduler;
pub mod stack;
pub mod state;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{AnimationConfig, ControllerSettings, SchedulingMode};
pub use controller::AnimationController;
pub use easing::{Easing, EasingFn, EasingRef};
pub use error::{AnimationError, Result};
pub use scheduler::{FrameCallback, FrameId, FrameQueue, FrameScheduler, IntervalTimer};
pub use stack::{AnimationRecord, AnimationStack};
pub use state::StateVector;
