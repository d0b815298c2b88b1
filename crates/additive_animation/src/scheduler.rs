//! Frame scheduling
//!
//! A [`FrameScheduler`] runs a one-shot callback roughly one frame from now.
//! Two implementations are provided:
//! - [`FrameQueue`]: host-driven frame callbacks. The host calls
//!   [`FrameQueue::run_frame`] from its vsync / redraw hook.
//! - [`IntervalTimer`]: a background thread ticking at a fixed frame rate.

use slotmap::{new_key_type, SlotMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

new_key_type! {
    /// Handle to a requested frame callback
    pub struct FrameId;
}

/// A one-shot frame callback
pub type FrameCallback = Box<dyn FnOnce() + Send>;

/// Schedules callbacks for a future frame
pub trait FrameScheduler: Send + Sync {
    /// Run `callback` once, about one frame from now
    fn request_frame(&self, callback: FrameCallback) -> FrameId;

    /// Cancel a pending callback. Returns true if it was removed.
    ///
    /// Schedulers without cancellation leave the callback queued.
    fn cancel_frame(&self, id: FrameId) -> bool {
        let _ = id;
        false
    }

    /// Whether [`cancel_frame`](Self::cancel_frame) can remove callbacks
    fn supports_cancel(&self) -> bool {
        false
    }
}

/// Pending callbacks in request order
#[derive(Default)]
struct PendingFrames {
    callbacks: SlotMap<FrameId, FrameCallback>,
    order: Vec<FrameId>,
}

impl PendingFrames {
    fn insert(&mut self, callback: FrameCallback) -> FrameId {
        let id = self.callbacks.insert(callback);
        self.order.push(id);
        id
    }

    fn remove(&mut self, id: FrameId) -> bool {
        if self.callbacks.remove(id).is_some() {
            self.order.retain(|pending| *pending != id);
            true
        } else {
            false
        }
    }

    /// Take everything queued so far, oldest first
    fn drain(&mut self) -> Vec<FrameCallback> {
        let order = std::mem::take(&mut self.order);
        order
            .into_iter()
            .filter_map(|id| self.callbacks.remove(id))
            .collect()
    }

    fn len(&self) -> usize {
        self.callbacks.len()
    }
}

fn lock_pending(pending: &Mutex<PendingFrames>) -> MutexGuard<'_, PendingFrames> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Frame Queue (host-driven)
// ============================================================================

/// Frame callbacks driven by the host's redraw loop
///
/// Callbacks requested while a frame is running are deferred to the next
/// frame, mirroring `requestAnimationFrame`.
///
/// ```ignore
/// let frames = Arc::new(FrameQueue::new());
/// // in the window's redraw handler:
/// frames.run_frame();
/// ```
#[derive(Default)]
pub struct FrameQueue {
    pending: Mutex<PendingFrames>,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every callback requested before this call
    ///
    /// Returns the number of callbacks run.
    pub fn run_frame(&self) -> usize {
        let callbacks = lock_pending(&self.pending).drain();
        let count = callbacks.len();
        for callback in callbacks {
            callback();
        }
        count
    }

    /// Number of callbacks waiting for the next frame
    pub fn pending_count(&self) -> usize {
        lock_pending(&self.pending).len()
    }

    /// Whether any callback is waiting for the next frame
    pub fn has_pending(&self) -> bool {
        self.pending_count() > 0
    }
}

impl FrameScheduler for FrameQueue {
    fn request_frame(&self, callback: FrameCallback) -> FrameId {
        lock_pending(&self.pending).insert(callback)
    }

    fn cancel_frame(&self, id: FrameId) -> bool {
        lock_pending(&self.pending).remove(id)
    }

    fn supports_cancel(&self) -> bool {
        true
    }
}

// ============================================================================
// Interval Timer (fixed frame rate)
// ============================================================================

/// Default frame rate for [`IntervalTimer`]
pub const DEFAULT_FPS: u32 = 60;

/// Runs frame callbacks on a background thread at a fixed rate
///
/// Like a plain timeout, a requested callback cannot be withdrawn: it always
/// fires on the next interval. The thread stops when the timer is dropped.
pub struct IntervalTimer {
    pending: Arc<Mutex<PendingFrames>>,
    stop_flag: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
    fps: u32,
}

impl IntervalTimer {
    /// Start a timer ticking `fps` times per second (0 is treated as 1)
    pub fn new(fps: u32) -> Self {
        let fps = fps.max(1);
        let pending = Arc::new(Mutex::new(PendingFrames::default()));
        let stop_flag = Arc::new(AtomicBool::new(false));

        let thread_pending = Arc::clone(&pending);
        let thread_stop = Arc::clone(&stop_flag);
        let frame_duration = Duration::from_micros(1_000_000 / fps as u64);

        let thread_handle = thread::Builder::new()
            .name("additive-animation-timer".into())
            .spawn(move || {
                tracing::debug!("Interval timer thread started at {} fps", fps);
                while !thread_stop.load(Ordering::Relaxed) {
                    let start = Instant::now();

                    let callbacks = lock_pending(&thread_pending).drain();
                    for callback in callbacks {
                        callback();
                    }

                    // Sleep for remaining frame time
                    let elapsed = start.elapsed();
                    if elapsed < frame_duration {
                        thread::sleep(frame_duration - elapsed);
                    }
                }
                tracing::debug!("Interval timer thread stopped");
            });

        let thread_handle = match thread_handle {
            Ok(handle) => Some(handle),
            Err(err) => {
                tracing::warn!("Failed to spawn interval timer thread: {}", err);
                None
            }
        };

        Self {
            pending,
            stop_flag,
            thread_handle,
            fps,
        }
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Check if the background thread is running
    pub fn is_running(&self) -> bool {
        self.thread_handle.is_some()
    }
}

impl Default for IntervalTimer {
    fn default() -> Self {
        Self::new(DEFAULT_FPS)
    }
}

impl FrameScheduler for IntervalTimer {
    fn request_frame(&self, callback: FrameCallback) -> FrameId {
        lock_pending(&self.pending).insert(callback)
    }
}

impl Drop for IntervalTimer {
    fn drop(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(handle) = self.thread_handle.take() {
            // The last owner may be a callback running on the timer thread itself
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_frame_queue_runs_in_request_order() {
        let queue = FrameQueue::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        for i in 0..3 {
            let log = Arc::clone(&log);
            queue.request_frame(Box::new(move || log.lock().unwrap().push(i)));
        }

        assert_eq!(queue.pending_count(), 3);
        assert_eq!(queue.run_frame(), 3);
        assert_eq!(*log.lock().unwrap(), vec![0, 1, 2]);
        assert!(!queue.has_pending());
    }

    #[test]
    fn test_frame_queue_cancel() {
        let queue = FrameQueue::new();
        let hits = Arc::new(Mutex::new(0));

        let h = Arc::clone(&hits);
        let id = queue.request_frame(Box::new(move || *h.lock().unwrap() += 1));

        assert!(queue.supports_cancel());
        assert!(queue.cancel_frame(id));
        assert!(!queue.cancel_frame(id));
        assert_eq!(queue.run_frame(), 0);
        assert_eq!(*hits.lock().unwrap(), 0);
    }

    #[test]
    fn test_frame_queue_defers_nested_requests() {
        let queue = Arc::new(FrameQueue::new());
        let q = Arc::clone(&queue);
        queue.request_frame(Box::new(move || {
            q.request_frame(Box::new(|| {}));
        }));

        assert_eq!(queue.run_frame(), 1);
        assert_eq!(queue.pending_count(), 1);
        assert_eq!(queue.run_frame(), 1);
        assert_eq!(queue.pending_count(), 0);
    }

    #[test]
    fn test_interval_timer_fires_callback() {
        let timer = IntervalTimer::new(120);
        assert!(timer.is_running());
        assert!(!timer.supports_cancel());

        let (tx, rx) = mpsc::channel();
        timer.request_frame(Box::new(move || {
            let _ = tx.send(());
        }));

        assert!(rx.recv_timeout(Duration::from_secs(2)).is_ok());
    }

    #[test]
    fn test_interval_timer_cannot_cancel() {
        let timer = IntervalTimer::new(60);
        let (tx, rx) = mpsc::channel();
        let id = timer.request_frame(Box::new(move || {
            let _ = tx.send(());
        }));

        assert!(!timer.cancel_frame(id));
        assert!(rx.recv_timeout(Duration::from_secs(2)).is_ok());
    }

    #[test]
    fn test_zero_fps_is_clamped() {
        let timer = IntervalTimer::new(0);
        assert_eq!(timer.fps(), 1);
    }
}
