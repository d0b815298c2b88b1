//! Additive animation stack
//!
//! Every `animate` call pushes an [`AnimationRecord`]. Records are never
//! replaced by newer ones: each keeps subtracting the part of its delta it has
//! not yet "paid down" from the anchor target until its easing weight reaches
//! zero. Summing those decaying deltas is what keeps re-targeted animations
//! free of jumps.
//!
//! Boundaries are half-open on purpose and differ between the two passes:
//! - [`AnimationStack::prune`] drops records with `end <= now`
//! - [`AnimationStack::compose`] skips records with `end < now`

use crate::easing::EasingFn;
use crate::state::StateVector;
use std::fmt;

/// One requested transition with its own time window and curve
#[derive(Clone)]
pub struct AnimationRecord {
    from_state: StateVector,
    to_state: StateVector,
    duration: f64,
    start: f64,
    end: f64,
    easing: EasingFn,
}

impl AnimationRecord {
    /// Create a record starting at `start` (ms on the controller clock)
    pub fn new(
        from_state: StateVector,
        to_state: StateVector,
        start: f64,
        duration: f64,
        easing: EasingFn,
    ) -> Self {
        Self {
            from_state,
            to_state,
            duration,
            start,
            end: start + duration,
            easing,
        }
    }

    pub fn from_state(&self) -> &StateVector {
        &self.from_state
    }

    pub fn to_state(&self) -> &StateVector {
        &self.to_state
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    /// Fraction of the window still ahead of `time`
    ///
    /// Not clamped: slightly above 1.0 right after creation under scheduling
    /// jitter, 0.0 exactly at `end`.
    pub fn remaining_fraction(&self, time: f64) -> f64 {
        (self.end - time) / self.duration
    }

    /// Whether the record still contributes at `time`
    pub fn is_active(&self, time: f64) -> bool {
        self.end >= time
    }

    /// Subtract this record's outstanding delta from `target`
    fn subtract_from(&self, target: &mut StateVector, time: f64) {
        let weight = (self.easing)(self.remaining_fraction(time));
        for (key, value) in target.iter_mut() {
            // Keys missing from the record are rejected at `animate`;
            // treat them as zero delta here.
            if let (Some(to), Some(from)) = (self.to_state.get(key), self.from_state.get(key)) {
                *value -= (to - from) * weight;
            }
        }
    }
}

impl fmt::Debug for AnimationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationRecord")
            .field("from_state", &self.from_state)
            .field("to_state", &self.to_state)
            .field("duration", &self.duration)
            .field("start", &self.start)
            .field("end", &self.end)
            .finish_non_exhaustive()
    }
}

/// Insertion-ordered records, newest last
#[derive(Clone, Debug, Default)]
pub struct AnimationStack {
    records: Vec<AnimationRecord>,
}

impl AnimationStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[AnimationRecord] {
        &self.records
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Drop every record with `end <= time`
    pub fn prune(&mut self, time: f64) {
        let before = self.records.len();
        self.records.retain(|record| record.end > time);
        let dropped = before - self.records.len();
        if dropped > 0 {
            tracing::trace!("Pruned {} expired animation record(s)", dropped);
        }
    }

    /// Prune at `time`, then append `record`
    pub fn push(&mut self, time: f64, record: AnimationRecord) {
        self.prune(time);
        self.records.push(record);
    }

    /// Compose the rendered state at `time` relative to `anchor`
    pub fn compose(&self, anchor: &StateVector, time: f64) -> StateVector {
        let mut target = anchor.clone();
        for record in self.records.iter().rev() {
            if record.end < time {
                continue;
            }
            record.subtract_from(&mut target, time);
        }
        target
    }

    /// Whether any record has `end >= time`
    pub fn has_active(&self, time: f64) -> bool {
        self.records.iter().rev().any(|record| record.is_active(time))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::Easing;

    fn xy(x: f64, y: f64) -> StateVector {
        StateVector::from([("x", x), ("y", y)])
    }

    fn record(from: StateVector, to: StateVector, start: f64, duration: f64) -> AnimationRecord {
        AnimationRecord::new(from, to, start, duration, Easing::Linear.to_fn())
    }

    #[test]
    fn test_compose_single_linear_record() {
        let mut stack = AnimationStack::new();
        stack.push(0.0, record(xy(0.0, 0.0), xy(100.0, 200.0), 0.0, 100.0));
        let anchor = xy(100.0, 200.0);

        let start = stack.compose(&anchor, 0.0);
        assert_eq!(start, xy(0.0, 0.0));

        let mid = stack.compose(&anchor, 25.0);
        assert!((mid["x"] - 25.0).abs() < 1e-9);
        assert!((mid["y"] - 50.0).abs() < 1e-9);

        let end = stack.compose(&anchor, 100.0);
        assert_eq!(end, anchor);
    }

    #[test]
    fn test_compose_sums_overlapping_records() {
        let mut stack = AnimationStack::new();
        stack.push(0.0, record(xy(0.0, 0.0), xy(100.0, 0.0), 0.0, 100.0));
        // Re-target at t=50 from the previous anchor
        stack.push(50.0, record(xy(100.0, 0.0), xy(300.0, 0.0), 50.0, 100.0));
        let anchor = xy(300.0, 0.0);

        // At t=50 the composed value equals what the first record alone gave
        let at_retarget = stack.compose(&anchor, 50.0);
        assert!((at_retarget["x"] - 50.0).abs() < 1e-9);

        // t=100: first record done (weight 0), second halfway
        let later = stack.compose(&anchor, 100.0);
        assert!((later["x"] - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_prune_drops_records_ending_exactly_now() {
        let mut stack = AnimationStack::new();
        stack.push(0.0, record(xy(0.0, 0.0), xy(1.0, 1.0), 0.0, 100.0));
        stack.push(0.0, record(xy(0.0, 0.0), xy(1.0, 1.0), 0.0, 200.0));

        stack.prune(100.0);
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.records()[0].end(), 200.0);
    }

    #[test]
    fn test_compose_includes_record_ending_exactly_now() {
        let mut stack = AnimationStack::new();
        // Custom curve that is non-zero at t=0 exposes the boundary
        let easing: EasingFn = std::sync::Arc::new(|_: f64| 1.0);
        stack.push(
            0.0,
            AnimationRecord::new(xy(0.0, 0.0), xy(10.0, 10.0), 0.0, 100.0, easing),
        );
        let anchor = xy(10.0, 10.0);

        // end == time: included
        assert_eq!(stack.compose(&anchor, 100.0), xy(0.0, 0.0));
        assert!(stack.has_active(100.0));

        // end < time: skipped
        assert_eq!(stack.compose(&anchor, 100.5), anchor);
        assert!(!stack.has_active(100.5));
    }

    #[test]
    fn test_push_keeps_insertion_order() {
        let mut stack = AnimationStack::new();
        stack.push(0.0, record(xy(0.0, 0.0), xy(1.0, 0.0), 0.0, 300.0));
        stack.push(10.0, record(xy(1.0, 0.0), xy(2.0, 0.0), 10.0, 300.0));
        let ends: Vec<f64> = stack.records().iter().map(|r| r.end()).collect();
        assert_eq!(ends, vec![300.0, 310.0]);
    }

    #[test]
    fn test_remaining_fraction_is_unclamped() {
        let r = record(xy(0.0, 0.0), xy(1.0, 1.0), 10.0, 100.0);
        assert!((r.remaining_fraction(5.0) - 1.05).abs() < 1e-12);
        assert_eq!(r.remaining_fraction(110.0), 0.0);
    }
}
