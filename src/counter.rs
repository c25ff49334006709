//! # Shared Pulse Counters
//!
//! The sampler and the reporter meet here. The sampler adds every accepted
//! pulse; the reporter drains the totals once per period and clears the
//! raining flag after a dry period.
//!
//! All three fields live behind one `Mutex`. Per-field atomics would let a
//! drain observe a pulse count that already includes a pulse whose
//! microseconds have not been added yet.
//!
//! Publishing `state_raining` goes through a second lock, taken before the
//! counter lock and held across the write, so the published value always
//! follows the order in which the flag actually changed. File I/O never runs
//! under the counter lock itself.

use crate::publisher::{ValuePublisher, STATE_CHANNEL};
use crate::{CounterSnapshot, GaugeError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct CounterState {
    pulse_count: u64,
    accumulated_micros: u64,
    is_raining: bool,
}

/// Cloneable handle to the counters shared by both tasks.
///
/// # Example
/// ```
/// use rain_gauge_lib::counter::SharedCounterState;
///
/// let counters = SharedCounterState::new();
/// counters.record_pulse(380_000);
///
/// let snapshot = counters.drain_and_reset();
/// assert_eq!(snapshot.pulse_count, 1);
/// assert_eq!(snapshot.accumulated_micros, 380_000);
/// assert!(counters.is_raining());
/// ```
#[derive(Clone, Debug, Default)]
pub struct SharedCounterState {
    inner: Arc<Mutex<CounterState>>,
    flag_publish: Arc<Mutex<()>>,
}

impl SharedCounterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every critical section below is a handful of integer updates that
    /// cannot panic, so a poisoned lock still guards consistent data.
    fn lock(&self) -> MutexGuard<'_, CounterState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add one accepted pulse and raise the raining flag.
    ///
    /// Returns `true` if this pulse is what switched the flag from dry to
    /// raining.
    pub fn record_pulse(&self, duration_micros: u64) -> bool {
        let mut state = self.lock();
        state.pulse_count = state.pulse_count.saturating_add(1);
        state.accumulated_micros = state.accumulated_micros.saturating_add(duration_micros);
        let was_dry = !state.is_raining;
        state.is_raining = true;
        was_dry
    }

    /// Take the current totals and reset them to zero. Leaves the raining
    /// flag alone.
    pub fn drain_and_reset(&self) -> CounterSnapshot {
        let mut state = self.lock();
        let snapshot = CounterSnapshot {
            pulse_count: state.pulse_count,
            accumulated_micros: state.accumulated_micros,
        };
        state.pulse_count = 0;
        state.accumulated_micros = 0;
        snapshot
    }

    /// Lower the raining flag if the last period produced no drops. Never
    /// raises it.
    ///
    /// Returns `true` if the flag was raised and is now cleared.
    pub fn clear_raining_if_no_drops(&self, had_drops: bool) -> bool {
        if had_drops {
            return false;
        }
        let mut state = self.lock();
        let was_raining = state.is_raining;
        state.is_raining = false;
        was_raining
    }

    /// [`record_pulse`](Self::record_pulse), publishing `state_raining = 1`
    /// if the flag went up. No flag change from the other task can slip in
    /// between the update and the write.
    pub fn record_pulse_and_publish(
        &self,
        duration_micros: u64,
        publisher: &dyn ValuePublisher,
    ) -> Result<bool, GaugeError> {
        let _serial = self
            .flag_publish
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let started = self.record_pulse(duration_micros);
        if started {
            publisher.publish(STATE_CHANNEL, "raining", "1")?;
        }
        Ok(started)
    }

    /// [`clear_raining_if_no_drops`](Self::clear_raining_if_no_drops),
    /// publishing `state_raining = 0` if the flag went down.
    pub fn clear_raining_and_publish(
        &self,
        had_drops: bool,
        publisher: &dyn ValuePublisher,
    ) -> Result<bool, GaugeError> {
        let _serial = self
            .flag_publish
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let stopped = self.clear_raining_if_no_drops(had_drops);
        if stopped {
            publisher.publish(STATE_CHANNEL, "raining", "0")?;
        }
        Ok(stopped)
    }

    pub fn is_raining(&self) -> bool {
        self.lock().is_raining
    }

    /// Read the totals without resetting them
    pub fn peek(&self) -> CounterSnapshot {
        let state = self.lock();
        CounterSnapshot {
            pulse_count: state.pulse_count,
            accumulated_micros: state.accumulated_micros,
        }
    }
}
