//! Sensor input abstraction.
//!
//! The rain sensor's relay is wired to a single GPIO line. The sampler only
//! ever asks one question of it ("is the relay closed right now?") so the
//! hardware hides behind [`BinaryInputSource`]. The real GPIO implementation
//! lives in the binary; this module ships [`ScriptedSensor`], a replayable
//! stand-in used by tests and by `--simulate`.

use crate::clock::Clock;
use crate::GaugeError;
use std::time::Instant;

/// Logic level of the sensor line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

/// A digital input that can be polled for its current level.
///
/// Read errors are hardware faults and are never retried by the caller.
pub trait BinaryInputSource {
    fn read_level(&mut self) -> Result<Level, GaugeError>;
}

/// Replays a fixed sequence of `(level, duration in microseconds)` segments.
///
/// The level returned by [`read_level`](BinaryInputSource::read_level) is the
/// one in effect at the clock's current time, measured from construction. A
/// one-shot script reports [`GaugeError::ScriptExhausted`] once time runs past
/// its end; a repeating script wraps around forever.
///
/// # Example
/// ```
/// use rain_gauge_lib::clock::{Clock, ManualClock};
/// use rain_gauge_lib::input::{BinaryInputSource, Level, ScriptedSensor};
/// use std::time::Duration;
///
/// let clock = ManualClock::new();
/// let mut sensor = ScriptedSensor::new(
///     clock.clone(),
///     vec![(Level::Low, 1_000), (Level::High, 380_000)],
/// );
///
/// assert_eq!(sensor.read_level().unwrap(), Level::Low);
/// clock.sleep(Duration::from_millis(1));
/// assert_eq!(sensor.read_level().unwrap(), Level::High);
/// ```
#[derive(Debug)]
pub struct ScriptedSensor<C: Clock> {
    clock: C,
    start: Instant,
    segments: Vec<(Level, u64)>,
    total_micros: u64,
    repeat: bool,
}

impl<C: Clock> ScriptedSensor<C> {
    /// One-shot script starting at the clock's current time
    pub fn new(clock: C, segments: Vec<(Level, u64)>) -> Self {
        Self::build(clock, segments, false)
    }

    /// Script that starts over after its last segment
    pub fn repeating(clock: C, segments: Vec<(Level, u64)>) -> Self {
        Self::build(clock, segments, true)
    }

    fn build(clock: C, segments: Vec<(Level, u64)>, repeat: bool) -> Self {
        let start = clock.now();
        let total_micros = segments.iter().map(|(_, micros)| micros).sum();
        Self {
            clock,
            start,
            segments,
            total_micros,
            repeat,
        }
    }

    fn elapsed_micros(&self) -> u64 {
        let elapsed = self.clock.now().saturating_duration_since(self.start);
        u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX)
    }
}

impl<C: Clock> BinaryInputSource for ScriptedSensor<C> {
    fn read_level(&mut self) -> Result<Level, GaugeError> {
        if self.total_micros == 0 {
            return Err(GaugeError::ScriptExhausted);
        }

        let mut offset = self.elapsed_micros();
        if self.repeat {
            offset %= self.total_micros;
        } else if offset >= self.total_micros {
            return Err(GaugeError::ScriptExhausted);
        }

        for &(level, micros) in &self.segments {
            if offset < micros {
                return Ok(level);
            }
            offset -= micros;
        }
        Err(GaugeError::ScriptExhausted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::time::Duration;

    #[test]
    fn test_one_shot_script_exhausts() {
        let clock = ManualClock::new();
        let mut sensor = ScriptedSensor::new(
            clock.clone(),
            vec![(Level::Low, 10_000), (Level::High, 20_000)],
        );

        assert_eq!(sensor.read_level().unwrap(), Level::Low);
        clock.advance(Duration::from_micros(29_999));
        assert_eq!(sensor.read_level().unwrap(), Level::High);
        clock.advance(Duration::from_micros(1));
        assert!(matches!(
            sensor.read_level(),
            Err(GaugeError::ScriptExhausted)
        ));
    }

    #[test]
    fn test_repeating_script_wraps() {
        let clock = ManualClock::new();
        let mut sensor = ScriptedSensor::repeating(
            clock.clone(),
            vec![(Level::Low, 10_000), (Level::High, 20_000)],
        );

        clock.advance(Duration::from_micros(30_000));
        assert_eq!(sensor.read_level().unwrap(), Level::Low);
        clock.advance(Duration::from_micros(15_000));
        assert_eq!(sensor.read_level().unwrap(), Level::High);
    }

    #[test]
    fn test_empty_script_is_exhausted() {
        let mut sensor = ScriptedSensor::repeating(ManualClock::new(), Vec::new());
        assert!(sensor.read_level().is_err());
    }
}
