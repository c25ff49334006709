//! # Pulse Edge Timing
//!
//! Measures how long the sensor relay stays closed. The input is polled at a
//! fixed interval: first until it goes high (rising edge), then until it goes
//! low again (falling edge). The duration between the two timestamps is the
//! pulse length.
//!
//! ## Blocking Behaviour
//! [`EdgeTimer::measure_pulse`] has no timeout. When it is not raining the
//! relay never closes and the call simply waits; that is the steady state, not
//! a failure. Only a read error ends the wait early.
//!
//! ## Resolution
//! Timestamps are taken at poll time, so a measured pulse is accurate to
//! roughly one poll interval (10 ms by default, about 5% of a drop).

use crate::clock::Clock;
use crate::input::{BinaryInputSource, Level};
use crate::{GaugeError, PulseMeasurement};
use std::time::Duration;

pub struct EdgeTimer<S, C> {
    input: S,
    clock: C,
    poll_interval: Duration,
}

impl<S: BinaryInputSource, C: Clock> EdgeTimer<S, C> {
    pub fn new(input: S, clock: C, poll_interval: Duration) -> Self {
        Self {
            input,
            clock,
            poll_interval,
        }
    }

    /// Block until one full low→high→low pulse has been observed.
    ///
    /// A falling timestamp that is not after the rising one yields a zero
    /// duration, which the classifier then rejects as noise.
    pub fn measure_pulse(&mut self) -> Result<PulseMeasurement, GaugeError> {
        self.wait_while(Level::Low)?;
        let rising = self.clock.now();

        self.wait_while(Level::High)?;
        let falling = self.clock.now();

        let duration = falling.saturating_duration_since(rising);
        Ok(PulseMeasurement {
            duration_micros: u64::try_from(duration.as_micros()).unwrap_or(u64::MAX),
        })
    }

    fn wait_while(&mut self, level: Level) -> Result<(), GaugeError> {
        while self.input.read_level()? == level {
            self.clock.sleep(self.poll_interval);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::input::ScriptedSensor;

    fn timer(segments: Vec<(Level, u64)>) -> EdgeTimer<ScriptedSensor<ManualClock>, ManualClock> {
        let clock = ManualClock::new();
        let sensor = ScriptedSensor::new(clock.clone(), segments);
        EdgeTimer::new(sensor, clock, Duration::from_millis(10))
    }

    #[test]
    fn test_measures_aligned_pulse_exactly() {
        let mut timer = timer(vec![
            (Level::Low, 100_000),
            (Level::High, 380_000),
            (Level::Low, 100_000),
        ]);

        let pulse = timer.measure_pulse().unwrap();
        assert_eq!(pulse.duration_micros, 380_000);
    }

    #[test]
    fn test_unaligned_pulse_rounds_to_poll_interval() {
        // High from 5 ms to 200 ms: seen high at 10 ms, low again at 200 ms
        let mut timer = timer(vec![
            (Level::Low, 5_000),
            (Level::High, 195_000),
            (Level::Low, 50_000),
        ]);

        let pulse = timer.measure_pulse().unwrap();
        assert_eq!(pulse.duration_micros, 190_000);
    }

    #[test]
    fn test_measures_consecutive_pulses() {
        let mut timer = timer(vec![
            (Level::Low, 20_000),
            (Level::High, 190_000),
            (Level::Low, 30_000),
            (Level::High, 570_000),
            (Level::Low, 10_000),
        ]);

        assert_eq!(timer.measure_pulse().unwrap().duration_micros, 190_000);
        assert_eq!(timer.measure_pulse().unwrap().duration_micros, 570_000);
    }

    #[test]
    fn test_read_error_ends_measurement() {
        // Relay never opens again before the script runs out
        let mut timer = timer(vec![(Level::Low, 10_000), (Level::High, 50_000)]);

        assert!(matches!(
            timer.measure_pulse(),
            Err(GaugeError::ScriptExhausted)
        ));
    }
}
