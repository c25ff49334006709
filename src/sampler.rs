//! Background pulse sampler.
//!
//! The sampler is the only producer of pulse data. It runs on its own thread
//! for the lifetime of the process and never sleeps outside the edge timer's
//! polling, so its pace is set entirely by the sensor.

use crate::classifier::PulseClassifier;
use crate::clock::Clock;
use crate::counter::SharedCounterState;
use crate::edge_timer::EdgeTimer;
use crate::input::BinaryInputSource;
use crate::publisher::ValuePublisher;
use crate::{Classification, GaugeError};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::info;

pub struct PulseSampler<S, C> {
    timer: EdgeTimer<S, C>,
    classifier: PulseClassifier,
    counters: SharedCounterState,
    publisher: Arc<dyn ValuePublisher>,
}

impl<S: BinaryInputSource, C: Clock> PulseSampler<S, C> {
    pub fn new(
        timer: EdgeTimer<S, C>,
        classifier: PulseClassifier,
        counters: SharedCounterState,
        publisher: Arc<dyn ValuePublisher>,
    ) -> Self {
        Self {
            timer,
            classifier,
            counters,
            publisher,
        }
    }

    /// Wait for one pulse, classify it and record it if accepted.
    ///
    /// Rejected pulses are only logged. The first accepted pulse after a dry
    /// spell also publishes `state_raining = 1`.
    pub fn sample_once(&mut self) -> Result<Classification, GaugeError> {
        let pulse = self.timer.measure_pulse()?;
        let verdict = self.classifier.classify_pulse(pulse);

        if verdict.accepted
            && self
                .counters
                .record_pulse_and_publish(pulse.duration_micros, self.publisher.as_ref())?
        {
            info!("rain started");
        }
        Ok(verdict)
    }

    /// Sample forever. Only a hardware or publish failure ends the loop.
    pub fn run(mut self) -> Result<Infallible, GaugeError> {
        loop {
            self.sample_once()?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::input::{Level, ScriptedSensor};
    use crate::publisher::MemoryPublisher;
    use crate::CounterSnapshot;
    use std::time::Duration;

    fn sampler(
        segments: Vec<(Level, u64)>,
        counters: SharedCounterState,
        publisher: Arc<MemoryPublisher>,
    ) -> PulseSampler<ScriptedSensor<ManualClock>, ManualClock> {
        let clock = ManualClock::new();
        let sensor = ScriptedSensor::new(clock.clone(), segments);
        let timer = EdgeTimer::new(sensor, clock, Duration::from_millis(1));
        PulseSampler::new(timer, PulseClassifier::default(), counters, publisher)
    }

    #[test]
    fn test_accepted_pulse_is_recorded_and_published() {
        let counters = SharedCounterState::new();
        let publisher = Arc::new(MemoryPublisher::new());
        let mut sampler = sampler(
            vec![
                (Level::Low, 5_000),
                (Level::High, 380_000),
                (Level::Low, 5_000),
            ],
            counters.clone(),
            publisher.clone(),
        );

        let verdict = sampler.sample_once().unwrap();

        assert_eq!(
            verdict,
            Classification {
                drops: 2,
                accepted: true
            }
        );
        assert_eq!(
            counters.peek(),
            CounterSnapshot {
                pulse_count: 1,
                accumulated_micros: 380_000
            }
        );
        assert!(counters.is_raining());
        assert_eq!(publisher.get("state", "raining").as_deref(), Some("1"));
    }

    #[test]
    fn test_noise_pulse_changes_nothing() {
        let counters = SharedCounterState::new();
        let publisher = Arc::new(MemoryPublisher::new());
        let mut sampler = sampler(
            vec![
                (Level::Low, 5_000),
                (Level::High, 20_000),
                (Level::Low, 5_000),
            ],
            counters.clone(),
            publisher.clone(),
        );

        let verdict = sampler.sample_once().unwrap();

        assert!(!verdict.accepted);
        assert_eq!(counters.peek(), CounterSnapshot::default());
        assert!(!counters.is_raining());
        assert_eq!(publisher.get("state", "raining"), None);
    }

    #[test]
    fn test_run_stops_on_input_failure() {
        let counters = SharedCounterState::new();
        let publisher = Arc::new(MemoryPublisher::new());
        let sampler = sampler(
            vec![
                (Level::Low, 5_000),
                (Level::High, 190_000),
                (Level::Low, 5_000),
                (Level::High, 20_000),
                (Level::Low, 5_000),
            ],
            counters.clone(),
            publisher,
        );

        let err = sampler.run().unwrap_err();

        assert!(matches!(err, GaugeError::ScriptExhausted));
        // Both pulses were seen before the script ran out; only one counted
        assert_eq!(
            counters.peek(),
            CounterSnapshot {
                pulse_count: 1,
                accumulated_micros: 190_000
            }
        );
    }
}
