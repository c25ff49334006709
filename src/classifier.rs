//! Pulse classification: noise filter and drop count.

use crate::{Classification, PulseMeasurement};
use tracing::info;

/// Turns pulse durations into drop counts.
///
/// A pulse shorter than half a unit is relay bounce or electrical noise and is
/// rejected. Anything else is accepted and worth `floor(duration / unit)`
/// drops, so a pulse between half a unit and one unit is accepted with zero
/// drops. It still counts as rain.
#[derive(Clone, Copy, Debug)]
pub struct PulseClassifier {
    unit_micros: u64,
}

impl PulseClassifier {
    /// `unit_micros` must be non-zero; `Config::validate` guarantees it.
    pub fn new(unit_micros: u64) -> Self {
        Self { unit_micros }
    }

    pub fn unit_micros(&self) -> u64 {
        self.unit_micros
    }

    pub fn classify(&self, duration_micros: u64) -> Classification {
        if duration_micros < self.unit_micros / 2 {
            return Classification {
                drops: 0,
                accepted: false,
            };
        }

        Classification {
            drops: self.drops_for(duration_micros),
            accepted: true,
        }
    }

    /// Classify a measured pulse and log the verdict
    pub fn classify_pulse(&self, pulse: PulseMeasurement) -> Classification {
        let verdict = self.classify(pulse.duration_micros);
        if verdict.accepted {
            info!(
                microseconds = pulse.duration_micros,
                drops = verdict.drops,
                "pulse"
            );
        } else {
            info!(
                microseconds = pulse.duration_micros,
                "SKIP too brief pulse"
            );
        }
        verdict
    }

    /// Whole drops contained in `micros` of relay time
    pub fn drops_for(&self, micros: u64) -> u64 {
        micros / self.unit_micros
    }
}

impl Default for PulseClassifier {
    fn default() -> Self {
        Self::new(crate::DEFAULT_PULSE_UNIT_MICROS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_pulses_are_rejected() {
        let classifier = PulseClassifier::default();
        for d in [0, 1, 50_000, 94_999] {
            assert_eq!(
                classifier.classify(d),
                Classification {
                    drops: 0,
                    accepted: false
                },
                "duration {d} should be noise"
            );
        }
    }

    #[test]
    fn test_half_unit_is_accepted_with_zero_drops() {
        let classifier = PulseClassifier::default();
        assert_eq!(
            classifier.classify(95_000),
            Classification {
                drops: 0,
                accepted: true
            }
        );
        assert_eq!(classifier.classify(189_999).drops, 0);
        assert!(classifier.classify(189_999).accepted);
    }

    #[test]
    fn test_drops_are_floored() {
        let classifier = PulseClassifier::default();
        assert_eq!(classifier.classify(190_000).drops, 1);
        assert_eq!(classifier.classify(379_999).drops, 1);
        assert_eq!(classifier.classify(380_000).drops, 2);
        assert_eq!(classifier.classify(1_000_000).drops, 5);
    }

    #[test]
    fn test_custom_unit() {
        let classifier = PulseClassifier::new(100);
        assert!(!classifier.classify(49).accepted);
        assert_eq!(
            classifier.classify(250),
            Classification {
                drops: 2,
                accepted: true
            }
        );
    }
}
