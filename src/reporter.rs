//! # Periodic Rain Reports
//!
//! Once per reporting period the reporter drains the shared counters, turns
//! the accumulated relay time into drops and publishes everything the roof
//! controller and the graphs need:
//!
//! 1. **Drain**: take and reset pulse count and microseconds in one step
//! 2. **Report**: log the period and hand the rrdtool update line to the publisher
//! 3. **Dry check**: a period without a single drop clears the raining flag
//! 4. **History**: push the drop count into the rolling hour and publish it
//!
//! Drops are derived from the total microseconds of the period, not summed per
//! pulse, so several short pulses can add up to whole drops.
//!
//! The history buffer belongs to this task alone and needs no locking.

use crate::classifier::PulseClassifier;
use crate::counter::SharedCounterState;
use crate::history::DropHistory;
use crate::publisher::{ValuePublisher, RAINDROP_CHANNEL, RRD_CHANNEL};
use crate::{GaugeError, RainReport};
use chrono::{DateTime, Local};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::info;

pub struct ReportingTask {
    counters: SharedCounterState,
    classifier: PulseClassifier,
    history: DropHistory,
    publisher: Arc<dyn ValuePublisher>,
}

impl ReportingTask {
    pub fn new(
        counters: SharedCounterState,
        classifier: PulseClassifier,
        publisher: Arc<dyn ValuePublisher>,
    ) -> Self {
        Self {
            counters,
            classifier,
            history: DropHistory::new(),
            publisher,
        }
    }

    pub fn history(&self) -> &DropHistory {
        &self.history
    }

    /// Run one reporting cycle stamped with `now`.
    pub fn report_once(&mut self, now: DateTime<Local>) -> Result<RainReport, GaugeError> {
        let snapshot = self.counters.drain_and_reset();
        let report = RainReport {
            timestamp: now,
            pulse_count: snapshot.pulse_count,
            accumulated_micros: snapshot.accumulated_micros,
            drops: self.classifier.drops_for(snapshot.accumulated_micros),
        };

        info!("{report}");
        self.publisher
            .publish(RRD_CHANNEL, "rainsensor", &report.rrd_update())?;
        let json = serde_json::to_string(&report).map_err(|e| GaugeError::Publish {
            name: "report".to_string(),
            source: e.into(),
        })?;
        self.publisher.publish(RAINDROP_CHANNEL, "report", &json)?;

        if self
            .counters
            .clear_raining_and_publish(report.drops > 0, self.publisher.as_ref())?
        {
            info!("rain stopped");
        }

        self.history.record(report.drops);
        self.publisher
            .publish(RAINDROP_CHANNEL, "history", &self.history.render())?;
        self.publisher.publish(
            RAINDROP_CHANNEL,
            "sum",
            &self.history.total().to_string(),
        )?;

        Ok(report)
    }

    /// Report every `period`, starting one full period from now.
    ///
    /// Late ticks are delayed rather than bunched up, so every report still
    /// covers roughly one period of pulses.
    pub async fn run(mut self, period: Duration) -> Result<Infallible, GaugeError> {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            self.report_once(Local::now())?;
        }
    }
}
