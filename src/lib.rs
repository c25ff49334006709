//! # Rain Gauge Core Library
//!
//! This library measures the relay pulses of an optical rain sensor (Hydreon
//! RG-11 style) and turns them into per-minute drop counts. It is written for a
//! Raspberry Pi sitting next to an observatory roof controller, where the only
//! questions that matter are "is it raining right now?" and "how much fell in
//! the last hour?".
//!
//! ## Design Philosophy
//!
//! ### Two tasks, one lock
//! - **Sampler**: [`sampler::PulseSampler`] blocks on the sensor input, times
//!   every pulse with [`edge_timer::EdgeTimer`], filters noise with
//!   [`classifier::PulseClassifier`] and records accepted pulses.
//! - **Reporter**: [`reporter::ReportingTask`] wakes once per period, drains the
//!   counters, updates the rolling history and publishes the results.
//! - **Shared state**: [`counter::SharedCounterState`] is the only thing both
//!   tasks touch. All of its fields sit behind a single mutex so a drain never
//!   sees a half-recorded pulse.
//!
//! ### Pulse Encoding
//! The sensor holds its relay closed for a time proportional to the amount of
//! water it detected. One drop corresponds to [`DEFAULT_PULSE_UNIT_MICROS`]
//! microseconds of closed relay:
//! - **Noise**: pulses shorter than half a unit are dropped
//! - **Drops**: `floor(duration / unit)` per pulse, `floor(total / unit)` per period
//!
//! ### Data Flow
//! 1. **Sample**: sensor input → pulse duration → classification → counters
//! 2. **Report**: counters → drain → [`RainReport`] → history → publisher
//! 3. **Publish**: values land in `/dev/shm` where the roof controller reads them
//!
//! ## Core Types
//!
//! - [`PulseMeasurement`]: the duration of one relay pulse
//! - [`Classification`]: the verdict on a single pulse
//! - [`CounterSnapshot`]: what a drain hands back to the reporter
//! - [`RainReport`]: one reporting period, ready to be published

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

// Module declarations
pub mod classifier;
pub mod clock;
pub mod config;
pub mod counter;
pub mod edge_timer;
pub mod error;
pub mod history;
pub mod input;
pub mod publisher;
pub mod reporter;
pub mod sampler;

pub use error::GaugeError;

/// Microseconds of closed relay that represent exactly one drop.
pub const DEFAULT_PULSE_UNIT_MICROS: u64 = 190_000;

/// Default input polling interval in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10;

/// Default reporting period in seconds.
pub const DEFAULT_REPORT_INTERVAL_SECS: u64 = 60;

/// Number of reporting periods kept in the rolling history (one hour at the
/// default period).
pub const HISTORY_LEN: usize = 60;

/// The measured duration of a single low→high→low pulse.
///
/// Produced once per pulse by the edge timer and consumed immediately by the
/// classifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PulseMeasurement {
    pub duration_micros: u64,
}

/// Verdict for a single pulse.
///
/// An accepted pulse may still carry zero drops: anything between half a unit
/// and one full unit is real rain, just not a whole drop of it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Classification {
    pub drops: u64,
    pub accepted: bool,
}

/// Counter values captured by a drain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub pulse_count: u64,
    pub accumulated_micros: u64,
}

/// One reporting period's worth of rain data.
///
/// # Example
/// ```
/// use chrono::{Local, TimeZone};
/// use rain_gauge_lib::RainReport;
///
/// let report = RainReport {
///     timestamp: Local.with_ymd_and_hms(2024, 6, 16, 21, 5, 0).unwrap(),
///     pulse_count: 2,
///     accumulated_micros: 570_000,
///     drops: 3,
/// };
///
/// assert_eq!(report.rrd_update(), "update rainsensor.rrd -t pulses:drops N:2:3");
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RainReport {
    pub timestamp: DateTime<Local>,
    pub pulse_count: u64,
    pub accumulated_micros: u64,
    pub drops: u64,
}

impl RainReport {
    /// Command line for the rrdtool updater that watches `rrdupdate_rainsensor`.
    pub fn rrd_update(&self) -> String {
        format!(
            "update rainsensor.rrd -t pulses:drops N:{}:{}",
            self.pulse_count, self.drops
        )
    }
}

impl fmt::Display for RainReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} pulses={:>3} microseconds={:>8} -> drops={:>3}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.pulse_count,
            self.accumulated_micros,
            self.drops
        )
    }
}
