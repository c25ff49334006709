//! # Value Publication
//!
//! The roof controller and the rrdtool updater never talk to this process
//! directly. They poll small files in `/dev/shm` instead, one value per file.
//! Every published value is addressed by a channel and a key and lands in a
//! file named `{channel}_{key}`:
//!
//! | channel          | key          | content                              |
//! |------------------|--------------|--------------------------------------|
//! | `value_raindrop` | `history`    | last hour of drops, oldest first     |
//! | `value_raindrop` | `sum`        | total drops in the last hour         |
//! | `value_raindrop` | `report`     | last [`RainReport`](crate::RainReport) as JSON |
//! | `rrdupdate`      | `rainsensor` | rrdtool update command               |
//! | `state`          | `raining`    | `1` while raining, `0` once dry      |

use crate::GaugeError;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::info;

pub const RAINDROP_CHANNEL: &str = "value_raindrop";
pub const RRD_CHANNEL: &str = "rrdupdate";
pub const STATE_CHANNEL: &str = "state";

/// Destination for published values.
///
/// Shared by both tasks, hence `&self` and the `Send + Sync` bound. A failed
/// publish is fatal to the caller.
pub trait ValuePublisher: Send + Sync {
    fn publish(&self, channel: &str, key: &str, value: &str) -> Result<(), GaugeError>;
}

fn value_name(channel: &str, key: &str) -> String {
    format!("{channel}_{key}")
}

/// Writes each value to `{dir}/{channel}_{key}`, newline-terminated.
///
/// Each value is staged in `{channel}_{key}.tmp` and renamed into place.
#[derive(Debug)]
pub struct ShmPublisher {
    dir: PathBuf,
}

impl ShmPublisher {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, channel: &str, key: &str) -> PathBuf {
        self.dir.join(value_name(channel, key))
    }
}

impl ValuePublisher for ShmPublisher {
    fn publish(&self, channel: &str, key: &str, value: &str) -> Result<(), GaugeError> {
        let path = self.path_for(channel, key);
        let staging = self.dir.join(format!("{}.tmp", value_name(channel, key)));
        // Readers see either the old value or the new one, never a truncated file
        fs::write(&staging, format!("{value}\n"))
            .and_then(|_| fs::rename(&staging, &path))
            .map_err(|source| GaugeError::Publish {
                name: path.display().to_string(),
                source,
            })
    }
}

/// Keeps the latest value per name in memory.
#[derive(Debug, Default)]
pub struct MemoryPublisher {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest value published under `{channel}_{key}`
    pub fn get(&self, channel: &str, key: &str) -> Option<String> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.get(&value_name(channel, key)).cloned()
    }
}

impl ValuePublisher for MemoryPublisher {
    fn publish(&self, channel: &str, key: &str, value: &str) -> Result<(), GaugeError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(value_name(channel, key), value.to_string());
        Ok(())
    }
}

/// Logs each value, for `--simulate` runs.
#[derive(Debug, Default)]
pub struct LogPublisher;

impl ValuePublisher for LogPublisher {
    fn publish(&self, channel: &str, key: &str, value: &str) -> Result<(), GaugeError> {
        info!(name = %value_name(channel, key), value, "publish");
        Ok(())
    }
}
