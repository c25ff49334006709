//! Error types shared by the sampler, the reporter and the startup code.
//!
//! Nothing in this crate retries. A pulse that is too short is not an error at
//! all (the classifier just skips it); everything that ends up here is fatal
//! and is expected to terminate the process.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GaugeError {
    /// The sensor input could not be read
    #[error("sensor input: {0}")]
    Sensor(String),

    /// A scripted input ran past the end of its script
    #[error("scripted sensor input exhausted")]
    ScriptExhausted,

    /// Writing a published value failed (permissions, missing directory)
    #[error("publish {name}: {source}")]
    Publish {
        name: String,
        #[source]
        source: io::Error,
    },

    /// Config file operations failed
    #[error("config IO: {0}")]
    Io(#[from] io::Error),

    #[error("config serialize: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// Configuration values that would make the sampler or reporter misbehave
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}
