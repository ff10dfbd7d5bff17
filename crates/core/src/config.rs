//! Runtime configuration for the frame pacer demo.
//!
//! Settings are collected from command-line flags, with defaults that match
//! a typical triple-buffered setup. Only the pipelining depth affects
//! correctness; everything else shapes the simulated workload.

use std::time::Duration;

use crate::error::{Error, Result};

/// Upper bound on pipelining depth. Deeper queues add latency without
/// improving throughput, so values beyond this are treated as config errors.
pub const MAX_FRAMES_IN_FLIGHT: usize = 8;

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Number of frame-in-flight slots (pipelining depth), fixed at startup.
    pub frames_in_flight: usize,
    /// Total number of frames the demo loop drives before exiting.
    pub frame_count: u64,
    /// Simulated consumer-side execution time per frame.
    pub workload: Duration,
    /// Upper bound on any single fence wait before it is reported as a hang.
    pub wait_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            frames_in_flight: 3,
            frame_count: 240,
            workload: Duration::from_micros(2_000),
            wait_timeout: Duration::from_secs(2),
        }
    }
}

impl Config {
    /// Parse configuration from process arguments (skipping the binary name).
    pub fn from_env() -> Result<Self> {
        Self::parse(std::env::args().skip(1))
    }

    /// Parse configuration from an argument list.
    ///
    /// Unrecognized flags are rejected rather than ignored so typos surface
    /// at startup instead of silently running with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] on an unknown flag, a missing or
    /// non-numeric value, or an out-of-range setting.
    pub fn parse(mut args: impl Iterator<Item = String>) -> Result<Self> {
        let mut config = Self::default();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-f" | "--frames-in-flight" => {
                    config.frames_in_flight = parse_value(arg.as_str(), args.next())?;
                }
                "-n" | "--frames" => {
                    config.frame_count = parse_value(arg.as_str(), args.next())?;
                }
                "--workload-us" => {
                    let us: u64 = parse_value(arg.as_str(), args.next())?;
                    config.workload = Duration::from_micros(us);
                }
                "--timeout-ms" => {
                    let ms: u64 = parse_value(arg.as_str(), args.next())?;
                    config.wait_timeout = Duration::from_millis(ms);
                }
                other => {
                    return Err(Error::Config(format!("unknown flag: {other}")));
                }
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate settings that have hard bounds.
    pub fn validate(&self) -> Result<()> {
        if self.frames_in_flight == 0 || self.frames_in_flight > MAX_FRAMES_IN_FLIGHT {
            return Err(Error::Config(format!(
                "frames-in-flight must be between 1 and {}, got {}",
                MAX_FRAMES_IN_FLIGHT, self.frames_in_flight
            )));
        }
        if self.frame_count == 0 {
            return Err(Error::Config("frames must be at least 1".into()));
        }
        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(flag: &str, value: Option<String>) -> Result<T> {
    let value = value.ok_or_else(|| Error::Config(format!("{flag} requires a value")))?;
    value
        .parse()
        .map_err(|_| Error::Config(format!("{flag}: invalid value '{value}'")))
}
