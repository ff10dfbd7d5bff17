//! Frame pacer demo - main entry point.
//!
//! Drives a pipelined frame loop against the software execution queue:
//! wait for the incoming slot, submit that frame's simulated workload, and
//! signal. With the default settings the producer stays up to three frames
//! ahead of the consumer.

use std::sync::Arc;
use std::thread;

use anyhow::Result;
use tracing::{debug, error, info, warn};

use framepacer_core::{Config, FrameClock, init_logging};
use framepacer_engine::{EngineError, EngineResult, SoftwareQueue};
use framepacer_pacing::FramePacer;

fn main() -> Result<()> {
    init_logging();

    let config = Config::from_env()?;
    info!(
        "Starting frame pacer: {} frames in flight, {} frames, {:?} workload",
        config.frames_in_flight, config.frame_count, config.workload
    );

    let queue = Arc::new(SoftwareQueue::new()?);
    let mut pacer = FramePacer::new(Arc::clone(&queue), config.frames_in_flight);
    let mut clock = FrameClock::new();

    if let Err(e) = run_loop(&queue, &mut pacer, &mut clock, &config) {
        // A lost queue has no recovery path short of rebuilding the whole
        // execution context, so the loop ends here with a diagnostic.
        error!("Render loop aborted: {e}");
        return Err(e.into());
    }

    // Everything still in flight must finish before slot resources go away.
    let flushed = pacer.flush()?;

    let elapsed = clock.elapsed();
    info!(
        "Rendered {} frames in {:.2}s ({:.1} fps average), drained at value {}",
        config.frame_count,
        elapsed.as_secs_f64(),
        config.frame_count as f64 / elapsed.as_secs_f64(),
        flushed
    );

    Ok(())
}

/// Runs the pipelined loop for the configured number of frames.
fn run_loop(
    queue: &Arc<SoftwareQueue>,
    pacer: &mut FramePacer<SoftwareQueue>,
    clock: &mut FrameClock,
    config: &Config,
) -> EngineResult<()> {
    for frame in 0..config.frame_count {
        let slot = match pacer.begin_frame_timeout(config.wait_timeout) {
            Ok(slot) => slot,
            Err(EngineError::Timeout { value, timeout }) => {
                // One retry; a second miss is treated as a consumer hang.
                warn!(
                    "Frame {frame}: value {value} still outstanding after {timeout:?}, retrying"
                );
                pacer.begin_frame_timeout(config.wait_timeout)?
            }
            Err(e) => return Err(e),
        };

        // The recorded "commands" for this slot: a fixed chunk of
        // consumer-side execution time.
        let workload = config.workload;
        queue.submit(move || thread::sleep(workload))?;

        let value = pacer.end_frame()?;
        debug!("Frame {} submitted on slot {} (value {})", frame, slot, value);

        clock.tick();
        if let Some(fps) = clock.fps_report() {
            info!("{:.1} fps", fps);
        }
    }

    Ok(())
}
