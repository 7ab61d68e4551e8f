// SPDX-License-Identifier: GPL-3.0-only

//! Frame delivery pump
//!
//! The background half of the pipeline: a dedicated thread pulls events
//! from the camera device, pushes frames through the effect controller,
//! and hands the results to the display sink. The pump owns its thread
//! and joins it on stop or drop; the session coordinator only starts and
//! stops it.

use crate::constants;
use crate::controller::{EffectController, FrameOutcome, lock};
use crate::errors::PipelineError;
use crate::session::{CameraDevice, DisplaySink, RawFrame, SourceEvent};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use tracing::{debug, trace, warn};

/// Background thread moving frames from a device into a sink
pub struct DeliveryLoop {
    handle: Option<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl DeliveryLoop {
    /// Spawn the pump over an already-opened device. Runs until
    /// [`stop`](Self::stop) or drop.
    pub(crate) fn spawn(
        device: Arc<Mutex<Box<dyn CameraDevice>>>,
        sink: Arc<Mutex<Box<dyn DisplaySink>>>,
        controller: Arc<EffectController>,
    ) -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&shutdown);

        let handle = thread::spawn(move || {
            debug!("Frame delivery started");
            while !stop_flag.load(Ordering::SeqCst) {
                // Hold the device lock only while polling so focus and
                // orientation requests are never starved
                let event = lock(&device).poll_event(constants::SOURCE_POLL);
                match event {
                    Some(SourceEvent::Frame(frame)) => deliver(frame, &controller, &sink),
                    Some(SourceEvent::FrameRateChanged(fps)) => {
                        lock(&sink).frame_rate_changed(fps);
                    }
                    None => {}
                }
            }
            debug!("Frame delivery exiting");
        });

        Self {
            handle: Some(handle),
            shutdown,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Signal shutdown and wait for the thread to finish
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            warn!("Frame delivery thread panicked");
        }
    }
}

impl Drop for DeliveryLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Run one raw frame through the active effect and present the result.
/// A dropped frame is skipped silently; a render failure discards the
/// frame and delivery continues.
fn deliver(
    mut frame: RawFrame,
    controller: &EffectController,
    sink: &Mutex<Box<dyn DisplaySink>>,
) {
    let outcome = frame
        .view()
        .map_err(PipelineError::from)
        .and_then(|mut view| controller.process_frame(&mut view));
    match outcome {
        Ok(FrameOutcome::Rendered) | Ok(FrameOutcome::Idle) => lock(sink).present(&frame),
        Ok(FrameOutcome::Dropped) => trace!("Frame dropped, gate busy"),
        Err(e) => warn!(error = %e, "Render failed, discarding frame"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::controller::Gate;
    use crate::effects::{EffectCatalog, SourceBinding};
    use crate::frame::Resolution;
    use crate::sources::{NullSink, SinkStats, TestPatternSource};
    use std::time::Duration;

    fn running_pump() -> (DeliveryLoop, SinkStats) {
        let resolution = Resolution::new(16, 16);
        let mut source = TestPatternSource::new().with_resolutions(vec![resolution]);
        source.open(resolution).expect("synthetic source opens");
        let (sink, stats) = NullSink::new();

        let controller = Arc::new(EffectController::new(
            Arc::new(Gate::new()),
            EffectCatalog::builtin(),
            PipelineConfig::default(),
        ));
        controller.activate(SourceBinding { resolution });

        let pump = DeliveryLoop::spawn(
            Arc::new(Mutex::new(Box::new(source) as Box<dyn CameraDevice>)),
            Arc::new(Mutex::new(Box::new(sink) as Box<dyn DisplaySink>)),
            controller,
        );
        (pump, stats)
    }

    #[test]
    fn pump_moves_frames_from_source_to_sink() {
        let (mut pump, stats) = running_pump();
        thread::sleep(Duration::from_millis(300));
        pump.stop();

        assert!(stats.frames_presented() > 0, "no frames reached the sink");
        assert_eq!(stats.frame_rate(), 30, "rate announcement was not relayed");
    }

    #[test]
    fn stop_joins_the_thread() {
        let (mut pump, _stats) = running_pump();
        assert!(pump.is_running());
        pump.stop();
        assert!(!pump.is_running());
    }

    #[test]
    fn dropping_the_pump_halts_delivery() {
        let (pump, stats) = running_pump();
        thread::sleep(Duration::from_millis(100));
        drop(pump);

        let settled = stats.frames_presented();
        thread::sleep(Duration::from_millis(100));
        assert_eq!(stats.frames_presented(), settled);
    }
}
