// SPDX-License-Identifier: GPL-3.0-only

//! Session coordinator and external boundaries
//!
//! The coordinator owns the device lifecycle and wires the two concurrent
//! paths together: the background delivery loop pushing frames through the
//! effect controller into the display sink, and the foreground interactive
//! path (effect navigation, orientation changes, tap-to-focus). Both paths
//! serialize through the one exclusion gate.

use crate::config::PipelineConfig;
use crate::controller::{EffectController, Gate, lock};
use crate::effects::{EffectCatalog, SourceBinding};
use crate::errors::SessionError;
use crate::frame::{FrameBufferView, Resolution};
use crate::frame_loop::DeliveryLoop;
use crate::orientation::{
    DeviceOrientation, OrientationState, SensorFacing, ViewportTransform, compute_transform,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info};

/// One raw frame delivered by the source: owned pixel bytes plus geometry
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub resolution: Resolution,
    /// Bytes per scanline, including any padding
    pub stride: u32,
    pub data: Vec<u8>,
}

impl RawFrame {
    /// Borrow the frame memory for one processing call
    pub fn view(&mut self) -> crate::errors::RenderResult<FrameBufferView<'_>> {
        FrameBufferView::new(
            &mut self.data,
            self.resolution.width,
            self.resolution.height,
            self.stride,
        )
    }
}

/// Events produced by the frame source boundary
pub enum SourceEvent {
    /// A frame arrived at the hardware-determined cadence
    Frame(RawFrame),
    /// The measured delivery rate changed; relayed upward unmodified
    FrameRateChanged(u32),
}

/// Frame source and device control boundary
///
/// Delivers frames and accepts the orientation/focus requests the preview
/// needs to stay consistent with captured stills. Real hardware lives
/// behind this trait; [`crate::sources::TestPatternSource`] is the built-in
/// synthetic implementation.
pub trait CameraDevice: Send {
    /// Supported preview modes, ordered low to high; the coordinator picks
    /// the last (highest-resolution) entry
    fn supported_preview_resolutions(&self) -> Vec<Resolution>;

    fn open(&mut self, resolution: Resolution) -> Result<(), SessionError>;

    fn close(&mut self);

    /// Physical mounting angle of the sensor, clockwise degrees
    fn sensor_rotation_degrees(&self) -> f64;

    fn facing(&self) -> SensorFacing;

    /// Record a rotation angle as orientation metadata so captured stills
    /// match the displayed preview
    fn encode_orientation(&mut self, rotation_degrees: f64);

    /// Focus at a point in normalized frame coordinates
    fn focus(&mut self, x: f32, y: f32);

    /// Wait up to `wait` for the next source event
    fn poll_event(&mut self, wait: Duration) -> Option<SourceEvent>;
}

/// Display sink boundary
///
/// Receives the processed stream plus the orientation transform used for
/// compositing. Set once at session start, cleared at session end.
pub trait DisplaySink: Send {
    fn attach(&mut self, resolution: Resolution);

    fn present(&mut self, frame: &RawFrame);

    fn set_transform(&mut self, transform: &ViewportTransform);

    fn frame_rate_changed(&mut self, fps: u32);

    fn detach(&mut self);
}

/// Session lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Uninitialized,
    Starting,
    Running,
    Stopping,
}

/// Top-level lifecycle state machine
pub struct SessionCoordinator {
    gate: Arc<Gate>,
    controller: Arc<EffectController>,
    device: Arc<Mutex<Box<dyn CameraDevice>>>,
    sink: Arc<Mutex<Box<dyn DisplaySink>>>,
    config: PipelineConfig,
    state: SessionState,
    orientation: DeviceOrientation,
    viewport: (f64, f64),
    resolution: Option<Resolution>,
    delivery: Option<DeliveryLoop>,
}

impl SessionCoordinator {
    pub fn new(
        device: Box<dyn CameraDevice>,
        sink: Box<dyn DisplaySink>,
        config: PipelineConfig,
    ) -> Self {
        let gate = Arc::new(Gate::new());
        let controller = Arc::new(EffectController::new(
            Arc::clone(&gate),
            EffectCatalog::builtin(),
            config.clone(),
        ));
        Self {
            gate,
            controller,
            device: Arc::new(Mutex::new(device)),
            sink: Arc::new(Mutex::new(sink)),
            config,
            state: SessionState::default(),
            orientation: DeviceOrientation::default(),
            viewport: (0.0, 0.0),
            resolution: None,
            delivery: None,
        }
    }

    /// The effect controller; the UI shell drives next/previous through it
    pub fn controller(&self) -> &Arc<EffectController> {
        &self.controller
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Viewport dimensions used for the orientation transform. Republishes
    /// the transform if the session is already running.
    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport = (width, height);
        if self.state == SessionState::Running {
            self.publish_orientation();
        }
    }

    /// Open the device at the highest supported preview resolution, build
    /// the effect slot, attach the sink, and spawn frame delivery.
    ///
    /// A device-open failure is fatal for the session and leaves no
    /// partial state behind.
    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::Uninitialized {
            return Err(SessionError::AlreadyStarted);
        }
        self.state = SessionState::Starting;
        info!("Starting session");

        match self.start_inner() {
            Ok(resolution) => {
                self.resolution = Some(resolution);
                self.state = SessionState::Running;
                info!(%resolution, effect = self.controller.current_effect_name(), "Session running");
                Ok(())
            }
            Err(e) => {
                self.state = SessionState::Uninitialized;
                Err(e)
            }
        }
    }

    fn start_inner(&mut self) -> Result<Resolution, SessionError> {
        let resolution = {
            let mut device = lock(&self.device);
            let resolutions = device.supported_preview_resolutions();
            // Highest-resolution policy: take the last entry of the
            // supported list
            let resolution = *resolutions
                .last()
                .ok_or(SessionError::NoPreviewResolution)?;
            device.open(resolution)?;
            resolution
        };

        self.controller.activate(SourceBinding { resolution });
        lock(&self.sink).attach(resolution);
        self.resolution = Some(resolution);
        self.publish_orientation();
        self.delivery = Some(DeliveryLoop::spawn(
            Arc::clone(&self.device),
            Arc::clone(&self.sink),
            Arc::clone(&self.controller),
        ));
        Ok(resolution)
    }

    /// Tear the session down: delivery loop first, then controller, sink,
    /// and device, in that order. Teardown retries the gate until acquired
    /// rather than dropping state; calling it on a stopped session is a
    /// safe no-op.
    pub fn stop(&mut self) {
        if self.state == SessionState::Uninitialized {
            debug!("Session already stopped");
            return;
        }
        self.state = SessionState::Stopping;
        info!("Stopping session");

        if let Some(mut delivery) = self.delivery.take() {
            delivery.stop();
        }
        {
            // One gate acquisition covers controller, sink, and device
            // teardown
            let gate = self.gate.acquire_retry(self.config.teardown_retry());
            self.controller.deactivate_locked(&gate);
            lock(&self.sink).detach();
            lock(&self.device).close();
        }
        self.resolution = None;
        self.state = SessionState::Uninitialized;
        info!("Session stopped");
    }

    /// React to a device orientation change: recompute the display
    /// transform and propagate it to sink and device.
    pub fn orientation_changed(&mut self, orientation: DeviceOrientation) {
        self.orientation = orientation;
        if self.state == SessionState::Running {
            self.publish_orientation();
        }
    }

    /// Tap-to-focus. Serializes through the exclusion gate so a focus
    /// request never runs concurrently with an effect switch; returns
    /// false if the gate stayed busy past the focus bound.
    pub fn focus(&mut self, x: f32, y: f32) -> bool {
        let Some(_gate) = self.gate.acquire_timeout(self.config.focus_wait()) else {
            debug!("Gate busy, focus request skipped");
            return false;
        };
        lock(&self.device).focus(x, y);
        true
    }

    fn publish_orientation(&self) {
        let Some(resolution) = self.resolution else {
            return;
        };
        let state = {
            let device = lock(&self.device);
            OrientationState {
                device: self.orientation,
                sensor_rotation_degrees: device.sensor_rotation_degrees(),
                facing: device.facing(),
            }
        };
        let transform = compute_transform(&state, resolution, self.viewport.0, self.viewport.1);
        debug!(
            rotation = transform.rotation_degrees,
            mirror = transform.mirror,
            "Publishing orientation transform"
        );
        lock(&self.sink).set_transform(&transform);
        lock(&self.device).encode_orientation(transform.rotation_degrees);
    }
}

impl Drop for SessionCoordinator {
    fn drop(&mut self) {
        if self.state != SessionState::Uninitialized {
            debug!("SessionCoordinator dropped while active, stopping");
            self.stop();
        }
    }
}
