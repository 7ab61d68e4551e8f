// SPDX-License-Identifier: GPL-3.0-only

//! Built-in frame sources and sinks
//!
//! [`TestPatternSource`] generates a paced synthetic BGRA gradient so the
//! full pipeline can run without camera hardware. [`NullSink`] discards
//! frames while counting them, exposing the counters through a shared
//! [`SinkStats`] handle for status readouts and tests.

use crate::constants::TEST_PATTERN_FPS;
use crate::errors::SessionError;
use crate::frame::{BGRA_BYTES_PER_PIXEL, Resolution};
use crate::orientation::{SensorFacing, ViewportTransform};
use crate::session::{CameraDevice, DisplaySink, RawFrame, SourceEvent};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Synthetic camera producing a moving BGRA gradient at a fixed cadence
pub struct TestPatternSource {
    resolutions: Vec<Resolution>,
    facing: SensorFacing,
    sensor_rotation_degrees: f64,
    open_resolution: Option<Resolution>,
    frame_interval: Duration,
    next_frame_at: Option<Instant>,
    frame_counter: u64,
    rate_announced: bool,
}

impl TestPatternSource {
    pub fn new() -> Self {
        Self {
            // Ordered low to high, like hardware mode lists
            resolutions: vec![Resolution::new(320, 240), Resolution::new(640, 480)],
            facing: SensorFacing::Back,
            sensor_rotation_degrees: 0.0,
            open_resolution: None,
            frame_interval: Duration::from_secs(1) / TEST_PATTERN_FPS,
            next_frame_at: None,
            frame_counter: 0,
            rate_announced: false,
        }
    }

    /// Replace the supported mode list; entries must stay ordered low to
    /// high for the highest-resolution selection policy to hold
    pub fn with_resolutions(mut self, resolutions: Vec<Resolution>) -> Self {
        self.resolutions = resolutions;
        self
    }

    pub fn with_facing(mut self, facing: SensorFacing) -> Self {
        self.facing = facing;
        self
    }

    pub fn with_sensor_rotation(mut self, degrees: f64) -> Self {
        self.sensor_rotation_degrees = degrees;
        self
    }

    fn generate_frame(&mut self, resolution: Resolution) -> RawFrame {
        let width = resolution.width;
        let height = resolution.height;
        let mut data = Vec::with_capacity(resolution.byte_len());
        let phase = (self.frame_counter % 256) as u32;
        for y in 0..height {
            for x in 0..width {
                let b = (x * 255 / width.max(1)) as u8;
                let g = (y * 255 / height.max(1)) as u8;
                let r = ((x + y + phase) % 256) as u8;
                data.extend_from_slice(&[b, g, r, 255]);
            }
        }
        self.frame_counter += 1;
        RawFrame {
            resolution,
            stride: width * BGRA_BYTES_PER_PIXEL,
            data,
        }
    }
}

impl Default for TestPatternSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraDevice for TestPatternSource {
    fn supported_preview_resolutions(&self) -> Vec<Resolution> {
        self.resolutions.clone()
    }

    fn open(&mut self, resolution: Resolution) -> Result<(), SessionError> {
        if !self.resolutions.contains(&resolution) {
            return Err(SessionError::DeviceOpenFailed(format!(
                "unsupported resolution {}",
                resolution
            )));
        }
        info!(%resolution, "Test pattern source opened");
        self.open_resolution = Some(resolution);
        self.next_frame_at = Some(Instant::now());
        self.frame_counter = 0;
        self.rate_announced = false;
        Ok(())
    }

    fn close(&mut self) {
        if self.open_resolution.take().is_some() {
            info!("Test pattern source closed");
        }
        self.next_frame_at = None;
    }

    fn sensor_rotation_degrees(&self) -> f64 {
        self.sensor_rotation_degrees
    }

    fn facing(&self) -> SensorFacing {
        self.facing
    }

    fn encode_orientation(&mut self, rotation_degrees: f64) {
        debug!(rotation = rotation_degrees, "Orientation metadata recorded");
    }

    fn focus(&mut self, x: f32, y: f32) {
        debug!(x, y, "Focus requested on test pattern source");
    }

    fn poll_event(&mut self, wait: Duration) -> Option<SourceEvent> {
        let Some(resolution) = self.open_resolution else {
            thread::sleep(wait);
            return None;
        };
        if !self.rate_announced {
            self.rate_announced = true;
            return Some(SourceEvent::FrameRateChanged(TEST_PATTERN_FPS));
        }

        let due = self.next_frame_at.unwrap_or_else(Instant::now);
        let now = Instant::now();
        if now < due {
            let remaining = due - now;
            if remaining > wait {
                thread::sleep(wait);
                return None;
            }
            thread::sleep(remaining);
        }
        self.next_frame_at = Some(due + self.frame_interval);
        Some(SourceEvent::Frame(self.generate_frame(resolution)))
    }
}

/// Shared counters published by [`NullSink`]
#[derive(Clone)]
pub struct SinkStats {
    frames: Arc<AtomicU64>,
    frame_rate: Arc<AtomicU32>,
    attached: Arc<AtomicBool>,
}

impl SinkStats {
    pub fn frames_presented(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    pub fn frame_rate(&self) -> u32 {
        self.frame_rate.load(Ordering::Relaxed)
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Relaxed)
    }
}

/// Sink that discards frames while counting them
pub struct NullSink {
    stats: SinkStats,
}

impl NullSink {
    pub fn new() -> (Self, SinkStats) {
        let stats = SinkStats {
            frames: Arc::new(AtomicU64::new(0)),
            frame_rate: Arc::new(AtomicU32::new(0)),
            attached: Arc::new(AtomicBool::new(false)),
        };
        (
            Self {
                stats: stats.clone(),
            },
            stats,
        )
    }
}

impl DisplaySink for NullSink {
    fn attach(&mut self, resolution: Resolution) {
        debug!(%resolution, "Null sink attached");
        self.stats.attached.store(true, Ordering::Relaxed);
    }

    fn present(&mut self, _frame: &RawFrame) {
        self.stats.frames.fetch_add(1, Ordering::Relaxed);
    }

    fn set_transform(&mut self, transform: &ViewportTransform) {
        debug!(
            rotation = transform.rotation_degrees,
            mirror = transform.mirror,
            "Null sink transform updated"
        );
    }

    fn frame_rate_changed(&mut self, fps: u32) {
        debug!(fps, "Null sink frame rate updated");
        self.stats.frame_rate.store(fps, Ordering::Relaxed);
    }

    fn detach(&mut self) {
        debug!("Null sink detached");
        self.stats.attached.store(false, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_rejects_unsupported_resolution() {
        let mut source = TestPatternSource::new();
        assert!(source.open(Resolution::new(123, 45)).is_err());
        assert!(source.open(Resolution::new(640, 480)).is_ok());
    }

    #[test]
    fn first_event_after_open_is_frame_rate() {
        let mut source = TestPatternSource::new();
        source.open(Resolution::new(320, 240)).expect("open");
        match source.poll_event(Duration::from_millis(50)) {
            Some(SourceEvent::FrameRateChanged(fps)) => assert_eq!(fps, TEST_PATTERN_FPS),
            _ => panic!("expected frame rate announcement"),
        }
    }

    #[test]
    fn frames_carry_declared_geometry() {
        let mut source = TestPatternSource::new();
        let resolution = Resolution::new(320, 240);
        source.open(resolution).expect("open");
        // Skip the rate announcement
        let _ = source.poll_event(Duration::from_millis(50));

        let frame = loop {
            match source.poll_event(Duration::from_millis(50)) {
                Some(SourceEvent::Frame(frame)) => break frame,
                Some(_) => {}
                None => {}
            }
        };
        assert_eq!(frame.resolution, resolution);
        assert_eq!(frame.stride, 320 * BGRA_BYTES_PER_PIXEL);
        assert_eq!(frame.data.len(), resolution.byte_len());
        // Alpha stays opaque everywhere
        assert!(frame.data.chunks_exact(4).all(|px| px[3] == 255));
    }

    #[test]
    fn null_sink_counts_presented_frames() {
        let (mut sink, stats) = NullSink::new();
        sink.attach(Resolution::new(320, 240));
        assert!(stats.is_attached());

        let frame = RawFrame {
            resolution: Resolution::new(320, 240),
            stride: 320 * BGRA_BYTES_PER_PIXEL,
            data: vec![0; Resolution::new(320, 240).byte_len()],
        };
        sink.present(&frame);
        sink.present(&frame);
        sink.frame_rate_changed(30);

        assert_eq!(stats.frames_presented(), 2);
        assert_eq!(stats.frame_rate(), 30);

        sink.detach();
        assert!(!stats.is_attached());
    }
}
