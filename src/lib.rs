// SPDX-License-Identifier: GPL-3.0-only

//! Viewfinder - a real-time camera preview filter pipeline
//!
//! This library applies a catalog of pixel effects to a live BGRA frame
//! stream, frame by frame, in place. A single exclusion gate serializes
//! frame rendering against effect switches, focus requests, and teardown;
//! frames that cannot acquire the gate within a bound are dropped rather
//! than stalling the stream.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`session`]: Lifecycle state machine wiring source, controller, and sink
//! - [`controller`]: The exclusion gate and the active effect slot
//! - [`engine`]: Drives one effect graph against one frame buffer
//! - [`effects`]: The fixed, indexed catalog of effect presets
//! - [`filters`]: The individual pixel filters and chain composition
//! - [`frame`]: BGRA buffer views and owned scratch planes
//! - [`orientation`]: Display-side transform for device/sensor orientation
//! - [`sources`]: Built-in synthetic frame source and counting sink
//! - [`config`]: Gate wait-bound configuration

pub mod config;
pub mod constants;
pub mod controller;
pub mod effects;
pub mod engine;
pub mod errors;
pub mod filters;
pub mod frame;
pub mod frame_loop;
pub mod orientation;
pub mod session;
pub mod sources;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use controller::{EffectController, FrameOutcome, Gate};
pub use effects::{EffectCatalog, SourceBinding};
pub use engine::{EffectGraph, RenderEngine};
pub use errors::{PipelineError, PipelineResult, RenderError, SessionError};
pub use frame::{FrameBufferView, FramePlane, Resolution};
pub use orientation::{DeviceOrientation, OrientationState, SensorFacing, ViewportTransform};
pub use session::{
    CameraDevice, DisplaySink, RawFrame, SessionCoordinator, SessionState, SourceEvent,
};
pub use sources::{NullSink, SinkStats, TestPatternSource};
