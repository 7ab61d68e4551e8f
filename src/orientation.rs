// SPDX-License-Identifier: GPL-3.0-only

//! Viewport orientation adapter
//!
//! Computes the display-side transform for the current device orientation
//! and camera sensor: how far to rotate the output buffer, whether to
//! mirror it, and how much to scale it to fill the viewport. Derived fresh
//! on every orientation-change event and once at session start; never
//! persisted.

use crate::frame::Resolution;

/// Device orientation category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceOrientation {
    #[default]
    Portrait,
    LandscapeLeft,
    LandscapeRight,
}

/// Whether the sensor points toward or away from the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SensorFacing {
    /// Toward the user; the preview must be mirrored
    Front,
    /// Away from the user; never mirrored
    #[default]
    Back,
}

/// Inputs to the transform computation
#[derive(Debug, Clone, Copy)]
pub struct OrientationState {
    pub device: DeviceOrientation,
    /// Physical mounting angle of the sensor, clockwise degrees
    pub sensor_rotation_degrees: f64,
    pub facing: SensorFacing,
}

/// Display-side compositing transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportTransform {
    /// Rotation applied around the center point, degrees
    pub rotation_degrees: f64,
    /// Horizontal flip for front-facing sensors
    pub mirror: bool,
    /// Uniform fill scale (covers the viewport, may crop)
    pub scale: f64,
    pub center_x: f64,
    pub center_y: f64,
}

impl ViewportTransform {
    /// Horizontal scale with the mirror flip folded in as a sign, the form
    /// compositors consume directly
    pub fn scale_x(&self) -> f64 {
        if self.mirror { -self.scale } else { self.scale }
    }

    pub fn scale_y(&self) -> f64 {
        self.scale
    }
}

/// Compute the transform presenting `preview` correctly inside a viewport
/// of `viewport_width` x `viewport_height`.
///
/// Rotation rule: sensor rotation minus 90 degrees in landscape-left, plus
/// 90 in landscape-right, unchanged upright. Scale fills rather than
/// letterboxes: the larger of the two viewport/rotated-source ratios.
pub fn compute_transform(
    state: &OrientationState,
    preview: Resolution,
    viewport_width: f64,
    viewport_height: f64,
) -> ViewportTransform {
    let rotation_degrees = match state.device {
        DeviceOrientation::LandscapeLeft => state.sensor_rotation_degrees - 90.0,
        DeviceOrientation::LandscapeRight => state.sensor_rotation_degrees + 90.0,
        DeviceOrientation::Portrait => state.sensor_rotation_degrees,
    };

    let (rotated_width, rotated_height) = rotated_bounds(
        preview.width as f64,
        preview.height as f64,
        rotation_degrees,
    );
    let scale = (viewport_width / rotated_width).max(viewport_height / rotated_height);

    ViewportTransform {
        rotation_degrees,
        mirror: state.facing == SensorFacing::Front,
        scale,
        center_x: viewport_width / 2.0,
        center_y: viewport_height / 2.0,
    }
}

/// Axis-aligned bounding box of a `width` x `height` rect rotated by
/// `degrees`
fn rotated_bounds(width: f64, height: f64, degrees: f64) -> (f64, f64) {
    let radians = degrees.to_radians();
    let (sin, cos) = (radians.sin().abs(), radians.cos().abs());
    (width * cos + height * sin, width * sin + height * cos)
}
