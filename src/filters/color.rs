// SPDX-License-Identifier: GPL-3.0-only

//! Single-pass color filters
//!
//! Each filter rewrites the plane pixel by pixel in RGB space. Alpha is
//! carried through untouched.

use super::{Filter, RenderCtx, from_rgb, luma, to_rgb};
use crate::errors::RenderResult;
use crate::frame::FramePlane;

/// Uniform brightness lift (negative amounts darken)
pub struct Brightness {
    amount: f32,
}

impl Brightness {
    pub fn new(amount: f32) -> Self {
        Self {
            amount: amount.clamp(-1.0, 1.0),
        }
    }
}

impl Filter for Brightness {
    fn apply(&self, mut plane: FramePlane, _ctx: &mut RenderCtx<'_>) -> RenderResult<FramePlane> {
        for px in plane.pixels_mut() {
            let (r, g, b) = to_rgb(*px);
            *px = from_rgb(r + self.amount, g + self.amount, b + self.amount, px[3]);
        }
        Ok(plane)
    }
}

/// Per-channel adjustment in [-1.0, 1.0]
///
/// -1.0 removes a channel entirely, +1.0 drives it to full, 0.0 leaves it
/// unchanged. Matches the semantics of a classic color-adjust filter.
pub struct ColorAdjust {
    red: f32,
    green: f32,
    blue: f32,
}

impl ColorAdjust {
    pub fn new(red: f32, green: f32, blue: f32) -> Self {
        Self {
            red: red.clamp(-1.0, 1.0),
            green: green.clamp(-1.0, 1.0),
            blue: blue.clamp(-1.0, 1.0),
        }
    }

    #[inline]
    fn adjust(value: f32, amount: f32) -> f32 {
        if amount >= 0.0 {
            value + (1.0 - value) * amount
        } else {
            value * (1.0 + amount)
        }
    }
}

impl Filter for ColorAdjust {
    fn apply(&self, mut plane: FramePlane, _ctx: &mut RenderCtx<'_>) -> RenderResult<FramePlane> {
        for px in plane.pixels_mut() {
            let (r, g, b) = to_rgb(*px);
            *px = from_rgb(
                Self::adjust(r, self.red),
                Self::adjust(g, self.green),
                Self::adjust(b, self.blue),
                px[3],
            );
        }
        Ok(plane)
    }
}

/// BT.601 grayscale
pub struct Grayscale;

impl Filter for Grayscale {
    fn apply(&self, mut plane: FramePlane, _ctx: &mut RenderCtx<'_>) -> RenderResult<FramePlane> {
        for px in plane.pixels_mut() {
            let (r, g, b) = to_rgb(*px);
            let gray = luma(r, g, b);
            *px = from_rgb(gray, gray, gray, px[3]);
        }
        Ok(plane)
    }
}

/// Inverted grayscale
pub struct GrayscaleNegative;

impl Filter for GrayscaleNegative {
    fn apply(&self, mut plane: FramePlane, _ctx: &mut RenderCtx<'_>) -> RenderResult<FramePlane> {
        for px in plane.pixels_mut() {
            let (r, g, b) = to_rgb(*px);
            let gray = 1.0 - luma(r, g, b);
            *px = from_rgb(gray, gray, gray, px[3]);
        }
        Ok(plane)
    }
}

/// Color negative
pub struct Negative;

impl Filter for Negative {
    fn apply(&self, mut plane: FramePlane, _ctx: &mut RenderCtx<'_>) -> RenderResult<FramePlane> {
        for px in plane.pixels_mut() {
            let (r, g, b) = to_rgb(*px);
            *px = from_rgb(1.0 - r, 1.0 - g, 1.0 - b, px[3]);
        }
        Ok(plane)
    }
}

/// Warm sepia tone derived from luminance
pub struct Sepia;

impl Filter for Sepia {
    fn apply(&self, mut plane: FramePlane, _ctx: &mut RenderCtx<'_>) -> RenderResult<FramePlane> {
        for px in plane.pixels_mut() {
            let (r, g, b) = to_rgb(*px);
            let luminance = luma(r, g, b);
            *px = from_rgb(
                luminance * 1.2 + 0.1,
                luminance * 0.9 + 0.05,
                luminance * 0.7,
                px[3],
            );
        }
        Ok(plane)
    }
}
