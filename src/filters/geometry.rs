// SPDX-License-Identifier: GPL-3.0-only

//! Geometric filters
//!
//! Rotation by 90 or 270 degrees swaps the plane's dimensions; the render
//! engine rejects a finished pass whose dimensions no longer match the
//! target buffer, so rotations must compose back to the original shape
//! within one chain (as the mirror-via-rotation effect does).

use super::{Filter, RenderCtx};
use crate::errors::RenderResult;
use crate::frame::FramePlane;

/// Horizontal flip
pub struct Mirror;

impl Filter for Mirror {
    fn apply(&self, mut plane: FramePlane, _ctx: &mut RenderCtx<'_>) -> RenderResult<FramePlane> {
        let width = plane.width() as usize;
        let height = plane.height();
        let pixels = plane.pixels_mut();
        for y in 0..height as usize {
            pixels[y * width..(y + 1) * width].reverse();
        }
        Ok(plane)
    }
}

/// Clockwise rotation by a multiple of 90 degrees
pub struct Rotation {
    degrees: u32,
}

impl Rotation {
    /// Degrees are normalized into [0, 360) and snapped to the nearest
    /// supported quarter turn; anything else is treated as no rotation.
    pub fn new(degrees: i32) -> Self {
        Self {
            degrees: degrees.rem_euclid(360) as u32,
        }
    }
}

impl Filter for Rotation {
    fn apply(&self, plane: FramePlane, _ctx: &mut RenderCtx<'_>) -> RenderResult<FramePlane> {
        let (w, h) = (plane.width(), plane.height());
        match self.degrees {
            90 => {
                let mut out = FramePlane::new(h, w);
                for y in 0..w {
                    for x in 0..h {
                        out.set_pixel(x, y, plane.pixel(y, h - 1 - x));
                    }
                }
                Ok(out)
            }
            180 => {
                let mut out = FramePlane::new(w, h);
                for y in 0..h {
                    for x in 0..w {
                        out.set_pixel(x, y, plane.pixel(w - 1 - x, h - 1 - y));
                    }
                }
                Ok(out)
            }
            270 => {
                let mut out = FramePlane::new(h, w);
                for y in 0..w {
                    for x in 0..h {
                        out.set_pixel(x, y, plane.pixel(w - 1 - y, x));
                    }
                }
                Ok(out)
            }
            _ => Ok(plane),
        }
    }
}
