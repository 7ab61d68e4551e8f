// SPDX-License-Identifier: GPL-3.0-only

//! Multi-input and stylization filters
//!
//! Blend steps pull a second input from the chain graph through the render
//! context. Cartoon and the quantize effect share the slot-scoped color
//! cache: a mapping from a quantized color key to an assigned output color,
//! reset whenever the active effect slot is rebuilt.

use super::{ChainSource, CustomEffect, Filter, RenderCtx, from_rgb, luma, to_rgb};
use crate::errors::{RenderError, RenderResult};
use crate::frame::FramePlane;

/// How two planes are combined per pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendFunction {
    /// 1 - (1-a)(1-b); lightens
    Screen,
    /// a * b; darkens
    Multiply,
}

impl BlendFunction {
    #[inline]
    fn combine(&self, base: f32, overlay: f32) -> f32 {
        match self {
            BlendFunction::Screen => 1.0 - (1.0 - base) * (1.0 - overlay),
            BlendFunction::Multiply => base * overlay,
        }
    }
}

/// Blend the incoming plane with another chain source
pub struct Blend {
    upstream: ChainSource,
    function: BlendFunction,
    strength: f32,
}

impl Blend {
    pub fn new(upstream: ChainSource, function: BlendFunction, strength: f32) -> Self {
        Self {
            upstream,
            function,
            strength: strength.clamp(0.0, 1.0),
        }
    }
}

impl Filter for Blend {
    fn apply(&self, mut plane: FramePlane, ctx: &mut RenderCtx<'_>) -> RenderResult<FramePlane> {
        let overlay = ctx.resolve(&self.upstream)?;
        if overlay.resolution() != plane.resolution() {
            return Err(RenderError::DimensionMismatch {
                expected: plane.resolution(),
                actual: overlay.resolution(),
            });
        }

        let overlay_pixels = overlay.pixels();
        for (px, over) in plane.pixels_mut().iter_mut().zip(overlay_pixels) {
            let (br, bg, bb) = to_rgb(*px);
            let (or, og, ob) = to_rgb(*over);
            let r = br + (self.function.combine(br, or) - br) * self.strength;
            let g = bg + (self.function.combine(bg, og) - bg) * self.strength;
            let b = bb + (self.function.combine(bb, ob) - bb) * self.strength;
            *px = from_rgb(r, g, b, px[3]);
        }
        Ok(plane)
    }
}

/// Two-pass box blur
pub struct Blur {
    radius: u32,
}

impl Blur {
    /// `amount` is the kernel diameter in pixels
    pub fn new(amount: u32) -> Self {
        Self {
            radius: (amount / 2).max(1),
        }
    }

    fn pass<F>(width: u32, height: u32, radius: u32, src: &[[u8; 4]], dst: &mut [[u8; 4]], index: F)
    where
        F: Fn(u32, u32) -> usize,
    {
        // `index(i, j)` walks axis i within line j; lines are blurred
        // independently with clamped edges
        let (len, lines) = (width, height);
        for j in 0..lines {
            for i in 0..len {
                let lo = i.saturating_sub(radius);
                let hi = (i + radius).min(len - 1);
                let mut sum = [0u32; 4];
                for k in lo..=hi {
                    let px = src[index(k, j)];
                    for c in 0..4 {
                        sum[c] += px[c] as u32;
                    }
                }
                let count = (hi - lo + 1) as u32;
                dst[index(i, j)] = [
                    (sum[0] / count) as u8,
                    (sum[1] / count) as u8,
                    (sum[2] / count) as u8,
                    (sum[3] / count) as u8,
                ];
            }
        }
    }
}

impl Filter for Blur {
    fn apply(&self, plane: FramePlane, _ctx: &mut RenderCtx<'_>) -> RenderResult<FramePlane> {
        let (w, h) = (plane.width(), plane.height());
        let mut horizontal = FramePlane::new(w, h);
        Self::pass(w, h, self.radius, plane.pixels(), horizontal.pixels_mut(), |x, y| {
            (y * w + x) as usize
        });
        let mut out = FramePlane::new(w, h);
        Self::pass(h, w, self.radius, horizontal.pixels(), out.pixels_mut(), |y, x| {
            (y * w + x) as usize
        });
        Ok(out)
    }
}

/// Edge-darkened color quantization
///
/// Flat regions are posterized through the slot cache; Sobel edges on the
/// luminance plane are drawn as dark outlines.
pub struct Cartoon {
    levels: u32,
    edge_threshold: f32,
}

impl Cartoon {
    pub fn new() -> Self {
        Self {
            levels: 5,
            edge_threshold: 0.4,
        }
    }

    /// Quantized cache key: top 4 bits of each color channel
    #[inline]
    fn cache_key(px: [u8; 4]) -> u32 {
        ((px[0] as u32 & 0xF0) << 16) | ((px[1] as u32 & 0xF0) << 8) | (px[2] as u32 & 0xF0)
    }

    fn posterize(&self, px: [u8; 4]) -> [u8; 4] {
        let levels = self.levels as f32;
        let (r, g, b) = to_rgb(px);
        from_rgb(
            (r * levels).floor() / (levels - 1.0),
            (g * levels).floor() / (levels - 1.0),
            (b * levels).floor() / (levels - 1.0),
            px[3],
        )
    }
}

impl Default for Cartoon {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for Cartoon {
    fn apply(&self, mut plane: FramePlane, ctx: &mut RenderCtx<'_>) -> RenderResult<FramePlane> {
        let (w, h) = (plane.width() as isize, plane.height() as isize);

        let luma_plane: Vec<f32> = plane
            .pixels()
            .iter()
            .map(|px| {
                let (r, g, b) = to_rgb(*px);
                luma(r, g, b)
            })
            .collect();
        let sample = |x: isize, y: isize| -> f32 {
            let x = x.clamp(0, w - 1);
            let y = y.clamp(0, h - 1);
            luma_plane[(y * w + x) as usize]
        };

        for py in 0..h {
            for px_x in 0..w {
                let idx = (py * w + px_x) as usize;
                let (x, y) = (px_x, py);

                let tl = sample(x - 1, y - 1);
                let tm = sample(x, y - 1);
                let tr = sample(x + 1, y - 1);
                let ml = sample(x - 1, y);
                let mr = sample(x + 1, y);
                let bl = sample(x - 1, y + 1);
                let bm = sample(x, y + 1);
                let br = sample(x + 1, y + 1);

                let gx = -tl - 2.0 * ml - bl + tr + 2.0 * mr + br;
                let gy = -tl - 2.0 * tm - tr + bl + 2.0 * bm + br;
                let edge = (gx * gx + gy * gy).sqrt();

                let px = plane.pixels()[idx];
                let out = if edge > self.edge_threshold {
                    [0x10, 0x10, 0x10, px[3]]
                } else {
                    let key = Self::cache_key(px);
                    let packed = match ctx.cache.get(&key) {
                        Some(&assigned) => assigned,
                        None => {
                            let q = self.posterize(px);
                            let packed =
                                ((q[0] as u32) << 16) | ((q[1] as u32) << 8) | q[2] as u32;
                            ctx.cache.insert(key, packed);
                            packed
                        }
                    };
                    [
                        ((packed >> 16) & 0xFF) as u8,
                        ((packed >> 8) & 0xFF) as u8,
                        (packed & 0xFF) as u8,
                        px[3],
                    ]
                };
                plane.pixels_mut()[idx] = out;
            }
        }
        Ok(plane)
    }
}

/// Fixed 16-color palette quantization driven by the slot cache
///
/// The non-chain render shape: it owns the whole pixel pass rather than
/// composing with other steps.
pub struct QuantizeColorEffect {
    palette: [[u8; 3]; 16],
}

impl QuantizeColorEffect {
    pub fn new() -> Self {
        // Classic 16-color palette, BGR order
        Self {
            palette: [
                [0x00, 0x00, 0x00],
                [0x80, 0x00, 0x00],
                [0x00, 0x80, 0x00],
                [0x80, 0x80, 0x00],
                [0x00, 0x00, 0x80],
                [0x80, 0x00, 0x80],
                [0x00, 0x80, 0x80],
                [0xC0, 0xC0, 0xC0],
                [0x80, 0x80, 0x80],
                [0xFF, 0x00, 0x00],
                [0x00, 0xFF, 0x00],
                [0xFF, 0xFF, 0x00],
                [0x00, 0x00, 0xFF],
                [0xFF, 0x00, 0xFF],
                [0x00, 0xFF, 0xFF],
                [0xFF, 0xFF, 0xFF],
            ],
        }
    }

    fn nearest(&self, px: [u8; 4]) -> [u8; 3] {
        let mut best = self.palette[0];
        let mut best_distance = u32::MAX;
        for candidate in &self.palette {
            let distance = candidate
                .iter()
                .zip(px.iter())
                .map(|(&c, &p)| {
                    let d = c as i32 - p as i32;
                    (d * d) as u32
                })
                .sum();
            if distance < best_distance {
                best_distance = distance;
                best = *candidate;
            }
        }
        best
    }
}

impl Default for QuantizeColorEffect {
    fn default() -> Self {
        Self::new()
    }
}

impl CustomEffect for QuantizeColorEffect {
    fn process(&self, mut plane: FramePlane, ctx: &mut RenderCtx<'_>) -> RenderResult<FramePlane> {
        for px in plane.pixels_mut() {
            let key = Cartoon::cache_key(*px);
            let packed = match ctx.cache.get(&key) {
                Some(&assigned) => assigned,
                None => {
                    let [b, g, r] = self.nearest(*px);
                    let packed = ((b as u32) << 16) | ((g as u32) << 8) | r as u32;
                    ctx.cache.insert(key, packed);
                    packed
                }
            };
            *px = [
                ((packed >> 16) & 0xFF) as u8,
                ((packed >> 8) & 0xFF) as u8,
                (packed & 0xFF) as u8,
                px[3],
            ];
        }
        Ok(plane)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn solid(bgra: [u8; 4], w: u32, h: u32) -> FramePlane {
        let mut plane = FramePlane::new(w, h);
        for px in plane.pixels_mut() {
            *px = bgra;
        }
        plane
    }

    #[test]
    fn screen_blend_with_self_lightens() {
        let base = solid([64, 64, 64, 255], 4, 4);
        let stream = base.clone();
        let mut cache = HashMap::new();
        let mut ctx = RenderCtx::new(&stream, &mut cache);

        let blend = Blend::new(ChainSource::Stream, BlendFunction::Screen, 1.0);
        let out = blend.apply(base, &mut ctx).expect("same dimensions");
        assert!(out.pixel(0, 0)[0] > 64);
    }

    #[test]
    fn multiply_blend_with_self_darkens() {
        let base = solid([128, 128, 128, 255], 4, 4);
        let stream = base.clone();
        let mut cache = HashMap::new();
        let mut ctx = RenderCtx::new(&stream, &mut cache);

        let blend = Blend::new(ChainSource::Stream, BlendFunction::Multiply, 1.0);
        let out = blend.apply(base, &mut ctx).expect("same dimensions");
        assert!(out.pixel(0, 0)[0] < 128);
    }

    #[test]
    fn blend_rejects_mismatched_upstream() {
        let base = solid([0, 0, 0, 255], 4, 4);
        let stream = solid([0, 0, 0, 255], 2, 2);
        let mut cache = HashMap::new();
        let mut ctx = RenderCtx::new(&stream, &mut cache);

        let blend = Blend::new(ChainSource::Stream, BlendFunction::Screen, 1.0);
        assert!(matches!(
            blend.apply(base, &mut ctx),
            Err(RenderError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn blur_flattens_contrast() {
        let mut plane = FramePlane::new(8, 8);
        plane.set_pixel(4, 4, [255, 255, 255, 255]);
        let stream = plane.clone();
        let mut cache = HashMap::new();
        let mut ctx = RenderCtx::new(&stream, &mut cache);

        let out = Blur::new(4).apply(plane, &mut ctx).expect("blur cannot fail");
        assert!(out.pixel(4, 4)[0] < 255);
        assert!(out.pixel(3, 4)[0] > 0);
    }

    #[test]
    fn cartoon_populates_cache() {
        let plane = solid([100, 150, 200, 255], 8, 8);
        let stream = plane.clone();
        let mut cache = HashMap::new();
        let mut ctx = RenderCtx::new(&stream, &mut cache);

        Cartoon::new().apply(plane, &mut ctx).expect("cartoon cannot fail");
        assert!(!cache.is_empty());
    }

    #[test]
    fn quantize_maps_to_palette_and_caches() {
        let plane = solid([10, 10, 250, 255], 4, 4);
        let stream = plane.clone();
        let mut cache = HashMap::new();
        let mut ctx = RenderCtx::new(&stream, &mut cache);

        let out = QuantizeColorEffect::new()
            .process(plane, &mut ctx)
            .expect("quantize cannot fail");
        // 250 red snaps to the pure red palette entry
        assert_eq!(out.pixel(0, 0), [0, 0, 255, 255]);
        assert_eq!(cache.len(), 1);
    }
}
