// SPDX-License-Identifier: GPL-3.0-only

//! Filter chains and the pixel transforms they are built from
//!
//! A [`FilterChain`] is an ordered, immutable-once-built sequence of
//! transforms over one source. Sources form a directed acyclic graph: a
//! chain reads either the live stream snapshot or another chain's output.
//! Cycles are impossible by construction since chains are built bottom-up
//! behind `Arc` and never mutated after activation.

pub mod color;
pub mod geometry;
pub mod stylize;

pub use color::{Brightness, ColorAdjust, Grayscale, GrayscaleNegative, Negative, Sepia};
pub use geometry::{Mirror, Rotation};
pub use stylize::{Blend, BlendFunction, Blur, Cartoon, QuantizeColorEffect};

use crate::errors::RenderResult;
use crate::frame::FramePlane;
use std::collections::HashMap;
use std::sync::Arc;

/// Where a chain (or a blend step) reads its input from
#[derive(Clone)]
pub enum ChainSource {
    /// The raw camera frame delivered to the current render call
    Stream,
    /// The output of another chain, evaluated within the same render call
    Chain(Arc<FilterChain>),
}

/// One pixel transform in a chain
///
/// Steps consume a packed plane and produce one; geometric steps may return
/// a plane with different dimensions. Steps that need a second input (blend)
/// or the per-slot cache reach them through the render context.
pub trait Filter: Send + Sync {
    fn apply(&self, plane: FramePlane, ctx: &mut RenderCtx<'_>) -> RenderResult<FramePlane>;
}

/// A non-chain effect driving its own pixel pass over the stream
///
/// Counterpart of the chain shape for effects that do not decompose into
/// ordered steps (palette quantization, for example).
pub trait CustomEffect: Send + Sync {
    fn process(&self, plane: FramePlane, ctx: &mut RenderCtx<'_>) -> RenderResult<FramePlane>;
}

/// Per-render-call state handed to every filter step
///
/// Holds the stream snapshot (so nested chains and blend steps can re-read
/// the raw frame) and the frame-derived cache owned by the active effect
/// slot. The cache maps a quantized color key to an assigned output color
/// and lives exactly as long as the slot that created it.
pub struct RenderCtx<'a> {
    stream: &'a FramePlane,
    pub cache: &'a mut HashMap<u32, u32>,
}

impl<'a> RenderCtx<'a> {
    pub(crate) fn new(stream: &'a FramePlane, cache: &'a mut HashMap<u32, u32>) -> Self {
        Self { stream, cache }
    }

    pub fn stream(&self) -> &FramePlane {
        self.stream
    }

    /// Evaluate a chain source into a fresh plane
    pub fn resolve(&mut self, source: &ChainSource) -> RenderResult<FramePlane> {
        match source {
            ChainSource::Stream => Ok(self.stream.clone()),
            ChainSource::Chain(chain) => chain.run(self),
        }
    }
}

/// Ordered sequence of filter steps over one source
pub struct FilterChain {
    source: ChainSource,
    steps: Vec<Box<dyn Filter>>,
}

impl FilterChain {
    pub fn new(source: ChainSource, steps: Vec<Box<dyn Filter>>) -> Self {
        Self { source, steps }
    }

    /// Chain reading directly from the live stream
    pub fn over_stream(steps: Vec<Box<dyn Filter>>) -> Self {
        Self::new(ChainSource::Stream, steps)
    }

    pub(crate) fn run(&self, ctx: &mut RenderCtx<'_>) -> RenderResult<FramePlane> {
        let mut plane = ctx.resolve(&self.source)?;
        for step in &self.steps {
            plane = step.apply(plane, ctx)?;
        }
        Ok(plane)
    }
}

/// Clamp a normalized channel value and convert back to a byte
#[inline]
pub(crate) fn to_byte(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0) as u8
}

/// BT.601 luma from normalized RGB
#[inline]
pub(crate) fn luma(r: f32, g: f32, b: f32) -> f32 {
    0.299 * r + 0.587 * g + 0.114 * b
}

/// Split a BGRA pixel into normalized (r, g, b)
#[inline]
pub(crate) fn to_rgb(px: [u8; 4]) -> (f32, f32, f32) {
    (
        px[2] as f32 / 255.0,
        px[1] as f32 / 255.0,
        px[0] as f32 / 255.0,
    )
}

/// Pack normalized (r, g, b) into a BGRA pixel, keeping the given alpha
#[inline]
pub(crate) fn from_rgb(r: f32, g: f32, b: f32, alpha: u8) -> [u8; 4] {
    [to_byte(b), to_byte(g), to_byte(r), alpha]
}
