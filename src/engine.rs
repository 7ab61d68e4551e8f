// SPDX-License-Identifier: GPL-3.0-only

//! Render engine
//!
//! Drives one effect graph against one frame buffer. The caller guarantees
//! no overlapping renders on the same buffer (exclusive borrow plus the
//! controller's gate); from the gate's perspective one render is a single
//! atomic unit of work. A failed render discards that frame only.

use crate::errors::{RenderError, RenderResult};
use crate::filters::{ChainSource, CustomEffect, FilterChain, RenderCtx};
use crate::frame::FrameBufferView;
use std::collections::HashMap;
use std::sync::Arc;

/// The three shapes an active effect can take
pub enum EffectGraph {
    /// Raw stream, untouched
    PassThrough,
    /// A chain DAG rooted at one final chain
    Chain(Arc<FilterChain>),
    /// A self-contained effect driving its own pixel pass
    Custom(Box<dyn CustomEffect>),
}

/// Applies one effect graph to frames, in place
pub struct RenderEngine {
    graph: EffectGraph,
}

impl RenderEngine {
    pub fn new(graph: EffectGraph) -> Self {
        Self { graph }
    }

    pub fn pass_through() -> Self {
        Self::new(EffectGraph::PassThrough)
    }

    /// Run the graph against `frame`, writing the result back into it.
    ///
    /// `cache` is the frame-derived cache owned by the active effect slot;
    /// quantization-style filters consult and extend it across frames.
    pub fn render(
        &self,
        frame: &mut FrameBufferView<'_>,
        cache: &mut HashMap<u32, u32>,
    ) -> RenderResult<()> {
        if matches!(self.graph, EffectGraph::PassThrough) {
            // The buffer already holds the raw frame
            return Ok(());
        }

        let stream = frame.snapshot();
        let mut ctx = RenderCtx::new(&stream, cache);
        let output = match &self.graph {
            EffectGraph::PassThrough => return Ok(()),
            EffectGraph::Chain(chain) => chain.run(&mut ctx)?,
            EffectGraph::Custom(effect) => {
                let plane = ctx.resolve(&ChainSource::Stream)?;
                effect.process(plane, &mut ctx)?
            }
        };

        if output.resolution() != frame.resolution() {
            return Err(RenderError::DimensionMismatch {
                expected: frame.resolution(),
                actual: output.resolution(),
            });
        }
        frame.write_back(&output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{Negative, QuantizeColorEffect, Rotation};

    fn frame_bytes(w: u32, h: u32, fill: [u8; 4]) -> Vec<u8> {
        fill.iter()
            .copied()
            .cycle()
            .take((w * h * 4) as usize)
            .collect()
    }

    #[test]
    fn pass_through_leaves_buffer_untouched() {
        let mut data = frame_bytes(4, 4, [1, 2, 3, 255]);
        let original = data.clone();
        let mut view = FrameBufferView::packed(&mut data, 4, 4).expect("valid view");
        let mut cache = HashMap::new();

        RenderEngine::pass_through()
            .render(&mut view, &mut cache)
            .expect("pass-through cannot fail");
        assert_eq!(data, original);
    }

    #[test]
    fn chain_renders_in_place() {
        let mut data = frame_bytes(4, 4, [0, 0, 0, 255]);
        let mut view = FrameBufferView::packed(&mut data, 4, 4).expect("valid view");
        let mut cache = HashMap::new();

        let engine = RenderEngine::new(EffectGraph::Chain(Arc::new(FilterChain::over_stream(
            vec![Box::new(Negative)],
        ))));
        engine.render(&mut view, &mut cache).expect("negative cannot fail");
        assert_eq!(&data[0..4], &[255, 255, 255, 255]);
    }

    #[test]
    fn custom_effect_renders_through_engine() {
        let mut data = frame_bytes(4, 4, [250, 10, 10, 255]);
        let mut view = FrameBufferView::packed(&mut data, 4, 4).expect("valid view");
        let mut cache = HashMap::new();

        let engine = RenderEngine::new(EffectGraph::Custom(Box::new(QuantizeColorEffect::new())));
        engine.render(&mut view, &mut cache).expect("quantize cannot fail");
        assert_eq!(&data[0..4], &[255, 0, 0, 255]);
        assert!(!cache.is_empty());
    }

    #[test]
    fn unbalanced_rotation_fails_on_non_square_frame() {
        let mut data = frame_bytes(4, 2, [0, 0, 0, 255]);
        let mut view = FrameBufferView::packed(&mut data, 4, 2).expect("valid view");
        let mut cache = HashMap::new();

        let engine = RenderEngine::new(EffectGraph::Chain(Arc::new(FilterChain::over_stream(
            vec![Box::new(Rotation::new(90))],
        ))));
        assert!(matches!(
            engine.render(&mut view, &mut cache),
            Err(RenderError::DimensionMismatch { .. })
        ));
    }
}
