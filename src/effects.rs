// SPDX-License-Identifier: GPL-3.0-only

//! Effect catalog
//!
//! A fixed, statically ordered table mapping an effect index to a display
//! name and a factory for the effect's filter graph. Index 0 is the default
//! initial effect; the controller's wraparound arithmetic keeps lookups in
//! range, so an out-of-range index is a logic bug and panics rather than
//! clamping.

use crate::engine::EffectGraph;
use crate::filters::{
    Blend, BlendFunction, Blur, Brightness, Cartoon, ChainSource, ColorAdjust, Filter,
    FilterChain, Grayscale, GrayscaleNegative, Mirror, Negative, Rotation, Sepia,
};
use crate::frame::Resolution;
use std::sync::Arc;

/// Binding of the controller to one live frame source
///
/// Chains are built against a concrete source; the binding carries what a
/// factory needs to know about it.
#[derive(Debug, Clone, Copy)]
pub struct SourceBinding {
    pub resolution: Resolution,
}

type GraphBuilder = fn(&SourceBinding) -> EffectGraph;

/// One catalog entry: display name plus filter-graph factory
pub struct EffectDescriptor {
    name: String,
    build: GraphBuilder,
}

impl EffectDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn build(&self, binding: &SourceBinding) -> EffectGraph {
        (self.build)(binding)
    }
}

/// Fixed, indexed table of effect descriptors
pub struct EffectCatalog {
    entries: Vec<EffectDescriptor>,
}

impl EffectCatalog {
    /// The built-in preset table
    pub fn builtin() -> Self {
        let specs: Vec<(&str, GraphBuilder)> = vec![
            ("Brightness +0.50", |_| {
                chain(vec![Box::new(Brightness::new(0.5))])
            }),
            ("Color adjust, red at -1.0", |_| {
                chain(vec![Box::new(ColorAdjust::new(-1.0, 0.0, 0.0))])
            }),
            ("Color adjust, red at +1.0", |_| {
                chain(vec![Box::new(ColorAdjust::new(1.0, 0.0, 0.0))])
            }),
            ("Color adjust, green at -1.0", |_| {
                chain(vec![Box::new(ColorAdjust::new(0.0, -1.0, 0.0))])
            }),
            ("Color adjust, green at +1.0", |_| {
                chain(vec![Box::new(ColorAdjust::new(0.0, 1.0, 0.0))])
            }),
            ("Color adjust, blue at -1.0", |_| {
                chain(vec![Box::new(ColorAdjust::new(0.0, 0.0, -1.0))])
            }),
            ("Color adjust, blue at +1.0", |_| {
                chain(vec![Box::new(ColorAdjust::new(0.0, 0.0, 1.0))])
            }),
            ("Mirror", |_| chain(vec![Box::new(Mirror)])),
            ("Mirror and rotate", |_| {
                chain(vec![
                    Box::new(Rotation::new(270)),
                    Box::new(Mirror),
                    Box::new(Rotation::new(90)),
                ])
            }),
            ("Grayscale", |_| chain(vec![Box::new(Grayscale)])),
            ("Grayscale negative", |_| {
                chain(vec![Box::new(GrayscaleNegative)])
            }),
            ("Negative", |_| chain(vec![Box::new(Negative)])),
            ("Cartoon", |_| chain(vec![Box::new(Cartoon::new())])),
            ("Sepia", |_| chain(vec![Box::new(Sepia)])),
            ("Orton", |_| orton()),
        ];

        let count = specs.len();
        let entries = specs
            .into_iter()
            .enumerate()
            .map(|(index, (label, build))| EffectDescriptor {
                name: format!("{}/{} - {}", index + 1, count, label),
                build,
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Descriptor lookup; panics on an out-of-range index
    pub fn descriptor(&self, index: usize) -> &EffectDescriptor {
        match self.entries.get(index) {
            Some(descriptor) => descriptor,
            None => panic!(
                "effect index {} out of range (catalog has {} entries)",
                index,
                self.entries.len()
            ),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &EffectDescriptor> {
        self.entries.iter()
    }
}

fn chain(steps: Vec<Box<dyn Filter>>) -> EffectGraph {
    EffectGraph::Chain(Arc::new(FilterChain::over_stream(steps)))
}

/// Three dependent chains: the background screen-blends the stream with
/// itself, the foreground blurs the background, and the final pass
/// multiply-blends the two.
fn orton() -> EffectGraph {
    let background = Arc::new(FilterChain::over_stream(vec![Box::new(Blend::new(
        ChainSource::Stream,
        BlendFunction::Screen,
        1.0,
    ))]));
    let foreground = Arc::new(FilterChain::new(
        ChainSource::Chain(Arc::clone(&background)),
        vec![Box::new(Blur::new(45))],
    ));
    EffectGraph::Chain(Arc::new(FilterChain::new(
        ChainSource::Chain(background),
        vec![Box::new(Blend::new(
            ChainSource::Chain(foreground),
            BlendFunction::Multiply,
            1.0,
        ))],
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_fifteen_ordered_entries() {
        let catalog = EffectCatalog::builtin();
        assert_eq!(catalog.len(), 15);
        assert!(catalog.descriptor(0).name().starts_with("1/15"));
        assert!(catalog.descriptor(14).name().starts_with("15/15"));
    }

    #[test]
    fn every_entry_builds_a_graph() {
        let catalog = EffectCatalog::builtin();
        let binding = SourceBinding {
            resolution: Resolution::new(8, 8),
        };
        for descriptor in catalog.iter() {
            let _ = descriptor.build(&binding);
        }
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn out_of_range_lookup_panics() {
        EffectCatalog::builtin().descriptor(15);
    }
}
