// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for the filter pipeline
//!
//! This module provides command-line functionality for:
//! - Listing the built-in effects
//! - Applying an effect to a still image
//! - Running a live preview session against the synthetic source

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use viewfinder::config::PipelineConfig;
use viewfinder::controller::{EffectController, Gate};
use viewfinder::effects::{EffectCatalog, SourceBinding};
use viewfinder::engine::{EffectGraph, RenderEngine};
use viewfinder::filters::QuantizeColorEffect;
use viewfinder::frame::{FrameBufferView, Resolution};
use viewfinder::session::SessionCoordinator;
use viewfinder::sources::{NullSink, TestPatternSource};

/// List the built-in effect table
pub fn list_effects() -> Result<(), Box<dyn std::error::Error>> {
    let catalog = EffectCatalog::builtin();

    println!("viewfinder {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Available effects:");
    println!();
    for (index, descriptor) in catalog.iter().enumerate() {
        println!("  [{:2}] {}", index, descriptor.name());
    }
    println!();
    println!("{} effects total. Index 0 is the default.", catalog.len());

    Ok(())
}

/// Apply one effect to a still image and save the result
pub fn apply_effect(
    effect: usize,
    quantize: bool,
    input: PathBuf,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let img = image::open(&input)?.to_rgba8();
    let (width, height) = img.dimensions();
    let mut data = img.into_raw();
    // The pipeline works in BGRA; swap channels in and back out
    for px in data.chunks_exact_mut(4) {
        px.swap(0, 2);
    }
    println!("Input: {} ({}x{})", input.display(), width, height);

    if quantize {
        println!("Applying: 16-color quantize");
        let engine = RenderEngine::new(EffectGraph::Custom(Box::new(QuantizeColorEffect::new())));
        let mut cache = HashMap::new();
        let mut view = FrameBufferView::packed(&mut data, width, height)?;
        engine.render(&mut view, &mut cache)?;
    } else {
        let catalog = EffectCatalog::builtin();
        if effect >= catalog.len() {
            return Err(format!(
                "Effect index {} out of range (0-{})",
                effect,
                catalog.len() - 1
            )
            .into());
        }

        let gate = Arc::new(Gate::new());
        let controller = EffectController::new(gate, catalog, PipelineConfig::default());
        controller.activate(SourceBinding {
            resolution: Resolution::new(width, height),
        });
        let name = controller
            .select_effect(effect)
            .ok_or("Effect selection timed out")?
            .to_string();
        println!("Applying: {}", name);

        {
            let mut view = FrameBufferView::packed(&mut data, width, height)?;
            controller.process_frame(&mut view)?;
        }
        controller.deactivate();
    }

    for px in data.chunks_exact_mut(4) {
        px.swap(0, 2);
    }

    let output_path = output.unwrap_or_else(|| default_output_path(&input));
    image::save_buffer(
        &output_path,
        &data,
        width,
        height,
        image::ExtendedColorType::Rgba8,
    )?;
    println!("Saved: {}", output_path.display());

    Ok(())
}

/// Run a live preview session against the synthetic test-pattern source
pub fn preview(
    effect: usize,
    duration: u64,
    cycle: Option<u64>,
    config_path: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = PipelineConfig::load_or_default(config_path.as_deref());

    let source = TestPatternSource::new();
    let (sink, stats) = NullSink::new();
    let mut session = SessionCoordinator::new(Box::new(source), Box::new(sink), config);
    session.set_viewport(800.0, 480.0);

    session.start()?;
    if effect > 0 {
        let catalog_len = session.controller().catalog().len();
        if effect >= catalog_len {
            session.stop();
            return Err(format!(
                "Effect index {} out of range (0-{})",
                effect,
                catalog_len - 1
            )
            .into());
        }
        if let Some(name) = session.controller().select_effect(effect) {
            println!("Selected: {}", name);
        }
    }

    // Set up Ctrl+C handler
    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_clone = Arc::clone(&stop_flag);
    ctrlc::set_handler(move || {
        stop_flag_clone.store(true, Ordering::SeqCst);
    })?;

    println!("Previewing: {}", session.controller().current_effect_name());
    if duration > 0 {
        println!("Running for {} seconds (press Ctrl+C to stop early)", duration);
    } else {
        println!("Running until Ctrl+C");
    }

    let start = Instant::now();
    let mut last_cycle = Instant::now();
    let mut last_frames = 0u64;

    loop {
        if stop_flag.load(Ordering::SeqCst) {
            println!();
            println!("Stopping...");
            break;
        }
        if duration > 0 && start.elapsed() >= Duration::from_secs(duration) {
            println!();
            break;
        }

        if let Some(cycle_secs) = cycle
            && last_cycle.elapsed() >= Duration::from_secs(cycle_secs)
        {
            last_cycle = Instant::now();
            if let Some(name) = session.controller().next_effect() {
                println!();
                println!("Switched to: {}", name);
            }
        }

        std::thread::sleep(Duration::from_secs(1));

        let frames = stats.frames_presented();
        print!(
            "\r{} | {} frames | {:.1} fps (source {} fps)",
            session.controller().current_effect_name(),
            frames,
            (frames - last_frames) as f64,
            stats.frame_rate()
        );
        std::io::Write::flush(&mut std::io::stdout())?;
        last_frames = frames;
    }

    session.stop();
    println!(
        "Session finished: {} frames presented in {:.1}s",
        stats.frames_presented(),
        start.elapsed().as_secs_f64()
    );

    Ok(())
}

/// Default output path: input stem with a `_filtered.png` suffix
fn default_output_path(input: &PathBuf) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    input.with_file_name(format!("{}_filtered.png", stem))
}
